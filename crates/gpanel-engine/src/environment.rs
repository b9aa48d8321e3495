//! Host environment for the engine: platform library paths and binary lookup

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use gpanel_core::prelude::*;

/// Library directories the Ginga engine loads its adapters and players from
pub const GINGA_LIBRARY_PATH: &str = "/usr/local/lib/lua/5.1/socket:\
/usr/local/lib/ginga:\
/usr/local/lib/ginga/adapters:\
/usr/local/lib/ginga/cm:\
/usr/local/lib/ginga/mb:\
/usr/local/lib/ginga/mb/dec:\
/usr/local/lib/ginga/converters:\
/usr/local/lib/ginga/dp:\
/usr/local/lib/ginga/ic:\
/usr/local/lib/ginga/iocontents:\
/usr/local/lib/ginga/players:\
/usr/local/lib:";

/// Default environment overrides for the given OS name
/// (as in `std::env::consts::OS`).
///
/// Only Linux needs anything: the engine's shared objects live outside the
/// default loader path.
pub fn platform_defaults(os: &str) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    if os == "linux" {
        env.insert("LD_LIBRARY_PATH".to_string(), GINGA_LIBRARY_PATH.to_string());
    }
    env
}

/// Resolve the engine executable.
///
/// Paths with a directory component are used as given. Bare names are looked
/// up on `PATH`.
pub fn resolve_program(program: &Path) -> Result<PathBuf> {
    if program.components().count() > 1 || program.is_absolute() {
        return Ok(program.to_path_buf());
    }

    which::which(program).map_err(|e| {
        debug!("{} not found on PATH: {}", program.display(), e);
        Error::EngineNotFound {
            path: program.to_path_buf(),
        }
    })
}
