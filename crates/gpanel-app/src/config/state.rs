//! Persisted panel state (`<data_local_dir>/ginga-panel/state.toml`)

use super::settings::{write_atomic, APP_DIR};
use super::types::PanelState;
use gpanel_core::prelude::*;
use std::path::{Path, PathBuf};

const STATE_FILENAME: &str = "state.toml";

/// Default location of state.toml
pub fn default_state_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join(APP_DIR).join(STATE_FILENAME))
}

/// Load panel state; missing or corrupt files give an empty state
pub fn load_state(path: &Path) -> PanelState {
    let Ok(content) = std::fs::read_to_string(path) else {
        debug!("No panel state at {:?}", path);
        return PanelState::default();
    };

    toml::from_str(&content).unwrap_or_else(|e| {
        warn!("Failed to parse {:?}: {}", path, e);
        PanelState::default()
    })
}

pub fn save_state(path: &Path, state: &PanelState) -> Result<()> {
    let content = toml::to_string_pretty(state)
        .map_err(|e| Error::config(format!("Failed to serialize panel state: {}", e)))?;
    write_atomic(path, &content)?;
    debug!("Saved panel state to {:?}", path);
    Ok(())
}
