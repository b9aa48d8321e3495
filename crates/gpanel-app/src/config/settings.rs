//! Settings file for Ginga Panel (`<config_dir>/ginga-panel/config.toml`)

use super::types::Settings;
use gpanel_core::prelude::*;
use std::path::{Path, PathBuf};

pub(crate) const APP_DIR: &str = "ginga-panel";
const CONFIG_FILENAME: &str = "config.toml";
const CHANNELS_FILENAME: &str = "channels.toml";

/// Platform config directory for the panel, e.g. `~/.config/ginga-panel`
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR))
}

/// Default location of config.toml
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|d| d.join(CONFIG_FILENAME))
}

/// Default location of the channel list
pub fn default_channels_path() -> Option<PathBuf> {
    default_config_dir().map(|d| d.join(CHANNELS_FILENAME))
}

/// Load settings from `config_path`.
///
/// A missing or unreadable file yields the defaults; this never fails.
pub fn load_settings(config_path: &Path) -> Settings {
    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Create `config_dir/config.toml` with commented defaults if missing.
///
/// Returns the path of the config file.
pub fn init_config_dir(config_dir: &Path) -> Result<PathBuf> {
    if !config_dir.exists() {
        std::fs::create_dir_all(config_dir)
            .map_err(|e| Error::config(format!("Failed to create config dir: {}", e)))?;
    }

    let config_path = config_dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        let default_content = r#"# Ginga Panel Configuration

[engine]
binary = "/usr/bin/ginga"               # Bare names are looked up on PATH
# Argument template for documents. Variables: ${FILE}, ${SCREENSIZE}, ${WID}
parameters = "${FILE} --vmode ${SCREENSIZE}"
context_file = "/usr/etc/ginga/files/contextmanager/contexts.ini"
quit_token = "quit\n"
stop_grace_ms = 2000
# Environment overrides (default: Ginga library path on Linux)
# [engine.env]
# LD_LIBRARY_PATH = "/usr/local/lib/ginga"

[display]
screen_size = "640x480"
window_id = "0"
progress_window_id = "0"

[tuning]
scheme = "sbtvdt"
timeout_secs = 15       # Seconds before asking whether to keep waiting

[behavior]
enable_log = false
autoplay = false        # Play documents as soon as they are loaded
run_as = "base"         # base | passive | active
# developer_log_file = "/tmp/ginga-developer.log"

[device]
port_floor = 22222
port_ceiling = 33333
"#;

        std::fs::write(&config_path, default_content)
            .map_err(|e| Error::config(format!("Failed to write config.toml: {}", e)))?;

        info!("Created default config at {:?}", config_path);
    }

    Ok(config_path)
}

/// Save settings to `config_path`.
///
/// Uses atomic write (temp file + rename).
pub fn save_settings(config_path: &Path, settings: &Settings) -> Result<()> {
    let content = toml::to_string_pretty(settings)
        .map_err(|e| Error::config(format!("Failed to serialize settings: {}", e)))?;
    write_atomic(config_path, &format!("{}{}", generate_config_header(), content))?;

    info!("Saved settings to {:?}", config_path);
    Ok(())
}

fn generate_config_header() -> String {
    r#"# Ginga Panel Configuration
# Generated by gpanel

"#
    .to_string()
}

/// Write through a sibling temp file, then rename over `path`
pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .map_err(|e| Error::config(format!("Failed to create {:?}: {}", dir, e)))?;
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::config(format!("Invalid file path: {:?}", path)))?;
    let temp_path = dir.join(format!(".{}.tmp", file_name));

    std::fs::write(&temp_path, content)
        .map_err(|e| Error::config(format!("Failed to write temp file: {}", e)))?;

    std::fs::rename(&temp_path, path)
        .map_err(|e| Error::config(format!("Failed to rename temp file: {}", e)))?;

    Ok(())
}
