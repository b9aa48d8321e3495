//! Configuration types for Ginga Panel
//!
//! Defines:
//! - `Settings` - User settings (`config.toml`)
//! - `PanelState` - Runtime state persisted between runs (`state.toml`)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use gpanel_core::{Channel, DeviceRole, Geometry};
use gpanel_engine::{platform_defaults, SupervisorConfig, DEFAULT_QUIT_TOKEN};

/// Maximum number of recent documents remembered
pub const MAX_RECENT_FILES: usize = 5;

/// Application settings (config.toml)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub display: DisplaySettings,

    #[serde(default)]
    pub tuning: TuningSettings,

    #[serde(default)]
    pub behavior: BehaviorSettings,

    #[serde(default)]
    pub device: DeviceSettings,
}

/// How the engine is launched
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EngineSettings {
    /// Engine executable; bare names are looked up on PATH
    #[serde(default = "default_binary")]
    pub binary: PathBuf,

    /// Argument template for document playback.
    /// Placeholders: `${FILE}`, `${SCREENSIZE}`, `${WID}`
    #[serde(default = "default_parameters")]
    pub parameters: String,

    /// The engine's context manager file; its directory is passed as
    /// `--context-dir`
    #[serde(default = "default_context_file")]
    pub context_file: PathBuf,

    #[serde(default = "default_quit_token")]
    pub quit_token: String,

    /// Time the engine gets to exit after the quit token
    #[serde(default = "default_stop_grace_ms")]
    pub stop_grace_ms: u64,

    /// Environment overrides. `None` means the platform default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            parameters: default_parameters(),
            context_file: default_context_file(),
            quit_token: default_quit_token(),
            stop_grace_ms: default_stop_grace_ms(),
            env: None,
        }
    }
}

impl EngineSettings {
    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }

    /// Directory handed to the engine as `--context-dir`
    pub fn context_dir(&self) -> PathBuf {
        self.context_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    pub fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            quit_token: self.quit_token.clone(),
            stop_grace: self.stop_grace(),
        }
    }

    /// Configured overrides, or the defaults for this OS
    pub fn environment(&self) -> BTreeMap<String, String> {
        self.env
            .clone()
            .unwrap_or_else(|| platform_defaults(std::env::consts::OS))
    }
}

fn default_binary() -> PathBuf {
    PathBuf::from("/usr/bin/ginga")
}

fn default_parameters() -> String {
    "${FILE} --vmode ${SCREENSIZE}".to_string()
}

fn default_context_file() -> PathBuf {
    PathBuf::from("/usr/etc/ginga/files/contextmanager/contexts.ini")
}

fn default_quit_token() -> String {
    DEFAULT_QUIT_TOKEN.to_string()
}

fn default_stop_grace_ms() -> u64 {
    2000
}

/// Where the engine renders
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DisplaySettings {
    #[serde(default)]
    pub screen_size: Geometry,

    /// Window-id token of the main view
    #[serde(default = "default_window_id")]
    pub window_id: String,

    /// Window-id token of the scan progress surface
    #[serde(default = "default_window_id")]
    pub progress_window_id: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            screen_size: Geometry::default(),
            window_id: default_window_id(),
            progress_window_id: default_window_id(),
        }
    }
}

fn default_window_id() -> String {
    "0".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TuningSettings {
    /// Tuner scheme in `--set-tuner <scheme>:<frequency>`
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Seconds before the keep-waiting prompt
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TuningSettings {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl TuningSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_scheme() -> String {
    "sbtvdt".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct BehaviorSettings {
    /// Pass `--enable-log file` to the engine
    #[serde(default)]
    pub enable_log: bool,

    /// Play documents as soon as they are loaded
    #[serde(default)]
    pub autoplay: bool,

    /// Role used by `run`
    #[serde(default)]
    pub run_as: DeviceRole,

    /// Append every engine line to this file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer_log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DeviceSettings {
    #[serde(default = "default_port_floor")]
    pub port_floor: u16,

    #[serde(default = "default_port_ceiling")]
    pub port_ceiling: u16,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            port_floor: default_port_floor(),
            port_ceiling: default_port_ceiling(),
        }
    }
}

fn default_port_floor() -> u16 {
    22222
}

fn default_port_ceiling() -> u16 {
    33333
}

// ─────────────────────────────────────────────────────────────────────────────
// Persisted panel state
// ─────────────────────────────────────────────────────────────────────────────

/// State remembered between runs (state.toml)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PanelState {
    /// Last persisted active-device port counter
    #[serde(default)]
    pub device_port: Option<u16>,

    /// Most recent first, no duplicates
    #[serde(default)]
    pub recent_files: Vec<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_dir_opened: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_channel: Option<Channel>,
}

impl PanelState {
    /// Move `path` to the front of the recent list
    pub fn push_recent(&mut self, path: &Path) {
        self.recent_files.retain(|p| p != path);
        self.recent_files.insert(0, path.to_path_buf());
        self.recent_files.truncate(MAX_RECENT_FILES);
    }

    pub fn clear_recent(&mut self) {
        self.recent_files.clear();
    }

    /// Last channel, if it can be tuned
    pub fn replayable_channel(&self) -> Option<&Channel> {
        self.last_channel.as_ref().filter(|c| !c.is_null())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.engine.binary, PathBuf::from("/usr/bin/ginga"));
        assert_eq!(settings.engine.parameters, "${FILE} --vmode ${SCREENSIZE}");
        assert_eq!(settings.engine.quit_token, "quit\n");
        assert_eq!(settings.engine.stop_grace(), Duration::from_millis(2000));
        assert_eq!(settings.display.screen_size, Geometry::new(640, 480));
        assert_eq!(settings.tuning.scheme, "sbtvdt");
        assert_eq!(settings.tuning.timeout(), Duration::from_secs(15));
        assert_eq!(settings.behavior.run_as, DeviceRole::Base);
        assert_eq!(settings.device.port_floor, 22222);
        assert_eq!(settings.device.port_ceiling, 33333);
    }

    #[test]
    fn test_context_dir_is_parent_of_context_file() {
        let settings = EngineSettings::default();
        assert_eq!(
            settings.context_dir(),
            PathBuf::from("/usr/etc/ginga/files/contextmanager")
        );
    }

    #[test]
    fn test_environment_override_replaces_platform_default() {
        let mut settings = EngineSettings::default();
        assert_eq!(settings.environment(), platform_defaults(std::env::consts::OS));

        let mut env = BTreeMap::new();
        env.insert("GINGA_HOME".to_string(), "/opt/ginga".to_string());
        settings.env = Some(env.clone());
        assert_eq!(settings.environment(), env);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let content = r#"
[display]
screen_size = "1280x720"

[behavior]
run_as = "active"
"#;
        let settings: Settings = toml::from_str(content).unwrap();
        assert_eq!(settings.display.screen_size, Geometry::new(1280, 720));
        assert_eq!(settings.display.window_id, "0");
        assert_eq!(settings.behavior.run_as, DeviceRole::Active);
        assert_eq!(settings.tuning.timeout_secs, 15);
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        let content = "[display]\nscreen_size = \"wide\"\n";
        assert!(toml::from_str::<Settings>(content).is_err());
    }

    #[test]
    fn test_push_recent_dedups_and_caps() {
        let mut state = PanelState::default();
        for name in ["a", "b", "c", "d", "e", "f"] {
            state.push_recent(Path::new(&format!("/docs/{name}.ncl")));
        }
        assert_eq!(state.recent_files.len(), MAX_RECENT_FILES);
        assert_eq!(state.recent_files[0], PathBuf::from("/docs/f.ncl"));

        state.push_recent(Path::new("/docs/d.ncl"));
        assert_eq!(state.recent_files.len(), MAX_RECENT_FILES);
        assert_eq!(state.recent_files[0], PathBuf::from("/docs/d.ncl"));
        assert_eq!(
            state
                .recent_files
                .iter()
                .filter(|p| **p == PathBuf::from("/docs/d.ncl"))
                .count(),
            1
        );

        state.clear_recent();
        assert!(state.recent_files.is_empty());
    }

    #[test]
    fn test_replayable_channel_skips_null() {
        let mut state = PanelState::default();
        assert!(state.replayable_channel().is_none());
        state.last_channel = Some(Channel::null());
        assert!(state.replayable_channel().is_none());
        state.last_channel = Some(Channel::new("647142", "5", "TV"));
        assert_eq!(state.replayable_channel().unwrap().frequency, "647142");
    }
}
