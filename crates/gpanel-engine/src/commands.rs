//! Engine command-line construction
//!
//! Pure functions that turn a requested action (play a document, tune a
//! channel, scan, run as a passive/active device) into the argument list and
//! environment handed to the engine. All inputs come from a [`LaunchContext`]
//! snapshot taken by the caller; nothing here reads settings or global state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use gpanel_core::prelude::*;
use gpanel_core::{DeviceRole, Geometry};

// ─────────────────────────────────────────────────────────
// Flags and placeholders
// ─────────────────────────────────────────────────────────

pub const FLAG_NCL: &str = "--ncl";
pub const FLAG_SET_TUNER: &str = "--set-tuner";
pub const FLAG_CONTEXT_DIR: &str = "--context-dir";
pub const FLAG_ENABLE_LOG: &str = "--enable-log";
pub const FLAG_VMODE: &str = "--vmode";
pub const FLAG_WID: &str = "--wid";
pub const FLAG_POLL_STDIN: &str = "--poll-stdin";
pub const FLAG_DEVICE_CLASS: &str = "--device-class";
pub const FLAG_DEVICE_SRV_PORT: &str = "--device-srv-port";
pub const FLAG_DISABLE_MULTICAST: &str = "--disable-multicast";

/// Value of `--enable-log`
const LOG_TARGET: &str = "file";

/// Frequency token that makes the tuner sweep instead of tune
pub const SCAN_FREQUENCY: &str = "scan";

pub const PLACEHOLDER_FILE: &str = "${FILE}";
pub const PLACEHOLDER_WID: &str = "${WID}";
pub const PLACEHOLDER_SCREENSIZE: &str = "${SCREENSIZE}";

// ─────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────

/// A fully resolved engine invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Overrides merged on top of the inherited environment
    pub env: BTreeMap<String, String>,
    pub working_dir: Option<PathBuf>,
}

impl EngineCommand {
    /// Command line for logs, e.g. `/usr/bin/ginga --ncl main.ncl`
    pub fn display(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Snapshot of everything the builders need, taken when the action starts
#[derive(Debug, Clone)]
pub struct LaunchContext {
    pub program: PathBuf,
    /// Window-id token of the main view
    pub window_id: String,
    pub geometry: Geometry,
    /// Directory holding the engine's context file
    pub context_dir: PathBuf,
    /// Adds `--enable-log file`
    pub enable_log: bool,
    /// Tuner scheme, e.g. `sbtvdt`
    pub tuner_scheme: String,
    pub env: BTreeMap<String, String>,
}

impl LaunchContext {
    fn command(&self, args: Vec<String>) -> EngineCommand {
        EngineCommand {
            program: self.program.clone(),
            args,
            env: self.env.clone(),
            working_dir: None,
        }
    }

    fn push_log_flag(&self, args: &mut Vec<String>) {
        if self.enable_log {
            args.push(FLAG_ENABLE_LOG.to_string());
            args.push(LOG_TARGET.to_string());
        }
    }
}

/// Playable document kinds, decided by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// `.ncl` interactive application
    Ncl,
    /// `.ts` transport stream played through the tuner
    TransportStream,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("ncl") {
            Some(Self::Ncl)
        } else if ext.eq_ignore_ascii_case("ts") {
            Some(Self::TransportStream)
        } else {
            None
        }
    }

    fn mode_flag(self) -> &'static str {
        match self {
            Self::Ncl => FLAG_NCL,
            Self::TransportStream => FLAG_SET_TUNER,
        }
    }

    fn file_argument(self, path: &Path) -> String {
        match self {
            Self::Ncl => path.display().to_string(),
            Self::TransportStream => format!("file:{}", path.display()),
        }
    }
}

// ─────────────────────────────────────────────────────────
// Builders
// ─────────────────────────────────────────────────────────

/// Play a local document.
///
/// `template` is the user's parameter template (e.g.
/// `${FILE} --vmode ${SCREENSIZE}`). Context dir, window id and the log flag
/// are appended in that order, then the mode flag is put in front. If the
/// template has no `${FILE}`, the file argument goes right after the mode
/// flag. `document` should already be absolute; its parent becomes the
/// working directory.
pub fn play_document(ctx: &LaunchContext, template: &str, document: &Path) -> Result<EngineCommand> {
    let kind = DocumentKind::from_path(document)
        .ok_or_else(|| Error::unsupported_document(document))?;

    let mut args = split_parameters(template);
    args.push(FLAG_CONTEXT_DIR.to_string());
    args.push(ctx.context_dir.display().to_string());
    args.push(FLAG_WID.to_string());
    args.push(ctx.window_id.clone());
    ctx.push_log_flag(&mut args);

    let file_arg = kind.file_argument(document);
    let has_file_placeholder = args.iter().any(|a| a.contains(PLACEHOLDER_FILE));

    args.insert(0, kind.mode_flag().to_string());
    if !has_file_placeholder {
        args.insert(1, file_arg.clone());
    }

    let screen = ctx.geometry.to_string();
    for arg in &mut args {
        substitute(arg, PLACEHOLDER_FILE, &file_arg);
        substitute(arg, PLACEHOLDER_WID, &ctx.window_id);
        substitute(arg, PLACEHOLDER_SCREENSIZE, &screen);
    }

    let mut command = ctx.command(args);
    command.working_dir = document.parent().map(Path::to_path_buf);
    Ok(command)
}

/// Tune a broadcast channel by frequency
pub fn tune_channel(ctx: &LaunchContext, frequency: &str) -> EngineCommand {
    ctx.command(tuner_args(ctx, frequency, &ctx.window_id))
}

/// Sweep the tuner, rendering progress into `progress_window_id`
pub fn scan_channels(ctx: &LaunchContext, progress_window_id: &str) -> EngineCommand {
    ctx.command(tuner_args(ctx, SCAN_FREQUENCY, progress_window_id))
}

fn tuner_args(ctx: &LaunchContext, frequency: &str, window_id: &str) -> Vec<String> {
    let mut args = vec![
        FLAG_SET_TUNER.to_string(),
        format!("{}:{}", ctx.tuner_scheme, frequency),
        FLAG_VMODE.to_string(),
        ctx.geometry.to_string(),
    ];
    ctx.push_log_flag(&mut args);
    args.extend([
        FLAG_WID.to_string(),
        window_id.to_string(),
        FLAG_POLL_STDIN.to_string(),
    ]);
    args
}

/// Run as a passive (secondary) device
pub fn passive_device(ctx: &LaunchContext) -> EngineCommand {
    let mut args = vec![
        FLAG_WID.to_string(),
        ctx.window_id.clone(),
        FLAG_DEVICE_CLASS.to_string(),
        device_class(DeviceRole::Passive),
        FLAG_VMODE.to_string(),
        ctx.geometry.to_string(),
        FLAG_CONTEXT_DIR.to_string(),
        ctx.context_dir.display().to_string(),
        FLAG_DISABLE_MULTICAST.to_string(),
    ];
    ctx.push_log_flag(&mut args);
    ctx.command(args)
}

/// Run as an active (primary) device serving on `port`
pub fn active_device(ctx: &LaunchContext, port: u16) -> EngineCommand {
    let mut args = vec![
        FLAG_WID.to_string(),
        ctx.window_id.clone(),
        FLAG_DEVICE_CLASS.to_string(),
        device_class(DeviceRole::Active),
        FLAG_DEVICE_SRV_PORT.to_string(),
        port.to_string(),
        FLAG_VMODE.to_string(),
        ctx.geometry.to_string(),
        FLAG_CONTEXT_DIR.to_string(),
        ctx.context_dir.display().to_string(),
    ];
    ctx.push_log_flag(&mut args);
    ctx.command(args)
}

fn device_class(role: DeviceRole) -> String {
    role.device_class().unwrap_or_default().to_string()
}

// ─────────────────────────────────────────────────────────
// Device port counter
// ─────────────────────────────────────────────────────────

/// Port to serve on and the counter value to persist afterwards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DevicePort {
    pub serve: u16,
    pub store: u16,
}

/// Advance the persisted active-device port counter.
///
/// The port used is always `stored + 1`. Once that exceeds `ceiling` the
/// persisted counter wraps back to `floor` for the next run.
pub fn next_device_port(stored: u16, floor: u16, ceiling: u16) -> DevicePort {
    let serve = stored.saturating_add(1);
    let store = if serve > ceiling { floor } else { serve };
    DevicePort { serve, store }
}

// ─────────────────────────────────────────────────────────
// Template helpers
// ─────────────────────────────────────────────────────────

/// Split a parameter template on whitespace, keeping quoted runs together.
///
/// Both `'` and `"` quote; the quotes themselves are dropped.
/// `--title "My App" ${FILE}` → `["--title", "My App", "${FILE}"]`
pub fn split_parameters(template: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for c in template.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    args.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_token {
        args.push(current);
    }
    args
}

fn substitute(arg: &mut String, placeholder: &str, value: &str) {
    if arg.contains(placeholder) {
        *arg = arg.replace(placeholder, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> LaunchContext {
        LaunchContext {
            program: PathBuf::from("/usr/bin/ginga"),
            window_id: "0x3a00007".to_string(),
            geometry: Geometry::new(800, 600),
            context_dir: PathBuf::from("/usr/etc/ginga/files/contextmanager"),
            enable_log: false,
            tuner_scheme: "sbtvdt".to_string(),
            env: BTreeMap::new(),
        }
    }

    fn strs(args: &[String]) -> Vec<&str> {
        args.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_play_ncl_document() {
        let cmd = play_document(
            &ctx(),
            "${FILE} --vmode ${SCREENSIZE}",
            Path::new("/home/user/apps/main.ncl"),
        )
        .unwrap();

        assert_eq!(
            strs(&cmd.args),
            vec![
                "--ncl",
                "/home/user/apps/main.ncl",
                "--vmode",
                "800x600",
                "--context-dir",
                "/usr/etc/ginga/files/contextmanager",
                "--wid",
                "0x3a00007",
            ]
        );
        assert_eq!(cmd.working_dir, Some(PathBuf::from("/home/user/apps")));
        assert_eq!(cmd.program, PathBuf::from("/usr/bin/ginga"));
    }

    #[test]
    fn test_play_transport_stream_uses_tuner_and_file_scheme() {
        let mut ctx = ctx();
        ctx.enable_log = true;
        let cmd = play_document(&ctx, "${FILE}", Path::new("/media/capture.ts")).unwrap();

        assert_eq!(
            strs(&cmd.args),
            vec![
                "--set-tuner",
                "file:/media/capture.ts",
                "--context-dir",
                "/usr/etc/ginga/files/contextmanager",
                "--wid",
                "0x3a00007",
                "--enable-log",
                "file",
            ]
        );
    }

    #[test]
    fn test_play_without_file_placeholder_inserts_after_mode_flag() {
        let cmd = play_document(&ctx(), "--vmode ${SCREENSIZE}", Path::new("/a/b.ncl")).unwrap();
        assert_eq!(&strs(&cmd.args)[..4], &["--ncl", "/a/b.ncl", "--vmode", "800x600"]);
    }

    #[test]
    fn test_play_substitutes_wid_placeholder_in_template() {
        let cmd = play_document(&ctx(), "${FILE} --extra-wid=${WID}", Path::new("/a/b.ncl")).unwrap();
        assert!(cmd.args.contains(&"--extra-wid=0x3a00007".to_string()));
    }

    #[test]
    fn test_play_extension_is_case_insensitive() {
        assert!(play_document(&ctx(), "${FILE}", Path::new("/a/MAIN.NCL")).is_ok());
    }

    #[test]
    fn test_play_rejects_unsupported_document() {
        let err = play_document(&ctx(), "${FILE}", Path::new("/a/readme.txt")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedDocument { .. }));
        assert!(play_document(&ctx(), "${FILE}", Path::new("/a/noext")).is_err());
    }

    #[test]
    fn test_tune_channel_args() {
        let cmd = tune_channel(&ctx(), "647142");
        assert_eq!(
            strs(&cmd.args),
            vec![
                "--set-tuner",
                "sbtvdt:647142",
                "--vmode",
                "800x600",
                "--wid",
                "0x3a00007",
                "--poll-stdin",
            ]
        );
        assert_eq!(cmd.working_dir, None);
    }

    #[test]
    fn test_tune_log_flag_precedes_wid() {
        let mut ctx = ctx();
        ctx.enable_log = true;
        let cmd = tune_channel(&ctx, "647142");
        assert_eq!(
            &strs(&cmd.args)[4..],
            &["--enable-log", "file", "--wid", "0x3a00007", "--poll-stdin"]
        );
    }

    #[test]
    fn test_scan_uses_progress_window() {
        let cmd = scan_channels(&ctx(), "0x4c00001");
        assert_eq!(
            strs(&cmd.args),
            vec![
                "--set-tuner",
                "sbtvdt:scan",
                "--vmode",
                "800x600",
                "--wid",
                "0x4c00001",
                "--poll-stdin",
            ]
        );
    }

    #[test]
    fn test_passive_device_args() {
        let cmd = passive_device(&ctx());
        assert_eq!(
            strs(&cmd.args),
            vec![
                "--wid",
                "0x3a00007",
                "--device-class",
                "1",
                "--vmode",
                "800x600",
                "--context-dir",
                "/usr/etc/ginga/files/contextmanager",
                "--disable-multicast",
            ]
        );
    }

    #[test]
    fn test_active_device_args() {
        let mut ctx = ctx();
        ctx.enable_log = true;
        let cmd = active_device(&ctx, 22223);
        assert_eq!(
            strs(&cmd.args),
            vec![
                "--wid",
                "0x3a00007",
                "--device-class",
                "2",
                "--device-srv-port",
                "22223",
                "--vmode",
                "800x600",
                "--context-dir",
                "/usr/etc/ginga/files/contextmanager",
                "--enable-log",
                "file",
            ]
        );
    }

    #[test]
    fn test_environment_is_carried() {
        let mut ctx = ctx();
        ctx.env
            .insert("LD_LIBRARY_PATH".to_string(), "/usr/local/lib".to_string());
        let cmd = tune_channel(&ctx, "1");
        assert_eq!(cmd.env.get("LD_LIBRARY_PATH").map(String::as_str), Some("/usr/local/lib"));
    }

    #[test]
    fn test_next_device_port() {
        assert_eq!(
            next_device_port(22222, 22222, 33333),
            DevicePort {
                serve: 22223,
                store: 22223
            }
        );
        assert_eq!(
            next_device_port(33332, 22222, 33333),
            DevicePort {
                serve: 33333,
                store: 33333
            }
        );
        // Past the ceiling: serve the incremented port, persist the floor
        assert_eq!(
            next_device_port(33333, 22222, 33333),
            DevicePort {
                serve: 33334,
                store: 22222
            }
        );
    }

    #[test]
    fn test_split_parameters() {
        assert_eq!(
            split_parameters("${FILE} --vmode ${SCREENSIZE}"),
            vec!["${FILE}", "--vmode", "${SCREENSIZE}"]
        );
        assert_eq!(
            split_parameters("  --title \"My App\"   'a b'c "),
            vec!["--title", "My App", "a bc"]
        );
        assert_eq!(split_parameters("--empty \"\""), vec!["--empty", ""]);
        assert!(split_parameters("   ").is_empty());
    }

    #[test]
    fn test_command_display() {
        let cmd = tune_channel(&ctx(), "1");
        assert!(cmd.display().starts_with("/usr/bin/ginga --set-tuner sbtvdt:1"));
    }
}
