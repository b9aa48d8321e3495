//! Headless mode runner - main event loop
//!
//! Starts one panel action, then multiplexes engine events, stdin commands
//! and the tuning deadline until the panel goes idle or `quit` is read.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use gpanel_app::config::{default_state_path, load_state, PanelState};
use gpanel_app::{ChannelList, Panel, PanelEvent, PanelPaths, Settings};
use gpanel_core::prelude::*;
use gpanel_core::{Channel, DeviceRole, EngineEvent};
use gpanel_engine::{EngineControl, ProcessSupervisor};

use super::HeadlessEvent;

/// Slack on top of the stop grace period for the kill and the output drain
const EXIT_REPORT_MARGIN: Duration = Duration::from_secs(1);

/// What the panel does first
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartAction {
    Play(PathBuf),
    Tune(Channel),
    Scan,
    /// Run in a device role; `None` uses `behavior.run_as`
    Run(Option<DeviceRole>),
}

/// Commands read from stdin while running
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Stop,
    AbortScan,
    /// Answer to the keep-waiting prompt
    KeepWaiting(bool),
    NextChannel,
    PreviousChannel,
    /// Raw line for the engine
    Send(String),
    Quit,
}

/// Parse one stdin line; `None` for blank or unknown input
pub fn parse_command(line: &str) -> Option<Command> {
    let trimmed = line.trim();
    if let Some(text) = trimmed.strip_prefix("send ") {
        return Some(Command::Send(text.to_string()));
    }
    match trimmed {
        "s" | "stop" => Some(Command::Stop),
        "a" | "abort" => Some(Command::AbortScan),
        "y" | "wait" => Some(Command::KeepWaiting(true)),
        "n" | "no-wait" => Some(Command::KeepWaiting(false)),
        "+" | "next" => Some(Command::NextChannel),
        "-" | "prev" => Some(Command::PreviousChannel),
        "q" | "quit" => Some(Command::Quit),
        _ => None,
    }
}

/// Run in headless mode - output JSON events until the panel goes idle
pub async fn run_headless(
    mut settings: Settings,
    catalog: ChannelList,
    action: StartAction,
) -> Result<()> {
    info!("═══════════════════════════════════════════════════════");
    info!("Ginga Panel starting in HEADLESS mode");
    info!("Action: {:?}", action);
    info!("═══════════════════════════════════════════════════════");

    if let StartAction::Run(Some(role)) = &action {
        settings.behavior.run_as = *role;
    }

    let state = default_state_path()
        .map(|path| load_state(&path))
        .unwrap_or_else(PanelState::default);
    let (engine, mut engine_rx) = ProcessSupervisor::with_channel(settings.engine.supervisor_config());
    let mut panel = Panel::new(engine, settings, state, PanelPaths::default()).with_catalog(catalog);

    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(16);
    std::thread::spawn(move || {
        spawn_stdin_reader_blocking(cmd_tx);
    });

    let result = drive_panel(&mut panel, &mut engine_rx, &mut cmd_rx, action).await;
    info!("Ginga Panel headless mode exiting");
    result
}

/// Run `action` until the panel goes idle or quit is read, then stop the
/// engine and wait for it to go away.
///
/// The engine gets its quit token and grace period before this returns.
pub async fn drive_panel<E: EngineControl>(
    panel: &mut Panel<E>,
    engine_rx: &mut mpsc::Receiver<EngineEvent>,
    cmd_rx: &mut mpsc::Receiver<Command>,
    action: StartAction,
) -> Result<()> {
    let result = match start(panel, action) {
        Ok(events) => {
            emit_all(&events);
            headless_event_loop(panel, engine_rx, cmd_rx).await
        }
        Err(e) => {
            error!("Failed to start: {}", e);
            HeadlessEvent::error(e.to_string(), true).emit();
            Err(e)
        }
    };

    emit_all(&panel.stop());
    let limit = panel.settings().engine.stop_grace() + EXIT_REPORT_MARGIN;
    await_engine_exit(panel, engine_rx, limit).await;
    result
}

fn start<E: EngineControl>(panel: &mut Panel<E>, action: StartAction) -> Result<Vec<PanelEvent>> {
    match action {
        StartAction::Play(path) => {
            let mut events = panel.load(&path)?;
            if !panel.settings().behavior.autoplay {
                events.extend(panel.play()?);
            }
            Ok(events)
        }
        StartAction::Tune(channel) => Ok(panel.tune(channel)),
        StartAction::Scan => Ok(panel.scan()),
        StartAction::Run(_) => panel.run(),
    }
}

/// Main headless event loop
async fn headless_event_loop<E: EngineControl>(
    panel: &mut Panel<E>,
    engine_rx: &mut mpsc::Receiver<EngineEvent>,
    cmd_rx: &mut mpsc::Receiver<Command>,
) -> Result<()> {
    loop {
        if !panel.is_active() {
            info!("Panel is idle");
            break;
        }

        let deadline = panel.next_deadline();
        tokio::select! {
            event = engine_rx.recv() => match event {
                Some(event) => {
                    trace!("Engine event: {}", event.label());
                    emit_all(&panel.handle_engine_event(&event));
                }
                None => {
                    warn!("Engine event channel closed");
                    return Err(Error::ChannelClosed);
                }
            },
            Some(command) = cmd_rx.recv() => {
                if apply_command(panel, command) {
                    info!("Quit requested");
                    break;
                }
            }
            _ = wait_for(deadline) => {
                emit_all(&panel.on_deadline(Instant::now()));
            }
        }
    }

    Ok(())
}

/// Returns true when the loop should exit
fn apply_command<E: EngineControl>(panel: &mut Panel<E>, command: Command) -> bool {
    debug!("Stdin command: {:?}", command);
    let events = match command {
        Command::Stop => panel.stop(),
        Command::AbortScan => panel.abort_scan(),
        Command::KeepWaiting(keep) => panel.resolve_timeout(keep),
        Command::NextChannel => panel.next_channel(),
        Command::PreviousChannel => panel.previous_channel(),
        Command::Send(text) => {
            if let Err(e) = panel.send_command(&text) {
                HeadlessEvent::error(e.to_string(), e.is_fatal()).emit();
            }
            Vec::new()
        }
        Command::Quit => return true,
    };
    emit_all(&events);
    false
}

/// Keep routing engine events until every stopped run has reported its exit
async fn await_engine_exit<E: EngineControl>(
    panel: &mut Panel<E>,
    engine_rx: &mut mpsc::Receiver<EngineEvent>,
    limit: Duration,
) {
    let drain = async {
        while panel.engine().awaiting_exit() {
            match engine_rx.recv().await {
                Some(event) => emit_all(&panel.handle_engine_event(&event)),
                None => break,
            }
        }
    };
    if tokio::time::timeout(limit, drain).await.is_err() {
        warn!("Engine did not report its exit within {:?}", limit);
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

fn emit_all(events: &[PanelEvent]) {
    for event in events {
        HeadlessEvent::from(event).emit();
    }
}

/// Read commands from stdin (blocking)
fn spawn_stdin_reader_blocking(cmd_tx: mpsc::Sender<Command>) {
    use std::io::BufRead;

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        match line {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let Some(command) = parse_command(&line) else {
                    warn!("Unknown stdin command: {}", line.trim());
                    continue;
                };
                let quit = command == Command::Quit;
                if cmd_tx.blocking_send(command).is_err() || quit {
                    break;
                }
            }
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        }
    }

    info!("Stdin reader exiting");
}
