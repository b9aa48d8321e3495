//! Panel controller
//!
//! Owns the engine and at most one workflow session. Every user action stops
//! the previous session before starting its own, so there is never more than
//! one engine and one workflow alive. Engine events pass through
//! [`EngineControl::observe`] first; events from a run that is no longer
//! current are logged to the developer log and otherwise dropped.

use std::path::{Path, PathBuf};
use std::time::Instant;

use gpanel_core::prelude::*;
use gpanel_core::{Channel, DeviceRole, EngineEvent, TuneOutcome};
use gpanel_engine::{
    active_device, next_device_port, parse_line, passive_device, play_document, DocumentKind,
    EngineControl, LaunchContext, ProcessSupervisor,
};

use crate::channels::{ChannelCatalog, ChannelList};
use crate::cleanup::{default_carousel_dir, remove_carousel};
use crate::config::{default_state_path, save_state, PanelState, Settings};
use crate::devlog::{DeveloperLog, DEFAULT_CAPACITY};
use crate::guard::{default_lock_path, PassiveGuard};
use crate::panel_event::PanelEvent;
use crate::workflow::{PlaybackWorkflow, ScanWorkflow, TuningWorkflow};

/// Shown when `play` has neither a document nor a channel to replay
pub const NOTHING_TO_PLAY: &str = "Open a document to play";

/// Filesystem locations the panel touches besides the config file
#[derive(Debug, Clone)]
pub struct PanelPaths {
    /// Where `PanelState` is persisted; `None` keeps it in memory only
    pub state_file: Option<PathBuf>,
    pub passive_lock: PathBuf,
    /// Broadcast data left behind by the engine
    pub carousel_dir: PathBuf,
}

impl Default for PanelPaths {
    fn default() -> Self {
        Self {
            state_file: default_state_path(),
            passive_lock: default_lock_path(),
            carousel_dir: default_carousel_dir(),
        }
    }
}

#[derive(Debug)]
enum Session {
    Idle,
    Tuning(TuningWorkflow),
    Scanning(ScanWorkflow),
    Playback(PlaybackWorkflow),
}

/// What to do with the session after a transition
enum Settle {
    Keep,
    /// Tuning reached the stream; keep the engine as a playback session
    Attach(Channel),
    End,
}

pub struct Panel<E: EngineControl = ProcessSupervisor> {
    engine: E,
    settings: Settings,
    state: PanelState,
    paths: PanelPaths,
    catalog: Box<dyn ChannelCatalog>,
    session: Session,
    devlog: DeveloperLog,
    document: Option<PathBuf>,
    passive_guard: Option<PassiveGuard>,
}

impl<E: EngineControl> Panel<E> {
    pub fn new(engine: E, settings: Settings, state: PanelState, paths: PanelPaths) -> Self {
        let mut devlog = DeveloperLog::new(DEFAULT_CAPACITY);
        if let Some(path) = &settings.behavior.developer_log_file {
            if let Err(e) = devlog.mirror_to(path) {
                warn!("Developer log will not be mirrored to {:?}: {}", path, e);
            }
        }

        Self {
            engine,
            settings,
            state,
            paths,
            catalog: Box::new(ChannelList::default()),
            session: Session::Idle,
            devlog,
            document: None,
            passive_guard: None,
        }
    }

    pub fn with_catalog(mut self, catalog: impl ChannelCatalog + 'static) -> Self {
        self.catalog = Box::new(catalog);
        self
    }

    // ─────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn devlog(&self) -> &DeveloperLog {
        &self.devlog
    }

    pub fn document(&self) -> Option<&Path> {
        self.document.as_deref()
    }

    pub fn catalog(&self) -> &dyn ChannelCatalog {
        self.catalog.as_ref()
    }

    /// True while a workflow owns the engine
    pub fn is_active(&self) -> bool {
        !matches!(self.session, Session::Idle)
    }

    pub fn is_scanning(&self) -> bool {
        matches!(self.session, Session::Scanning(_))
    }

    pub fn is_prompting(&self) -> bool {
        matches!(&self.session, Session::Tuning(w) if w.is_prompting())
    }

    pub fn holds_passive_lock(&self) -> bool {
        self.passive_guard.is_some()
    }

    /// Settings snapshot for the next launch
    pub fn launch_context(&self) -> LaunchContext {
        LaunchContext {
            program: self.settings.engine.binary.clone(),
            window_id: self.settings.display.window_id.clone(),
            geometry: self.settings.display.screen_size,
            context_dir: self.settings.engine.context_dir(),
            enable_log: self.settings.behavior.enable_log,
            tuner_scheme: self.settings.tuning.scheme.clone(),
            env: self.settings.engine.environment(),
        }
    }

    // ─────────────────────────────────────────────────────────
    // Documents
    // ─────────────────────────────────────────────────────────

    /// Select a document for playback; plays it right away with autoplay on
    pub fn load(&mut self, path: &Path) -> Result<Vec<PanelEvent>> {
        let resolved = dunce::canonicalize(path)
            .with_context(|| format!("Failed to open document {:?}", path))?;
        if DocumentKind::from_path(&resolved).is_none() {
            return Err(Error::unsupported_document(resolved));
        }

        info!("Loaded document {:?}", resolved);
        self.state.push_recent(&resolved);
        self.state.last_dir_opened = resolved.parent().map(Path::to_path_buf);
        self.persist_state();
        self.document = Some(resolved.clone());

        let mut events = vec![PanelEvent::DocumentLoaded { path: resolved }];
        if self.settings.behavior.autoplay {
            events.extend(self.play()?);
        }
        Ok(events)
    }

    /// Play the loaded document, else replay the last channel
    pub fn play(&mut self) -> Result<Vec<PanelEvent>> {
        if let Some(document) = self.document.clone() {
            return self.start_document(&document);
        }
        if let Some(channel) = self.state.replayable_channel().cloned() {
            debug!("No document loaded, replaying {}", channel.label());
            return Ok(self.tune(channel));
        }
        Ok(vec![PanelEvent::info(NOTHING_TO_PLAY)])
    }

    fn start_document(&mut self, document: &Path) -> Result<Vec<PanelEvent>> {
        let command = play_document(
            &self.launch_context(),
            &self.settings.engine.parameters,
            document,
        )?;

        let mut events = self.stop_session();
        self.begin_session();

        let mut workflow = PlaybackWorkflow::new();
        events.extend(workflow.start(&mut self.engine, &command, document.display().to_string()));
        self.session = Session::Playback(workflow);
        self.settle();
        Ok(events)
    }

    // ─────────────────────────────────────────────────────────
    // Channels
    // ─────────────────────────────────────────────────────────

    /// Tune `channel`; null channels are ignored
    pub fn tune(&mut self, channel: Channel) -> Vec<PanelEvent> {
        if channel.is_null() {
            debug!("Ignoring tune request for a null channel");
            return Vec::new();
        }

        let mut events = self.stop_session();
        self.begin_session();
        // Play replays whatever ran last
        self.document = None;
        self.state.last_channel = Some(channel.clone());
        self.persist_state();

        let ctx = self.launch_context();
        let mut workflow = TuningWorkflow::new(self.settings.tuning.timeout());
        events.extend(workflow.start(&mut self.engine, &ctx, channel, Instant::now()));
        self.session = Session::Tuning(workflow);
        self.settle();
        events
    }

    pub fn next_channel(&mut self) -> Vec<PanelEvent> {
        let current = self.state.last_channel.clone().unwrap_or_default();
        let next = self.catalog.next_after(&current);
        self.tune(next)
    }

    pub fn previous_channel(&mut self) -> Vec<PanelEvent> {
        let current = self.state.last_channel.clone().unwrap_or_default();
        let previous = self.catalog.previous_before(&current);
        self.tune(previous)
    }

    /// Answer the keep-waiting prompt
    pub fn resolve_timeout(&mut self, keep_waiting: bool) -> Vec<PanelEvent> {
        let events = match &mut self.session {
            Session::Tuning(w) => w.resolve_timeout(&mut self.engine, keep_waiting),
            _ => Vec::new(),
        };
        self.settle();
        events
    }

    /// Fire the tuning deadline if it is due
    pub fn on_deadline(&mut self, now: Instant) -> Vec<PanelEvent> {
        match &mut self.session {
            Session::Tuning(w) => w.on_deadline(now),
            _ => Vec::new(),
        }
    }

    /// When the front end should next call [`Panel::on_deadline`]
    pub fn next_deadline(&self) -> Option<Instant> {
        match &self.session {
            Session::Tuning(w) => w.deadline(),
            _ => None,
        }
    }

    pub fn scan(&mut self) -> Vec<PanelEvent> {
        let mut events = self.stop_session();
        self.begin_session();

        let ctx = self.launch_context();
        let mut workflow = ScanWorkflow::new();
        events.extend(workflow.start(
            &mut self.engine,
            &ctx,
            &self.settings.display.progress_window_id,
        ));
        self.session = Session::Scanning(workflow);
        self.settle();
        events
    }

    pub fn abort_scan(&mut self) -> Vec<PanelEvent> {
        let events = match &mut self.session {
            Session::Scanning(w) => w.abort(&mut self.engine),
            _ => Vec::new(),
        };
        self.settle();
        events
    }

    // ─────────────────────────────────────────────────────────
    // Device roles
    // ─────────────────────────────────────────────────────────

    /// Start in the configured role
    pub fn run(&mut self) -> Result<Vec<PanelEvent>> {
        match self.settings.behavior.run_as {
            DeviceRole::Base => self.play(),
            DeviceRole::Passive => self.run_as_passive(),
            DeviceRole::Active => Ok(self.run_as_active()),
        }
    }

    /// Join a multi-device presentation as a passive device. Only one passive
    /// client may run per host.
    pub fn run_as_passive(&mut self) -> Result<Vec<PanelEvent>> {
        // A refused lock leaves the current session running
        let guard = match self.passive_guard.take() {
            Some(guard) => guard,
            None => PassiveGuard::acquire(&self.paths.passive_lock)?,
        };
        let mut events = self.stop_session();
        self.begin_session();

        let command = passive_device(&self.launch_context());
        let mut workflow = PlaybackWorkflow::new();
        events.extend(workflow.start(&mut self.engine, &command, "passive device"));
        self.session = Session::Playback(workflow);
        self.passive_guard = Some(guard);
        self.settle();
        Ok(events)
    }

    /// Serve a multi-device presentation as the active device
    pub fn run_as_active(&mut self) -> Vec<PanelEvent> {
        let mut events = self.stop_session();
        self.begin_session();

        let device = &self.settings.device;
        let stored = self.state.device_port.unwrap_or(device.port_floor);
        let port = next_device_port(stored, device.port_floor, device.port_ceiling);
        self.state.device_port = Some(port.store);
        self.persist_state();

        let command = active_device(&self.launch_context(), port.serve);
        let mut workflow = PlaybackWorkflow::new();
        events.extend(workflow.start(
            &mut self.engine,
            &command,
            format!("active device on port {}", port.serve),
        ));
        self.session = Session::Playback(workflow);
        self.settle();
        events
    }

    // ─────────────────────────────────────────────────────────
    // Control
    // ─────────────────────────────────────────────────────────

    /// End whatever is running
    pub fn stop(&mut self) -> Vec<PanelEvent> {
        self.stop_session()
    }

    /// Write one line of text to the engine
    pub fn send_command(&mut self, text: &str) -> Result<usize> {
        self.engine.write(format!("{}\n", text).as_bytes())
    }

    pub fn clear_recent(&mut self) {
        self.state.clear_recent();
        self.persist_state();
    }

    // ─────────────────────────────────────────────────────────
    // Engine events
    // ─────────────────────────────────────────────────────────

    /// Route one engine event into the running workflow
    pub fn handle_engine_event(&mut self, event: &EngineEvent) -> Vec<PanelEvent> {
        if let EngineEvent::Output { stream, line, .. } = event {
            self.devlog.append(*stream, line);
        }

        if !self.engine.observe(event) {
            trace!("Dropping {} from stale run {}", event.label(), event.run());
            return Vec::new();
        }

        let mut events = Vec::new();
        match event {
            EngineEvent::Output { stream, line, .. } => {
                events.push(PanelEvent::EngineOutput {
                    stream: *stream,
                    line: line.clone(),
                });

                let parsed = parse_line(line);
                if !parsed.is_log() {
                    debug!("Engine command: {:?}", parsed);
                }
                events.extend(match &mut self.session {
                    Session::Idle => Vec::new(),
                    Session::Tuning(w) => w.on_protocol(&mut self.engine, &parsed),
                    Session::Scanning(w) => w.on_protocol(&mut self.engine, &parsed),
                    Session::Playback(w) => w.on_protocol(&mut self.engine, &parsed),
                });
            }
            EngineEvent::Exited { code, kind, .. } => {
                debug!("Engine exited: {:?} ({:?})", code, kind);
                events.extend(match &mut self.session {
                    Session::Idle => Vec::new(),
                    Session::Tuning(w) => w.on_exit(*code),
                    Session::Scanning(w) => w.on_exit(*code),
                    Session::Playback(w) => w.on_exit(*code),
                });
            }
            EngineEvent::SpawnFailed { reason, .. } => {
                debug!("Spawn failure already reported: {}", reason);
            }
        }

        self.settle();
        events
    }

    // ─────────────────────────────────────────────────────────
    // Session bookkeeping
    // ─────────────────────────────────────────────────────────

    /// Fresh session: empty developer log, no stale carousel data
    fn begin_session(&mut self) {
        self.devlog.clear();
        remove_carousel(&self.paths.carousel_dir);
    }

    fn stop_session(&mut self) -> Vec<PanelEvent> {
        let events = match &mut self.session {
            Session::Idle => Vec::new(),
            Session::Tuning(w) => w.cancel(&mut self.engine),
            Session::Scanning(w) => w.abort(&mut self.engine),
            Session::Playback(w) => w.stop(&mut self.engine),
        };
        self.engine.stop();
        self.end_session();
        events
    }

    fn settle(&mut self) {
        let action = match &self.session {
            Session::Idle => Settle::Keep,
            Session::Tuning(w) => match w.state().outcome() {
                Some(TuneOutcome::Streaming) => Settle::Attach(w.channel().clone()),
                Some(_) => Settle::End,
                None => Settle::Keep,
            },
            Session::Scanning(w) if w.state().is_terminated() => Settle::End,
            Session::Playback(w) if w.state().is_terminated() => Settle::End,
            _ => Settle::Keep,
        };

        match action {
            Settle::Keep => {}
            Settle::Attach(channel) => {
                info!("Now playing {}", channel.label());
                self.session = Session::Playback(PlaybackWorkflow::attached(channel.label()));
            }
            Settle::End => self.end_session(),
        }
    }

    fn end_session(&mut self) {
        if matches!(self.session, Session::Idle) {
            return;
        }
        self.session = Session::Idle;
        self.passive_guard = None;
        remove_carousel(&self.paths.carousel_dir);
    }

    fn persist_state(&self) {
        let Some(path) = &self.paths.state_file else {
            return;
        };
        if let Err(e) = save_state(path, &self.state) {
            warn!("Failed to save panel state: {}", e);
        }
    }
}
