//! Ginga engine child process

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, Notify};
use tokio::task::JoinHandle;

use crate::commands::EngineCommand;
use gpanel_core::events::{EngineEvent, ExitKind, RunId};
use gpanel_core::prelude::*;
use gpanel_core::OutputStream;

/// Capacity of the queue feeding the stdin writer task
const STDIN_QUEUE: usize = 64;

/// How long the exit report waits for the output readers to hit EOF
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// One running engine process.
///
/// The `Child` handle is moved into a background `wait_for_exit` task that
/// owns the process until it is reaped, so the real exit code is always
/// reported as [`EngineEvent::Exited`]. `EngineProcess` keeps a kill channel
/// to request termination, an atomic flag for synchronous `has_exited()`
/// checks and a [`Notify`] so async callers can await the exit.
pub struct EngineProcess {
    run: RunId,
    /// Raw byte writes queued for the stdin writer task
    stdin_tx: mpsc::Sender<Vec<u8>>,
    pid: Option<u32>,
    /// Tells the wait task to terminate the process after the given grace
    /// period. Consumed on first use (or on drop).
    kill_tx: Option<oneshot::Sender<Duration>>,
    /// Set by the wait task once the child has exited
    exited: Arc<AtomicBool>,
    /// Notified by the wait task immediately after the child exits
    exit_notify: Arc<Notify>,
}

impl EngineProcess {
    /// Launch the engine described by `command`.
    ///
    /// Returns immediately after the OS spawn; output lines and the final
    /// exit are delivered on `event_tx` tagged with `run`.
    pub fn spawn(
        command: &EngineCommand,
        run: RunId,
        event_tx: mpsc::Sender<EngineEvent>,
    ) -> Result<Self> {
        info!("Spawning engine ({}): {}", run, command.display());

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .envs(&command.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::EngineNotFound {
                    path: command.program.clone(),
                }
            } else {
                Error::process_spawn(e.to_string())
            }
        })?;

        let pid = child.id();
        info!("Engine process started with PID: {:?}", pid);

        let (Some(stdin), Some(stdout), Some(stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            return Err(Error::process_spawn("engine stdio pipes unavailable"));
        };

        let (stdin_tx, stdin_rx) = mpsc::channel::<Vec<u8>>(STDIN_QUEUE);
        tokio::spawn(Self::stdin_writer(stdin, stdin_rx));
        let readers = vec![
            tokio::spawn(Self::output_reader(
                stdout,
                run,
                OutputStream::Stdout,
                event_tx.clone(),
            )),
            tokio::spawn(Self::output_reader(
                stderr,
                run,
                OutputStream::Stderr,
                event_tx.clone(),
            )),
        ];

        let exited = Arc::new(AtomicBool::new(false));
        let exit_notify = Arc::new(Notify::new());
        let (kill_tx, kill_rx) = oneshot::channel::<Duration>();

        tokio::spawn(Self::wait_for_exit(
            child,
            run,
            readers,
            kill_rx,
            event_tx,
            Arc::clone(&exited),
            Arc::clone(&exit_notify),
        ));

        Ok(Self {
            run,
            stdin_tx,
            pid,
            kill_tx: Some(kill_tx),
            exited,
            exit_notify,
        })
    }

    /// Background task: owns `child`, waits for it to exit, emits `EngineEvent::Exited`.
    ///
    /// Two ways the task can end:
    /// 1. The engine exits on its own and `child.wait()` resolves.
    /// 2. `kill_rx` fires: the engine gets the grace period to exit after the
    ///    quit token, then it is killed.
    ///
    /// The exit is reported only after the output readers drain, so the last
    /// lines of a run always arrive before its `Exited` event.
    async fn wait_for_exit(
        mut child: Child,
        run: RunId,
        readers: Vec<JoinHandle<()>>,
        kill_rx: oneshot::Receiver<Duration>,
        event_tx: mpsc::Sender<EngineEvent>,
        exited: Arc<AtomicBool>,
        exit_notify: Arc<Notify>,
    ) {
        let status = tokio::select! {
            result = child.wait() => result,
            grace = kill_rx => {
                let grace = grace.unwrap_or(Duration::ZERO);
                match tokio::time::timeout(grace, child.wait()).await {
                    Ok(result) => {
                        info!("Engine ({}) exited within the grace period", run);
                        result
                    }
                    Err(_) => {
                        info!("Engine ({}) still running after {:?}, killing", run, grace);
                        if let Err(e) = child.kill().await {
                            error!("Failed to kill engine process: {}", e);
                        }
                        child.wait().await
                    }
                }
            }
        };

        let (code, kind) = match status {
            Ok(status) => {
                info!("Engine ({}) exited with status: {:?}", run, status);
                match status.code() {
                    Some(code) => (Some(code), ExitKind::Normal),
                    None => (None, ExitKind::Crashed),
                }
            }
            Err(e) => {
                error!("Error waiting for engine process: {}", e);
                (None, ExitKind::Crashed)
            }
        };

        let drained = tokio::time::timeout(OUTPUT_DRAIN_TIMEOUT, async {
            for reader in readers {
                let _ = reader.await;
            }
        })
        .await;
        if drained.is_err() {
            // A grandchild may still hold the pipes open
            warn!("Engine ({}) output still open after exit", run);
        }

        // Flag before the event so has_exited() is true when callers see it
        exited.store(true, Ordering::Release);
        exit_notify.notify_waiters();

        debug!("Sending EngineEvent::Exited {{ run: {}, code: {:?} }}", run, code);
        let _ = event_tx.send(EngineEvent::Exited { run, code, kind }).await;
    }

    /// Read complete lines from one output stream.
    ///
    /// Engine output is not guaranteed to be UTF-8, so bytes are decoded
    /// lossily instead of aborting the stream on the first bad byte.
    async fn output_reader<R>(
        stream: R,
        run: RunId,
        kind: OutputStream,
        tx: mpsc::Sender<EngineEvent>,
    ) where
        R: AsyncRead + Unpin,
    {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    while matches!(buf.last(), Some(b'\n' | b'\r')) {
                        buf.pop();
                    }
                    let line = String::from_utf8_lossy(&buf).into_owned();
                    trace!("{:?}: {}", kind, line);

                    let event = EngineEvent::Output {
                        run,
                        stream: kind,
                        line,
                    };
                    if tx.send(event).await.is_err() {
                        debug!("{:?} channel closed", kind);
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to read engine {:?}: {}", kind, e);
                    break;
                }
            }
        }

        // EOF only means the pipe closed; wait_for_exit reports the exit
        debug!("{:?} reader finished ({})", kind, run);
    }

    /// Write queued bytes to stdin
    async fn stdin_writer(mut stdin: tokio::process::ChildStdin, mut rx: mpsc::Receiver<Vec<u8>>) {
        while let Some(bytes) = rx.recv().await {
            debug!("Writing {} bytes to engine", bytes.len());

            if let Err(e) = stdin.write_all(&bytes).await {
                error!("Failed to write to stdin: {}", e);
                break;
            }
            if let Err(e) = stdin.flush().await {
                error!("Failed to flush stdin: {}", e);
                break;
            }
        }

        debug!("stdin writer finished");
    }

    /// Queue bytes for the engine's input stream without blocking.
    pub fn write(&self, bytes: &[u8]) -> Result<usize> {
        if self.has_exited() {
            return Err(Error::NotRunning);
        }
        match self.stdin_tx.try_send(bytes.to_vec()) {
            Ok(()) => Ok(bytes.len()),
            Err(TrySendError::Closed(_)) => Err(Error::StdinClosed),
            Err(TrySendError::Full(_)) => Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::WouldBlock,
                "engine input queue is full",
            ))),
        }
    }

    /// Request termination: the engine gets `grace` to exit on its own
    /// before it is killed. Returns without waiting; the exit is reported
    /// through the event channel. Calling it again is a no-op.
    pub fn terminate(&mut self, grace: Duration) {
        if let Some(tx) = self.kill_tx.take() {
            debug!("Requesting engine ({}) termination, grace {:?}", self.run, grace);
            // The wait task may already have finished on its own
            let _ = tx.send(grace);
        }
    }

    /// Wait until the process has exited, up to `limit`.
    ///
    /// Returns `true` if the process is gone.
    pub async fn wait_exit(&self, limit: Duration) -> bool {
        // Create the future before checking the flag so a notification
        // between the two cannot be missed
        let notified = self.exit_notify.notified();
        if self.has_exited() {
            return true;
        }
        tokio::time::timeout(limit, notified).await.is_ok() || self.has_exited()
    }

    pub fn has_exited(&self) -> bool {
        self.exited.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        !self.has_exited()
    }

    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    pub fn run(&self) -> RunId {
        self.run
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        if self.kill_tx.is_some() && !self.has_exited() {
            warn!("EngineProcess dropped while the engine may still be running");
            self.terminate(Duration::ZERO);
        }
        // kill_on_drop(true) on the Child is the final safety net
        debug!("EngineProcess ({}) dropped", self.run);
    }
}
