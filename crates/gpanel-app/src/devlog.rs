//! Developer log: every raw engine line, parsed or not

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Local};

use gpanel_core::prelude::*;
use gpanel_core::OutputStream;

/// Default number of lines kept in memory
pub const DEFAULT_CAPACITY: usize = 5000;

#[derive(Debug, Clone)]
pub struct DevLogEntry {
    pub timestamp: DateTime<Local>,
    pub stream: OutputStream,
    pub line: String,
}

/// Bounded append-only line buffer with an optional file mirror.
///
/// Cleared when a new engine session starts. The file mirror is append-only
/// and survives sessions.
#[derive(Debug)]
pub struct DeveloperLog {
    entries: VecDeque<DevLogEntry>,
    capacity: usize,
    mirror: Option<File>,
}

impl Default for DeveloperLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl DeveloperLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            mirror: None,
        }
    }

    /// Also append every line to `path`
    pub fn mirror_to(&mut self, path: &Path) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open developer log {:?}", path))?;
        self.mirror = Some(file);
        Ok(())
    }

    pub fn append(&mut self, stream: OutputStream, line: &str) {
        let entry = DevLogEntry {
            timestamp: Local::now(),
            stream,
            line: line.to_string(),
        };

        if let Some(file) = self.mirror.as_mut() {
            let prefix = match stream {
                OutputStream::Stdout => "out",
                OutputStream::Stderr => "err",
            };
            let written = writeln!(
                file,
                "{} [{}] {}",
                entry.timestamp.format("%H:%M:%S%.3f"),
                prefix,
                entry.line
            );
            if let Err(e) = written {
                warn!("Developer log mirror disabled: {}", e);
                self.mirror = None;
            }
        }

        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Drop in-memory lines (new session)
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &DevLogEntry> {
        self.entries.iter()
    }

    /// Plain lines, oldest first
    pub fn lines(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.line.as_str()).collect()
    }
}
