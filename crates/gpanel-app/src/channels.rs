//! Channel catalog
//!
//! The panel tunes relative to the last played channel. A catalog answers
//! "what comes after/before this one", wrapping at both ends. Lookups for a
//! channel not in the catalog (or on an empty catalog) give the null channel,
//! which the tuning workflow ignores.

use std::path::Path;

use serde::{Deserialize, Serialize};

use gpanel_core::prelude::*;
use gpanel_core::Channel;

pub trait ChannelCatalog {
    fn channels(&self) -> &[Channel];

    /// Channel after `current`, wrapping to the first
    fn next_after(&self, current: &Channel) -> Channel {
        let channels = self.channels();
        match channels.iter().position(|c| c == current) {
            Some(i) => channels[(i + 1) % channels.len()].clone(),
            None => Channel::null(),
        }
    }

    /// Channel before `current`, wrapping to the last
    fn previous_before(&self, current: &Channel) -> Channel {
        let channels = self.channels();
        match channels.iter().position(|c| c == current) {
            Some(i) => channels[(i + channels.len() - 1) % channels.len()].clone(),
            None => Channel::null(),
        }
    }
}

/// Channel list loaded from a TOML file:
///
/// ```toml
/// [[channels]]
/// frequency = "647142"
/// number = "5"
/// name = "TV Brasil"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChannelList {
    #[serde(default)]
    pub channels: Vec<Channel>,
}

impl ChannelList {
    pub fn new(channels: Vec<Channel>) -> Self {
        Self { channels }
    }

    /// Load a channel list; entries with an empty frequency are skipped
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let mut list: ChannelList = toml::from_str(&content)
            .map_err(|e| Error::config_invalid(format!("{}: {}", path.display(), e)))?;

        let before = list.channels.len();
        list.channels.retain(|c| !c.is_null());
        if list.channels.len() != before {
            warn!(
                "Skipped {} channel(s) without a frequency in {:?}",
                before - list.channels.len(),
                path
            );
        }
        debug!("Loaded {} channels from {:?}", list.channels.len(), path);
        Ok(list)
    }

    /// Look a channel up by frequency
    pub fn find(&self, frequency: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.frequency == frequency)
    }
}

impl ChannelCatalog for ChannelList {
    fn channels(&self) -> &[Channel] {
        &self.channels
    }
}
