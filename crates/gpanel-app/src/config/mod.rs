//! Configuration file parsing for Ginga Panel
//!
//! Supports:
//! - `config.toml` - User settings
//! - `state.toml` - Port counter, recent documents, last channel
//! - `channels.toml` - Channel catalog (see [`crate::channels`])

pub mod settings;
pub mod state;
pub mod types;

pub use settings::{
    default_channels_path, default_config_dir, default_config_path, init_config_dir, load_settings,
    save_settings,
};
pub use state::{default_state_path, load_state, save_state};
pub use types::*;
