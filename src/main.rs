//! Ginga Panel - control panel for the Ginga interactive TV engine
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::eyre;
use tracing::{info, warn};

use ginga_panel::headless::HeadlessEvent;
use ginga_panel::StartAction;
use gpanel_app::config::{
    default_channels_path, default_config_dir, default_config_path, init_config_dir, load_settings,
};
use gpanel_app::{ChannelCatalog, ChannelList, Settings};
use gpanel_core::{Channel, DeviceRole};

/// Ginga Panel - control panel for the Ginga interactive TV engine
#[derive(Parser, Debug)]
#[command(name = "gpanel")]
#[command(about = "Play NCL documents, tune and scan channels with Ginga", long_about = None)]
struct Args {
    /// Settings file [default: <config dir>/ginga-panel/config.toml]
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Channel list [default: <config dir>/ginga-panel/channels.toml]
    #[arg(long, global = true, value_name = "PATH")]
    channels: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play an NCL document or MPEG transport stream
    Play {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Tune a broadcast channel by frequency
    Tune {
        frequency: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        number: Option<String>,
    },

    /// Scan for broadcast channels
    Scan,

    /// Start in a device role (base, passive or active)
    Run {
        #[arg(long)]
        role: Option<DeviceRole>,
    },

    /// List the channel catalog as JSON lines
    Channels,

    /// Write a commented default config file
    InitConfig,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    // Logs go to a file; stdout carries headless events
    gpanel_core::logging::init()?;

    let settings = match args.config.clone().or_else(default_config_path) {
        Some(path) => load_settings(&path),
        None => Settings::default(),
    };
    let catalog = load_catalog(args.channels.clone().or_else(default_channels_path));

    let action = match args.command {
        Command::InitConfig => {
            let dir = args
                .config
                .as_deref()
                .and_then(|p| p.parent().map(PathBuf::from))
                .or_else(default_config_dir)
                .ok_or_else(|| eyre!("No config directory available on this platform"))?;
            let path = init_config_dir(&dir)?;
            println!("{}", path.display());
            return Ok(());
        }
        Command::Channels => {
            for channel in catalog.channels() {
                HeadlessEvent::channel(channel).emit();
            }
            return Ok(());
        }
        Command::Play { file } => StartAction::Play(file),
        Command::Tune {
            frequency,
            name,
            number,
        } => StartAction::Tune(resolve_channel(&catalog, frequency, name, number)),
        Command::Scan => StartAction::Scan,
        Command::Run { role } => StartAction::Run(role),
    };

    ginga_panel::run_headless(settings, catalog, action).await?;
    Ok(())
}

fn load_catalog(path: Option<PathBuf>) -> ChannelList {
    let Some(path) = path else {
        return ChannelList::default();
    };
    if !path.exists() {
        info!("No channel list at {:?}", path);
        return ChannelList::default();
    }
    ChannelList::load(&path).unwrap_or_else(|e| {
        warn!("Ignoring channel list {:?}: {}", path, e);
        ChannelList::default()
    })
}

/// Catalog entry for `frequency`, with explicit number/name taking precedence
fn resolve_channel(
    catalog: &ChannelList,
    frequency: String,
    name: Option<String>,
    number: Option<String>,
) -> Channel {
    let known = catalog.find(&frequency).cloned().unwrap_or_default();
    Channel::new(
        frequency,
        number.unwrap_or(known.number),
        name.unwrap_or(known.name),
    )
}
