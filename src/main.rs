//=========================================================================
// sim-host
//
// Command-line entry point: loads a simulation module and plays it in a
// window, logging the events the module raises.
//
// Usage:
//   sim-host [--config host.toml] [MODULE]
//
// Log output is controlled by RUST_LOG (default `info`).
//
//=========================================================================

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;
use tracing_subscriber::EnvFilter;

use sim_host::config::HostConfig;
use sim_host::core::events::{tags, EventChannel, GameEvent};
use sim_host::EngineBuilder;

/// Native host for a compiled game simulation.
#[derive(Parser, Debug)]
#[command(name = "sim-host", version)]
#[command(about = "Run a WebAssembly game simulation with fixed-timestep pacing")]
struct Args {
    /// Host configuration file (TOML). Defaults apply when omitted.
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Simulation module (`.wasm` or `.wat`); overrides `module_path`.
    module: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => HostConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => HostConfig::default(),
    };
    if let Some(module) = args.module {
        config.module_path = module;
    }

    let engine = EngineBuilder::new()
        .with_config(config)
        .build()
        .context("loading simulation module")?
        .init(register_listeners);

    info!("Press Enter to start, Escape to pause");
    engine.run().map_err(|err| anyhow::anyhow!("host stopped: {}", err))
}

//--- Listeners -----------------------------------------------------------

/// Stands in for the audio, animation and announcer collaborators.
fn register_listeners(events: &mut EventChannel) {
    for tag in [
        tags::PLAY_AUDIO,
        tags::LOOP_AUDIO,
        tags::STOP_AUDIO,
        tags::LOOP_ANIMATION,
        tags::STOP_ANIMATION,
    ] {
        events.on_game_event(tag, |event| info!(target: "cues", "{:?}", event));
    }

    events.on_game_event(tags::AD_ANNOUNCEMENT, |event| {
        if let GameEvent::Announcement(message) = event {
            info!(target: "announcer", "{}", message);
        }
    });

    events.on_game_event(tags::MASTER_VOLUME, |event| {
        if let GameEvent::MasterVolume(volume) = event {
            info!(target: "audio", "master volume {:.2}", volume);
        }
    });

    for tag in [
        tags::LEVEL_COMPLETED,
        tags::LEVEL_RESTARTED,
        tags::LEVEL_FAILED,
        tags::CHECKPOINT_REACHED,
        tags::PLAYER_RESET,
    ] {
        events.on(tag, move |_| info!(target: "level", "{}", tag));
    }
}
