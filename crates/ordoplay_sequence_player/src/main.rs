// SPDX-License-Identifier: MIT OR Apache-2.0
//! `OrdoPlay` Sequence Player - headless preview of keyframe sequences
//!
//! Usage: `ordoplay_sequence_player [player-file.ron]`
//!
//! Without an argument a built-in demo sequence is played. Log verbosity
//! follows `RUST_LOG`; set `ordoplay_sequencer=trace` to see every crossing.

mod config;
mod player;

use std::path::PathBuf;

use config::PlayerConfig;
use player::PreviewRunner;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    // RUST_LOG wins; otherwise debug output for the player and the sequencer
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(
            "info,ordoplay_sequence_player=debug,ordoplay_sequencer=debug",
        )
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting OrdoPlay Sequence Player v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run() {
        tracing::error!("Preview failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> config::Result<()> {
    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => {
            tracing::info!("Loading player file {:?}", path);
            PlayerConfig::load(&path)?
        }
        None => {
            tracing::info!("No player file given, running demo sequence");
            PlayerConfig::demo()
        }
    };

    let mut runner = PreviewRunner::new(&config)?;
    let summary = runner.run()?;
    tracing::info!(
        play_head = summary.play_head,
        iterations = summary.completed_iterations,
        "Done"
    );
    Ok(())
}
