// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
mod audio;
mod config;
mod controller;
mod keys;
mod patterns;
mod stage;
#[cfg(test)]
mod testutil;
mod timeline;
mod track;
mod trigger;

use clap::{crate_version, Parser, Subcommand};
use config::{init_kit_and_controller, PlayOptions};
use serde::Serialize;
use std::error::Error;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::keys::DrumKey;
use crate::track::{TrackEvent, DEFAULT_BPM};

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A keyboard drum kit."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plays the kit from the keyboard.
    Play {
        /// The path to the kit config.
        kit_path: String,
        /// Starts the demo beat right away.
        #[arg(short, long)]
        demo: bool,
        /// Loops the demo beat.
        #[arg(short, long = "loop")]
        looping: bool,
        /// The tempo of the demo beat. Overrides the kit.
        #[arg(short, long)]
        bpm: Option<f64>,
    },
    /// Prints the key for each drum.
    Keys {},
    /// Prints the demo beat's schedule.
    Schedule {
        /// The tempo to schedule at.
        #[arg(short, long)]
        bpm: Option<f64>,
    },
    /// Lists the available audio output devices.
    Devices {},
}

/// A track as printed by the schedule command.
#[derive(Serialize)]
struct ScheduledTrack<'a> {
    name: &'a str,
    duration: f64,
    events: &'a [TrackEvent],
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Logs go to stderr so they don't tear up the pad row.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            kit_path,
            demo,
            looping,
            bpm,
        } => {
            let mut controller = init_kit_and_controller(
                &PathBuf::from(&kit_path),
                PlayOptions { demo, looping, bpm },
            )?;
            controller.join().await?;
        }
        Commands::Keys {} => {
            println!("Keys:");
            for key in DrumKey::ALL {
                println!("- {} ({}): {}", key.letter(), key.code(), key.name());
            }
        }
        Commands::Schedule { bpm } => {
            if let Some(bpm) = bpm.filter(|bpm| bpm.is_nan() || *bpm <= 0.0) {
                return Err(config::ConfigError::InvalidTempo(bpm).into());
            }

            let timeline = patterns::demo_timeline(bpm.unwrap_or(DEFAULT_BPM));
            let tracks: Vec<ScheduledTrack> = timeline
                .tracks()
                .map(|(name, track)| ScheduledTrack {
                    name,
                    duration: track.duration(),
                    events: track.events(),
                })
                .collect();
            println!("Duration: {}s", timeline.duration());
            print!("{}", serde_yml::to_string(&tracks)?);
        }
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
    };

    Ok(())
}
