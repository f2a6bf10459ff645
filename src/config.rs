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
use std::error::Error;
use std::io;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use crate::controller::{keyboard, Controller, Event, TimelineCommand};
use crate::stage::Console;
use crate::timeline::Timeline;
use crate::{audio, patterns};

mod error;
mod kit;

pub use error::ConfigError;
pub use kit::{Kit, Pad};

/// Overrides for the demo beat given on the command line.
#[derive(Clone, Debug, Default)]
pub struct PlayOptions {
    /// Start the demo beat as soon as the kit is up.
    pub demo: bool,
    /// Loop the demo beat even if the kit doesn't ask for it.
    pub looping: bool,
    /// Use this tempo instead of the kit's.
    pub bpm: Option<f64>,
}

/// Builds the demo timeline for the kit with any overrides applied.
pub fn demo_timeline(kit: &Kit, options: &PlayOptions) -> Result<Timeline, ConfigError> {
    let bpm = match options.bpm {
        Some(bpm) if bpm.is_nan() || bpm <= 0.0 => return Err(ConfigError::InvalidTempo(bpm)),
        Some(bpm) => bpm,
        None => kit.bpm()?,
    };

    let mut timeline = patterns::demo_timeline(bpm);
    timeline.set_loop(options.looping || kit.looping());
    Ok(timeline)
}

/// Initializes the kit and controller from the given kit file and returns the
/// controller. The controller runs until the keyboard driver quits.
pub fn init_kit_and_controller(
    kit_path: &Path,
    options: PlayOptions,
) -> Result<Controller, Box<dyn Error>> {
    let kit = Kit::deserialize(kit_path)?;
    let timeline = demo_timeline(&kit, &options)?;
    let device = audio::get_device(kit.audio_device())?;

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let console = Console::new(&kit, device, events_tx.clone(), Box::new(io::stdout()))?;
    info!(
        kit = ?kit_path,
        device = console.device().to_string(),
        "Kit ready."
    );
    println!("{}", console.row());

    if options.demo {
        events_tx.send(Event::Timeline(TimelineCommand::Start))?;
    }

    Ok(Controller::new(
        Arc::new(console),
        timeline,
        Arc::new(keyboard::Driver::new()),
        events_tx,
        events_rx,
    ))
}
