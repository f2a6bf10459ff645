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

//! The terminal stage: mixer channels for sound and a printed row of pads for
//! visuals.

use std::collections::HashMap;
use std::error::Error;
use std::io::Write;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::audio::mixer::{Channel, EndNotifier};
use crate::audio::sample::Sample;
use crate::audio::Device;
use crate::config::Kit;
use crate::controller::Event;
use crate::keys::DrumKey;
use crate::trigger::{AudioElement, PadElement, Stage};

pub mod pad;

use pad::{ConsolePad, PadRow};

/// Holds the elements for every pad on the kit.
pub struct Console {
    /// Held so the output keeps running for as long as the stage exists.
    device: Arc<dyn Device>,
    audio: HashMap<DrumKey, Arc<Channel>>,
    pads: HashMap<DrumKey, Arc<ConsolePad>>,
    row: Arc<PadRow>,
}

impl Console {
    /// Loads the kit's samples onto the device and sets up its pads. Pads
    /// without a sample get no audio element.
    pub fn new(
        kit: &Kit,
        device: Arc<dyn Device>,
        events_tx: UnboundedSender<Event>,
        output: Box<dyn Write + Send>,
    ) -> Result<Console, Box<dyn Error>> {
        let transition = kit.transition()?;
        let row = Arc::new(PadRow::new(
            kit.pads().iter().map(|pad| pad.key()).collect(),
            output,
        ));

        let notifier: EndNotifier = {
            let events_tx = events_tx.clone();
            Arc::new(move |key: DrumKey| {
                let _ = events_tx.send(Event::AudioEnded(key));
            })
        };

        let mut audio = HashMap::new();
        let mut pads = HashMap::new();
        for pad in kit.pads() {
            let key = pad.key();
            if let Some(file) = pad.file() {
                let sample = Arc::new(Sample::load(&kit.sample_path(file))?);
                debug!(
                    key = key.name(),
                    duration = ?sample.duration(),
                    "Sample ready."
                );
                audio.insert(key, device.channel(key, sample, notifier.clone())?);
            }
            pads.insert(
                key,
                Arc::new(ConsolePad::new(
                    key,
                    transition,
                    events_tx.clone(),
                    row.clone(),
                )),
            );
        }

        info!(
            device = device.to_string(),
            pads = pads.len(),
            samples = audio.len(),
            "Kit loaded."
        );
        Ok(Console {
            device,
            audio,
            pads,
            row,
        })
    }

    /// The device the kit plays through.
    pub fn device(&self) -> &dyn Device {
        self.device.as_ref()
    }

    /// The current pad row.
    pub fn row(&self) -> String {
        self.row.row()
    }
}

impl Stage for Console {
    fn audio(&self, key: DrumKey) -> Option<Arc<dyn AudioElement>> {
        self.audio
            .get(&key)
            .map(|channel| channel.clone() as Arc<dyn AudioElement>)
    }

    fn pad(&self, key: DrumKey) -> Option<Arc<dyn PadElement>> {
        self.pads
            .get(&key)
            .map(|pad| pad.clone() as Arc<dyn PadElement>)
    }
}
