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
use std::fmt;

use tracing::info;

use super::mixer::Mixer;

const CHANNELS: u16 = 2;
const SAMPLE_RATE: u32 = 44100;

/// A mock device. Nothing is sent to hardware; audio is only mixed when
/// something asks to render it.
pub struct Device {
    name: String,
    mixer: Mixer,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        info!(device = name, "Using mock audio device.");
        Device {
            name: name.to_string(),
            mixer: Mixer::new(CHANNELS, SAMPLE_RATE),
        }
    }

    /// Mixes the given number of frames, as the hardware would have pulled them.
    #[cfg(test)]
    pub fn render(&self, frames: usize) -> Vec<f32> {
        let mut output = vec![0.0; frames * CHANNELS as usize];
        self.mixer.mix(&mut output);
        output
    }
}

impl super::Device for Device {
    fn mixer(&self) -> &Mixer {
        &self.mixer
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
