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
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, File};
use duration_string::DurationString;
use serde::Deserialize;

use super::error::ConfigError;
use crate::keys::DrumKey;
use crate::track::DEFAULT_BPM;

/// The default time a pad takes to flash.
const DEFAULT_TRANSITION: Duration = Duration::from_millis(70);

/// A YAML representation of a drum kit.
#[derive(Deserialize, Clone, Debug)]
pub struct Kit {
    /// The audio device to play through.
    audio_device: String,
    /// The directory that relative sample paths are resolved against.
    samples: Option<String>,
    /// How long a pad's flash transition takes.
    transition: Option<String>,
    /// The tempo of the demo beat.
    bpm: Option<f64>,
    /// Whether the demo beat loops.
    #[serde(default, rename = "loop")]
    looping: bool,
    /// The pads on the kit.
    pads: Vec<Pad>,
    /// The directory the kit file lives in.
    #[serde(skip)]
    base_path: PathBuf,
}

/// A single pad on the kit.
#[derive(Deserialize, Clone, Debug)]
pub struct Pad {
    /// The drum this pad plays.
    key: DrumKey,
    /// The sample for this pad. A pad without a sample has no audio.
    file: Option<String>,
}

impl Pad {
    #[cfg(test)]
    pub fn new(key: DrumKey, file: Option<&str>) -> Pad {
        Pad {
            key,
            file: file.map(str::to_string),
        }
    }

    pub fn key(&self) -> DrumKey {
        self.key
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }
}

impl Kit {
    /// Creates a new kit configuration.
    #[cfg(test)]
    pub fn new(audio_device: &str, pads: Vec<Pad>) -> Kit {
        Kit {
            audio_device: audio_device.to_string(),
            samples: None,
            transition: None,
            bpm: None,
            looping: false,
            pads,
            base_path: PathBuf::new(),
        }
    }

    /// Parse and validate a kit from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Kit, ConfigError> {
        let mut kit = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Kit>()?;
        kit.base_path = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        kit.validate()?;
        Ok(kit)
    }

    /// Checks the parts of the kit that serde can't.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.pads.is_empty() {
            return Err(ConfigError::NoPads);
        }

        let mut seen = HashSet::new();
        for pad in self.pads.iter() {
            if !seen.insert(pad.key) {
                return Err(ConfigError::DuplicatePad(pad.key));
            }
        }

        self.transition()?;
        self.bpm()?;
        Ok(())
    }

    /// Gets the audio device name.
    pub fn audio_device(&self) -> &str {
        &self.audio_device
    }

    /// Gets the pads in the order they were listed.
    pub fn pads(&self) -> &[Pad] {
        &self.pads
    }

    /// Gets the pad flash time.
    pub fn transition(&self) -> Result<Duration, ConfigError> {
        match &self.transition {
            Some(transition) => Ok(DurationString::from_string(transition.clone())
                .map_err(|e| ConfigError::InvalidTransition {
                    value: transition.clone(),
                    message: e.to_string(),
                })?
                .into()),
            None => Ok(DEFAULT_TRANSITION),
        }
    }

    /// Gets the demo tempo.
    pub fn bpm(&self) -> Result<f64, ConfigError> {
        match self.bpm {
            Some(bpm) if bpm.is_nan() || bpm <= 0.0 => Err(ConfigError::InvalidTempo(bpm)),
            Some(bpm) => Ok(bpm),
            None => Ok(DEFAULT_BPM),
        }
    }

    /// Whether the demo beat should loop.
    pub fn looping(&self) -> bool {
        self.looping
    }

    /// Resolves a pad's sample file against the samples directory and the
    /// directory of the kit file.
    pub fn sample_path(&self, file: &str) -> PathBuf {
        let file = Path::new(file);
        if file.is_absolute() {
            return file.to_path_buf();
        }

        match &self.samples {
            Some(samples) => self.base_path.join(samples).join(file),
            None => self.base_path.join(file),
        }
    }
}
