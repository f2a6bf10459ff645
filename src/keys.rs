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

//! The fixed key mapping and beat durations used by the kit.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// A drum sound, identified by the physical key code that plays it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DrumKey {
    Clap,
    HiHatClosed,
    Kick,
    HiHatOpen,
    Boom,
    Ride,
    Snare,
    Tom,
    Tink,
}

impl DrumKey {
    /// Every drum key, in keyboard order.
    pub const ALL: [DrumKey; 9] = [
        DrumKey::Clap,
        DrumKey::HiHatClosed,
        DrumKey::Kick,
        DrumKey::HiHatOpen,
        DrumKey::Boom,
        DrumKey::Ride,
        DrumKey::Snare,
        DrumKey::Tom,
        DrumKey::Tink,
    ];

    /// The key code that plays this drum.
    pub fn code(&self) -> u32 {
        match self {
            DrumKey::Clap => 65,
            DrumKey::HiHatClosed => 83,
            DrumKey::Kick => 68,
            DrumKey::HiHatOpen => 70,
            DrumKey::Boom => 71,
            DrumKey::Ride => 72,
            DrumKey::Snare => 74,
            DrumKey::Tom => 75,
            DrumKey::Tink => 76,
        }
    }

    /// Looks up the drum mapped to the given key code.
    pub fn from_code(code: u32) -> Option<DrumKey> {
        DrumKey::ALL.into_iter().find(|key| key.code() == code)
    }

    /// The name used for this drum in kit files and for pad clicks.
    pub fn name(&self) -> &'static str {
        match self {
            DrumKey::Clap => "clap",
            DrumKey::HiHatClosed => "hihat-closed",
            DrumKey::Kick => "kick",
            DrumKey::HiHatOpen => "hihat-open",
            DrumKey::Boom => "boom",
            DrumKey::Ride => "ride",
            DrumKey::Snare => "snare",
            DrumKey::Tom => "tom",
            DrumKey::Tink => "tink",
        }
    }

    /// The keyboard character for this drum.
    pub fn letter(&self) -> char {
        // All codes are upper case ASCII letters.
        char::from(self.code() as u8)
    }
}

impl fmt::Display for DrumKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Returned when a name doesn't match any drum key.
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("unknown drum key '{0}'")]
pub struct UnknownKey(pub String);

impl FromStr for DrumKey {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        DrumKey::ALL
            .into_iter()
            .find(|key| key.name() == name)
            .ok_or_else(|| UnknownKey(s.to_string()))
    }
}

impl TryFrom<String> for DrumKey {
    type Error = UnknownKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DrumKey> for String {
    fn from(key: DrumKey) -> Self {
        key.name().to_string()
    }
}

/// A note length as a fraction of a whole note.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BeatDuration {
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
}

impl BeatDuration {
    /// The fraction of a whole note.
    pub fn fraction(&self) -> f64 {
        match self {
            BeatDuration::Whole => 1.0,
            BeatDuration::Half => 0.5,
            BeatDuration::Quarter => 0.25,
            BeatDuration::Eighth => 0.125,
            BeatDuration::Sixteenth => 0.0625,
        }
    }
}
