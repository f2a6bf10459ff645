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

//! The built in demo beat.

use crate::keys::{BeatDuration, DrumKey};
use crate::timeline::Timeline;
use crate::track::{Step, Track};

fn beat(time: BeatDuration, key: DrumKey) -> Step {
    Step::new(time, key)
}

/// Two long booms.
pub fn boom() -> Vec<Step> {
    vec![
        beat(BeatDuration::Whole, DrumKey::Boom),
        beat(BeatDuration::Whole, DrumKey::Boom),
    ]
}

/// Four on the floor.
pub fn kick() -> Vec<Step> {
    vec![beat(BeatDuration::Quarter, DrumKey::Kick); 4]
}

/// Eighth note hats, opening on every fourth.
pub fn hi_hat() -> Vec<Step> {
    [
        DrumKey::HiHatClosed,
        DrumKey::HiHatClosed,
        DrumKey::HiHatClosed,
        DrumKey::HiHatOpen,
        DrumKey::HiHatClosed,
        DrumKey::HiHatClosed,
        DrumKey::HiHatClosed,
        DrumKey::HiHatOpen,
    ]
    .into_iter()
    .map(|key| beat(BeatDuration::Eighth, key))
    .collect()
}

/// Builds the demo timeline at the given tempo.
pub fn demo_timeline(bpm: f64) -> Timeline {
    let mut timeline = Timeline::new();
    for (name, steps) in [("Boom", boom()), ("Kick", kick()), ("Hi Hat", hi_hat())] {
        let mut track = Track::new();
        track.define(&steps, bpm);
        timeline.add_track(name, track);
    }
    timeline
}
