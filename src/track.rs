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
use serde::Serialize;
use tracing::debug;

use crate::keys::{BeatDuration, DrumKey};
use crate::trigger::{Trigger, TriggerError};

/// The tempo used when none is given.
pub const DEFAULT_BPM: f64 = 120.0;

/// One step of a pattern.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    pub time: BeatDuration,
    pub key: DrumKey,
}

impl Step {
    pub fn new(time: BeatDuration, key: DrumKey) -> Step {
        Step { time, key }
    }
}

/// Identifies an event within its track. Assigned from the step index when the
/// track is defined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EventId(pub usize);

/// A scheduled trigger derived from a pattern step.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrackEvent {
    pub id: EventId,
    pub index: usize,
    /// Seconds from the start of the track.
    pub beat_time: f64,
    pub key: DrumKey,
    /// 1 once the event has fired, 0 until then.
    pub plays: u8,
}

/// A sequence of scheduled drum triggers.
#[derive(Clone, Debug, Default)]
pub struct Track {
    events: Vec<TrackEvent>,
    duration: f64,
}

impl Track {
    /// Creates an empty track.
    pub fn new() -> Track {
        Track::default()
    }

    /// The length of the track in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// The events in definition order.
    pub fn events(&self) -> &[TrackEvent] {
        &self.events
    }

    /// Schedules the given steps at the given tempo.
    ///
    /// A step's time is its index multiplied by its own length, so patterns
    /// that mix step lengths are not laid end to end.
    pub fn define(&mut self, steps: &[Step], bpm: f64) {
        let whole = 4.0 * (60.0 / bpm);
        for (index, step) in steps.iter().enumerate() {
            let length = whole * step.time.fraction();
            let beat_time = index as f64 * length;
            let event = TrackEvent {
                id: EventId(index),
                index,
                beat_time,
                key: step.key,
                plays: 0,
            };

            match self.events.iter_mut().find(|existing| existing.id == event.id) {
                Some(existing) => *existing = event,
                None => self.events.push(event),
            }

            let end = length + beat_time;
            if end > self.duration {
                self.duration = end;
            }
        }
    }

    /// Re-arms every event.
    pub fn reset(&mut self) {
        self.events.iter_mut().for_each(|event| event.plays = 0);
    }

    /// Fires the first due event that hasn't fired yet. At most one event fires
    /// per call. Past the end of the track, every event is re-armed instead.
    ///
    /// Returns true if an event fired.
    pub fn play<T: Trigger + ?Sized>(
        &mut self,
        time: f64,
        trigger: &mut T,
    ) -> Result<bool, TriggerError> {
        if time > self.duration {
            self.reset();
            return Ok(false);
        }

        let Some(event) = self
            .events
            .iter_mut()
            .find(|event| time >= event.beat_time && event.plays == 0)
        else {
            return Ok(false);
        };

        event.plays = 1;
        debug!(
            index = event.index,
            time,
            beat_time = event.beat_time,
            key = event.key.name(),
            "Firing track event."
        );
        trigger.trigger(event.key)?;
        Ok(true)
    }
}
