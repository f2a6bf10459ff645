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
use std::time::Duration;

use tracing::{info, warn};

use crate::track::Track;
use crate::trigger::{Trigger, TriggerError};

/// How often the timeline ticks.
pub const TICK_PERIOD: Duration = Duration::from_millis(33);

/// How far virtual time advances on each tick. Fixed, regardless of how much
/// wall clock time actually passed.
pub const TICK_SECONDS: f64 = 0.033;

/// A running repeating timer.
pub trait Timer: Send {
    /// Stops the timer. No further ticks are delivered after this returns.
    fn cancel(&mut self);
}

/// Starts repeating timers that deliver ticks to a timeline.
pub trait TickSource {
    fn start(&self, period: Duration) -> Box<dyn Timer>;
}

/// Plays a set of named tracks against a shared virtual clock.
#[derive(Default)]
pub struct Timeline {
    /// Tracks in the order they were added.
    tracks: Vec<(String, Track)>,
    /// Virtual time in seconds.
    time: f64,
    paused: bool,
    looping: bool,
    /// The longest track duration.
    duration: f64,
    timer: Option<Box<dyn Timer>>,
}

impl Timeline {
    /// Creates an empty, stopped timeline.
    pub fn new() -> Timeline {
        Timeline::default()
    }

    /// Adds a track, replacing any track with the same name.
    pub fn add_track(&mut self, name: &str, track: Track) {
        match self.tracks.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, existing)) => *existing = track,
            None => self.tracks.push((name.to_string(), track)),
        }
        self.duration = self
            .tracks
            .iter()
            .map(|(_, track)| track.duration())
            .fold(0.0, f64::max);
    }

    /// The tracks in the order they were added.
    pub fn tracks(&self) -> impl Iterator<Item = (&str, &Track)> {
        self.tracks
            .iter()
            .map(|(name, track)| (name.as_str(), track))
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Returns true if the timeline has an active timer.
    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Starts ticking. Does nothing if the timeline is already running.
    pub fn start(&mut self, ticks: &dyn TickSource) {
        if self.timer.is_some() {
            warn!("Timeline is already running.");
            return;
        }

        info!(
            tracks = self.tracks.len(),
            duration = self.duration,
            looping = self.looping,
            "Timeline started."
        );
        self.timer = Some(ticks.start(TICK_PERIOD));
    }

    /// Stops ticking and rewinds to the start. Does nothing if the timeline
    /// isn't running.
    pub fn stop(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            self.time = 0.0;
            self.paused = false;
            timer.cancel();
            info!("Timeline stopped.");
        }
    }

    /// Suspends tick work. The timer keeps running.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Handles one timer tick: advances virtual time, polls every track, then
    /// loops or stops once the end is reached.
    ///
    /// Tracks aren't reset when the timeline loops. They re-arm themselves when
    /// polled past their own end.
    pub fn tick<T: Trigger + ?Sized>(&mut self, trigger: &mut T) -> Result<(), TriggerError> {
        if self.timer.is_none() || self.paused {
            return Ok(());
        }

        self.time += TICK_SECONDS;
        for (_, track) in self.tracks.iter_mut() {
            track.play(self.time, trigger)?;
        }

        if self.time >= self.duration {
            if self.looping {
                self.time = 0.0;
            } else {
                self.stop();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub mod test {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;
    use crate::keys::{BeatDuration, DrumKey};
    use crate::track::{Step, DEFAULT_BPM};
    use crate::trigger::test::RecordingTrigger;

    /// A tick source that never ticks on its own. Tests drive the timeline
    /// directly and check what was started and cancelled.
    #[derive(Default)]
    pub struct ManualTicks {
        pub started: Arc<AtomicUsize>,
        pub cancelled: Arc<AtomicUsize>,
    }

    struct ManualTimer {
        cancelled: Arc<AtomicUsize>,
    }

    impl Timer for ManualTimer {
        fn cancel(&mut self) {
            self.cancelled.fetch_add(1, Ordering::Relaxed);
        }
    }

    impl TickSource for ManualTicks {
        fn start(&self, period: Duration) -> Box<dyn Timer> {
            assert_eq!(TICK_PERIOD, period);
            self.started.fetch_add(1, Ordering::Relaxed);
            Box::new(ManualTimer {
                cancelled: self.cancelled.clone(),
            })
        }
    }

    fn track(time: BeatDuration, keys: &[DrumKey]) -> Track {
        let steps: Vec<Step> = keys.iter().map(|key| Step::new(time, *key)).collect();
        let mut track = Track::new();
        track.define(&steps, DEFAULT_BPM);
        track
    }

    fn ticks_until_stopped(timeline: &mut Timeline, trigger: &mut RecordingTrigger) -> usize {
        let mut ticks = 0;
        while timeline.is_running() {
            timeline.tick(trigger).expect("tick failed");
            ticks += 1;
            assert!(ticks < 10_000, "timeline never stopped");
        }
        ticks
    }

    #[test]
    fn test_duration_is_longest_track() {
        let mut timeline = Timeline::new();
        assert_eq!(0.0, timeline.duration());

        timeline.add_track("Kick", track(BeatDuration::Quarter, &[DrumKey::Kick; 4]));
        assert_eq!(2.0, timeline.duration());

        timeline.add_track("Boom", track(BeatDuration::Whole, &[DrumKey::Boom; 2]));
        assert_eq!(4.0, timeline.duration());

        // A shorter track doesn't shrink it.
        timeline.add_track("Tink", track(BeatDuration::Eighth, &[DrumKey::Tink]));
        assert_eq!(4.0, timeline.duration());
    }

    #[test]
    fn test_add_track_replaces_by_name() {
        let mut timeline = Timeline::new();
        timeline.add_track("Kick", track(BeatDuration::Quarter, &[DrumKey::Kick; 4]));
        timeline.add_track("Hat", track(BeatDuration::Eighth, &[DrumKey::HiHatClosed]));
        timeline.add_track("Kick", track(BeatDuration::Half, &[DrumKey::Snare; 4]));

        let names: Vec<&str> = timeline.tracks().map(|(name, _)| name).collect();
        assert_eq!(vec!["Kick", "Hat"], names);
        assert_eq!(4.0, timeline.duration());
    }

    #[test]
    fn test_ticks_do_nothing_until_started() -> Result<(), TriggerError> {
        let mut timeline = Timeline::new();
        timeline.add_track("Kick", track(BeatDuration::Quarter, &[DrumKey::Kick]));

        let mut trigger = RecordingTrigger::default();
        timeline.tick(&mut trigger)?;
        assert_eq!(0.0, timeline.time());
        assert!(trigger.played.is_empty());
        Ok(())
    }

    #[test]
    fn test_tick_advances_and_polls_in_order() -> Result<(), TriggerError> {
        let mut timeline = Timeline::new();
        timeline.add_track("Boom", track(BeatDuration::Whole, &[DrumKey::Boom]));
        timeline.add_track("Kick", track(BeatDuration::Quarter, &[DrumKey::Kick]));
        let ticks = ManualTicks::default();
        timeline.start(&ticks);

        let mut trigger = RecordingTrigger::default();
        timeline.tick(&mut trigger)?;
        assert_eq!(TICK_SECONDS, timeline.time());
        assert_eq!(vec![DrumKey::Boom, DrumKey::Kick], trigger.played);
        Ok(())
    }

    #[test]
    fn test_stops_at_end_without_loop() -> Result<(), TriggerError> {
        let mut timeline = Timeline::new();
        timeline.add_track("Kick", track(BeatDuration::Quarter, &[DrumKey::Kick; 2]));
        let ticks = ManualTicks::default();
        timeline.start(&ticks);

        let mut trigger = RecordingTrigger::default();
        let count = ticks_until_stopped(&mut timeline, &mut trigger);

        // 1.0s at 0.033s per tick.
        assert_eq!(31, count);
        assert_eq!(vec![DrumKey::Kick, DrumKey::Kick], trigger.played);
        assert_eq!(1, ticks.cancelled.load(Ordering::Relaxed));
        assert_eq!(0.0, timeline.time());

        // Later ticks don't advance anything.
        timeline.tick(&mut trigger)?;
        timeline.tick(&mut trigger)?;
        assert_eq!(0.0, timeline.time());
        assert_eq!(2, trigger.played.len());
        Ok(())
    }

    #[test]
    fn test_loop_wraps_without_cancel() -> Result<(), TriggerError> {
        let mut timeline = Timeline::new();
        timeline.add_track("Kick", track(BeatDuration::Quarter, &[DrumKey::Kick; 2]));
        timeline.set_loop(true);
        let ticks = ManualTicks::default();
        timeline.start(&ticks);

        let mut trigger = RecordingTrigger::default();
        let mut wrapped = 0;
        let mut previous = timeline.time();
        for _ in 0..100 {
            timeline.tick(&mut trigger)?;
            if timeline.time() < previous {
                wrapped += 1;
                assert_eq!(0.0, timeline.time());
            }
            previous = timeline.time();
        }

        assert_eq!(3, wrapped);
        assert!(timeline.is_running());
        assert_eq!(0, ticks.cancelled.load(Ordering::Relaxed));
        Ok(())
    }

    #[test]
    fn test_loop_rearms_through_track_end() -> Result<(), TriggerError> {
        // The wrap itself leaves the tracks alone. The track re-arms because the
        // wrapping tick polls it past its own end.
        let mut timeline = Timeline::new();
        timeline.add_track("Kick", track(BeatDuration::Quarter, &[DrumKey::Kick; 2]));
        timeline.set_loop(true);
        let ticks = ManualTicks::default();
        timeline.start(&ticks);

        let mut trigger = RecordingTrigger::default();
        for _ in 0..31 {
            timeline.tick(&mut trigger)?;
        }
        assert_eq!(0.0, timeline.time());
        let (_, kick) = timeline.tracks().next().unwrap();
        assert!(kick.events().iter().all(|event| event.plays == 0));

        for _ in 0..62 {
            timeline.tick(&mut trigger)?;
        }
        assert_eq!(6, trigger.played.len());
        Ok(())
    }

    #[test]
    fn test_pause_freezes_time() -> Result<(), TriggerError> {
        let mut timeline = Timeline::new();
        timeline.add_track("Kick", track(BeatDuration::Quarter, &[DrumKey::Kick; 4]));
        let ticks = ManualTicks::default();
        timeline.start(&ticks);

        let mut trigger = RecordingTrigger::default();
        timeline.tick(&mut trigger)?;
        timeline.pause();
        assert!(timeline.is_paused());
        let frozen = timeline.time();
        for _ in 0..50 {
            timeline.tick(&mut trigger)?;
        }
        assert_eq!(frozen, timeline.time());
        assert_eq!(1, trigger.played.len());

        timeline.resume();
        timeline.tick(&mut trigger)?;
        assert!(timeline.time() > frozen);
        assert!(timeline.is_running());
        Ok(())
    }

    #[test]
    fn test_stop_clears_pause_and_is_idempotent() -> Result<(), TriggerError> {
        let mut timeline = Timeline::new();
        timeline.add_track("Kick", track(BeatDuration::Quarter, &[DrumKey::Kick; 4]));
        let ticks = ManualTicks::default();

        timeline.stop();
        assert_eq!(0, ticks.cancelled.load(Ordering::Relaxed));

        timeline.start(&ticks);
        let mut trigger = RecordingTrigger::default();
        timeline.tick(&mut trigger)?;
        timeline.pause();
        timeline.stop();
        assert!(!timeline.is_paused());
        assert!(!timeline.is_running());
        assert_eq!(0.0, timeline.time());
        assert_eq!(1, ticks.cancelled.load(Ordering::Relaxed));

        timeline.stop();
        assert_eq!(1, ticks.cancelled.load(Ordering::Relaxed));
        Ok(())
    }

    #[test]
    fn test_start_twice_keeps_one_timer() {
        let mut timeline = Timeline::new();
        let ticks = ManualTicks::default();
        timeline.start(&ticks);
        timeline.start(&ticks);
        assert_eq!(1, ticks.started.load(Ordering::Relaxed));

        timeline.stop();
        timeline.start(&ticks);
        assert_eq!(2, ticks.started.load(Ordering::Relaxed));
    }

    #[test]
    fn test_empty_timeline_stops_on_first_tick() -> Result<(), TriggerError> {
        let mut timeline = Timeline::new();
        let ticks = ManualTicks::default();
        timeline.start(&ticks);

        let mut trigger = RecordingTrigger::default();
        timeline.tick(&mut trigger)?;
        assert!(!timeline.is_running());
        Ok(())
    }
}
