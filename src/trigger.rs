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

//! Sample triggering: plays the audio for a drum key and flashes its pad.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use tracing::debug;

use crate::keys::DrumKey;

/// The pad property whose transition clears the active state.
pub const TRANSFORM: &str = "transform";

/// Called when an audio element finishes playing.
pub type EndedListener = Box<dyn Fn() + Send + Sync>;

/// Called with the property name when a pad transition finishes.
pub type TransitionListener = Box<dyn Fn(&str) + Send + Sync>;

/// Errors raised when the stage is missing something a key needs. These are
/// setup errors in the kit, not transient conditions.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum TriggerError {
    #[error("missing required audio resource for {0}")]
    MissingAudioResource(DrumKey),
    #[error("missing required pad for {0}")]
    MissingVisualElement(DrumKey),
}

/// Something that can play a drum key.
pub trait Trigger {
    fn trigger(&mut self, key: DrumKey) -> Result<(), TriggerError>;
}

/// A playable audio resource attached to a key.
pub trait AudioElement: Send + Sync {
    /// Moves the playback position back to the start.
    fn rewind(&self);

    /// Starts playback from the current position.
    fn play(&self);

    /// Registers a listener for the end of playback.
    fn on_ended(&self, listener: EndedListener);

    /// Delivers the end of playback to the registered listeners.
    fn ended(&self);
}

/// The visual element attached to a key.
pub trait PadElement: Send + Sync {
    fn add_active(&self);

    fn remove_active(&self);

    fn is_active(&self) -> bool;

    /// Registers a listener for the end of a transition.
    fn on_transition_end(&self, listener: TransitionListener);

    /// Delivers the end of a transition on the given property to the registered listeners.
    fn transition_end(&self, property: &str);
}

/// The surface that holds the audio elements and pads for each key.
pub trait Stage: Send + Sync {
    fn audio(&self, key: DrumKey) -> Option<Arc<dyn AudioElement>>;

    fn pad(&self, key: DrumKey) -> Option<Arc<dyn PadElement>>;
}

/// The cached elements for a key.
struct Elements {
    audio: Arc<dyn AudioElement>,
    pad: Arc<dyn PadElement>,
}

/// Plays samples for keys. Elements are looked up on a key's first trigger and
/// kept for the life of the trigger.
pub struct SampleTrigger {
    stage: Arc<dyn Stage>,
    cache: HashMap<DrumKey, Elements>,
}

impl SampleTrigger {
    /// Creates a new sample trigger over the given stage.
    pub fn new(stage: Arc<dyn Stage>) -> SampleTrigger {
        SampleTrigger {
            stage,
            cache: HashMap::new(),
        }
    }

    /// Returns true if the elements for the key have already been looked up.
    #[cfg(test)]
    pub fn is_cached(&self, key: DrumKey) -> bool {
        self.cache.contains_key(&key)
    }

    /// Gets the cached elements for the key, looking them up if needed.
    fn pick(&mut self, key: DrumKey) -> Result<&Elements, TriggerError> {
        if !self.cache.contains_key(&key) {
            let audio = self
                .stage
                .audio(key)
                .ok_or(TriggerError::MissingAudioResource(key))?;
            let pad = self
                .stage
                .pad(key)
                .ok_or(TriggerError::MissingVisualElement(key))?;

            let weak_pad: Weak<dyn PadElement> = Arc::downgrade(&pad);
            pad.on_transition_end(Box::new(move |property| {
                if property == TRANSFORM {
                    if let Some(pad) = weak_pad.upgrade() {
                        pad.remove_active();
                    }
                }
            }));

            let weak_pad: Weak<dyn PadElement> = Arc::downgrade(&pad);
            audio.on_ended(Box::new(move || {
                if let Some(pad) = weak_pad.upgrade() {
                    pad.remove_active();
                }
            }));

            debug!(key = key.name(), "Cached elements for key.");
            self.cache.insert(key, Elements { audio, pad });
        }

        Ok(&self.cache[&key])
    }
}

impl Trigger for SampleTrigger {
    fn trigger(&mut self, key: DrumKey) -> Result<(), TriggerError> {
        let elements = self.pick(key)?;
        elements.audio.rewind();
        elements.audio.play();
        elements.pad.add_active();
        Ok(())
    }
}

#[cfg(test)]
pub mod test {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    /// Records every key it's asked to play.
    #[derive(Default)]
    pub struct RecordingTrigger {
        pub played: Vec<DrumKey>,
    }

    impl Trigger for RecordingTrigger {
        fn trigger(&mut self, key: DrumKey) -> Result<(), TriggerError> {
            self.played.push(key);
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeAudio {
        position: AtomicUsize,
        rewinds: AtomicUsize,
        plays: AtomicUsize,
        listeners: Mutex<Vec<EndedListener>>,
    }

    impl AudioElement for FakeAudio {
        fn rewind(&self) {
            self.rewinds.fetch_add(1, Ordering::Relaxed);
            self.position.store(0, Ordering::Relaxed);
        }

        fn play(&self) {
            self.plays.fetch_add(1, Ordering::Relaxed);
        }

        fn on_ended(&self, listener: EndedListener) {
            self.listeners.lock().push(listener);
        }

        fn ended(&self) {
            for listener in self.listeners.lock().iter() {
                listener();
            }
        }
    }

    #[derive(Default)]
    struct FakePad {
        active: AtomicBool,
        removals: AtomicUsize,
        listeners: Mutex<Vec<TransitionListener>>,
    }

    impl PadElement for FakePad {
        fn add_active(&self) {
            self.active.store(true, Ordering::Relaxed);
        }

        fn remove_active(&self) {
            self.removals.fetch_add(1, Ordering::Relaxed);
            self.active.store(false, Ordering::Relaxed);
        }

        fn is_active(&self) -> bool {
            self.active.load(Ordering::Relaxed)
        }

        fn on_transition_end(&self, listener: TransitionListener) {
            self.listeners.lock().push(listener);
        }

        fn transition_end(&self, property: &str) {
            for listener in self.listeners.lock().iter() {
                listener(property);
            }
        }
    }

    #[derive(Default)]
    struct FakeStage {
        audio: HashMap<DrumKey, Arc<FakeAudio>>,
        pads: HashMap<DrumKey, Arc<FakePad>>,
        lookups: AtomicUsize,
    }

    impl FakeStage {
        fn with(keys: &[DrumKey], pads: &[DrumKey]) -> FakeStage {
            FakeStage {
                audio: keys
                    .iter()
                    .map(|key| (*key, Arc::new(FakeAudio::default())))
                    .collect(),
                pads: pads
                    .iter()
                    .map(|key| (*key, Arc::new(FakePad::default())))
                    .collect(),
                lookups: AtomicUsize::new(0),
            }
        }
    }

    impl Stage for FakeStage {
        fn audio(&self, key: DrumKey) -> Option<Arc<dyn AudioElement>> {
            self.lookups.fetch_add(1, Ordering::Relaxed);
            self.audio
                .get(&key)
                .map(|audio| audio.clone() as Arc<dyn AudioElement>)
        }

        fn pad(&self, key: DrumKey) -> Option<Arc<dyn PadElement>> {
            self.pads
                .get(&key)
                .map(|pad| pad.clone() as Arc<dyn PadElement>)
        }
    }

    #[test]
    fn test_trigger_plays_and_activates() -> Result<(), TriggerError> {
        let stage = Arc::new(FakeStage::with(&[DrumKey::Kick], &[DrumKey::Kick]));
        let mut trigger = SampleTrigger::new(stage.clone());

        trigger.trigger(DrumKey::Kick)?;

        let audio = &stage.audio[&DrumKey::Kick];
        assert_eq!(1, audio.rewinds.load(Ordering::Relaxed));
        assert_eq!(1, audio.plays.load(Ordering::Relaxed));
        assert!(stage.pads[&DrumKey::Kick].is_active());
        Ok(())
    }

    #[test]
    fn test_lookup_is_cached() -> Result<(), TriggerError> {
        let stage = Arc::new(FakeStage::with(&[DrumKey::Clap], &[DrumKey::Clap]));
        let mut trigger = SampleTrigger::new(stage.clone());

        assert!(!trigger.is_cached(DrumKey::Clap));
        trigger.trigger(DrumKey::Clap)?;
        trigger.trigger(DrumKey::Clap)?;
        trigger.trigger(DrumKey::Clap)?;

        assert!(trigger.is_cached(DrumKey::Clap));
        assert_eq!(1, stage.lookups.load(Ordering::Relaxed));
        // Listeners are only registered once.
        assert_eq!(1, stage.audio[&DrumKey::Clap].listeners.lock().len());
        assert_eq!(1, stage.pads[&DrumKey::Clap].listeners.lock().len());
        Ok(())
    }

    #[test]
    fn test_missing_audio() {
        let stage = Arc::new(FakeStage::with(&[], &[DrumKey::Snare]));
        let mut trigger = SampleTrigger::new(stage.clone());

        assert_eq!(
            Err(TriggerError::MissingAudioResource(DrumKey::Snare)),
            trigger.trigger(DrumKey::Snare)
        );
        assert!(!trigger.is_cached(DrumKey::Snare));
        assert!(!stage.pads[&DrumKey::Snare].is_active());
    }

    #[test]
    fn test_missing_pad_caches_nothing() {
        let stage = Arc::new(FakeStage::with(&[DrumKey::Snare], &[]));
        let mut trigger = SampleTrigger::new(stage.clone());

        assert_eq!(
            Err(TriggerError::MissingVisualElement(DrumKey::Snare)),
            trigger.trigger(DrumKey::Snare)
        );
        assert!(!trigger.is_cached(DrumKey::Snare));
        assert_eq!(0, stage.audio[&DrumKey::Snare].plays.load(Ordering::Relaxed));

        // Every attempt looks the elements up again.
        assert!(trigger.trigger(DrumKey::Snare).is_err());
        assert_eq!(2, stage.lookups.load(Ordering::Relaxed));
    }

    #[test]
    fn test_audio_end_clears_active() -> Result<(), TriggerError> {
        let stage = Arc::new(FakeStage::with(&[DrumKey::Tom], &[DrumKey::Tom]));
        let mut trigger = SampleTrigger::new(stage.clone());
        trigger.trigger(DrumKey::Tom)?;

        let pad = &stage.pads[&DrumKey::Tom];
        assert!(pad.is_active());
        stage.audio[&DrumKey::Tom].ended();
        assert!(!pad.is_active());
        Ok(())
    }

    #[test]
    fn test_only_transform_transition_clears_active() -> Result<(), TriggerError> {
        let stage = Arc::new(FakeStage::with(&[DrumKey::Ride], &[DrumKey::Ride]));
        let mut trigger = SampleTrigger::new(stage.clone());
        trigger.trigger(DrumKey::Ride)?;

        let pad = &stage.pads[&DrumKey::Ride];
        pad.transition_end("opacity");
        assert!(pad.is_active());
        pad.transition_end(TRANSFORM);
        assert!(!pad.is_active());
        Ok(())
    }

    #[test]
    fn test_retrigger_overlap() -> Result<(), TriggerError> {
        let stage = Arc::new(FakeStage::with(&[DrumKey::Boom], &[DrumKey::Boom]));
        let mut trigger = SampleTrigger::new(stage.clone());
        let audio = &stage.audio[&DrumKey::Boom];
        let pad = &stage.pads[&DrumKey::Boom];

        trigger.trigger(DrumKey::Boom)?;
        audio.position.store(1000, Ordering::Relaxed);
        trigger.trigger(DrumKey::Boom)?;

        // Playback restarted from zero and the pad stayed active across both triggers.
        assert_eq!(0, audio.position.load(Ordering::Relaxed));
        assert_eq!(2, audio.rewinds.load(Ordering::Relaxed));
        assert!(pad.is_active());

        // Whichever end signal arrives first clears it, the second changes nothing.
        pad.transition_end(TRANSFORM);
        assert!(!pad.is_active());
        audio.ended();
        assert!(!pad.is_active());
        assert_eq!(2, pad.removals.load(Ordering::Relaxed));
        Ok(())
    }
}
