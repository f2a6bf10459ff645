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
// Core mixing logic shared by the cpal and mock devices.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use super::sample::Sample;
use crate::keys::DrumKey;
use crate::trigger::{AudioElement, EndedListener};

// A channel's state word: the position in frames in the low 32 bits, then the
// playing flag, then a generation that every rewind and play bumps.
const POSITION_MASK: u64 = 0xFFFF_FFFF;
const PLAYING: u64 = 1 << 32;
const GENERATION: u64 = 1 << 33;

/// Called from the audio thread when a channel reaches the end of its sample.
pub type EndNotifier = Arc<dyn Fn(DrumKey) + Send + Sync>;

/// One voice in the mixer. Each key gets exactly one, so retriggering a key
/// restarts its sample rather than layering a second copy.
pub struct Channel {
    key: DrumKey,
    sample: Arc<Sample>,
    state: AtomicU64,
    /// Posts the end of playback off the audio thread.
    notifier: EndNotifier,
    listeners: Mutex<Vec<EndedListener>>,
}

impl Channel {
    fn new(key: DrumKey, sample: Arc<Sample>, notifier: EndNotifier) -> Channel {
        Channel {
            key,
            sample,
            state: AtomicU64::new(0),
            notifier,
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state.load(Ordering::Acquire) & PLAYING != 0
    }

    fn update(&self, f: impl Fn(u64) -> u64) {
        // The closure always returns Some, so this can't fail.
        let _ = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| Some(f(state)));
    }

    /// Adds this channel's sample into every channel of the interleaved output.
    fn mix_into(&self, output: &mut [f32], output_channels: usize) {
        let state = self.state.load(Ordering::Acquire);
        if state & PLAYING == 0 {
            return;
        }

        let data = self.sample.data();
        let start = (state & POSITION_MASK) as usize;
        let remaining = data.get(start..).unwrap_or_default();
        let mut mixed = 0;
        for (frame, value) in output.chunks_mut(output_channels).zip(remaining) {
            frame.iter_mut().for_each(|sample| *sample += value);
            mixed += 1;
        }

        if self.commit(state, start + mixed, data.len()) {
            (self.notifier)(self.key);
        }
    }

    /// Stores the position reached by a block that started from `state`. The
    /// store is dropped if a rewind or play happened during the block.
    ///
    /// Returns true if this block ended playback.
    fn commit(&self, state: u64, position: usize, frames: usize) -> bool {
        let ended = position >= frames;
        let mut next = (state & !POSITION_MASK) | (position as u64).min(POSITION_MASK);
        if ended {
            next &= !PLAYING;
        }

        self.state
            .compare_exchange(state, next, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            && ended
    }
}

impl AudioElement for Channel {
    fn rewind(&self) {
        self.update(|state| (state & !POSITION_MASK).wrapping_add(GENERATION));
    }

    fn play(&self) {
        self.update(|state| (state | PLAYING).wrapping_add(GENERATION));
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

/// Sums every playing channel into an interleaved output buffer.
#[derive(Clone)]
pub struct Mixer {
    channels: Arc<RwLock<Vec<Arc<Channel>>>>,
    output_channels: u16,
    sample_rate: u32,
}

impl Mixer {
    /// Creates a new mixer for the given output layout.
    pub fn new(output_channels: u16, sample_rate: u32) -> Mixer {
        Mixer {
            channels: Arc::new(RwLock::new(Vec::new())),
            output_channels,
            sample_rate,
        }
    }

    /// Adds a channel that plays the given sample for the key. The sample must
    /// already be at the mixer's rate.
    pub fn add_channel(
        &self,
        key: DrumKey,
        sample: Arc<Sample>,
        notifier: EndNotifier,
    ) -> Arc<Channel> {
        debug!(
            key = key.name(),
            frames = sample.frames(),
            "Added mixer channel."
        );
        let channel = Arc::new(Channel::new(key, sample, notifier));
        self.channels.write().push(channel.clone());
        channel
    }

    /// Fills the interleaved output buffer with the next frames of audio.
    pub fn mix(&self, output: &mut [f32]) {
        output.fill(0.0);
        let output_channels = self.output_channels.max(1) as usize;
        for channel in self.channels.read().iter() {
            channel.mix_into(output, output_channels);
        }
        output
            .iter_mut()
            .for_each(|sample| *sample = sample.clamp(-1.0, 1.0));
    }

    pub fn output_channels(&self) -> u16 {
        self.output_channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
