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
use std::{error::Error, fmt, sync::Arc};

pub mod cpal;
pub mod mixer;
pub mod mock;
pub mod sample;

pub use mixer::Mixer;

use crate::keys::DrumKey;
use mixer::{Channel, EndNotifier};
use sample::{Sample, SampleError};

/// An output that plays whatever its mixer produces.
pub trait Device: fmt::Display + Send + Sync {
    /// The mixer feeding this device.
    fn mixer(&self) -> &Mixer;

    /// Adds a channel for the key to the device's mixer, resampling the sample
    /// to the mixer's rate first if needed.
    fn channel(
        &self,
        key: DrumKey,
        sample: Arc<Sample>,
        notifier: EndNotifier,
    ) -> Result<Arc<Channel>, SampleError> {
        let mixer = self.mixer();
        let sample = if sample.sample_rate() == mixer.sample_rate() {
            sample
        } else {
            Arc::new(sample.resample(mixer.sample_rate())?)
        };
        Ok(mixer.add_channel(key, sample, notifier))
    }
}

/// Lists devices known to cpal.
pub fn list_devices() -> Result<Vec<cpal::DeviceInfo>, Box<dyn Error>> {
    cpal::Device::list()
}

/// Gets a device with the given name. Names starting with "mock" get a mock
/// device.
pub fn get_device(name: &str) -> Result<Arc<dyn Device>, Box<dyn Error>> {
    if name.starts_with("mock") {
        return Ok(Arc::new(mock::Device::get(name)));
    }

    Ok(Arc::new(cpal::Device::get(name)?))
}
