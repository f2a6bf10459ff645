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

//! Drum samples, loaded entirely into memory so triggers never touch the disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use hound::WavReader;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::{debug, info};

/// Input block size for the sinc resampler.
const INPUT_BLOCK_SIZE: usize = 1024;

/// Error types for sample loading.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("unable to read sample {path}: {source}")]
    Wav {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("sample {0} has no channels")]
    NoChannels(PathBuf),

    #[error("sample {0} has a sample rate of zero")]
    NoSampleRate(PathBuf),

    #[error("unable to resample from {0} Hz to {1} Hz")]
    Resample(u32, u32),
}

/// A mono sample.
#[derive(Debug)]
pub struct Sample {
    data: Vec<f32>,
    sample_rate: u32,
}

impl Sample {
    /// Creates a sample from mono data.
    pub fn new(data: Vec<f32>, sample_rate: u32) -> Sample {
        Sample { data, sample_rate }
    }

    /// Loads a WAV file, mixing multi-channel files down to mono.
    pub fn load(path: &Path) -> Result<Sample, SampleError> {
        let wav_error = |source: hound::Error| SampleError::Wav {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = WavReader::open(path).map_err(wav_error)?;
        let spec = reader.spec();
        if spec.channels == 0 {
            return Err(SampleError::NoChannels(path.to_path_buf()));
        }
        if spec.sample_rate == 0 {
            return Err(SampleError::NoSampleRate(path.to_path_buf()));
        }

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(wav_error)?,
            hound::SampleFormat::Int => {
                // Use i64 to avoid overflow for 32-bit samples.
                let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|sample| sample as f32 * scale))
                    .collect::<Result<_, _>>()
                    .map_err(wav_error)?
            }
        };

        let channels = spec.channels as usize;
        let data: Vec<f32> = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();

        let sample = Sample::new(data, spec.sample_rate);
        info!(
            path = ?path,
            frames = sample.frames(),
            sample_rate = sample.sample_rate,
            "Loaded sample."
        );
        Ok(sample)
    }

    /// Converts the sample to the given rate with a sinc resampler. The result
    /// has the same play time as the original.
    pub fn resample(&self, target_rate: u32) -> Result<Sample, SampleError> {
        if self.sample_rate == target_rate || self.data.is_empty() {
            return Ok(Sample::new(self.data.clone(), target_rate));
        }
        let failed =
            |_: rubato::ResampleError| SampleError::Resample(self.sample_rate, target_rate);
        if self.sample_rate == 0 || target_rate == 0 {
            return Err(SampleError::Resample(self.sample_rate, target_rate));
        }

        let sinc_params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            oversampling_factor: 128,
            interpolation: SincInterpolationType::Linear,
            window: WindowFunction::BlackmanHarris2,
        };
        let ratio = target_rate as f64 / self.sample_rate as f64;
        let mut resampler =
            SincFixedIn::<f32>::new(ratio, 1.0, sinc_params, INPUT_BLOCK_SIZE, 1)
                .map_err(|_| SampleError::Resample(self.sample_rate, target_rate))?;

        let expected = (self.data.len() as f64 * ratio).ceil() as usize;
        let delay = resampler.output_delay();
        let mut scratch = resampler.output_buffer_allocate(true);
        let mut resampled = Vec::with_capacity(expected + delay);
        let mut remaining = self.data.as_slice();

        // Keep feeding input, then silence, until the delayed output covers
        // the whole sample.
        while resampled.len() < expected + delay {
            let needed = resampler.input_frames_next();
            let (used, written) = if remaining.len() >= needed {
                let input = [&remaining[..needed]];
                resampler
                    .process_into_buffer(&input[..], &mut scratch, None)
                    .map_err(failed)?
            } else if !remaining.is_empty() {
                let input = [remaining];
                resampler
                    .process_partial_into_buffer(Some(&input[..]), &mut scratch, None)
                    .map_err(failed)?
            } else {
                resampler
                    .process_partial_into_buffer(None::<&[&[f32]]>, &mut scratch, None)
                    .map_err(failed)?
            };

            remaining = &remaining[used.min(remaining.len())..];
            resampled.extend_from_slice(&scratch[0][..written]);
            if written == 0 && remaining.is_empty() {
                break;
            }
        }

        let mut data: Vec<f32> = resampled.into_iter().skip(delay).collect();
        data.truncate(expected);
        debug!(
            from = self.sample_rate,
            to = target_rate,
            frames = data.len(),
            "Resampled sample."
        );
        Ok(Sample::new(data, target_rate))
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// The number of frames in the sample.
    pub fn frames(&self) -> usize {
        self.data.len()
    }

    /// The play time of the sample at its own rate.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.data.len() as f64 / self.sample_rate as f64)
    }
}
