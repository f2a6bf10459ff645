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
use std::{error::Error, fmt, thread};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info};

use super::mixer::Mixer;

/// The rate every kit is mixed at.
const SAMPLE_RATE: u32 = 44100;

/// Describes an output device found while listing.
pub struct DeviceInfo {
    name: String,
    max_channels: u16,
    host_id: cpal::HostId,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name,
            self.max_channels,
            self.host_id.name()
        )
    }
}

/// An open cpal output device with a running stream.
pub struct Device {
    name: String,
    channels: u16,
    host_id: cpal::HostId,
    mixer: Mixer,
    /// Dropping this tells the output thread to release the stream.
    shutdown_tx: Option<crossbeam_channel::Sender<()>>,
    output_thread: Option<thread::JoinHandle<()>>,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name,
            self.channels,
            self.host_id.name()
        )
    }
}

/// Builds an output callback that mixes straight into f32 buffers.
fn f32_callback(
    mixer: Mixer,
) -> impl FnMut(&mut [f32], &cpal::OutputCallbackInfo) + Send + 'static {
    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| mixer.mix(data)
}

/// Builds an output callback that mixes into a scratch buffer and converts.
fn converting_callback<T: cpal::Sample + cpal::FromSample<f32>>(
    mixer: Mixer,
) -> impl FnMut(&mut [T], &cpal::OutputCallbackInfo) + Send + 'static {
    let mut scratch: Vec<f32> = Vec::new();
    move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
        scratch.resize(data.len(), 0.0);
        mixer.mix(&mut scratch);
        for (dst, &src) in data.iter_mut().zip(scratch.iter()) {
            *dst = T::from_sample(src);
        }
    }
}

/// Opens the stream on its own thread and holds it there until shutdown.
fn start_output_thread(
    device: cpal::Device,
    sample_format: cpal::SampleFormat,
    mixer: Mixer,
    shutdown_rx: crossbeam_channel::Receiver<()>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let config = cpal::StreamConfig {
            channels: mixer.output_channels(),
            sample_rate: mixer.sample_rate(),
            buffer_size: cpal::BufferSize::Default,
        };

        let stream_result = match sample_format {
            cpal::SampleFormat::F32 => device.build_output_stream(
                &config,
                f32_callback(mixer),
                |err| error!("CPAL output stream error: {}", err),
                None,
            ),
            cpal::SampleFormat::I16 => device.build_output_stream(
                &config,
                converting_callback::<i16>(mixer),
                |err| error!("CPAL output stream error: {}", err),
                None,
            ),
            cpal::SampleFormat::I32 => device.build_output_stream(
                &config,
                converting_callback::<i32>(mixer),
                |err| error!("CPAL output stream error: {}", err),
                None,
            ),
            other => {
                error!(format = ?other, "Unsupported output sample format");
                return;
            }
        };

        let stream = match stream_result {
            Ok(stream) => stream,
            Err(e) => {
                error!("Failed to create CPAL stream: {}", e);
                return;
            }
        };
        if let Err(e) = stream.play() {
            error!("Failed to start CPAL stream: {}", e);
            return;
        }
        info!("CPAL output stream started");

        // Returns once the sender is dropped.
        let _ = shutdown_rx.recv();
        info!("CPAL output stream stopped");
    })
}

impl Device {
    /// Lists cpal output devices.
    pub fn list() -> Result<Vec<DeviceInfo>, Box<dyn Error>> {
        // Suppress noisy output here.
        let _shh_stdout = shh::stdout()?;
        let _shh_stderr = shh::stderr()?;

        let mut devices = Vec::new();
        for host_id in cpal::available_hosts() {
            let host_devices = match cpal::host_from_id(host_id)?.output_devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                let Ok(output_configs) = device.supported_output_configs() else {
                    continue;
                };
                let max_channels = output_configs
                    .map(|config| config.channels())
                    .max()
                    .unwrap_or(0);
                if max_channels > 0 {
                    devices.push(DeviceInfo {
                        name: device.name()?,
                        max_channels,
                        host_id,
                    });
                }
            }
        }

        devices.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(devices)
    }

    /// Opens the named output device and starts streaming the mixer to it.
    /// The name "default" picks the default output device of the default host.
    pub fn get(name: &str) -> Result<Device, Box<dyn Error>> {
        let (host_id, device) = Device::find(name)?;
        let default_config = device.default_output_config()?;
        let channels = default_config.channels();
        let sample_format = default_config.sample_format();
        let device_name = device.name()?;

        let mixer = Mixer::new(channels, SAMPLE_RATE);
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(0);
        let output_thread = start_output_thread(device, sample_format, mixer.clone(), shutdown_rx);

        info!(
            device = device_name,
            channels,
            sample_rate = SAMPLE_RATE,
            format = ?sample_format,
            "Opened audio device."
        );
        Ok(Device {
            name: device_name,
            channels,
            host_id,
            mixer,
            shutdown_tx: Some(shutdown_tx),
            output_thread: Some(output_thread),
        })
    }

    fn find(name: &str) -> Result<(cpal::HostId, cpal::Device), Box<dyn Error>> {
        let _shh_stdout = shh::stdout()?;
        let _shh_stderr = shh::stderr()?;

        if name == "default" {
            let host = cpal::default_host();
            return match host.default_output_device() {
                Some(device) => Ok((host.id(), device)),
                None => Err("no default output device".into()),
            };
        }

        for host_id in cpal::available_hosts() {
            let Ok(devices) = cpal::host_from_id(host_id)?.output_devices() else {
                continue;
            };
            for device in devices {
                if device.name().is_ok_and(|device_name| device_name.trim() == name) {
                    return Ok((host_id, device));
                }
            }
        }
        Err(format!("no device found with name {}", name).into())
    }
}

impl super::Device for Device {
    fn mixer(&self) -> &Mixer {
        &self.mixer
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        self.shutdown_tx.take();
        if let Some(thread) = self.output_thread.take() {
            let _ = thread.join();
        }
    }
}
