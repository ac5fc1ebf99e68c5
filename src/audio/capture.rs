//! Audio device capture using cpal

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleRate, SizedSample, Stream, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use crate::config::AudioConfig;
use crate::error::AudioError;
use crate::playback::ClipSource;

/// Samples kept for analysis; covers the largest spectrum block
const HISTORY_LEN: usize = 16384;

/// Audio capture from an input device
///
/// cpal::Stream is not Send, so the stream lives on its own thread and mono
/// sample batches come back through a crossbeam channel.
struct AudioCapture {
    sample_rx: Receiver<Vec<f32>>,
    stop_tx: Sender<()>,
    sample_rate: u32,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl AudioCapture {
    fn new(device_name: &str, config: &AudioConfig) -> Result<Self, AudioError> {
        let host = cpal::default_host();

        let device = if device_name == "default" {
            host.default_input_device()
                .ok_or(AudioError::NoDefaultInput)?
        } else {
            find_device_by_name(&host, device_name)?
        };

        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        tracing::info!("Using audio device: {}", name);

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| AudioError::UnsupportedConfig(e.to_string()))?
            .filter(|c| c.channels() == config.capture_channels)
            .find(|c| {
                c.min_sample_rate() <= SampleRate(config.capture_sample_rate)
                    && c.max_sample_rate() >= SampleRate(config.capture_sample_rate)
            })
            .or_else(|| device.supported_input_configs().ok()?.next())
            .ok_or_else(|| AudioError::UnsupportedConfig("No suitable config found".to_string()))?;

        let stream_config = StreamConfig {
            channels: config.capture_channels.max(1),
            sample_rate: SampleRate(config.capture_sample_rate),
            buffer_size: cpal::BufferSize::Fixed(config.capture_buffer_size),
        };

        tracing::debug!(
            "Stream config: {} Hz, {} channels, buffer size {}",
            stream_config.sample_rate.0,
            stream_config.channels,
            config.capture_buffer_size
        );

        let (sample_tx, sample_rx) = bounded::<Vec<f32>>(32);
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let (ready_tx, ready_rx) = bounded::<Result<(), AudioError>>(1);

        let sample_rate = stream_config.sample_rate.0;
        let sample_format = supported_config.sample_format();

        let thread_handle = thread::Builder::new()
            .name("lipsync-capture".to_string())
            .spawn(move || {
                run_capture_thread(device, stream_config, sample_format, sample_tx, stop_rx, ready_tx);
            })
            .map_err(|e| AudioError::StreamBuild(format!("Failed to spawn audio thread: {}", e)))?;

        // Surface stream build/start failures to the caller of play()
        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = thread_handle.join();
                return Err(e);
            }
            Err(_) => {
                let _ = thread_handle.join();
                return Err(AudioError::StreamStart("Capture thread exited".to_string()));
            }
        }

        Ok(Self {
            sample_rx,
            stop_tx,
            sample_rate,
            thread_handle: Some(thread_handle),
        })
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_capture_thread(
    device: Device,
    config: StreamConfig,
    sample_format: cpal::SampleFormat,
    sample_tx: Sender<Vec<f32>>,
    stop_rx: Receiver<()>,
    ready_tx: Sender<Result<(), AudioError>>,
) {
    let stream = match build_input_stream(&device, &config, sample_format, sample_tx) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to build audio stream: {}", e);
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = stream.play() {
        tracing::error!("Failed to start audio stream: {}", e);
        let _ = ready_tx.send(Err(AudioError::StreamStart(e.to_string())));
        return;
    }

    let _ = ready_tx.send(Ok(()));
    tracing::debug!("Audio capture thread started");

    let _ = stop_rx.recv();

    tracing::debug!("Audio capture thread stopping");
    drop(stream);
}

fn find_device_by_name(host: &cpal::Host, name: &str) -> Result<Device, AudioError> {
    let devices = host
        .input_devices()
        .map_err(|e| AudioError::DeviceEnumeration(e.to_string()))?;

    for device in devices {
        if let Ok(device_name) = device.name() {
            if device_name.contains(name) || name.contains(&device_name) {
                return Ok(device);
            }
        }
    }

    Err(AudioError::NoDeviceFound)
}

fn build_input_stream(
    device: &Device,
    config: &StreamConfig,
    sample_format: cpal::SampleFormat,
    tx: Sender<Vec<f32>>,
) -> Result<Stream, AudioError> {
    let channels = config.channels as usize;

    match sample_format {
        cpal::SampleFormat::F32 => build_mono_stream::<f32>(device, config, channels, tx),
        cpal::SampleFormat::F64 => build_mono_stream::<f64>(device, config, channels, tx),
        cpal::SampleFormat::I8 => build_mono_stream::<i8>(device, config, channels, tx),
        cpal::SampleFormat::I16 => build_mono_stream::<i16>(device, config, channels, tx),
        cpal::SampleFormat::I32 => build_mono_stream::<i32>(device, config, channels, tx),
        cpal::SampleFormat::I64 => build_mono_stream::<i64>(device, config, channels, tx),
        cpal::SampleFormat::U8 => build_mono_stream::<u8>(device, config, channels, tx),
        cpal::SampleFormat::U16 => build_mono_stream::<u16>(device, config, channels, tx),
        cpal::SampleFormat::U32 => build_mono_stream::<u32>(device, config, channels, tx),
        cpal::SampleFormat::U64 => build_mono_stream::<u64>(device, config, channels, tx),
        _ => Err(AudioError::UnsupportedConfig(format!(
            "Unsupported sample format: {:?}",
            sample_format
        ))),
    }
}

/// Build a stream that converts to f32 and averages channels to mono
fn build_mono_stream<T>(
    device: &Device,
    config: &StreamConfig,
    channels: usize,
    tx: Sender<Vec<f32>>,
) -> Result<Stream, AudioError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let err_fn = |err| tracing::error!("Audio stream error: {}", err);
    let channels = channels.max(1);

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let mono: Vec<f32> = data
                    .chunks(channels)
                    .map(|frame| {
                        frame.iter().map(|&s| f32::from_sample(s)).sum::<f32>()
                            / frame.len() as f32
                    })
                    .collect();
                let _ = tx.try_send(mono);
            },
            err_fn,
            None,
        )
        .map_err(|e| AudioError::StreamBuild(e.to_string()))
}

/// A clip slot fed by a live input device.
///
/// `play` opens the device and `stop` releases it.
pub struct LiveInput {
    device: String,
    settings: AudioConfig,
    capture: Option<AudioCapture>,
    history: VecDeque<f32>,
    fresh: bool,
}

impl LiveInput {
    /// Create an idle live slot; the device is opened on `play`
    pub fn new(device: &str, settings: &AudioConfig) -> Self {
        Self {
            device: device.to_string(),
            settings: settings.clone(),
            capture: None,
            history: VecDeque::with_capacity(HISTORY_LEN),
            fresh: false,
        }
    }

    pub fn device(&self) -> &str {
        &self.device
    }
}

impl ClipSource for LiveInput {
    fn has_clip(&self) -> bool {
        !self.device.is_empty()
    }

    fn play(&mut self) -> Result<(), AudioError> {
        if self.capture.is_none() {
            self.capture = Some(AudioCapture::new(&self.device, &self.settings)?);
        }
        self.history.clear();
        self.fresh = false;
        Ok(())
    }

    fn stop(&mut self) {
        if self.capture.take().is_some() {
            tracing::debug!("Closed live input '{}'", self.device);
        }
    }

    fn is_playing(&self) -> bool {
        self.capture.is_some()
    }

    fn advance(&mut self, _dt: Duration) {
        let Some(capture) = self.capture.as_ref() else {
            return;
        };

        self.fresh = false;
        loop {
            match capture.sample_rx.try_recv() {
                Ok(batch) => {
                    self.history.extend(batch);
                    self.fresh = true;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::error!("Live input '{}' disconnected", self.device);
                    self.capture = None;
                    return;
                }
            }
        }

        let excess = self.history.len().saturating_sub(HISTORY_LEN);
        self.history.drain(..excess);
    }

    fn sample_rate(&self) -> u32 {
        self.capture
            .as_ref()
            .map(|c| c.sample_rate)
            .unwrap_or(self.settings.capture_sample_rate)
    }

    fn recent_samples(&mut self, out: &mut [f32]) -> bool {
        if !self.is_playing() || !self.fresh {
            return false;
        }
        let take = self.history.len().min(out.len());
        let pad = out.len() - take;
        out[..pad].fill(0.0);
        for (slot, &sample) in out[pad..]
            .iter_mut()
            .zip(self.history.range(self.history.len() - take..))
        {
            *slot = sample;
        }
        true
    }
}

/// List all available input devices
pub fn list_input_devices() -> Vec<String> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    if let Ok(input_devices) = host.input_devices() {
        for device in input_devices {
            if let Ok(name) = device.name() {
                devices.push(name);
            }
        }
    }

    devices
}

/// Get the default input device name
pub fn default_input_device_name() -> Option<String> {
    let host = cpal::default_host();
    host.default_input_device().and_then(|d| d.name().ok())
}
