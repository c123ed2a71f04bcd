//! Playback of WAV recordings through the default output device.
//!
//! The whole file is decoded into memory (clips are short), folded to mono and
//! fed to a cpal output stream. The stream callback advances a cursor measured
//! in source frames; position queries read that cursor, so the remaining-time
//! display always follows what the device has actually consumed.

use super::audio::suppress_alsa_warnings;
use super::device::{PlaybackDevice, PlaybackSession};
use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Loads recordings onto the system default output device.
#[derive(Debug, Default)]
pub struct CpalPlayback;

impl CpalPlayback {
    pub fn new() -> Self {
        Self
    }
}

/// State shared between the session and the output callback.
struct PlaybackShared {
    /// Mono samples in [-1.0, 1.0]
    samples: Vec<f32>,
    source_rate: u32,
    /// Source frames consumed per output frame
    step: f64,
    /// Read position in source frames
    cursor: Mutex<f64>,
    paused: AtomicBool,
    finished: AtomicBool,
}

impl PlaybackShared {
    fn fill<T>(&self, output: &mut [T], channels: usize)
    where
        T: SizedSample + FromSample<f32>,
    {
        let silence = T::from_sample(0.0f32);
        let Ok(mut cursor) = self.cursor.lock() else {
            output.fill(silence);
            return;
        };

        for frame in output.chunks_mut(channels.max(1)) {
            let index = *cursor as usize;
            let value = if self.paused.load(Ordering::Relaxed) {
                silence
            } else if index < self.samples.len() {
                *cursor += self.step;
                T::from_sample(self.samples[index])
            } else {
                self.finished.store(true, Ordering::SeqCst);
                silence
            };
            frame.fill(value);
        }
    }
}

impl PlaybackDevice for CpalPlayback {
    /// Decodes `path` and opens a paused output stream for it.
    ///
    /// # Errors
    /// - If the file cannot be read as WAV
    /// - If no output device is available
    /// - If the output sample format is unsupported
    fn load(&mut self, path: &Path) -> Result<Box<dyn PlaybackSession>> {
        let (samples, source_rate) = read_mono_samples(path)?;

        let device = suppress_alsa_warnings(|| {
            cpal::default_host()
                .default_output_device()
                .ok_or_else(|| anyhow!("No audio output device available"))
        })?;
        let device_config = device.default_output_config()?;
        let output_rate = device_config.sample_rate().0;
        let channels = device_config.channels() as usize;

        tracing::debug!(
            "Playback of {} ({}Hz) on {} ({}Hz, {} channels)",
            path.display(),
            source_rate,
            device.name().unwrap_or_else(|_| "Unknown device".to_string()),
            output_rate,
            channels
        );

        let shared = Arc::new(PlaybackShared {
            samples,
            source_rate,
            step: source_rate as f64 / output_rate.max(1) as f64,
            cursor: Mutex::new(0.0),
            paused: AtomicBool::new(true),
            finished: AtomicBool::new(false),
        });

        let stream_config: cpal::StreamConfig = device_config.config();
        let stream = match device_config.sample_format() {
            cpal::SampleFormat::F32 => build_output_stream::<f32>(&device, &stream_config, &shared, channels)?,
            cpal::SampleFormat::I16 => build_output_stream::<i16>(&device, &stream_config, &shared, channels)?,
            cpal::SampleFormat::I32 => build_output_stream::<i32>(&device, &stream_config, &shared, channels)?,
            cpal::SampleFormat::U16 => build_output_stream::<u16>(&device, &stream_config, &shared, channels)?,
            other => return Err(anyhow!("Unsupported output sample format: {other:?}")),
        };
        stream.play()?;

        Ok(Box::new(CpalPlaybackSession {
            _stream: stream,
            shared,
        }))
    }
}

struct CpalPlaybackSession {
    /// Kept alive for the lifetime of the session
    _stream: cpal::Stream,
    shared: Arc<PlaybackShared>,
}

impl PlaybackSession for CpalPlaybackSession {
    fn duration(&self) -> Duration {
        frames_to_duration(self.shared.samples.len() as f64, self.shared.source_rate)
    }

    fn position(&self) -> Duration {
        let frames = self.shared.cursor.lock().map(|c| *c).unwrap_or(0.0);
        frames_to_duration(frames, self.shared.source_rate)
    }

    fn play(&mut self) -> Result<()> {
        self.shared.paused.store(false, Ordering::SeqCst);
        tracing::debug!("Playback started");
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.shared.paused.store(true, Ordering::SeqCst);
        tracing::debug!("Playback paused");
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.shared.finished.load(Ordering::SeqCst)
    }
}

fn build_output_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    shared: &Arc<PlaybackShared>,
    channels: usize,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let shared = Arc::clone(shared);
    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| shared.fill(data, channels),
        |err| {
            tracing::error!("Playback stream error: {}", err);
        },
        None,
    )?;
    Ok(stream)
}

fn frames_to_duration(frames: f64, rate: u32) -> Duration {
    Duration::from_secs_f64((frames / rate.max(1) as f64).max(0.0))
}

/// Reads a WAV file into mono f32 samples, averaging channels.
///
/// # Errors
/// - If the file cannot be opened or decoded
pub fn read_mono_samples(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::open(path)
        .map_err(|e| anyhow!("Failed to open {}: {e}", path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    let mono = interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();

    Ok((mono, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared(samples: Vec<f32>, step: f64) -> PlaybackShared {
        PlaybackShared {
            samples,
            source_rate: 4,
            step,
            cursor: Mutex::new(0.0),
            paused: AtomicBool::new(false),
            finished: AtomicBool::new(false),
        }
    }

    #[test]
    fn test_fill_duplicates_mono_to_all_channels() {
        let state = shared(vec![0.5, -0.5], 1.0);
        let mut out = [0.0f32; 4];
        state.fill(&mut out, 2);
        assert_eq!(out, [0.5, 0.5, -0.5, -0.5]);
        assert!(!state.finished.load(Ordering::SeqCst));
    }

    #[test]
    fn test_fill_marks_finished_past_end() {
        let state = shared(vec![0.25], 1.0);
        let mut out = [1.0f32; 3];
        state.fill(&mut out, 1);
        assert_eq!(out, [0.25, 0.0, 0.0]);
        assert!(state.finished.load(Ordering::SeqCst));
    }

    #[test]
    fn test_paused_fill_outputs_silence_and_holds_cursor() {
        let state = shared(vec![0.25, 0.5], 1.0);
        state.paused.store(true, Ordering::SeqCst);
        let mut out = [1.0f32; 2];
        state.fill(&mut out, 1);
        assert_eq!(out, [0.0, 0.0]);
        assert_eq!(*state.cursor.lock().unwrap(), 0.0);
    }

    #[test]
    fn test_read_mono_samples_averages_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for sample in [16384i16, 0, -16384, -16384] {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();

        let (mono, rate) = read_mono_samples(&path).unwrap();
        assert_eq!(rate, 8000);
        assert_eq!(mono, vec![0.25, -0.5]);
    }
}
