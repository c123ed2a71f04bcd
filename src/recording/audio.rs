//! Microphone capture into a WAV container.
//!
//! Audio is captured from the configured input device at its native sample
//! rate, folded to mono, and streamed straight into a 16-bit PCM WAV file while
//! the session runs. Pausing keeps the stream and the file open and simply
//! discards incoming buffers until capture resumes.

use super::device::{CaptureDevice, CaptureSession};
use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use hound::{WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

type SharedWriter = Arc<Mutex<Option<WavWriter<BufWriter<File>>>>>;

/// Opens capture sessions on a specified or default input device.
pub struct CpalCapture {
    /// Device name, numeric index, or "default"
    device_name: String,
    /// Sample rate asked for in the config; the device rate wins when they differ
    requested_sample_rate: u32,
}

impl CpalCapture {
    /// Creates a capture device handle.
    ///
    /// # Arguments
    /// * `requested_sample_rate` - Desired rate in Hz (the device's native rate is used)
    /// * `device_name` - Device name/ID to use. Use "default" for system default device
    pub fn new(requested_sample_rate: u32, device_name: String) -> Self {
        Self {
            device_name,
            requested_sample_rate,
        }
    }
}

impl CaptureDevice for CpalCapture {
    /// Opens the input device and begins writing to `path`.
    ///
    /// # Errors
    /// - If the specified device is not available
    /// - If the output file cannot be created
    /// - If the device sample format is unsupported
    /// - If audio stream creation fails
    fn open(&mut self, path: &Path) -> Result<Box<dyn CaptureSession>> {
        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();

            if self.device_name == "default" {
                host.default_input_device()
                    .ok_or_else(|| anyhow!("No audio input device available"))
            } else {
                find_device_by_name(&host, &self.device_name)
            }
        })?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Recording device: {}", device_name);

        let device_config = device.default_input_config()?;
        let device_sample_rate = device_config.sample_rate().0;
        let num_channels = device_config.channels() as usize;

        if device_sample_rate != self.requested_sample_rate {
            tracing::warn!(
                "Requested sample rate {}Hz but device uses {}Hz. Recording at device rate.",
                self.requested_sample_rate,
                device_sample_rate
            );
        }

        tracing::debug!(
            "Device configuration: {}Hz, {} channels, {:?}",
            device_sample_rate,
            num_channels,
            device_config.sample_format()
        );

        let wav_spec = WavSpec {
            channels: 1,
            sample_rate: device_sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let writer: SharedWriter = Arc::new(Mutex::new(Some(WavWriter::create(path, wav_spec)?)));
        let paused = Arc::new(AtomicBool::new(false));

        let stream_config: cpal::StreamConfig = device_config.config();
        let stream = match device_config.sample_format() {
            cpal::SampleFormat::I16 => {
                build_input_stream::<i16>(&device, &stream_config, &writer, &paused, num_channels)?
            }
            cpal::SampleFormat::I32 => {
                build_input_stream::<i32>(&device, &stream_config, &writer, &paused, num_channels)?
            }
            cpal::SampleFormat::U16 => {
                build_input_stream::<u16>(&device, &stream_config, &writer, &paused, num_channels)?
            }
            cpal::SampleFormat::F32 => {
                build_input_stream::<f32>(&device, &stream_config, &writer, &paused, num_channels)?
            }
            cpal::SampleFormat::F64 => {
                build_input_stream::<f64>(&device, &stream_config, &writer, &paused, num_channels)?
            }
            other => return Err(anyhow!("Unsupported input sample format: {other:?}")),
        };

        stream.play()?;
        tracing::debug!("Audio stream started, writing {}", path.display());

        Ok(Box::new(CpalCaptureSession {
            stream: Some(stream),
            writer,
            paused,
            path: path.to_path_buf(),
        }))
    }
}

/// A live capture stream and the WAV file it feeds.
struct CpalCaptureSession {
    /// Active input stream (dropping it stops the callback)
    stream: Option<cpal::Stream>,
    writer: SharedWriter,
    paused: Arc<AtomicBool>,
    path: PathBuf,
}

impl CaptureSession for CpalCaptureSession {
    fn pause(&mut self) -> Result<()> {
        self.paused.store(true, Ordering::SeqCst);
        tracing::debug!("Recording paused");
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        self.paused.store(false, Ordering::SeqCst);
        tracing::debug!("Recording resumed");
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        // Stop the callback before taking the writer
        self.stream = None;

        let writer = self
            .writer
            .lock()
            .map_err(|_| anyhow!("Recording writer lock poisoned"))?
            .take()
            .ok_or_else(|| anyhow!("Recording already finalized"))?;

        let frames = writer.duration();
        let sample_rate = writer.spec().sample_rate;
        writer.finalize()?;

        tracing::info!(
            "Recording stopped: {:.2}s ({} samples at {}Hz) -> {}",
            frames as f32 / sample_rate as f32,
            frames,
            sample_rate,
            self.path.display()
        );
        Ok(())
    }
}

fn build_input_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    writer: &SharedWriter,
    paused: &Arc<AtomicBool>,
    num_channels: usize,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    i16: FromSample<T>,
{
    let writer = Arc::clone(writer);
    let paused = Arc::clone(paused);

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            if !paused.load(Ordering::Relaxed) {
                handle_audio_callback(data, &writer, num_channels);
            }
        },
        |err| {
            tracing::error!("Audio stream error: {}", err);
        },
        None,
    )?;

    Ok(stream)
}

/// Folds interleaved input to mono by averaging channels and appends it to the file.
fn handle_audio_callback<T>(data: &[T], writer: &SharedWriter, num_channels: usize)
where
    T: Sample,
    i16: FromSample<T>,
{
    let Ok(mut guard) = writer.lock() else {
        return;
    };
    let Some(writer) = guard.as_mut() else {
        return;
    };

    for frame in data.chunks_exact(num_channels.max(1)) {
        let sum: i32 = frame.iter().map(|&s| s.to_sample::<i16>() as i32).sum();
        let mono = (sum / frame.len() as i32) as i16;
        if let Err(e) = writer.write_sample(mono) {
            tracing::error!("Failed to write audio sample: {}", e);
            return;
        }
    }
}

/// Finds an audio input device by name or numeric index.
///
/// # Arguments
/// * `host` - The cpal audio host
/// * `device_spec` - A device name or a numeric index (0, 1, 2, etc.)
///
/// # Errors
/// - If no device with the specified name/index is found
fn find_device_by_name(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    let devices: Vec<_> = host
        .input_devices()
        .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?
        .collect();

    if let Ok(index) = device_spec.parse::<usize>() {
        let count = devices.len();
        return devices.into_iter().nth(index).ok_or_else(|| {
            anyhow!(
                "Device index {} is out of range (0-{})",
                index,
                count.saturating_sub(1)
            )
        });
    }

    devices
        .into_iter()
        .find(|device| device.name().map(|name| name == device_spec).unwrap_or(false))
        .ok_or_else(|| {
            anyhow!(
                "Audio input device '{device_spec}' not found. Use 'clipdeck list-devices' to see available devices."
            )
        })
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
/// On non-Linux platforms, this is a no-op since ALSA doesn't exist.
#[cfg(target_os = "linux")]
pub(crate) fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;

    let dev_null_fd = dev_null.as_raw_fd();

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(anyhow!("Failed to duplicate stderr"));
    }

    let redirect_result = unsafe { libc::dup2(dev_null_fd, libc::STDERR_FILENO) };
    if redirect_result == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(anyhow!("Failed to redirect stderr"));
    }

    let result = f();

    // Restore the original stderr
    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared_writer(dir: &Path) -> (SharedWriter, PathBuf) {
        let path = dir.join("capture.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let writer = WavWriter::create(&path, spec).unwrap();
        (Arc::new(Mutex::new(Some(writer))), path)
    }

    #[test]
    fn test_stereo_input_is_averaged_to_mono() {
        let dir = tempfile::tempdir().unwrap();
        let (writer, path) = shared_writer(dir.path());

        handle_audio_callback(&[100i16, 300, -50, -150], &writer, 2);
        writer.lock().unwrap().take().unwrap().finalize().unwrap();

        let samples: Vec<i16> = hound::WavReader::open(&path)
            .unwrap()
            .samples::<i16>()
            .map(|s| s.unwrap())
            .collect();
        assert_eq!(samples, vec![200, -100]);
    }

    #[test]
    fn test_float_input_is_converted() {
        let dir = tempfile::tempdir().unwrap();
        let (writer, path) = shared_writer(dir.path());

        handle_audio_callback(&[0.0f32, 1.0, -1.0], &writer, 1);
        writer.lock().unwrap().take().unwrap().finalize().unwrap();

        let samples: Vec<i16> = hound::WavReader::open(&path)
            .unwrap()
            .samples::<i16>()
            .map(|s| s.unwrap())
            .collect();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0], 0);
        assert!(samples[1] > 32000);
        assert!(samples[2] < -32000);
    }

    #[test]
    fn test_callback_after_finalize_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let (writer, _path) = shared_writer(dir.path());
        writer.lock().unwrap().take().unwrap().finalize().unwrap();

        handle_audio_callback(&[1i16, 2, 3], &writer, 1);
        assert!(writer.lock().unwrap().is_none());
    }
}
