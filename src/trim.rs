//! Cutting a time window out of a recording by demuxing and remuxing packets.
//!
//! The source WAV is read as a sequence of fixed-size packets. Every packet
//! start is a sync point, so seeking lands on the packet at or before the
//! requested start; packets are then copied whole into a new container with the
//! same format until one starts after the requested end. Output timing is
//! therefore packet accurate, not frame accurate.

use crate::error::TrimError;
use chrono::Local;
use hound::{WavReader, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Default packet size in frames, roughly one compressed audio frame.
pub const DEFAULT_FRAMES_PER_PACKET: u32 = 1024;

/// Outcome of a finished trim.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimReport {
    /// The new container file
    pub output: PathBuf,
    /// Source time of the first copied packet (at or before the requested start)
    pub first_packet_time: f64,
    /// Frames written to the output
    pub frames_written: u64,
    /// Output length in seconds
    pub duration: f64,
}

/// One packet read from the source track.
struct Packet<S> {
    /// Presentation time in the source, seconds
    time: f64,
    /// Interleaved samples of every channel
    samples: Vec<S>,
}

/// Reads track 0 of a WAV container packet by packet.
struct Demuxer {
    reader: WavReader<BufReader<File>>,
    spec: WavSpec,
    frames_per_packet: u32,
    /// Index of the next packet to read
    next_packet: u64,
    total_frames: u64,
}

impl Demuxer {
    fn open(path: &Path, frames_per_packet: u32) -> Result<Self, TrimError> {
        let reader = WavReader::open(path)?;
        let spec = reader.spec();
        if spec.channels == 0 {
            return Err(TrimError::NoTrack {
                path: path.to_path_buf(),
            });
        }
        let total_frames = u64::from(reader.duration());
        Ok(Self {
            reader,
            spec,
            frames_per_packet: frames_per_packet.max(1),
            next_packet: 0,
            total_frames,
        })
    }

    /// Format of the single track.
    fn track_format(&self) -> WavSpec {
        self.spec
    }

    fn packet_time(&self, packet: u64) -> f64 {
        (packet * u64::from(self.frames_per_packet)) as f64 / f64::from(self.spec.sample_rate)
    }

    /// Positions the reader on the last sync point at or before `time`.
    fn seek_to_sync(&mut self, time: f64) -> Result<(), TrimError> {
        let frame = ((time * f64::from(self.spec.sample_rate)).floor() as u64).min(self.total_frames);
        let packet = frame / u64::from(self.frames_per_packet);
        let sync_frame = (packet * u64::from(self.frames_per_packet)).min(self.total_frames);

        self.reader.seek(sync_frame as u32)?;
        self.next_packet = packet;
        tracing::debug!(
            "Seeked to sync point {:.3}s (packet {}) for requested {:.3}s",
            self.packet_time(packet),
            packet,
            time
        );
        Ok(())
    }

    /// Reads the next packet, or `None` at the end of the track.
    fn read_packet<S: hound::Sample>(&mut self) -> Result<Option<Packet<S>>, TrimError> {
        let want = self.frames_per_packet as usize * self.spec.channels as usize;
        let samples = self
            .reader
            .samples::<S>()
            .take(want)
            .collect::<Result<Vec<S>, _>>()?;
        if samples.is_empty() {
            return Ok(None);
        }

        let packet = Packet {
            time: self.packet_time(self.next_packet),
            samples,
        };
        self.next_packet += 1;
        Ok(Some(packet))
    }
}

/// Rejects windows that are empty, reversed, negative or not finite.
///
/// # Errors
/// - `TrimError::InvalidWindow` if `start >= end` or either bound is invalid
pub fn validate_window(start: f64, end: f64) -> Result<(), TrimError> {
    if !start.is_finite() || !end.is_finite() || start < 0.0 || start >= end {
        return Err(TrimError::InvalidWindow { start, end });
    }
    Ok(())
}

/// Writes the packets of `input` between `start` and `end` seconds to `output`,
/// rebased so the output starts at time zero.
///
/// The window is validated before any file is touched. On failure a partially
/// written `output` may remain on disk.
///
/// # Errors
/// - If the window is invalid
/// - If the source cannot be read or has no audio track
/// - If the output cannot be written
pub fn trim_file(
    input: &Path,
    output: &Path,
    start: f64,
    end: f64,
    frames_per_packet: u32,
) -> Result<TrimReport, TrimError> {
    validate_window(start, end)?;

    let mut demuxer = Demuxer::open(input, frames_per_packet)?;
    let format = demuxer.track_format();

    tracing::info!(
        "Trimming {} [{:.3}s, {:.3}s] -> {}",
        input.display(),
        start,
        end,
        output.display()
    );

    match format.sample_format {
        hound::SampleFormat::Int => remux::<i32>(&mut demuxer, output, start, end),
        hound::SampleFormat::Float => remux::<f32>(&mut demuxer, output, start, end),
    }
}

fn remux<S: hound::Sample + Copy>(
    demuxer: &mut Demuxer,
    output: &Path,
    start: f64,
    end: f64,
) -> Result<TrimReport, TrimError> {
    let format = demuxer.track_format();
    let mut muxer = WavWriter::create(output, format)?;

    demuxer.seek_to_sync(start)?;

    let mut first_packet_time = None;
    while let Some(packet) = demuxer.read_packet::<S>()? {
        if packet.time > end {
            break;
        }
        let rebased = packet.time - start;
        if first_packet_time.is_none() {
            tracing::debug!("First packet rebased to {:.3}s", rebased);
            first_packet_time = Some(packet.time);
        }

        for sample in packet.samples {
            muxer.write_sample(sample)?;
        }
    }

    let frames_written = u64::from(muxer.duration());
    muxer.finalize()?;

    let duration = frames_written as f64 / f64::from(format.sample_rate);
    tracing::info!(
        "Trim finished: {} frames ({:.3}s) written to {}",
        frames_written,
        duration,
        output.display()
    );

    Ok(TrimReport {
        output: output.to_path_buf(),
        first_packet_time: first_packet_time.unwrap_or(start),
        frames_written,
        duration,
    })
}

/// Trims `input` into a new `trimmed_<epoch ms>.wav` file inside `dir`.
///
/// # Errors
/// - Same as [`trim_file`]; the window is checked before the path is generated
pub fn trim_recording(
    dir: &Path,
    input: &Path,
    start: f64,
    end: f64,
    frames_per_packet: u32,
) -> Result<TrimReport, TrimError> {
    validate_window(start, end)?;
    std::fs::create_dir_all(dir)?;
    let output = dir.join(format!("trimmed_{}.wav", Local::now().timestamp_millis()));
    trim_file(input, &output, start, end, frames_per_packet)
}

/// Length of a WAV file in seconds.
///
/// # Errors
/// - If the file cannot be opened as WAV
pub fn wav_duration(path: &Path) -> Result<f64, TrimError> {
    let reader = WavReader::open(path)?;
    Ok(f64::from(reader.duration()) / f64::from(reader.spec().sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 8000;

    /// Writes a mono ramp so every frame's source index can be recovered.
    fn write_source(path: &Path, seconds: u32, channels: u16) {
        let spec = WavSpec {
            channels,
            sample_rate: RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for frame in 0..RATE * seconds {
            for _ in 0..channels {
                writer.write_sample((frame % 30_000) as i16).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    fn read_all(path: &Path) -> Vec<i16> {
        WavReader::open(path)
            .unwrap()
            .samples::<i16>()
            .map(|s| s.unwrap())
            .collect()
    }

    #[test]
    fn test_trim_on_packet_boundaries_is_within_one_packet() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.wav");
        let output = dir.path().join("out.wav");
        write_source(&source, 10, 1);

        // 800 frames at 8 kHz = 100 ms packets; 2.0s is a sync point
        let report = trim_file(&source, &output, 2.0, 5.0, 800).unwrap();

        let packet = 0.1;
        assert!((report.duration - 3.0).abs() <= packet + 1e-9, "{}", report.duration);
        assert_eq!(report.first_packet_time, 2.0);
        assert!((wav_duration(&output).unwrap() - report.duration).abs() < 1e-9);

        let samples = read_all(&output);
        assert_eq!(samples[0], 16_000);
    }

    #[test]
    fn test_seek_lands_on_preceding_sync_point() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.wav");
        let output = dir.path().join("out.wav");
        write_source(&source, 10, 1);

        // 1024-frame packets: 2.0s (frame 16000) falls inside packet 15 (frame 15360)
        let report = trim_file(&source, &output, 2.0, 5.0, 1024).unwrap();

        let packet = 1024.0 / RATE as f64;
        assert!(report.first_packet_time <= 2.0);
        assert!(2.0 - report.first_packet_time < packet);
        assert_eq!(read_all(&output)[0], 15_360);
        assert!((report.duration - 3.0).abs() <= 2.0 * packet, "{}", report.duration);
    }

    #[test]
    fn test_reversed_window_is_rejected_without_io() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("missing.wav");
        let output = dir.path().join("out.wav");

        let result = trim_file(&source, &output, 5.0, 2.0, 1024);
        assert!(matches!(result, Err(TrimError::InvalidWindow { .. })));
        assert!(!output.exists());
    }

    #[test]
    fn test_window_validation() {
        assert!(validate_window(0.0, 0.5).is_ok());
        assert!(validate_window(3.0, 3.0).is_err());
        assert!(validate_window(-1.0, 3.0).is_err());
        assert!(validate_window(0.0, f64::NAN).is_err());
        assert!(validate_window(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_trim_recording_rejects_before_creating_output() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("trims");
        let result = trim_recording(&out_dir, Path::new("/nonexistent.wav"), 5.0, 2.0, 1024);
        assert!(matches!(result, Err(TrimError::InvalidWindow { .. })));
        assert!(!out_dir.exists());
    }

    #[test]
    fn test_missing_source_reports_container_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = trim_file(
            &dir.path().join("missing.wav"),
            &dir.path().join("out.wav"),
            0.0,
            1.0,
            1024,
        );
        assert!(matches!(result, Err(TrimError::Container(_))));
    }

    #[test]
    fn test_end_past_source_copies_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.wav");
        let output = dir.path().join("out.wav");
        write_source(&source, 3, 1);

        let report = trim_file(&source, &output, 1.0, 60.0, 800).unwrap();
        assert!((report.duration - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_start_past_source_writes_empty_container() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.wav");
        let output = dir.path().join("out.wav");
        write_source(&source, 2, 1);

        let report = trim_file(&source, &output, 5.0, 8.0, 800).unwrap();
        assert_eq!(report.frames_written, 0);
        assert!(output.exists());
    }

    #[test]
    fn test_channels_are_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("stereo.wav");
        let output = dir.path().join("out.wav");
        write_source(&source, 4, 2);

        let report = trim_file(&source, &output, 1.0, 2.0, 800).unwrap();
        let reader = WavReader::open(&output).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(u64::from(reader.duration()), report.frames_written);
    }
}
