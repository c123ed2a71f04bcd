//! The recording service: one capture session at a time plus its progress ticker.
//!
//! Control calls are not gated on state here beyond what keeps the service
//! sound (no second session while one is open, no pause while paused); the
//! caller decides which controls make sense. Every transition is announced on
//! the injected [`EventSink`].

use super::device::{CaptureDevice, CaptureSession};
use super::events::{EventSink, RecorderEvent};
use crate::session::ElapsedClock;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Default spacing between progress events.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Handle to the periodic progress task. Dropping it cancels the task.
#[derive(Debug)]
pub struct TickerHandle {
    handle: JoinHandle<()>,
}

impl TickerHandle {
    /// Spawns a task emitting a progress event for `file_path` every `interval`,
    /// starting immediately.
    pub fn spawn(
        sink: EventSink,
        clock: Arc<Mutex<ElapsedClock>>,
        file_path: PathBuf,
        interval: Duration,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let elapsed = clock
                    .lock()
                    .map(|c| c.elapsed_secs(Instant::now()))
                    .unwrap_or(0);
                sink.emit(RecorderEvent::Progress {
                    elapsed,
                    file_path: file_path.clone(),
                });
            }
        });
        Self { handle }
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// The open capture and everything tied to its lifetime.
struct ActiveCapture {
    session: Box<dyn CaptureSession>,
    file_path: PathBuf,
    clock: Arc<Mutex<ElapsedClock>>,
    ticker: Option<TickerHandle>,
    paused: bool,
}

/// Owns the capture device handle and publishes recording lifecycle events.
pub struct RecordingService {
    device: Box<dyn CaptureDevice>,
    sink: EventSink,
    active: Option<ActiveCapture>,
    progress_interval: Duration,
}

impl RecordingService {
    /// Builds a service around a capture device, publishing into `sink`.
    pub fn new(device: Box<dyn CaptureDevice>, sink: EventSink, progress_interval: Duration) -> Self {
        Self {
            device,
            sink,
            active: None,
            progress_interval,
        }
    }

    /// Whether a capture session is open (recording or paused).
    pub fn is_capturing(&self) -> bool {
        self.active.is_some()
    }

    /// Whether the open capture session is paused.
    pub fn is_paused(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.paused)
    }

    /// Opens the capture device writing to `path`.
    ///
    /// A failure to open the device is logged, announced with a `Failed` event,
    /// and leaves the service idle.
    pub fn start(&mut self, path: &Path) {
        if let Some(active) = &self.active {
            tracing::warn!(
                "Start ignored: already recording to {}",
                active.file_path.display()
            );
            return;
        }

        let session = match self.device.open(path) {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("Failed to start recording to {}: {:#}", path.display(), e);
                self.sink.emit(RecorderEvent::Failed {
                    file_path: path.to_path_buf(),
                    message: e.to_string(),
                });
                return;
            }
        };

        let mut clock = ElapsedClock::new();
        clock.start(Instant::now());
        let clock = Arc::new(Mutex::new(clock));

        let ticker = TickerHandle::spawn(
            self.sink.clone(),
            Arc::clone(&clock),
            path.to_path_buf(),
            self.progress_interval,
        );

        self.active = Some(ActiveCapture {
            session,
            file_path: path.to_path_buf(),
            clock,
            ticker: Some(ticker),
            paused: false,
        });

        tracing::info!("Recording started: {}", path.display());
        self.sink.emit(RecorderEvent::Started {
            file_path: path.to_path_buf(),
        });
    }

    /// Suspends capture without closing the file. No-op unless recording.
    pub fn pause(&mut self) {
        let Some(active) = self.active.as_mut().filter(|a| !a.paused) else {
            tracing::debug!("Pause ignored: not recording");
            return;
        };

        if let Err(e) = active.session.pause() {
            tracing::error!("Failed to pause recording: {:#}", e);
            return;
        }

        active.paused = true;
        active.ticker = None;
        if let Ok(mut clock) = active.clock.lock() {
            clock.pause(Instant::now());
        }

        self.sink.emit(RecorderEvent::Paused {
            file_path: active.file_path.clone(),
        });
    }

    /// Continues a paused capture into the same file. No-op unless paused.
    pub fn resume(&mut self) {
        let Some(active) = self.active.as_mut().filter(|a| a.paused) else {
            tracing::debug!("Resume ignored: not paused");
            return;
        };

        if let Err(e) = active.session.resume() {
            tracing::error!("Failed to resume recording: {:#}", e);
            return;
        }

        active.paused = false;
        if let Ok(mut clock) = active.clock.lock() {
            clock.resume(Instant::now());
        }
        active.ticker = Some(TickerHandle::spawn(
            self.sink.clone(),
            Arc::clone(&active.clock),
            active.file_path.clone(),
            self.progress_interval,
        ));

        self.sink.emit(RecorderEvent::Resumed {
            file_path: active.file_path.clone(),
        });
    }

    /// Finalizes the file and releases the device.
    ///
    /// Finalize errors are logged and swallowed; the session is dropped either
    /// way and a `Stopped` event is always emitted for an open session. Returns
    /// the path of the finished file.
    pub fn stop(&mut self) -> Option<PathBuf> {
        let Some(active) = self.active.take() else {
            tracing::debug!("Stop ignored: not recording");
            return None;
        };

        let ActiveCapture {
            session,
            file_path,
            ticker,
            ..
        } = active;
        drop(ticker);

        if let Err(e) = session.finish() {
            tracing::error!(
                "Failed to finalize recording {}: {:#}",
                file_path.display(),
                e
            );
        }

        self.sink.emit(RecorderEvent::Stopped {
            file_path: file_path.clone(),
        });
        Some(file_path)
    }
}

impl Drop for RecordingService {
    fn drop(&mut self) {
        if self.active.is_some() {
            tracing::warn!("Recording service dropped with an open session, finalizing");
            self.stop();
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use tokio::sync::broadcast::error::TryRecvError;

    /// Records calls made against it; shared through `Arc` so tests can inspect.
    #[derive(Debug, Default)]
    pub(crate) struct CaptureLog {
        pub calls: Mutex<Vec<String>>,
    }

    impl CaptureLog {
        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    pub(crate) struct FakeCapture {
        pub log: Arc<CaptureLog>,
        pub fail_open: bool,
        pub fail_finish: bool,
    }

    impl FakeCapture {
        pub(crate) fn new(log: Arc<CaptureLog>) -> Self {
            Self {
                log,
                fail_open: false,
                fail_finish: false,
            }
        }
    }

    struct FakeCaptureSession {
        log: Arc<CaptureLog>,
        fail_finish: bool,
    }

    impl CaptureDevice for FakeCapture {
        fn open(&mut self, path: &Path) -> Result<Box<dyn CaptureSession>> {
            if self.fail_open {
                return Err(anyhow!("device busy"));
            }
            self.log.calls.lock().unwrap().push(format!("open {}", path.display()));
            Ok(Box::new(FakeCaptureSession {
                log: Arc::clone(&self.log),
                fail_finish: self.fail_finish,
            }))
        }
    }

    impl CaptureSession for FakeCaptureSession {
        fn pause(&mut self) -> Result<()> {
            self.log.calls.lock().unwrap().push("pause".into());
            Ok(())
        }

        fn resume(&mut self) -> Result<()> {
            self.log.calls.lock().unwrap().push("resume".into());
            Ok(())
        }

        fn finish(self: Box<Self>) -> Result<()> {
            self.log.calls.lock().unwrap().push("finish".into());
            if self.fail_finish {
                return Err(anyhow!("disk full"));
            }
            Ok(())
        }
    }

    fn service(device: FakeCapture) -> (RecordingService, EventSink) {
        let sink = EventSink::new(64);
        let service = RecordingService::new(Box::new(device), sink.clone(), Duration::from_secs(3600));
        (service, sink)
    }

    /// Drains events, skipping progress ticks.
    fn lifecycle(rx: &mut tokio::sync::broadcast::Receiver<RecorderEvent>) -> Vec<&'static str> {
        let mut names = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(RecorderEvent::Progress { .. }) => continue,
                Ok(event) => names.push(event.name()),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                Err(TryRecvError::Lagged(_)) => continue,
            }
        }
        names
    }

    #[tokio::test]
    async fn test_full_lifecycle_emits_events_in_order() {
        let log = Arc::new(CaptureLog::default());
        let (mut service, sink) = service(FakeCapture::new(Arc::clone(&log)));
        let mut rx = sink.subscribe();
        let path = PathBuf::from("/tmp/rec_1.wav");

        service.start(&path);
        assert!(service.is_capturing());
        service.pause();
        assert!(service.is_paused());
        service.resume();
        assert_eq!(service.stop(), Some(path.clone()));
        assert!(!service.is_capturing());

        assert_eq!(
            lifecycle(&mut rx),
            vec![
                "onRecordingStarted",
                "onRecordingPaused",
                "onRecordingResumed",
                "onRecordingStopped"
            ]
        );
        assert_eq!(
            log.calls(),
            vec!["open /tmp/rec_1.wav", "pause", "resume", "finish"]
        );
    }

    #[tokio::test]
    async fn test_pause_and_resume_are_noops_out_of_state() {
        let log = Arc::new(CaptureLog::default());
        let (mut service, sink) = service(FakeCapture::new(Arc::clone(&log)));
        let mut rx = sink.subscribe();

        service.pause();
        service.resume();
        service.start(Path::new("/tmp/rec_2.wav"));
        service.resume();
        service.pause();
        service.pause();

        assert_eq!(lifecycle(&mut rx), vec!["onRecordingStarted", "onRecordingPaused"]);
        assert_eq!(log.calls(), vec!["open /tmp/rec_2.wav", "pause"]);
    }

    #[tokio::test]
    async fn test_open_failure_emits_failed_and_stays_idle() {
        let log = Arc::new(CaptureLog::default());
        let mut device = FakeCapture::new(log);
        device.fail_open = true;
        let (mut service, sink) = service(device);
        let mut rx = sink.subscribe();

        service.start(Path::new("/tmp/rec_3.wav"));

        assert!(!service.is_capturing());
        assert_eq!(lifecycle(&mut rx), vec!["onRecordingFailed"]);
        assert_eq!(service.stop(), None);
    }

    #[tokio::test]
    async fn test_finish_failure_is_swallowed() {
        let log = Arc::new(CaptureLog::default());
        let mut device = FakeCapture::new(Arc::clone(&log));
        device.fail_finish = true;
        let (mut service, sink) = service(device);
        let mut rx = sink.subscribe();

        service.start(Path::new("/tmp/rec_4.wav"));
        assert!(service.stop().is_some());

        assert!(!service.is_capturing());
        assert_eq!(lifecycle(&mut rx), vec!["onRecordingStarted", "onRecordingStopped"]);
    }

    #[tokio::test]
    async fn test_second_start_is_ignored() {
        let log = Arc::new(CaptureLog::default());
        let (mut service, _sink) = service(FakeCapture::new(Arc::clone(&log)));

        service.start(Path::new("/tmp/a.wav"));
        service.start(Path::new("/tmp/b.wav"));
        service.stop();

        assert_eq!(log.calls(), vec!["open /tmp/a.wav", "finish"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_ticks_stop_while_paused() {
        let log = Arc::new(CaptureLog::default());
        let sink = EventSink::new(64);
        let mut rx = sink.subscribe();
        let mut service =
            RecordingService::new(Box::new(FakeCapture::new(log)), sink, Duration::from_millis(500));

        service.start(Path::new("/tmp/tick.wav"));
        tokio::time::sleep(Duration::from_millis(1_100)).await;
        service.pause();
        let mut ticks = 0;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, RecorderEvent::Progress { .. }) {
                ticks += 1;
            }
        }
        assert_eq!(ticks, 3);

        tokio::time::sleep(Duration::from_secs(5)).await;
        let late: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter(|e| matches!(e, RecorderEvent::Progress { .. }))
            .collect();
        assert!(late.is_empty());
        service.stop();
    }
}
