//! Capture loop.
//!
//! The loop is either `Idle` or `Streaming`. While streaming it runs one tick
//! per period: grab a still, encode it, ask the classifier (or the fallback
//! sampler when the classifier fails), normalize, and hand the scores to the
//! alert engine. Incidents the engine reports are appended to the session log.
//!
//! Ticks never overlap. A tick that overruns its period delays the next one;
//! deadlines that pass while a tick is running are dropped, not replayed.

use chrono::Local;
use std::time::{Duration, Instant};

use crate::alert::AlertEngine;
use crate::classify::{Classifier, ClassifierResult, FallbackSampler};
use crate::error::DeviceAccessError;
use crate::event_log::LogEntry;
use crate::frame::{Frame, DEFAULT_JPEG_QUALITY};
use crate::ingest::FrameSource;
use crate::score::ChannelScores;
use crate::session::Session;

/// Default sampling period.
pub const DEFAULT_TICK: Duration = Duration::from_millis(500);
const MIN_TICK: Duration = Duration::from_millis(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Streaming,
}

/// Where a tick's classifier result came from. Diagnostics only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultOrigin {
    Classifier,
    Fallback,
}

/// Everything one completed tick produced.
#[derive(Clone, Debug)]
pub struct TickReport {
    pub scores: ChannelScores,
    pub origin: ResultOrigin,
    pub visual_active: bool,
    pub alarm_fired: bool,
    pub entries: Vec<LogEntry>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub ticks: u64,
    pub skipped_empty: u64,
    pub capture_errors: u64,
    pub fallbacks: u64,
    pub missed_deadlines: u64,
}

pub struct CaptureLoop {
    source: Box<dyn FrameSource>,
    classifier: Box<dyn Classifier>,
    fallback: FallbackSampler,
    alerts: AlertEngine,
    period: Duration,
    jpeg_quality: u8,
    state: CaptureState,
    next_due: Option<Instant>,
    stats: CaptureStats,
}

impl CaptureLoop {
    pub fn new(
        source: Box<dyn FrameSource>,
        classifier: Box<dyn Classifier>,
        alerts: AlertEngine,
    ) -> Self {
        Self {
            source,
            classifier,
            fallback: FallbackSampler::new(),
            alerts,
            period: DEFAULT_TICK,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            state: CaptureState::Idle,
            next_due: None,
            stats: CaptureStats::default(),
        }
    }

    /// Sampling period, at least one millisecond.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period.max(MIN_TICK);
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackSampler) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_streaming(&self) -> bool {
        self.state == CaptureState::Streaming
    }

    pub fn stats(&self) -> CaptureStats {
        self.stats
    }

    pub fn source_description(&self) -> String {
        self.source.describe()
    }

    /// Idle -> Streaming. The first tick is due one period after `now`.
    ///
    /// Starting while already streaming is a no-op.
    pub fn start(&mut self, now: Instant) -> Result<(), DeviceAccessError> {
        if self.is_streaming() {
            return Ok(());
        }
        self.source.acquire()?;
        self.state = CaptureState::Streaming;
        self.next_due = Some(now + self.period);
        log::info!(
            "capture started on {} every {}ms via {} classifier",
            self.source.describe(),
            self.period.as_millis(),
            self.classifier.name()
        );
        Ok(())
    }

    /// Streaming -> Idle. Cancels the schedule and releases the camera before
    /// reporting idle.
    pub fn stop(&mut self, session: &mut Session) {
        self.next_due = None;
        self.source.release();
        let was_streaming = self.is_streaming();
        self.state = CaptureState::Idle;
        session.on_capture_stopped();
        if was_streaming {
            let source = self.source.stats();
            log::info!(
                "capture stopped on {} after {} frames, {} ticks ({} fallback)",
                source.source,
                source.frames_captured,
                self.stats.ticks,
                self.stats.fallbacks
            );
        }
    }

    /// When the next tick is due, if streaming.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_due
    }

    /// Run the scheduled tick if it is due at `now`.
    pub fn poll(&mut self, session: &mut Session, now: Instant) -> Option<TickReport> {
        let due = self.next_due?;
        if now < due {
            return None;
        }
        let mut next = due + self.period;
        while next <= now {
            next += self.period;
            self.stats.missed_deadlines += 1;
        }
        self.next_due = Some(next);
        self.tick(session, now)
    }

    /// Run one tick immediately. Returns `None` when idle, when the camera has
    /// no decoded picture yet, or when the capture itself failed.
    pub fn tick(&mut self, session: &mut Session, now: Instant) -> Option<TickReport> {
        if !self.is_streaming() {
            return None;
        }
        let frame = match self.source.capture() {
            Ok(frame) => frame,
            Err(err) => {
                self.stats.capture_errors += 1;
                log::warn!("capture failed on {}: {:#}", self.source.describe(), err);
                return None;
            }
        };
        if frame.is_empty() {
            self.stats.skipped_empty += 1;
            return None;
        }

        let (result, origin) = self.classify(&frame);
        drop(frame);
        self.stats.ticks += 1;

        let scores = result.scores();
        let outcome = self.alerts.evaluate(
            &scores,
            &mut session.alert,
            &session.audio,
            now,
            Local::now(),
        );
        let entries = outcome
            .incidents
            .into_iter()
            .map(|incident| session.log.append(incident).clone())
            .collect();

        Some(TickReport {
            scores,
            origin,
            visual_active: outcome.visual_active,
            alarm_fired: outcome.alarm_fired,
            entries,
        })
    }

    fn classify(&mut self, frame: &Frame) -> (ClassifierResult, ResultOrigin) {
        let classified = frame
            .to_data_uri(self.jpeg_quality)
            .map_err(|err| format!("{:#}", err))
            .and_then(|uri| {
                self.classifier
                    .classify(&uri)
                    .map_err(|err| err.to_string())
            });
        match classified {
            Ok(result) => (result, ResultOrigin::Classifier),
            Err(reason) => {
                self.stats.fallbacks += 1;
                log::debug!("classifier unavailable, using fallback sample: {}", reason);
                (self.fallback.sample(), ResultOrigin::Fallback)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::CountingSink;
    use crate::classify::ScriptedClassifier;
    use crate::identity::SessionIdentity;
    use crate::ingest::SyntheticCamera;
    use crate::score::RiskLabel;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn capture_with(classifier: ScriptedClassifier, source: &str) -> CaptureLoop {
        let camera = SyntheticCamera::new(source, 16, 12).with_warmup(0);
        CaptureLoop::new(
            Box::new(camera),
            Box::new(classifier),
            AlertEngine::new(Box::new(CountingSink::new())),
        )
    }

    fn session() -> Session {
        Session::new(SessionIdentity::guest(), 20)
    }

    #[test]
    fn idle_loop_does_not_tick() {
        let mut capture = capture_with(ScriptedClassifier::offline(), "stub://cam");
        let mut session = session();
        assert_eq!(capture.state(), CaptureState::Idle);
        assert!(capture.tick(&mut session, Instant::now()).is_none());
        assert!(capture.next_deadline().is_none());
    }

    #[test]
    fn device_errors_keep_loop_idle() {
        let mut capture = capture_with(ScriptedClassifier::offline(), "stub://denied");
        let err = capture.start(Instant::now()).unwrap_err();
        assert!(matches!(err, DeviceAccessError::PermissionDenied(_)));
        assert_eq!(capture.state(), CaptureState::Idle);
        assert!(capture.next_deadline().is_none());
    }

    #[test]
    fn classifier_result_flows_into_log() {
        let high = ClassifierResult::from_labels("High", "No", "No", "No");
        let mut capture = capture_with(ScriptedClassifier::constant(high), "stub://cam");
        let mut session = session();
        capture.start(Instant::now()).unwrap();

        let report = capture.tick(&mut session, Instant::now()).unwrap();
        assert_eq!(report.origin, ResultOrigin::Classifier);
        assert_eq!(report.scores.drowsiness.value, 85);
        assert_eq!(report.scores.drowsiness.label, RiskLabel::High);
        assert!(report.visual_active);
        assert_eq!(report.entries.len(), 1);
        assert_eq!(session.log.len(), 1);
    }

    #[test]
    fn seeded_fallback_is_reproducible() {
        let run = || {
            let mut capture = capture_with(ScriptedClassifier::offline(), "stub://cam")
                .with_fallback(FallbackSampler::with_rng(StdRng::seed_from_u64(42)));
            let mut session = session();
            capture.start(Instant::now()).unwrap();
            (0..30)
                .map(|_| capture.tick(&mut session, Instant::now()).unwrap().scores)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn zero_period_is_raised_to_minimum() {
        let mut capture = capture_with(ScriptedClassifier::offline(), "stub://cam")
            .with_period(Duration::ZERO);
        let mut session = session();
        let t0 = Instant::now();
        capture.start(t0).unwrap();
        assert_eq!(capture.next_deadline(), Some(t0 + MIN_TICK));

        assert!(capture.poll(&mut session, t0 + Duration::from_millis(10)).is_some());
        assert_eq!(capture.next_deadline(), Some(t0 + Duration::from_millis(11)));
        assert_eq!(capture.stats().missed_deadlines, 9);
    }

    #[test]
    fn failures_fall_back_silently() {
        let mut capture = capture_with(ScriptedClassifier::offline(), "stub://cam");
        let mut session = session();
        capture.start(Instant::now()).unwrap();
        for _ in 0..20 {
            let report = capture.tick(&mut session, Instant::now()).unwrap();
            assert_eq!(report.origin, ResultOrigin::Fallback);
            assert!(report.scores.drowsiness.value > 0);
        }
        assert_eq!(capture.stats().fallbacks, 20);
    }

    #[test]
    fn empty_frames_are_skipped() {
        let camera = SyntheticCamera::new("stub://cam", 16, 12).with_warmup(2);
        let mut capture = CaptureLoop::new(
            Box::new(camera),
            Box::new(ScriptedClassifier::offline()),
            AlertEngine::new(Box::new(CountingSink::new())),
        );
        let mut session = session();
        capture.start(Instant::now()).unwrap();
        assert!(capture.tick(&mut session, Instant::now()).is_none());
        assert!(capture.tick(&mut session, Instant::now()).is_none());
        assert!(capture.tick(&mut session, Instant::now()).is_some());
        assert_eq!(capture.stats().skipped_empty, 2);
        assert_eq!(capture.stats().ticks, 1);
    }

    #[test]
    fn poll_follows_period_and_drops_missed_deadlines() {
        let mut capture = capture_with(ScriptedClassifier::offline(), "stub://cam");
        let mut session = session();
        let t0 = Instant::now();
        capture.start(t0).unwrap();

        assert!(capture.poll(&mut session, t0 + Duration::from_millis(100)).is_none());
        assert!(capture.poll(&mut session, t0 + Duration::from_millis(500)).is_some());
        assert_eq!(capture.next_deadline(), Some(t0 + Duration::from_millis(1000)));

        // A slow tick: the 1000/1500/2000 deadlines pass before the next poll.
        assert!(capture.poll(&mut session, t0 + Duration::from_millis(2100)).is_some());
        assert_eq!(capture.next_deadline(), Some(t0 + Duration::from_millis(2500)));
        assert_eq!(capture.stats().missed_deadlines, 2);
    }

    #[test]
    fn stop_releases_camera_and_clears_visual() {
        let high = ClassifierResult::from_labels("No", "High", "No", "No");
        let mut capture = capture_with(ScriptedClassifier::constant(high), "stub://cam");
        let mut session = session();
        capture.start(Instant::now()).unwrap();
        capture.tick(&mut session, Instant::now()).unwrap();
        assert!(session.alert.visual_active);

        capture.stop(&mut session);
        assert_eq!(capture.state(), CaptureState::Idle);
        assert!(capture.next_deadline().is_none());
        assert!(!session.alert.visual_active);
        assert!(capture.tick(&mut session, Instant::now()).is_none());
        assert_eq!(session.log.len(), 1);
    }
}
