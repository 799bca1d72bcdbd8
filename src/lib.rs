//! Driver Monitor
//!
//! This crate samples a camera at a fixed interval, asks a remote classifier
//! to grade four driver behaviors, and turns the answers into alerts and an
//! incident log.
//!
//! # Pipeline
//!
//! 1. **Capture**: a `FrameSource` hands out stills while streaming.
//! 2. **Classify**: stills are sent as JPEG data URIs to a `Classifier`. Any
//!    failure is replaced by a random sample so the display keeps moving.
//! 3. **Normalize**: raw labels or numbers become 0–100 scores with labels.
//! 4. **Alert**: thresholds drive a visual flag, a rate-limited alarm, and
//!    incidents for the log.
//! 5. **Report**: the retained log can be exported as a plain-text report.
//!
//! # Module Structure
//!
//! - `score`: score normalization and risk labels
//! - `classify`: classifier trait, HTTP client, fallback sampler
//! - `frame` / `ingest`: captured stills and camera sources
//! - `capture`: streaming state machine and tick scheduling
//! - `alert` / `event_log` / `report`: alerting, incident log, export
//! - `identity` / `session`: who is driving and per-session state
//! - `monitor` / `ui`: command loop and terminal display

pub mod alert;
pub mod capture;
pub mod classify;
pub mod config;
pub mod error;
pub mod event_log;
pub mod frame;
pub mod identity;
pub mod ingest;
pub mod monitor;
pub mod report;
pub mod score;
pub mod session;
pub mod ui;

pub use alert::{
    AlarmSink, AlertEngine, AlertOutcome, AlertState, AlertThresholds, AudioGate, BellSink,
    CountingSink, SilentSink, TonePattern, ALERT_COOLDOWN,
};
pub use capture::{CaptureLoop, CaptureState, CaptureStats, ResultOrigin, TickReport};
pub use classify::{
    classifier_for, Classifier, ClassifierResult, FallbackSampler, HttpClassifier,
    ScriptedClassifier,
};
pub use config::{AlarmSinkKind, MonitorConfig};
pub use error::{ClassifierUnavailable, DeviceAccessError};
pub use event_log::{EntryType, EventLog, Incident, LogEntry, Severity, DEFAULT_RETENTION};
pub use frame::Frame;
pub use identity::{IdentityStore, JsonFileStore, MemoryStore, SessionIdentity};
pub use ingest::{CameraSource, FrameSource, StillImageSource, SyntheticCamera};
pub use monitor::{Command, Monitor, MonitorObserver, NullObserver};
pub use report::{render_report, ReportExporter};
pub use score::{normalize, Channel, ChannelScores, RawValue, RiskLabel, RiskScore};
pub use session::Session;
