//! Monitor: owns the capture loop and the session, and serializes user
//! commands with scheduled ticks on one thread.
//!
//! Commands arrive on an mpsc channel (stdin reader, Ctrl-C handler, tests).
//! Between commands the loop sleeps until the next tick deadline using
//! `recv_timeout`, so a tick and a command never run at the same time.

use anyhow::{Context, Result};
use chrono::Local;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Instant;

use crate::alert::{AlarmSink, AlertEngine, BellSink, SilentSink};
use crate::capture::{CaptureLoop, CaptureState, TickReport};
use crate::classify::classifier_for;
use crate::config::{AlarmSinkKind, MonitorConfig};
use crate::error::DeviceAccessError;
use crate::event_log::LogEntry;
use crate::identity::{JsonFileStore, SessionIdentity};
use crate::ingest::CameraSource;
use crate::report::ReportExporter;
use crate::session::Session;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Start capture.
    Start,
    /// Stop capture.
    Stop,
    /// Stop capture and leave.
    Exit,
    /// Write the incident report.
    ExportReport,
    /// List retained incidents.
    ShowEvents,
    /// Any user gesture; unlocks audio alarms.
    Interaction,
    /// Leave without an interaction (channel closed, signal).
    Quit,
}

impl Command {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            "exit" => Some(Self::Exit),
            "report" | "download" => Some(Self::ExportReport),
            "events" | "log" => Some(Self::ShowEvents),
            "quit" => Some(Self::Quit),
            _ => None,
        }
    }

    fn is_gesture(self) -> bool {
        !matches!(self, Self::Quit)
    }
}

/// Receives everything the monitor wants to show. All methods default to
/// doing nothing.
pub trait MonitorObserver {
    fn on_state(&mut self, _state: CaptureState, _session: &Session) {}
    fn on_tick(&mut self, _report: &TickReport, _session: &Session) {}
    fn on_device_error(&mut self, _err: &DeviceAccessError) {}
    fn on_report(&mut self, _path: &std::path::Path) {}
    fn on_report_error(&mut self, _err: &anyhow::Error) {}
    fn on_events(&mut self, _entries: &[LogEntry]) {}
}

/// Observer that ignores everything.
#[derive(Default)]
pub struct NullObserver;

impl MonitorObserver for NullObserver {}

pub struct Monitor {
    capture: CaptureLoop,
    session: Session,
    exporter: ReportExporter,
}

impl Monitor {
    pub fn new(capture: CaptureLoop, session: Session, exporter: ReportExporter) -> Self {
        Self {
            capture,
            session,
            exporter,
        }
    }

    /// Wire every component from configuration.
    pub fn from_config(config: &MonitorConfig) -> Result<Self> {
        let camera = CameraSource::new(&config.camera)?;
        let classifier = classifier_for(&config.classifier)?;
        let sink: Box<dyn AlarmSink> = match config.alerts.sink {
            AlarmSinkKind::Bell => Box::new(BellSink),
            AlarmSinkKind::Silent => Box::new(SilentSink),
        };
        let alerts = AlertEngine::new(sink).with_cooldown(config.alerts.cooldown);
        let capture = CaptureLoop::new(Box::new(camera), classifier, alerts)
            .with_period(config.camera.tick)
            .with_jpeg_quality(config.camera.jpeg_quality);

        let identity = match &config.session_path {
            Some(path) => {
                let store = JsonFileStore::open(path)
                    .with_context(|| format!("load session identity from {}", path.display()))?;
                SessionIdentity::from_store(&store)
            }
            None => SessionIdentity::default(),
        };
        log::info!("session user: {}", identity.display_name());

        let mut exporter = ReportExporter::new(config.report_dir.clone());
        if let Some(path) = &config.session_path {
            exporter = exporter.with_session_path(path.clone());
        }
        Ok(Self::new(
            capture,
            Session::new(identity, config.retention),
            exporter,
        ))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn capture(&self) -> &CaptureLoop {
        &self.capture
    }

    /// Handle one command. `Break` means the monitor should shut down.
    pub fn handle(&mut self, command: Command, observer: &mut dyn MonitorObserver) -> ControlFlow<()> {
        if command.is_gesture() {
            self.session.note_interaction();
        }
        match command {
            Command::Start => self.start(observer),
            Command::Stop => self.stop(observer),
            Command::Exit | Command::Quit => {
                self.stop(observer);
                return ControlFlow::Break(());
            }
            Command::ExportReport => match self.export_report() {
                Ok(path) => observer.on_report(&path),
                Err(err) => {
                    log::error!("report export failed: {:#}", err);
                    observer.on_report_error(&err);
                }
            },
            Command::ShowEvents => {
                let entries: Vec<LogEntry> = self.session.log.all().cloned().collect();
                observer.on_events(&entries);
            }
            Command::Interaction => {}
        }
        ControlFlow::Continue(())
    }

    /// Start capture without recording a user gesture. `Command::Start` goes
    /// through here after unlocking audio; autostart calls it directly.
    pub fn start(&mut self, observer: &mut dyn MonitorObserver) {
        if self.capture.is_streaming() {
            return;
        }
        match self.capture.start(Instant::now()) {
            Ok(()) => observer.on_state(CaptureState::Streaming, &self.session),
            Err(err) => {
                log::error!(
                    "camera {} unavailable: {}",
                    self.capture.source_description(),
                    err
                );
                observer.on_device_error(&err);
            }
        }
    }

    pub fn stop(&mut self, observer: &mut dyn MonitorObserver) {
        let was_streaming = self.capture.is_streaming();
        self.capture.stop(&mut self.session);
        if was_streaming {
            observer.on_state(CaptureState::Idle, &self.session);
        }
    }

    pub fn export_report(&self) -> Result<PathBuf> {
        self.exporter.export(&self.session, Local::now())
    }

    /// Run the scheduled tick if it is due.
    pub fn poll(&mut self, now: Instant, observer: &mut dyn MonitorObserver) {
        if let Some(report) = self.capture.poll(&mut self.session, now) {
            for entry in &report.entries {
                log::warn!(
                    "{} detected ({}, severity {})",
                    entry.event_name,
                    entry.code,
                    entry.severity
                );
            }
            observer.on_tick(&report, &self.session);
        }
    }

    /// Process commands until `Exit`/`Quit` or until every sender is gone.
    /// Capture is stopped before returning.
    pub fn run(&mut self, commands: Receiver<Command>, observer: &mut dyn MonitorObserver) {
        loop {
            let received = match self.capture.next_deadline() {
                Some(deadline) => {
                    let now = Instant::now();
                    if deadline <= now {
                        self.poll(now, observer);
                        continue;
                    }
                    match commands.recv_timeout(deadline - now) {
                        Ok(command) => command,
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => Command::Quit,
                    }
                }
                None => commands.recv().unwrap_or(Command::Quit),
            };
            if self.handle(received, observer).is_break() {
                break;
            }
        }
        self.stop(observer);
        log::info!(
            "monitor finished: {} incidents recorded, {} retained",
            self.session.log.total_appended(),
            self.session.log.len()
        );
    }
}
