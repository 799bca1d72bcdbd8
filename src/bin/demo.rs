//! demo - headless run against the synthetic camera
//!
//! Streams for `--seconds`, prints every tick and incident, then writes a
//! report. The classifier is `stub://offline` unless `DRIVEMON_CLASSIFIER_URL`
//! points at a real endpoint, so the fallback sampler drives the scores.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::sync::mpsc;
use std::time::Duration;

use driver_monitor::capture::{CaptureState, TickReport};
use driver_monitor::config::AlarmSinkKind;
use driver_monitor::monitor::{Command, Monitor, MonitorObserver};
use driver_monitor::ui::{event_row, header_line, scores_line};
use driver_monitor::{DeviceAccessError, LogEntry, MonitorConfig, Session};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// How long to stream, in seconds.
    #[arg(long, default_value_t = 5)]
    seconds: u64,
    /// Sampling period in milliseconds.
    #[arg(long, default_value_t = 250)]
    tick_ms: u64,
    /// Output directory for the report.
    #[arg(long, default_value = "demo_out")]
    out: String,
}

struct PrintObserver;

impl MonitorObserver for PrintObserver {
    fn on_state(&mut self, state: CaptureState, session: &Session) {
        println!(
            "{}",
            header_line(
                state == CaptureState::Streaming,
                session.identity.display_name(),
                session.alert.visual_active
            )
        );
    }

    fn on_tick(&mut self, report: &TickReport, _session: &Session) {
        println!("{}", scores_line(&report.scores, report.visual_active));
        for entry in &report.entries {
            println!("  ⚠ {}", event_row(entry));
        }
    }

    fn on_device_error(&mut self, err: &DeviceAccessError) {
        println!("camera error: {err}");
    }

    fn on_report(&mut self, path: &std::path::Path) {
        println!("report: {}", path.display());
    }

    fn on_events(&mut self, entries: &[LogEntry]) {
        println!("{} retained events", entries.len());
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    if args.tick_ms == 0 {
        return Err(anyhow!("tick-ms must be >= 1"));
    }

    let mut config = MonitorConfig::default();
    config.classifier.url = std::env::var("DRIVEMON_CLASSIFIER_URL")
        .unwrap_or_else(|_| "stub://offline".to_string());
    config.camera.tick = Duration::from_millis(args.tick_ms);
    config.alerts.sink = AlarmSinkKind::Silent;
    config.report_dir = args.out.into();

    let mut monitor = Monitor::from_config(&config)?;
    let (tx, rx) = mpsc::channel();
    tx.send(Command::Start)?;

    let seconds = args.seconds;
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_secs(seconds));
        let _ = tx.send(Command::ShowEvents);
        let _ = tx.send(Command::ExportReport);
        let _ = tx.send(Command::Exit);
    });

    monitor.run(rx, &mut PrintObserver);
    stopper
        .join()
        .map_err(|_| anyhow!("demo timer thread panicked"))?;

    let stats = monitor.capture().stats();
    println!(
        "ticks={} fallback={} skipped={} missed={}",
        stats.ticks, stats.fallbacks, stats.skipped_empty, stats.missed_deadlines
    );
    Ok(())
}
