//! Terminal status display.
//!
//! `Ui` picks between a live indicatif board and plain line output.
//! `StatusBoard` renders monitor state: live indicator, user name, alert
//! indicator, one bar per channel, and the incident list.

use clap::ValueEnum;
use indicatif::{HumanDuration, MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

use crate::capture::{CaptureState, TickReport};
use crate::error::DeviceAccessError;
use crate::event_log::LogEntry;
use crate::monitor::MonitorObserver;
use crate::score::{Channel, ChannelScores};
use crate::session::Session;

/// How the status display is drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum UiMode {
    /// Live bars when stderr is a terminal and stdout is not redirected.
    #[default]
    Auto,
    /// One line per change on stdout.
    Plain,
    /// Live bars whenever stderr is a terminal.
    Pretty,
}

/// Resolved display choice for one process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ui {
    live: bool,
}

impl Ui {
    /// Resolve `mode` against the current terminal.
    pub fn detect(mode: UiMode) -> Self {
        Self::resolve(
            mode,
            std::io::stderr().is_terminal(),
            std::io::stdout().is_terminal(),
        )
    }

    pub fn resolve(mode: UiMode, stderr_tty: bool, stdout_tty: bool) -> Self {
        let live = stderr_tty
            && match mode {
                UiMode::Pretty => true,
                UiMode::Auto => stdout_tty,
                UiMode::Plain => false,
            };
        Self { live }
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Announce a startup step; it reports its duration when dropped.
    pub fn startup(&self, what: &str) -> StartupStep {
        let bar = if self.live {
            let bar = ProgressBar::new_spinner();
            bar.set_draw_target(ProgressDrawTarget::stderr());
            bar.set_style(
                ProgressStyle::with_template("{spinner} {msg} {elapsed}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        } else {
            eprintln!("drivemon: {what}");
            ProgressBar::hidden()
        };
        bar.set_message(what.to_string());
        StartupStep {
            what: what.to_string(),
            bar,
        }
    }
}

/// Startup step in progress. A hidden bar still keeps time in plain mode.
pub struct StartupStep {
    what: String,
    bar: ProgressBar,
}

impl Drop for StartupStep {
    fn drop(&mut self) {
        let done = format!("{} ready in {}", self.what, HumanDuration(self.bar.elapsed()));
        if self.bar.is_hidden() {
            eprintln!("drivemon: {done}");
        } else {
            self.bar.finish_with_message(done);
        }
    }
}

/// Header line: live indicator, user, alert indicator.
pub fn header_line(streaming: bool, user: &str, visual_active: bool) -> String {
    let live = if streaming { "● LIVE" } else { "○ IDLE" };
    let alert = if visual_active { "  ⚠ ALERT" } else { "" };
    format!("{live}  user: {user}{alert}")
}

/// One-line summary of a tick for plain output.
pub fn scores_line(scores: &ChannelScores, visual_active: bool) -> String {
    let mut parts: Vec<String> = scores
        .iter()
        .map(|(channel, score)| format!("{}={} {}", channel, score.value, score.label))
        .collect();
    if visual_active {
        parts.push("ALERT".to_string());
    }
    parts.join(" | ")
}

/// Incident row as listed in the events view.
pub fn event_row(entry: &LogEntry) -> String {
    format!(
        "#{:<3} {}  {:<12} {:<8} {:<7} {}",
        entry.sequence_id,
        entry.time_of_day(),
        entry.event_name,
        entry.code,
        entry.entry_type.as_str(),
        entry.severity
    )
}

struct LiveBars {
    multi: MultiProgress,
    header: ProgressBar,
    channels: Vec<(Channel, ProgressBar)>,
}

impl LiveBars {
    fn new() -> Self {
        let multi = MultiProgress::with_draw_target(ProgressDrawTarget::stderr());
        let header = multi.add(ProgressBar::new_spinner());
        header.set_style(
            ProgressStyle::with_template("{msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        let bar_style = ProgressStyle::with_template("{prefix:>11} [{bar:30}] {pos:>3} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        let channels = Channel::ALL
            .iter()
            .map(|&channel| {
                let bar = multi.add(ProgressBar::new(100));
                bar.set_style(bar_style.clone());
                bar.set_prefix(channel.as_str());
                bar.set_message("—");
                (channel, bar)
            })
            .collect();
        Self {
            multi,
            header,
            channels,
        }
    }

    fn println(&self, line: &str) {
        if self.multi.println(line).is_err() {
            eprintln!("{line}");
        }
    }

    fn clear(&self) {
        for (_, bar) in &self.channels {
            bar.finish_and_clear();
        }
        self.header.finish_and_clear();
    }
}

/// Monitor observer that draws to the terminal.
pub struct StatusBoard {
    live: Option<LiveBars>,
    last_line: Option<String>,
}

impl StatusBoard {
    pub fn new(ui: &Ui) -> Self {
        Self {
            live: ui.is_live().then(LiveBars::new),
            last_line: None,
        }
    }

    fn say(&self, line: &str) {
        match &self.live {
            Some(live) => live.println(line),
            None => println!("{line}"),
        }
    }

    fn set_header(&self, streaming: bool, session: &Session) {
        let line = header_line(
            streaming,
            session.identity.display_name(),
            session.alert.visual_active,
        );
        match &self.live {
            Some(live) => live.header.set_message(line),
            None => println!("{line}"),
        }
    }
}

impl MonitorObserver for StatusBoard {
    fn on_state(&mut self, state: CaptureState, session: &Session) {
        let streaming = state == CaptureState::Streaming;
        if !streaming {
            if let Some(live) = &self.live {
                for (_, bar) in &live.channels {
                    bar.set_position(0);
                    bar.set_message("—");
                }
            }
            self.last_line = None;
        }
        self.set_header(streaming, session);
    }

    fn on_tick(&mut self, report: &TickReport, session: &Session) {
        match &self.live {
            Some(live) => {
                for (channel, bar) in &live.channels {
                    let score = report.scores.get(*channel);
                    bar.set_position(u64::from(score.value));
                    bar.set_message(score.label.as_str());
                }
                live.header.set_message(header_line(
                    true,
                    session.identity.display_name(),
                    report.visual_active,
                ));
            }
            None => {
                let line = scores_line(&report.scores, report.visual_active);
                if self.last_line.as_deref() != Some(line.as_str()) {
                    println!("{line}");
                    self.last_line = Some(line);
                }
            }
        }
        for entry in &report.entries {
            self.say(&format!("⚠ {}", event_row(entry)));
        }
    }

    fn on_device_error(&mut self, err: &DeviceAccessError) {
        self.say(&format!("Camera access failed: {err}"));
    }

    fn on_report(&mut self, path: &Path) {
        self.say(&format!("Report saved to {}", path.display()));
    }

    fn on_report_error(&mut self, err: &anyhow::Error) {
        self.say(&format!("Report export failed: {err:#}"));
    }

    fn on_events(&mut self, entries: &[LogEntry]) {
        if entries.is_empty() {
            self.say("No events recorded.");
            return;
        }
        for entry in entries {
            self.say(&event_row(entry));
        }
    }
}

impl Drop for StatusBoard {
    fn drop(&mut self) {
        if let Some(live) = &self.live {
            live.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_log::{EventLog, Incident, Severity};
    use chrono::{Local, TimeZone};

    #[test]
    fn live_display_requires_terminal() {
        assert!(!Ui::resolve(UiMode::Pretty, false, true).is_live());
        assert!(Ui::resolve(UiMode::Pretty, true, false).is_live());
        assert!(!Ui::resolve(UiMode::Plain, true, true).is_live());
        assert!(Ui::resolve(UiMode::Auto, true, true).is_live());
        assert!(!Ui::resolve(UiMode::Auto, true, false).is_live());
    }

    #[test]
    fn modes_parse_from_cli_names() {
        assert_eq!(UiMode::from_str("plain", true), Ok(UiMode::Plain));
        assert_eq!(UiMode::from_str("PRETTY", true), Ok(UiMode::Pretty));
        assert!(UiMode::from_str("fancy", true).is_err());
    }

    #[test]
    fn header_shows_user_and_alert() {
        assert_eq!(header_line(true, "Guest", true), "● LIVE  user: Guest  ⚠ ALERT");
        assert_eq!(header_line(false, "ana", false), "○ IDLE  user: ana");
    }

    #[test]
    fn scores_line_lists_channels_in_order() {
        let scores = ChannelScores::from_values(85, 4, 0, 30);
        assert_eq!(
            scores_line(&scores, true),
            "drowsiness=85 High | phone=4 No | drinking=0 — | smoking=30 Low | ALERT"
        );
    }

    #[test]
    fn event_row_includes_code_and_severity() {
        let at = Local
            .with_ymd_and_hms(2024, 3, 9, 8, 1, 2)
            .single()
            .expect("unambiguous local time");
        let mut log = EventLog::new();
        let entry = log
            .append(Incident::warning("Smoking", "SMK", Severity::Medium, at))
            .clone();
        let row = event_row(&entry);
        assert!(row.starts_with("#1"));
        assert!(row.contains("08:01:02"));
        assert!(row.contains(&entry.code));
        assert!(row.ends_with("Medium"));
    }
}
