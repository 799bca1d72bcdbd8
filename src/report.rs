//! Plain-text incident report.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::path::PathBuf;

use crate::event_log::EventLog;
use crate::identity::{JsonFileStore, SessionIdentity};
use crate::session::Session;

const RULE: &str = "---------------------------------";

/// Report filename for an export at `epoch_millis`.
pub fn report_file_name(epoch_millis: i64) -> String {
    format!("DriverMonitor_Report_{}.txt", epoch_millis)
}

/// Render the report text.
///
/// Entries appear in log order (most recent first), exactly as retained.
pub fn render_report(
    identity: &SessionIdentity,
    log: &EventLog,
    generated_at: DateTime<Local>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Driver Monitor Report");
    let _ = writeln!(out);
    let _ = writeln!(out, "User Email: {}", identity.report_identity());
    let _ = writeln!(
        out,
        "Generated At: {}",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "Recorded Events:");
    let _ = writeln!(out, "{}", RULE);

    if log.is_empty() {
        let _ = writeln!(out, "No events recorded.");
        return out;
    }
    for entry in log.all() {
        let _ = writeln!(out, "ID: {}", entry.sequence_id);
        let _ = writeln!(out, "Event: {}", entry.event_name);
        let _ = writeln!(out, "Code: {}", entry.code);
        let _ = writeln!(out, "Type: {}", entry.entry_type.as_str());
        let _ = writeln!(out, "Time: {}", entry.time_of_day());
        let _ = writeln!(out, "Severity: {}", entry.severity);
        let _ = writeln!(out, "{}", RULE);
    }
    out
}

/// Writes reports into a directory chosen by the user.
///
/// When a session file is configured, the identity is read from it again on
/// every export so the report names whoever is signed in at that moment.
#[derive(Clone, Debug)]
pub struct ReportExporter {
    dir: PathBuf,
    session_path: Option<PathBuf>,
}

impl ReportExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            session_path: None,
        }
    }

    pub fn with_session_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_path = Some(path.into());
        self
    }

    /// Identity as of now. A missing session file means nobody is signed in;
    /// an unreadable one keeps the identity the session started with.
    pub fn current_identity(&self, session: &Session) -> SessionIdentity {
        let Some(path) = &self.session_path else {
            return session.identity.clone();
        };
        if !path.exists() {
            return SessionIdentity::default();
        }
        match JsonFileStore::open(path) {
            Ok(store) => SessionIdentity::from_store(&store),
            Err(err) => {
                log::warn!("keeping startup identity for report: {:#}", err);
                session.identity.clone()
            }
        }
    }

    /// Render the session's report and save it. Returns the written path.
    pub fn export(&self, session: &Session, now: DateTime<Local>) -> Result<PathBuf> {
        let identity = self.current_identity(session);
        let text = render_report(&identity, &session.log, now);
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create report directory {}", self.dir.display()))?;
        let path = self.dir.join(report_file_name(now.timestamp_millis()));
        std::fs::write(&path, text)
            .with_context(|| format!("write report {}", path.display()))?;
        log::info!(
            "report written to {} ({} events)",
            path.display(),
            session.log.len()
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_log::{Incident, Severity};
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 3, 9, h, m, s)
            .single()
            .expect("unambiguous local time")
    }

    #[test]
    fn empty_log_says_no_events() {
        let text = render_report(&SessionIdentity::guest(), &EventLog::new(), at(8, 0, 0));
        assert!(text.lines().any(|line| line == "No events recorded."));
        assert!(!text.contains("ID:"));
        assert!(text.contains("User Email: Guest (No email)"));
        assert!(text.contains("Generated At: 2024-03-09 08:00:00"));
    }

    #[test]
    fn entries_render_most_recent_first() {
        let mut log = EventLog::new();
        log.append(Incident::warning("Drowsiness", "DRV", Severity::High, at(8, 1, 2)));
        log.append(Incident::warning("Phone usage", "PHN", Severity::Medium, at(8, 1, 3)));

        let text = render_report(&SessionIdentity::user("ana"), &log, at(9, 0, 0));
        let expected_tail = format!(
            "Recorded Events:\n{rule}\nID: 2\nEvent: Phone usage\nCode: {c2}\nType: Warning\nTime: 08:01:03\nSeverity: Medium\n{rule}\nID: 1\nEvent: Drowsiness\nCode: {c1}\nType: Warning\nTime: 08:01:02\nSeverity: High\n{rule}\n",
            rule = RULE,
            c1 = log.all().nth(1).map(|e| e.code.clone()).unwrap_or_default(),
            c2 = log.all().next().map(|e| e.code.clone()).unwrap_or_default(),
        );
        assert!(text.starts_with("Driver Monitor Report\n\nUser Email: ana\n"));
        assert!(text.ends_with(&expected_tail), "{}", text);
    }

    #[test]
    fn export_reads_identity_at_export_time() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let session_file = dir.path().join("session.json");
        std::fs::write(&session_file, r#"{"isGuest": "false", "username": "ana"}"#)?;

        let exporter = ReportExporter::new(dir.path().join("reports"))
            .with_session_path(&session_file);
        let session = Session::new(SessionIdentity::user("ana"), 20);

        let first = std::fs::read_to_string(exporter.export(&session, at(9, 0, 0))?)?;
        assert!(first.contains("User Email: ana\n"));

        std::fs::write(&session_file, r#"{"isGuest": "true"}"#)?;
        let second = std::fs::read_to_string(exporter.export(&session, at(9, 0, 1))?)?;
        assert!(second.contains("User Email: Guest (No email)\n"));

        std::fs::remove_file(&session_file)?;
        let third = std::fs::read_to_string(exporter.export(&session, at(9, 0, 2))?)?;
        assert!(third.contains("User Email: Unknown User\n"));
        Ok(())
    }

    #[test]
    fn file_name_uses_epoch_millis() {
        assert_eq!(
            report_file_name(1_700_000_000_123),
            "DriverMonitor_Report_1700000000123.txt"
        );
    }
}
