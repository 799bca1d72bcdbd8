//! Incident log.
//!
//! Entries are appended by the alert engine and never mutated. Only the most
//! recent `retention` entries are kept for display and export; the sequence
//! counter keeps counting across evictions so ids are never reused.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;

/// Default number of entries kept visible and exported.
pub const DEFAULT_RETENTION: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Severity {
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Medium => "Medium",
            Severity::High => "High",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Incident kind. Every incident is currently a warning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum EntryType {
    Warning,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Warning => "Warning",
        }
    }
}

/// Incident produced by the alert engine, before the log numbers it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Incident {
    pub event_name: &'static str,
    pub code: String,
    pub entry_type: EntryType,
    pub timestamp: DateTime<Local>,
    pub severity: Severity,
}

impl Incident {
    /// Build an incident whose code is `prefix` plus the last four digits of
    /// the epoch-millisecond clock at `timestamp`.
    pub fn warning(
        event_name: &'static str,
        prefix: &str,
        severity: Severity,
        timestamp: DateTime<Local>,
    ) -> Self {
        Self {
            event_name,
            code: incident_code(prefix, timestamp.timestamp_millis()),
            entry_type: EntryType::Warning,
            timestamp,
            severity,
        }
    }
}

/// Channel prefix followed by the last four digits of `epoch_millis`.
///
/// Codes are time-derived and not unique.
pub fn incident_code(prefix: &str, epoch_millis: i64) -> String {
    format!("{}{:04}", prefix, epoch_millis.rem_euclid(10_000))
}

/// A numbered incident.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub sequence_id: u64,
    pub event_name: String,
    pub code: String,
    pub entry_type: EntryType,
    pub timestamp: DateTime<Local>,
    pub severity: Severity,
}

impl LogEntry {
    /// Wall-clock time of day, `HH:MM:SS`.
    pub fn time_of_day(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

/// Append-only incident log with a retention cap.
#[derive(Debug)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
    retention: usize,
    appended: u64,
}

impl EventLog {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }

    /// Log keeping at most `retention` entries (at least one).
    pub fn with_retention(retention: usize) -> Self {
        let retention = retention.max(1);
        Self {
            entries: VecDeque::with_capacity(retention),
            retention,
            appended: 0,
        }
    }

    /// Number and store an incident. Evicts the oldest retained entry when
    /// the cap is exceeded.
    pub fn append(&mut self, incident: Incident) -> &LogEntry {
        self.appended += 1;
        let entry = LogEntry {
            sequence_id: self.appended,
            event_name: incident.event_name.to_string(),
            code: incident.code,
            entry_type: incident.entry_type,
            timestamp: incident.timestamp,
            severity: incident.severity,
        };
        while self.entries.len() >= self.retention {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        &self.entries[self.entries.len() - 1]
    }

    /// Retained entries, most recent first.
    pub fn all(&self) -> impl Iterator<Item = &LogEntry> + '_ {
        self.entries.iter().rev()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total entries ever appended, including evicted ones.
    pub fn total_appended(&self) -> u64 {
        self.appended
    }

    pub fn retention(&self) -> usize {
        self.retention
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn incident(name: &'static str) -> Incident {
        Incident::warning(name, "DRV", Severity::High, Local::now())
    }

    #[test]
    fn sequence_ids_start_at_one_and_increase() {
        let mut log = EventLog::new();
        assert_eq!(log.append(incident("a")).sequence_id, 1);
        assert_eq!(log.append(incident("b")).sequence_id, 2);
        let names: Vec<_> = log.all().map(|e| e.event_name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn retention_cap_evicts_oldest_without_reusing_ids() {
        let mut log = EventLog::new();
        for _ in 0..45 {
            log.append(incident("x"));
        }
        assert_eq!(log.len(), DEFAULT_RETENTION);
        assert_eq!(log.total_appended(), 45);
        let ids: Vec<u64> = log.all().map(|e| e.sequence_id).collect();
        assert_eq!(ids.first(), Some(&45));
        assert_eq!(ids.last(), Some(&26));
        assert!(ids.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn codes_use_last_four_millis_digits() {
        assert_eq!(incident_code("DRV", 1_700_000_012_345), "DRV2345");
        assert_eq!(incident_code("PHN", 1_700_000_000_042), "PHN0042");
    }

    #[test]
    fn incidents_are_warnings() {
        let entry = EventLog::new().append(incident("Smoking")).clone();
        assert_eq!(entry.entry_type.as_str(), "Warning");
        assert_eq!(entry.time_of_day().len(), 8);
    }
}
