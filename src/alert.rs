//! Threshold-driven alerting.
//!
//! Each tick the engine looks at the four channel scores and drives three
//! independent outputs:
//! - a visual indicator, active while any channel is above 25
//! - an audible alarm, gated by the audio latch and a shared cooldown
//! - incidents for the event log, one per qualifying channel per tick
//!
//! Drinking has alarm and visual thresholds but never produces an incident.

use chrono::{DateTime, Local};
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::event_log::{Incident, Severity};
use crate::score::{Channel, ChannelScores};

/// Minimum time between two alarms, across all channels.
pub const ALERT_COOLDOWN: Duration = Duration::from_millis(5000);

/// Score thresholds for the visual indicator and the alarm.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlertThresholds {
    /// Visual indicator is active when any score is strictly above this.
    pub visual: u8,
    pub drowsiness_alarm: u8,
    pub phone_alarm: u8,
    pub drinking_alarm: u8,
    pub smoking_alarm: u8,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            visual: 25,
            drowsiness_alarm: 70,
            phone_alarm: 60,
            drinking_alarm: 60,
            smoking_alarm: 60,
        }
    }
}

impl AlertThresholds {
    fn alarm_threshold(&self, channel: Channel) -> u8 {
        match channel {
            Channel::Drowsiness => self.drowsiness_alarm,
            Channel::Phone => self.phone_alarm,
            Channel::Drinking => self.drinking_alarm,
            Channel::Smoking => self.smoking_alarm,
        }
    }
}

struct IncidentRule {
    channel: Channel,
    threshold: u8,
    event_name: &'static str,
    code_prefix: &'static str,
    severity: Severity,
}

const INCIDENT_RULES: [IncidentRule; 3] = [
    IncidentRule {
        channel: Channel::Drowsiness,
        threshold: 70,
        event_name: "Drowsiness",
        code_prefix: "DRV",
        severity: Severity::High,
    },
    IncidentRule {
        channel: Channel::Phone,
        threshold: 60,
        event_name: "Phone usage",
        code_prefix: "PHN",
        severity: Severity::Medium,
    },
    IncidentRule {
        channel: Channel::Smoking,
        threshold: 60,
        event_name: "Smoking",
        code_prefix: "SMK",
        severity: Severity::Medium,
    },
];

/// Session-wide alert state. Only the alert engine mutates it.
#[derive(Clone, Debug, Default)]
pub struct AlertState {
    pub last_alarm_at: Option<Instant>,
    pub visual_active: bool,
}

impl AlertState {
    /// Clear the visual indicator. The cooldown clock survives.
    pub fn reset(&mut self) {
        self.visual_active = false;
    }
}

/// One-way latch set by the first user interaction.
#[derive(Clone, Debug, Default)]
pub struct AudioGate {
    unlocked: bool,
}

impl AudioGate {
    /// Returns true the first time only.
    pub fn unlock(&mut self) -> bool {
        let first = !self.unlocked;
        self.unlocked = true;
        first
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }
}

/// Alarm tone: three pulses around 900 Hz.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TonePattern {
    pub frequency_hz: u32,
    pub pulse: Duration,
    pub offsets: Vec<Duration>,
}

impl Default for TonePattern {
    fn default() -> Self {
        Self {
            frequency_hz: 900,
            pulse: Duration::from_millis(400),
            offsets: vec![
                Duration::ZERO,
                Duration::from_millis(500),
                Duration::from_millis(1000),
            ],
        }
    }
}

/// Where alarms are played.
pub trait AlarmSink: Send {
    /// Start playing `pattern`. Must not block the caller for the length of
    /// the pattern.
    fn play(&mut self, pattern: &TonePattern);
}

/// Rings the terminal bell once per pulse on a background thread.
#[derive(Default)]
pub struct BellSink;

impl AlarmSink for BellSink {
    fn play(&mut self, pattern: &TonePattern) {
        let offsets = pattern.offsets.clone();
        std::thread::spawn(move || {
            let start = Instant::now();
            for offset in offsets {
                if let Some(wait) = offset.checked_sub(start.elapsed()) {
                    std::thread::sleep(wait);
                }
                let mut stderr = std::io::stderr();
                let _ = stderr.write_all(b"\x07");
                let _ = stderr.flush();
            }
        });
    }
}

/// Logs alarms without making a sound.
#[derive(Default)]
pub struct SilentSink;

impl AlarmSink for SilentSink {
    fn play(&mut self, pattern: &TonePattern) {
        log::debug!(
            "alarm suppressed by silent sink ({} pulses @ {} Hz)",
            pattern.offsets.len(),
            pattern.frequency_hz
        );
    }
}

/// Counts alarms; the counter handle can be cloned out before the sink is
/// moved into an engine.
#[derive(Clone, Default)]
pub struct CountingSink {
    plays: Arc<AtomicU64>,
}

impl CountingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plays(&self) -> u64 {
        self.plays.load(Ordering::SeqCst)
    }
}

impl AlarmSink for CountingSink {
    fn play(&mut self, _pattern: &TonePattern) {
        self.plays.fetch_add(1, Ordering::SeqCst);
    }
}

/// Result of evaluating one tick's scores.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlertOutcome {
    pub visual_active: bool,
    pub alarm_fired: bool,
    pub incidents: Vec<Incident>,
}

pub struct AlertEngine {
    thresholds: AlertThresholds,
    cooldown: Duration,
    pattern: TonePattern,
    sink: Box<dyn AlarmSink>,
}

impl AlertEngine {
    pub fn new(sink: Box<dyn AlarmSink>) -> Self {
        Self {
            thresholds: AlertThresholds::default(),
            cooldown: ALERT_COOLDOWN,
            pattern: TonePattern::default(),
            sink,
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Evaluate one tick.
    ///
    /// `now` drives the alarm cooldown; `wall` stamps incidents.
    pub fn evaluate(
        &mut self,
        scores: &ChannelScores,
        state: &mut AlertState,
        audio: &AudioGate,
        now: Instant,
        wall: DateTime<Local>,
    ) -> AlertOutcome {
        state.visual_active = scores
            .iter()
            .any(|(_, score)| score.value > self.thresholds.visual);

        let alarm_fired = self.alarm_due(scores, state, audio, now);
        if alarm_fired {
            // Cooldown starts before the pulses play.
            state.last_alarm_at = Some(now);
            log::warn!("alarm: {}", describe_alarm(scores, &self.thresholds));
            self.sink.play(&self.pattern);
        }

        let incidents = INCIDENT_RULES
            .iter()
            .filter(|rule| scores.get(rule.channel).value >= rule.threshold)
            .map(|rule| Incident::warning(rule.event_name, rule.code_prefix, rule.severity, wall))
            .collect();

        AlertOutcome {
            visual_active: state.visual_active,
            alarm_fired,
            incidents,
        }
    }

    fn alarm_due(
        &self,
        scores: &ChannelScores,
        state: &AlertState,
        audio: &AudioGate,
        now: Instant,
    ) -> bool {
        let triggered = scores
            .iter()
            .any(|(channel, score)| score.value >= self.thresholds.alarm_threshold(channel));
        if !triggered || !audio.is_unlocked() {
            return false;
        }
        match state.last_alarm_at {
            Some(last) => now.saturating_duration_since(last) >= self.cooldown,
            None => true,
        }
    }
}

fn describe_alarm(scores: &ChannelScores, thresholds: &AlertThresholds) -> String {
    scores
        .iter()
        .filter(|(channel, score)| score.value >= thresholds.alarm_threshold(*channel))
        .map(|(channel, score)| format!("{}={}", channel, score.value))
        .collect::<Vec<_>>()
        .join(" ")
}
