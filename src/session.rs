//! Per-session mutable state.
//!
//! Everything the pipeline remembers between ticks lives here: the alert
//! cooldown and visual flag, the incident log, and the audio latch. The
//! session is created once per monitor run and reset when capture stops.

use crate::alert::{AlertState, AudioGate};
use crate::event_log::EventLog;
use crate::identity::SessionIdentity;

#[derive(Debug)]
pub struct Session {
    pub identity: SessionIdentity,
    pub alert: AlertState,
    pub log: EventLog,
    pub audio: AudioGate,
}

impl Session {
    pub fn new(identity: SessionIdentity, retention: usize) -> Self {
        Self {
            identity,
            alert: AlertState::default(),
            log: EventLog::with_retention(retention),
            audio: AudioGate::default(),
        }
    }

    /// Record a user interaction. Returns true when this unlocked audio.
    pub fn note_interaction(&mut self) -> bool {
        let unlocked = self.audio.unlock();
        if unlocked {
            log::info!("audio alarms unlocked");
        }
        unlocked
    }

    /// Reset point for capture stop: clears the visual indicator. The log,
    /// cooldown clock and audio latch persist.
    pub fn on_capture_stopped(&mut self) {
        self.alert.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_clears_visual_flag_only() {
        let mut session = Session::new(SessionIdentity::guest(), 20);
        session.alert.visual_active = true;
        assert!(session.note_interaction());
        assert!(!session.note_interaction());

        session.on_capture_stopped();
        assert!(!session.alert.visual_active);
        assert!(session.audio.is_unlocked());
        assert_eq!(session.log.retention(), 20);
    }
}
