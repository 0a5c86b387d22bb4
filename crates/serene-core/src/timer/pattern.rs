use serde::{Deserialize, Serialize};

/// One step of a breathing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Inhale,
    Hold,
    Exhale,
}

impl Phase {
    /// Next phase in the cycle. Exhale wraps back to Inhale.
    pub fn next(self) -> Self {
        match self {
            Phase::Inhale => Phase::Hold,
            Phase::Hold => Phase::Exhale,
            Phase::Exhale => Phase::Inhale,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Inhale => "Breathe in",
            Phase::Hold => "Hold",
            Phase::Exhale => "Breathe out",
        }
    }
}

/// A named triple of phase durations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreathingPattern {
    pub key: &'static str,
    pub display_name: &'static str,
    pub inhale_secs: u64,
    pub hold_secs: u64,
    pub exhale_secs: u64,
}

/// The canonical pattern set. Closed: sessions can only use these.
pub static PATTERNS: [BreathingPattern; 3] = [
    BreathingPattern {
        key: "4-7-8",
        display_name: "Relaxing Breath",
        inhale_secs: 4,
        hold_secs: 7,
        exhale_secs: 8,
    },
    BreathingPattern {
        key: "box",
        display_name: "Box Breathing",
        inhale_secs: 4,
        hold_secs: 4,
        exhale_secs: 4,
    },
    BreathingPattern {
        key: "calm",
        display_name: "Calm Breathing",
        inhale_secs: 4,
        hold_secs: 2,
        exhale_secs: 6,
    },
];

/// Session lengths offered by the shell (seconds).
pub const SESSION_DURATIONS: [u64; 3] = [180, 300, 600];

impl BreathingPattern {
    pub fn all() -> &'static [BreathingPattern] {
        &PATTERNS
    }

    pub fn find(key: &str) -> Option<&'static BreathingPattern> {
        PATTERNS.iter().find(|p| p.key == key)
    }

    pub fn duration_of(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Inhale => self.inhale_secs,
            Phase::Hold => self.hold_secs,
            Phase::Exhale => self.exhale_secs,
        }
    }

    /// Length of one full Inhale/Hold/Exhale cycle in seconds.
    pub fn cycle_secs(&self) -> u64 {
        self.inhale_secs + self.hold_secs + self.exhale_secs
    }

    pub fn longest_phase_secs(&self) -> u64 {
        self.inhale_secs.max(self.hold_secs).max(self.exhale_secs)
    }
}
