use serde::{Deserialize, Serialize};

/// Mean heart rate below this is low stress.
pub const MODERATE_FROM_BPM: f64 = 60.0;
/// Mean heart rate at or above this is high stress.
pub const HIGH_FROM_BPM: f64 = 80.0;

/// Coarse stress classification derived from heart rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StressLevel {
    Low,
    Moderate,
    High,
}

impl StressLevel {
    pub fn from_bpm(bpm: f64) -> Self {
        if bpm < MODERATE_FROM_BPM {
            StressLevel::Low
        } else if bpm < HIGH_FROM_BPM {
            StressLevel::Moderate
        } else {
            StressLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StressLevel::Low => "Low",
            StressLevel::Moderate => "Moderate",
            StressLevel::High => "High",
        }
    }

    /// Long form used when narrating, e.g. `"High Stress"`.
    pub fn describe(&self) -> String {
        format!("{} Stress", self.as_str())
    }
}

impl std::fmt::Display for StressLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
