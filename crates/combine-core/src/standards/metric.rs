// Catalogue of the graded/ranked metrics and their static properties.

use serde::{Deserialize, Serialize};

/// A metric the engine ranks, standardizes, or grades.
///
/// Serialized with the camelCase keys used throughout the derived dataset
/// (`relBench`, `vMax`, `sprint020`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Bench,
    Squat,
    RelBench,
    RelSquat,
    Medball,
    MbRel,
    Vert,
    Broad,
    Forty,
    Sprint020,
    VMax,
    V10Max,
    PeakPower,
    RelPeakPower,
    MomMax,
}

/// Which body-profile factor adjusts a metric's standards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricCategory {
    /// Absolute strength/output; scaled by weight band.
    Abs,
    /// Bodyweight-relative; scaled inversely by weight band.
    Rel,
    /// Jumps; scaled by height band.
    Jump,
    /// Short-distance acceleration; scaled by height band.
    Accel,
    /// Top-end speed; scaled by height band.
    TopSpeed,
}

impl Metric {
    pub const ALL: [Metric; 15] = [
        Metric::Bench,
        Metric::Squat,
        Metric::RelBench,
        Metric::RelSquat,
        Metric::Medball,
        Metric::MbRel,
        Metric::Vert,
        Metric::Broad,
        Metric::Forty,
        Metric::Sprint020,
        Metric::VMax,
        Metric::V10Max,
        Metric::PeakPower,
        Metric::RelPeakPower,
        Metric::MomMax,
    ];

    /// Key used in reference tables and serialized maps.
    pub fn key(&self) -> &'static str {
        match self {
            Metric::Bench => "bench",
            Metric::Squat => "squat",
            Metric::RelBench => "relBench",
            Metric::RelSquat => "relSquat",
            Metric::Medball => "medball",
            Metric::MbRel => "mbRel",
            Metric::Vert => "vert",
            Metric::Broad => "broad",
            Metric::Forty => "forty",
            Metric::Sprint020 => "sprint020",
            Metric::VMax => "vMax",
            Metric::V10Max => "v10Max",
            Metric::PeakPower => "peakPower",
            Metric::RelPeakPower => "relPeakPower",
            Metric::MomMax => "momMax",
        }
    }

    pub fn from_key(key: &str) -> Option<Metric> {
        Metric::ALL.into_iter().find(|m| m.key() == key)
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Bench => "Bench Press",
            Metric::Squat => "Back Squat",
            Metric::RelBench => "Relative Bench",
            Metric::RelSquat => "Relative Squat",
            Metric::Medball => "Medicine Ball Throw",
            Metric::MbRel => "Relative Medball",
            Metric::Vert => "Vertical Jump",
            Metric::Broad => "Broad Jump",
            Metric::Forty => "40-Yard Dash",
            Metric::Sprint020 => "0-20 Yard Split",
            Metric::VMax => "Max Velocity",
            Metric::V10Max => "Best 10-Yard Velocity",
            Metric::PeakPower => "Peak Power",
            Metric::RelPeakPower => "Relative Peak Power",
            Metric::MomMax => "Max Momentum",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Bench | Metric::Squat => "lb",
            Metric::RelBench | Metric::RelSquat => "xBW",
            Metric::Medball | Metric::Vert | Metric::Broad => "in",
            Metric::MbRel => "in/lb",
            Metric::Forty | Metric::Sprint020 => "s",
            Metric::VMax | Metric::V10Max => "m/s",
            Metric::PeakPower => "W",
            Metric::RelPeakPower => "W/kg",
            Metric::MomMax => "kg*m/s",
        }
    }

    /// True when a smaller value is better (sprint times).
    pub fn invert(&self) -> bool {
        matches!(self, Metric::Forty | Metric::Sprint020)
    }

    pub fn category(&self) -> Option<MetricCategory> {
        match self {
            Metric::Bench | Metric::Squat | Metric::Medball | Metric::PeakPower | Metric::MomMax => {
                Some(MetricCategory::Abs)
            }
            Metric::RelBench | Metric::RelSquat | Metric::MbRel | Metric::RelPeakPower => {
                Some(MetricCategory::Rel)
            }
            Metric::Vert | Metric::Broad => Some(MetricCategory::Jump),
            Metric::Forty | Metric::Sprint020 => Some(MetricCategory::Accel),
            Metric::VMax | Metric::V10Max => Some(MetricCategory::TopSpeed),
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
