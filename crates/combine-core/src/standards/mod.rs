// Standards registry: per-sport, per-group tier thresholds plus the age and
// body-profile factor tables, bundled with the position taxonomy.
//
// The built-in tables are embedded TOML; callers may swap in their own files
// of the same shape without touching code.

pub mod metric;
pub mod taxonomy;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

pub use metric::{Metric, MetricCategory};
pub use taxonomy::{PositionGroup, PositionTaxonomy, Sport, OTHER_GROUP};

const BUILTIN_STANDARDS: &str = include_str!("../../data/standards.toml");
const BUILTIN_POSITIONS: &str = include_str!("../../data/positions.toml");

/// Lowest and highest school grades covered by the age-factor tables.
pub const MIN_GRADE: u8 = 6;
pub const MAX_GRADE: u8 = 12;

/// Four cut points separating five tiers, best tier first.
pub type Thresholds = [f64; 4];

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StandardsError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse {what} table: {source}")]
    Parse {
        what: &'static str,
        source: toml::de::Error,
    },

    #[error("unknown sport `{0}`")]
    UnknownSport(String),

    #[error("unknown metric `{metric}` in {sport}/{group}")]
    UnknownMetric {
        sport: String,
        group: String,
        metric: String,
    },

    #[error("position `{position}` listed twice for {sport}")]
    DuplicatePosition { sport: String, position: String },

    #[error("thresholds for {sport}/{group}/{metric} are out of order: {values:?}")]
    UnorderedThresholds {
        sport: String,
        group: String,
        metric: Metric,
        values: Thresholds,
    },

    #[error("invalid factor table: {0}")]
    Factors(String),
}

// ---------------------------------------------------------------------------
// Factor tables
// ---------------------------------------------------------------------------

/// Grade multipliers indexed from grade 6 to grade 12.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeFactors {
    /// Steep slope, for strength and other normal metrics.
    pub strength: Vec<f64>,
    /// Gentle slope, for inverted (speed) metrics.
    pub speed: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTier {
    /// Exclusive upper bound in lb; `None` for the open top band.
    #[serde(default)]
    pub max_lb: Option<f64>,
    pub abs: f64,
    pub rel: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightTier {
    /// Exclusive upper bound in inches; `None` for the open top band.
    #[serde(default)]
    pub max_in: Option<f64>,
    pub jump: f64,
    pub accel: f64,
    pub top_speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyFactors {
    pub weight_tiers: Vec<WeightTier>,
    pub height_tiers: Vec<HeightTier>,
}

// ---------------------------------------------------------------------------
// Standards tables
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct StandardsFile {
    age_factors: AgeFactors,
    body: BodyFactors,
    sports: BTreeMap<String, BTreeMap<String, BTreeMap<String, Thresholds>>>,
}

/// Parsed, validated standards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standards {
    pub age_factors: AgeFactors,
    pub body: BodyFactors,
    pub tables: BTreeMap<Sport, BTreeMap<String, BTreeMap<Metric, Thresholds>>>,
}

impl Standards {
    pub fn from_toml(text: &str) -> Result<Self, StandardsError> {
        let raw: StandardsFile = toml::from_str(text).map_err(|e| StandardsError::Parse {
            what: "standards",
            source: e,
        })?;

        validate_age_factors(&raw.age_factors)?;
        validate_body_factors(&raw.body)?;

        let mut tables = BTreeMap::new();
        for (sport_name, groups) in raw.sports {
            let sport = Sport::parse(&sport_name)
                .ok_or_else(|| StandardsError::UnknownSport(sport_name.clone()))?;
            let mut typed_groups = BTreeMap::new();
            for (group, metrics) in groups {
                let mut typed = BTreeMap::new();
                for (key, values) in metrics {
                    let metric =
                        Metric::from_key(&key).ok_or_else(|| StandardsError::UnknownMetric {
                            sport: sport_name.clone(),
                            group: group.clone(),
                            metric: key.clone(),
                        })?;
                    if !thresholds_ordered(&values, metric.invert()) {
                        return Err(StandardsError::UnorderedThresholds {
                            sport: sport_name.clone(),
                            group: group.clone(),
                            metric,
                            values,
                        });
                    }
                    typed.insert(metric, values);
                }
                typed_groups.insert(group, typed);
            }
            tables.insert(sport, typed_groups);
        }

        Ok(Standards {
            age_factors: raw.age_factors,
            body: raw.body,
            tables,
        })
    }

    /// Base thresholds for a metric, or `None` when the sport, group or
    /// metric has no entry.
    pub fn thresholds(&self, sport: Sport, group: &str, metric: Metric) -> Option<&Thresholds> {
        self.tables.get(&sport)?.get(group)?.get(&metric)
    }

    /// Age multiplier for a grade; grades outside 6-12 are clamped. Inverted
    /// metrics use the gentler speed slope.
    pub fn age_factor(&self, grade: u8, invert: bool) -> Option<f64> {
        let idx = (grade.clamp(MIN_GRADE, MAX_GRADE) - MIN_GRADE) as usize;
        let table = if invert {
            &self.age_factors.speed
        } else {
            &self.age_factors.strength
        };
        table.get(idx).copied()
    }

    /// Index of the weight band containing `weight_lb`.
    pub fn weight_tier(&self, weight_lb: f64) -> Option<usize> {
        self.body
            .weight_tiers
            .iter()
            .position(|t| t.max_lb.map_or(true, |max| weight_lb < max))
    }

    /// Index of the height band containing `height_in`.
    pub fn height_tier(&self, height_in: f64) -> Option<usize> {
        self.body
            .height_tiers
            .iter()
            .position(|t| t.max_in.map_or(true, |max| height_in < max))
    }

    /// Body-profile multiplier for a metric, or `None` when the metric has no
    /// category or the body measurement it depends on is missing.
    pub fn body_factor(
        &self,
        metric: Metric,
        weight_lb: Option<f64>,
        height_in: Option<f64>,
    ) -> Option<f64> {
        match metric.category()? {
            MetricCategory::Abs => {
                let tier = self.weight_tier(weight_lb?)?;
                Some(self.body.weight_tiers[tier].abs)
            }
            MetricCategory::Rel => {
                let tier = self.weight_tier(weight_lb?)?;
                Some(self.body.weight_tiers[tier].rel)
            }
            MetricCategory::Jump => {
                let tier = self.height_tier(height_in?)?;
                Some(self.body.height_tiers[tier].jump)
            }
            MetricCategory::Accel => {
                let tier = self.height_tier(height_in?)?;
                Some(self.body.height_tiers[tier].accel)
            }
            MetricCategory::TopSpeed => {
                let tier = self.height_tier(height_in?)?;
                Some(self.body.height_tiers[tier].top_speed)
            }
        }
    }
}

fn thresholds_ordered(values: &Thresholds, invert: bool) -> bool {
    values.iter().all(|v| v.is_finite())
        && values.windows(2).all(|w| {
            if invert {
                w[0] <= w[1]
            } else {
                w[0] >= w[1]
            }
        })
}

fn validate_age_factors(f: &AgeFactors) -> Result<(), StandardsError> {
    let expected = (MAX_GRADE - MIN_GRADE + 1) as usize;
    for (name, table) in [("strength", &f.strength), ("speed", &f.speed)] {
        if table.len() != expected {
            return Err(StandardsError::Factors(format!(
                "age_factors.{name} needs {expected} entries (grades {MIN_GRADE}-{MAX_GRADE}), got {}",
                table.len()
            )));
        }
        if table.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(StandardsError::Factors(format!(
                "age_factors.{name} entries must be > 0"
            )));
        }
    }
    Ok(())
}

fn validate_body_factors(f: &BodyFactors) -> Result<(), StandardsError> {
    fn check_bounds(name: &str, bounds: &[Option<f64>]) -> Result<(), StandardsError> {
        let Some((last, rest)) = bounds.split_last() else {
            return Err(StandardsError::Factors(format!("body.{name} is empty")));
        };
        if last.is_some() || rest.iter().any(Option::is_none) {
            return Err(StandardsError::Factors(format!(
                "body.{name}: only the last band may omit its upper bound, and it must"
            )));
        }
        let maxima: Vec<f64> = rest.iter().flatten().copied().collect();
        if maxima.windows(2).any(|w| w[0] >= w[1]) {
            return Err(StandardsError::Factors(format!(
                "body.{name} bounds must ascend"
            )));
        }
        Ok(())
    }

    let weight_bounds: Vec<Option<f64>> = f.weight_tiers.iter().map(|t| t.max_lb).collect();
    check_bounds("weight_tiers", &weight_bounds)?;
    let height_bounds: Vec<Option<f64>> = f.height_tiers.iter().map(|t| t.max_in).collect();
    check_bounds("height_tiers", &height_bounds)?;

    let factors = f
        .weight_tiers
        .iter()
        .flat_map(|t| [t.abs, t.rel])
        .chain(f.height_tiers.iter().flat_map(|t| [t.jump, t.accel, t.top_speed]));
    for v in factors {
        if !v.is_finite() || v <= 0.0 {
            return Err(StandardsError::Factors(format!(
                "body factors must be > 0, got {v}"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Read-only reference data for a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    pub standards: Standards,
    pub positions: PositionTaxonomy,
}

impl Registry {
    /// The embedded default tables.
    pub fn builtin() -> Result<Self, StandardsError> {
        Self::from_toml(BUILTIN_STANDARDS, BUILTIN_POSITIONS)
    }

    pub fn from_toml(standards: &str, positions: &str) -> Result<Self, StandardsError> {
        Ok(Registry {
            standards: Standards::from_toml(standards)?,
            positions: PositionTaxonomy::from_toml(positions)?,
        })
    }

    /// Built-in tables with either half optionally replaced from a file.
    pub fn load(
        standards_path: Option<&Path>,
        positions_path: Option<&Path>,
    ) -> Result<Self, StandardsError> {
        let standards = match standards_path {
            Some(path) => read_file(path)?,
            None => BUILTIN_STANDARDS.to_string(),
        };
        let positions = match positions_path {
            Some(path) => read_file(path)?,
            None => BUILTIN_POSITIONS.to_string(),
        };
        Self::from_toml(&standards, &positions)
    }

    pub fn position_group(&self, sport: Option<Sport>, position: Option<&str>) -> &str {
        self.positions.group_for(sport, position)
    }

    pub fn thresholds(
        &self,
        sport: Option<Sport>,
        group: &str,
        metric: Metric,
    ) -> Option<&Thresholds> {
        self.standards.thresholds(sport?, group, metric)
    }
}

fn read_file(path: &Path) -> Result<String, StandardsError> {
    std::fs::read_to_string(path).map_err(|e| StandardsError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
