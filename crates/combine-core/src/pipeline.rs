// Top-level orchestration: raw dataset in, annotated dataset out.
//
// Stages run in a fixed order over immutable inputs: build per-athlete
// records, summarize groups, score against the roster, then audit. Every run
// recomputes from scratch; nothing is written back into the raw dataset.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

use crate::analytics::{analyze, group_standards, Analysis, DerivedAthlete, GroupStandard, MetricStats};
use crate::athlete::{build_record, AthleteRecord, RawAthlete};
use crate::audit::{audit, AuditReport, DataFlag, DataWarning};
use crate::config::{constant_errors, AuditLimits, Constants, EngineConfig, ProcessOptions};
use crate::history::TestSession;
use crate::standards::{Metric, PositionTaxonomy, Registry, Sport, Standards, StandardsError};

/// A roster document as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDataset {
    /// Sport applied to athletes that do not name their own.
    #[serde(default)]
    pub sport: Option<String>,
    /// Per-document constant overrides; missing keys take their defaults.
    #[serde(default)]
    pub constants: Option<Constants>,
    pub athletes: Vec<RawAthlete>,
    #[serde(default)]
    pub sessions: Vec<TestSession>,
}

/// Everything the engine produces for one dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedDataset {
    pub athletes: Vec<DerivedAthlete>,
    /// Constants the run actually used.
    pub constants: Constants,
    pub options: ProcessOptions,
    pub standards: Standards,
    pub position_taxonomy: PositionTaxonomy,
    pub group_standards: Vec<GroupStandard>,
    pub stats: BTreeMap<Metric, MetricStats>,
    pub warnings: Vec<DataWarning>,
    pub flags: Vec<DataFlag>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Reference data and settings shared by every run. Read-only once built, so
/// one engine may process any number of datasets, concurrently if desired.
#[derive(Debug, Clone, PartialEq)]
pub struct Engine {
    registry: Registry,
    constants: Constants,
    audit_limits: AuditLimits,
}

impl Engine {
    pub fn new(registry: Registry, constants: Constants, audit_limits: AuditLimits) -> Self {
        Engine {
            registry,
            constants,
            audit_limits,
        }
    }

    /// Engine with the embedded tables and default settings.
    pub fn builtin() -> Result<Self, StandardsError> {
        Ok(Self::new(
            Registry::builtin()?,
            Constants::default(),
            AuditLimits::default(),
        ))
    }

    /// Engine from a loaded config. Override paths in `[data]` resolve
    /// against `base_dir`.
    pub fn from_config(config: &EngineConfig, base_dir: &Path) -> Result<Self, StandardsError> {
        let standards = config.data.standards.as_ref().map(|p| base_dir.join(p));
        let positions = config.data.positions.as_ref().map(|p| base_dir.join(p));
        let registry = Registry::load(standards.as_deref(), positions.as_deref())?;
        Ok(Self::new(
            registry,
            config.constants.clone(),
            config.audit.clone(),
        ))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn constants(&self) -> &Constants {
        &self.constants
    }

    pub fn audit_limits(&self) -> &AuditLimits {
        &self.audit_limits
    }

    /// Run the full pipeline. Never fails: bad values become `None`, thin
    /// samples lose their statistics, and implausible values are flagged.
    pub fn process(&self, raw: &RawDataset, options: &ProcessOptions) -> DerivedDataset {
        let constants = match &raw.constants {
            Some(overrides) => {
                for (field, message) in constant_errors(overrides) {
                    warn!(field, "dataset constant override {message}; derived values may be meaningless");
                }
                overrides
            }
            None => &self.constants,
        };
        let records = self.build_records(raw, constants);
        let group_standards = group_standards(&records);

        let Analysis { athletes, stats } = analyze(records, &self.registry, options);
        let AuditReport { warnings, flags } = audit(&athletes, &self.audit_limits);

        info!(
            athletes = athletes.len(),
            warnings = warnings.len(),
            flags = flags.len(),
            age_adjusted = options.age_adjusted,
            body_adjusted = options.body_adjusted,
            cohorts = options.cohort_mode,
            "processed roster"
        );

        DerivedDataset {
            athletes,
            constants: constants.clone(),
            options: *options,
            standards: self.registry.standards.clone(),
            position_taxonomy: self.registry.positions.clone(),
            group_standards,
            stats,
            warnings,
            flags,
        }
    }

    /// Stage one only: per-athlete records, no roster-relative fields.
    pub fn build_records(&self, raw: &RawDataset, constants: &Constants) -> Vec<AthleteRecord> {
        let default_sport = raw.sport.as_deref().and_then(|name| {
            let sport = Sport::parse(name);
            if sport.is_none() {
                warn!(sport = name, "unknown dataset sport; athletes without a sport stay ungraded");
            }
            sport
        });
        raw.athletes
            .iter()
            .map(|a| build_record(a, constants, &self.registry, default_sport))
            .collect()
    }
}

/// One-shot convenience over [`Engine::process`] with default constants and
/// audit limits. Dataset-level constants still apply.
pub fn process_data(
    raw: &RawDataset,
    registry: &Registry,
    options: &ProcessOptions,
) -> DerivedDataset {
    Engine::new(registry.clone(), Constants::default(), AuditLimits::default())
        .process(raw, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn engine() -> Engine {
        Engine::builtin().unwrap()
    }

    fn dataset(value: serde_json::Value) -> RawDataset {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn empty_roster_is_valid() {
        let out = engine().process(&dataset(json!({"athletes": []})), &ProcessOptions::default());
        assert!(out.athletes.is_empty());
        assert!(out.flags.is_empty());
        assert_eq!(out.warnings.len(), crate::audit::CRITICAL_METRICS.len());
        assert!(out.stats.values().all(|s| s.n == 0 && s.low_sample));
    }

    #[test]
    fn missing_athletes_is_a_document_error() {
        let result: Result<RawDataset, _> = serde_json::from_value(json!({"sport": "Football"}));
        assert!(result.is_err());
    }

    #[test]
    fn dataset_constants_override_engine_constants() {
        let raw = dataset(json!({
            "constants": {"LB_TO_KG": 0.5},
            "athletes": [{"weight_lb": 100}]
        }));
        let out = engine().process(&raw, &ProcessOptions::default());
        assert_eq!(out.athletes[0].record.units.mass_kg, Some(50.0));
        assert_eq!(out.constants.lb_to_kg, 0.5);
        assert_eq!(out.constants.in_to_cm, 2.54);
    }

    #[test]
    fn invalid_dataset_constants_still_process() {
        let raw = dataset(json!({
            "constants": {"TEN_YD_M": 0},
            "athletes": [{"sprint_020": 2.85, "sprint_2030": 1.25, "sprint_3040": 1.15}]
        }));
        let overrides = raw.constants.as_ref().unwrap();
        assert_eq!(constant_errors(overrides).len(), 1);

        let out = engine().process(&raw, &ProcessOptions::default());
        assert_eq!(out.athletes.len(), 1);
        assert_eq!(out.constants.ten_yd_m, 0.0);
    }

    #[test]
    fn sparse_warnings_match_low_sample_stats() {
        let raw = dataset(json!({
            "athletes": [
                {"bench_1rm": 200}, {"bench_1rm": 210}, {"bench_1rm": 220}, {"bench_1rm": 230},
                {"vert_in": 20}, {"vert_in": 22}, {"vert_in": 24}, {"vert_in": 26}, {"vert_in": 28}
            ]
        }));
        let out = engine().process(&raw, &ProcessOptions::default());
        for metric in [Metric::Bench, Metric::Vert] {
            let warned = out.warnings.iter().any(|w| w.metric == metric);
            assert_eq!(warned, out.stats[&metric].low_sample, "{metric}");
        }
        assert!(out.stats[&Metric::Bench].low_sample);
        assert!(!out.stats[&Metric::Vert].low_sample);
    }

    #[test]
    fn dataset_sport_is_default_for_athletes() {
        let raw = dataset(json!({
            "sport": "basketball",
            "athletes": [
                {"position": "C"},
                {"position": "C", "sport": "Baseball"},
                {"position": "C", "sport": "Lacrosse"}
            ]
        }));
        let out = engine().process(&raw, &ProcessOptions::default());
        let groups: Vec<&str> = out.athletes.iter().map(|a| a.record.group.as_str()).collect();
        assert_eq!(groups, vec!["Bigs", "Infield", "Other"]);
        assert_eq!(out.athletes[2].record.sport, None);
    }

    #[test]
    fn raw_dataset_is_not_mutated() {
        let raw = dataset(json!({"athletes": [{"bench_1rm": "225", "weight_lb": 180}]}));
        let before = raw.clone();
        let _ = process_data(&raw, engine().registry(), &ProcessOptions::default());
        assert_eq!(raw, before);
    }
}
