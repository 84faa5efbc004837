// Data-quality audit over a built roster.
//
// Two advisory outputs: sparse-sample warnings for metrics whose roster-wide
// statistics are unreliable, and per-athlete flags for implausible values.
// Nothing here alters or drops data.

use serde::Serialize;

use crate::analytics::MIN_SAMPLE_SIZE;
use crate::athlete::AthleteRecord;
use crate::config::AuditLimits;
use crate::physics::safe_div;
use crate::standards::Metric;

/// Metrics whose sample size is checked.
pub const CRITICAL_METRICS: [Metric; 8] = [
    Metric::Bench,
    Metric::Squat,
    Metric::Medball,
    Metric::Vert,
    Metric::Broad,
    Metric::Forty,
    Metric::VMax,
    Metric::PeakPower,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataWarning {
    pub metric: Metric,
    pub count: usize,
    pub message: String,
}

/// Plausibility rule that raised a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagRule {
    BenchExceedsSquat,
    LowSquatRatio,
    WeightOutOfRange,
    HeightOutOfRange,
    FortyOutOfRange,
    BenchBodyweightCeiling,
    SquatBodyweightCeiling,
    VertCeiling,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFlag {
    pub athlete_id: Option<String>,
    pub athlete_name: String,
    pub rule: FlagRule,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuditReport {
    pub warnings: Vec<DataWarning>,
    pub flags: Vec<DataFlag>,
}

/// Audit a roster of records or derived athletes.
pub fn audit<R: AsRef<AthleteRecord>>(roster: &[R], limits: &AuditLimits) -> AuditReport {
    AuditReport {
        warnings: sample_warnings(roster),
        flags: roster
            .iter()
            .flat_map(|r| athlete_flags(r.as_ref(), limits))
            .collect(),
    }
}

/// One warning per critical metric with fewer values than the z-score
/// minimum, so a warning appears exactly when `stats.lowSample` is set.
pub fn sample_warnings<R: AsRef<AthleteRecord>>(roster: &[R]) -> Vec<DataWarning> {
    CRITICAL_METRICS
        .into_iter()
        .filter_map(|metric| {
            let count = roster
                .iter()
                .filter(|r| r.as_ref().metric(metric).is_some())
                .count();
            (count < MIN_SAMPLE_SIZE).then(|| DataWarning {
                metric,
                count,
                message: format!(
                    "Only {count} athlete(s) have {}; team statistics for this metric \
                     need at least {} and should be treated with caution.",
                    metric.label(),
                    MIN_SAMPLE_SIZE
                ),
            })
        })
        .collect()
}

/// Every plausibility rule the athlete trips.
pub fn athlete_flags(record: &AthleteRecord, limits: &AuditLimits) -> Vec<DataFlag> {
    let inputs = &record.inputs;
    let mut found: Vec<(FlagRule, String)> = Vec::new();

    if let (Some(bench), Some(squat)) = (inputs.bench_1rm, inputs.squat_1rm) {
        if bench > squat {
            found.push((
                FlagRule::BenchExceedsSquat,
                format!("Bench ({bench} lb) exceeds squat ({squat} lb)."),
            ));
        }
    }

    let per_bw = |lift: Option<f64>| {
        lift.zip(inputs.weight_lb)
            .and_then(|(l, w)| safe_div(l, w))
    };

    if let Some(ratio) = per_bw(inputs.squat_1rm) {
        if ratio < limits.min_squat_ratio {
            found.push((
                FlagRule::LowSquatRatio,
                format!(
                    "Squat is only {ratio:.2}x bodyweight (expected at least {}x).",
                    limits.min_squat_ratio
                ),
            ));
        }
        if ratio > limits.max_squat_ratio {
            found.push((
                FlagRule::SquatBodyweightCeiling,
                format!(
                    "Squat is {ratio:.2}x bodyweight, above the {}x ceiling.",
                    limits.max_squat_ratio
                ),
            ));
        }
    }

    if let Some(ratio) = per_bw(inputs.bench_1rm) {
        if ratio > limits.max_bench_ratio {
            found.push((
                FlagRule::BenchBodyweightCeiling,
                format!(
                    "Bench is {ratio:.2}x bodyweight, above the {}x ceiling.",
                    limits.max_bench_ratio
                ),
            ));
        }
    }

    if let Some(weight) = inputs.weight_lb {
        if weight < limits.min_weight_lb || weight > limits.max_weight_lb {
            found.push((
                FlagRule::WeightOutOfRange,
                format!(
                    "Weight {weight} lb is outside {}-{} lb.",
                    limits.min_weight_lb, limits.max_weight_lb
                ),
            ));
        }
    }

    if let Some(height) = inputs.height_in {
        if height < limits.min_height_in || height > limits.max_height_in {
            found.push((
                FlagRule::HeightOutOfRange,
                format!(
                    "Height {height} in is outside {}-{} in.",
                    limits.min_height_in, limits.max_height_in
                ),
            ));
        }
    }

    if let Some(forty) = record.sprint.forty {
        if forty < limits.min_forty_s || forty > limits.max_forty_s {
            found.push((
                FlagRule::FortyOutOfRange,
                format!(
                    "40-yard time {forty} s is outside {}-{} s.",
                    limits.min_forty_s, limits.max_forty_s
                ),
            ));
        }
    }

    if let Some(vert) = inputs.vert_in {
        if vert > limits.max_vert_in {
            found.push((
                FlagRule::VertCeiling,
                format!(
                    "Vertical jump {vert} in exceeds the {} in ceiling.",
                    limits.max_vert_in
                ),
            ));
        }
    }

    found
        .into_iter()
        .map(|(rule, message)| DataFlag {
            athlete_id: record.id.clone(),
            athlete_name: record.display_name().to_string(),
            rule,
            message,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::athlete::{build_record, RawAthlete};
    use crate::config::Constants;
    use crate::standards::{Registry, Sport};
    use serde_json::{json, Value};

    fn record(value: Value) -> AthleteRecord {
        let registry = Registry::builtin().unwrap();
        let raw: RawAthlete = serde_json::from_value(value).unwrap();
        build_record(&raw, &Constants::default(), &registry, Some(Sport::Football))
    }

    fn rules(value: Value) -> Vec<FlagRule> {
        athlete_flags(&record(value), &AuditLimits::default())
            .into_iter()
            .map(|f| f.rule)
            .collect()
    }

    #[test]
    fn clean_athlete_has_no_flags() {
        let r = rules(json!({
            "weight_lb": 185, "height_in": 71, "bench_1rm": 225, "squat_1rm": 315,
            "vert_in": 28, "sprint_020": 2.9, "sprint_2030": 1.2, "sprint_3040": 1.15
        }));
        assert!(r.is_empty(), "{r:?}");
    }

    #[test]
    fn bench_over_squat() {
        let r = rules(json!({"weight_lb": 200, "bench_1rm": 300, "squat_1rm": 280}));
        assert_eq!(r, vec![FlagRule::BenchExceedsSquat]);
    }

    #[test]
    fn squat_ratio_bounds() {
        assert_eq!(
            rules(json!({"weight_lb": 200, "squat_1rm": 90})),
            vec![FlagRule::LowSquatRatio]
        );
        assert_eq!(
            rules(json!({"weight_lb": 150, "squat_1rm": 600})),
            vec![FlagRule::SquatBodyweightCeiling]
        );
    }

    #[test]
    fn implausible_values_are_flagged_not_dropped() {
        let rec = record(json!({"name": "Big Lift", "weight_lb": 180, "squat_1rm": 2000}));
        let flags = athlete_flags(&rec, &AuditLimits::default());
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].athlete_name, "Big Lift");
        assert_eq!(rec.inputs.squat_1rm, Some(2000.0));
    }

    #[test]
    fn body_and_speed_ranges() {
        let r = rules(json!({
            "weight_lb": 40, "height_in": 95, "vert_in": 50,
            "sprint_020": 1.5, "sprint_2030": 0.7, "sprint_3040": 0.7
        }));
        assert!(r.contains(&FlagRule::WeightOutOfRange));
        assert!(r.contains(&FlagRule::HeightOutOfRange));
        assert!(r.contains(&FlagRule::FortyOutOfRange));
        assert!(r.contains(&FlagRule::VertCeiling));
    }

    #[test]
    fn bench_ceiling() {
        let r = rules(json!({"weight_lb": 120, "bench_1rm": 320, "squat_1rm": 400}));
        assert_eq!(r, vec![FlagRule::BenchBodyweightCeiling]);
    }

    #[test]
    fn sparse_metrics_warn() {
        let roster: Vec<AthleteRecord> = (0..4)
            .map(|i| record(json!({"bench_1rm": 200 + i * 10})))
            .collect();
        let warnings = sample_warnings(&roster);
        assert_eq!(warnings.len(), CRITICAL_METRICS.len());
        let bench = warnings.iter().find(|w| w.metric == Metric::Bench).unwrap();
        assert_eq!(bench.count, 4);

        let mut roster = roster;
        roster.push(record(json!({"bench_1rm": 260})));
        let warnings = sample_warnings(&roster);
        assert!(warnings.iter().all(|w| w.metric != Metric::Bench));
    }
}
