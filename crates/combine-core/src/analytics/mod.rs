// Roster-relative analytics: z-scores, composite indices, medball and
// scorecard percentiles, absolute grades and optional cohort ranks.
//
// Every metric's roster sample is collected and sorted once; each athlete is
// then scored against those shared samples. The output is a fresh
// `DerivedAthlete` per input record.

pub mod cohort;
pub mod group_standards;

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::athlete::AthleteRecord;
use crate::config::ProcessOptions;
use crate::grading::{grade_value, overall_grade, GradeContext, GradeResult, OverallGrade};
use crate::standards::{Metric, Registry, Sport};
use crate::stats::{mean, percentile_of, present, round_to, sorted, stddev, zscore};

pub use cohort::{CohortKey, CohortRank, GradeBand};
pub use group_standards::{group_standards, Distribution, GroupStandard};

/// Roster-wide non-null values needed before a metric is standardized.
pub const MIN_SAMPLE_SIZE: usize = 5;

/// Metrics that receive a z-score.
pub const Z_METRICS: [Metric; 12] = [
    Metric::Bench,
    Metric::Squat,
    Metric::Medball,
    Metric::MbRel,
    Metric::RelBench,
    Metric::RelSquat,
    Metric::Vert,
    Metric::Broad,
    Metric::Forty,
    Metric::Sprint020,
    Metric::VMax,
    Metric::PeakPower,
];

/// Metrics shown on the percentile scorecard (and ranked within cohorts).
pub const SCORECARD_METRICS: [Metric; 13] = [
    Metric::Bench,
    Metric::Squat,
    Metric::Medball,
    Metric::MbRel,
    Metric::RelBench,
    Metric::RelSquat,
    Metric::Vert,
    Metric::Broad,
    Metric::Forty,
    Metric::Sprint020,
    Metric::VMax,
    Metric::PeakPower,
    Metric::RelPeakPower,
];

const EXPLOSIVE_UPPER_WEIGHTS: (f64, f64) = (0.6, 0.4);
const TOTAL_EXPLOSIVE_WEIGHTS: [f64; 3] = [0.45, 0.30, 0.25];
const MIN_TOTAL_EXPLOSIVE_TERMS: usize = 2;

// ---------------------------------------------------------------------------
// Percentile tiers
// ---------------------------------------------------------------------------

/// Roster-relative tier, derived from a percentile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PercentileTier {
    Elite,
    Strong,
    Solid,
    Competitive,
    Developing,
}

impl PercentileTier {
    /// Breakpoints at 90 / 75 / 50 / 25.
    pub fn from_percentile(pct: u8) -> Self {
        match pct {
            90..=u8::MAX => PercentileTier::Elite,
            75..=89 => PercentileTier::Strong,
            50..=74 => PercentileTier::Solid,
            25..=49 => PercentileTier::Competitive,
            _ => PercentileTier::Developing,
        }
    }
}

// ---------------------------------------------------------------------------
// Samples
// ---------------------------------------------------------------------------

/// A metric's present values across some population, sorted ascending,
/// with their mean and sample standard deviation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sample {
    pub sorted: Vec<f64>,
    pub mean: Option<f64>,
    pub stddev: Option<f64>,
}

impl Sample {
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let sorted = sorted(present(values));
        Sample {
            mean: mean(&sorted),
            stddev: stddev(&sorted),
            sorted,
        }
    }

    pub fn n(&self) -> usize {
        self.sorted.len()
    }

    pub fn supports_zscores(&self) -> bool {
        self.n() >= MIN_SAMPLE_SIZE
    }

    /// Direction-normalized z-score (positive is better), unrounded.
    /// `None` when the value is missing or the sample is too small.
    pub fn zscore(&self, value: Option<f64>, invert: bool) -> Option<f64> {
        if !self.supports_zscores() {
            return None;
        }
        let z = zscore(value?, self.mean?, self.stddev?);
        Some(if invert { -z } else { z })
    }

    /// Direction-normalized percentile (higher is better).
    pub fn percentile(&self, value: Option<f64>, invert: bool) -> Option<u8> {
        let pct = percentile_of(value?, &self.sorted)?;
        Some(if invert { 100 - pct } else { pct })
    }
}

/// Roster-level summary of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricStats {
    pub n: usize,
    pub mean: Option<f64>,
    pub stddev: Option<f64>,
    /// Fewer than [`MIN_SAMPLE_SIZE`] values; no z-scores were assigned.
    pub low_sample: bool,
}

impl From<&Sample> for MetricStats {
    fn from(sample: &Sample) -> Self {
        MetricStats {
            n: sample.n(),
            mean: sample.mean.map(|m| round_to(m, 3)),
            stddev: sample.stddev.map(|s| round_to(s, 3)),
            low_sample: !sample.supports_zscores(),
        }
    }
}

// ---------------------------------------------------------------------------
// Population-relative fields
// ---------------------------------------------------------------------------

/// Stored z-scores, two decimals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ZScores {
    #[serde(rename = "zBench")]
    pub bench: Option<f64>,
    #[serde(rename = "zSquat")]
    pub squat: Option<f64>,
    #[serde(rename = "zMB")]
    pub medball: Option<f64>,
    #[serde(rename = "zMBRel")]
    pub mb_rel: Option<f64>,
    #[serde(rename = "zRelBench")]
    pub rel_bench: Option<f64>,
    #[serde(rename = "zRelSquat")]
    pub rel_squat: Option<f64>,
    #[serde(rename = "zVert")]
    pub vert: Option<f64>,
    #[serde(rename = "zBroad")]
    pub broad: Option<f64>,
    #[serde(rename = "zForty")]
    pub forty: Option<f64>,
    #[serde(rename = "zSprint020")]
    pub sprint_020: Option<f64>,
    #[serde(rename = "zVMax")]
    pub v_max: Option<f64>,
    #[serde(rename = "zPeakPower")]
    pub peak_power: Option<f64>,
}

impl ZScores {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Bench => self.bench,
            Metric::Squat => self.squat,
            Metric::Medball => self.medball,
            Metric::MbRel => self.mb_rel,
            Metric::RelBench => self.rel_bench,
            Metric::RelSquat => self.rel_squat,
            Metric::Vert => self.vert,
            Metric::Broad => self.broad,
            Metric::Forty => self.forty,
            Metric::Sprint020 => self.sprint_020,
            Metric::VMax => self.v_max,
            Metric::PeakPower => self.peak_power,
            Metric::V10Max | Metric::RelPeakPower | Metric::MomMax => None,
        }
    }

    fn slot_mut(&mut self, metric: Metric) -> Option<&mut Option<f64>> {
        let slot = match metric {
            Metric::Bench => &mut self.bench,
            Metric::Squat => &mut self.squat,
            Metric::Medball => &mut self.medball,
            Metric::MbRel => &mut self.mb_rel,
            Metric::RelBench => &mut self.rel_bench,
            Metric::RelSquat => &mut self.rel_squat,
            Metric::Vert => &mut self.vert,
            Metric::Broad => &mut self.broad,
            Metric::Forty => &mut self.forty,
            Metric::Sprint020 => &mut self.sprint_020,
            Metric::VMax => &mut self.v_max,
            Metric::PeakPower => &mut self.peak_power,
            Metric::V10Max | Metric::RelPeakPower | Metric::MomMax => return None,
        };
        Some(slot)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScorecardEntry {
    pub value: f64,
    pub percentile: u8,
    pub tier: PercentileTier,
}

/// Fields that depend on the rest of the roster. Empty until the analytics
/// pass fills them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationMetrics {
    #[serde(flatten)]
    pub z: ZScores,
    pub explosive_upper: Option<f64>,
    pub total_explosive: Option<f64>,
    pub mb_team_pct: Option<u8>,
    pub mb_group_pct: Option<u8>,
    pub mb_tier: Option<PercentileTier>,
    pub scorecard: BTreeMap<Metric, ScorecardEntry>,
    pub grades: BTreeMap<Metric, GradeResult>,
    pub overall_grade: Option<OverallGrade>,
    pub cohort: Option<CohortRank>,
}

/// A fully annotated athlete.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedAthlete {
    #[serde(flatten)]
    pub record: AthleteRecord,
    #[serde(flatten)]
    pub population: PopulationMetrics,
}

impl DerivedAthlete {
    /// Wrap a record with every population-relative field left empty.
    pub fn from_record(record: AthleteRecord) -> Self {
        DerivedAthlete {
            record,
            population: PopulationMetrics::default(),
        }
    }
}

impl AsRef<AthleteRecord> for DerivedAthlete {
    fn as_ref(&self) -> &AthleteRecord {
        &self.record
    }
}

// ---------------------------------------------------------------------------
// Composites
// ---------------------------------------------------------------------------

/// `0.6 * z(mbRel) + 0.4 * z(relBench)`, or whichever single term exists.
pub fn explosive_upper(z_mb_rel: Option<f64>, z_rel_bench: Option<f64>) -> Option<f64> {
    let (w_mb, w_bench) = EXPLOSIVE_UPPER_WEIGHTS;
    match (z_mb_rel, z_rel_bench) {
        (Some(mb), Some(bench)) => Some(w_mb * mb + w_bench * bench),
        (Some(only), None) | (None, Some(only)) => Some(only),
        (None, None) => None,
    }
}

/// Weighted mean of the present terms among explosive-upper, z(peakPower)
/// and z(vMax). Needs at least two terms.
pub fn total_explosive(
    explosive_upper: Option<f64>,
    z_peak_power: Option<f64>,
    z_v_max: Option<f64>,
) -> Option<f64> {
    let terms: Vec<(f64, f64)> = [explosive_upper, z_peak_power, z_v_max]
        .into_iter()
        .zip(TOTAL_EXPLOSIVE_WEIGHTS)
        .filter_map(|(v, w)| v.map(|v| (v, w)))
        .collect();
    if terms.len() < MIN_TOTAL_EXPLOSIVE_TERMS {
        return None;
    }
    let weighted: f64 = terms.iter().map(|(v, w)| v * w).sum();
    let weights: f64 = terms.iter().map(|(_, w)| w).sum();
    Some(weighted / weights)
}

/// Two-decimal storage for z-derived values, without a negative zero.
fn store_z(z: f64) -> f64 {
    let r = round_to(z, 2);
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

// ---------------------------------------------------------------------------
// Analysis pass
// ---------------------------------------------------------------------------

/// Output of [`analyze`].
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub athletes: Vec<DerivedAthlete>,
    pub stats: BTreeMap<Metric, MetricStats>,
}

/// Score every record against the roster. Input order is preserved.
pub fn analyze(
    records: Vec<AthleteRecord>,
    registry: &Registry,
    options: &ProcessOptions,
) -> Analysis {
    let samples: BTreeMap<Metric, Sample> = Metric::ALL
        .into_iter()
        .map(|m| (m, Sample::from_values(records.iter().map(|r| r.metric(m)))))
        .collect();

    let mut stats = BTreeMap::new();
    for metric in Z_METRICS {
        if let Some(sample) = samples.get(&metric) {
            if !sample.supports_zscores() {
                debug!(%metric, n = sample.n(), "sample below z-score minimum");
            }
            stats.insert(metric, MetricStats::from(sample));
        }
    }

    let mut populations: Vec<PopulationMetrics> = {
        let mut by_group: BTreeMap<(Option<Sport>, &str), Vec<Option<f64>>> = BTreeMap::new();
        for r in &records {
            by_group
                .entry((r.sport, r.group.as_str()))
                .or_default()
                .push(r.metric(Metric::Medball));
        }
        let group_medball: BTreeMap<(Option<Sport>, &str), Sample> = by_group
            .into_iter()
            .map(|(key, values)| (key, Sample::from_values(values)))
            .collect();

        records
            .iter()
            .map(|r| {
                let group_sample = group_medball.get(&(r.sport, r.group.as_str()));
                population_for(r, &samples, group_sample, registry, options)
            })
            .collect()
    };

    if options.cohort_mode {
        let ranks = cohort::rank_cohorts(&records, &registry.standards);
        for (population, rank) in populations.iter_mut().zip(ranks) {
            population.cohort = rank;
        }
    }

    let athletes = records
        .into_iter()
        .zip(populations)
        .map(|(record, population)| DerivedAthlete { record, population })
        .collect();

    Analysis { athletes, stats }
}

fn population_for(
    record: &AthleteRecord,
    samples: &BTreeMap<Metric, Sample>,
    group_medball: Option<&Sample>,
    registry: &Registry,
    options: &ProcessOptions,
) -> PopulationMetrics {
    // Unrounded z-scores feed the composites; rounding happens on storage.
    let raw_z: BTreeMap<Metric, f64> = Z_METRICS
        .into_iter()
        .filter_map(|m| {
            let z = samples.get(&m)?.zscore(record.metric(m), m.invert())?;
            Some((m, z))
        })
        .collect();

    let mut z = ZScores::default();
    for (metric, value) in &raw_z {
        if let Some(slot) = z.slot_mut(*metric) {
            *slot = Some(store_z(*value));
        }
    }

    let upper = explosive_upper(
        raw_z.get(&Metric::MbRel).copied(),
        raw_z.get(&Metric::RelBench).copied(),
    );
    let total = total_explosive(
        upper,
        raw_z.get(&Metric::PeakPower).copied(),
        raw_z.get(&Metric::VMax).copied(),
    );

    let medball = record.metric(Metric::Medball);
    let mb_team_pct = samples
        .get(&Metric::Medball)
        .and_then(|s| s.percentile(medball, false));
    let mb_group_pct = group_medball.and_then(|s| s.percentile(medball, false));

    let scorecard = SCORECARD_METRICS
        .into_iter()
        .filter_map(|m| {
            let value = record.metric(m)?;
            let percentile = samples.get(&m)?.percentile(Some(value), m.invert())?;
            Some((
                m,
                ScorecardEntry {
                    value,
                    percentile,
                    tier: PercentileTier::from_percentile(percentile),
                },
            ))
        })
        .collect();

    let ctx = GradeContext {
        sport: record.sport,
        group: &record.group,
        grade: record.grade,
        weight_lb: record.inputs.weight_lb,
        height_in: record.inputs.height_in,
        age_adjusted: options.age_adjusted,
        body_adjusted: options.body_adjusted,
    };
    let grades: BTreeMap<Metric, GradeResult> = Metric::ALL
        .into_iter()
        .filter_map(|m| grade_value(registry, record.metric(m), m, &ctx).map(|g| (m, g)))
        .collect();
    let overall = overall_grade(&grades);

    PopulationMetrics {
        z,
        explosive_upper: upper.map(store_z),
        total_explosive: total.map(store_z),
        mb_team_pct,
        mb_group_pct,
        mb_tier: mb_team_pct.map(PercentileTier::from_percentile),
        scorecard,
        grades,
        overall_grade: overall,
        cohort: None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::athlete::{build_record, RawAthlete};
    use crate::config::Constants;
    use serde_json::{json, Value};

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn registry() -> Registry {
        Registry::builtin().unwrap()
    }

    fn record(registry: &Registry, value: Value) -> AthleteRecord {
        let raw: RawAthlete = serde_json::from_value(value).unwrap();
        build_record(&raw, &Constants::default(), registry, Some(Sport::Football))
    }

    fn roster(registry: &Registry, values: Vec<Value>) -> Vec<AthleteRecord> {
        values.into_iter().map(|v| record(registry, v)).collect()
    }

    #[test]
    fn percentile_tier_breakpoints() {
        assert_eq!(PercentileTier::from_percentile(100), PercentileTier::Elite);
        assert_eq!(PercentileTier::from_percentile(90), PercentileTier::Elite);
        assert_eq!(PercentileTier::from_percentile(89), PercentileTier::Strong);
        assert_eq!(PercentileTier::from_percentile(75), PercentileTier::Strong);
        assert_eq!(PercentileTier::from_percentile(50), PercentileTier::Solid);
        assert_eq!(PercentileTier::from_percentile(25), PercentileTier::Competitive);
        assert_eq!(PercentileTier::from_percentile(24), PercentileTier::Developing);
        assert_eq!(PercentileTier::from_percentile(0), PercentileTier::Developing);
    }

    #[test]
    fn explosive_upper_degrades_to_single_term() {
        assert!(approx_eq(explosive_upper(Some(1.0), Some(0.5)).unwrap(), 0.8, 1e-12));
        assert_eq!(explosive_upper(Some(1.2), None), Some(1.2));
        assert_eq!(explosive_upper(None, Some(-0.4)), Some(-0.4));
        assert_eq!(explosive_upper(None, None), None);
    }

    #[test]
    fn total_explosive_needs_two_terms() {
        assert_eq!(total_explosive(Some(1.0), None, None), None);
        assert_eq!(total_explosive(None, None, Some(1.0)), None);

        // (0.45 * 1 + 0.25 * 2) / 0.70
        let two = total_explosive(Some(1.0), None, Some(2.0)).unwrap();
        assert!(approx_eq(two, 0.95 / 0.70, 1e-12));

        let all = total_explosive(Some(1.0), Some(1.0), Some(1.0)).unwrap();
        assert!(approx_eq(all, 1.0, 1e-12));
    }

    #[test]
    fn zscores_gated_below_five() {
        let r = registry();
        let records = roster(
            &r,
            vec![
                json!({"bench_1rm": 200}),
                json!({"bench_1rm": 220}),
                json!({"bench_1rm": 240}),
                json!({"bench_1rm": null}),
            ],
        );
        let analysis = analyze(records, &r, &ProcessOptions::default());
        assert!(analysis.athletes.iter().all(|a| a.population.z.bench.is_none()));
        let stats = analysis.stats[&Metric::Bench];
        assert_eq!(stats.n, 3);
        assert!(stats.low_sample);
    }

    #[test]
    fn zscores_center_on_zero() {
        let r = registry();
        let records = roster(
            &r,
            [200, 220, 240, 260, 280]
                .iter()
                .map(|b| json!({"bench_1rm": b}))
                .collect(),
        );
        let analysis = analyze(records, &r, &ProcessOptions::default());
        let zs: Vec<f64> = analysis
            .athletes
            .iter()
            .map(|a| a.population.z.bench.unwrap())
            .collect();
        assert!(approx_eq(zs.iter().sum::<f64>(), 0.0, 0.02));
        assert_eq!(zs[2], 0.0);
        assert!(zs[4] > zs[0]);
        assert!(!analysis.stats[&Metric::Bench].low_sample);
    }

    #[test]
    fn inverted_zscores_reward_faster_times() {
        let r = registry();
        let records = roster(
            &r,
            [2.8, 2.9, 3.0, 3.1, 3.2]
                .iter()
                .map(|t| json!({"sprint_020": t}))
                .collect(),
        );
        let analysis = analyze(records, &r, &ProcessOptions::default());
        let fastest = analysis.athletes[0].population.z.sprint_020.unwrap();
        let slowest = analysis.athletes[4].population.z.sprint_020.unwrap();
        assert!(fastest > 0.0);
        assert!(slowest < 0.0);
    }

    #[test]
    fn identical_values_give_zero_z() {
        let r = registry();
        let records = roster(&r, (0..5).map(|_| json!({"vert_in": 24})).collect());
        let analysis = analyze(records, &r, &ProcessOptions::default());
        for a in &analysis.athletes {
            assert_eq!(a.population.z.vert, Some(0.0));
        }
    }

    #[test]
    fn scorecard_inverts_sprint_percentiles() {
        let r = registry();
        let records = roster(
            &r,
            vec![
                json!({"sprint_020": 2.8}),
                json!({"sprint_020": 3.0}),
                json!({"sprint_020": 3.2}),
            ],
        );
        let analysis = analyze(records, &r, &ProcessOptions::default());
        let fastest = analysis.athletes[0].population.scorecard[&Metric::Sprint020];
        assert_eq!(fastest.percentile, 100);
        assert_eq!(fastest.tier, PercentileTier::Elite);
        let slowest = analysis.athletes[2].population.scorecard[&Metric::Sprint020];
        assert_eq!(slowest.percentile, 0);
        assert_eq!(slowest.tier, PercentileTier::Developing);
    }

    #[test]
    fn medball_percentiles_team_and_group() {
        let r = registry();
        let records = roster(
            &r,
            vec![
                json!({"position": "RB", "medball_in": 300}),
                json!({"position": "WR", "medball_in": 340}),
                json!({"position": "OL", "medball_in": 400}),
            ],
        );
        let analysis = analyze(records, &r, &ProcessOptions::default());
        let wr = &analysis.athletes[1].population;
        assert_eq!(wr.mb_team_pct, Some(50));
        assert_eq!(wr.mb_group_pct, Some(100));
        assert_eq!(wr.mb_tier, Some(PercentileTier::Solid));

        let ol = &analysis.athletes[2].population;
        assert_eq!(ol.mb_group_pct, Some(50));
    }

    #[test]
    fn grades_and_overall_grade() {
        let r = registry();
        let records = roster(
            &r,
            vec![
                json!({"position": "RB", "grade": 12, "bench_1rm": 280, "squat_1rm": 100}),
                json!({"position": "RB", "grade": 12, "bench_1rm": 280, "squat_1rm": 100,
                       "vert_in": 20}),
            ],
        );
        let analysis = analyze(records, &r, &ProcessOptions::default());

        let sparse = &analysis.athletes[0].population;
        assert_eq!(sparse.grades[&Metric::Bench].score, 5);
        assert_eq!(sparse.grades.len(), 2);
        assert!(sparse.overall_grade.is_none());

        let full = &analysis.athletes[1].population;
        let overall = full.overall_grade.unwrap();
        assert_eq!(overall.count, 3);
        let total: u32 = full.grades.values().map(|g| g.score as u32).sum();
        assert_eq!(overall.score, round_to(total as f64 / 3.0, 1));
    }

    #[test]
    fn cohorts_only_when_requested() {
        let r = registry();
        let values = vec![
            json!({"position": "RB", "weight_lb": 180, "height_in": 70, "bench_1rm": 200}),
            json!({"position": "RB", "weight_lb": 182, "height_in": 71, "bench_1rm": 240}),
        ];
        let off = analyze(roster(&r, values.clone()), &r, &ProcessOptions::default());
        assert!(off.athletes.iter().all(|a| a.population.cohort.is_none()));

        let opts = ProcessOptions {
            cohort_mode: true,
            ..ProcessOptions::default()
        };
        let on = analyze(roster(&r, values), &r, &opts);
        let rank = on.athletes[1].population.cohort.as_ref().unwrap();
        assert_eq!(rank.size, 2);
        assert_eq!(rank.percentiles[&Metric::Bench], 100);
    }

    #[test]
    fn placeholder_has_no_population_fields() {
        let r = registry();
        let derived = DerivedAthlete::from_record(record(&r, json!({"bench_1rm": 200})));
        let v = serde_json::to_value(&derived).unwrap();
        assert_eq!(v["bench_1rm"], json!(200.0));
        assert_eq!(v["zBench"], Value::Null);
        assert_eq!(v["overallGrade"], Value::Null);
        assert_eq!(v["scorecard"], json!({}));
    }

    #[test]
    fn serialized_z_keys() {
        let z = ZScores {
            medball: Some(1.0),
            mb_rel: Some(0.5),
            ..ZScores::default()
        };
        let v = serde_json::to_value(&z).unwrap();
        assert_eq!(v["zMB"], json!(1.0));
        assert_eq!(v["zMBRel"], json!(0.5));
        assert_eq!(v["zBench"], Value::Null);
    }
}
