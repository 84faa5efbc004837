// Like-for-like cohort ranking.
//
// Athletes are bucketed by sport, position group, weight band, height band
// and a coarse grade band, then ranked only against their own bucket.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use super::{Sample, SCORECARD_METRICS};
use crate::athlete::AthleteRecord;
use crate::standards::{Metric, Sport, Standards};
use crate::stats::{mean, round_to};

/// Members needed before anyone in a cohort (or any metric within it) is
/// ranked.
pub const MIN_COHORT_SIZE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum GradeBand {
    #[serde(rename = "MS")]
    MiddleSchool,
    #[serde(rename = "JV")]
    JuniorVarsity,
    #[serde(rename = "V")]
    Varsity,
    #[serde(rename = "NA")]
    Unknown,
}

impl GradeBand {
    pub fn for_grade(grade: Option<u8>) -> Self {
        match grade {
            Some(6..=8) => GradeBand::MiddleSchool,
            Some(9 | 10) => GradeBand::JuniorVarsity,
            Some(11 | 12) => GradeBand::Varsity,
            _ => GradeBand::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortKey {
    pub sport: Option<Sport>,
    pub group: String,
    pub weight_tier: usize,
    pub height_tier: usize,
    pub grade_band: GradeBand,
}

impl CohortKey {
    /// `None` unless both weight and height are known.
    pub fn for_record(record: &AthleteRecord, standards: &Standards) -> Option<Self> {
        let weight_tier = standards.weight_tier(record.inputs.weight_lb?)?;
        let height_tier = standards.height_tier(record.inputs.height_in?)?;
        Some(CohortKey {
            sport: record.sport,
            group: record.group.clone(),
            weight_tier,
            height_tier,
            grade_band: GradeBand::for_grade(record.grade),
        })
    }
}

/// One athlete's standing within their cohort. A solo cohort carries an empty
/// percentile set and no average.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortRank {
    #[serde(flatten)]
    pub key: CohortKey,
    pub size: usize,
    pub percentiles: BTreeMap<Metric, u8>,
    pub avg_percentile: Option<f64>,
}

/// Rank every record within its cohort. The result is index-aligned with
/// `records`; athletes without a cohort get `None`.
pub fn rank_cohorts(records: &[AthleteRecord], standards: &Standards) -> Vec<Option<CohortRank>> {
    let mut members: BTreeMap<CohortKey, Vec<usize>> = BTreeMap::new();
    for (i, record) in records.iter().enumerate() {
        if let Some(key) = CohortKey::for_record(record, standards) {
            members.entry(key).or_default().push(i);
        }
    }

    let mut ranks = vec![None; records.len()];
    for (key, indices) in members {
        debug!(
            group = %key.group,
            weight_tier = key.weight_tier,
            height_tier = key.height_tier,
            size = indices.len(),
            "cohort"
        );

        let samples: Vec<(Metric, Sample)> = if indices.len() >= MIN_COHORT_SIZE {
            SCORECARD_METRICS
                .into_iter()
                .map(|m| (m, Sample::from_values(indices.iter().map(|&i| records[i].metric(m)))))
                .filter(|(_, s)| s.n() >= MIN_COHORT_SIZE)
                .collect()
        } else {
            Vec::new()
        };

        for &i in &indices {
            let percentiles: BTreeMap<Metric, u8> = samples
                .iter()
                .filter_map(|(m, s)| {
                    s.percentile(records[i].metric(*m), m.invert())
                        .map(|p| (*m, p))
                })
                .collect();
            let values: Vec<f64> = percentiles.values().map(|&p| p as f64).collect();
            let avg_percentile = mean(&values).map(|m| round_to(m, 1));

            ranks[i] = Some(CohortRank {
                key: key.clone(),
                size: indices.len(),
                percentiles,
                avg_percentile,
            });
        }
    }
    ranks
}
