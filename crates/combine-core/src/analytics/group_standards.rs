// Descriptive reference tables per position group.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::athlete::AthleteRecord;
use crate::standards::{Metric, Sport};
use crate::stats::{percentile_value, present, sorted};

/// Metrics summarized in group reference tables.
pub const GROUP_STANDARD_METRICS: [Metric; 10] = [
    Metric::Bench,
    Metric::Squat,
    Metric::RelBench,
    Metric::RelSquat,
    Metric::Vert,
    Metric::Broad,
    Metric::Forty,
    Metric::Sprint020,
    Metric::VMax,
    Metric::PeakPower,
];

/// Spread of one metric within a group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Distribution {
    pub n: usize,
    pub min: f64,
    pub max: f64,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
}

impl Distribution {
    /// `None` for an empty sample. Expects `sorted` ascending.
    pub fn from_sorted(sorted: &[f64]) -> Option<Self> {
        let pct = |p: f64| percentile_value(sorted, p);
        Some(Distribution {
            n: sorted.len(),
            min: *sorted.first()?,
            max: *sorted.last()?,
            p10: pct(10.0)?,
            p25: pct(25.0)?,
            p50: pct(50.0)?,
            p75: pct(75.0)?,
            p90: pct(90.0)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStandard {
    pub sport: Option<Sport>,
    pub group: String,
    /// Athletes in the group.
    pub n: usize,
    pub metrics: BTreeMap<Metric, Distribution>,
}

/// Reference table for every group with at least one athlete, ordered by
/// sport then group name.
pub fn group_standards(records: &[AthleteRecord]) -> Vec<GroupStandard> {
    let mut groups: BTreeMap<(Option<Sport>, &str), Vec<&AthleteRecord>> = BTreeMap::new();
    for r in records {
        groups.entry((r.sport, r.group.as_str())).or_default().push(r);
    }

    groups
        .into_iter()
        .map(|((sport, group), members)| {
            let metrics = GROUP_STANDARD_METRICS
                .into_iter()
                .filter_map(|m| {
                    let values = sorted(present(members.iter().map(|r| r.metric(m))));
                    Distribution::from_sorted(&values).map(|d| (m, d))
                })
                .collect();
            GroupStandard {
                sport,
                group: group.to_string(),
                n: members.len(),
                metrics,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::athlete::{build_record, RawAthlete};
    use crate::config::Constants;
    use crate::standards::Registry;
    use serde_json::json;

    #[test]
    fn distribution_of_five() {
        let d = Distribution::from_sorted(&[10.0, 20.0, 30.0, 40.0, 50.0]).unwrap();
        assert_eq!(d.n, 5);
        assert_eq!(d.min, 10.0);
        assert_eq!(d.max, 50.0);
        assert_eq!(d.p10, 14.0);
        assert_eq!(d.p25, 20.0);
        assert_eq!(d.p50, 30.0);
        assert_eq!(d.p90, 46.0);
    }

    #[test]
    fn empty_distribution_is_none() {
        assert!(Distribution::from_sorted(&[]).is_none());
    }

    #[test]
    fn groups_partition_roster() {
        let registry = Registry::builtin().unwrap();
        let records: Vec<AthleteRecord> = [
            json!({"position": "RB", "bench_1rm": 200}),
            json!({"position": "WR", "bench_1rm": 220}),
            json!({"position": "OL", "bench_1rm": 300}),
            json!({"position": "K"}),
        ]
        .into_iter()
        .map(|v| {
            let raw: RawAthlete = serde_json::from_value(v).unwrap();
            build_record(&raw, &Constants::default(), &registry, Some(Sport::Football))
        })
        .collect();

        let table = group_standards(&records);
        let names: Vec<&str> = table.iter().map(|g| g.group.as_str()).collect();
        assert_eq!(names, vec!["Linemen", "Other", "Skill"]);

        let skill = &table[2];
        assert_eq!(skill.n, 2);
        assert_eq!(skill.metrics[&Metric::Bench].p50, 210.0);
        assert!(!skill.metrics.contains_key(&Metric::Vert));

        let other = &table[1];
        assert_eq!(other.n, 1);
        assert!(other.metrics.is_empty());
    }
}
