// Historical test sessions and point-in-time roster snapshots.
//
// A session records the raw test values one athlete produced on one date.
// Replaying sessions up to a date rebuilds the raw roster as it stood then,
// which the ordinary pipeline can process into derived values at that time.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::athlete::RawAthlete;
use crate::parse::parse_text;
use crate::pipeline::RawDataset;

/// One athlete's raw test values from a single testing date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSession {
    pub athlete_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub label: Option<String>,
    /// Raw values keyed by roster field name (`vert_in`, `sprint_020`, ...).
    #[serde(default)]
    pub values: BTreeMap<String, Value>,
}

/// A distinct testing event.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SessionLabel {
    pub date: NaiveDate,
    pub label: Option<String>,
}

/// Distinct (date, label) pairs, oldest first.
pub fn session_labels(dataset: &RawDataset) -> Vec<SessionLabel> {
    dataset
        .sessions
        .iter()
        .map(|s| SessionLabel {
            date: s.date,
            label: s.label.clone(),
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// The roster as it stood on `as_of`.
///
/// Athletes with session history have their test fields rebuilt from the
/// sessions dated on or before `as_of`, applied oldest first so later values
/// win. Athletes without any sessions keep their current values. Identity
/// fields are never touched.
pub fn snapshot_as_of(dataset: &RawDataset, as_of: NaiveDate) -> RawDataset {
    let mut by_athlete: BTreeMap<&str, Vec<&TestSession>> = BTreeMap::new();
    for session in &dataset.sessions {
        by_athlete
            .entry(session.athlete_id.trim())
            .or_default()
            .push(session);
    }
    for sessions in by_athlete.values_mut() {
        sessions.sort_by_key(|s| s.date);
    }

    let mut snapshot = dataset.clone();
    for athlete in &mut snapshot.athletes {
        let Some(id) = parse_text(athlete.id.as_ref()) else {
            continue;
        };
        let Some(sessions) = by_athlete.get(id.as_str()) else {
            continue;
        };

        for field in RawAthlete::TEST_FIELDS {
            if let Some(slot) = athlete.test_field_mut(field) {
                *slot = None;
            }
        }
        for session in sessions.iter().filter(|s| s.date <= as_of) {
            for (field, value) in &session.values {
                match athlete.test_field_mut(field) {
                    Some(slot) => *slot = Some(value.clone()),
                    None => debug!(athlete = %id, %field, "ignoring unknown session field"),
                }
            }
        }
    }
    snapshot
}
