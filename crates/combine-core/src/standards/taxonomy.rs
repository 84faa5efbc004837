// Sports and the position-code -> position-group taxonomy.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::StandardsError;

/// Group assigned to positions the taxonomy does not list.
pub const OTHER_GROUP: &str = "Other";

/// A supported sport. Each has its own taxonomy and standards table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sport {
    Football,
    Soccer,
    Baseball,
    Basketball,
}

impl Sport {
    pub const ALL: [Sport; 4] = [
        Sport::Football,
        Sport::Soccer,
        Sport::Baseball,
        Sport::Basketball,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Sport::Football => "Football",
            Sport::Soccer => "Soccer",
            Sport::Baseball => "Baseball",
            Sport::Basketball => "Basketball",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn parse(name: &str) -> Option<Sport> {
        let name = name.trim();
        Sport::ALL
            .into_iter()
            .find(|s| s.name().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for Sport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One position group and the codes that fold into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionGroup {
    pub group: String,
    pub positions: Vec<String>,
}

/// Per-sport position groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PositionTaxonomy {
    sports: BTreeMap<Sport, Vec<PositionGroup>>,
}

impl PositionTaxonomy {
    /// Parse and validate a positions TOML document.
    pub fn from_toml(text: &str) -> Result<Self, StandardsError> {
        let raw: BTreeMap<String, Vec<PositionGroup>> =
            toml::from_str(text).map_err(|e| StandardsError::Parse {
                what: "positions",
                source: e,
            })?;

        let mut sports = BTreeMap::new();
        for (name, groups) in raw {
            let sport =
                Sport::parse(&name).ok_or_else(|| StandardsError::UnknownSport(name.clone()))?;

            let mut seen = BTreeSet::new();
            let mut normalized = Vec::with_capacity(groups.len());
            for group in groups {
                let mut positions = Vec::with_capacity(group.positions.len());
                for code in group.positions {
                    let code = code.trim().to_ascii_uppercase();
                    if !seen.insert(code.clone()) {
                        return Err(StandardsError::DuplicatePosition {
                            sport: sport.name().to_string(),
                            position: code,
                        });
                    }
                    positions.push(code);
                }
                normalized.push(PositionGroup {
                    group: group.group,
                    positions,
                });
            }
            sports.insert(sport, normalized);
        }

        Ok(PositionTaxonomy { sports })
    }

    /// Fold a position code into its group, or "Other" when the sport or
    /// position is unknown.
    pub fn group_for(&self, sport: Option<Sport>, position: Option<&str>) -> &str {
        let (Some(sport), Some(position)) = (sport, position) else {
            return OTHER_GROUP;
        };
        let code = position.trim();
        self.sports
            .get(&sport)
            .and_then(|groups| {
                groups.iter().find(|g| {
                    g.positions
                        .iter()
                        .any(|p| p.eq_ignore_ascii_case(code))
                })
            })
            .map(|g| g.group.as_str())
            .unwrap_or(OTHER_GROUP)
    }

    /// Groups defined for a sport, in table order.
    pub fn groups(&self, sport: Sport) -> &[PositionGroup] {
        self.sports.get(&sport).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taxonomy() -> PositionTaxonomy {
        PositionTaxonomy::from_toml(include_str!("../../data/positions.toml")).unwrap()
    }

    #[test]
    fn football_positions_fold_into_groups() {
        let t = taxonomy();
        let fb = Some(Sport::Football);
        assert_eq!(t.group_for(fb, Some("RB")), "Skill");
        assert_eq!(t.group_for(fb, Some("wr")), "Skill");
        assert_eq!(t.group_for(fb, Some(" DB ")), "Skill");
        assert_eq!(t.group_for(fb, Some("QB")), "Big Skill");
        assert_eq!(t.group_for(fb, Some("LB")), "Big Skill");
        assert_eq!(t.group_for(fb, Some("OL")), "Linemen");
        assert_eq!(t.group_for(fb, Some("DL")), "Linemen");
    }

    #[test]
    fn same_code_differs_by_sport() {
        let t = taxonomy();
        assert_eq!(t.group_for(Some(Sport::Baseball), Some("C")), "Infield");
        assert_eq!(t.group_for(Some(Sport::Basketball), Some("C")), "Bigs");
        assert_eq!(t.group_for(Some(Sport::Football), Some("C")), "Linemen");
    }

    #[test]
    fn unknown_or_missing_folds_to_other() {
        let t = taxonomy();
        assert_eq!(t.group_for(Some(Sport::Football), Some("K")), OTHER_GROUP);
        assert_eq!(t.group_for(Some(Sport::Football), None), OTHER_GROUP);
        assert_eq!(t.group_for(None, Some("RB")), OTHER_GROUP);
    }

    #[test]
    fn every_sport_has_two_or_three_groups() {
        let t = taxonomy();
        for sport in Sport::ALL {
            let n = t.groups(sport).len();
            assert!((2..=3).contains(&n), "{sport} has {n} groups");
        }
    }

    #[test]
    fn sport_parse_is_case_insensitive() {
        assert_eq!(Sport::parse("football"), Some(Sport::Football));
        assert_eq!(Sport::parse(" BASKETBALL "), Some(Sport::Basketball));
        assert_eq!(Sport::parse("cricket"), None);
    }

    #[test]
    fn rejects_duplicate_position_codes() {
        let text = r#"
[[Football]]
group = "Skill"
positions = ["RB", "WR"]

[[Football]]
group = "Big Skill"
positions = ["rb"]
"#;
        let err = PositionTaxonomy::from_toml(text).unwrap_err();
        assert!(matches!(err, StandardsError::DuplicatePosition { .. }));
    }

    #[test]
    fn rejects_unknown_sport() {
        let text = "[[Cricket]]\ngroup = \"Bowlers\"\npositions = [\"B\"]\n";
        let err = PositionTaxonomy::from_toml(text).unwrap_err();
        assert!(matches!(err, StandardsError::UnknownSport(s) if s == "Cricket"));
    }
}
