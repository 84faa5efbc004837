// Raw roster entries and the per-athlete derived record.
//
// `build_record` turns one raw entry into an `AthleteRecord` holding every
// value that depends only on that athlete: unit conversions, sprint
// kinematics, strength ratios and peak power. Population-relative fields are
// added later by the analytics pass.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Constants;
use crate::parse::{parse_grade, parse_number, parse_text};
use crate::physics;
use crate::standards::{Metric, Registry, Sport};
use crate::stats::{round_opt, round_to};

// ---------------------------------------------------------------------------
// Raw input
// ---------------------------------------------------------------------------

/// One roster entry as supplied by the caller. Every field is optional and
/// loosely typed; `build_record` does the parsing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAthlete {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub position: Option<Value>,
    #[serde(default)]
    pub sport: Option<Value>,
    #[serde(default)]
    pub grade: Option<Value>,
    #[serde(default)]
    pub height_in: Option<Value>,
    #[serde(default)]
    pub weight_lb: Option<Value>,
    #[serde(default)]
    pub bench_1rm: Option<Value>,
    #[serde(default)]
    pub squat_1rm: Option<Value>,
    #[serde(default)]
    pub medball_in: Option<Value>,
    #[serde(default)]
    pub vert_in: Option<Value>,
    #[serde(default)]
    pub broad_in: Option<Value>,
    #[serde(default)]
    pub sprint_020: Option<Value>,
    #[serde(default)]
    pub sprint_2030: Option<Value>,
    #[serde(default)]
    pub sprint_3040: Option<Value>,
    #[serde(default)]
    pub pro_agility: Option<Value>,
    #[serde(default)]
    pub l_drill: Option<Value>,
}

impl RawAthlete {
    /// Names of the measured test fields, as they appear in roster documents.
    pub const TEST_FIELDS: [&'static str; 12] = [
        "height_in",
        "weight_lb",
        "bench_1rm",
        "squat_1rm",
        "medball_in",
        "vert_in",
        "broad_in",
        "sprint_020",
        "sprint_2030",
        "sprint_3040",
        "pro_agility",
        "l_drill",
    ];

    /// Mutable access to a test field by document name.
    pub fn test_field_mut(&mut self, name: &str) -> Option<&mut Option<Value>> {
        let field = match name {
            "height_in" => &mut self.height_in,
            "weight_lb" => &mut self.weight_lb,
            "bench_1rm" => &mut self.bench_1rm,
            "squat_1rm" => &mut self.squat_1rm,
            "medball_in" => &mut self.medball_in,
            "vert_in" => &mut self.vert_in,
            "broad_in" => &mut self.broad_in,
            "sprint_020" => &mut self.sprint_020,
            "sprint_2030" => &mut self.sprint_2030,
            "sprint_3040" => &mut self.sprint_3040,
            "pro_agility" => &mut self.pro_agility,
            "l_drill" => &mut self.l_drill,
            _ => return None,
        };
        Some(field)
    }
}

// ---------------------------------------------------------------------------
// Derived record
// ---------------------------------------------------------------------------

/// Parsed raw measurements, serialized under their roster names.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TestInputs {
    pub height_in: Option<f64>,
    pub weight_lb: Option<f64>,
    pub bench_1rm: Option<f64>,
    pub squat_1rm: Option<f64>,
    pub medball_in: Option<f64>,
    pub vert_in: Option<f64>,
    pub broad_in: Option<f64>,
    pub sprint_020: Option<f64>,
    pub sprint_2030: Option<f64>,
    pub sprint_3040: Option<f64>,
    pub pro_agility: Option<f64>,
    pub l_drill: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitConversions {
    pub mass_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub vert_cm: Option<f64>,
    pub broad_cm: Option<f64>,
    pub bench_kg: Option<f64>,
    pub squat_kg: Option<f64>,
}

/// Per-split sprint kinematics. Split 1 is 0-20 yd, splits 2 and 3 are the
/// 20-30 and 30-40 yd windows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintKinematics {
    pub v1: Option<f64>,
    pub v2: Option<f64>,
    pub v3: Option<f64>,
    pub v_max: Option<f64>,
    /// Best pure 10-yard window (splits 2 and 3 only).
    pub v10_max: Option<f64>,
    pub top_mph: Option<f64>,
    pub a1: Option<f64>,
    pub a2: Option<f64>,
    pub a3: Option<f64>,
    #[serde(rename = "F1")]
    pub f1: Option<f64>,
    #[serde(rename = "F2")]
    pub f2: Option<f64>,
    #[serde(rename = "F3")]
    pub f3: Option<f64>,
    pub imp1: Option<f64>,
    pub imp2: Option<f64>,
    pub imp3: Option<f64>,
    pub mom1: Option<f64>,
    pub mom2: Option<f64>,
    pub mom3: Option<f64>,
    pub mom_max: Option<f64>,
    pub pow1: Option<f64>,
    pub pow2: Option<f64>,
    pub pow3: Option<f64>,
    pub forty: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrengthMetrics {
    pub rel_bench: Option<f64>,
    pub rel_squat: Option<f64>,
    pub mb_rel: Option<f64>,
    pub peak_power: Option<f64>,
    pub rel_peak_power: Option<f64>,
    pub strength_util: Option<f64>,
}

/// Everything derivable from a single athlete's own measurements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AthleteRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub position: Option<String>,
    pub sport: Option<Sport>,
    pub grade: Option<u8>,
    /// Position group from the taxonomy ("Other" when unmapped).
    pub group: String,
    #[serde(flatten)]
    pub inputs: TestInputs,
    #[serde(flatten)]
    pub units: UnitConversions,
    #[serde(flatten)]
    pub sprint: SprintKinematics,
    #[serde(flatten)]
    pub strength: StrengthMetrics,
}

impl AthleteRecord {
    /// Value of a ranked/graded metric, if present.
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Bench => self.inputs.bench_1rm,
            Metric::Squat => self.inputs.squat_1rm,
            Metric::RelBench => self.strength.rel_bench,
            Metric::RelSquat => self.strength.rel_squat,
            Metric::Medball => self.inputs.medball_in,
            Metric::MbRel => self.strength.mb_rel,
            Metric::Vert => self.inputs.vert_in,
            Metric::Broad => self.inputs.broad_in,
            Metric::Forty => self.sprint.forty,
            Metric::Sprint020 => self.inputs.sprint_020,
            Metric::VMax => self.sprint.v_max,
            Metric::V10Max => self.sprint.v10_max,
            Metric::PeakPower => self.strength.peak_power,
            Metric::RelPeakPower => self.strength.rel_peak_power,
            Metric::MomMax => self.sprint.mom_max,
        }
    }

    /// Display name for messages: name, then id, then a placeholder.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("(unnamed)")
    }
}

impl AsRef<AthleteRecord> for AthleteRecord {
    fn as_ref(&self) -> &AthleteRecord {
        self
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Build the per-athlete record. Never fails: unparseable inputs become
/// `None`, and any derived value whose inputs are missing stays `None`.
///
/// `default_sport` applies when the athlete carries no sport of their own.
pub fn build_record(
    raw: &RawAthlete,
    constants: &Constants,
    registry: &Registry,
    default_sport: Option<Sport>,
) -> AthleteRecord {
    let id = parse_text(raw.id.as_ref());
    let name = parse_text(raw.name.as_ref());
    let position = parse_text(raw.position.as_ref());
    let sport = match parse_text(raw.sport.as_ref()) {
        Some(s) => Sport::parse(&s),
        None => default_sport,
    };
    let grade = parse_grade(raw.grade.as_ref());
    let group = registry
        .position_group(sport, position.as_deref())
        .to_string();

    let num = |v: &Option<Value>| parse_number(v.as_ref());
    let inputs = TestInputs {
        height_in: num(&raw.height_in),
        weight_lb: num(&raw.weight_lb),
        bench_1rm: num(&raw.bench_1rm),
        squat_1rm: num(&raw.squat_1rm),
        medball_in: num(&raw.medball_in),
        vert_in: num(&raw.vert_in),
        broad_in: num(&raw.broad_in),
        sprint_020: num(&raw.sprint_020),
        sprint_2030: num(&raw.sprint_2030),
        sprint_3040: num(&raw.sprint_3040),
        pro_agility: num(&raw.pro_agility),
        l_drill: num(&raw.l_drill),
    };

    // Full-precision intermediates; rounding only when stored.
    let mass = inputs.weight_lb.map(|lb| physics::lb_to_kg(lb, constants));
    let vert_cm = inputs.vert_in.map(|v| physics::in_to_cm(v, constants));
    let squat_kg = inputs.squat_1rm.map(|s| physics::lb_to_kg(s, constants));

    let units = UnitConversions {
        mass_kg: round_opt(mass, 2),
        height_cm: round_opt(inputs.height_in.map(|h| physics::in_to_cm(h, constants)), 1),
        vert_cm: round_opt(vert_cm, 1),
        broad_cm: round_opt(inputs.broad_in.map(|b| physics::in_to_cm(b, constants)), 1),
        bench_kg: round_opt(inputs.bench_1rm.map(|b| physics::lb_to_kg(b, constants)), 1),
        squat_kg: round_opt(squat_kg, 1),
    };

    let (sprint, f1) = build_sprint(&inputs, mass, constants);
    let strength = build_strength(&inputs, mass, vert_cm, squat_kg, f1, constants);

    AthleteRecord {
        id,
        name,
        position,
        sport,
        grade,
        group,
        inputs,
        units,
        sprint,
        strength,
    }
}

/// Sprint chain: velocities -> accelerations -> forces -> impulse, momentum,
/// power. Returns the unrounded first-split force for strength utilization.
fn build_sprint(
    inputs: &TestInputs,
    mass: Option<f64>,
    c: &Constants,
) -> (SprintKinematics, Option<f64>) {
    let t1 = inputs.sprint_020;
    let t2 = inputs.sprint_2030;
    let t3 = inputs.sprint_3040;

    let v1 = t1.and_then(|t| physics::velocity(c.twenty_yd_m, t));
    let v2 = t2.and_then(|t| physics::velocity(c.ten_yd_m, t));
    let v3 = t3.and_then(|t| physics::velocity(c.ten_yd_m, t));

    let a1 = v1.zip(t1).and_then(|(v, t)| physics::acceleration(0.0, v, t));
    let a2 = v1
        .zip(v2)
        .zip(t2)
        .and_then(|((prev, v), t)| physics::acceleration(prev, v, t));
    let a3 = v2
        .zip(v3)
        .zip(t3)
        .and_then(|((prev, v), t)| physics::acceleration(prev, v, t));

    let force = |a: Option<f64>| mass.zip(a).map(|(m, a)| physics::force(m, a));
    let f1 = force(a1);
    let f2 = force(a2);
    let f3 = force(a3);

    let impulse = |f: Option<f64>, t: Option<f64>| f.zip(t).map(|(f, t)| physics::impulse(f, t));
    let momentum = |v: Option<f64>| mass.zip(v).map(|(m, v)| physics::momentum(m, v));
    let power = |f: Option<f64>, v: Option<f64>| f.zip(v).map(|(f, v)| physics::power(f, v));

    let v_max = physics::max_present([v1, v2, v3]);
    let v10_max = physics::max_present([v2, v3]);

    let forty = match (t1, t2, t3) {
        (Some(a), Some(b), Some(c)) => Some(round_to(a + b + c, 2)),
        _ => None,
    };

    let sprint = SprintKinematics {
        v1: round_opt(v1, 3),
        v2: round_opt(v2, 3),
        v3: round_opt(v3, 3),
        v_max: round_opt(v_max, 3),
        v10_max: round_opt(v10_max, 3),
        top_mph: round_opt(v_max.map(|v| physics::mps_to_mph(v, c)), 2),
        a1: round_opt(a1, 3),
        a2: round_opt(a2, 3),
        a3: round_opt(a3, 3),
        f1: round_opt(f1, 1),
        f2: round_opt(f2, 1),
        f3: round_opt(f3, 1),
        imp1: round_opt(impulse(f1, t1), 2),
        imp2: round_opt(impulse(f2, t2), 2),
        imp3: round_opt(impulse(f3, t3), 2),
        mom1: round_opt(momentum(v1), 1),
        mom2: round_opt(momentum(v2), 1),
        mom3: round_opt(momentum(v3), 1),
        mom_max: round_opt(momentum(v10_max), 1),
        pow1: round_opt(power(f1, v1), 0),
        pow2: round_opt(power(f2, v2), 0),
        pow3: round_opt(power(f3, v3), 0),
        forty,
    };
    (sprint, f1)
}

fn build_strength(
    inputs: &TestInputs,
    mass: Option<f64>,
    vert_cm: Option<f64>,
    squat_kg: Option<f64>,
    f1: Option<f64>,
    c: &Constants,
) -> StrengthMetrics {
    let per_bodyweight = |v: Option<f64>| {
        v.zip(inputs.weight_lb)
            .and_then(|(v, w)| physics::safe_div(v, w))
    };

    let peak_power = vert_cm
        .zip(mass)
        .map(|(v, m)| physics::sayers_peak_power(v, m, c));
    // Stored at 0dp; a value that rounds to zero has no relative power.
    let rel_peak_power = peak_power
        .filter(|p| round_to(*p, 0) > 0.0)
        .zip(mass)
        .and_then(|(p, m)| physics::safe_div(p, m));
    let strength_util = f1
        .zip(squat_kg)
        .and_then(|(f, s)| physics::strength_utilization(f, s, c));

    StrengthMetrics {
        rel_bench: round_opt(per_bodyweight(inputs.bench_1rm), 2),
        rel_squat: round_opt(per_bodyweight(inputs.squat_1rm), 2),
        mb_rel: round_opt(per_bodyweight(inputs.medball_in), 2),
        peak_power: round_opt(peak_power, 0),
        rel_peak_power: round_opt(rel_peak_power, 2),
        strength_util: round_opt(strength_util, 3),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
