// Unit conversions and sprint/power kinematics.
//
// Everything here works at full precision; rounding happens where the
// athlete record stores a value. Formulas that divide return `None` when the
// denominator is non-positive or the result is not finite.

use crate::config::Constants;

/// Pounds to kilograms.
pub fn lb_to_kg(lb: f64, c: &Constants) -> f64 {
    lb * c.lb_to_kg
}

/// Kilograms to pounds.
pub fn kg_to_lb(kg: f64, c: &Constants) -> Option<f64> {
    safe_div(kg, c.lb_to_kg)
}

/// Inches to centimetres.
pub fn in_to_cm(inches: f64, c: &Constants) -> f64 {
    inches * c.in_to_cm
}

/// Metres per second to miles per hour.
pub fn mps_to_mph(mps: f64, c: &Constants) -> f64 {
    mps * c.mps_to_mph
}

/// `numerator / denominator`, or `None` when the denominator is not positive.
pub fn safe_div(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator <= 0.0 || !denominator.is_finite() {
        return None;
    }
    let q = numerator / denominator;
    q.is_finite().then_some(q)
}

/// Mean velocity over a split (m/s).
pub fn velocity(distance_m: f64, time_s: f64) -> Option<f64> {
    safe_div(distance_m, time_s)
}

/// Mean acceleration over a split from the change in velocity (m/s^2).
/// The first split starts from standstill, i.e. `v_prev = 0`.
pub fn acceleration(v_prev: f64, v: f64, time_s: f64) -> Option<f64> {
    safe_div(v - v_prev, time_s)
}

/// Newton's second law (N).
pub fn force(mass_kg: f64, accel: f64) -> f64 {
    mass_kg * accel
}

/// Impulse over a split (N*s).
pub fn impulse(force_n: f64, time_s: f64) -> f64 {
    force_n * time_s
}

/// Linear momentum (kg*m/s).
pub fn momentum(mass_kg: f64, v: f64) -> f64 {
    mass_kg * v
}

/// Mechanical power (W).
pub fn power(force_n: f64, v: f64) -> f64 {
    force_n * v
}

/// Sayers lower-body peak power estimate (W) from jump height and body mass,
/// clamped at zero for very small athletes or jumps.
pub fn sayers_peak_power(vert_cm: f64, mass_kg: f64, c: &Constants) -> f64 {
    (c.sayers_a * vert_cm + c.sayers_b * mass_kg + c.sayers_c).max(0.0)
}

/// Share of squat strength expressed as first-split sprint force:
/// `F1 / (squat_kg * g)`.
pub fn strength_utilization(f1: f64, squat_kg: f64, c: &Constants) -> Option<f64> {
    safe_div(f1, squat_kg * c.g)
}

/// Largest of the present values; `None` if none are present.
pub fn max_present<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values.into_iter().flatten().reduce(f64::max)
}
