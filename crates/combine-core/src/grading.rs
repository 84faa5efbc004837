// Absolute grading against the standards registry.
//
// A grade compares one athlete's value with the thresholds for their sport
// and position group, optionally scaled for school grade and body profile.
// Scores always run 1 (lowest) to 5 (highest) whatever the metric's
// direction, so they can be averaged into an overall grade.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::standards::{Metric, Registry, Sport, Thresholds};
use crate::stats::round_to;

/// Minimum graded metrics before an overall grade is reported.
pub const MIN_GRADED_METRICS: usize = 3;

// ---------------------------------------------------------------------------
// Grade tiers
// ---------------------------------------------------------------------------

/// Absolute-standard tier, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeTier {
    Elite,
    Excellent,
    Good,
    Average,
    Below,
}

impl GradeTier {
    /// Tiers in threshold order: the i-th threshold admits the i-th tier.
    const BY_THRESHOLD: [GradeTier; 4] = [
        GradeTier::Elite,
        GradeTier::Excellent,
        GradeTier::Good,
        GradeTier::Average,
    ];

    pub fn score(&self) -> u8 {
        match self {
            GradeTier::Elite => 5,
            GradeTier::Excellent => 4,
            GradeTier::Good => 3,
            GradeTier::Average => 2,
            GradeTier::Below => 1,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GradeTier::Elite => "Elite",
            GradeTier::Excellent => "Excellent",
            GradeTier::Good => "Good",
            GradeTier::Average => "Average",
            GradeTier::Below => "Below Average",
        }
    }

    /// Tier for an averaged score (>= 4.5 / 3.5 / 2.5 / 1.5).
    pub fn from_score(score: f64) -> Self {
        if score >= 4.5 {
            GradeTier::Elite
        } else if score >= 3.5 {
            GradeTier::Excellent
        } else if score >= 2.5 {
            GradeTier::Good
        } else if score >= 1.5 {
            GradeTier::Average
        } else {
            GradeTier::Below
        }
    }
}

/// One metric's absolute grade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GradeResult {
    pub tier: GradeTier,
    pub label: &'static str,
    pub score: u8,
}

impl From<GradeTier> for GradeResult {
    fn from(tier: GradeTier) -> Self {
        GradeResult {
            tier,
            label: tier.label(),
            score: tier.score(),
        }
    }
}

/// Average of an athlete's grades.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverallGrade {
    /// Mean tier score, one decimal.
    pub score: f64,
    pub label: &'static str,
    pub tier: GradeTier,
    /// Number of metrics averaged.
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Grading
// ---------------------------------------------------------------------------

/// Who is being graded, and which adjustments apply.
#[derive(Debug, Clone, Copy)]
pub struct GradeContext<'a> {
    pub sport: Option<Sport>,
    pub group: &'a str,
    pub grade: Option<u8>,
    pub weight_lb: Option<f64>,
    pub height_in: Option<f64>,
    pub age_adjusted: bool,
    pub body_adjusted: bool,
}

/// Thresholds for `metric` after age and body scaling, rounded to two
/// decimals. Factors compose multiplicatively; thresholds are multiplied by
/// the combined factor for normal metrics and divided for inverted ones.
/// `None` when the registry has no entry for the sport/group/metric.
pub fn adjusted_thresholds(
    registry: &Registry,
    metric: Metric,
    ctx: &GradeContext<'_>,
) -> Option<Thresholds> {
    let base = *registry.thresholds(ctx.sport, ctx.group, metric)?;
    let standards = &registry.standards;

    let mut factor = 1.0;
    if ctx.age_adjusted {
        if let Some(f) = ctx
            .grade
            .and_then(|g| standards.age_factor(g, metric.invert()))
        {
            factor *= f;
        }
    }
    if ctx.body_adjusted {
        if let Some(f) = standards.body_factor(metric, ctx.weight_lb, ctx.height_in) {
            factor *= f;
        }
    }

    let invert = metric.invert();
    Some(base.map(|t| {
        let scaled = if invert { t / factor } else { t * factor };
        round_to(scaled, 2)
    }))
}

/// Grade a single value. Returns `None` when the value is missing or no
/// standard exists for the athlete's sport, group and metric.
pub fn grade_value(
    registry: &Registry,
    value: Option<f64>,
    metric: Metric,
    ctx: &GradeContext<'_>,
) -> Option<GradeResult> {
    let value = value?;
    let thresholds = adjusted_thresholds(registry, metric, ctx)?;
    let invert = metric.invert();

    let tier = GradeTier::BY_THRESHOLD
        .into_iter()
        .zip(thresholds)
        .find(|(_, t)| if invert { value <= *t } else { value >= *t })
        .map(|(tier, _)| tier)
        .unwrap_or(GradeTier::Below);

    Some(tier.into())
}

/// Average the individual grades. `None` below [`MIN_GRADED_METRICS`].
pub fn overall_grade(grades: &BTreeMap<Metric, GradeResult>) -> Option<OverallGrade> {
    let count = grades.len();
    if count < MIN_GRADED_METRICS {
        return None;
    }
    let total: u32 = grades.values().map(|g| g.score as u32).sum();
    let score = round_to(total as f64 / count as f64, 1);
    let tier = GradeTier::from_score(score);
    Some(OverallGrade {
        score,
        label: tier.label(),
        tier,
        count,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
