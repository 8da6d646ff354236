//! Weighted-voting rule engine deciding cassava vs not-cassava.
//!
//! The rule set is a fixed table of checks, each contributing points to one of
//! two score buckets and optionally counting as a passed cassava identifier.
//! The thresholds are empirically tuned constants carried over verbatim; they
//! are deliberately not "corrected", since the verdict must stay reproducible
//! against the reference behavior.

use serde::{Deserialize, Serialize};

use crate::color::ColorReport;
use crate::morphology::MorphologyReport;
use crate::texture::TextureReport;

/// Fraction of passed checks required to call the image cassava.
pub const CASSAVA_RATIO_THRESHOLD: f64 = 0.6;
/// Ratio at or above which confidence is boosted by 0.2 (capped at 1.0).
pub const BOOST_RATIO: f64 = 0.8;
/// Ratio at or below which confidence is floored at 0.7.
pub const FLOOR_RATIO: f64 = 0.3;

const COMPACTNESS_RANGE: (f64, f64) = (10.0, 20.0);
const BROAD_ASPECT_RATIO: f64 = 2.5;
const NARROW_ASPECT_RATIO: f64 = 3.0;
const SOLIDITY_RANGE: (f64, f64) = (0.6, 0.9);
const GREEN_DOMINANCE_HIGH: f64 = 1.8;
const GREEN_DOMINANCE_LOW: f64 = 1.2;
const UNIFORMITY_MAX: f64 = 40.0;
const ROUGHNESS_RANGE: (f64, f64) = (50.0, 200.0);
const ROUGHNESS_SMOOTH: f64 = 20.0;
const EDGE_DENSITY_MIN: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafType {
    Cassava,
    NotCassava,
    Unknown,
}

/// Raw vote totals for the two outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub cassava: u32,
    pub not_cassava: u32,
}

/// One evaluated check, kept for the diagnostic breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRecord {
    pub name: String,
    pub passed: bool,
    pub cassava_points: u32,
    pub not_cassava_points: u32,
}

/// Classification verdict with its contributing-factor breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationVerdict {
    pub predicted_type: LeafType,
    /// In `[0, 1]`.
    pub confidence: f64,
    pub scores: Scores,
    /// Count of checks that passed as cassava identifiers.
    pub cassava_identifiers: u32,
    /// Count of checks that were applicable and evaluated.
    pub total_checks: u32,
    /// `cassava_identifiers / total_checks`, 0 when nothing was evaluated.
    pub cassava_ratio: f64,
    pub breakdown: Vec<CheckRecord>,
}

/// The three feature reports a verdict is computed from.
#[derive(Debug, Clone, Copy)]
pub struct FeatureSet<'a> {
    pub morphology: Option<&'a MorphologyReport>,
    pub color: &'a ColorReport,
    pub texture: &'a TextureReport,
}

/// Outcome of one applicable check.
struct Outcome {
    passed: bool,
    cassava: u32,
    not_cassava: u32,
}

impl Outcome {
    const fn pass(cassava: u32) -> Self {
        Self {
            passed: true,
            cassava,
            not_cassava: 0,
        }
    }

    const fn fail(not_cassava: u32) -> Self {
        Self {
            passed: false,
            cassava: 0,
            not_cassava,
        }
    }
}

/// One row of the rule table. `eval` returns `None` when the check does not
/// apply (its report is absent), in which case it contributes nothing, not
/// even to the check count.
struct Check {
    name: &'static str,
    eval: fn(&FeatureSet) -> Option<Outcome>,
}

/// Palmate lobed structure within the cassava compactness window.
fn check_palmate_lobes(f: &FeatureSet) -> Option<Outcome> {
    let m = f.morphology?;
    Some(if m.is_lobed && m.is_palmate {
        if m.compactness > COMPACTNESS_RANGE.0 && m.compactness < COMPACTNESS_RANGE.1 {
            Outcome::pass(3)
        } else {
            Outcome::fail(2)
        }
    } else {
        Outcome::fail(3)
    })
}

/// Broad leaves pass; long narrow shapes vote against. The band between the
/// two thresholds counts as an evaluated check that awards nothing.
fn check_aspect_ratio(f: &FeatureSet) -> Option<Outcome> {
    let m = f.morphology?;
    Some(if m.aspect_ratio < BROAD_ASPECT_RATIO {
        Outcome::pass(2)
    } else if m.aspect_ratio > NARROW_ASPECT_RATIO {
        Outcome::fail(3)
    } else {
        Outcome::fail(0)
    })
}

/// Lobed structure is complex but not hollow: mid-range solidity.
fn check_solidity(f: &FeatureSet) -> Option<Outcome> {
    let m = f.morphology?;
    Some(
        if m.solidity > SOLIDITY_RANGE.0 && m.solidity < SOLIDITY_RANGE.1 {
            Outcome::pass(1)
        } else {
            Outcome::fail(0)
        },
    )
}

/// Strong green dominance plus a healthy green tone.
fn check_green_dominance(f: &FeatureSet) -> Option<Outcome> {
    let c = f.color;
    Some(
        if c.green_dominance > GREEN_DOMINANCE_HIGH && c.is_healthy_green {
            Outcome::pass(2)
        } else if c.green_dominance < GREEN_DOMINANCE_LOW {
            Outcome::fail(2)
        } else {
            Outcome::fail(0)
        },
    )
}

/// Uniform coloring across the region.
fn check_color_uniformity(f: &FeatureSet) -> Option<Outcome> {
    Some(if f.color.color_uniformity < UNIFORMITY_MAX {
        Outcome::pass(1)
    } else {
        Outcome::fail(0)
    })
}

/// Moderately rough surface; very smooth surfaces vote against.
fn check_roughness(f: &FeatureSet) -> Option<Outcome> {
    let roughness = f.texture.texture_roughness();
    Some(
        if roughness > ROUGHNESS_RANGE.0 && roughness < ROUGHNESS_RANGE.1 {
            Outcome::pass(2)
        } else if roughness < ROUGHNESS_SMOOTH {
            Outcome::fail(2)
        } else {
            Outcome::fail(0)
        },
    )
}

/// Lobed margins leave a dense edge map.
fn check_edge_density(f: &FeatureSet) -> Option<Outcome> {
    Some(if f.texture.edge_density > EDGE_DENSITY_MIN {
        Outcome::pass(1)
    } else {
        Outcome::fail(0)
    })
}

/// The ordered rule table. Adding a check is adding a row; the scoring loop
/// below never changes.
const CHECKS: &[Check] = &[
    Check {
        name: "palmate_lobes",
        eval: check_palmate_lobes,
    },
    Check {
        name: "aspect_ratio",
        eval: check_aspect_ratio,
    },
    Check {
        name: "solidity",
        eval: check_solidity,
    },
    Check {
        name: "green_dominance",
        eval: check_green_dominance,
    },
    Check {
        name: "color_uniformity",
        eval: check_color_uniformity,
    },
    Check {
        name: "edge_roughness",
        eval: check_roughness,
    },
    Check {
        name: "edge_density",
        eval: check_edge_density,
    },
];

/// Run the rule table over the three reports and assemble a verdict.
///
/// Pure arithmetic over already-validated reports; an absent morphology
/// report simply removes its checks from the evaluated set.
pub fn classify(
    morphology: Option<&MorphologyReport>,
    color: &ColorReport,
    texture: &TextureReport,
) -> ClassificationVerdict {
    let features = FeatureSet {
        morphology,
        color,
        texture,
    };

    let mut scores = Scores::default();
    let mut identifiers = 0u32;
    let mut total = 0u32;
    let mut breakdown = Vec::with_capacity(CHECKS.len());

    for check in CHECKS {
        let Some(outcome) = (check.eval)(&features) else {
            continue;
        };
        total += 1;
        if outcome.passed {
            identifiers += 1;
        }
        scores.cassava += outcome.cassava;
        scores.not_cassava += outcome.not_cassava;
        breakdown.push(CheckRecord {
            name: check.name.to_string(),
            passed: outcome.passed,
            cassava_points: outcome.cassava,
            not_cassava_points: outcome.not_cassava,
        });
    }

    let mut verdict = verdict_from_counts(identifiers, total);
    verdict.scores = scores;
    verdict.breakdown = breakdown;
    verdict
}

/// Decision rule over the identifier counts, separated out so the threshold,
/// boost and floor arithmetic is testable without any feature extraction.
pub(crate) fn verdict_from_counts(identifiers: u32, total: u32) -> ClassificationVerdict {
    if total == 0 {
        return ClassificationVerdict {
            predicted_type: LeafType::Unknown,
            confidence: 0.0,
            scores: Scores::default(),
            cassava_identifiers: 0,
            total_checks: 0,
            cassava_ratio: 0.0,
            breakdown: Vec::new(),
        };
    }

    let ratio = f64::from(identifiers) / f64::from(total);
    let (predicted_type, mut confidence) = if ratio >= CASSAVA_RATIO_THRESHOLD {
        (LeafType::Cassava, ratio)
    } else {
        (LeafType::NotCassava, 1.0 - ratio)
    };

    if ratio >= BOOST_RATIO {
        confidence = (confidence + 0.2).min(1.0);
    } else if ratio <= FLOOR_RATIO {
        confidence = confidence.max(0.7);
    }

    ClassificationVerdict {
        predicted_type,
        confidence,
        scores: Scores::default(),
        cassava_identifiers: identifiers,
        total_checks: total,
        cassava_ratio: ratio,
        breakdown: Vec::new(),
    }
}
