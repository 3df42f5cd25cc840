//! Grade aggregation.
//!
//! Turns the matcher's per-expression levels into a single grade in `[0, 1]`,
//! a predicted CEFR band and a confidence score.
//!
//! The grade is a weighted mean of level ordinals over *known* expressions
//! only, normalized by 6 (the `C2` ordinal). Each level's share is weighted by
//! `ordinal ^ weight_exponent`; the default exponent of `1.02` gives `C2`
//! about 1.2x the pull of `A1`, enough to reward advanced vocabulary without
//! letting a handful of rare words dominate an elementary text.
//!
//! Confidence combines three factors, each in `[0, 1]`:
//!
//! | factor          | weight | meaning                                          |
//! |-----------------|--------|--------------------------------------------------|
//! | known ratio     | 0.4    | share of expressions found in any list           |
//! | concentration   | 0.4    | `1 - H / ln(k)` over the `k` levels present      |
//! | sample factor   | 0.2    | `ln(known + 1) / ln(51)`, saturating near 50     |

use std::collections::{BTreeMap, BTreeSet, HashSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::level::{ALL_LEVELS, CefrLevel, KNOWN_LEVELS};
use crate::matcher::WordMatch;

/// Default exponent applied to level ordinals when weighting.
pub const DEFAULT_WEIGHT_EXPONENT: f64 = 1.02;

/// Ordinal of the top level, used to normalize the grade.
const MAX_ORDINAL: f64 = 6.0;

/// Added inside `ln` when computing entropy.
const ENTROPY_EPSILON: f64 = 1e-10;

/// Known-token count at which the sample factor saturates.
const SAMPLE_SATURATION: f64 = 50.0;

const KNOWN_RATIO_WEIGHT: f64 = 0.4;
const CONCENTRATION_WEIGHT: f64 = 0.4;
const SAMPLE_WEIGHT: f64 = 0.2;

/// Tunable grading parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradingParams {
    /// Exponent applied to each level's ordinal when weighting its share.
    pub weight_exponent: f64,
}

impl Default for GradingParams {
    fn default() -> Self {
        Self {
            weight_exponent: DEFAULT_WEIGHT_EXPONENT,
        }
    }
}

impl GradingParams {
    /// Weight given to a level's share of known expressions.
    pub fn weight(&self, level: CefrLevel) -> f64 {
        f64::from(level.ordinal()).powf(self.weight_exponent)
    }
}

/// Counts describing the graded input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GradeStats {
    /// Number of matched expressions (multi-word expressions count once).
    pub total_words: usize,
    /// Number of distinct surface expressions.
    pub unique_words: usize,
    /// Expressions found in no list.
    pub unknown_words: usize,
    /// Length of the raw input, in characters.
    pub input_length: usize,
}

/// Result of grading one text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GradeReport {
    /// Normalized grade in `[0, 1]`.
    pub grade: f64,
    /// CEFR band the grade falls into.
    pub predicted_level: CefrLevel,
    /// Confidence in the prediction, in `[0, 1]`.
    pub confidence: f64,
    /// Share of expressions at each level, `A0` for unknown.
    pub probabilities: BTreeMap<CefrLevel, f64>,
    /// Input statistics.
    pub stats: GradeStats,
    /// Distinct matched expressions per level, sorted.
    pub found_expressions: BTreeMap<CefrLevel, BTreeSet<String>>,
}

/// Aggregate matcher output into a [`GradeReport`].
///
/// `input_length` is the character length of the raw text and is only
/// reported, never used in scoring.
#[tracing::instrument(skip_all, fields(matches = matches.len()))]
pub fn aggregate(matches: &[WordMatch], input_length: usize, params: &GradingParams) -> GradeReport {
    let total = matches.len();

    let mut freq: BTreeMap<CefrLevel, usize> = ALL_LEVELS.iter().map(|l| (*l, 0)).collect();
    for m in matches {
        *freq.entry(m.level.unwrap_or(CefrLevel::A0)).or_insert(0) += 1;
    }
    let count = |level: CefrLevel| freq.get(&level).copied().unwrap_or(0);

    let unknown = count(CefrLevel::A0);
    let known_total = total - unknown;

    let prob_known: BTreeMap<CefrLevel, f64> = KNOWN_LEVELS
        .iter()
        .map(|l| (*l, ratio(count(*l), known_total)))
        .collect();

    let probabilities: BTreeMap<CefrLevel, f64> = ALL_LEVELS
        .iter()
        .map(|l| (*l, ratio(count(*l), total)))
        .collect();

    let present: Vec<(CefrLevel, f64)> = prob_known
        .iter()
        .filter(|(_, p)| **p > 0.0)
        .map(|(l, p)| (*l, *p))
        .collect();

    let grade = weighted_grade(&present, params);
    let predicted_level = predicted_level(grade);
    let confidence = confidence(known_total, total, &present);

    let mut found_expressions: BTreeMap<CefrLevel, BTreeSet<String>> = BTreeMap::new();
    for m in matches {
        if let Some(level) = m.level {
            found_expressions
                .entry(level)
                .or_default()
                .insert(m.text.clone());
        }
    }

    let unique_words = matches
        .iter()
        .map(|m| m.text.as_str())
        .collect::<HashSet<_>>()
        .len();

    tracing::debug!(
        grade,
        predicted = %predicted_level,
        confidence,
        total,
        known_total,
        "graded"
    );

    GradeReport {
        grade,
        predicted_level,
        confidence,
        probabilities,
        stats: GradeStats {
            total_words: total,
            unique_words,
            unknown_words: unknown,
            input_length,
        },
        found_expressions,
    }
}

/// Map a grade in `[0, 1]` to a CEFR band.
///
/// Exactly `0.0` is `A0`; every other band is the half-open interval
/// `((k-1)/6, k/6]`.
pub fn predicted_level(grade: f64) -> CefrLevel {
    if grade <= 0.0 {
        return CefrLevel::A0;
    }
    for level in KNOWN_LEVELS {
        if grade <= f64::from(level.ordinal()) / MAX_ORDINAL {
            return level;
        }
    }
    CefrLevel::C2
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn weighted_grade(present: &[(CefrLevel, f64)], params: &GradingParams) -> f64 {
    // A single level is its own weighted mean; skip the division so the
    // result sits exactly on the band boundary.
    if let [(level, _)] = present {
        return f64::from(level.ordinal()) / MAX_ORDINAL;
    }
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (level, p) in present {
        let w = params.weight(*level);
        numerator += p * w * f64::from(level.ordinal());
        denominator += p * w;
    }
    if denominator > 0.0 {
        (numerator / denominator / MAX_ORDINAL).min(1.0)
    } else {
        0.0
    }
}

fn confidence(known_total: usize, total: usize, present: &[(CefrLevel, f64)]) -> f64 {
    if known_total == 0 {
        return 0.0;
    }

    let known_ratio = ratio(known_total, total).clamp(0.0, 1.0);

    let concentration = if present.len() > 1 {
        let entropy: f64 = -present
            .iter()
            .map(|(_, p)| p * (p + ENTROPY_EPSILON).ln())
            .sum::<f64>();
        let max_entropy = (present.len() as f64).ln();
        (1.0 - entropy / max_entropy).clamp(0.0, 1.0)
    } else {
        1.0
    };

    let sample_factor =
        ((known_total as f64 + 1.0).ln() / (SAMPLE_SATURATION + 1.0).ln()).clamp(0.0, 1.0);

    KNOWN_RATIO_WEIGHT
        .mul_add(
            known_ratio,
            CONCENTRATION_WEIGHT.mul_add(concentration, SAMPLE_WEIGHT * sample_factor),
        )
        .clamp(0.0, 1.0)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn level_strategy() -> impl Strategy<Value = Option<CefrLevel>> {
        prop_oneof![
            Just(None),
            proptest::sample::select(KNOWN_LEVELS.to_vec()).prop_map(Some),
        ]
    }

    fn matches_from(levels: &[Option<CefrLevel>]) -> Vec<WordMatch> {
        levels
            .iter()
            .enumerate()
            .map(|(i, level)| WordMatch {
                text: format!("w{}", i % 7),
                level: *level,
            })
            .collect()
    }

    proptest! {
        /// Probabilities over all seven levels form a distribution.
        #[test]
        fn probabilities_always_sum_to_one(
            levels in proptest::collection::vec(level_strategy(), 1..200),
        ) {
            let report = aggregate(&matches_from(&levels), 0, &GradingParams::default());
            let sum: f64 = report.probabilities.values().sum();
            prop_assert!((sum - 1.0).abs() < 1e-6, "sum was {}", sum);
            prop_assert_eq!(report.probabilities.len(), ALL_LEVELS.len());
        }

        /// Grade and confidence stay in the unit interval for any exponent.
        #[test]
        fn grade_and_confidence_are_bounded(
            levels in proptest::collection::vec(level_strategy(), 0..200),
            weight_exponent in -4.0f64..8.0,
        ) {
            let params = GradingParams { weight_exponent };
            let report = aggregate(&matches_from(&levels), 0, &params);
            prop_assert!((0.0..=1.0).contains(&report.grade), "grade {}", report.grade);
            prop_assert!(
                (0.0..=1.0).contains(&report.confidence),
                "confidence {}",
                report.confidence
            );
            prop_assert_eq!(report.predicted_level, predicted_level(report.grade));
        }

        /// Unknown expressions never move the grade.
        #[test]
        fn unknowns_leave_grade_unchanged(
            levels in proptest::collection::vec(level_strategy(), 0..100),
            extra_unknown in 0usize..50,
        ) {
            let params = GradingParams::default();
            let matches = matches_from(&levels);
            let mut noisy = matches.clone();
            noisy.extend((0..extra_unknown).map(|i| WordMatch {
                text: format!("zz{i}"),
                level: None,
            }));
            let base = aggregate(&matches, 0, &params).grade;
            let with_noise = aggregate(&noisy, 0, &params).grade;
            prop_assert!((base - with_noise).abs() < 1e-12);
        }
    }
}
