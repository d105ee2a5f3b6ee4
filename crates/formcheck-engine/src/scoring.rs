//! Frame and session scoring.
//!
//! All functions are pure. Scores are integers in `[0, 100]`.

use formcheck_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::evaluation::FormCheckResult;

/// Maximum dispersion assumed when normalizing consistency (scores span 0-100)
const MAX_STD_DEV: f64 = 50.0;

/// Half-to-half mean difference that counts as a trend
const TREND_THRESHOLD: f64 = 5.0;

/// `round(100 × Σ(passed_i × w_i) / Σw_i)`, equal weights when none are given.
///
/// An empty check set scores 0. Weights must match the checks one-to-one and
/// be finite and non-negative; all-zero weights score 0.
pub fn frame_score(checks: &[FormCheckResult], weights: Option<&[f64]>) -> Result<u8> {
    let Some(weights) = weights else {
        return Ok(unweighted_score(checks));
    };

    if weights.len() != checks.len() {
        return Err(Error::WeightMismatch {
            expected: checks.len(),
            actual: weights.len(),
        });
    }
    validate_weights(weights)?;

    let total: f64 = weights.iter().sum();
    if checks.is_empty() || total <= 0.0 {
        return Ok(0);
    }

    let passed: f64 = checks
        .iter()
        .zip(weights)
        .filter(|(c, _)| c.passed)
        .map(|(_, w)| w)
        .sum();

    Ok(to_score(100.0 * passed / total))
}

/// Equal-weight frame score
pub fn unweighted_score(checks: &[FormCheckResult]) -> u8 {
    if checks.is_empty() {
        return 0;
    }
    let passed = checks.iter().filter(|c| c.passed).count();
    to_score(100.0 * passed as f64 / checks.len() as f64)
}

/// `round(mean(scores))`, 0 for no scores
pub fn overall_score(scores: &[u8]) -> u8 {
    if scores.is_empty() {
        return 0;
    }
    to_score(mean(scores))
}

/// Weighted mean of scores
pub fn weighted_score(scores: &[u8], weights: &[f64]) -> Result<u8> {
    if weights.len() != scores.len() {
        return Err(Error::WeightMismatch {
            expected: scores.len(),
            actual: weights.len(),
        });
    }
    validate_weights(weights)?;

    let total: f64 = weights.iter().sum();
    if scores.is_empty() || total <= 0.0 {
        return Ok(0);
    }

    let sum: f64 = scores.iter().zip(weights).map(|(&s, w)| s as f64 * w).sum();
    Ok(to_score(sum / total))
}

/// Score of one repetition from its frame scores
pub fn rep_score(frame_scores: &[u8]) -> u8 {
    overall_score(frame_scores)
}

/// `round((1 - min(σ/50, 1)) × 100)` over population standard deviation;
/// 100 for fewer than two reps
pub fn consistency_score(rep_scores: &[u8]) -> u8 {
    if rep_scores.len() < 2 {
        return 100;
    }

    let m = mean(rep_scores);
    let variance = rep_scores
        .iter()
        .map(|&s| (s as f64 - m).powi(2))
        .sum::<f64>()
        / rep_scores.len() as f64;
    let std_dev = variance.sqrt();

    to_score((1.0 - (std_dev / MAX_STD_DEV).min(1.0)) * 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Trend::Improving => "improving",
            Trend::Stable => "stable",
            Trend::Declining => "declining",
        })
    }
}

/// Compare the mean of the second half of the reps against the first
pub fn trend(rep_scores: &[u8]) -> Trend {
    if rep_scores.len() < 3 {
        return Trend::Stable;
    }

    let (first, second) = rep_scores.split_at(rep_scores.len() / 2);
    let delta = mean(second) - mean(first);

    if delta > TREND_THRESHOLD {
        Trend::Improving
    } else if delta < -TREND_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    S,
    A,
    B,
    C,
    D,
    F,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub fn letter_grade(score: u8) -> Grade {
    match score {
        95..=u8::MAX => Grade::S,
        85..=94 => Grade::A,
        70..=84 => Grade::B,
        55..=69 => Grade::C,
        40..=54 => Grade::D,
        _ => Grade::F,
    }
}

/// Session summary statistics, a pure function of the rep scores
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_reps: u32,
    pub average_score: u8,
    pub best_score: u8,
    pub worst_score: u8,
    pub consistency: u8,
    pub trend: Trend,
    pub grade: Grade,
}

impl SessionStats {
    pub fn from_rep_scores(rep_scores: &[u8]) -> Self {
        let average_score = overall_score(rep_scores);
        Self {
            total_reps: rep_scores.len() as u32,
            average_score,
            best_score: rep_scores.iter().copied().max().unwrap_or(0),
            worst_score: rep_scores.iter().copied().min().unwrap_or(0),
            consistency: consistency_score(rep_scores),
            trend: trend(rep_scores),
            grade: letter_grade(average_score),
        }
    }
}

fn validate_weights(weights: &[f64]) -> Result<()> {
    if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(Error::InvalidInput(format!(
            "weights must be finite and non-negative, got {}",
            bad
        )));
    }
    Ok(())
}

fn mean(scores: &[u8]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().map(|&s| s as f64).sum::<f64>() / scores.len() as f64
}

fn to_score(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}
