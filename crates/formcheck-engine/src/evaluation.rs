//! Per-frame evaluation output.

use formcheck_core::{ExerciseType, Phase, Timestamp};
use serde::Serialize;

use crate::phase::PhaseTransition;

/// One exercise-specific rule evaluated against one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormCheckResult {
    pub id: &'static str,
    pub description: &'static str,
    pub passed: bool,
}

impl FormCheckResult {
    pub fn new(id: &'static str, description: &'static str, passed: bool) -> Self {
        Self {
            id,
            description,
            passed,
        }
    }
}

/// Coarse quality band of a frame score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormLevel {
    Excellent,
    Good,
    Fair,
    Poor,
    /// Required landmarks were not visible; nothing was judged
    Unknown,
}

impl FormLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => FormLevel::Excellent,
            75..=89 => FormLevel::Good,
            50..=74 => FormLevel::Fair,
            _ => FormLevel::Poor,
        }
    }
}

/// Result of analyzing one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameEvaluation {
    pub timestamp: Timestamp,
    pub exercise: ExerciseType,
    pub score: u8,
    pub level: FormLevel,
    /// Failed checks, for immediate feedback
    pub issues: Vec<FormCheckResult>,
    /// Every check evaluated this frame
    pub checks: Vec<FormCheckResult>,
    pub current_phase: Phase,
    pub phase_label: &'static str,
    /// Raw driving angle
    pub angle: Option<f64>,
    pub smoothed_angle: Option<f64>,
    pub transition: Option<PhaseTransition>,
    /// Frame was rejected by the confidence gate
    pub gated: bool,
}

impl FrameEvaluation {
    /// Neutral result for a frame whose required landmarks were not visible
    pub fn gated(timestamp: Timestamp, exercise: ExerciseType, phase: Phase) -> Self {
        Self {
            timestamp,
            exercise,
            score: 0,
            level: FormLevel::Unknown,
            issues: Vec::new(),
            checks: Vec::new(),
            current_phase: phase,
            phase_label: exercise.phase_label(phase),
            angle: None,
            smoothed_angle: None,
            transition: None,
            gated: true,
        }
    }

    pub fn is_rep_complete(&self) -> bool {
        self.transition
            .map(|t| t.is(crate::reps::REP_TRANSITION.0, crate::reps::REP_TRANSITION.1))
            .unwrap_or(false)
    }
}
