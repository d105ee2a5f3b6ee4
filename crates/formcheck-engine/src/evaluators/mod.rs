//! Exercise evaluators.
//!
//! Each exercise supplies an `ExerciseRules` implementation: which landmarks
//! it needs, how to measure a frame, which angle drives its phase machine,
//! and which form checks apply. `FormEvaluator` runs the shared per-frame
//! pipeline around those rules.

mod arm_curl;
mod push_up;
mod shoulder_press;
mod side_raise;
mod squat;

pub use arm_curl::{ArmCurlMeasurement, ArmCurlRules};
pub use push_up::{PushUpMeasurement, PushUpRules};
pub use shoulder_press::{ShoulderPressMeasurement, ShoulderPressRules};
pub use side_raise::{SideRaiseMeasurement, SideRaiseRules};
pub use squat::{SquatMeasurement, SquatRules};

use formcheck_core::{
    ConfidenceThresholds, EngineConfig, ExerciseType, LandmarkId, Phase, PhaseThresholds,
    PoseFrame,
};

use crate::evaluation::{FormCheckResult, FormLevel, FrameEvaluation};
use crate::phase::{PhaseMachine, PhaseTransition};
use crate::scoring::unweighted_score;

/// Body side used for single-side measurements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn pick(self, left: LandmarkId, right: LandmarkId) -> LandmarkId {
        match self {
            Side::Left => left,
            Side::Right => right,
        }
    }
}

/// The side whose landmarks are all visible, preferring the more confident
/// one. Left wins ties.
pub fn best_side(
    frame: &PoseFrame,
    minimum: f32,
    left: &[LandmarkId],
    right: &[LandmarkId],
) -> Option<Side> {
    let score = |ids: &[LandmarkId]| -> Option<f32> {
        let mut sum = 0.0;
        for id in ids {
            sum += frame.get_visible(*id, minimum)?.confidence;
        }
        Some(sum / ids.len().max(1) as f32)
    };

    match (score(left), score(right)) {
        (Some(l), Some(r)) if r > l => Some(Side::Right),
        (Some(_), _) => Some(Side::Left),
        (None, Some(_)) => Some(Side::Right),
        (None, None) => None,
    }
}

/// What a check may see of the current frame
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub frame: &'a PoseFrame,
    /// Phase after this frame's update
    pub phase: Phase,
    /// Most advanced smoothed driving angle of the rep in progress
    pub rep_extreme: Option<f64>,
    /// Phase change caused by this frame
    pub transition: Option<PhaseTransition>,
    pub confidence: ConfidenceThresholds,
}

impl EvalContext<'_> {
    /// All landmarks clear the reliable tier, so strict checks may run
    pub fn reliable(&self, ids: &[LandmarkId]) -> bool {
        self.frame.are_all_visible(ids, self.confidence.reliable)
    }

    pub fn at_turnaround(&self) -> bool {
        matches!(self.phase, Phase::Peak | Phase::Returning)
    }

    /// Most advanced angle of a rep abandoned on this frame, before it ever
    /// reached the turnaround
    pub fn abandoned_extreme(&self) -> Option<f64> {
        self.transition
            .filter(|t| t.is(Phase::Moving, Phase::Start))
            .and_then(|t| t.rep_extreme)
    }

    /// Extreme to judge range of motion on: the rep in progress once it has
    /// turned around, or a rep abandoned short of it on this frame. `None`
    /// while no range verdict is due.
    pub fn range_extreme(&self) -> Option<f64> {
        if self.at_turnaround() {
            self.rep_extreme
        } else {
            self.abandoned_extreme()
        }
    }
}

/// Exercise-specific measurement and rules
pub trait ExerciseRules {
    type Measurement;

    fn exercise(&self) -> ExerciseType;

    fn phases(&self) -> &PhaseThresholds;

    /// Alternative landmark sets; a frame is usable when any one set is fully
    /// visible at the minimum tier
    fn landmark_sets(&self) -> &'static [&'static [LandmarkId]];

    fn measure(&self, frame: &PoseFrame, confidence: &ConfidenceThresholds) -> Option<Self::Measurement>;

    /// Angle that drives the phase machine
    fn drive_angle(&self, measurement: &Self::Measurement) -> f64;

    fn checks(&mut self, measurement: &Self::Measurement, ctx: &EvalContext<'_>) -> Vec<FormCheckResult>;

    fn reset(&mut self) {}
}

/// Per-frame analysis for one exercise
pub trait Evaluator {
    fn exercise(&self) -> ExerciseType;

    fn analyze(&mut self, frame: &PoseFrame) -> FrameEvaluation;

    fn phase(&self) -> Phase;

    fn reset(&mut self);
}

/// Shared pipeline: gate, measure, track phase, check, score
#[derive(Debug, Clone)]
pub struct FormEvaluator<R> {
    rules: R,
    machine: PhaseMachine,
    confidence: ConfidenceThresholds,
}

impl<R: ExerciseRules> FormEvaluator<R> {
    pub fn new(rules: R, confidence: ConfidenceThresholds, smoothing_window: usize) -> Self {
        let machine = PhaseMachine::new(*rules.phases(), smoothing_window);
        Self {
            rules,
            machine,
            confidence,
        }
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn machine(&self) -> &PhaseMachine {
        &self.machine
    }

    fn is_visible(&self, frame: &PoseFrame) -> bool {
        self.rules
            .landmark_sets()
            .iter()
            .any(|set| frame.are_all_visible(set, self.confidence.minimum))
    }

    fn gated(&self, frame: &PoseFrame) -> FrameEvaluation {
        tracing::trace!(
            exercise = %self.rules.exercise(),
            timestamp = frame.timestamp.as_millis(),
            "required landmarks not visible, frame skipped"
        );
        FrameEvaluation::gated(frame.timestamp, self.rules.exercise(), self.machine.phase())
    }
}

impl<R: ExerciseRules> Evaluator for FormEvaluator<R> {
    fn exercise(&self) -> ExerciseType {
        self.rules.exercise()
    }

    fn analyze(&mut self, frame: &PoseFrame) -> FrameEvaluation {
        if !self.is_visible(frame) {
            return self.gated(frame);
        }
        let Some(measurement) = self.rules.measure(frame, &self.confidence) else {
            return self.gated(frame);
        };

        let angle = self.rules.drive_angle(&measurement);
        let transition = self.machine.update(angle, frame.timestamp);
        let phase = self.machine.phase();

        let ctx = EvalContext {
            frame,
            phase,
            rep_extreme: self.machine.rep_extreme(),
            transition,
            confidence: self.confidence,
        };
        let checks = self.rules.checks(&measurement, &ctx);
        let score = unweighted_score(&checks);
        let exercise = self.rules.exercise();

        FrameEvaluation {
            timestamp: frame.timestamp,
            exercise,
            score,
            level: FormLevel::from_score(score),
            issues: checks.iter().filter(|c| !c.passed).copied().collect(),
            checks,
            current_phase: phase,
            phase_label: exercise.phase_label(phase),
            angle: Some(angle),
            smoothed_angle: self.machine.smoothed_angle(),
            transition,
            gated: false,
        }
    }

    fn phase(&self) -> Phase {
        self.machine.phase()
    }

    fn reset(&mut self) {
        self.machine.reset();
        self.rules.reset();
    }
}

/// Evaluator for any supported exercise
#[derive(Debug, Clone)]
pub enum ExerciseEvaluator {
    Squat(FormEvaluator<SquatRules>),
    PushUp(FormEvaluator<PushUpRules>),
    ArmCurl(FormEvaluator<ArmCurlRules>),
    SideRaise(FormEvaluator<SideRaiseRules>),
    ShoulderPress(FormEvaluator<ShoulderPressRules>),
}

macro_rules! dispatch {
    ($self:expr, $e:ident => $body:expr) => {
        match $self {
            ExerciseEvaluator::Squat($e) => $body,
            ExerciseEvaluator::PushUp($e) => $body,
            ExerciseEvaluator::ArmCurl($e) => $body,
            ExerciseEvaluator::SideRaise($e) => $body,
            ExerciseEvaluator::ShoulderPress($e) => $body,
        }
    };
}

impl Evaluator for ExerciseEvaluator {
    fn exercise(&self) -> ExerciseType {
        dispatch!(self, e => e.exercise())
    }

    fn analyze(&mut self, frame: &PoseFrame) -> FrameEvaluation {
        dispatch!(self, e => e.analyze(frame))
    }

    fn phase(&self) -> Phase {
        dispatch!(self, e => e.phase())
    }

    fn reset(&mut self) {
        dispatch!(self, e => e.reset())
    }
}

impl ExerciseEvaluator {
    pub fn smoothed_angle(&self) -> Option<f64> {
        dispatch!(self, e => e.machine().smoothed_angle())
    }

    pub fn rep_extreme(&self) -> Option<f64> {
        dispatch!(self, e => e.machine().rep_extreme())
    }
}

/// Build the evaluator for `exercise` from the engine configuration
pub fn create_evaluator(exercise: ExerciseType, config: &EngineConfig) -> ExerciseEvaluator {
    let confidence = config.confidence;
    let window = config.smoothing_window;
    let ex = &config.exercises;

    tracing::debug!(%exercise, smoothing_window = window, "creating evaluator");

    match exercise {
        ExerciseType::Squat => {
            ExerciseEvaluator::Squat(FormEvaluator::new(SquatRules::new(ex.squat), confidence, window))
        }
        ExerciseType::PushUp => {
            ExerciseEvaluator::PushUp(FormEvaluator::new(PushUpRules::new(ex.push_up), confidence, window))
        }
        ExerciseType::ArmCurl => {
            ExerciseEvaluator::ArmCurl(FormEvaluator::new(ArmCurlRules::new(ex.arm_curl), confidence, window))
        }
        ExerciseType::SideRaise => ExerciseEvaluator::SideRaise(FormEvaluator::new(
            SideRaiseRules::new(ex.side_raise),
            confidence,
            window,
        )),
        ExerciseType::ShoulderPress => ExerciseEvaluator::ShoulderPress(FormEvaluator::new(
            ShoulderPressRules::new(ex.shoulder_press),
            confidence,
            window,
        )),
    }
}
