use formcheck_core::geometry::{angle_2d, angle_from_vertical, distance_2d};
use formcheck_core::{
    ArmCurlConfig, ConfidenceThresholds, ExerciseType, LandmarkId, MovingAverage, Phase,
    PhaseThresholds, PoseFrame, Position3D, VelocityCalculator,
};

use super::{best_side, EvalContext, ExerciseRules, Side};
use crate::evaluation::FormCheckResult;

use LandmarkId::*;

const LEFT: &[LandmarkId] = &[LeftShoulder, LeftElbow, LeftWrist, LeftHip];
const RIGHT: &[LandmarkId] = &[RightShoulder, RightElbow, RightWrist, RightHip];
const SETS: &[&[LandmarkId]] = &[LEFT, RIGHT];

/// Frames averaged before differentiating torso lean
const LEAN_SMOOTHING: usize = 3;

#[derive(Debug, Clone, Copy)]
pub struct ArmCurlMeasurement {
    pub side: Side,
    pub shoulder: Position3D,
    pub elbow: Position3D,
    /// Shoulder-elbow-wrist
    pub elbow_angle: f64,
    /// Shoulder to hip distance, the scale for drift checks
    pub torso_length: f64,
    /// Torso tilt from vertical
    pub torso_lean: f64,
}

/// Elbow and shoulder positions at rest
#[derive(Debug, Clone, Copy)]
struct Anchor {
    side: Side,
    shoulder: Position3D,
    elbow: Position3D,
}

/// Curl rules track the resting arm position and torso swing speed
#[derive(Debug, Clone)]
pub struct ArmCurlRules {
    config: ArmCurlConfig,
    anchor: Option<Anchor>,
    lean: MovingAverage,
    swing: VelocityCalculator,
}

impl ArmCurlRules {
    pub fn new(config: ArmCurlConfig) -> Self {
        Self {
            config,
            anchor: None,
            lean: MovingAverage::new(LEAN_SMOOTHING),
            swing: VelocityCalculator::new(),
        }
    }

    fn anchor_for(&mut self, m: &ArmCurlMeasurement, phase: Phase) -> Anchor {
        let current = Anchor {
            side: m.side,
            shoulder: m.shoulder,
            elbow: m.elbow,
        };
        match self.anchor {
            Some(anchor) if phase != Phase::Start && anchor.side == m.side => anchor,
            _ => {
                self.anchor = Some(current);
                current
            }
        }
    }
}

impl ExerciseRules for ArmCurlRules {
    type Measurement = ArmCurlMeasurement;

    fn exercise(&self) -> ExerciseType {
        ExerciseType::ArmCurl
    }

    fn phases(&self) -> &PhaseThresholds {
        &self.config.phases
    }

    fn landmark_sets(&self) -> &'static [&'static [LandmarkId]] {
        SETS
    }

    fn measure(&self, frame: &PoseFrame, confidence: &ConfidenceThresholds) -> Option<ArmCurlMeasurement> {
        let min = confidence.minimum;
        let side = best_side(frame, min, LEFT, RIGHT)?;
        let get = |l, r| frame.get_visible(side.pick(l, r), min).map(|lm| lm.position);

        let shoulder = get(LeftShoulder, RightShoulder)?;
        let elbow = get(LeftElbow, RightElbow)?;
        let wrist = get(LeftWrist, RightWrist)?;
        let hip = get(LeftHip, RightHip)?;

        Some(ArmCurlMeasurement {
            side,
            shoulder,
            elbow,
            elbow_angle: angle_2d(&shoulder, &elbow, &wrist),
            torso_length: distance_2d(&shoulder, &hip),
            torso_lean: angle_from_vertical(&shoulder, &hip),
        })
    }

    fn drive_angle(&self, m: &ArmCurlMeasurement) -> f64 {
        m.elbow_angle
    }

    fn checks(&mut self, m: &ArmCurlMeasurement, ctx: &EvalContext<'_>) -> Vec<FormCheckResult> {
        let cfg = self.config;
        let mut checks = Vec::with_capacity(3);

        let anchor = self.anchor_for(m, ctx.phase);

        if m.torso_length > 1e-6 {
            let elbow_drift = distance_2d(&anchor.elbow, &m.elbow) / m.torso_length;
            checks.push(FormCheckResult::new(
                "elbow_fixed",
                "Elbows stay fixed at sides",
                elbow_drift <= cfg.max_elbow_drift,
            ));

            let shoulder_drift = distance_2d(&anchor.shoulder, &m.shoulder) / m.torso_length;
            checks.push(FormCheckResult::new(
                "shoulder_still",
                "Shoulders stay still",
                shoulder_drift <= cfg.max_shoulder_drift,
            ));
        }

        let lean = self.lean.update(m.torso_lean);
        let swing = self.swing.update(lean, ctx.frame.timestamp);
        checks.push(FormCheckResult::new(
            "no_momentum",
            "No swinging or momentum",
            swing.abs() <= cfg.max_swing_velocity,
        ));

        checks
    }

    fn reset(&mut self) {
        self.anchor = None;
        self.lean.reset();
        self.swing.reset();
    }
}
