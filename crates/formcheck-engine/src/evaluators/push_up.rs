use formcheck_core::geometry::{angle_2d, is_angle_in_range};
use formcheck_core::{
    ConfidenceThresholds, ExerciseType, LandmarkId, PhaseThresholds, PoseFrame, PoseLandmark,
    PushUpConfig,
};

use super::{best_side, EvalContext, ExerciseRules, Side};
use crate::evaluation::FormCheckResult;

use LandmarkId::*;

const LEFT: &[LandmarkId] = &[LeftShoulder, LeftElbow, LeftWrist, LeftHip, LeftAnkle];
const RIGHT: &[LandmarkId] = &[RightShoulder, RightElbow, RightWrist, RightHip, RightAnkle];
const SETS: &[&[LandmarkId]] = &[LEFT, RIGHT];

#[derive(Debug, Clone, Copy)]
pub struct PushUpMeasurement {
    pub side: Side,
    pub shoulder: PoseLandmark,
    pub hip: PoseLandmark,
    pub ankle: PoseLandmark,
    /// Shoulder-elbow-wrist
    pub elbow_angle: f64,
    /// Shoulder-hip-ankle
    pub body_line_angle: f64,
}

impl PushUpMeasurement {
    /// How far the hip hangs below the straight shoulder-ankle line
    /// (positive = sagging), `None` when the body is not horizontal enough
    /// to define the line
    pub fn hip_sag(&self) -> Option<f64> {
        let (s, h, a) = (&self.shoulder.position, &self.hip.position, &self.ankle.position);
        let dx = a.x - s.x;
        if dx.abs() < 1e-6 {
            return None;
        }
        let t = (h.x - s.x) / dx;
        let line_y = s.y + t * (a.y - s.y);
        Some(h.y - line_y)
    }
}

#[derive(Debug, Clone)]
pub struct PushUpRules {
    config: PushUpConfig,
}

impl PushUpRules {
    pub fn new(config: PushUpConfig) -> Self {
        Self { config }
    }
}

impl ExerciseRules for PushUpRules {
    type Measurement = PushUpMeasurement;

    fn exercise(&self) -> ExerciseType {
        ExerciseType::PushUp
    }

    fn phases(&self) -> &PhaseThresholds {
        &self.config.phases
    }

    fn landmark_sets(&self) -> &'static [&'static [LandmarkId]] {
        SETS
    }

    fn measure(&self, frame: &PoseFrame, confidence: &ConfidenceThresholds) -> Option<PushUpMeasurement> {
        let min = confidence.minimum;
        let side = best_side(frame, min, LEFT, RIGHT)?;
        let get = |l, r| frame.get_visible(side.pick(l, r), min).copied();

        let shoulder = get(LeftShoulder, RightShoulder)?;
        let elbow = get(LeftElbow, RightElbow)?;
        let wrist = get(LeftWrist, RightWrist)?;
        let hip = get(LeftHip, RightHip)?;
        let ankle = get(LeftAnkle, RightAnkle)?;

        Some(PushUpMeasurement {
            side,
            shoulder,
            hip,
            ankle,
            elbow_angle: angle_2d(&shoulder.position, &elbow.position, &wrist.position),
            body_line_angle: angle_2d(&shoulder.position, &hip.position, &ankle.position),
        })
    }

    fn drive_angle(&self, m: &PushUpMeasurement) -> f64 {
        m.elbow_angle
    }

    fn checks(&mut self, m: &PushUpMeasurement, ctx: &EvalContext<'_>) -> Vec<FormCheckResult> {
        let cfg = &self.config;
        let mut checks = Vec::with_capacity(3);

        let elbow_ok = match ctx.range_extreme() {
            Some(deepest) => is_angle_in_range(deepest, cfg.elbow_min_angle, cfg.elbow_max_angle),
            None => m.elbow_angle >= cfg.elbow_min_angle,
        };
        checks.push(FormCheckResult::new(
            "elbow_range",
            "Elbow angle within range",
            elbow_ok,
        ));

        checks.push(FormCheckResult::new(
            "body_line",
            "Body line straight",
            m.body_line_angle >= cfg.body_line_min_angle,
        ));

        let line = [
            m.side.pick(LeftShoulder, RightShoulder),
            m.side.pick(LeftHip, RightHip),
            m.side.pick(LeftAnkle, RightAnkle),
        ];
        if ctx.reliable(&line) {
            if let Some(sag) = m.hip_sag() {
                checks.push(FormCheckResult::new(
                    "hip_sag",
                    "Hips not sagging",
                    sag <= cfg.hip_sag_tolerance,
                ));
            }
        }

        checks
    }
}
