use formcheck_core::geometry::angle_2d;
use formcheck_core::{
    ConfidenceThresholds, ExerciseType, LandmarkId, Phase, PhaseThresholds, PoseFrame,
    ShoulderPressConfig,
};

use super::{EvalContext, ExerciseRules};
use crate::evaluation::FormCheckResult;

use LandmarkId::*;

const PRESS: &[LandmarkId] = &[
    Nose,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
];
const SETS: &[&[LandmarkId]] = &[PRESS];

#[derive(Debug, Clone, Copy)]
pub struct ShoulderPressMeasurement {
    /// Shoulder-elbow-wrist per arm
    pub left_elbow: f64,
    pub right_elbow: f64,
    pub nose_y: f64,
    pub left_wrist_y: f64,
    pub right_wrist_y: f64,
}

impl ShoulderPressMeasurement {
    pub fn mean_elbow(&self) -> f64 {
        (self.left_elbow + self.right_elbow) / 2.0
    }

    /// Both wrists above the head (smaller y)
    pub fn wrists_overhead(&self) -> bool {
        self.left_wrist_y < self.nose_y && self.right_wrist_y < self.nose_y
    }
}

#[derive(Debug, Clone)]
pub struct ShoulderPressRules {
    config: ShoulderPressConfig,
}

impl ShoulderPressRules {
    pub fn new(config: ShoulderPressConfig) -> Self {
        Self { config }
    }
}

impl ExerciseRules for ShoulderPressRules {
    type Measurement = ShoulderPressMeasurement;

    fn exercise(&self) -> ExerciseType {
        ExerciseType::ShoulderPress
    }

    fn phases(&self) -> &PhaseThresholds {
        &self.config.phases
    }

    fn landmark_sets(&self) -> &'static [&'static [LandmarkId]] {
        SETS
    }

    fn measure(&self, frame: &PoseFrame, confidence: &ConfidenceThresholds) -> Option<ShoulderPressMeasurement> {
        let get = |id| frame.get_visible(id, confidence.minimum).map(|lm| lm.position);

        let nose = get(Nose)?;
        let (ls, rs) = (get(LeftShoulder)?, get(RightShoulder)?);
        let (le, re) = (get(LeftElbow)?, get(RightElbow)?);
        let (lw, rw) = (get(LeftWrist)?, get(RightWrist)?);

        Some(ShoulderPressMeasurement {
            left_elbow: angle_2d(&ls, &le, &lw),
            right_elbow: angle_2d(&rs, &re, &rw),
            nose_y: nose.y,
            left_wrist_y: lw.y,
            right_wrist_y: rw.y,
        })
    }

    fn drive_angle(&self, m: &ShoulderPressMeasurement) -> f64 {
        m.mean_elbow()
    }

    fn checks(&mut self, m: &ShoulderPressMeasurement, ctx: &EvalContext<'_>) -> Vec<FormCheckResult> {
        let cfg = &self.config;

        let overhead = ctx.phase != Phase::Peak || m.wrists_overhead();
        let locked_out = ctx
            .range_extreme()
            .map_or(true, |top| top >= cfg.lockout_min_angle);
        let even = (m.left_elbow - m.right_elbow).abs() <= cfg.symmetry_tolerance;

        vec![
            FormCheckResult::new("wrists_overhead", "Wrists above head at top", overhead),
            FormCheckResult::new("lockout", "Full elbow extension at top", locked_out),
            FormCheckResult::new("symmetry", "Arms pressing evenly", even),
        ]
    }
}
