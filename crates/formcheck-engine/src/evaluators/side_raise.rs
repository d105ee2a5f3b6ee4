use formcheck_core::geometry::angle_2d;
use formcheck_core::{
    ConfidenceThresholds, ExerciseType, LandmarkId, PhaseThresholds, PoseFrame, SideRaiseConfig,
};

use super::{EvalContext, ExerciseRules};
use crate::evaluation::FormCheckResult;

use LandmarkId::*;

const BOTH_ARMS: &[LandmarkId] = &[
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
];
const SETS: &[&[LandmarkId]] = &[BOTH_ARMS];

/// Landmarks the symmetry comparison relies on
const ABDUCTION: &[LandmarkId] = &[LeftShoulder, RightShoulder, LeftElbow, RightElbow, LeftHip, RightHip];

#[derive(Debug, Clone, Copy)]
pub struct SideRaiseMeasurement {
    /// Hip-shoulder-elbow per arm
    pub left_elevation: f64,
    pub right_elevation: f64,
    /// Shoulder-elbow-wrist per arm
    pub left_elbow: f64,
    pub right_elbow: f64,
}

impl SideRaiseMeasurement {
    pub fn mean_elevation(&self) -> f64 {
        (self.left_elevation + self.right_elevation) / 2.0
    }
}

#[derive(Debug, Clone)]
pub struct SideRaiseRules {
    config: SideRaiseConfig,
}

impl SideRaiseRules {
    pub fn new(config: SideRaiseConfig) -> Self {
        Self { config }
    }
}

impl ExerciseRules for SideRaiseRules {
    type Measurement = SideRaiseMeasurement;

    fn exercise(&self) -> ExerciseType {
        ExerciseType::SideRaise
    }

    fn phases(&self) -> &PhaseThresholds {
        &self.config.phases
    }

    fn landmark_sets(&self) -> &'static [&'static [LandmarkId]] {
        SETS
    }

    fn measure(&self, frame: &PoseFrame, confidence: &ConfidenceThresholds) -> Option<SideRaiseMeasurement> {
        let get = |id| frame.get_visible(id, confidence.minimum).map(|lm| lm.position);

        let (ls, rs) = (get(LeftShoulder)?, get(RightShoulder)?);
        let (le, re) = (get(LeftElbow)?, get(RightElbow)?);
        let (lw, rw) = (get(LeftWrist)?, get(RightWrist)?);
        let (lh, rh) = (get(LeftHip)?, get(RightHip)?);

        Some(SideRaiseMeasurement {
            left_elevation: angle_2d(&lh, &ls, &le),
            right_elevation: angle_2d(&rh, &rs, &re),
            left_elbow: angle_2d(&ls, &le, &lw),
            right_elbow: angle_2d(&rs, &re, &rw),
        })
    }

    fn drive_angle(&self, m: &SideRaiseMeasurement) -> f64 {
        m.mean_elevation()
    }

    fn checks(&mut self, m: &SideRaiseMeasurement, ctx: &EvalContext<'_>) -> Vec<FormCheckResult> {
        let cfg = &self.config;
        let mut checks = Vec::with_capacity(3);

        let below_limit = m.left_elevation <= cfg.max_elevation && m.right_elevation <= cfg.max_elevation;
        let high_enough = ctx
            .range_extreme()
            .map_or(true, |top| top >= cfg.target_elevation);
        checks.push(FormCheckResult::new(
            "arm_height",
            "Arms raised to shoulder height",
            below_limit && high_enough,
        ));

        if ctx.reliable(ABDUCTION) {
            checks.push(FormCheckResult::new(
                "symmetry",
                "Arms move symmetrically",
                (m.left_elevation - m.right_elevation).abs() <= cfg.symmetry_tolerance,
            ));
        }

        checks.push(FormCheckResult::new(
            "arms_straight",
            "Arms kept nearly straight",
            m.left_elbow >= cfg.min_elbow_angle && m.right_elbow >= cfg.min_elbow_angle,
        ));

        checks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluators::{Evaluator, FormEvaluator};
    use crate::synthetic::side_raise_frame;
    use formcheck_core::{Phase, PoseLandmark, Position3D, Timestamp};

    fn evaluator() -> FormEvaluator<SideRaiseRules> {
        FormEvaluator::new(SideRaiseRules::new(SideRaiseConfig::default()), ConfidenceThresholds::default(), 1)
    }

    fn ids(eval: &crate::FrameEvaluation) -> Vec<&'static str> {
        eval.issues.iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_even_raise_passes() {
        let mut ev = evaluator();
        for (i, a) in [10.0, 50.0, 85.0, 85.0, 50.0, 10.0].into_iter().enumerate() {
            let eval = ev.analyze(&side_raise_frame(a, a, Timestamp::from_millis(i as i64 * 33), 0.9));
            assert_eq!(eval.score, 100, "elevation {a}");
        }
        assert_eq!(ev.phase(), Phase::Start);
    }

    #[test]
    fn test_uneven_arms() {
        let mut ev = evaluator();
        let eval = ev.analyze(&side_raise_frame(60.0, 35.0, Timestamp::from_millis(0), 0.9));
        assert_eq!(ids(&eval), vec!["symmetry"]);
    }

    #[test]
    fn test_raised_too_high() {
        let mut ev = evaluator();
        let eval = ev.analyze(&side_raise_frame(125.0, 125.0, Timestamp::from_millis(0), 0.9));
        assert!(ids(&eval).contains(&"arm_height"));
    }

    #[test]
    fn test_low_top_position() {
        // Target above the peak band, so a top at 82 falls short
        let mut config = SideRaiseConfig::default();
        config.target_elevation = 85.0;
        let mut ev = FormEvaluator::new(SideRaiseRules::new(config), ConfidenceThresholds::default(), 1);
        for (i, a) in [10.0, 50.0, 82.0].into_iter().enumerate() {
            let eval = ev.analyze(&side_raise_frame(a, a, Timestamp::from_millis(i as i64 * 33), 0.9));
            if a == 82.0 {
                assert_eq!(eval.current_phase, Phase::Peak);
                assert_eq!(ids(&eval), vec!["arm_height"]);
            }
        }
    }

    #[test]
    fn test_bent_elbow() {
        let mut ev = evaluator();
        let mut frame = side_raise_frame(60.0, 60.0, Timestamp::from_millis(0), 0.9);
        let elbow = frame.get(LeftElbow).unwrap().position;
        // Fold the left forearm back toward the shoulder
        frame.insert(PoseLandmark::new(
            LeftWrist,
            Position3D::new(elbow.x, elbow.y - 0.15, 0.0),
            0.9,
        ));
        let eval = ev.analyze(&frame);
        assert_eq!(ids(&eval), vec!["arms_straight"]);
    }
}
