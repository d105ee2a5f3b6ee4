use formcheck_core::geometry::{angle_2d, angle_from_vertical, is_angle_in_range};
use formcheck_core::{
    ConfidenceThresholds, ExerciseType, LandmarkId, PhaseThresholds, PoseFrame, PoseLandmark,
    SquatConfig,
};

use super::{best_side, EvalContext, ExerciseRules, Side};
use crate::evaluation::FormCheckResult;

use LandmarkId::*;

const LEFT: &[LandmarkId] = &[LeftShoulder, LeftHip, LeftKnee, LeftAnkle];
const RIGHT: &[LandmarkId] = &[RightShoulder, RightHip, RightKnee, RightAnkle];
const SETS: &[&[LandmarkId]] = &[LEFT, RIGHT];

#[derive(Debug, Clone, Copy)]
pub struct SquatMeasurement {
    pub side: Side,
    pub shoulder: PoseLandmark,
    pub hip: PoseLandmark,
    pub knee: PoseLandmark,
    pub ankle: PoseLandmark,
    pub foot: Option<PoseLandmark>,
    /// Hip-knee-ankle
    pub knee_angle: f64,
}

#[derive(Debug, Clone)]
pub struct SquatRules {
    config: SquatConfig,
}

impl SquatRules {
    pub fn new(config: SquatConfig) -> Self {
        Self { config }
    }
}

impl ExerciseRules for SquatRules {
    type Measurement = SquatMeasurement;

    fn exercise(&self) -> ExerciseType {
        ExerciseType::Squat
    }

    fn phases(&self) -> &PhaseThresholds {
        &self.config.phases
    }

    fn landmark_sets(&self) -> &'static [&'static [LandmarkId]] {
        SETS
    }

    fn measure(&self, frame: &PoseFrame, confidence: &ConfidenceThresholds) -> Option<SquatMeasurement> {
        let min = confidence.minimum;
        let side = best_side(frame, min, LEFT, RIGHT)?;
        let get = |l, r| frame.get_visible(side.pick(l, r), min).copied();

        let shoulder = get(LeftShoulder, RightShoulder)?;
        let hip = get(LeftHip, RightHip)?;
        let knee = get(LeftKnee, RightKnee)?;
        let ankle = get(LeftAnkle, RightAnkle)?;

        Some(SquatMeasurement {
            side,
            shoulder,
            hip,
            knee,
            ankle,
            foot: get(LeftFootIndex, RightFootIndex),
            knee_angle: angle_2d(&hip.position, &knee.position, &ankle.position),
        })
    }

    fn drive_angle(&self, m: &SquatMeasurement) -> f64 {
        m.knee_angle
    }

    fn checks(&mut self, m: &SquatMeasurement, ctx: &EvalContext<'_>) -> Vec<FormCheckResult> {
        let cfg = &self.config;
        let mut checks = Vec::with_capacity(3);

        // Depth is judged on the deepest point of the rep, including reps
        // abandoned before reaching the bottom
        let depth_ok = match ctx.range_extreme() {
            Some(deepest) => is_angle_in_range(deepest, cfg.depth_min_angle, cfg.depth_max_angle),
            None => m.knee_angle >= cfg.depth_min_angle,
        };
        checks.push(FormCheckResult::new(
            "knee_angle",
            "Knee angle within target range",
            depth_ok,
        ));

        if let Some(foot) = m.foot {
            let ids = [m.side.pick(LeftKnee, RightKnee), m.side.pick(LeftAnkle, RightAnkle), foot.id];
            if ctx.reliable(&ids) {
                let facing = (foot.position.x - m.ankle.position.x).signum();
                let overshoot = (m.knee.position.x - foot.position.x) * facing;
                checks.push(FormCheckResult::new(
                    "knee_over_toe",
                    "Knees not past toes",
                    overshoot <= cfg.knee_toe_tolerance,
                ));
            }
        }

        let lean = angle_from_vertical(&m.shoulder.position, &m.hip.position);
        checks.push(FormCheckResult::new(
            "back_straight",
            "Back kept straight",
            lean <= cfg.max_back_lean,
        ));

        checks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluators::{Evaluator, FormEvaluator};
    use crate::synthetic::squat_frame;
    use formcheck_core::{Phase, Position3D, Timestamp};

    fn evaluator() -> FormEvaluator<SquatRules> {
        FormEvaluator::new(SquatRules::new(SquatConfig::default()), ConfidenceThresholds::default(), 1)
    }

    fn failed(eval: &crate::FrameEvaluation) -> Vec<&'static str> {
        eval.issues.iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_good_squat_passes() {
        let mut ev = evaluator();
        let eval = ev.analyze(&squat_frame(170.0, Timestamp::from_millis(0), 0.9));
        assert_eq!(eval.checks.len(), 3);
        assert_eq!(eval.score, 100);
        assert_eq!(eval.phase_label, "start");
    }

    #[test]
    fn test_forward_lean_fails_back_check() {
        let mut ev = evaluator();
        let mut frame = squat_frame(170.0, Timestamp::from_millis(0), 0.9);
        for id in [LeftShoulder, RightShoulder] {
            frame.insert(PoseLandmark::new(id, Position3D::new(0.75, 0.35, 0.0), 0.9));
        }
        let eval = ev.analyze(&frame);
        assert_eq!(failed(&eval), vec!["back_straight"]);
        assert_eq!(eval.score, 67);
    }

    #[test]
    fn test_knees_past_toes() {
        let mut ev = evaluator();
        let mut frame = squat_frame(120.0, Timestamp::from_millis(0), 0.9);
        for id in [LeftKnee, RightKnee] {
            frame.insert(PoseLandmark::new(id, Position3D::new(0.9, 0.7, 0.0), 0.9));
        }
        let eval = ev.analyze(&frame);
        assert!(failed(&eval).contains(&"knee_over_toe"));
    }

    #[test]
    fn test_toe_check_skipped_below_reliable_tier() {
        let mut ev = evaluator();
        let eval = ev.analyze(&squat_frame(170.0, Timestamp::from_millis(0), 0.6));
        assert!(!eval.gated);
        assert_eq!(eval.checks.len(), 2);
        assert!(eval.checks.iter().all(|c| c.id != "knee_over_toe"));
    }

    #[test]
    fn test_excessive_depth_fails_knee_angle() {
        let mut ev = evaluator();
        for (i, angle) in [170.0, 140.0, 100.0, 50.0].into_iter().enumerate() {
            let eval = ev.analyze(&squat_frame(angle, Timestamp::from_millis(i as i64 * 33), 0.9));
            if angle == 50.0 {
                assert_eq!(eval.current_phase, Phase::Peak);
                assert!(failed(&eval).contains(&"knee_angle"));
            }
        }
    }

    #[test]
    fn test_shallow_squat_fails_knee_angle_when_abandoned() {
        let mut ev = evaluator();
        let angles = [170.0, 140.0, 125.0, 140.0, 170.0];
        let evals: Vec<_> = angles
            .into_iter()
            .enumerate()
            .map(|(i, a)| ev.analyze(&squat_frame(a, Timestamp::from_millis(i as i64 * 33), 0.9)))
            .collect();

        // Never reached the bottom, so only the frame abandoning the rep is judged
        assert!(evals[..4].iter().all(|e| e.score == 100));
        let last = &evals[4];
        assert!(last.transition.unwrap().is(Phase::Moving, Phase::Start));
        assert_eq!(failed(last), vec!["knee_angle"]);
    }
}
