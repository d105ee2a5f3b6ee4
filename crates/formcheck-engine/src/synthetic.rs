//! Synthetic pose generation for tests, benchmarks and demos.
//!
//! Each builder places a skeleton in normalized image space (y down) so that
//! the exercise's driving angle equals the requested value exactly and every
//! form check passes. Both body sides are populated.

use formcheck_core::{ExerciseType, LandmarkId, PoseFrame, PoseLandmark, Position3D, Timestamp};

/// Frame spacing of generated sequences (~30 fps)
pub const FRAME_INTERVAL_MS: i64 = 33;

/// Frames held at the rest and peak positions of a generated rep
const HOLD_FRAMES: usize = 5;

const SEGMENT: f64 = 0.15;

fn put(frame: &mut PoseFrame, id: LandmarkId, x: f64, y: f64, confidence: f32) {
    frame.insert(PoseLandmark::new(id, Position3D::new(x, y, 0.0), confidence));
}

fn put_both(frame: &mut PoseFrame, left: LandmarkId, right: LandmarkId, x: f64, y: f64, confidence: f32) {
    put(frame, left, x, y, confidence);
    put(frame, right, x, y, confidence);
}

/// Side view squat with the given knee angle (hip-knee-ankle)
pub fn squat_frame(knee_angle: f64, timestamp: Timestamp, confidence: f32) -> PoseFrame {
    use LandmarkId::*;
    let mut frame = PoseFrame::new(timestamp);
    let theta = knee_angle.to_radians();

    let (knee_x, knee_y) = (0.5, 0.7);
    let ankle_x = knee_x + 0.2 * theta.sin();
    let ankle_y = knee_y - 0.2 * theta.cos();

    put_both(&mut frame, LeftShoulder, RightShoulder, 0.5, 0.3, confidence);
    put_both(&mut frame, LeftHip, RightHip, 0.5, 0.5, confidence);
    put_both(&mut frame, LeftKnee, RightKnee, knee_x, knee_y, confidence);
    put_both(&mut frame, LeftAnkle, RightAnkle, ankle_x, ankle_y, confidence);
    put_both(&mut frame, LeftFootIndex, RightFootIndex, ankle_x + 0.05, ankle_y, confidence);
    frame
}

/// Plank-position push-up with the given elbow angle
pub fn push_up_frame(elbow_angle: f64, timestamp: Timestamp, confidence: f32) -> PoseFrame {
    use LandmarkId::*;
    let mut frame = PoseFrame::new(timestamp);
    let theta = elbow_angle.to_radians();

    let (shoulder_x, shoulder_y) = (0.3, 0.5);
    let (elbow_x, elbow_y) = (shoulder_x, shoulder_y + SEGMENT);

    put_both(&mut frame, LeftShoulder, RightShoulder, shoulder_x, shoulder_y, confidence);
    put_both(&mut frame, LeftElbow, RightElbow, elbow_x, elbow_y, confidence);
    put_both(
        &mut frame,
        LeftWrist,
        RightWrist,
        elbow_x + SEGMENT * theta.sin(),
        elbow_y - SEGMENT * theta.cos(),
        confidence,
    );
    put_both(&mut frame, LeftHip, RightHip, 0.55, 0.5, confidence);
    put_both(&mut frame, LeftAnkle, RightAnkle, 0.8, 0.5, confidence);
    frame
}

/// Standing curl with the given elbow angle; upper arm and torso stay still
pub fn arm_curl_frame(elbow_angle: f64, timestamp: Timestamp, confidence: f32) -> PoseFrame {
    use LandmarkId::*;
    let mut frame = PoseFrame::new(timestamp);
    let theta = elbow_angle.to_radians();

    let (elbow_x, elbow_y) = (0.5, 0.45);

    put_both(&mut frame, LeftShoulder, RightShoulder, 0.5, 0.3, confidence);
    put_both(&mut frame, LeftHip, RightHip, 0.5, 0.6, confidence);
    put_both(&mut frame, LeftElbow, RightElbow, elbow_x, elbow_y, confidence);
    put_both(
        &mut frame,
        LeftWrist,
        RightWrist,
        elbow_x + SEGMENT * theta.sin(),
        elbow_y - SEGMENT * theta.cos(),
        confidence,
    );
    frame
}

/// Front view lateral raise with per-arm abduction (hip-shoulder-elbow)
pub fn side_raise_frame(left: f64, right: f64, timestamp: Timestamp, confidence: f32) -> PoseFrame {
    use LandmarkId::*;
    let mut frame = PoseFrame::new(timestamp);

    // Subject faces the camera, so their left side appears on the image right
    let arms = [
        (LeftShoulder, LeftElbow, LeftWrist, LeftHip, 0.6, 1.0, left),
        (RightShoulder, RightElbow, RightWrist, RightHip, 0.4, -1.0, right),
    ];

    for (shoulder, elbow, wrist, hip, x, outward, elevation) in arms {
        let phi = elevation.to_radians();
        let (dx, dy) = (outward * phi.sin(), phi.cos());
        put(&mut frame, shoulder, x, 0.3, confidence);
        put(&mut frame, hip, x, 0.6, confidence);
        put(&mut frame, elbow, x + SEGMENT * dx, 0.3 + SEGMENT * dy, confidence);
        put(&mut frame, wrist, x + 2.0 * SEGMENT * dx, 0.3 + 2.0 * SEGMENT * dy, confidence);
    }
    frame
}

/// Front view overhead press with the given elbow angle on both arms;
/// forearms stay vertical
pub fn shoulder_press_frame(elbow_angle: f64, timestamp: Timestamp, confidence: f32) -> PoseFrame {
    use LandmarkId::*;
    let mut frame = PoseFrame::new(timestamp);
    let alpha = (elbow_angle - 90.0).to_radians();

    put(&mut frame, Nose, 0.5, 0.2, confidence);

    let arms = [
        (LeftShoulder, LeftElbow, LeftWrist, 0.6, 1.0),
        (RightShoulder, RightElbow, RightWrist, 0.4, -1.0),
    ];

    for (shoulder, elbow, wrist, x, outward) in arms {
        let elbow_x = x + outward * SEGMENT * alpha.cos();
        let elbow_y = 0.35 - SEGMENT * alpha.sin();
        put(&mut frame, shoulder, x, 0.35, confidence);
        put(&mut frame, elbow, elbow_x, elbow_y, confidence);
        put(&mut frame, wrist, elbow_x, elbow_y - SEGMENT, confidence);
    }
    frame
}

/// Well-formed frame for any exercise at the given driving angle
pub fn frame_for(exercise: ExerciseType, angle: f64, timestamp: Timestamp, confidence: f32) -> PoseFrame {
    match exercise {
        ExerciseType::Squat => squat_frame(angle, timestamp, confidence),
        ExerciseType::PushUp => push_up_frame(angle, timestamp, confidence),
        ExerciseType::ArmCurl => arm_curl_frame(angle, timestamp, confidence),
        ExerciseType::SideRaise => side_raise_frame(angle, angle, timestamp, confidence),
        ExerciseType::ShoulderPress => shoulder_press_frame(angle, timestamp, confidence),
    }
}

/// Rest and peak driving angles of a clean rep
pub fn rep_range(exercise: ExerciseType) -> (f64, f64) {
    match exercise {
        ExerciseType::Squat => (170.0, 80.0),
        ExerciseType::PushUp => (170.0, 75.0),
        ExerciseType::ArmCurl => (165.0, 45.0),
        ExerciseType::SideRaise => (10.0, 90.0),
        ExerciseType::ShoulderPress => (90.0, 175.0),
    }
}

/// Driving angles of one clean rep: ramp to the peak, hold, ramp back, hold
pub fn rep_cycle(exercise: ExerciseType, steps: usize) -> Vec<f64> {
    let (rest, peak) = rep_range(exercise);
    let steps = steps.max(1);
    let lerp = |i: usize| rest + (peak - rest) * i as f64 / steps as f64;

    let mut angles = Vec::with_capacity(2 * (steps + HOLD_FRAMES));
    angles.extend((0..steps).map(lerp));
    angles.extend(std::iter::repeat(peak).take(HOLD_FRAMES));
    angles.extend((1..=steps).rev().map(|i| lerp(i - 1)));
    angles.extend(std::iter::repeat(rest).take(HOLD_FRAMES));
    angles
}

/// Frames for `reps` consecutive clean reps starting at `start`
pub fn rep_frames(
    exercise: ExerciseType,
    reps: usize,
    steps: usize,
    start: Timestamp,
    confidence: f32,
) -> Vec<PoseFrame> {
    let cycle = rep_cycle(exercise, steps);
    cycle
        .iter()
        .cycle()
        .take(cycle.len() * reps)
        .enumerate()
        .map(|(i, &angle)| {
            let ts = Timestamp::from_millis(start.as_millis() + i as i64 * FRAME_INTERVAL_MS);
            frame_for(exercise, angle, ts, confidence)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use formcheck_core::geometry::angle_2d;

    fn angle(frame: &PoseFrame, a: LandmarkId, b: LandmarkId, c: LandmarkId) -> f64 {
        angle_2d(
            &frame.get(a).unwrap().position,
            &frame.get(b).unwrap().position,
            &frame.get(c).unwrap().position,
        )
    }

    #[test]
    fn test_builders_hit_requested_angle() {
        use LandmarkId::*;
        let ts = Timestamp::from_millis(0);
        for target in [60.0, 95.0, 150.0, 175.0] {
            let f = squat_frame(target, ts, 0.9);
            assert_relative_eq!(angle(&f, LeftHip, LeftKnee, LeftAnkle), target, epsilon = 1e-6);

            let f = push_up_frame(target, ts, 0.9);
            assert_relative_eq!(angle(&f, RightShoulder, RightElbow, RightWrist), target, epsilon = 1e-6);

            let f = arm_curl_frame(target, ts, 0.9);
            assert_relative_eq!(angle(&f, LeftShoulder, LeftElbow, LeftWrist), target, epsilon = 1e-6);

            let f = shoulder_press_frame(target, ts, 0.9);
            assert_relative_eq!(angle(&f, LeftShoulder, LeftElbow, LeftWrist), target, epsilon = 1e-6);
            assert_relative_eq!(angle(&f, RightShoulder, RightElbow, RightWrist), target, epsilon = 1e-6);
        }

        let f = side_raise_frame(40.0, 85.0, ts, 0.9);
        assert_relative_eq!(angle(&f, LeftHip, LeftShoulder, LeftElbow), 40.0, epsilon = 1e-6);
        assert_relative_eq!(angle(&f, RightHip, RightShoulder, RightElbow), 85.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rep_cycle_shape() {
        let angles = rep_cycle(ExerciseType::Squat, 10);
        assert_eq!(angles.len(), 30);
        assert_eq!(angles[0], 170.0);
        assert_eq!(angles[10], 80.0);
        assert_eq!(*angles.last().unwrap(), 170.0);
    }

    #[test]
    fn test_rep_frames_timestamps() {
        let frames = rep_frames(ExerciseType::PushUp, 2, 8, Timestamp::from_millis(1000), 0.9);
        assert_eq!(frames.len(), 2 * rep_cycle(ExerciseType::PushUp, 8).len());
        assert_eq!(frames[1].timestamp.as_millis(), 1000 + FRAME_INTERVAL_MS);
    }
}
