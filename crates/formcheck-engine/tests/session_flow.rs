//! End-to-end behavior of the analysis pipeline over synthetic sessions.

use std::time::{Duration, Instant};

use formcheck_core::{EngineConfig, ExerciseType, Phase, PoseFrame, Timestamp};
use formcheck_engine::synthetic::{frame_for, rep_frames, rep_range, FRAME_INTERVAL_MS};
use formcheck_engine::{
    consistency_score, create_evaluator, trend, DeviceInfo, Evaluator, FrameEvaluation,
    MemorySink, SessionAnalyzer, SessionExport, SessionRecorder, Trend,
};
use proptest::prelude::*;

fn evaluate_all(exercise: ExerciseType, frames: &[PoseFrame]) -> Vec<FrameEvaluation> {
    let mut evaluator = create_evaluator(exercise, &EngineConfig::new());
    frames.iter().map(|f| evaluator.analyze(f)).collect()
}

#[test]
fn test_analysis_is_deterministic() {
    for exercise in ExerciseType::ALL {
        let frames = rep_frames(exercise, 3, 12, Timestamp::from_millis(0), 0.9);
        assert_eq!(evaluate_all(exercise, &frames), evaluate_all(exercise, &frames));
    }
}

#[test]
fn test_reset_then_replay_matches_fresh_run() {
    let exercise = ExerciseType::ShoulderPress;
    let frames = rep_frames(exercise, 2, 12, Timestamp::from_millis(0), 0.9);

    let mut evaluator = create_evaluator(exercise, &EngineConfig::new());
    let first: Vec<_> = frames.iter().map(|f| evaluator.analyze(f)).collect();
    evaluator.reset();
    evaluator.reset();
    let second: Vec<_> = frames.iter().map(|f| evaluator.analyze(f)).collect();

    assert_eq!(first, second);
}

#[test]
fn test_every_exercise_counts_reps() {
    let config = EngineConfig::new();
    for exercise in ExerciseType::ALL {
        let mut session = SessionAnalyzer::new(exercise, &config);
        let mut reps = 0;
        for frame in rep_frames(exercise, 4, 15, Timestamp::from_millis(0), 0.9) {
            if session.process(&frame).rep.is_some() {
                reps += 1;
            }
        }
        assert_eq!(reps, 4, "{exercise}");
        assert_eq!(session.summary().stats.total_reps, 4, "{exercise}");
    }
}

#[test]
fn test_low_confidence_frames_score_zero_and_hold_phase() {
    let exercise = ExerciseType::Squat;
    let mut evaluator = create_evaluator(exercise, &EngineConfig::new());

    // Enter the descent first so a held phase is observable
    for i in 0..8 {
        evaluator.analyze(&frame_for(exercise, 120.0, Timestamp::from_millis(i * FRAME_INTERVAL_MS), 0.9));
    }
    let phase = evaluator.phase();
    assert_eq!(phase, Phase::Moving);

    for i in 8..20 {
        let eval = evaluator.analyze(&frame_for(exercise, 80.0, Timestamp::from_millis(i * FRAME_INTERVAL_MS), 0.3));
        assert_eq!(eval.score, 0);
        assert!(eval.gated);
        assert_eq!(eval.current_phase, phase);
    }
}

#[test]
fn test_noise_at_rest_never_counts() {
    let config = EngineConfig::new();
    let mut session = SessionAnalyzer::new(ExerciseType::Squat, &config);
    for i in 0..600 {
        let angle = 155.0 + 4.5 * ((i as f64) * 1.7).sin();
        let outcome = session.process(&frame_for(
            ExerciseType::Squat,
            angle,
            Timestamp::from_millis(i * FRAME_INTERVAL_MS),
            0.9,
        ));
        assert!(outcome.evaluation.transition.is_none());
    }
    assert_eq!(session.rep_count(), 0);
}

#[test]
fn test_batch_of_30_frames_is_fast() {
    let frames = rep_frames(ExerciseType::ArmCurl, 1, 10, Timestamp::from_millis(0), 0.9);
    let batch: Vec<_> = frames.into_iter().take(30).collect();
    let mut session = SessionAnalyzer::new(ExerciseType::ArmCurl, &EngineConfig::new());

    let start = Instant::now();
    for frame in &batch {
        session.process(frame);
    }
    assert!(start.elapsed().as_secs_f64() < 1.0);
}

#[test]
fn test_single_frame_analysis_is_fast() {
    // Generous bound for unoptimized builds
    let limit = Duration::from_millis(10);
    for exercise in ExerciseType::ALL {
        let mut evaluator = create_evaluator(exercise, &EngineConfig::new());
        for frame in rep_frames(exercise, 2, 15, Timestamp::from_millis(0), 0.9) {
            let start = Instant::now();
            evaluator.analyze(&frame);
            let elapsed = start.elapsed();
            assert!(elapsed < limit, "{exercise} took {elapsed:?}");
        }
    }
}

/// Reps that turn back `short` of the turnaround, with ramps and holds
fn partial_reps(exercise: ExerciseType, short: f64, reps: usize) -> Vec<PoseFrame> {
    let (rest, _) = rep_range(exercise);
    let ramp = |i: usize| rest + (short - rest) * i as f64 / 10.0;

    let mut angles = Vec::new();
    for _ in 0..reps {
        angles.extend((0..10).map(ramp));
        angles.extend(std::iter::repeat(short).take(5));
        angles.extend((0..10).rev().map(ramp));
        angles.extend(std::iter::repeat(rest).take(5));
    }
    angles
        .into_iter()
        .enumerate()
        .map(|(i, a)| frame_for(exercise, a, Timestamp::from_millis(i as i64 * FRAME_INTERVAL_MS), 0.9))
        .collect()
}

#[test]
fn test_partial_reps_are_reported() {
    let config = EngineConfig::new();
    let cases = [
        (ExerciseType::Squat, 125.0, "knee_angle"),
        (ExerciseType::PushUp, 120.0, "elbow_range"),
        (ExerciseType::SideRaise, 55.0, "arm_height"),
        (ExerciseType::ShoulderPress, 140.0, "lockout"),
    ];

    for (exercise, short, check) in cases {
        let mut session = SessionAnalyzer::new(exercise, &config);
        for frame in partial_reps(exercise, short, 5) {
            session.process(&frame);
        }

        let summary = session.summary();
        assert_eq!(summary.stats.total_reps, 0, "{exercise}");
        let issue = summary
            .issues
            .iter()
            .find(|i| i.id == check)
            .unwrap_or_else(|| panic!("{exercise}: no {check} issue in {:?}", summary.issues));
        assert_eq!(issue.occurrences, 5, "{exercise}");
        assert!(summary.average_frame_score < 100, "{exercise}");
    }
}

#[test]
fn test_session_aggregates() {
    assert_eq!(consistency_score(&[80, 80, 80, 80]), 100);
    assert!(consistency_score(&[20, 100]) < 100);
    assert_eq!(trend(&[60, 62, 61, 85, 88, 90]), Trend::Improving);
}

#[tokio::test]
async fn test_record_stop_export_replay() {
    let exercise = ExerciseType::SideRaise;
    let frames = rep_frames(exercise, 3, 12, Timestamp::from_millis(10_000), 0.9);

    let mut recorder = SessionRecorder::new(EngineConfig::new());
    recorder
        .start_recording("replay", "user", exercise, DeviceInfo::new("test"))
        .unwrap();
    for frame in &frames {
        recorder.record_frame(frame).unwrap();
    }
    let live = recorder.stop_recording(None).unwrap();

    let sink = MemorySink::new();
    recorder.flush(&sink).await.unwrap();
    let json = sink.exports().await[0].to_json().unwrap();

    // Replaying the exported frames reproduces the live analysis
    let export = SessionExport::from_json(&json).unwrap();
    let mut session = SessionAnalyzer::new(export.metadata.exercise_type, &EngineConfig::new());
    for frame in export.pose_frames() {
        session.process(&frame);
    }
    let replayed = session.summary();

    assert_eq!(live.stats.total_reps, 3);
    assert_eq!(replayed.stats, live.stats);
    assert_eq!(replayed.frames_analyzed, live.frames_analyzed);
}

proptest! {
    #[test]
    fn prop_scores_stay_in_bounds(
        angles in proptest::collection::vec(0.0f64..180.0, 1..120),
        confidence in 0.0f32..1.0,
    ) {
        let exercise = ExerciseType::PushUp;
        let mut evaluator = create_evaluator(exercise, &EngineConfig::new());
        for (i, angle) in angles.iter().enumerate() {
            let eval = evaluator.analyze(&frame_for(
                exercise,
                *angle,
                Timestamp::from_millis(i as i64 * FRAME_INTERVAL_MS),
                confidence,
            ));
            prop_assert!(eval.score <= 100);
            if eval.gated {
                prop_assert_eq!(eval.score, 0);
            }
        }
    }
}
