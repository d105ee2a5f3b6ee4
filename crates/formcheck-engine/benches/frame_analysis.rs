//! Benchmarks for the per-frame analysis pipeline.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use formcheck_core::geometry::angle_2d;
use formcheck_core::{EngineConfig, ExerciseType, LandmarkId, Timestamp};
use formcheck_engine::synthetic::{frame_for, rep_frames};
use formcheck_engine::{create_evaluator, Evaluator, SessionAnalyzer};

fn benchmark_geometry(c: &mut Criterion) {
    let frame = frame_for(ExerciseType::Squat, 120.0, Timestamp::from_millis(0), 0.9);
    let hip = frame.get(LandmarkId::LeftHip).map(|l| l.position).unwrap_or_default();
    let knee = frame.get(LandmarkId::LeftKnee).map(|l| l.position).unwrap_or_default();
    let ankle = frame.get(LandmarkId::LeftAnkle).map(|l| l.position).unwrap_or_default();

    c.bench_function("angle_2d", |b| {
        b.iter(|| angle_2d(black_box(&hip), black_box(&knee), black_box(&ankle)))
    });
}

fn benchmark_evaluators(c: &mut Criterion) {
    let config = EngineConfig::new();

    for exercise in ExerciseType::ALL {
        let frames = rep_frames(exercise, 1, 20, Timestamp::from_millis(0), 0.9);
        let mut evaluator = create_evaluator(exercise, &config);
        let mut i = 0;

        c.bench_function(&format!("analyze_{}", exercise), |b| {
            b.iter(|| {
                let eval = evaluator.analyze(black_box(&frames[i % frames.len()]));
                i += 1;
                eval
            })
        });
    }
}

fn benchmark_session_batch(c: &mut Criterion) {
    let config = EngineConfig::new();
    // One second of video at 30 fps
    let frames = rep_frames(ExerciseType::PushUp, 1, 10, Timestamp::from_millis(0), 0.9);
    let batch: Vec<_> = frames.iter().cycle().take(30).cloned().collect();

    c.bench_function("session_batch_30", |b| {
        b.iter(|| {
            let mut session = SessionAnalyzer::new(ExerciseType::PushUp, &config);
            for frame in &batch {
                session.process(black_box(frame));
            }
            session.summary()
        })
    });
}

criterion_group!(
    benches,
    benchmark_geometry,
    benchmark_evaluators,
    benchmark_session_batch
);
criterion_main!(benches);
