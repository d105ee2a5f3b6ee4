//! Subcommand implementations.

use std::path::Path;

use anyhow::Context;
use formcheck_core::{EngineConfig, ExerciseType, Timestamp};
use formcheck_engine::synthetic::rep_frames;
use formcheck_engine::{
    DeviceInfo, JsonFileSink, SessionAnalyzer, SessionExport, SessionRecorder, SessionSink,
    SessionSummary,
};

use crate::{report, InspectArgs, ReplayArgs, SimulateArgs};

/// Engine configuration from a file, or from the environment alone
pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let config = match path {
        Some(path) => {
            let path = path
                .to_str()
                .with_context(|| format!("config path is not valid UTF-8: {}", path.display()))?;
            EngineConfig::from_file(path).with_context(|| format!("loading {}", path))?
        }
        None => EngineConfig::from_env().context("loading configuration from environment")?,
    };
    Ok(config)
}

pub async fn read_export(path: &Path) -> anyhow::Result<SessionExport> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    SessionExport::from_json(&json).with_context(|| format!("parsing {}", path.display()))
}

/// Run the recorded frames through a fresh analyzer
pub fn analyze_export(
    export: &SessionExport,
    exercise: Option<ExerciseType>,
    config: &EngineConfig,
) -> SessionSummary {
    let exercise = exercise.unwrap_or(export.metadata.exercise_type);
    let mut analyzer = SessionAnalyzer::new(exercise, config);
    for frame in export.pose_frames() {
        analyzer.process(&frame);
    }
    analyzer.summary()
}

pub async fn replay(args: ReplayArgs, config: &EngineConfig) -> anyhow::Result<()> {
    let mut export = read_export(&args.input).await?;
    tracing::info!(
        session_id = %export.metadata.session_id,
        frames = export.frames.len(),
        "replaying session"
    );

    if export.frames.len() as u64 != export.metadata.total_frames {
        tracing::warn!(
            buffered = export.frames.len(),
            recorded = export.metadata.total_frames,
            "export holds only the most recent frames; replay covers the buffered window"
        );
    }

    let summary = analyze_export(&export, args.exercise, config);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", report::summary(&summary));
    }

    if let Some(dir) = args.output {
        if let Some(exercise) = args.exercise {
            export.metadata.exercise_type = exercise;
        }
        export.summary = Some(summary);
        let sink = JsonFileSink::new(&dir);
        sink.persist(&export).await?;
        println!("Wrote {}", sink.path_for(&export.metadata.session_id).display());
    }

    Ok(())
}

pub async fn inspect(args: InspectArgs) -> anyhow::Result<()> {
    let export = read_export(&args.input).await?;
    print!("{}", report::metadata(&export.metadata, export.frames.len()));
    if let Some(summary) = &export.summary {
        println!();
        print!("{}", report::summary(summary));
    }
    Ok(())
}

pub async fn simulate(args: SimulateArgs, config: &EngineConfig) -> anyhow::Result<()> {
    let mut recorder = SessionRecorder::new(config.clone());
    recorder.start_recording(
        args.session_id.as_str(),
        "simulator",
        args.exercise,
        DeviceInfo::new(std::env::consts::OS),
    )?;

    let frames = rep_frames(
        args.exercise,
        args.reps,
        args.steps,
        Timestamp::from_millis(0),
        args.confidence,
    );
    for frame in &frames {
        recorder.record_frame(frame)?;
    }

    let summary = recorder.stop_recording(None)?;
    let sink = JsonFileSink::new(&args.output);
    recorder.flush(&sink).await?;

    print!("{}", report::summary(&summary));
    println!("Wrote {}", sink.path_for(&args.session_id).display());
    Ok(())
}

pub fn exercises() {
    print!("{}", report::exercises());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulate_args(dir: &Path, exercise: ExerciseType) -> SimulateArgs {
        SimulateArgs {
            exercise,
            reps: 3,
            steps: 12,
            confidence: 0.9,
            session_id: "demo".into(),
            output: dir.to_path_buf(),
        }
    }

    #[tokio::test]
    async fn test_simulate_then_replay() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::new();
        simulate(simulate_args(dir.path(), ExerciseType::ArmCurl), &config)
            .await
            .unwrap();

        let export = read_export(&dir.path().join("demo.json")).await.unwrap();
        assert_eq!(export.metadata.exercise_type, ExerciseType::ArmCurl);

        let replayed = analyze_export(&export, None, &config);
        assert_eq!(replayed.stats.total_reps, 3);
        assert_eq!(Some(&replayed), export.summary.as_ref());
    }

    #[tokio::test]
    async fn test_replay_writes_reanalyzed_export() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::new();
        simulate(simulate_args(dir.path(), ExerciseType::Squat), &config)
            .await
            .unwrap();

        let out = dir.path().join("out");
        replay(
            ReplayArgs {
                input: dir.path().join("demo.json"),
                exercise: None,
                json: true,
                output: Some(out.clone()),
            },
            &config,
        )
        .await
        .unwrap();

        let export = read_export(&out.join("demo.json")).await.unwrap();
        assert_eq!(export.summary.unwrap().stats.total_reps, 3);
    }

    #[tokio::test]
    async fn test_missing_file_is_reported() {
        let err = read_export(Path::new("/nonexistent/session.json")).await.unwrap_err();
        assert!(err.to_string().contains("reading"));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("formcheck.toml");
        std::fs::write(&path, "smoothing_window = 7\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.smoothing_window, 7);
    }
}
