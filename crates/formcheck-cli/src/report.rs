//! Human-readable rendering of session results.

use std::fmt::Write;

use formcheck_core::{ExerciseType, Phase};
use formcheck_engine::{SessionMetadata, SessionSummary};

pub fn summary(summary: &SessionSummary) -> String {
    let stats = &summary.stats;
    let mut out = String::new();

    let _ = writeln!(out, "Exercise:       {}", summary.exercise);
    let _ = writeln!(
        out,
        "Frames:         {} processed, {} analyzed",
        summary.frames_processed, summary.frames_analyzed
    );
    let _ = writeln!(out, "Reps:           {} over {} set(s)", stats.total_reps, summary.sets);
    let _ = writeln!(
        out,
        "Score:          {} (grade {}, best {}, worst {})",
        stats.average_score, stats.grade, stats.best_score, stats.worst_score
    );
    let _ = writeln!(out, "Consistency:    {} ({})", stats.consistency, stats.trend);
    let _ = writeln!(out, "Frame average:  {}", summary.average_frame_score);

    if summary.issues.is_empty() {
        let _ = writeln!(out, "Issues:         none");
    } else {
        let _ = writeln!(out, "Issues:");
        for issue in &summary.issues {
            let _ = writeln!(
                out,
                "  - {} ({} frames, {:.0}%, {:?}): {}",
                issue.description,
                issue.occurrences,
                issue.frequency * 100.0,
                issue.severity,
                issue.advice
            );
        }
    }

    out
}

pub fn metadata(metadata: &SessionMetadata, buffered_frames: usize) -> String {
    let mut out = String::new();
    let camera = &metadata.camera_config;

    let _ = writeln!(out, "Session:        {}", metadata.session_id);
    let _ = writeln!(out, "User:           {}", metadata.user_id);
    let _ = writeln!(out, "Exercise:       {}", metadata.exercise_type);
    let _ = writeln!(out, "Device:         {}", metadata.device_info.platform);
    let _ = writeln!(
        out,
        "Camera:         {}x{} @ {} fps ({:?})",
        camera.width, camera.height, camera.target_fps, camera.facing
    );
    let _ = writeln!(out, "Started:        {}", metadata.started_at.to_rfc3339());
    if let Some(ended) = metadata.ended_at {
        let elapsed = ended - metadata.started_at;
        let _ = writeln!(
            out,
            "Ended:          {} ({} s)",
            ended.to_rfc3339(),
            elapsed.num_seconds()
        );
    }
    let _ = writeln!(
        out,
        "Frames:         {} recorded, {} buffered, {} dropped",
        metadata.total_frames, buffered_frames, metadata.dropped_frames
    );
    let _ = writeln!(out, "Average fps:    {:.1}", metadata.average_fps);

    out
}

pub fn exercises() -> String {
    let phases = [Phase::Start, Phase::Moving, Phase::Peak, Phase::Returning];
    let mut out = String::new();
    for exercise in ExerciseType::ALL {
        let labels: Vec<_> = phases.iter().map(|p| exercise.phase_label(*p)).collect();
        let _ = writeln!(out, "{:<16}{}", exercise.as_str(), labels.join(" -> "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use formcheck_engine::{FormIssue, SessionStats, Severity};

    #[test]
    fn test_summary_lists_issues() {
        let report = SessionSummary {
            exercise: ExerciseType::Squat,
            stats: SessionStats::from_rep_scores(&[90, 80]),
            issues: vec![FormIssue {
                id: "back_straight".into(),
                description: "Back kept straight".into(),
                occurrences: 12,
                frequency: 0.3,
                severity: Severity::Medium,
                advice: "Keep your chest up".into(),
            }],
            rep_scores: vec![90, 80],
            frames_processed: 40,
            frames_analyzed: 38,
            average_frame_score: 84,
            sets: 1,
        };
        let text = summary(&report);
        assert!(text.contains("Reps:           2 over 1 set(s)"));
        assert!(text.contains("Back kept straight (12 frames, 30%, Medium): Keep your chest up"));
    }

    #[test]
    fn test_exercise_table() {
        let text = exercises();
        assert_eq!(text.lines().count(), 5);
        assert!(text.contains("squat           start -> descending -> bottom -> ascending"));
    }
}
