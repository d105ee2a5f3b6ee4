//! One exercise session: evaluation, rep counting, scoring and issues.

use formcheck_core::{EngineConfig, ExerciseType, IssueConfig, Phase, PoseFrame};
use serde::{Deserialize, Serialize};

use crate::evaluation::FrameEvaluation;
use crate::evaluators::{create_evaluator, Evaluator, ExerciseEvaluator};
use crate::issues::{FormIssue, IssueTracker};
use crate::reps::{RepCompleted, RepCounter, RepCounterState};
use crate::scoring::{rep_score, SessionStats};

/// What one processed frame produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameOutcome {
    pub evaluation: FrameEvaluation,
    /// Set on the frame that completed a repetition
    pub rep: Option<RepCompleted>,
}

/// End-of-session report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub exercise: ExerciseType,
    pub stats: SessionStats,
    pub issues: Vec<FormIssue>,
    pub rep_scores: Vec<u8>,
    pub frames_processed: u64,
    /// Frames that passed the confidence gate
    pub frames_analyzed: u64,
    pub average_frame_score: u8,
    pub sets: u32,
}

/// Drives the evaluator, rep counter and issue tracker for one session
#[derive(Debug, Clone)]
pub struct SessionAnalyzer {
    evaluator: ExerciseEvaluator,
    counter: RepCounter,
    issue_config: IssueConfig,
    issues: IssueTracker,
    current_rep_scores: Vec<u8>,
    rep_scores: Vec<u8>,
    frames_processed: u64,
    frames_analyzed: u64,
    score_sum: u64,
}

impl SessionAnalyzer {
    pub fn new(exercise: ExerciseType, config: &EngineConfig) -> Self {
        Self {
            evaluator: create_evaluator(exercise, config),
            counter: RepCounter::new(exercise),
            issue_config: config.issues,
            issues: IssueTracker::new(),
            current_rep_scores: Vec::new(),
            rep_scores: Vec::new(),
            frames_processed: 0,
            frames_analyzed: 0,
            score_sum: 0,
        }
    }

    pub fn exercise(&self) -> ExerciseType {
        self.evaluator.exercise()
    }

    /// Analyze one frame. Frames must arrive in timestamp order.
    pub fn process(&mut self, frame: &PoseFrame) -> FrameOutcome {
        self.frames_processed += 1;
        let evaluation = self.evaluator.analyze(frame);

        if evaluation.gated {
            return FrameOutcome { evaluation, rep: None };
        }

        self.frames_analyzed += 1;
        self.score_sum += evaluation.score as u64;
        self.issues.record(&evaluation.checks);

        let in_rep = evaluation.current_phase != Phase::Start || evaluation.transition.is_some();
        if in_rep {
            self.current_rep_scores.push(evaluation.score);
        }

        let rep = evaluation
            .transition
            .and_then(|t| self.counter.observe(&t, &self.current_rep_scores));

        if let Some(rep) = &rep {
            let score = rep_score(&rep.frame_scores);
            self.rep_scores.push(score);
            tracing::debug!(
                exercise = %rep.exercise,
                rep = rep.rep_number,
                score,
                "rep scored"
            );
        }

        if evaluation.current_phase == Phase::Start {
            self.current_rep_scores.clear();
        }

        FrameOutcome { evaluation, rep }
    }

    pub fn start_new_set(&mut self) {
        self.counter.start_new_set();
    }

    pub fn rep_state(&self) -> RepCounterState {
        self.counter.state()
    }

    pub fn rep_count(&self) -> u32 {
        self.counter.rep_count()
    }

    /// Scores of every completed rep, across sets
    pub fn rep_scores(&self) -> &[u8] {
        &self.rep_scores
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats::from_rep_scores(&self.rep_scores)
    }

    pub fn issues(&self) -> Vec<FormIssue> {
        self.issues
            .issues(self.exercise(), self.issue_config.min_occurrences)
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn frames_analyzed(&self) -> u64 {
        self.frames_analyzed
    }

    pub fn average_frame_score(&self) -> u8 {
        if self.frames_analyzed == 0 {
            return 0;
        }
        (self.score_sum as f64 / self.frames_analyzed as f64).round() as u8
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            exercise: self.exercise(),
            stats: self.stats(),
            issues: self.issues(),
            rep_scores: self.rep_scores.clone(),
            frames_processed: self.frames_processed,
            frames_analyzed: self.frames_analyzed,
            average_frame_score: self.average_frame_score(),
            sets: self.counter.set_count(),
        }
    }

    /// Back to the freshly constructed state
    pub fn reset(&mut self) {
        self.evaluator.reset();
        self.counter.reset();
        self.issues.reset();
        self.current_rep_scores.clear();
        self.rep_scores.clear();
        self.frames_processed = 0;
        self.frames_analyzed = 0;
        self.score_sum = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{frame_for, rep_frames};
    use crate::scoring::{Grade, Trend};
    use formcheck_core::Timestamp;

    #[test]
    fn test_counts_clean_reps() {
        let config = EngineConfig::new();
        let mut session = SessionAnalyzer::new(ExerciseType::Squat, &config);

        let mut completed = Vec::new();
        for frame in rep_frames(ExerciseType::Squat, 3, 15, Timestamp::from_millis(0), 0.9) {
            if let Some(rep) = session.process(&frame).rep {
                completed.push(rep);
            }
        }

        assert_eq!(completed.len(), 3);
        assert_eq!(completed[2].rep_number, 3);
        assert!(completed.iter().all(|r| !r.frame_scores.is_empty()));

        let summary = session.summary();
        assert_eq!(summary.stats.total_reps, 3);
        assert_eq!(summary.stats.average_score, 100);
        assert_eq!(summary.stats.consistency, 100);
        assert_eq!(summary.stats.trend, Trend::Stable);
        assert_eq!(summary.stats.grade, Grade::S);
        assert!(summary.issues.is_empty());
        assert_eq!(summary.sets, 1);
    }

    #[test]
    fn test_gated_frames_leave_state_alone() {
        let config = EngineConfig::new();
        let mut session = SessionAnalyzer::new(ExerciseType::PushUp, &config);
        for i in 0..20 {
            let outcome = session.process(&frame_for(ExerciseType::PushUp, 80.0, Timestamp::from_millis(i * 33), 0.3));
            assert!(outcome.evaluation.gated);
            assert_eq!(outcome.evaluation.current_phase, Phase::Start);
        }
        assert_eq!(session.frames_processed(), 20);
        assert_eq!(session.frames_analyzed(), 0);
        assert_eq!(session.average_frame_score(), 0);
        assert_eq!(session.rep_count(), 0);
    }

    #[test]
    fn test_rep_counts_continue_across_sets() {
        let config = EngineConfig::new();
        let mut session = SessionAnalyzer::new(ExerciseType::ArmCurl, &config);
        let frames = rep_frames(ExerciseType::ArmCurl, 2, 10, Timestamp::from_millis(0), 0.9);
        let (first, second) = frames.split_at(frames.len() / 2);

        first.iter().for_each(|f| {
            session.process(f);
        });
        session.start_new_set();
        second.iter().for_each(|f| {
            session.process(f);
        });

        assert_eq!(session.rep_count(), 1);
        assert_eq!(session.rep_state().set_count, 2);
        assert_eq!(session.rep_scores().len(), 2);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let config = EngineConfig::new();
        let mut session = SessionAnalyzer::new(ExerciseType::SideRaise, &config);
        for frame in rep_frames(ExerciseType::SideRaise, 1, 10, Timestamp::from_millis(0), 0.9) {
            session.process(&frame);
        }
        session.reset();
        let once = session.summary();
        session.reset();
        assert_eq!(session.summary(), once);
        assert_eq!(once.frames_processed, 0);
        assert_eq!(once.stats.total_reps, 0);
    }
}
