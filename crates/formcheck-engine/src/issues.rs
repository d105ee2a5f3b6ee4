//! Recurring form issue detection.
//!
//! A check that fails once is noise; a check that fails across many frames
//! of a session is a habit worth coaching. `IssueTracker` counts failures per
//! check and reports those above `IssueConfig::min_occurrences`.

use formcheck_core::{ExerciseType, IssueConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::evaluation::{FormCheckResult, FrameEvaluation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Grade by the fraction of analyzed frames in which the check failed
    pub fn from_frequency(frequency: f64) -> Self {
        if frequency >= 0.5 {
            Severity::High
        } else if frequency >= 0.25 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// A check that failed often enough to report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormIssue {
    pub id: String,
    pub description: String,
    pub occurrences: u32,
    /// Fraction of analyzed frames in which this check failed
    pub frequency: f64,
    pub severity: Severity,
    pub advice: String,
}

#[derive(Debug, Clone)]
struct IssueEntry {
    id: &'static str,
    description: &'static str,
    occurrences: u32,
}

/// Per-check failure counter
#[derive(Debug, Clone, Default)]
pub struct IssueTracker {
    // first-seen order keeps reporting deterministic
    entries: Vec<IssueEntry>,
    index: HashMap<&'static str, usize>,
    total_frames: u32,
}

impl IssueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count the failures of one analyzed frame
    pub fn record(&mut self, checks: &[FormCheckResult]) {
        self.total_frames += 1;

        for check in checks.iter().filter(|c| !c.passed) {
            let slot = match self.index.get(check.id) {
                Some(&slot) => slot,
                None => {
                    self.entries.push(IssueEntry {
                        id: check.id,
                        description: check.description,
                        occurrences: 0,
                    });
                    self.index.insert(check.id, self.entries.len() - 1);
                    self.entries.len() - 1
                }
            };
            self.entries[slot].occurrences += 1;
        }
    }

    pub fn total_frames(&self) -> u32 {
        self.total_frames
    }

    /// Checks that failed at least `min_occurrences` times, most frequent first
    pub fn issues(&self, exercise: ExerciseType, min_occurrences: u32) -> Vec<FormIssue> {
        let mut issues: Vec<FormIssue> = self
            .entries
            .iter()
            .filter(|e| e.occurrences >= min_occurrences)
            .map(|e| {
                let frequency = if self.total_frames == 0 {
                    0.0
                } else {
                    e.occurrences as f64 / self.total_frames as f64
                };
                FormIssue {
                    id: e.id.to_string(),
                    description: e.description.to_string(),
                    occurrences: e.occurrences,
                    frequency,
                    severity: Severity::from_frequency(frequency),
                    advice: advice_for(exercise, e.description).to_string(),
                }
            })
            .collect();

        issues.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));
        issues
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.total_frames = 0;
    }
}

/// Recurring issues over a batch of evaluations. Gated frames are skipped.
pub fn analyze_issues(
    exercise: ExerciseType,
    frames: &[FrameEvaluation],
    config: &IssueConfig,
) -> Vec<FormIssue> {
    let mut tracker = IssueTracker::new();
    for frame in frames.iter().filter(|f| !f.gated) {
        tracker.record(&frame.checks);
    }
    tracker.issues(exercise, config.min_occurrences)
}

const GENERIC_ADVICE: &str = "Slow down and focus on controlled, full-range movement";

/// Coaching tip for a failed check, matched on its description
pub fn advice_for(exercise: ExerciseType, description: &str) -> &'static str {
    let table: &[(&str, &str)] = match exercise {
        ExerciseType::Squat => &[
            ("knee angle", "Lower until your thighs are about parallel to the floor"),
            ("toes", "Sit back into your hips so your knees stay behind your toes"),
            ("back", "Keep your chest up and your back neutral"),
        ],
        ExerciseType::PushUp => &[
            ("elbow", "Lower your chest until your elbows reach about 90 degrees"),
            ("body line", "Brace your core to keep a straight line from head to heels"),
            ("hips", "Squeeze your glutes so your hips don't drop"),
        ],
        ExerciseType::ArmCurl => &[
            ("elbows", "Pin your elbows to your sides throughout the curl"),
            ("shoulders", "Keep your shoulders down and relaxed"),
            ("swing", "Use a lighter weight and avoid rocking your torso"),
        ],
        ExerciseType::SideRaise => &[
            ("shoulder height", "Raise your arms to shoulder height, no higher"),
            ("symmetric", "Lift both arms at the same speed and height"),
            ("straight", "Keep only a slight bend in your elbows"),
        ],
        ExerciseType::ShoulderPress => &[
            ("above head", "Press the weight all the way overhead"),
            ("extension", "Fully extend your elbows at the top"),
            ("evenly", "Push both arms up at the same pace"),
        ],
    };

    let description = description.to_lowercase();
    table
        .iter()
        .find(|(keyword, _)| description.contains(keyword))
        .map(|(_, advice)| *advice)
        .unwrap_or(GENERIC_ADVICE)
}
