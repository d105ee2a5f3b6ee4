//! Repetition counting over phase transitions.

use formcheck_core::{ExerciseType, Phase, Timestamp};
use serde::{Deserialize, Serialize};

use crate::phase::PhaseTransition;

/// Transition that completes one repetition. Every supported exercise closes
/// its cycle the same way: back from the return stroke into rest.
pub const REP_TRANSITION: (Phase, Phase) = (Phase::Returning, Phase::Start);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepCounterState {
    /// Reps in the current set
    pub rep_count: u32,
    pub set_count: u32,
    pub current_phase: Phase,
}

impl Default for RepCounterState {
    fn default() -> Self {
        Self {
            rep_count: 0,
            set_count: 1,
            current_phase: Phase::Start,
        }
    }
}

/// Emitted once per completed repetition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepCompleted {
    pub exercise: ExerciseType,
    pub rep_number: u32,
    pub set_number: u32,
    pub timestamp: Timestamp,
    /// Most advanced smoothed driving angle reached during the rep
    pub rep_extreme: Option<f64>,
    /// Frame scores of the rep, as supplied by the caller
    pub frame_scores: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct RepCounter {
    exercise: ExerciseType,
    state: RepCounterState,
}

impl RepCounter {
    pub fn new(exercise: ExerciseType) -> Self {
        Self {
            exercise,
            state: RepCounterState::default(),
        }
    }

    /// Observe one phase transition. Returns the completed rep when the
    /// transition closes a cycle.
    pub fn observe(&mut self, transition: &PhaseTransition, frame_scores: &[u8]) -> Option<RepCompleted> {
        self.state.current_phase = transition.to;

        if !transition.is(REP_TRANSITION.0, REP_TRANSITION.1) {
            return None;
        }

        self.state.rep_count += 1;

        tracing::info!(
            exercise = %self.exercise,
            rep = self.state.rep_count,
            set = self.state.set_count,
            "repetition completed"
        );

        Some(RepCompleted {
            exercise: self.exercise,
            rep_number: self.state.rep_count,
            set_number: self.state.set_count,
            timestamp: transition.timestamp,
            rep_extreme: transition.rep_extreme,
            frame_scores: frame_scores.to_vec(),
        })
    }

    /// Close the current set. Set boundaries are only ever explicit.
    pub fn start_new_set(&mut self) {
        self.state.set_count += 1;
        self.state.rep_count = 0;
        tracing::info!(exercise = %self.exercise, set = self.state.set_count, "new set started");
    }

    pub fn state(&self) -> RepCounterState {
        self.state
    }

    pub fn rep_count(&self) -> u32 {
        self.state.rep_count
    }

    pub fn set_count(&self) -> u32 {
        self.state.set_count
    }

    pub fn exercise(&self) -> ExerciseType {
        self.exercise
    }

    pub fn reset(&mut self) {
        self.state = RepCounterState::default();
    }
}
