//! Exercise phase state machine.
//!
//! One machine runs per session. It consumes the exercise's driving joint
//! angle, smooths it with a moving average, and advances through
//! `Start → Moving → Peak → Returning → Start`.
//!
//! ## Hysteresis
//!
//! Every boundary has two thresholds. For a squat (knee angle, decreasing):
//!
//! ```text
//!   rest.enter 160   rest.exit 150        peak.exit 110   peak.enter 100
//!   ──────┼──────────────┼──────────────────────┼───────────────┼──────▶ deeper
//!     back to Start   leave Start          leave Peak       enter Peak
//! ```
//!
//! A smoothed angle wandering between 150 and 160 can neither leave nor
//! re-enter `Start`, so boundary noise never produces phase flicker.

use formcheck_core::{MovingAverage, Phase, PhaseThresholds, Timestamp};
use serde::{Deserialize, Serialize};

/// Machine state: the current phase plus the most advanced angle seen since
/// leaving `Start`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseState {
    pub phase: Phase,
    pub rep_extreme: Option<f64>,
}

impl Default for PhaseState {
    fn default() -> Self {
        Self::initial()
    }
}

impl PhaseState {
    pub fn initial() -> Self {
        Self {
            phase: Phase::Start,
            rep_extreme: None,
        }
    }

    /// Pure transition function
    pub fn next(self, angle: f64, t: &PhaseThresholds) -> PhaseState {
        use Phase::*;

        let phase = match self.phase {
            Start if t.beyond(angle, t.rest.exit) => Moving,
            Moving if t.reached(angle, t.peak.enter) => Peak,
            Moving if t.returned(angle, t.rest.enter) => Start,
            Peak if t.short_of(angle, t.peak.exit) => Returning,
            Returning if t.returned(angle, t.rest.enter) => Start,
            Returning if t.reached(angle, t.peak.enter) => Peak,
            unchanged => unchanged,
        };

        let rep_extreme = match phase {
            Start => None,
            _ => Some(match self.rep_extreme {
                Some(extreme) if !t.beyond(angle, extreme) => extreme,
                _ => angle,
            }),
        };

        PhaseState { phase, rep_extreme }
    }
}

/// Phase change event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: Phase,
    pub to: Phase,
    pub timestamp: Timestamp,
    /// Smoothed angle that triggered the transition
    pub angle: f64,
    /// Most advanced smoothed angle of the rep in progress (or just finished)
    pub rep_extreme: Option<f64>,
}

impl PhaseTransition {
    pub fn is(&self, from: Phase, to: Phase) -> bool {
        self.from == from && self.to == to
    }
}

/// Stateful driver around `PhaseState::next`
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    thresholds: PhaseThresholds,
    smoother: MovingAverage,
    state: PhaseState,
}

impl PhaseMachine {
    pub fn new(thresholds: PhaseThresholds, smoothing_window: usize) -> Self {
        Self {
            thresholds,
            smoother: MovingAverage::new(smoothing_window),
            state: PhaseState::initial(),
        }
    }

    /// Feed one raw driving angle; returns the transition it caused, if any.
    ///
    /// Non-finite angles are ignored so they never reach the smoother.
    pub fn update(&mut self, raw_angle: f64, timestamp: Timestamp) -> Option<PhaseTransition> {
        if !raw_angle.is_finite() {
            return None;
        }

        let smoothed = self.smoother.update(raw_angle);
        let prev = self.state;
        let next = prev.next(smoothed, &self.thresholds);
        self.state = next;

        if next.phase == prev.phase {
            return None;
        }

        let rep_extreme = if next.phase == Phase::Start {
            prev.rep_extreme
        } else {
            next.rep_extreme
        };

        tracing::debug!(
            from = ?prev.phase,
            to = ?next.phase,
            angle = smoothed,
            timestamp = timestamp.as_millis(),
            "phase transition"
        );

        Some(PhaseTransition {
            from: prev.phase,
            to: next.phase,
            timestamp,
            angle: smoothed,
            rep_extreme,
        })
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn state(&self) -> PhaseState {
        self.state
    }

    pub fn smoothed_angle(&self) -> Option<f64> {
        self.smoother.value()
    }

    pub fn rep_extreme(&self) -> Option<f64> {
        self.state.rep_extreme
    }

    pub fn thresholds(&self) -> &PhaseThresholds {
        &self.thresholds
    }

    pub fn reset(&mut self) {
        self.smoother.reset();
        self.state = PhaseState::initial();
    }
}
