//! # Formcheck-Engine
//!
//! Real-time exercise-form evaluation over a stream of pose landmark frames.
//!
//! ## Per-frame pipeline
//!
//! Each inbound `PoseFrame` is fully analyzed before the next is accepted:
//!
//! 1. **Gating**: the exercise's required landmarks must clear the minimum
//!    confidence tier, otherwise the frame scores 0 and the phase is left alone
//! 2. **Measurement**: joint angles and positions via the geometry kernel
//! 3. **Phase tracking**: the smoothed driving angle advances a hysteresis
//!    state machine (`phase`)
//! 4. **Checks**: exercise-specific pass/fail rules (`evaluators`)
//! 5. **Scoring**: checks become a 0-100 frame score (`scoring`)
//!
//! ## Session level
//!
//! - `reps` counts one repetition per completed phase cycle
//! - `issues` surfaces checks that fail often enough to be a pattern
//! - `session` ties the above together for one exercise session
//! - `recorder` owns the session lifecycle and a bounded frame buffer
//! - `sink` persists exports off the real-time path

pub mod evaluation;
pub mod evaluators;
pub mod export;
pub mod issues;
pub mod phase;
pub mod recorder;
pub mod reps;
pub mod scoring;
pub mod session;
pub mod sink;
pub mod synthetic;

pub use evaluation::*;
pub use evaluators::{create_evaluator, Evaluator, ExerciseEvaluator};
pub use export::*;
pub use issues::*;
pub use phase::*;
pub use recorder::*;
pub use reps::*;
pub use scoring::*;
pub use session::*;
pub use sink::*;
