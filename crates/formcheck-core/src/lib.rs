//! # Formcheck-Core
//!
//! Core types and utilities for the formcheck exercise-form evaluation engine.
//!
//! ## Contents
//!
//! - **Pose frame model**: the 33-point landmark schema produced by the
//!   upstream pose detector, one `PoseFrame` per inference tick
//! - **Geometry kernel**: joint angles, distances and projections over
//!   normalized image coordinates
//! - **Streaming filters**: moving average and velocity estimation used to
//!   denoise landmark motion before it drives decisions
//! - **Configuration**: every confidence tier, hysteresis band and check
//!   tolerance in one `EngineConfig`

pub mod config;
pub mod error;
pub mod filtering;
pub mod geometry;
pub mod types;

pub use config::*;
pub use error::{Error, Result};
pub use filtering::*;
pub use geometry::*;
pub use types::*;
