//! Engine configuration.
//!
//! Every confidence tier, hysteresis band and check tolerance lives here so
//! that evaluators never carry magic numbers. Defaults reproduce the tuned
//! values; a partial file or `FORMCHECK_*` environment variables override
//! individual fields.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{ExerciseType, MIN_CONFIDENCE, RELIABLE_CONFIDENCE};

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Landmark confidence tiers
    pub confidence: ConfidenceThresholds,

    /// Moving-average window applied to the phase-driving angle (frames)
    pub smoothing_window: usize,

    /// Session recorder buffering
    pub recorder: RecorderConfig,

    /// Issue analyzer reporting
    pub issues: IssueConfig,

    /// Per-exercise phase thresholds and check tolerances
    pub exercises: ExerciseConfigs,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceThresholds {
    /// Landmarks below this are never used
    pub minimum: f32,
    /// Landmarks at or above this may drive strict checks
    pub reliable: f32,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            minimum: MIN_CONFIDENCE,
            reliable: RELIABLE_CONFIDENCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Maximum frames held in memory (60s at 30fps)
    pub buffer_capacity: usize,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 1800,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueConfig {
    /// Failures needed before a check is reported as a recurring issue
    pub min_occurrences: u32,
}

impl Default for IssueConfig {
    fn default() -> Self {
        Self { min_occurrences: 3 }
    }
}

/// Which way the phase-driving angle moves during the working half of a rep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionDirection {
    /// Angle shrinks toward the peak (squat knee, push-up elbow, curl elbow)
    Decreasing,
    /// Angle grows toward the peak (side-raise abduction, press extension)
    Increasing,
}

/// Dual-threshold boundary: `enter` is crossed to enter a phase, the looser
/// `exit` must be crossed back to leave it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HysteresisBand {
    pub enter: f64,
    pub exit: f64,
}

impl HysteresisBand {
    pub fn new(enter: f64, exit: f64) -> Self {
        Self { enter, exit }
    }
}

/// Angle thresholds driving one exercise's phase cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseThresholds {
    pub direction: MotionDirection,
    /// Boundary around the rest (start) position
    pub rest: HysteresisBand,
    /// Boundary around the turnaround (peak) position
    pub peak: HysteresisBand,
}

impl PhaseThresholds {
    pub fn new(direction: MotionDirection, rest: HysteresisBand, peak: HysteresisBand) -> Self {
        Self {
            direction,
            rest,
            peak,
        }
    }

    /// Angle mapped so that larger always means further into the rep
    pub fn progress(&self, angle: f64) -> f64 {
        match self.direction {
            MotionDirection::Decreasing => -angle,
            MotionDirection::Increasing => angle,
        }
    }

    /// `angle` lies strictly past `threshold` in the working direction
    pub fn beyond(&self, angle: f64, threshold: f64) -> bool {
        self.progress(angle) > self.progress(threshold)
    }

    /// `angle` has reached `threshold` in the working direction
    pub fn reached(&self, angle: f64, threshold: f64) -> bool {
        self.progress(angle) >= self.progress(threshold)
    }

    /// `angle` has come back to `threshold` or further toward rest
    pub fn returned(&self, angle: f64, threshold: f64) -> bool {
        self.progress(angle) <= self.progress(threshold)
    }

    /// `angle` lies strictly back from `threshold` toward rest
    pub fn short_of(&self, angle: f64, threshold: f64) -> bool {
        self.progress(angle) < self.progress(threshold)
    }

    pub fn validate(&self, name: &str) -> Result<()> {
        let values = [self.rest.enter, self.rest.exit, self.peak.exit, self.peak.enter];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::Config(format!("{}: thresholds must be finite", name)));
        }

        let ordered = values
            .windows(2)
            .all(|w| self.progress(w[0]) < self.progress(w[1]));
        if !ordered {
            return Err(Error::Config(format!(
                "{}: thresholds must be ordered rest.enter < rest.exit < peak.exit < peak.enter \
                 along the {:?} direction, got {:?}",
                name, self.direction, values
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquatConfig {
    /// Knee angle (hip-knee-ankle)
    pub phases: PhaseThresholds,
    /// Acceptable knee angle at the bottom
    pub depth_min_angle: f64,
    pub depth_max_angle: f64,
    /// Allowed forward travel of the knee past the toes (normalized x)
    pub knee_toe_tolerance: f64,
    /// Maximum torso lean from vertical (degrees)
    pub max_back_lean: f64,
}

impl Default for SquatConfig {
    fn default() -> Self {
        Self {
            phases: PhaseThresholds::new(
                MotionDirection::Decreasing,
                HysteresisBand::new(160.0, 150.0),
                HysteresisBand::new(100.0, 110.0),
            ),
            depth_min_angle: 60.0,
            depth_max_angle: 110.0,
            knee_toe_tolerance: 0.03,
            max_back_lean: 45.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushUpConfig {
    /// Elbow angle (shoulder-elbow-wrist)
    pub phases: PhaseThresholds,
    pub elbow_min_angle: f64,
    pub elbow_max_angle: f64,
    /// Minimum shoulder-hip-ankle angle for a straight body line
    pub body_line_min_angle: f64,
    /// Allowed hip drop below the shoulder-ankle line (normalized y)
    pub hip_sag_tolerance: f64,
}

impl Default for PushUpConfig {
    fn default() -> Self {
        Self {
            phases: PhaseThresholds::new(
                MotionDirection::Decreasing,
                HysteresisBand::new(160.0, 150.0),
                HysteresisBand::new(90.0, 100.0),
            ),
            elbow_min_angle: 50.0,
            elbow_max_angle: 100.0,
            body_line_min_angle: 160.0,
            hip_sag_tolerance: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmCurlConfig {
    /// Elbow angle (shoulder-elbow-wrist)
    pub phases: PhaseThresholds,
    /// Elbow travel allowed during a rep, as a fraction of torso length
    pub max_elbow_drift: f64,
    /// Shoulder travel allowed during a rep, as a fraction of torso length
    pub max_shoulder_drift: f64,
    /// Torso swing above this angular speed counts as momentum (deg/s)
    pub max_swing_velocity: f64,
}

impl Default for ArmCurlConfig {
    fn default() -> Self {
        Self {
            phases: PhaseThresholds::new(
                MotionDirection::Decreasing,
                HysteresisBand::new(150.0, 140.0),
                HysteresisBand::new(60.0, 70.0),
            ),
            max_elbow_drift: 0.15,
            max_shoulder_drift: 0.10,
            max_swing_velocity: 60.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SideRaiseConfig {
    /// Arm abduction (hip-shoulder-elbow), averaged over both arms
    pub phases: PhaseThresholds,
    /// Minimum mean abduction of both arms at the top. Imbalance between
    /// the arms is left to `symmetry_tolerance`.
    pub target_elevation: f64,
    /// Abduction above this raises the arms past shoulder height
    pub max_elevation: f64,
    /// Allowed left/right abduction difference (degrees)
    pub symmetry_tolerance: f64,
    /// Minimum elbow angle for "nearly straight" arms
    pub min_elbow_angle: f64,
}

impl Default for SideRaiseConfig {
    fn default() -> Self {
        Self {
            phases: PhaseThresholds::new(
                MotionDirection::Increasing,
                HysteresisBand::new(30.0, 40.0),
                HysteresisBand::new(80.0, 70.0),
            ),
            target_elevation: 75.0,
            max_elevation: 110.0,
            symmetry_tolerance: 15.0,
            min_elbow_angle: 140.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShoulderPressConfig {
    /// Elbow extension (shoulder-elbow-wrist), averaged over both arms
    pub phases: PhaseThresholds,
    /// Minimum mean elbow angle of both arms at lockout. Imbalance between
    /// the arms is left to `symmetry_tolerance`.
    pub lockout_min_angle: f64,
    /// Allowed left/right elbow angle difference (degrees)
    pub symmetry_tolerance: f64,
}

impl Default for ShoulderPressConfig {
    fn default() -> Self {
        Self {
            phases: PhaseThresholds::new(
                MotionDirection::Increasing,
                HysteresisBand::new(100.0, 110.0),
                HysteresisBand::new(160.0, 150.0),
            ),
            lockout_min_angle: 160.0,
            symmetry_tolerance: 15.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExerciseConfigs {
    pub squat: SquatConfig,
    pub push_up: PushUpConfig,
    pub arm_curl: ArmCurlConfig,
    pub side_raise: SideRaiseConfig,
    pub shoulder_press: ShoulderPressConfig,
}

impl ExerciseConfigs {
    pub fn phases(&self, exercise: ExerciseType) -> &PhaseThresholds {
        match exercise {
            ExerciseType::Squat => &self.squat.phases,
            ExerciseType::PushUp => &self.push_up.phases,
            ExerciseType::ArmCurl => &self.arm_curl.phases,
            ExerciseType::SideRaise => &self.side_raise.phases,
            ExerciseType::ShoulderPress => &self.shoulder_press.phases,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    pub const ENV_PREFIX: &'static str = "FORMCHECK";

    pub fn new() -> Self {
        Self {
            confidence: ConfidenceThresholds::default(),
            smoothing_window: 5,
            recorder: RecorderConfig::default(),
            issues: IssueConfig::default(),
            exercises: ExerciseConfigs::default(),
        }
    }

    /// Load configuration from file, with environment overrides
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(Self::environment())
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from environment variables only
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(Self::environment())
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix(Self::ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
    }

    pub fn validate(&self) -> Result<()> {
        let c = &self.confidence;
        if !(0.0..=1.0).contains(&c.minimum) || !(0.0..=1.0).contains(&c.reliable) {
            return Err(Error::Config(format!(
                "confidence thresholds must lie in [0, 1], got minimum={} reliable={}",
                c.minimum, c.reliable
            )));
        }
        if c.minimum > c.reliable {
            return Err(Error::Config(format!(
                "minimum confidence {} exceeds reliable confidence {}",
                c.minimum, c.reliable
            )));
        }
        if self.smoothing_window == 0 {
            return Err(Error::Config("smoothing_window must be at least 1".into()));
        }
        if self.recorder.buffer_capacity == 0 {
            return Err(Error::Config("recorder.buffer_capacity must be at least 1".into()));
        }
        if self.issues.min_occurrences == 0 {
            return Err(Error::Config("issues.min_occurrences must be at least 1".into()));
        }

        for exercise in ExerciseType::ALL {
            self.exercises.phases(exercise).validate(exercise.as_str())?;
        }

        Ok(())
    }
}
