//! Fundamental types for the formcheck engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Below this confidence a landmark must not be used for any check
pub const MIN_CONFIDENCE: f32 = 0.5;

/// At or above this confidence a landmark may drive strict checks
pub const RELIABLE_CONFIDENCE: f32 = 0.7;

/// Values per landmark in a flat array: x, y, z, confidence
pub const FLAT_STRIDE: usize = 4;

/// Timestamp in monotonic milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1_000.0
    }

    /// Seconds elapsed since `earlier`; negative if `earlier` is later
    pub fn secs_since(&self, earlier: Timestamp) -> f64 {
        (self.0 - earlier.0) as f64 / 1_000.0
    }
}

/// 33-point anatomical landmark schema (MediaPipe BlazePose topology)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum LandmarkId {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl LandmarkId {
    pub const COUNT: usize = 33;

    pub const ALL: [LandmarkId; LandmarkId::COUNT] = [
        Self::Nose,
        Self::LeftEyeInner,
        Self::LeftEye,
        Self::LeftEyeOuter,
        Self::RightEyeInner,
        Self::RightEye,
        Self::RightEyeOuter,
        Self::LeftEar,
        Self::RightEar,
        Self::MouthLeft,
        Self::MouthRight,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftPinky,
        Self::RightPinky,
        Self::LeftIndex,
        Self::RightIndex,
        Self::LeftThumb,
        Self::RightThumb,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftHeel,
        Self::RightHeel,
        Self::LeftFootIndex,
        Self::RightFootIndex,
    ];

    pub fn from_index(idx: u8) -> Option<Self> {
        Self::ALL.get(idx as usize).copied()
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Position in normalized image space (x right, y down, z toward camera)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Landmark detection with confidence score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseLandmark {
    pub id: LandmarkId,
    pub position: Position3D,
    pub confidence: f32,
}

impl PoseLandmark {
    pub fn new(id: LandmarkId, position: Position3D, confidence: f32) -> Self {
        Self {
            id,
            position,
            confidence,
        }
    }
}

/// One inference tick worth of landmarks.
///
/// Landmarks are stored densely by schema index, so lookups are O(1) and
/// building a frame never allocates. Absent landmarks are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseFrame {
    landmarks: [Option<PoseLandmark>; LandmarkId::COUNT],
    pub timestamp: Timestamp,
    /// Upstream inference latency
    pub processing_time_ms: Option<f64>,
}

impl PoseFrame {
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            landmarks: [None; LandmarkId::COUNT],
            timestamp,
            processing_time_ms: None,
        }
    }

    pub fn with_processing_time(mut self, processing_time_ms: f64) -> Self {
        self.processing_time_ms = Some(processing_time_ms);
        self
    }

    pub fn with_landmark(mut self, landmark: PoseLandmark) -> Self {
        self.insert(landmark);
        self
    }

    pub fn from_landmarks(
        timestamp: Timestamp,
        landmarks: impl IntoIterator<Item = PoseLandmark>,
    ) -> Self {
        let mut frame = Self::new(timestamp);
        for landmark in landmarks {
            frame.insert(landmark);
        }
        frame
    }

    /// Parse `33 × (x, y, z, confidence)` values. An empty slice means no pose.
    pub fn from_flat(data: &[f32], timestamp: Timestamp) -> Result<Self> {
        let mut frame = Self::new(timestamp);
        if data.is_empty() {
            return Ok(frame);
        }

        let expected = LandmarkId::COUNT * FLAT_STRIDE;
        if data.len() != expected {
            return Err(Error::InvalidInput(format!(
                "flat landmark array must hold {} values, got {}",
                expected,
                data.len()
            )));
        }

        for (id, chunk) in LandmarkId::ALL.iter().zip(data.chunks_exact(FLAT_STRIDE)) {
            let position = Position3D::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64);
            let confidence = chunk[3];
            if !position.is_finite() || !confidence.is_finite() {
                continue;
            }
            frame.insert(PoseLandmark::new(*id, position, confidence.clamp(0.0, 1.0)));
        }

        Ok(frame)
    }

    pub fn insert(&mut self, landmark: PoseLandmark) {
        self.landmarks[landmark.id.index()] = Some(landmark);
    }

    pub fn get(&self, id: LandmarkId) -> Option<&PoseLandmark> {
        self.landmarks[id.index()].as_ref()
    }

    /// The landmark, if present with confidence at or above `minimum`
    pub fn get_visible(&self, id: LandmarkId, minimum: f32) -> Option<&PoseLandmark> {
        self.get(id).filter(|lm| lm.confidence >= minimum)
    }

    /// Present landmarks in schema order
    pub fn landmarks(&self) -> impl Iterator<Item = &PoseLandmark> + '_ {
        self.landmarks.iter().flatten()
    }

    pub fn is_pose_detected(&self) -> bool {
        self.landmarks.iter().any(Option::is_some)
    }

    pub fn landmark_count(&self) -> usize {
        self.landmarks().count()
    }

    /// Mean confidence over present landmarks, 0 when none are present
    pub fn overall_confidence(&self) -> f32 {
        let (sum, count) = self
            .landmarks()
            .fold((0.0f32, 0usize), |(s, c), lm| (s + lm.confidence, c + 1));
        if count == 0 {
            0.0
        } else {
            sum / count as f32
        }
    }

    /// Landmarks at or above the `reliable` tier (see `ConfidenceThresholds`)
    pub fn reliable_landmark_count(&self, reliable: f32) -> usize {
        self.landmarks()
            .filter(|lm| lm.confidence >= reliable)
            .count()
    }

    pub fn are_all_visible(&self, ids: &[LandmarkId], minimum: f32) -> bool {
        ids.iter().all(|id| self.get_visible(*id, minimum).is_some())
    }
}

/// Supported exercises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
    Squat,
    PushUp,
    ArmCurl,
    SideRaise,
    ShoulderPress,
}

impl ExerciseType {
    pub const ALL: [ExerciseType; 5] = [
        Self::Squat,
        Self::PushUp,
        Self::ArmCurl,
        Self::SideRaise,
        Self::ShoulderPress,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseType::Squat => "squat",
            ExerciseType::PushUp => "push_up",
            ExerciseType::ArmCurl => "arm_curl",
            ExerciseType::SideRaise => "side_raise",
            ExerciseType::ShoulderPress => "shoulder_press",
        }
    }

    /// Exercise-specific name of a movement phase
    pub fn phase_label(&self, phase: Phase) -> &'static str {
        use Phase::*;
        match (self, phase) {
            (ExerciseType::Squat, Start) => "start",
            (ExerciseType::Squat, Moving) => "descending",
            (ExerciseType::Squat, Peak) => "bottom",
            (ExerciseType::Squat, Returning) => "ascending",

            (ExerciseType::PushUp, Start) => "up",
            (ExerciseType::PushUp, Moving) => "lowering",
            (ExerciseType::PushUp, Peak) => "bottom",
            (ExerciseType::PushUp, Returning) => "pushing",

            (ExerciseType::ArmCurl, Start) => "down",
            (ExerciseType::ArmCurl, Moving) => "curling",
            (ExerciseType::ArmCurl, Peak) => "top",
            (ExerciseType::ArmCurl, Returning) => "lowering",

            (ExerciseType::SideRaise, Start) => "down",
            (ExerciseType::SideRaise, Moving) => "raising",
            (ExerciseType::SideRaise, Peak) => "top",
            (ExerciseType::SideRaise, Returning) => "lowering",

            (ExerciseType::ShoulderPress, Start) => "rack",
            (ExerciseType::ShoulderPress, Moving) => "pressing",
            (ExerciseType::ShoulderPress, Peak) => "lockout",
            (ExerciseType::ShoulderPress, Returning) => "lowering",
        }
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "squat" => Ok(ExerciseType::Squat),
            "push_up" | "pushup" => Ok(ExerciseType::PushUp),
            "arm_curl" | "curl" | "bicep_curl" => Ok(ExerciseType::ArmCurl),
            "side_raise" | "lateral_raise" => Ok(ExerciseType::SideRaise),
            "shoulder_press" | "overhead_press" => Ok(ExerciseType::ShoulderPress),
            _ => Err(Error::InvalidInput(format!("unknown exercise: {}", s))),
        }
    }
}

/// Stage of one repetition's motion cycle.
///
/// Every exercise cycles through the same four stages; `ExerciseType::phase_label`
/// gives the exercise-specific name (a squat's `Moving` is "descending", a
/// curl's is "curling").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Rest position between reps
    #[default]
    Start,
    /// Working half of the rep, moving away from rest
    Moving,
    /// Turnaround point (bottom of a squat, top of a curl)
    Peak,
    /// Moving back toward rest
    Returning,
}
