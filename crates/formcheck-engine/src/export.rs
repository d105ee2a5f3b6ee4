//! Session export format.
//!
//! A completed recording serializes to a single JSON document holding the
//! session metadata, every buffered frame and the analysis summary. The
//! document is self-contained: frames can be re-hydrated into `PoseFrame`s
//! and replayed through a fresh analyzer.

use chrono::{DateTime, Utc};
use formcheck_core::{ExerciseType, Phase, PoseFrame, PoseLandmark, Result, Timestamp};
use serde::{Deserialize, Serialize};

use crate::session::SessionSummary;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
}

impl DeviceInfo {
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            model: None,
            os_version: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraFacing {
    Front,
    Back,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub width: u32,
    pub height: u32,
    pub target_fps: f64,
    pub facing: CameraFacing,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            target_fps: 30.0,
            facing: CameraFacing::Front,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub session_id: String,
    pub user_id: String,
    pub exercise_type: ExerciseType,
    pub device_info: DeviceInfo,
    pub camera_config: CameraConfig,
    pub total_frames: u64,
    pub dropped_frames: u64,
    pub average_fps: f64,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}

/// One buffered frame as stored in an export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub frame_index: u64,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub processing_time_ms: Option<f64>,
    pub landmarks: Vec<PoseLandmark>,
    pub overall_confidence: f32,
    /// Live frame score, absent for frames recorded without analysis
    #[serde(default)]
    pub score: Option<u8>,
    #[serde(default)]
    pub phase: Option<Phase>,
}

impl RecordedFrame {
    pub fn from_pose_frame(frame_index: u64, frame: &PoseFrame) -> Self {
        Self {
            frame_index,
            timestamp: frame.timestamp,
            processing_time_ms: frame.processing_time_ms,
            landmarks: frame.landmarks().copied().collect(),
            overall_confidence: frame.overall_confidence(),
            score: None,
            phase: None,
        }
    }

    pub fn with_analysis(mut self, score: u8, phase: Phase) -> Self {
        self.score = Some(score);
        self.phase = Some(phase);
        self
    }

    pub fn to_pose_frame(&self) -> PoseFrame {
        let mut frame = PoseFrame::from_landmarks(self.timestamp, self.landmarks.iter().copied());
        frame.processing_time_ms = self.processing_time_ms;
        frame
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionExport {
    pub metadata: SessionMetadata,
    pub frames: Vec<RecordedFrame>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<SessionSummary>,
}

impl SessionExport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Frames re-hydrated for replay, in recorded order
    pub fn pose_frames(&self) -> impl Iterator<Item = PoseFrame> + '_ {
        self.frames.iter().map(RecordedFrame::to_pose_frame)
    }
}
