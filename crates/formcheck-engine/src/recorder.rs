//! Session recording lifecycle.
//!
//! ```text
//!   Idle ──start──▶ Recording ◀──resume── Paused
//!                      │   └────pause────▶   │
//!                      └──stop──▶ Completed ◀┘ stop
//!   any ──clear──▶ Idle
//! ```
//!
//! While recording, every frame is analyzed live and kept in a bounded
//! buffer; the oldest frame is evicted once the buffer is full, so memory
//! stays constant no matter how long a session runs.

use chrono::Utc;
use formcheck_core::{EngineConfig, Error, ExerciseType, PoseFrame, Result, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::export::{CameraConfig, DeviceInfo, RecordedFrame, SessionExport, SessionMetadata};
use crate::session::{FrameOutcome, SessionAnalyzer, SessionSummary};
use crate::sink::SessionSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecorderState {
    Idle,
    Recording,
    Paused,
    Completed,
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecorderState::Idle => "idle",
            RecorderState::Recording => "recording",
            RecorderState::Paused => "paused",
            RecorderState::Completed => "completed",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderCommand {
    Start,
    Pause,
    Resume,
    Stop,
    Clear,
}

impl RecorderCommand {
    fn operation(&self) -> &'static str {
        match self {
            RecorderCommand::Start => "start recording",
            RecorderCommand::Pause => "pause recording",
            RecorderCommand::Resume => "resume recording",
            RecorderCommand::Stop => "stop recording",
            RecorderCommand::Clear => "clear",
        }
    }
}

impl RecorderState {
    /// Pure lifecycle transition
    pub fn apply(self, command: RecorderCommand) -> Result<RecorderState> {
        use RecorderCommand::*;
        use RecorderState::*;

        match (self, command) {
            (_, Clear) => Ok(Idle),
            (Idle, Start) => Ok(Recording),
            (Recording, Pause) => Ok(Paused),
            (Paused, Resume) => Ok(Recording),
            (Recording | Paused, Stop) => Ok(Completed),
            (state, command) => Err(invalid(command.operation(), state)),
        }
    }
}

fn invalid(operation: &'static str, state: RecorderState) -> Error {
    Error::InvalidLifecycle {
        operation,
        state: state.to_string(),
    }
}

#[derive(Debug)]
struct ActiveSession {
    metadata: SessionMetadata,
    analyzer: SessionAnalyzer,
    buffer: VecDeque<RecordedFrame>,
    first_timestamp: Option<Timestamp>,
    last_timestamp: Option<Timestamp>,
    summary: Option<SessionSummary>,
}

impl ActiveSession {
    fn measured_fps(&self) -> f64 {
        match (self.first_timestamp, self.last_timestamp) {
            (Some(first), Some(last)) if self.metadata.total_frames >= 2 => {
                let duration = last.secs_since(first);
                if duration > 0.0 {
                    (self.metadata.total_frames - 1) as f64 / duration
                } else {
                    0.0
                }
            }
            _ => 0.0,
        }
    }
}

/// Records one session at a time
#[derive(Debug)]
pub struct SessionRecorder {
    config: EngineConfig,
    camera_config: CameraConfig,
    state: RecorderState,
    session: Option<ActiveSession>,
}

impl SessionRecorder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            camera_config: CameraConfig::default(),
            state: RecorderState::Idle,
            session: None,
        }
    }

    pub fn with_camera_config(mut self, camera_config: CameraConfig) -> Self {
        self.camera_config = camera_config;
        self
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.metadata.session_id.as_str())
    }

    pub fn start_recording(
        &mut self,
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        exercise: ExerciseType,
        device_info: DeviceInfo,
    ) -> Result<()> {
        self.state = self.state.apply(RecorderCommand::Start)?;

        let metadata = SessionMetadata {
            session_id: session_id.into(),
            user_id: user_id.into(),
            exercise_type: exercise,
            device_info,
            camera_config: self.camera_config,
            total_frames: 0,
            dropped_frames: 0,
            average_fps: 0.0,
            started_at: Utc::now(),
            ended_at: None,
        };

        tracing::info!(
            session_id = %metadata.session_id,
            %exercise,
            buffer_capacity = self.config.recorder.buffer_capacity,
            "recording started"
        );

        self.session = Some(ActiveSession {
            metadata,
            analyzer: SessionAnalyzer::new(exercise, &self.config),
            buffer: VecDeque::with_capacity(self.config.recorder.buffer_capacity),
            first_timestamp: None,
            last_timestamp: None,
            summary: None,
        });
        Ok(())
    }

    /// Analyze and buffer one frame.
    ///
    /// Returns `Ok(None)` while paused or completed; the frame is dropped.
    pub fn record_frame(&mut self, frame: &PoseFrame) -> Result<Option<FrameOutcome>> {
        match self.state {
            RecorderState::Idle => return Err(invalid("record a frame", self.state)),
            RecorderState::Paused | RecorderState::Completed => {
                tracing::debug!(
                    state = %self.state,
                    timestamp = frame.timestamp.as_millis(),
                    "frame ignored"
                );
                return Ok(None);
            }
            RecorderState::Recording => {}
        }

        let capacity = self.config.recorder.buffer_capacity;
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| invalid("record a frame", RecorderState::Idle))?;

        let outcome = session.analyzer.process(frame);

        let mut recorded = RecordedFrame::from_pose_frame(session.metadata.total_frames, frame);
        if !outcome.evaluation.gated {
            recorded = recorded.with_analysis(outcome.evaluation.score, outcome.evaluation.current_phase);
        }

        if session.buffer.len() >= capacity {
            session.buffer.pop_front();
        }
        session.buffer.push_back(recorded);

        session.metadata.total_frames += 1;
        if session.first_timestamp.is_none() {
            session.first_timestamp = Some(frame.timestamp);
        }
        session.last_timestamp = Some(frame.timestamp);

        Ok(Some(outcome))
    }

    /// Count a frame the camera produced but the pipeline could not process
    pub fn record_dropped_frame(&mut self) -> Result<()> {
        match self.state {
            RecorderState::Recording => {
                if let Some(session) = self.session.as_mut() {
                    session.metadata.dropped_frames += 1;
                }
                Ok(())
            }
            RecorderState::Paused => Ok(()),
            state => Err(invalid("record a dropped frame", state)),
        }
    }

    pub fn pause_recording(&mut self) -> Result<()> {
        self.state = self.state.apply(RecorderCommand::Pause)?;
        tracing::info!(session_id = ?self.session_id(), "recording paused");
        Ok(())
    }

    pub fn resume_recording(&mut self) -> Result<()> {
        self.state = self.state.apply(RecorderCommand::Resume)?;
        tracing::info!(session_id = ?self.session_id(), "recording resumed");
        Ok(())
    }

    pub fn start_new_set(&mut self) -> Result<()> {
        match (self.state, self.session.as_mut()) {
            (RecorderState::Recording | RecorderState::Paused, Some(session)) => {
                session.analyzer.start_new_set();
                Ok(())
            }
            (state, _) => Err(invalid("start a new set", state)),
        }
    }

    /// Finish the session. `average_fps` overrides the rate measured from
    /// frame timestamps and must be finite and non-negative.
    pub fn stop_recording(&mut self, average_fps: Option<f64>) -> Result<SessionSummary> {
        if let Some(fps) = average_fps {
            if !fps.is_finite() || fps < 0.0 {
                return Err(Error::InvalidInput(format!(
                    "average fps must be finite and non-negative, got {}",
                    fps
                )));
            }
        }
        let next = self.state.apply(RecorderCommand::Stop)?;
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| invalid("stop recording", RecorderState::Idle))?;

        let fps = average_fps.unwrap_or_else(|| session.measured_fps());
        session.metadata.average_fps = fps;
        session.metadata.ended_at = Some(Utc::now());

        let summary = session.analyzer.summary();
        session.summary = Some(summary.clone());
        self.state = next;

        tracing::info!(
            session_id = %session.metadata.session_id,
            total_frames = session.metadata.total_frames,
            dropped_frames = session.metadata.dropped_frames,
            average_fps = fps,
            reps = summary.stats.total_reps,
            grade = %summary.stats.grade,
            "recording stopped"
        );

        Ok(summary)
    }

    /// Export document of a completed session
    pub fn export_session(&self) -> Result<SessionExport> {
        match (self.state, self.session.as_ref()) {
            (RecorderState::Completed, Some(session)) => Ok(SessionExport {
                metadata: session.metadata.clone(),
                frames: session.buffer.iter().cloned().collect(),
                summary: session.summary.clone(),
            }),
            (state, _) => Err(invalid("export session", state)),
        }
    }

    /// Live summary of the session in progress, or the final one once stopped
    pub fn summary(&self) -> Option<SessionSummary> {
        self.session.as_ref().map(|s| match &s.summary {
            Some(summary) => summary.clone(),
            None => s.analyzer.summary(),
        })
    }

    /// Discard the session and return to idle
    pub fn clear(&mut self) {
        if let Some(session) = &self.session {
            tracing::debug!(session_id = %session.metadata.session_id, "session cleared");
        }
        self.state = RecorderState::Idle;
        self.session = None;
    }

    pub fn buffered_frames(&self) -> usize {
        self.session.as_ref().map(|s| s.buffer.len()).unwrap_or(0)
    }

    pub fn total_frames_recorded(&self) -> u64 {
        self.session
            .as_ref()
            .map(|s| s.metadata.total_frames)
            .unwrap_or(0)
    }

    pub fn dropped_frames(&self) -> u64 {
        self.session
            .as_ref()
            .map(|s| s.metadata.dropped_frames)
            .unwrap_or(0)
    }

    /// Export the completed session and hand it to `sink`
    pub async fn flush<S: SessionSink + ?Sized>(&self, sink: &S) -> Result<()> {
        let export = self.export_session()?;
        sink.persist(&export).await?;
        tracing::info!(
            session_id = %export.metadata.session_id,
            frames = export.frames.len(),
            "session flushed"
        );
        Ok(())
    }
}
