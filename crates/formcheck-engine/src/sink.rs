//! Persistence of completed session exports.
//!
//! Sinks run off the real-time path: the recorder only hands them a finished
//! `SessionExport`.

use async_trait::async_trait;
use formcheck_core::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::export::SessionExport;

#[async_trait]
pub trait SessionSink: Send + Sync {
    async fn persist(&self, export: &SessionExport) -> Result<()>;
}

/// Writes each session to `<dir>/<session_id>.json`
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Output path for a session id; characters outside `[A-Za-z0-9_-]`
    /// become `_` so ids cannot escape the directory
    pub fn path_for(&self, session_id: &str) -> PathBuf {
        let name: String = session_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        let name = if name.is_empty() { "session".to_string() } else { name };
        self.dir.join(format!("{}.json", name))
    }
}

#[async_trait]
impl SessionSink for JsonFileSink {
    async fn persist(&self, export: &SessionExport) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(&export.metadata.session_id);
        let json = export.to_json_pretty()?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| Error::Sink(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(path = %path.display(), "session written");
        Ok(())
    }
}

/// Keeps exports in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    exports: RwLock<Vec<SessionExport>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn exports(&self) -> Vec<SessionExport> {
        self.exports.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.exports.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.exports.read().await.is_empty()
    }
}

#[async_trait]
impl SessionSink for MemorySink {
    async fn persist(&self, export: &SessionExport) -> Result<()> {
        self.exports.write().await.push(export.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::DeviceInfo;
    use crate::recorder::SessionRecorder;
    use crate::synthetic::rep_frames;
    use formcheck_core::{EngineConfig, ExerciseType, Timestamp};

    fn completed_recorder(session_id: &str) -> SessionRecorder {
        let mut rec = SessionRecorder::new(EngineConfig::new());
        rec.start_recording(session_id, "user", ExerciseType::PushUp, DeviceInfo::new("test"))
            .unwrap();
        for frame in rep_frames(ExerciseType::PushUp, 1, 10, Timestamp::from_millis(0), 0.9) {
            rec.record_frame(&frame).unwrap();
        }
        rec.stop_recording(None).unwrap();
        rec
    }

    #[test]
    fn test_path_sanitized() {
        let sink = JsonFileSink::new("/tmp/out");
        assert_eq!(sink.path_for("../etc/passwd"), PathBuf::from("/tmp/out/___etc_passwd.json"));
        assert_eq!(sink.path_for("abc-1_2"), PathBuf::from("/tmp/out/abc-1_2.json"));
        assert_eq!(sink.path_for(""), PathBuf::from("/tmp/out/session.json"));
    }

    #[tokio::test]
    async fn test_json_file_sink_writes_export() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path().join("sessions"));
        let rec = completed_recorder("abc");

        rec.flush(&sink).await.unwrap();

        let json = tokio::fs::read_to_string(sink.path_for("abc")).await.unwrap();
        let export = SessionExport::from_json(&json).unwrap();
        assert_eq!(export.metadata.session_id, "abc");
        assert_eq!(export.summary.unwrap().stats.total_reps, 1);
    }

    #[tokio::test]
    async fn test_memory_sink_collects() {
        let sink = MemorySink::new();
        assert!(sink.is_empty().await);
        completed_recorder("a").flush(&sink).await.unwrap();
        completed_recorder("b").flush(&sink).await.unwrap();
        let ids: Vec<_> = sink
            .exports()
            .await
            .into_iter()
            .map(|e| e.metadata.session_id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_flush_requires_completed_session() {
        let sink = MemorySink::new();
        let rec = SessionRecorder::new(EngineConfig::new());
        assert!(rec.flush(&sink).await.is_err());
        assert_eq!(sink.len().await, 0);
    }
}
