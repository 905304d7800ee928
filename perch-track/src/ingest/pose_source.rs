//! Pose estimation interfaces and a recorded replay source

use crate::ingest::frame::VideoFrame;
use crate::ingest::keypoint::PoseFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::Path;
use tracing::{debug, info};

/// Result of asking a pose source about a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum PoseEstimate {
    /// Inference has not completed yet; the caller should skip this tick.
    Pending,
    /// Zero or more detected subjects.
    Ready(Vec<PoseFrame>),
}

/// Errors reported by a pose source
#[derive(Debug, thiserror::Error)]
pub enum PoseSourceError {
    /// The model is temporarily unavailable; the tick is skipped.
    #[error("Pose source unavailable: {0}")]
    Unavailable(String),
    /// The model cannot continue; the session ends.
    #[error("Pose source failed: {0}")]
    Fatal(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid recording at line {line}: {source}")]
    InvalidRecord {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl PoseSourceError {
    /// Whether the frame loop may carry on after this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Trait for pose estimation backends.
///
/// Implementations must not block: an inference that is still running is
/// reported as [`PoseEstimate::Pending`].
pub trait PoseSource {
    fn estimate(&mut self, frame: &VideoFrame) -> Result<PoseEstimate, PoseSourceError>;
}

/// One line of a pose recording.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseRecord {
    /// Frame number the detections belong to.
    pub frame: u64,
    #[serde(default)]
    pub subjects: Vec<PoseFrame>,
    /// Inference had not finished for this frame.
    #[serde(default)]
    pub pending: bool,
}

/// Replays pose detections recorded as JSON lines.
///
/// With a latency of `n` frames, the estimate returned for frame `f` is the
/// one recorded for frame `f - n`, and the first `n` frames are pending.
/// Frames without a record report no subjects.
#[derive(Debug, Clone, Default)]
pub struct RecordedPoseSource {
    records: BTreeMap<u64, PoseRecord>,
    latency_frames: u64,
}

impl RecordedPoseSource {
    pub fn new(records: impl IntoIterator<Item = PoseRecord>) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.frame, r)).collect(),
            latency_frames: 0,
        }
    }

    /// Delay every result by `frames` frames.
    pub fn with_latency(mut self, frames: u64) -> Self {
        self.latency_frames = frames;
        self
    }

    /// Load a recording from a JSON-lines file
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PoseSourceError> {
        let file = std::fs::File::open(path.as_ref())?;
        let source = Self::from_reader(std::io::BufReader::new(file))?;
        info!("Loaded pose recording: {} frames", source.len());
        Ok(source)
    }

    /// Parse a recording from any buffered reader; blank lines are skipped.
    pub fn from_reader(reader: impl BufRead) -> Result<Self, PoseSourceError> {
        let mut records = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: PoseRecord = serde_json::from_str(&line)
                .map_err(|source| PoseSourceError::InvalidRecord {
                    line: index + 1,
                    source,
                })?;
            records.push(record);
        }
        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn latency_frames(&self) -> u64 {
        self.latency_frames
    }

    /// Video frame at which the last recorded estimate is delivered.
    pub fn last_frame(&self) -> Option<u64> {
        self.records
            .keys()
            .next_back()
            .map(|frame| frame + self.latency_frames)
    }
}

impl PoseSource for RecordedPoseSource {
    fn estimate(&mut self, frame: &VideoFrame) -> Result<PoseEstimate, PoseSourceError> {
        let Some(source_frame) = frame.frame_number.checked_sub(self.latency_frames) else {
            debug!("Frame {} still waiting on inference", frame.frame_number);
            return Ok(PoseEstimate::Pending);
        };
        match self.records.get(&source_frame) {
            Some(record) if record.pending => Ok(PoseEstimate::Pending),
            Some(record) => Ok(PoseEstimate::Ready(record.subjects.clone())),
            None => Ok(PoseEstimate::Ready(Vec::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::keypoint::{Joint, Keypoint};

    fn frame(n: u64) -> VideoFrame {
        VideoFrame::new(640, 480, n as f64 / 30.0, n)
    }

    fn subject(x: f32) -> PoseFrame {
        PoseFrame::new(vec![Keypoint::at(Joint::LeftShoulder, x, 0.0, 0.9)])
    }

    #[test]
    fn test_replay_without_latency() {
        let mut source = RecordedPoseSource::new([
            PoseRecord {
                frame: 0,
                subjects: vec![subject(1.0)],
                pending: false,
            },
            PoseRecord {
                frame: 1,
                subjects: vec![],
                pending: true,
            },
        ]);
        assert_eq!(
            source.estimate(&frame(0)).unwrap(),
            PoseEstimate::Ready(vec![subject(1.0)])
        );
        assert_eq!(source.estimate(&frame(1)).unwrap(), PoseEstimate::Pending);
        assert_eq!(source.estimate(&frame(2)).unwrap(), PoseEstimate::Ready(vec![]));
    }

    #[test]
    fn test_latency_delays_results() {
        let mut source = RecordedPoseSource::new([PoseRecord {
            frame: 0,
            subjects: vec![subject(2.0)],
            pending: false,
        }])
        .with_latency(2);
        assert_eq!(source.estimate(&frame(0)).unwrap(), PoseEstimate::Pending);
        assert_eq!(source.estimate(&frame(1)).unwrap(), PoseEstimate::Pending);
        assert_eq!(
            source.estimate(&frame(2)).unwrap(),
            PoseEstimate::Ready(vec![subject(2.0)])
        );
        assert_eq!(source.last_frame(), Some(2));
        assert_eq!(RecordedPoseSource::default().last_frame(), None);
    }

    #[test]
    fn test_parse_json_lines() {
        let text = r#"{"frame":0,"subjects":[{"keypoints":[{"name":"left_shoulder","x":400,"y":300,"score":0.9}]}]}

{"frame":3,"pending":true}
"#;
        let mut source = RecordedPoseSource::from_reader(text.as_bytes()).unwrap();
        assert_eq!(source.len(), 2);
        match source.estimate(&frame(0)).unwrap() {
            PoseEstimate::Ready(subjects) => {
                assert_eq!(subjects[0].get(Joint::LeftShoulder).unwrap().x, 400.0);
            }
            other => panic!("unexpected estimate {other:?}"),
        }
        assert_eq!(source.estimate(&frame(3)).unwrap(), PoseEstimate::Pending);
    }

    #[test]
    fn test_invalid_line_reports_number() {
        let text = "{\"frame\":0}\nnot json\n";
        match RecordedPoseSource::from_reader(text.as_bytes()) {
            Err(PoseSourceError::InvalidRecord { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected invalid record, got {other:?}"),
        }
    }

    #[test]
    fn test_transient_errors() {
        assert!(PoseSourceError::Unavailable("warming up".into()).is_transient());
        assert!(!PoseSourceError::Fatal("model lost".into()).is_transient());
    }
}
