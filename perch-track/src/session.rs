//! Per-frame driver: frame → pose → placement → render.

use crate::extract::{Torso, extract_torso, first_subject};
use crate::ingest::{
    FrameStream, PoseEstimate, PoseFrame, PoseSource, PoseSourceError, StreamError, VideoFrame,
};
use crate::placement::{OverlayLayout, Placement, PlacementConfig, PlacementEngine};
use crate::scene::{CameraModel, OverlayAsset};
use tracing::{debug, info, warn};

/// Errors reported by an overlay renderer.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Renderer failed: {0}")]
    Backend(String),
}

/// Errors that end a tracking session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    PoseSource(#[from] PoseSourceError),
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Draws the scene for one frame.
///
/// Compositing the result over the video frame is the implementation's concern.
pub trait OverlayRenderer {
    fn draw(
        &mut self,
        frame: &VideoFrame,
        overlays: &[OverlayAsset],
        camera: &CameraModel,
    ) -> Result<(), RenderError>;
}

/// Why a tick made no new observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Inference for this frame has not completed.
    Pending,
    /// The pose source reported a transient failure.
    Unavailable,
}

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Overlays were placed and shown.
    Placed {
        placements: Vec<Placement>,
        torso: Torso,
    },
    /// No confident subject; overlays hidden.
    Lost,
    /// No observation this tick; state unchanged.
    Skipped(SkipReason),
}

/// Counters over a session's ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackingStats {
    pub placed: u64,
    pub lost: u64,
    pub skipped: u64,
}

impl TrackingStats {
    pub fn ticks(&self) -> u64 {
        self.placed + self.lost + self.skipped
    }

    fn record(&mut self, outcome: &TickOutcome) {
        match outcome {
            TickOutcome::Placed { .. } => self.placed += 1,
            TickOutcome::Lost => self.lost += 1,
            TickOutcome::Skipped(_) => self.skipped += 1,
        }
    }
}

/// Everything one tracking session owns: camera, overlays and smoothing state.
///
/// Call [`tick`](Self::tick) at most once per rendered frame.
pub struct Session {
    camera: CameraModel,
    overlays: Vec<OverlayAsset>,
    engine: PlacementEngine,
    video_size: Option<(u32, u32)>,
    stats: TrackingStats,
}

impl Session {
    /// Create a session drawing `asset` with a single overlay.
    pub fn new(camera: CameraModel, asset: OverlayAsset, config: PlacementConfig) -> Self {
        Self::with_layout(camera, asset, config, OverlayLayout::Single)
    }

    /// Create a session with one copy of `asset` per layout slot.
    pub fn with_layout(
        camera: CameraModel,
        asset: OverlayAsset,
        config: PlacementConfig,
        layout: OverlayLayout,
    ) -> Self {
        let overlays = vec![asset; layout.slots().len()];
        Self {
            camera,
            overlays,
            engine: PlacementEngine::with_layout(config, layout),
            video_size: None,
            stats: TrackingStats::default(),
        }
    }

    pub fn camera(&self) -> &CameraModel {
        &self.camera
    }

    pub fn overlays(&self) -> &[OverlayAsset] {
        &self.overlays
    }

    pub fn engine(&self) -> &PlacementEngine {
        &self.engine
    }

    pub fn stats(&self) -> TrackingStats {
        self.stats
    }

    /// Run one frame of the loop.
    pub fn tick(
        &mut self,
        frame: &VideoFrame,
        poses: &mut dyn PoseSource,
        renderer: &mut dyn OverlayRenderer,
    ) -> Result<TickOutcome, SessionError> {
        if self.video_size != Some(frame.dimensions()) {
            debug!("Video size now {}x{}", frame.width, frame.height);
            self.camera.resize(frame.width, frame.height);
            self.video_size = Some(frame.dimensions());
        }

        let outcome = match poses.estimate(frame) {
            Ok(PoseEstimate::Pending) => TickOutcome::Skipped(SkipReason::Pending),
            Err(err) if err.is_transient() => {
                warn!("Frame {}: {}", frame.frame_number, err);
                TickOutcome::Skipped(SkipReason::Unavailable)
            }
            Err(err) => return Err(err.into()),
            Ok(PoseEstimate::Ready(subjects)) => self.observe(frame, &subjects),
        };

        renderer.draw(frame, &self.overlays, &self.camera)?;
        self.stats.record(&outcome);
        Ok(outcome)
    }

    fn observe(&mut self, frame: &VideoFrame, subjects: &[PoseFrame]) -> TickOutcome {
        if subjects.len() > 1 {
            debug!("{} subjects detected, tracking the first", subjects.len());
        }
        let threshold = self.engine.config().confidence_threshold;
        let Some(torso) = first_subject(subjects).and_then(|pose| extract_torso(pose, threshold))
        else {
            for overlay in &mut self.overlays {
                overlay.visible = false;
            }
            self.engine.on_tracking_lost();
            return TickOutcome::Lost;
        };

        let bounds = self.overlays.first().map(OverlayAsset::bounding_box_size);
        let placements = self
            .engine
            .place(&torso.shoulders, frame.dimensions(), &self.camera, bounds);
        for (overlay, placement) in self.overlays.iter_mut().zip(&placements) {
            overlay.apply(placement);
            overlay.visible = true;
        }
        TickOutcome::Placed { placements, torso }
    }

    /// Drive the loop until the frame stream ends.
    pub fn run(
        &mut self,
        frames: &mut dyn FrameStream,
        poses: &mut dyn PoseSource,
        renderer: &mut dyn OverlayRenderer,
    ) -> Result<TrackingStats, SessionError> {
        while frames.is_active() {
            let Some(frame) = frames.next_frame()? else {
                break;
            };
            self.tick(&frame, poses, renderer)?;
        }
        info!(
            "Session finished: {} ticks ({} placed, {} lost, {} skipped)",
            self.stats.ticks(),
            self.stats.placed,
            self.stats.lost,
            self.stats.skipped
        );
        Ok(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{Joint, Keypoint, PoseRecord, RecordedPoseSource};
    use crate::placement::{LossPolicy, OverlaySlot, SmoothedTransform};
    use glam::Vec3;

    #[derive(Default)]
    struct CountingRenderer {
        draws: usize,
        visible: Vec<bool>,
    }

    impl OverlayRenderer for CountingRenderer {
        fn draw(
            &mut self,
            _frame: &VideoFrame,
            overlays: &[OverlayAsset],
            _camera: &CameraModel,
        ) -> Result<(), RenderError> {
            self.draws += 1;
            self.visible = overlays.iter().map(|o| o.visible).collect();
            Ok(())
        }
    }

    struct FailingSource(Option<PoseSourceError>);

    impl PoseSource for FailingSource {
        fn estimate(&mut self, _frame: &VideoFrame) -> Result<PoseEstimate, PoseSourceError> {
            match self.0.take() {
                Some(err) => Err(err),
                None => Ok(PoseEstimate::Pending),
            }
        }
    }

    struct FrameList(std::vec::IntoIter<VideoFrame>);

    impl FrameStream for FrameList {
        fn next_frame(&mut self) -> Result<Option<VideoFrame>, StreamError> {
            Ok(self.0.next())
        }

        fn frame_rate(&self) -> Option<f32> {
            Some(30.0)
        }

        fn is_active(&self) -> bool {
            true
        }
    }

    fn frame(n: u64) -> VideoFrame {
        VideoFrame::new(1280, 720, n as f64 / 30.0, n)
    }

    fn subject(score: f32) -> PoseFrame {
        PoseFrame::new(vec![
            Keypoint::at(Joint::LeftShoulder, 400.0, 300.0, score),
            Keypoint::at(Joint::RightShoulder, 600.0, 320.0, score),
        ])
    }

    fn record(frame: u64, subjects: Vec<PoseFrame>) -> PoseRecord {
        PoseRecord {
            frame,
            subjects,
            pending: false,
        }
    }

    fn session(config: PlacementConfig) -> Session {
        Session::new(
            CameraModel::facing_forward(1280, 720),
            OverlayAsset::placeholder(Vec3::ONE),
            config,
        )
    }

    #[test]
    fn test_placed_tick_shows_overlay() {
        let mut session = session(PlacementConfig::default());
        let mut poses = RecordedPoseSource::new([record(0, vec![subject(0.9)])]);
        let mut renderer = CountingRenderer::default();

        let outcome = session.tick(&frame(0), &mut poses, &mut renderer).unwrap();
        match outcome {
            TickOutcome::Placed { placements, torso } => {
                assert_eq!(placements.len(), 1);
                assert_eq!(placements[0].slot, OverlaySlot::Center);
                assert!(placements[0].position.z < 0.0);
                assert!(torso.hips.is_none());
            }
            other => panic!("expected placement, got {other:?}"),
        }
        assert_eq!(renderer.visible, vec![true]);
        assert!(session.overlays()[0].position.z < 0.0);
    }

    #[test]
    fn test_low_confidence_keeps_state_and_hides() {
        let mut session = session(PlacementConfig::default());
        let mut poses = RecordedPoseSource::new([
            record(0, vec![subject(0.9)]),
            record(1, vec![subject(0.4)]),
        ]);
        let mut renderer = CountingRenderer::default();

        session.tick(&frame(0), &mut poses, &mut renderer).unwrap();
        let before = session.engine().states()[0];
        let outcome = session.tick(&frame(1), &mut poses, &mut renderer).unwrap();

        assert_eq!(outcome, TickOutcome::Lost);
        assert_eq!(session.engine().states()[0], before);
        assert_eq!(renderer.visible, vec![false]);
    }

    #[test]
    fn test_reset_policy_zeroes_on_loss() {
        let mut session =
            session(PlacementConfig::default().with_loss_policy(LossPolicy::Reset));
        let mut poses = RecordedPoseSource::new([record(0, vec![subject(0.9)])]);
        let mut renderer = CountingRenderer::default();

        session.tick(&frame(0), &mut poses, &mut renderer).unwrap();
        // No record for frame 1: no subject detected.
        session.tick(&frame(1), &mut poses, &mut renderer).unwrap();
        assert_eq!(session.engine().states()[0], SmoothedTransform::default());
    }

    #[test]
    fn test_pending_skips_without_state_change() {
        let mut session = session(PlacementConfig::default());
        let mut poses = RecordedPoseSource::new([
            record(0, vec![subject(0.9)]),
            record(1, vec![subject(0.9)]),
        ])
        .with_latency(1);
        let mut renderer = CountingRenderer::default();

        let outcome = session.tick(&frame(0), &mut poses, &mut renderer).unwrap();
        assert_eq!(outcome, TickOutcome::Skipped(SkipReason::Pending));
        assert_eq!(session.engine().states()[0], SmoothedTransform::default());
        assert_eq!(renderer.draws, 1);

        let outcome = session.tick(&frame(1), &mut poses, &mut renderer).unwrap();
        assert!(matches!(outcome, TickOutcome::Placed { .. }));
    }

    #[test]
    fn test_transient_and_fatal_source_errors() {
        let mut session = session(PlacementConfig::default());
        let mut renderer = CountingRenderer::default();

        let mut flaky = FailingSource(Some(PoseSourceError::Unavailable("busy".into())));
        let outcome = session.tick(&frame(0), &mut flaky, &mut renderer).unwrap();
        assert_eq!(outcome, TickOutcome::Skipped(SkipReason::Unavailable));

        let mut broken = FailingSource(Some(PoseSourceError::Fatal("gone".into())));
        assert!(matches!(
            session.tick(&frame(1), &mut broken, &mut renderer),
            Err(SessionError::PoseSource(PoseSourceError::Fatal(_)))
        ));
    }

    #[test]
    fn test_mirrored_session_flips_overlay() {
        let plain = PlacementConfig::default().with_smoothing(1.0);
        let mut front = session(plain.with_mirrored(true));
        let mut rear = session(plain);
        let mut renderer = CountingRenderer::default();

        for s in [&mut front, &mut rear] {
            let mut poses = RecordedPoseSource::new([record(0, vec![subject(0.9)])]);
            s.tick(&frame(0), &mut poses, &mut renderer).unwrap();
        }
        let (a, b) = (&front.overlays()[0], &rear.overlays()[0]);
        assert!(a.visible && b.visible);
        assert!((a.position.x + b.position.x).abs() < 1e-5);
        assert!((a.rotation.y + b.rotation.y).abs() < 1e-6);
        assert!((a.rotation.z + b.rotation.z).abs() < 1e-6);
    }

    #[test]
    fn test_first_subject_only() {
        let mut session = session(PlacementConfig::default());
        let mut poses =
            RecordedPoseSource::new([record(0, vec![subject(0.1), subject(0.9)])]);
        let mut renderer = CountingRenderer::default();
        let outcome = session.tick(&frame(0), &mut poses, &mut renderer).unwrap();
        assert_eq!(outcome, TickOutcome::Lost);
    }

    #[test]
    fn test_paired_session_places_two_overlays() {
        let mut session = Session::with_layout(
            CameraModel::facing_forward(1280, 720),
            OverlayAsset::placeholder(Vec3::ONE),
            PlacementConfig::default(),
            OverlayLayout::Paired { spread: 0.5 },
        );
        let mut poses = RecordedPoseSource::new([record(0, vec![subject(0.9)])]);
        let mut renderer = CountingRenderer::default();
        session.tick(&frame(0), &mut poses, &mut renderer).unwrap();
        assert_eq!(renderer.visible, vec![true, true]);
        let overlays = session.overlays();
        assert!(overlays[0].position.x < overlays[1].position.x);
    }

    #[test]
    fn test_run_until_stream_ends() {
        let mut session = session(PlacementConfig::default());
        let records = (0..10).map(|n| record(n, vec![subject(if n == 5 { 0.2 } else { 0.9 })]));
        let mut poses = RecordedPoseSource::new(records).with_latency(2);
        let mut frames = FrameList((0..10).map(frame).collect::<Vec<_>>().into_iter());
        let mut renderer = CountingRenderer::default();

        let stats = session.run(&mut frames, &mut poses, &mut renderer).unwrap();
        assert_eq!(stats.ticks(), 10);
        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.lost, 1);
        assert_eq!(stats.placed, 7);
        assert_eq!(renderer.draws, 10);
    }

    #[test]
    fn test_camera_follows_video_aspect() {
        let mut session = session(PlacementConfig::default());
        let mut poses = RecordedPoseSource::default();
        let mut renderer = CountingRenderer::default();
        session
            .tick(&VideoFrame::new(640, 480, 0.0, 0), &mut poses, &mut renderer)
            .unwrap();
        assert!((session.camera().aspect - 4.0 / 3.0).abs() < 1e-6);
    }
}
