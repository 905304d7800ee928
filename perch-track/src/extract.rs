//! Keypoint extraction: pulls confident left/right joint pairs out of a pose.

use crate::ingest::{Joint, PoseFrame};
use glam::Vec2;

/// Default minimum score a joint must exceed to be tracked.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.4;

/// A joint position in video pixels with its model score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedPoint {
    pub position: Vec2,
    pub score: f32,
}

impl TrackedPoint {
    pub fn new(x: f32, y: f32, score: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            score,
        }
    }
}

/// Left and right instances of the same joint, from the subject's point of view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointPair {
    pub left: TrackedPoint,
    pub right: TrackedPoint,
}

impl JointPair {
    pub fn new(left: TrackedPoint, right: TrackedPoint) -> Self {
        Self { left, right }
    }

    /// Vector from the left joint to the right joint.
    pub fn delta(&self) -> Vec2 {
        self.right.position - self.left.position
    }

    /// Pixel distance between the two joints.
    pub fn span(&self) -> f32 {
        let d = self.delta();
        d.x.hypot(d.y)
    }

    /// In-plane angle of the left→right line, in radians.
    pub fn angle(&self) -> f32 {
        let d = self.delta();
        d.y.atan2(d.x)
    }

    pub fn midpoint(&self) -> Vec2 {
        (self.left.position + self.right.position) * 0.5
    }

    pub fn min_score(&self) -> f32 {
        self.left.score.min(self.right.score)
    }
}

/// Shoulders plus, when both are confident, the hips.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Torso {
    pub shoulders: JointPair,
    pub hips: Option<JointPair>,
}

impl Torso {
    /// Pixel distance from the shoulder midpoint to the hip midpoint.
    pub fn torso_length(&self) -> Option<f32> {
        self.hips
            .map(|hips| hips.midpoint().distance(self.shoulders.midpoint()))
    }
}

fn confident_pair(pose: &PoseFrame, left: Joint, right: Joint, threshold: f32) -> Option<JointPair> {
    let l = pose.get(left).filter(|k| k.is_confident(threshold))?;
    let r = pose.get(right).filter(|k| k.is_confident(threshold))?;
    Some(JointPair::new(
        TrackedPoint::new(l.x, l.y, l.score),
        TrackedPoint::new(r.x, r.y, r.score),
    ))
}

/// Both shoulders scoring strictly above `threshold`, or `None` when tracking is insufficient.
pub fn extract_shoulders(pose: &PoseFrame, threshold: f32) -> Option<JointPair> {
    confident_pair(pose, Joint::LeftShoulder, Joint::RightShoulder, threshold)
}

/// Shoulders (required) and hips (optional) above `threshold`.
pub fn extract_torso(pose: &PoseFrame, threshold: f32) -> Option<Torso> {
    let shoulders = extract_shoulders(pose, threshold)?;
    let hips = confident_pair(pose, Joint::LeftHip, Joint::RightHip, threshold);
    Some(Torso { shoulders, hips })
}

/// Collapse a multi-subject estimate to its first detection.
pub fn first_subject(subjects: &[PoseFrame]) -> Option<&PoseFrame> {
    subjects.first()
}
