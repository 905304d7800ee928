//! Writes each rendered frame's overlay transforms as one JSON line.

use perch_track::VideoFrame;
use perch_track::scene::{CameraModel, OverlayAsset};
use perch_track::session::{OverlayRenderer, RenderError};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct OverlayRecord<'a> {
    kind: &'a str,
    visible: bool,
    position: [f32; 3],
    rotation: [f32; 3],
    scale: f32,
}

#[derive(Debug, Serialize)]
struct FrameRecord<'a> {
    frame: u64,
    timestamp: f64,
    overlays: Vec<OverlayRecord<'a>>,
}

/// Renderer that serialises the scene instead of drawing it.
pub struct JsonLinesRenderer<W: Write> {
    writer: W,
    frames_written: u64,
}

impl<W: Write> JsonLinesRenderer<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            frames_written: 0,
        }
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn finish(mut self) -> Result<W, RenderError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> OverlayRenderer for JsonLinesRenderer<W> {
    fn draw(
        &mut self,
        frame: &VideoFrame,
        overlays: &[OverlayAsset],
        _camera: &CameraModel,
    ) -> Result<(), RenderError> {
        let record = FrameRecord {
            frame: frame.frame_number,
            timestamp: frame.timestamp,
            overlays: overlays
                .iter()
                .map(|overlay| OverlayRecord {
                    kind: overlay.geometry().kind(),
                    visible: overlay.visible,
                    position: overlay.position.to_array(),
                    rotation: overlay.rotation.to_array(),
                    scale: overlay.scale.x,
                })
                .collect(),
        };
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        self.frames_written += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_one_line_per_frame() {
        let mut renderer = JsonLinesRenderer::new(Vec::new());
        let camera = CameraModel::default();
        let mut overlay = OverlayAsset::placeholder(Vec3::ONE);

        renderer
            .draw(&VideoFrame::new(1280, 720, 0.0, 0), &[overlay.clone()], &camera)
            .unwrap();
        overlay.visible = true;
        overlay.position = Vec3::new(0.5, -0.25, -3.0);
        overlay.scale = Vec3::splat(2.0);
        renderer
            .draw(&VideoFrame::new(1280, 720, 0.5, 1), &[overlay], &camera)
            .unwrap();
        assert_eq!(renderer.frames_written(), 2);

        let text = String::from_utf8(renderer.finish().unwrap()).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["overlays"][0]["visible"], false);
        assert_eq!(lines[1]["frame"], 1);
        assert_eq!(lines[1]["overlays"][0]["kind"], "box");
        assert_eq!(lines[1]["overlays"][0]["scale"], 2.0);
        assert_eq!(lines[1]["overlays"][0]["position"][2], -3.0);
    }
}
