//! Builder for creating Detection objects from various input formats.

use crate::error::DetectionError;
use crate::tracker::{Detection, Rect};

/// Builder for creating `Detection` objects from various input formats.
#[derive(Debug, Clone, Default)]
pub struct DetectionBuilder {
    bbox: Rect,
    score: f32,
}

impl DetectionBuilder {
    /// Create a new detection builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.bbox = Rect::new(x1, y1, x2, y2);
        self
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.bbox = Rect::from_xywh(cx, cy, w, h);
        self
    }

    /// Set bounding box in TLWH format (left, top, width, height).
    pub fn tlwh(mut self, x: f32, y: f32, w: f32, h: f32) -> Self {
        self.bbox = Rect::from_tlwh(x, y, w, h);
        self
    }

    /// Set the confidence score.
    pub fn score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    /// Build the final `Detection` without checking the box.
    ///
    /// Malformed boxes are still caught by the tracker, which reports them
    /// in [`TrackerOutput::rejected`](crate::TrackerOutput::rejected).
    pub fn build(self) -> Detection {
        Detection::from_rect(self.bbox, self.score)
    }

    /// Build the final `Detection`, refusing empty or non-finite boxes.
    pub fn try_build(self) -> Result<Detection, DetectionError> {
        let det = self.build();
        det.validate()?;
        Ok(det)
    }
}
