//! Builder for creating Person records from detector outputs.

use ndarray::Array2;

use crate::person::{Person, next_init_id};
use crate::tracker::Rect;

/// Builder for a freshly detected, untracked `Person`.
///
/// Unless overridden with [`PersonBuilder::init_id`], every built person
/// takes the next process-wide first-detection id.
#[derive(Debug, Clone)]
pub struct PersonBuilder {
    bbox: Rect,
    det_conf: f32,
    calibration: f32,
    keypoints: Option<Array2<f32>>,
    init_id: Option<u64>,
}

impl Default for PersonBuilder {
    fn default() -> Self {
        Self {
            bbox: Rect::default(),
            det_conf: 0.5,
            calibration: 0.25,
            keypoints: None,
            init_id: None,
        }
    }
}

impl PersonBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bounding box from corners (x1, y1, x2, y2).
    pub fn xyxy(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.bbox = Rect::from_xyxy(x1, y1, x2, y2);
        self
    }

    /// Set bounding box from top-left corner and size.
    pub fn xywh(mut self, x: f32, y: f32, w: f32, h: f32) -> Self {
        self.bbox = Rect::from_xywh(x, y, w, h);
        self
    }

    /// Set bounding box from center and size (YOLO head output).
    pub fn cxcywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.bbox = Rect::from_cxcywh(cx, cy, w, h);
        self
    }

    pub fn bbox(mut self, bbox: Rect) -> Self {
        self.bbox = bbox;
        self
    }

    pub fn det_conf(mut self, det_conf: f32) -> Self {
        self.det_conf = det_conf;
        self
    }

    /// Weight placing the representative point between box top (0) and bottom (1).
    pub fn calibration(mut self, calibrate_weight: f32) -> Self {
        self.calibration = calibrate_weight;
        self
    }

    /// Pose keypoints, one row per keypoint.
    pub fn keypoints(mut self, keypoints: Array2<f32>) -> Self {
        self.keypoints = Some(keypoints);
        self
    }

    /// Use a fixed first-detection id instead of allocating one.
    pub fn init_id(mut self, init_id: u64) -> Self {
        self.init_id = Some(init_id);
        self
    }

    pub fn build(self) -> Person {
        let init_id = self.init_id.unwrap_or_else(next_init_id);
        let person = Person::new(init_id, self.bbox, self.det_conf, self.calibration);
        match self.keypoints {
            Some(keypoints) => person.with_keypoints(keypoints),
            None => person,
        }
    }
}
