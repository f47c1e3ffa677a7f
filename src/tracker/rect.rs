use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Axis-aligned person bounding box.
///
/// Stored once as top-left corner plus size, and handed out in the encodings
/// the rest of the pipeline speaks:
/// - XYWH: Top-Left X, Top-Left Y, Width, Height
/// - XYXY: Top-Left X, Top-Left Y, Bottom-Right X, Bottom-Right Y
/// - XYAH: Center X, Center Y, Aspect Ratio (w/h), Height (Kalman state)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a Rect from XYWH (top-left corner and size).
    #[inline]
    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a Rect from XYXY corners.
    #[inline]
    pub fn from_xyxy(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Create a Rect from a center point and size, as most YOLO heads emit it.
    #[inline]
    pub fn from_cxcywh(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }

    #[inline]
    pub fn from_xyah(cx: f32, cy: f32, aspect_ratio: f32, height: f32) -> Self {
        Self::from_cxcywh(cx, cy, aspect_ratio * height, height)
    }

    #[inline]
    pub fn to_xyxy(&self) -> [f32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }

    #[inline]
    pub fn to_xywh(&self) -> [f32; 4] {
        [self.x, self.y, self.width, self.height]
    }

    /// Kalman measurement vector. Zero height yields aspect ratio 0.
    #[inline]
    pub fn to_xyah(&self) -> [f64; 4] {
        let (cx, cy) = self.center();
        let aspect_ratio = if self.height > 0.0 {
            self.width / self.height
        } else {
            0.0
        };
        [cx as f64, cy as f64, aspect_ratio as f64, self.height as f64]
    }

    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Intersection over union with another box; 0 when the union is empty.
    pub fn iou(&self, other: &Rect) -> f32 {
        let [ax1, ay1, ax2, ay2] = self.to_xyxy();
        let [bx1, by1, bx2, by2] = other.to_xyxy();

        let inter_width = (ax2.min(bx2) - ax1.max(bx1)).max(0.0);
        let inter_height = (ay2.min(by2) - ay1.max(by1)).max(0.0);
        let inter_area = inter_width * inter_height;

        let union_area = self.area() + other.area() - inter_area;
        if union_area > 0.0 {
            inter_area / union_area
        } else {
            0.0
        }
    }
}

/// IoU matrix of shape (M, N) between `boxes_a` and `boxes_b`.
pub fn iou_batch(boxes_a: &[Rect], boxes_b: &[Rect]) -> Array2<f32> {
    Array2::from_shape_fn((boxes_a.len(), boxes_b.len()), |(i, j)| {
        boxes_a[i].iou(&boxes_b[j])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_box_encodings() {
        let rect = Rect::from_xyxy(100.0, 200.0, 140.0, 260.0);
        assert_eq!(rect.to_xywh(), [100.0, 200.0, 40.0, 60.0]);
        assert_eq!(rect.to_xyxy(), [100.0, 200.0, 140.0, 260.0]);

        let xyah = rect.to_xyah();
        assert_eq!(xyah[0], 120.0);
        assert_eq!(xyah[1], 230.0);
        assert!((xyah[2] - 40.0 / 60.0).abs() < 1e-6);
        assert_eq!(xyah[3], 60.0);
    }

    #[test]
    fn test_from_cxcywh() {
        let rect = Rect::from_cxcywh(120.0, 230.0, 40.0, 60.0);
        assert_eq!(rect, Rect::from_xyxy(100.0, 200.0, 140.0, 260.0));
    }

    #[test]
    fn test_xyah_round_trip_through_kalman_state() {
        let rect = Rect::from_xyah(25.0, 40.0, 0.75, 40.0);
        assert!((rect.x - 10.0).abs() < 1e-6);
        assert!((rect.y - 20.0).abs() < 1e-6);
        assert!((rect.width - 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_box_has_zero_aspect() {
        let flat = Rect::from_xyxy(10.0, 10.0, 20.0, 10.0);
        assert_eq!(flat.to_xyah()[2], 0.0);
        assert_eq!(flat.iou(&flat), 0.0);
    }

    #[test]
    fn test_iou_partial_overlap() {
        let a = Rect::from_xywh(0.0, 0.0, 10.0, 10.0);
        let b = Rect::from_xywh(5.0, 5.0, 10.0, 10.0);
        assert!((a.iou(&b) - 25.0 / 175.0).abs() < 1e-6);
        assert_eq!(a.iou(&Rect::from_xywh(20.0, 20.0, 10.0, 10.0)), 0.0);
    }

    #[test]
    fn test_iou_batch_shape() {
        let a = [Rect::from_xywh(0.0, 0.0, 10.0, 10.0)];
        let b = [a[0], Rect::from_xywh(50.0, 50.0, 10.0, 10.0)];
        let ious = iou_batch(&a, &b);
        assert_eq!(ious.dim(), (1, 2));
        assert!((ious[[0, 0]] - 1.0).abs() < 1e-6);
        assert_eq!(ious[[0, 1]], 0.0);
    }
}
