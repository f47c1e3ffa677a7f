//! Cost matrices and optimal assignment shared by the associators and the evaluator.

use ndarray::Array2;
use tracing::warn;

use crate::tracker::rect::{Rect, iou_batch};

/// Cost of padding cells; large enough that lapjv never prefers them.
const PAD_COST: f64 = 1e6;

/// `1 - IoU` between every track box and every detection box.
pub fn iou_distance(track_boxes: &[Rect], det_boxes: &[Rect]) -> Array2<f32> {
    iou_batch(track_boxes, det_boxes).mapv(|iou| 1.0 - iou)
}

/// Euclidean distance between every pair of points.
pub fn point_distance(a: &[(i32, i32)], b: &[(i32, i32)]) -> Array2<f32> {
    Array2::from_shape_fn((a.len(), b.len()), |(i, j)| {
        let dx = f64::from(a[i].0) - f64::from(b[j].0);
        let dy = f64::from(a[i].1) - f64::from(b[j].1);
        dx.hypot(dy) as f32
    })
}

/// Rows are tracks (or hypotheses), columns are detections (or ground truth).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Minimum-cost assignment, keeping only pairs whose cost is `<= thresh`.
pub fn linear_assignment(cost_matrix: &Array2<f32>, thresh: f32) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();

    if num_rows == 0 || num_cols == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: (0..num_rows).collect(),
            unmatched_detections: (0..num_cols).collect(),
        };
    }

    // lapjv wants a square matrix.
    let size = num_rows.max(num_cols);
    let padded = Array2::from_shape_fn((size, size), |(i, j)| {
        if i < num_rows && j < num_cols {
            cost_matrix[[i, j]] as f64
        } else {
            PAD_COST
        }
    });

    let mut result = AssignmentResult::default();
    let mut detection_taken = vec![false; num_cols];

    match lapjv::lapjv(&padded) {
        Ok((row_to_col, _)) => {
            for (row, &col) in row_to_col.iter().enumerate().take(num_rows) {
                if col < num_cols && cost_matrix[[row, col]] <= thresh {
                    result.matches.push((row, col));
                    detection_taken[col] = true;
                } else {
                    result.unmatched_tracks.push(row);
                }
            }
        }
        Err(err) => {
            warn!(?err, num_rows, num_cols, "assignment failed, leaving everything unmatched");
            result.unmatched_tracks = (0..num_rows).collect();
        }
    }

    result.unmatched_detections = detection_taken
        .iter()
        .enumerate()
        .filter_map(|(i, &taken)| (!taken).then_some(i))
        .collect();

    result
}

/// Weight IoU similarity by detection confidence, column by column.
pub fn fuse_score(cost_matrix: &mut Array2<f32>, det_scores: &[f32]) {
    for ((_, j), cost) in cost_matrix.indexed_iter_mut() {
        let iou_sim = 1.0 - *cost;
        *cost = 1.0 - iou_sim * det_scores[j];
    }
}
