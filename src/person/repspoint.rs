/// Representative point `(x, y)` of an XYXY box.
///
/// `x` is the horizontal middle of the box. `calibrate_weight` places `y`
/// between `min(y1, y2)` (weight 0) and `max(y1, y2)` (weight 1); weights
/// outside `[0, 1]` extrapolate above or below the box. Both coordinates are
/// truncated toward zero. The box is not validated: `x1 == x2` gives `x = x1`
/// and a NaN coordinate saturates to 0.
pub fn find_repspoint(box_xyxy: [f32; 4], calibrate_weight: f32) -> (i32, i32) {
    let [x1, y1, x2, y2] = box_xyxy.map(f64::from);
    let x = ((x1 + x2) / 2.0) as i32;
    let y_start = y1.min(y2);
    let y_dist = (y1 - y2).abs();
    let y = (y_start + f64::from(calibrate_weight) * y_dist) as i32;
    (x, y)
}

/// Same point as [`find_repspoint`], as a mutable two-element array.
pub fn find_repspoint_list(box_xyxy: [f32; 4], calibrate_weight: f32) -> [i32; 2] {
    let (x, y) = find_repspoint(box_xyxy, calibrate_weight);
    [x, y]
}
