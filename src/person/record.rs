use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use ndarray::Array2;

use super::repspoint::find_repspoint;
use crate::tracker::Rect;

/// Current track id, written by a track associator.
pub type TrackId = u64;

/// Identity label of a person nobody has recognised yet.
pub const UNKNOWN_ID: &str = "Unknown";

/// Process-wide counter behind `init_id`. Never reset, so ids stay unique for
/// the lifetime of the process.
static INIT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Allocate the next first-detection id.
pub fn next_init_id() -> u64 {
    INIT_ID_COUNTER.fetch_add(1, Ordering::SeqCst) + 1
}

/// The two independent identity namespaces a re-id backend can claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    Face,
    Deep,
}

impl IdKind {
    pub const ALL: [IdKind; 2] = [IdKind::Face, IdKind::Deep];
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Face => f.write_str("faceid"),
            Self::Deep => f.write_str("deepid"),
        }
    }
}

/// One tracked individual, one frame's worth of state.
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    init_id: u64,
    cid: Option<TrackId>,
    bbox: Rect,
    keypoints: Option<Array2<f32>>,
    repspoint: (i32, i32),
    det_conf: f32,
    faceid: String,
    deepid: String,
    faceid_conf: f32,
    deepid_conf: f32,
    ontracked: u32,
}

impl Person {
    /// Create an untracked person from a fresh detection. `repspoint` is
    /// placed on the box with `calibrate_weight`.
    pub fn new(init_id: u64, bbox: Rect, det_conf: f32, calibrate_weight: f32) -> Self {
        Self {
            init_id,
            cid: None,
            bbox,
            keypoints: None,
            repspoint: find_repspoint(bbox.to_xyxy(), calibrate_weight),
            det_conf,
            faceid: UNKNOWN_ID.to_string(),
            deepid: UNKNOWN_ID.to_string(),
            faceid_conf: 0.0,
            deepid_conf: 0.0,
            ontracked: 0,
        }
    }

    pub fn with_keypoints(mut self, keypoints: Array2<f32>) -> Self {
        self.keypoints = Some(keypoints);
        self
    }

    /// Re-place `repspoint` on the current box with another calibration weight.
    pub fn recalibrate(&mut self, calibrate_weight: f32) {
        self.repspoint = find_repspoint(self.bbox.to_xyxy(), calibrate_weight);
    }

    pub fn init_id(&self) -> u64 {
        self.init_id
    }

    /// Current track id, `None` until a track associator has seen the person.
    pub fn cid(&self) -> Option<TrackId> {
        self.cid
    }

    pub fn bbox(&self) -> Rect {
        self.bbox
    }

    /// Bounding box as `[x, y, width, height]`.
    pub fn box_xywh(&self) -> [f32; 4] {
        self.bbox.to_xywh()
    }

    /// Bounding box as `[x1, y1, x2, y2]`.
    pub fn box_xyxy(&self) -> [f32; 4] {
        self.bbox.to_xyxy()
    }

    pub fn keypoints(&self) -> Option<&Array2<f32>> {
        self.keypoints.as_ref()
    }

    pub fn repspoint(&self) -> (i32, i32) {
        self.repspoint
    }

    pub fn det_conf(&self) -> f32 {
        self.det_conf
    }

    pub fn faceid(&self) -> &str {
        &self.faceid
    }

    pub fn deepid(&self) -> &str {
        &self.deepid
    }

    pub fn faceid_conf(&self) -> f32 {
        self.faceid_conf
    }

    pub fn deepid_conf(&self) -> f32 {
        self.deepid_conf
    }

    /// Label and confidence held in one identity namespace.
    pub fn identity(&self, kind: IdKind) -> (&str, f32) {
        match kind {
            IdKind::Face => (&self.faceid, self.faceid_conf),
            IdKind::Deep => (&self.deepid, self.deepid_conf),
        }
    }

    /// Whether the person holds a real, non-zero-confidence claim in `kind`.
    pub fn holds_identity(&self, kind: IdKind) -> bool {
        let (label, conf) = self.identity(kind);
        label != UNKNOWN_ID && conf > 0.0
    }

    pub fn ontracked(&self) -> u32 {
        self.ontracked
    }

    pub fn increment_on_tracked(&mut self) {
        self.ontracked = self.ontracked.saturating_add(1);
    }

    /// Catch up tenure after `nframe` frames in one step.
    pub fn update_on_tracked(&mut self, nframe: u32) {
        self.ontracked = self.ontracked.saturating_add(nframe);
    }

    /// Overwrite cid, both identity labels and both confidences at once.
    pub fn update_ids(
        &mut self,
        new_cid: TrackId,
        new_faceid: impl Into<String>,
        new_deepid: impl Into<String>,
        new_faceid_conf: f32,
        new_deepid_conf: f32,
    ) {
        self.cid = Some(new_cid);
        self.faceid = new_faceid.into();
        self.deepid = new_deepid.into();
        self.faceid_conf = new_faceid_conf;
        self.deepid_conf = new_deepid_conf;
    }

    /// Assign the current track id. Only track associators call this.
    pub fn assign_cid(&mut self, cid: TrackId) {
        self.cid = Some(cid);
    }

    /// Take box, keypoints, detection confidence and repspoint from a newer
    /// detection of the same individual, keeping ids and tenure.
    pub fn absorb_detection(&mut self, detection: &Person) {
        self.bbox = detection.bbox;
        self.keypoints = detection.keypoints.clone();
        self.repspoint = detection.repspoint;
        self.det_conf = detection.det_conf;
    }

    /// Take both identities, their confidences and tenure from the reconciled
    /// copy of this person. `cid` and geometry stay as they are.
    pub fn inherit_identity(&mut self, reconciled: &Person) {
        self.faceid.clone_from(&reconciled.faceid);
        self.deepid.clone_from(&reconciled.deepid);
        self.faceid_conf = reconciled.faceid_conf;
        self.deepid_conf = reconciled.deepid_conf;
        self.ontracked = reconciled.ontracked;
    }
}
