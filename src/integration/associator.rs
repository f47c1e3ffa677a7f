use crate::person::Person;

/// Backend that keeps a current id (cid) on each person across frames.
///
/// `update` must finish writing every cid of a frame before the roster is
/// reconciled; the reconciler advances tenure and may rewrite identities,
/// which `commit` hands back so they persist into the next frame.
pub trait TrackAssociator {
    /// Associate this frame's detections with live tracks. The returned
    /// roster has a unique cid on every person; dropped tracks are absent.
    fn update(&mut self, detections: Vec<Person>) -> Vec<Person>;

    /// Store the reconciled identities and tenure of the current roster.
    fn commit(&mut self, roster: &[Person]);

    /// Forget all tracks, e.g. at session start.
    fn reset(&mut self);
}
