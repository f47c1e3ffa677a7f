//! Track associator backends: assign and maintain a current id per person.

mod byte_tracker;
mod centroid;
mod kalman_filter;
mod matching;
mod rect;
mod strack;

pub use byte_tracker::{ByteTracker, TrackerConfig};
pub use centroid::{CentroidConfig, CentroidTracker};
pub use matching::{AssignmentResult, iou_distance, linear_assignment};
pub use rect::Rect;
pub use strack::{STrack, TrackState};
