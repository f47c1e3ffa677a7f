//! Backend traits for detection, track association and re-identification,
//! and the per-frame pipeline that drives them.

mod associator;
mod builder;
mod detector;
mod ground_truth_detector;
mod pipeline;
mod reid_source;

pub use associator::TrackAssociator;
pub use builder::PersonBuilder;
pub use detector::DetectionSource;
pub use ground_truth_detector::GroundTruthDetector;
pub use pipeline::PeoplePipeline;
pub use reid_source::{NoReId, ReIdSource};
