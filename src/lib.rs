//! People tracking with identity reconciliation.
//!
//! Per frame, a [`DetectionSource`] produces untracked [`Person`] records, a
//! [`TrackAssociator`] gives each a current id (cid), a [`ReIdSource`]
//! proposes face and deep identities, and the [`Reconciler`] merges those
//! proposals into a roster where no two persons hold the same identity.
//! [`PeoplePipeline`] drives the whole sequence and feeds an [`Evaluator`].

pub mod config;
pub mod error;
pub mod eval;
pub mod integration;
pub mod person;
pub mod reid;
pub mod tracker;

pub use config::{DetectorConfig, ReIdConfig, SessionConfig, TrackerKind};
pub use error::{Error, Result};
pub use eval::{EvalRecorder, EvalSummary, Evaluator, GroundTruth, OnlineEvaluator};
pub use integration::{
    DetectionSource, GroundTruthDetector, NoReId, PeoplePipeline, PersonBuilder, ReIdSource,
    TrackAssociator,
};
pub use person::{IdKind, Person, TrackId, UNKNOWN_ID, find_repspoint, find_repspoint_list};
pub use reid::{IdClaim, ReIdSignal, ReconcileReport, Reconciler};
pub use tracker::{ByteTracker, CentroidConfig, CentroidTracker, Rect, TrackerConfig};
