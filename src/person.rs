//! The per-frame identity and state unit carried through the pipeline.

mod record;
mod repspoint;

pub use record::{IdKind, Person, TrackId, UNKNOWN_ID, next_init_id};
pub use repspoint::{find_repspoint, find_repspoint_list};
