use thiserror::Error;

use crate::person::TrackId;

#[derive(Debug, Error)]
pub enum Error {
    /// Two persons reached the reconciler holding the same current id.
    #[error("duplicate current id {cid} in roster")]
    DuplicateCid { cid: TrackId },

    /// A person reached the reconciler before a track associator assigned it a cid.
    #[error("person {init_id} has no current id")]
    UntrackedPerson { init_id: u64 },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("ground truth line {line}: {reason}")]
    GroundTruthParse { line: usize, reason: String },

    /// Failure reported by a detection or re-identification backend.
    #[error("backend error: {0}")]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Box::new(err))
    }
}
