//! Identity reconciliation: merge face/deep re-identification signals into
//! stable identities and resolve duplicate claims across the roster.

mod reconciler;
mod registry;
mod signal;

pub use reconciler::{ReconcileReport, Reconciler};
pub use registry::IdentityRegistry;
pub use signal::{IdClaim, ReIdSignal};
