use std::collections::HashMap;

use crate::person::TrackId;

/// Which current id holds each resolved label, for one identity namespace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityRegistry {
    holders: HashMap<String, TrackId>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holder(&self, label: &str) -> Option<TrackId> {
        self.holders.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.holders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, TrackId)> {
        self.holders.iter().map(|(label, &cid)| (label.as_str(), cid))
    }

    /// Point `label` at `cid`, returning the previous holder.
    pub(crate) fn register(&mut self, label: &str, cid: TrackId) -> Option<TrackId> {
        self.holders.insert(label.to_string(), cid)
    }

    /// Forget `label` if `cid` is the one holding it.
    pub(crate) fn release(&mut self, label: &str, cid: TrackId) -> bool {
        if self.holder(label) == Some(cid) {
            self.holders.remove(label);
            true
        } else {
            false
        }
    }

    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&str, TrackId) -> bool) {
        self.holders.retain(|label, cid| keep(label, *cid));
    }

    pub(crate) fn clear(&mut self) {
        self.holders.clear();
    }
}
