use crate::person::{IdKind, UNKNOWN_ID};

/// One labelled guess from a re-id backend, confidence in `[0, 100]`.
#[derive(Debug, Clone, PartialEq)]
pub struct IdClaim {
    pub label: String,
    pub conf: f32,
}

impl IdClaim {
    pub fn new(label: impl Into<String>, conf: f32) -> Self {
        Self {
            label: label.into(),
            conf,
        }
    }

    /// "Unknown" and zero-confidence results claim nothing.
    pub fn is_claim(&self) -> bool {
        self.label != UNKNOWN_ID && self.conf > 0.0
    }
}

/// What the re-id backends said about one person this frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReIdSignal {
    pub face: Option<IdClaim>,
    pub deep: Option<IdClaim>,
}

impl ReIdSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_face(mut self, label: impl Into<String>, conf: f32) -> Self {
        self.face = Some(IdClaim::new(label, conf));
        self
    }

    pub fn with_deep(mut self, label: impl Into<String>, conf: f32) -> Self {
        self.deep = Some(IdClaim::new(label, conf));
        self
    }

    pub fn claim(&self, kind: IdKind) -> Option<&IdClaim> {
        match kind {
            IdKind::Face => self.face.as_ref(),
            IdKind::Deep => self.deep.as_ref(),
        }
    }

    /// Drop claims below `min_confidence`; `None` if nothing is left.
    pub fn above(self, min_confidence: f32) -> Option<Self> {
        let keep = |c: Option<IdClaim>| c.filter(|c| c.is_claim() && c.conf >= min_confidence);
        let signal = Self {
            face: keep(self.face),
            deep: keep(self.deep),
        };
        (signal.face.is_some() || signal.deep.is_some()).then_some(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_and_zero_are_not_claims() {
        assert!(!IdClaim::new(UNKNOWN_ID, 90.0).is_claim());
        assert!(!IdClaim::new("bob", 0.0).is_claim());
        assert!(IdClaim::new("bob", 0.1).is_claim());
    }

    #[test]
    fn test_above_filters_each_kind() {
        let signal = ReIdSignal::new().with_face("alice", 30.0).with_deep("bob", 80.0);
        let kept = signal.above(50.0).unwrap();
        assert_eq!(kept.face, None);
        assert_eq!(kept.claim(IdKind::Deep).map(|c| c.label.as_str()), Some("bob"));

        let weak = ReIdSignal::new().with_face("alice", 30.0);
        assert_eq!(weak.above(50.0), None);
    }
}
