//! Two-pass identity reconciliation over one frame's roster.
//!
//! Pass 1 (normal merge) accepts each re-id claim that beats the confidence
//! the person already holds for that kind and advances tenure. Pass 2
//! (duplicate killer) runs only after every Pass 1 update of the frame is
//! committed: for each label held by more than one person, the longest
//! tracked holder keeps it, then the most confident, then the first detected.
//! Losers fall back to "Unknown" and keep their cid.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use super::registry::IdentityRegistry;
use super::signal::ReIdSignal;
use crate::error::{Error, Result};
use crate::person::{IdKind, Person, TrackId, UNKNOWN_ID};

/// What one `reconcile` call changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Claims written in the normal merge pass.
    pub accepted: usize,
    /// Identities reset to "Unknown" by the duplicate killer.
    pub revoked: usize,
    /// Labels that had more than one holder.
    pub contested: usize,
}

/// Session-scoped owner of the label registries.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    face: IdentityRegistry,
    deep: IdentityRegistry,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self, kind: IdKind) -> &IdentityRegistry {
        match kind {
            IdKind::Face => &self.face,
            IdKind::Deep => &self.deep,
        }
    }

    fn registry_mut(&mut self, kind: IdKind) -> &mut IdentityRegistry {
        match kind {
            IdKind::Face => &mut self.face,
            IdKind::Deep => &mut self.deep,
        }
    }

    /// Forget every registered identity. Call at session start.
    pub fn reset(&mut self) {
        self.face.clear();
        self.deep.clear();
    }

    /// Reconcile one frame. `signals` holds fresh re-id results keyed by cid;
    /// persons without an entry keep their identities. `elapsed_frames` is
    /// the tenure credited to every person (1 when reconciling every frame).
    ///
    /// Fails without touching the roster when a person has no cid or two
    /// persons share one.
    pub fn reconcile(
        &mut self,
        roster: &mut [Person],
        signals: &HashMap<TrackId, ReIdSignal>,
        elapsed_frames: u32,
    ) -> Result<ReconcileReport> {
        let cids = check_roster(roster)?;

        let mut report = ReconcileReport {
            accepted: self.merge(roster, &cids, signals, elapsed_frames),
            ..Default::default()
        };
        for kind in IdKind::ALL {
            let (revoked, contested) = self.kill_duplicates(roster, &cids, kind);
            report.revoked += revoked;
            report.contested += contested;
        }

        Ok(report)
    }

    fn merge(
        &mut self,
        roster: &mut [Person],
        cids: &[TrackId],
        signals: &HashMap<TrackId, ReIdSignal>,
        elapsed_frames: u32,
    ) -> usize {
        let mut accepted = 0;

        for (person, &cid) in roster.iter_mut().zip(cids) {
            if let Some(signal) = signals.get(&cid) {
                for kind in IdKind::ALL {
                    let Some(claim) = signal.claim(kind).filter(|c| c.is_claim()) else {
                        continue;
                    };
                    let (held, held_conf) = person.identity(kind);
                    if claim.conf <= held_conf {
                        continue;
                    }

                    let held = held.to_string();
                    set_identity(person, cid, kind, &claim.label, claim.conf);
                    accepted += 1;

                    let registry = self.registry_mut(kind);
                    if held != claim.label {
                        registry.release(&held, cid);
                    }
                    match registry.register(&claim.label, cid) {
                        Some(holder) if holder != cid => debug!(
                            %kind, label = %claim.label, cid, holder,
                            "identity claimed by two tracks"
                        ),
                        _ => debug!(%kind, label = %claim.label, cid, conf = claim.conf, "identity accepted"),
                    }
                }
            }

            if elapsed_frames == 1 {
                person.increment_on_tracked();
            } else {
                person.update_on_tracked(elapsed_frames);
            }
        }

        accepted
    }

    fn kill_duplicates(
        &mut self,
        roster: &mut [Person],
        cids: &[TrackId],
        kind: IdKind,
    ) -> (usize, usize) {
        let mut revoked = 0;
        let mut contested = 0;

        // Sorted by label so revocations happen in a reproducible order.
        let mut holders: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut void = Vec::new();
        for (idx, person) in roster.iter().enumerate() {
            let (label, conf) = person.identity(kind);
            if label == UNKNOWN_ID {
                continue;
            }
            if conf > 0.0 {
                holders.entry(label.to_string()).or_default().push(idx);
            } else {
                void.push(idx);
            }
        }

        // A label held at zero confidence is no claim at all.
        for idx in void {
            revoke(&mut roster[idx], cids[idx], kind);
            revoked += 1;
        }

        for (label, idxs) in holders {
            let Some(&winner) = idxs
                .iter()
                .max_by(|&&a, &&b| precedence(&roster[a], &roster[b], kind))
            else {
                continue;
            };

            if idxs.len() > 1 {
                contested += 1;
                for &idx in idxs.iter().filter(|&&idx| idx != winner) {
                    debug!(
                        %kind, %label, winner = cids[winner], loser = cids[idx],
                        "duplicate identity revoked"
                    );
                    revoke(&mut roster[idx], cids[idx], kind);
                    revoked += 1;
                }
            }
            self.registry_mut(kind).register(&label, cids[winner]);
        }

        // Drop entries of tracks that left the roster or no longer hold the label.
        let live: HashMap<TrackId, &Person> = cids.iter().copied().zip(roster.iter()).collect();
        self.registry_mut(kind).retain(|label, cid| {
            live.get(&cid)
                .is_some_and(|p| p.identity(kind).0 == label)
        });

        (revoked, contested)
    }
}

/// Ordering of contenders for one label: greater wins.
fn precedence(a: &Person, b: &Person, kind: IdKind) -> Ordering {
    a.ontracked()
        .cmp(&b.ontracked())
        .then_with(|| a.identity(kind).1.total_cmp(&b.identity(kind).1))
        .then_with(|| b.init_id().cmp(&a.init_id()))
}

fn set_identity(person: &mut Person, cid: TrackId, kind: IdKind, label: &str, conf: f32) {
    let (faceid, faceid_conf) = match kind {
        IdKind::Face => (label.to_string(), conf),
        IdKind::Deep => (person.faceid().to_string(), person.faceid_conf()),
    };
    let (deepid, deepid_conf) = match kind {
        IdKind::Deep => (label.to_string(), conf),
        IdKind::Face => (person.deepid().to_string(), person.deepid_conf()),
    };
    person.update_ids(cid, faceid, deepid, faceid_conf, deepid_conf);
}

fn revoke(person: &mut Person, cid: TrackId, kind: IdKind) {
    set_identity(person, cid, kind, UNKNOWN_ID, 0.0);
}

/// Every person must carry a cid, and no two the same one.
fn check_roster(roster: &[Person]) -> Result<Vec<TrackId>> {
    let mut seen = HashSet::with_capacity(roster.len());
    roster
        .iter()
        .map(|person| {
            let cid = person.cid().ok_or(Error::UntrackedPerson {
                init_id: person.init_id(),
            })?;
            if !seen.insert(cid) {
                return Err(Error::DuplicateCid { cid });
            }
            Ok(cid)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::Rect;

    fn tracked(init_id: u64, cid: TrackId, ontracked: u32) -> Person {
        let mut p = Person::new(init_id, Rect::from_xywh(0.0, 0.0, 10.0, 20.0), 0.9, 0.25);
        p.assign_cid(cid);
        p.update_on_tracked(ontracked);
        p
    }

    fn signals(entries: &[(TrackId, ReIdSignal)]) -> HashMap<TrackId, ReIdSignal> {
        entries.iter().cloned().collect()
    }

    #[test]
    fn test_empty_roster_is_noop() {
        let mut reconciler = Reconciler::new();
        let report = reconciler.reconcile(&mut [], &HashMap::new(), 1).unwrap();
        assert_eq!(report, ReconcileReport::default());
        assert!(reconciler.registry(IdKind::Deep).is_empty());
    }

    #[test]
    fn test_accepts_stronger_claim_and_registers() {
        let mut reconciler = Reconciler::new();
        let mut roster = vec![tracked(1, 5, 0)];
        let s = signals(&[(5, ReIdSignal::new().with_face("alice", 40.0))]);

        let report = reconciler.reconcile(&mut roster, &s, 1).unwrap();
        assert_eq!(report.accepted, 1);
        assert_eq!(roster[0].identity(IdKind::Face), ("alice", 40.0));
        assert_eq!(roster[0].deepid(), UNKNOWN_ID);
        assert_eq!(reconciler.registry(IdKind::Face).holder("alice"), Some(5));
    }

    #[test]
    fn test_weaker_or_equal_claim_is_ignored() {
        let mut reconciler = Reconciler::new();
        let mut roster = vec![tracked(1, 5, 0)];
        roster[0].update_ids(5, UNKNOWN_ID, "bob", 0.0, 60.0);

        for conf in [60.0, 59.0] {
            let s = signals(&[(5, ReIdSignal::new().with_deep("carol", conf))]);
            reconciler.reconcile(&mut roster, &s, 1).unwrap();
            assert_eq!(roster[0].identity(IdKind::Deep), ("bob", 60.0));
        }
    }

    #[test]
    fn test_kinds_gate_independently() {
        let mut reconciler = Reconciler::new();
        let mut roster = vec![tracked(1, 5, 0)];
        roster[0].update_ids(5, "alice", "bob", 90.0, 10.0);

        let s = signals(&[(5, ReIdSignal::new().with_face("eve", 50.0).with_deep("dave", 50.0))]);
        let report = reconciler.reconcile(&mut roster, &s, 1).unwrap();
        assert_eq!(report.accepted, 1);
        assert_eq!(roster[0].faceid(), "alice");
        assert_eq!(roster[0].identity(IdKind::Deep), ("dave", 50.0));
    }

    #[test]
    fn test_no_signal_keeps_identity_and_counts_tenure() {
        let mut reconciler = Reconciler::new();
        let mut roster = vec![tracked(1, 5, 3)];
        roster[0].update_ids(5, "alice", UNKNOWN_ID, 70.0, 0.0);

        reconciler.reconcile(&mut roster, &HashMap::new(), 1).unwrap();
        reconciler.reconcile(&mut roster, &HashMap::new(), 4).unwrap();
        assert_eq!(roster[0].faceid(), "alice");
        assert_eq!(roster[0].ontracked(), 8);
    }

    #[test]
    fn test_zero_and_unknown_claims_are_ignored() {
        let mut reconciler = Reconciler::new();
        let mut roster = vec![tracked(1, 5, 0)];
        let s = signals(&[(5, ReIdSignal::new().with_face("alice", 0.0).with_deep(UNKNOWN_ID, 99.0))]);

        let report = reconciler.reconcile(&mut roster, &s, 1).unwrap();
        assert_eq!(report.accepted, 0);
        assert_eq!(roster[0].faceid(), UNKNOWN_ID);
        assert_eq!(roster[0].deepid(), UNKNOWN_ID);
    }

    #[test]
    fn test_tenure_beats_confidence() {
        let mut reconciler = Reconciler::new();
        let mut a = tracked(1, 5, 39);
        a.update_ids(5, UNKNOWN_ID, "Bob", 0.0, 80.0);
        let mut b = tracked(2, 7, 9);
        b.update_ids(7, UNKNOWN_ID, "Bob", 0.0, 95.0);
        let mut roster = vec![a, b];

        let report = reconciler.reconcile(&mut roster, &HashMap::new(), 1).unwrap();
        assert_eq!(report.revoked, 1);
        assert_eq!(report.contested, 1);
        assert_eq!(roster[0].deepid(), "Bob");
        assert_eq!(roster[1].identity(IdKind::Deep), (UNKNOWN_ID, 0.0));
        assert_eq!(roster[1].cid(), Some(7));
        assert_eq!(reconciler.registry(IdKind::Deep).holder("Bob"), Some(5));
    }

    #[test]
    fn test_confidence_breaks_tenure_tie() {
        let mut reconciler = Reconciler::new();
        let mut roster = vec![tracked(1, 5, 10), tracked(2, 7, 10)];
        let s = signals(&[
            (5, ReIdSignal::new().with_face("alice", 50.0)),
            (7, ReIdSignal::new().with_face("alice", 75.0)),
        ]);

        reconciler.reconcile(&mut roster, &s, 1).unwrap();
        assert_eq!(roster[0].faceid(), UNKNOWN_ID);
        assert_eq!(roster[1].faceid(), "alice");
        assert_eq!(reconciler.registry(IdKind::Face).holder("alice"), Some(7));
    }

    #[test]
    fn test_first_detected_wins_full_tie() {
        for order in [[0, 1], [1, 0]] {
            let people = [tracked(3, 9, 4), tracked(8, 2, 4)];
            let mut roster: Vec<Person> = order.iter().map(|&i| people[i].clone()).collect();
            let s = signals(&[
                (9, ReIdSignal::new().with_deep("zed", 50.0)),
                (2, ReIdSignal::new().with_deep("zed", 50.0)),
            ]);

            Reconciler::new().reconcile(&mut roster, &s, 1).unwrap();
            let holder = roster.iter().find(|p| p.deepid() == "zed").map(Person::init_id);
            assert_eq!(holder, Some(3));
        }
    }

    #[test]
    fn test_contested_face_leaves_deep_alone() {
        let mut reconciler = Reconciler::new();
        let mut roster = vec![tracked(1, 5, 20), tracked(2, 7, 5)];
        let s = signals(&[
            (5, ReIdSignal::new().with_face("alice", 50.0).with_deep("p1", 50.0)),
            (7, ReIdSignal::new().with_face("alice", 90.0).with_deep("p2", 90.0)),
        ]);

        reconciler.reconcile(&mut roster, &s, 1).unwrap();
        assert_eq!(roster[1].faceid(), UNKNOWN_ID);
        assert_eq!(roster[1].deepid(), "p2");
        assert_eq!(roster[0].faceid(), "alice");
    }

    #[test]
    fn test_unknown_holders_are_never_contested() {
        let mut reconciler = Reconciler::new();
        let mut roster = vec![tracked(1, 1, 0), tracked(2, 2, 0), tracked(3, 3, 0)];
        let report = reconciler.reconcile(&mut roster, &HashMap::new(), 1).unwrap();
        assert_eq!(report.revoked, 0);
        assert!(roster.iter().all(|p| p.faceid() == UNKNOWN_ID));
    }

    #[test]
    fn test_zero_confidence_label_is_revoked() {
        let mut reconciler = Reconciler::new();
        let mut roster = vec![tracked(1, 1, 0), tracked(2, 2, 0)];
        roster[0].update_ids(1, "ghost", UNKNOWN_ID, 0.0, 0.0);
        roster[1].update_ids(2, "ghost", UNKNOWN_ID, 30.0, 0.0);

        reconciler.reconcile(&mut roster, &HashMap::new(), 1).unwrap();
        assert_eq!(roster[0].faceid(), UNKNOWN_ID);
        assert_eq!(roster[1].faceid(), "ghost");
    }

    #[test]
    fn test_registry_forgets_departed_tracks() {
        let mut reconciler = Reconciler::new();
        let mut roster = vec![tracked(1, 5, 0)];
        let s = signals(&[(5, ReIdSignal::new().with_deep("bob", 60.0))]);
        reconciler.reconcile(&mut roster, &s, 1).unwrap();
        assert_eq!(reconciler.registry(IdKind::Deep).holder("bob"), Some(5));

        let mut next = vec![tracked(2, 6, 0)];
        reconciler.reconcile(&mut next, &HashMap::new(), 1).unwrap();
        assert_eq!(reconciler.registry(IdKind::Deep).holder("bob"), None);
    }

    #[test]
    fn test_relabel_releases_old_label() {
        let mut reconciler = Reconciler::new();
        let mut roster = vec![tracked(1, 5, 0)];
        reconciler
            .reconcile(&mut roster, &signals(&[(5, ReIdSignal::new().with_deep("bob", 40.0))]), 1)
            .unwrap();
        reconciler
            .reconcile(&mut roster, &signals(&[(5, ReIdSignal::new().with_deep("carl", 80.0))]), 1)
            .unwrap();

        let registry = reconciler.registry(IdKind::Deep);
        assert_eq!(registry.holder("bob"), None);
        assert_eq!(registry.holder("carl"), Some(5));
    }

    #[test]
    fn test_duplicate_cid_is_rejected_untouched() {
        let mut reconciler = Reconciler::new();
        let mut roster = vec![tracked(1, 5, 0), tracked(2, 5, 0)];
        let s = signals(&[(5, ReIdSignal::new().with_face("alice", 50.0))]);

        let err = reconciler.reconcile(&mut roster, &s, 1).unwrap_err();
        assert!(matches!(err, Error::DuplicateCid { cid: 5 }));
        assert!(roster.iter().all(|p| p.ontracked() == 0 && p.faceid() == UNKNOWN_ID));
    }

    #[test]
    fn test_untracked_person_is_rejected() {
        let mut roster = vec![Person::new(4, Rect::default(), 0.5, 0.5)];
        let err = Reconciler::new().reconcile(&mut roster, &HashMap::new(), 1).unwrap_err();
        assert!(matches!(err, Error::UntrackedPerson { init_id: 4 }));
    }

    #[test]
    fn test_reset_clears_registries() {
        let mut reconciler = Reconciler::new();
        let mut roster = vec![tracked(1, 5, 0)];
        let s = signals(&[(5, ReIdSignal::new().with_face("alice", 50.0))]);
        reconciler.reconcile(&mut roster, &s, 1).unwrap();
        reconciler.reset();
        assert!(reconciler.registry(IdKind::Face).is_empty());
    }
}
