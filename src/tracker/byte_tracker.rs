//! ByteTrack association of person detections to current ids.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::integration::TrackAssociator;
use crate::person::{Person, TrackId};
use crate::tracker::kalman_filter::KalmanFilter;
use crate::tracker::matching::{self, AssignmentResult};
use crate::tracker::rect::{Rect, iou_batch};
use crate::tracker::strack::{STrack, TrackState};

/// Detections at or below this score are discarded outright.
const LOW_SCORE_FLOOR: f32 = 0.1;
const SECOND_MATCH_THRESH: f32 = 0.5;
const UNCONFIRMED_MATCH_THRESH: f32 = 0.7;
/// Extra margin over `track_thresh` a detection needs to start a new track.
const NEW_TRACK_MARGIN: f32 = 0.1;
/// Tracked and lost tracks overlapping more than this are duplicates.
const DUPLICATE_IOU: f32 = 0.85;

/// Configuration for the ByteTracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub track_thresh: f32,
    pub match_thresh: f32,
    pub track_buffer: u32,
    pub frame_rate: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            track_thresh: 0.5,
            match_thresh: 0.8,
            track_buffer: 30,
            frame_rate: 30.0,
        }
    }
}

pub struct ByteTracker {
    tracked_stracks: Vec<STrack>,
    lost_stracks: Vec<STrack>,
    frame_id: u32,
    config: TrackerConfig,
    max_time_lost: u32,
    kalman_filter: KalmanFilter,
    last_track_id: TrackId,
}

impl ByteTracker {
    pub fn new(config: TrackerConfig) -> Self {
        let max_time_lost = (config.frame_rate / 30.0 * config.track_buffer as f32) as u32;
        Self {
            tracked_stracks: Vec::new(),
            lost_stracks: Vec::new(),
            frame_id: 0,
            config,
            max_time_lost,
            kalman_filter: KalmanFilter::default(),
            last_track_id: 0,
        }
    }

    pub fn frame_id(&self) -> u32 {
        self.frame_id
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    fn allocate_track_id(&mut self) -> TrackId {
        self.last_track_id += 1;
        self.last_track_id
    }

    /// Associate one frame of detections and return the confirmed roster.
    pub fn update(&mut self, detections: Vec<Person>) -> Vec<Person> {
        self.frame_id += 1;
        let frame_id = self.frame_id;

        let mut activated_stracks = Vec::new();
        let mut refind_stracks = Vec::new();
        let mut lost_stracks = Vec::new();

        // Step 1: Split detections into high-score and low-score
        let track_thresh = self.config.track_thresh;
        let (detections, detections_low): (Vec<STrack>, Vec<STrack>) = detections
            .into_iter()
            .filter(|p| p.det_conf() > LOW_SCORE_FLOOR)
            .map(STrack::new)
            .partition(|t| t.score() >= track_thresh);

        let (tracked_stracks, unconfirmed): (Vec<STrack>, Vec<STrack>) =
            self.tracked_stracks.drain(..).partition(|t| t.is_activated);

        let mut strack_pool = joint_stracks(tracked_stracks, self.lost_stracks.drain(..));
        STrack::multi_predict(&mut strack_pool, &self.kalman_filter);

        // Step 2: First association, with high score detections
        let mut dists = matching::iou_distance(&rects(&strack_pool), &rects(&detections));
        matching::fuse_score(&mut dists, &scores(&detections));
        let AssignmentResult {
            matches,
            unmatched_tracks,
            unmatched_detections,
        } = matching::linear_assignment(&dists, self.config.match_thresh);

        let mut pool: Vec<Option<STrack>> = strack_pool.into_iter().map(Some).collect();
        for (itracked, idet) in matches {
            if let Some(track) = pool[itracked].take() {
                self.rematch(track, &detections[idet], &mut activated_stracks, &mut refind_stracks);
            }
        }

        // Step 3: Second association, still-tracked leftovers against low score boxes
        let r_tracked: Vec<usize> = unmatched_tracks
            .into_iter()
            .filter(|&i| pool[i].as_ref().is_some_and(|t| t.state == TrackState::Tracked))
            .collect();
        let r_rects: Vec<Rect> = r_tracked
            .iter()
            .filter_map(|&i| pool[i].as_ref().map(STrack::rect))
            .collect();
        let dists_second = matching::iou_distance(&r_rects, &rects(&detections_low));
        let second = matching::linear_assignment(&dists_second, SECOND_MATCH_THRESH);

        for (ir, idet) in second.matches {
            if let Some(track) = pool[r_tracked[ir]].take() {
                self.rematch(track, &detections_low[idet], &mut activated_stracks, &mut refind_stracks);
            }
        }

        // Everything left in the pool is unmatched: tracked ones become lost,
        // already-lost ones wait out their buffer.
        for mut track in pool.into_iter().flatten() {
            if track.state == TrackState::Tracked {
                trace!(track_id = track.track_id, frame_id, "track lost");
                track.mark_lost();
                lost_stracks.push(track);
            } else if frame_id - track.end_frame() > self.max_time_lost {
                trace!(track_id = track.track_id, frame_id, "lost track expired");
                track.mark_removed();
            } else {
                lost_stracks.push(track);
            }
        }

        // Deal with unconfirmed tracks, usually tracks with only one beginning frame
        let detections_rem: Vec<STrack> = unmatched_detections
            .into_iter()
            .map(|i| detections[i].clone())
            .collect();

        let mut dists_unconfirmed =
            matching::iou_distance(&rects(&unconfirmed), &rects(&detections_rem));
        matching::fuse_score(&mut dists_unconfirmed, &scores(&detections_rem));
        let third = matching::linear_assignment(&dists_unconfirmed, UNCONFIRMED_MATCH_THRESH);

        let mut unconfirmed: Vec<Option<STrack>> = unconfirmed.into_iter().map(Some).collect();
        for (itracked, idet) in third.matches {
            if let Some(mut track) = unconfirmed[itracked].take() {
                track.update(&detections_rem[idet], &self.kalman_filter, frame_id);
                activated_stracks.push(track);
            }
        }
        for mut track in unconfirmed.into_iter().flatten() {
            trace!(track_id = track.track_id, frame_id, "unconfirmed track dropped");
            track.mark_removed();
        }

        // Step 4: Init new stracks
        for idx in third.unmatched_detections {
            let mut track = detections_rem[idx].clone();
            if track.score() < track_thresh + NEW_TRACK_MARGIN {
                continue;
            }
            let track_id = self.allocate_track_id();
            track.activate(&self.kalman_filter, frame_id, track_id);
            trace!(track_id, frame_id, "track started");
            activated_stracks.push(track);
        }

        // Step 5: Update state
        let tracked: Vec<STrack> = activated_stracks
            .into_iter()
            .chain(refind_stracks)
            .filter(|t| t.state == TrackState::Tracked)
            .collect();
        let lost = sub_stracks(lost_stracks, &tracked);

        let (tracked, lost) = remove_duplicate_stracks(tracked, lost);
        self.tracked_stracks = tracked;
        self.lost_stracks = lost;

        self.tracked_stracks
            .iter()
            .filter(|t| t.is_activated)
            .map(|t| t.person().clone())
            .collect()
    }

    fn rematch(
        &self,
        mut track: STrack,
        detection: &STrack,
        activated: &mut Vec<STrack>,
        refind: &mut Vec<STrack>,
    ) {
        if track.state == TrackState::Tracked {
            track.update(detection, &self.kalman_filter, self.frame_id);
            activated.push(track);
        } else {
            trace!(track_id = track.track_id, frame_id = self.frame_id, "track refound");
            track.re_activate(detection, &self.kalman_filter, self.frame_id);
            refind.push(track);
        }
    }

    /// Copy reconciled identities and tenure back onto the live tracks.
    pub fn commit(&mut self, roster: &[Person]) {
        let by_cid: HashMap<TrackId, &Person> = roster
            .iter()
            .filter_map(|p| p.cid().map(|cid| (cid, p)))
            .collect();
        for track in &mut self.tracked_stracks {
            if let Some(person) = by_cid.get(&track.track_id) {
                track.person_mut().inherit_identity(person);
            }
        }
    }

    /// Drop every track and restart id allocation.
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }
}

impl TrackAssociator for ByteTracker {
    fn update(&mut self, detections: Vec<Person>) -> Vec<Person> {
        ByteTracker::update(self, detections)
    }

    fn commit(&mut self, roster: &[Person]) {
        ByteTracker::commit(self, roster)
    }

    fn reset(&mut self) {
        ByteTracker::reset(self)
    }
}

fn rects(stracks: &[STrack]) -> Vec<Rect> {
    stracks.iter().map(STrack::rect).collect()
}

fn scores(stracks: &[STrack]) -> Vec<f32> {
    stracks.iter().map(STrack::score).collect()
}

/// Union of two track lists by id, first occurrence wins.
pub fn joint_stracks(
    tlista: Vec<STrack>,
    tlistb: impl IntoIterator<Item = STrack>,
) -> Vec<STrack> {
    let mut exists = HashSet::new();
    tlista
        .into_iter()
        .chain(tlistb)
        .filter(|t| exists.insert(t.track_id))
        .collect()
}

/// Tracks of `tlista` whose id does not appear in `tlistb`.
pub fn sub_stracks(tlista: Vec<STrack>, tlistb: &[STrack]) -> Vec<STrack> {
    let b_ids: HashSet<TrackId> = tlistb.iter().map(|t| t.track_id).collect();
    tlista
        .into_iter()
        .filter(|t| !b_ids.contains(&t.track_id))
        .collect()
}

/// Drop near-identical tracked/lost pairs, keeping the longer-lived track.
pub fn remove_duplicate_stracks(
    stracksa: Vec<STrack>,
    stracksb: Vec<STrack>,
) -> (Vec<STrack>, Vec<STrack>) {
    if stracksa.is_empty() || stracksb.is_empty() {
        return (stracksa, stracksb);
    }

    let ious = iou_batch(&rects(&stracksa), &rects(&stracksb));
    let mut dupa = vec![false; stracksa.len()];
    let mut dupb = vec![false; stracksb.len()];

    for ((i, j), &iou) in ious.indexed_iter() {
        if iou > DUPLICATE_IOU {
            if stracksa[i].age() > stracksb[j].age() {
                dupb[j] = true;
            } else {
                dupa[i] = true;
            }
        }
    }

    let keep = |tracks: Vec<STrack>, dup: &[bool]| -> Vec<STrack> {
        tracks
            .into_iter()
            .zip(dup)
            .filter_map(|(t, &d)| (!d).then_some(t))
            .collect()
    };

    (keep(stracksa, &dupa), keep(stracksb, &dupb))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(x1: f32, y1: f32, score: f32) -> Person {
        Person::new(0, Rect::from_xyxy(x1, y1, x1 + 100.0, y1 + 100.0), score, 0.5)
    }

    #[test]
    fn test_first_frame_tracks_are_confirmed() {
        let mut tracker = ByteTracker::new(TrackerConfig::default());
        let roster = tracker.update(vec![person(0.0, 0.0, 0.9), person(300.0, 0.0, 0.9)]);
        let mut cids: Vec<_> = roster.iter().filter_map(Person::cid).collect();
        cids.sort();
        assert_eq!(cids, vec![1, 2]);
    }

    #[test]
    fn test_weak_detection_does_not_start_track() {
        let mut tracker = ByteTracker::new(TrackerConfig::default());
        assert!(tracker.update(vec![person(0.0, 0.0, 0.55)]).is_empty());
    }

    #[test]
    fn test_later_tracks_need_confirmation() {
        let mut tracker = ByteTracker::new(TrackerConfig::default());
        tracker.update(vec![]);
        assert!(tracker.update(vec![person(0.0, 0.0, 0.9)]).is_empty());
        let roster = tracker.update(vec![person(2.0, 2.0, 0.9)]);
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].cid(), Some(1));
    }

    #[test]
    fn test_commit_carries_identity_to_next_frame() {
        let mut tracker = ByteTracker::new(TrackerConfig::default());
        let mut roster = tracker.update(vec![person(0.0, 0.0, 0.9)]);
        roster[0].update_ids(1, "alice", "bob", 60.0, 70.0);
        roster[0].increment_on_tracked();
        tracker.commit(&roster);

        let roster = tracker.update(vec![person(3.0, 3.0, 0.9)]);
        assert_eq!(roster[0].faceid(), "alice");
        assert_eq!(roster[0].deepid_conf(), 70.0);
        assert_eq!(roster[0].ontracked(), 1);
        assert_eq!(roster[0].box_xyxy()[0], 3.0);
    }

    #[test]
    fn test_reset_restarts_ids() {
        let mut tracker = ByteTracker::new(TrackerConfig::default());
        tracker.update(vec![person(0.0, 0.0, 0.9)]);
        tracker.reset();
        assert_eq!(tracker.frame_id(), 0);
        let roster = tracker.update(vec![person(500.0, 0.0, 0.9)]);
        assert_eq!(roster[0].cid(), Some(1));
    }
}
