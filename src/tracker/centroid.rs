//! Nearest-centroid association on representative points.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::integration::TrackAssociator;
use crate::person::{Person, TrackId};
use crate::tracker::matching;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CentroidConfig {
    /// Largest repspoint jump, in pixels, still treated as the same person.
    pub max_distance: f32,
    /// Frames a person may go unmatched before the track is dropped.
    pub max_disappeared: u32,
}

impl Default for CentroidConfig {
    fn default() -> Self {
        Self {
            max_distance: 50.0,
            max_disappeared: 30,
        }
    }
}

#[derive(Debug, Clone)]
struct CentroidTrack {
    person: Person,
    disappeared: u32,
}

pub struct CentroidTracker {
    config: CentroidConfig,
    tracks: Vec<CentroidTrack>,
    last_track_id: TrackId,
}

impl CentroidTracker {
    pub fn new(config: CentroidConfig) -> Self {
        Self {
            config,
            tracks: Vec::new(),
            last_track_id: 0,
        }
    }

    /// Match detections to tracks and return the persons seen this frame.
    pub fn update(&mut self, detections: Vec<Person>) -> Vec<Person> {
        let track_points: Vec<(i32, i32)> =
            self.tracks.iter().map(|t| t.person.repspoint()).collect();
        let det_points: Vec<(i32, i32)> = detections.iter().map(Person::repspoint).collect();

        let dists = matching::point_distance(&track_points, &det_points);
        let assignment = matching::linear_assignment(&dists, self.config.max_distance);

        for &(itrack, idet) in &assignment.matches {
            let track = &mut self.tracks[itrack];
            track.person.absorb_detection(&detections[idet]);
            track.disappeared = 0;
        }

        for &itrack in &assignment.unmatched_tracks {
            self.tracks[itrack].disappeared += 1;
        }

        let max_disappeared = self.config.max_disappeared;
        self.tracks.retain(|t| {
            let keep = t.disappeared <= max_disappeared;
            if !keep {
                trace!(cid = ?t.person.cid(), "centroid track dropped");
            }
            keep
        });

        let mut detections: Vec<Option<Person>> = detections.into_iter().map(Some).collect();
        for idet in assignment.unmatched_detections {
            if let Some(mut person) = detections[idet].take() {
                self.last_track_id += 1;
                person.assign_cid(self.last_track_id);
                trace!(cid = self.last_track_id, "centroid track started");
                self.tracks.push(CentroidTrack {
                    person,
                    disappeared: 0,
                });
            }
        }

        self.tracks
            .iter()
            .filter(|t| t.disappeared == 0)
            .map(|t| t.person.clone())
            .collect()
    }
}

impl TrackAssociator for CentroidTracker {
    fn update(&mut self, detections: Vec<Person>) -> Vec<Person> {
        CentroidTracker::update(self, detections)
    }

    fn commit(&mut self, roster: &[Person]) {
        for track in &mut self.tracks {
            if let Some(person) = roster.iter().find(|p| p.cid() == track.person.cid()) {
                track.person.inherit_identity(person);
            }
        }
    }

    fn reset(&mut self) {
        self.tracks.clear();
        self.last_track_id = 0;
    }
}
