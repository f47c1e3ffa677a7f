//! Single person track (STrack) for ByteTrack association.

use crate::person::{Person, TrackId};
use crate::tracker::kalman_filter::{KalmanFilter, StateCovariance, StateMean};
use crate::tracker::rect::Rect;

/// Track lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Newly created track, not yet confirmed
    #[default]
    New,
    Tracked,
    /// Temporarily lost, kept for `max_time_lost` frames
    Lost,
    Removed,
}

#[derive(Debug, Clone)]
pub struct STrack {
    pub track_id: TrackId,
    pub state: TrackState,
    /// Whether the track has been confirmed
    pub is_activated: bool,
    /// Last frame the track was matched
    pub frame_id: u32,
    pub start_frame: u32,
    pub tracklet_len: u32,
    kalman: Option<(StateMean, StateCovariance)>,
    /// The person this track follows; boxes come from the latest matched detection.
    person: Person,
}

impl STrack {
    /// Wrap an untracked detection.
    pub fn new(person: Person) -> Self {
        Self {
            track_id: 0,
            state: TrackState::New,
            is_activated: false,
            frame_id: 0,
            start_frame: 0,
            tracklet_len: 0,
            kalman: None,
            person,
        }
    }

    pub fn score(&self) -> f32 {
        self.person.det_conf()
    }

    /// Predicted box while a Kalman state exists, detection box otherwise.
    pub fn rect(&self) -> Rect {
        match &self.kalman {
            Some((mean, _)) => Rect::from_xyah(
                mean[0] as f32,
                mean[1] as f32,
                mean[2] as f32,
                mean[3] as f32,
            ),
            None => self.person.bbox(),
        }
    }

    pub fn end_frame(&self) -> u32 {
        self.frame_id
    }

    /// Frames between the first and the latest match.
    pub fn age(&self) -> u32 {
        self.frame_id - self.start_frame
    }

    pub fn person(&self) -> &Person {
        &self.person
    }

    pub fn person_mut(&mut self) -> &mut Person {
        &mut self.person
    }

    pub fn activate(&mut self, kalman_filter: &KalmanFilter, frame_id: u32, track_id: TrackId) {
        self.track_id = track_id;
        self.person.assign_cid(track_id);
        self.kalman = Some(kalman_filter.initiate(self.person.bbox().to_xyah()));
        self.tracklet_len = 0;
        self.state = TrackState::Tracked;
        // Only first-frame tracks skip the confirmation frame.
        self.is_activated = frame_id == 1;
        self.frame_id = frame_id;
        self.start_frame = frame_id;
    }

    pub fn re_activate(&mut self, detection: &STrack, kalman_filter: &KalmanFilter, frame_id: u32) {
        self.correct(detection, kalman_filter);
        self.tracklet_len = 0;
        self.state = TrackState::Tracked;
        self.is_activated = true;
        self.frame_id = frame_id;
    }

    pub fn update(&mut self, detection: &STrack, kalman_filter: &KalmanFilter, frame_id: u32) {
        self.correct(detection, kalman_filter);
        self.frame_id = frame_id;
        self.tracklet_len += 1;
        self.state = TrackState::Tracked;
        self.is_activated = true;
    }

    fn correct(&mut self, detection: &STrack, kalman_filter: &KalmanFilter) {
        if let Some((mean, cov)) = &self.kalman {
            self.kalman = Some(kalman_filter.update(mean, cov, detection.person.bbox().to_xyah()));
        }
        self.person.absorb_detection(&detection.person);
    }

    pub fn predict(&mut self, kalman_filter: &KalmanFilter) {
        if let Some((mean, cov)) = &self.kalman {
            let mut mean = *mean;
            if self.state != TrackState::Tracked {
                mean[7] = 0.0;
            }
            self.kalman = Some(kalman_filter.predict(&mean, cov));
        }
    }

    pub fn mark_lost(&mut self) {
        self.state = TrackState::Lost;
    }

    pub fn mark_removed(&mut self) {
        self.state = TrackState::Removed;
    }

    pub fn multi_predict(stracks: &mut [STrack], kalman_filter: &KalmanFilter) {
        for strack in stracks.iter_mut() {
            strack.predict(kalman_filter);
        }
    }
}
