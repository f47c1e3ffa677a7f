//! PeoplePipeline: detect, associate, re-identify, reconcile, evaluate.

use std::collections::HashMap;

use tracing::debug;

use super::{DetectionSource, ReIdSource, TrackAssociator};
use crate::config::{SessionConfig, TrackerKind};
use crate::error::{Error, Result};
use crate::eval::Evaluator;
use crate::person::{Person, TrackId};
use crate::reid::{ReconcileReport, Reconciler, ReIdSignal};
use crate::tracker::{ByteTracker, CentroidTracker};

/// One tracking session.
///
/// Each call to [`PeoplePipeline::process_frame`] fully processes one frame
/// before returning: detection, cid association, re-identification (every
/// `reid.interval` frames), two-pass identity reconciliation, and evaluation.
pub struct PeoplePipeline<D, R, E = ()> {
    config: SessionConfig,
    detector: D,
    associator: Box<dyn TrackAssociator>,
    reider: R,
    reconciler: Reconciler,
    evaluator: E,
    roster: Vec<Person>,
    frame_id: u64,
    last_report: ReconcileReport,
}

impl<D, R> PeoplePipeline<D, R>
where
    D: DetectionSource,
    R: ReIdSource,
{
    /// Start a session with the associator named in `config`.
    pub fn new(config: SessionConfig, detector: D, reider: R) -> Result<Self> {
        let associator: Box<dyn TrackAssociator> = match &config.tracker {
            TrackerKind::Byte(c) => Box::new(ByteTracker::new(c.clone())),
            TrackerKind::Centroid(c) => Box::new(CentroidTracker::new(c.clone())),
        };
        Self::with_associator(config, detector, associator, reider)
    }

    /// Start a session with a caller-supplied associator backend.
    pub fn with_associator(
        config: SessionConfig,
        detector: D,
        associator: Box<dyn TrackAssociator>,
        reider: R,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            detector,
            associator,
            reider,
            reconciler: Reconciler::new(),
            evaluator: (),
            roster: Vec::new(),
            frame_id: 0,
            last_report: ReconcileReport::default(),
        })
    }
}

impl<D, R, E> PeoplePipeline<D, R, E>
where
    D: DetectionSource,
    D::Error: std::error::Error + Send + Sync + 'static,
    R: ReIdSource,
    R::Error: std::error::Error + Send + Sync + 'static,
    E: Evaluator,
{
    /// Replace the evaluator fed after every frame.
    pub fn with_evaluator<E2: Evaluator>(self, evaluator: E2) -> PeoplePipeline<D, R, E2> {
        PeoplePipeline {
            config: self.config,
            detector: self.detector,
            associator: self.associator,
            reider: self.reider,
            reconciler: self.reconciler,
            evaluator,
            roster: self.roster,
            frame_id: self.frame_id,
            last_report: self.last_report,
        }
    }

    /// Process a single frame and return the reconciled roster.
    ///
    /// Once the detector has returned, the frame counts as consumed: if a
    /// later step fails, `frame_id` has still advanced in step with the
    /// detector, and `roster()` keeps the last successful frame.
    ///
    /// # Arguments
    /// * `input` - Raw image bytes
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    pub fn process_frame(&mut self, input: &[u8], width: u32, height: u32) -> Result<&[Person]> {
        let conf_threshold = self.config.detector.conf_threshold;
        let calibration = self.config.detector.repspoint_calibration;
        let detections: Vec<Person> = self
            .detector
            .detect(input, width, height)
            .map_err(Error::backend)?
            .into_iter()
            .filter(|p| p.det_conf() >= conf_threshold)
            .map(|mut p| {
                p.recalibrate(calibration);
                p
            })
            .collect();

        let frame_id = self.frame_id;
        self.frame_id += 1;

        let mut roster = self.associator.update(detections);

        let signals = if frame_id % u64::from(self.config.reid.interval) == 0 {
            self.identify(input, width, height, &roster)?
        } else {
            HashMap::new()
        };

        self.last_report = self.reconciler.reconcile(&mut roster, &signals, 1)?;
        self.associator.commit(&roster);
        self.evaluator.evaluate(frame_id, &roster);

        debug!(
            frame_id,
            persons = roster.len(),
            accepted = self.last_report.accepted,
            revoked = self.last_report.revoked,
            "frame processed"
        );

        self.roster = roster;
        Ok(&self.roster)
    }

    fn identify(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
        roster: &[Person],
    ) -> Result<HashMap<TrackId, ReIdSignal>> {
        let min_confidence = self.config.reid.min_confidence;
        let mut signals = HashMap::new();
        for person in roster {
            let Some(cid) = person.cid() else {
                continue;
            };
            let signal = self
                .reider
                .infer(input, width, height, person)
                .map_err(Error::backend)?;
            if let Some(signal) = signal.and_then(|s| s.above(min_confidence)) {
                signals.insert(cid, signal);
            }
        }
        Ok(signals)
    }

    /// Drop all tracks and identities and restart frame numbering.
    pub fn reset(&mut self) {
        self.associator.reset();
        self.reconciler.reset();
        self.roster.clear();
        self.frame_id = 0;
        self.last_report = ReconcileReport::default();
    }

    /// Roster of the last processed frame.
    pub fn roster(&self) -> &[Person] {
        &self.roster
    }

    /// Id the next processed frame will get.
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    pub fn last_report(&self) -> ReconcileReport {
        self.last_report
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    pub fn reider_mut(&mut self) -> &mut R {
        &mut self.reider
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn evaluator_mut(&mut self) -> &mut E {
        &mut self.evaluator
    }

    pub fn into_evaluator(self) -> E {
        self.evaluator
    }
}
