//! Detection backend replaying labelled boxes instead of running a model.

use std::convert::Infallible;

use super::{DetectionSource, PersonBuilder};
use crate::eval::GroundTruth;
use crate::person::Person;

/// Emits the ground-truth boxes of consecutive frames, starting at frame 0.
/// Pixels are ignored; every replayed person has detection confidence 1 and
/// the builder's default repspoint calibration, which `PeoplePipeline`
/// replaces with the session's.
pub struct GroundTruthDetector {
    ground_truth: GroundTruth,
    next_frame: u64,
}

impl GroundTruthDetector {
    pub fn new(ground_truth: GroundTruth) -> Self {
        Self {
            ground_truth,
            next_frame: 0,
        }
    }

    /// Frame the next `detect` call will replay.
    pub fn next_frame(&self) -> u64 {
        self.next_frame
    }

    pub fn rewind(&mut self) {
        self.next_frame = 0;
    }
}

impl DetectionSource for GroundTruthDetector {
    type Error = Infallible;

    fn detect(
        &mut self,
        _input: &[u8],
        _width: u32,
        _height: u32,
    ) -> Result<Vec<Person>, Self::Error> {
        let persons = self
            .ground_truth
            .frame(self.next_frame)
            .iter()
            .map(|entry| {
                PersonBuilder::new()
                    .bbox(entry.bbox)
                    .det_conf(1.0)
                    .build()
            })
            .collect();
        self.next_frame += 1;
        Ok(persons)
    }
}
