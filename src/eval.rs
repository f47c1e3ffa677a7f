//! Scoring resolved identities against ground truth, online and offline.

mod ground_truth;
mod online;
mod recorder;

pub use ground_truth::{GroundTruth, GroundTruthEntry};
pub use online::{EvalSummary, OnlineEvaluator};
pub use recorder::{EvalRecord, EvalRecorder};

use crate::person::Person;

/// Consumer of the reconciled roster, once per frame.
pub trait Evaluator {
    fn evaluate(&mut self, frame_id: u64, roster: &[Person]);
}

/// No evaluation.
impl Evaluator for () {
    fn evaluate(&mut self, _frame_id: u64, _roster: &[Person]) {}
}

/// Feed two evaluators the same frames.
impl<A: Evaluator, B: Evaluator> Evaluator for (A, B) {
    fn evaluate(&mut self, frame_id: u64, roster: &[Person]) {
        self.0.evaluate(frame_id, roster);
        self.1.evaluate(frame_id, roster);
    }
}
