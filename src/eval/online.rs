//! Realtime accuracy of resolved identities, frame by frame.

use tracing::info;

use super::Evaluator;
use super::ground_truth::GroundTruth;
use crate::person::Person;
use crate::tracker::{Rect, iou_distance, linear_assignment};

/// Running totals of an online evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EvalSummary {
    pub frames: usize,
    /// Labelled persons seen over all evaluated frames.
    pub gt_persons: usize,
    /// Labelled persons matched to a roster entry by IoU.
    pub matched: usize,
    pub faceid_correct: usize,
    pub deepid_correct: usize,
}

impl EvalSummary {
    pub fn detection_recall(&self) -> f64 {
        ratio(self.matched, self.gt_persons)
    }

    pub fn faceid_accuracy(&self) -> f64 {
        ratio(self.faceid_correct, self.gt_persons)
    }

    pub fn deepid_accuracy(&self) -> f64 {
        ratio(self.deepid_correct, self.gt_persons)
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Matches each frame's roster to labelled boxes and counts correct ids.
pub struct OnlineEvaluator {
    ground_truth: GroundTruth,
    iou_threshold: f32,
    summary: EvalSummary,
}

impl OnlineEvaluator {
    pub fn new(ground_truth: GroundTruth) -> Self {
        Self {
            ground_truth,
            iou_threshold: 0.5,
            summary: EvalSummary::default(),
        }
    }

    /// Minimum IoU for a roster box to count as a labelled person.
    pub fn with_iou_threshold(mut self, iou_threshold: f32) -> Self {
        self.iou_threshold = iou_threshold;
        self
    }

    pub fn summary(&self) -> EvalSummary {
        self.summary
    }

    pub fn log_summary(&self) {
        let s = &self.summary;
        info!(
            frames = s.frames,
            gt_persons = s.gt_persons,
            recall = s.detection_recall(),
            faceid_accuracy = s.faceid_accuracy(),
            deepid_accuracy = s.deepid_accuracy(),
            "online evaluation"
        );
    }
}

impl Evaluator for OnlineEvaluator {
    fn evaluate(&mut self, frame_id: u64, roster: &[Person]) {
        let truth = self.ground_truth.frame(frame_id);
        self.summary.frames += 1;
        self.summary.gt_persons += truth.len();

        let person_boxes: Vec<Rect> = roster.iter().map(Person::bbox).collect();
        let truth_boxes: Vec<Rect> = truth.iter().map(|e| e.bbox).collect();
        let cost = iou_distance(&person_boxes, &truth_boxes);
        let assignment = linear_assignment(&cost, 1.0 - self.iou_threshold);

        for (ip, it) in assignment.matches {
            let (person, label) = (&roster[ip], truth[it].label.as_str());
            self.summary.matched += 1;
            if person.faceid() == label {
                self.summary.faceid_correct += 1;
            }
            if person.deepid() == label {
                self.summary.deepid_correct += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labelled(frame_id: u64, label: &str, x1: f32) -> String {
        format!("{frame_id},{label},{x1},0,{},100\n", x1 + 40.0)
    }

    fn person(cid: u64, x1: f32, faceid: &str, deepid: &str) -> Person {
        let mut p = Person::new(cid, Rect::from_xyxy(x1, 0.0, x1 + 40.0, 100.0), 0.9, 0.25);
        p.update_ids(cid, faceid, deepid, 50.0, 50.0);
        p
    }

    #[test]
    fn test_counts_correct_ids() {
        let text = labelled(0, "alice", 0.0) + &labelled(0, "bob", 200.0);
        let mut eval = OnlineEvaluator::new(GroundTruth::parse(&text).unwrap());

        let roster = [
            person(1, 2.0, "alice", "alice"),
            person(2, 198.0, "Unknown", "alice"),
        ];
        eval.evaluate(0, &roster);

        let s = eval.summary();
        assert_eq!(s.frames, 1);
        assert_eq!(s.gt_persons, 2);
        assert_eq!(s.matched, 2);
        assert_eq!(s.faceid_correct, 1);
        assert_eq!(s.deepid_correct, 1);
        assert!((s.faceid_accuracy() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_far_boxes_do_not_match() {
        let mut eval = OnlineEvaluator::new(GroundTruth::parse(&labelled(0, "alice", 0.0)).unwrap());
        eval.evaluate(0, &[person(1, 500.0, "alice", "alice")]);
        let s = eval.summary();
        assert_eq!(s.matched, 0);
        assert_eq!(s.faceid_correct, 0);
        assert_eq!(s.detection_recall(), 0.0);
    }

    #[test]
    fn test_unlabelled_frame() {
        let mut eval = OnlineEvaluator::new(GroundTruth::new());
        eval.evaluate(7, &[person(1, 0.0, "alice", "alice")]);
        assert_eq!(eval.summary().gt_persons, 0);
        assert_eq!(eval.summary().deepid_accuracy(), 0.0);
    }
}
