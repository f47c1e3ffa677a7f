//! Per-frame result log for offline scoring.

use std::io::Write;

use serde::Serialize;

use super::Evaluator;
use crate::error::Result;
use crate::person::{Person, TrackId};
use crate::tracker::Rect;

#[derive(Debug, Clone, PartialEq)]
pub struct EvalRecord {
    pub frame_id: u64,
    pub cid: TrackId,
    pub faceid: String,
    pub deepid: String,
    pub bbox: Rect,
}

/// Collects every tracked person of every frame.
#[derive(Debug, Clone, Default)]
pub struct EvalRecorder {
    records: Vec<EvalRecord>,
}

impl EvalRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[EvalRecord] {
        &self.records
    }

    /// Write one CSV row `frame_id,cid,faceid,deepid,x1,y1,x2,y2` per record,
    /// without a header. Labels are quoted where needed.
    pub fn dump<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        for r in &self.records {
            let [x1, y1, x2, y2] = r.bbox.to_xyxy();
            writer.serialize(Row {
                frame_id: r.frame_id,
                cid: r.cid,
                faceid: &r.faceid,
                deepid: &r.deepid,
                x1,
                y1,
                x2,
                y2,
            })?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct Row<'a> {
    frame_id: u64,
    cid: TrackId,
    faceid: &'a str,
    deepid: &'a str,
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

impl Evaluator for EvalRecorder {
    fn evaluate(&mut self, frame_id: u64, roster: &[Person]) {
        self.records.extend(roster.iter().filter_map(|p| {
            p.cid().map(|cid| EvalRecord {
                frame_id,
                cid,
                faceid: p.faceid().to_string(),
                deepid: p.deepid().to_string(),
                bbox: p.bbox(),
            })
        }));
    }
}
