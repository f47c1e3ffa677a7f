use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};
use crate::tracker::Rect;

/// One labelled person in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundTruthEntry {
    pub label: String,
    pub bbox: Rect,
}

/// Labelled boxes per frame.
///
/// CSV without a header, one person per row: `frame_id,label,x1,y1,x2,y2`.
/// Fields are trimmed, labels may be quoted, blank lines and lines starting
/// with `#` are skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundTruth {
    frames: BTreeMap<u64, Vec<GroundTruthEntry>>,
}

impl GroundTruth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Result<Self> {
        Self::from_reader(text.as_bytes())
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut ground_truth = Self::new();
        for record in reader.records() {
            let record = record?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            let line = record.position().map_or(0, |pos| pos.line() as usize);
            let (frame_id, entry) =
                parse_record(&record).map_err(|reason| Error::GroundTruthParse { line, reason })?;
            ground_truth.push(frame_id, entry);
        }
        Ok(ground_truth)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ground_truth = Self::from_reader(File::open(path)?)?;
        info!(
            path = %path.display(),
            frames = ground_truth.num_frames(),
            persons = ground_truth.len(),
            "ground truth loaded"
        );
        Ok(ground_truth)
    }

    pub fn push(&mut self, frame_id: u64, entry: GroundTruthEntry) {
        self.frames.entry(frame_id).or_default().push(entry);
    }

    /// Entries of `frame_id`, empty when the frame has none.
    pub fn frame(&self, frame_id: u64) -> &[GroundTruthEntry] {
        self.frames
            .get(&frame_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Total labelled persons over all frames.
    pub fn len(&self) -> usize {
        self.frames.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

fn parse_record(record: &csv::StringRecord) -> Result<(u64, GroundTruthEntry), String> {
    let fields: Vec<&str> = record.iter().collect();
    let [frame_id, label, x1, y1, x2, y2] = fields[..] else {
        return Err(format!("expected 6 fields, found {}", fields.len()));
    };

    let frame_id = frame_id
        .parse::<u64>()
        .map_err(|e| format!("bad frame id {frame_id:?}: {e}"))?;
    if label.is_empty() {
        return Err("empty label".to_string());
    }
    let coord = |s: &str| s.parse::<f32>().map_err(|e| format!("bad coordinate {s:?}: {e}"));

    Ok((
        frame_id,
        GroundTruthEntry {
            label: label.to_string(),
            bbox: Rect::from_xyxy(coord(x1)?, coord(y1)?, coord(x2)?, coord(y2)?),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_groups_by_frame() {
        let gt = GroundTruth::parse(
            "# frame,label,x1,y1,x2,y2\n\
             0, alice, 10, 20, 50, 120\n\
             \n\
             0,bob,200,20,240,120\n\
             3,alice,12,20,52,120\n",
        )
        .unwrap();

        assert_eq!(gt.num_frames(), 2);
        assert_eq!(gt.len(), 3);
        assert_eq!(gt.frame(0)[1].label, "bob");
        assert_eq!(gt.frame(3)[0].bbox, Rect::from_xyxy(12.0, 20.0, 52.0, 120.0));
        assert!(gt.frame(1).is_empty());
    }

    #[test]
    fn test_parse_reports_line_number() {
        let err = GroundTruth::parse("0,alice,1,2,3,4\n0,bob,1,2,three,4\n").unwrap_err();
        assert!(matches!(err, Error::GroundTruthParse { line: 2, .. }));

        let err = GroundTruth::parse("0,alice,1,2,3\n").unwrap_err();
        assert!(matches!(err, Error::GroundTruthParse { line: 1, .. }));
    }

    #[test]
    fn test_quoted_label_keeps_its_comma() {
        let gt = GroundTruth::parse("4,\"Doe, John\",10,20,50,120\n").unwrap();
        assert_eq!(gt.frame(4)[0].label, "Doe, John");
        assert_eq!(gt.frame(4)[0].bbox, Rect::from_xyxy(10.0, 20.0, 50.0, 120.0));
    }
}
