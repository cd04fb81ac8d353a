//! Replay frame source.
//!
//! Drives the filter from recorded inference output instead of a live
//! pipeline. The recording is JSON Lines, one frame per line:
//!
//! ```text
//! [{"label": "face", "confidence": 0.91}, {"label": "person", "confidence": 0.4}]
//! []
//! null
//! ```
//!
//! `null` is a frame the framework delivered without a buffer. Blank lines
//! are ignored.

use anyhow::{anyhow, Context, Result};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::RemovalError;
use crate::frame::{Detection, FrameContext, FrameStats, Roi};
use crate::policy::FilterPolicy;

/// One recorded frame's detection storage.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordedFrame {
    detections: Vec<Detection>,
}

impl RecordedFrame {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    pub fn into_detections(self) -> Vec<Detection> {
        self.detections
    }
}

impl Roi for RecordedFrame {
    type Detection = Detection;

    fn detections(&self) -> &[Detection] {
        &self.detections
    }

    fn remove(&mut self, detection: &Detection) -> Result<(), RemovalError> {
        let pos = self
            .detections
            .iter()
            .position(|d| d == detection)
            .ok_or_else(|| RemovalError {
                label: detection.label.clone(),
                reason: "not present in frame".to_string(),
            })?;
        self.detections.remove(pos);
        Ok(())
    }
}

pub struct ReplaySource<R> {
    reader: R,
    line_no: usize,
}

impl ReplaySource<Box<dyn BufRead>> {
    /// Open a recording; `-` reads standard input.
    pub fn open(path: &Path) -> Result<Self> {
        let reader: Box<dyn BufRead> = if path == Path::new("-") {
            Box::new(BufReader::new(std::io::stdin()))
        } else {
            let file = std::fs::File::open(path)
                .with_context(|| format!("open detections file {}", path.display()))?;
            Box::new(BufReader::new(file))
        };
        Ok(Self::new(reader))
    }
}

impl<R: BufRead> ReplaySource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, line_no: 0 }
    }
}

impl<R: BufRead> Iterator for ReplaySource<R> {
    /// `Ok(None)` is a frame without a buffer.
    type Item = Result<Option<RecordedFrame>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();
        loop {
            line.clear();
            self.line_no += 1;
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) if line.trim().is_empty() => continue,
                Ok(_) => break,
                Err(e) => return Some(Err(anyhow!("read line {}: {}", self.line_no, e))),
            }
        }
        let parsed = serde_json::from_str::<Option<Vec<Detection>>>(line.trim())
            .map(|frame| frame.map(RecordedFrame::new))
            .map_err(|e| anyhow!("invalid frame on line {}: {}", self.line_no, e));
        Some(parsed)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub skipped: u64,
    pub total: usize,
    pub kept: usize,
    pub filtered: usize,
}

impl RunSummary {
    fn record(&mut self, stats: &FrameStats) {
        self.total += stats.total;
        self.kept += stats.kept;
        self.filtered += stats.filtered;
    }
}

/// Feed every recorded frame through the filter until the source ends or
/// `stop` is set.
pub fn run_replay<R: BufRead>(
    policy: &FilterPolicy,
    mut source: ReplaySource<R>,
    stop: &AtomicBool,
) -> Result<RunSummary> {
    let mut ctx = FrameContext::new();
    let mut summary = RunSummary::default();

    loop {
        if stop.load(Ordering::SeqCst) {
            log::info!("replay interrupted after {} frames", summary.frames);
            break;
        }
        let Some(frame) = source.next() else {
            break;
        };
        let mut frame = frame?;
        summary.frames += 1;
        match ctx.process(policy, frame.as_mut()) {
            Ok(stats) => summary.record(&stats),
            Err(e) => {
                log::debug!("skipping: {}", e);
                summary.skipped += 1;
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn source(text: &str) -> ReplaySource<Cursor<Vec<u8>>> {
        ReplaySource::new(Cursor::new(text.as_bytes().to_vec()))
    }

    #[test]
    fn parses_frames_and_missing_buffers() {
        let frames: Vec<_> = source(
            "[{\"label\":\"face\",\"confidence\":0.9}]\n\nnull\n[]\n",
        )
        .collect::<Result<_>>()
        .expect("frames");
        assert_eq!(
            frames,
            vec![
                Some(RecordedFrame::new(vec![Detection::new("face", 0.9)])),
                None,
                Some(RecordedFrame::default()),
            ]
        );
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let mut src = source("[]\n{oops}\n");
        assert!(src.next().unwrap().is_ok());
        let err = src.next().unwrap().expect_err("bad line");
        assert!(err.to_string().contains("line 2"), "{err}");
    }

    #[test]
    fn removing_absent_detection_fails() {
        let mut frame = RecordedFrame::new(vec![Detection::new("car", 0.3)]);
        let err = frame
            .remove(&Detection::new("dog", 0.3))
            .expect_err("absent");
        assert_eq!(err.label, "dog");
        assert_eq!(frame.detections().len(), 1);
    }

    #[test]
    fn replay_summarizes_run() {
        let policy = FilterPolicy::build(Some(["face"]), Some(0.8)).unwrap();
        let text = concat!(
            "[{\"label\":\"face\",\"confidence\":0.9},{\"label\":\"face\",\"confidence\":0.5},",
            "{\"label\":\"person\",\"confidence\":0.95}]\n",
            "null\n",
            "[{\"label\":\"Faces\",\"confidence\":0.85}]\n",
        );
        let summary = run_replay(&policy, source(text), &AtomicBool::new(false)).unwrap();
        assert_eq!(
            summary,
            RunSummary {
                frames: 3,
                skipped: 1,
                total: 4,
                kept: 2,
                filtered: 2,
            }
        );
    }

    #[test]
    fn stop_flag_ends_replay() {
        let summary = run_replay(
            &FilterPolicy::accept_all(),
            source("[]\n[]\n"),
            &AtomicBool::new(true),
        )
        .unwrap();
        assert_eq!(summary.frames, 0);
    }

    #[test]
    fn stop_flag_is_checked_before_reading_next_frame() {
        let mut src = source("[]\n{oops}\n");
        assert!(src.next().unwrap().is_ok());
        let summary = run_replay(&FilterPolicy::accept_all(), src, &AtomicBool::new(true))
            .expect("interrupted before the malformed line");
        assert_eq!(summary, RunSummary::default());
    }
}
