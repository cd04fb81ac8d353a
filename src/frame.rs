//! Per-frame evaluation.
//!
//! The inference framework owns a frame's detections (its ROI). For each frame
//! the filter classifies detections into kept and removed, the caller asks the
//! ROI to drop the removed ones, and a few counters are reported.
//!
//! Nothing here stores a detection beyond the call that received it.

use crate::error::{FrameAccessError, RemovalError};
use crate::policy::FilterPolicy;

/// Throttled diagnostics are emitted on frames 1, 61, 121, ...
pub const REPORT_INTERVAL: u64 = 60;

/// Number of kept detections shown in a diagnostic line.
const KEPT_PREVIEW: usize = 3;

/// Read access to one detection, whatever the inference framework's type is.
pub trait ScoredLabel {
    fn label(&self) -> &str;
    fn confidence(&self) -> f64;
}

/// A frame's detection storage, as maintained by the inference framework.
pub trait Roi {
    type Detection: ScoredLabel + Clone;

    fn detections(&self) -> &[Self::Detection];

    /// Drop a detection from the frame's persisted/overlay representation.
    fn remove(&mut self, detection: &Self::Detection) -> Result<(), RemovalError>;
}

/// Plain owned detection.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f64,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

impl ScoredLabel for Detection {
    fn label(&self) -> &str {
        &self.label
    }

    fn confidence(&self) -> f64 {
        self.confidence
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub total: usize,
    pub kept: usize,
    pub filtered: usize,
}

impl FrameStats {
    /// Share of detections filtered out, 0 for an empty frame.
    pub fn filtered_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.filtered as f64 / self.total as f64 * 100.0
        }
    }
}

/// Outcome of evaluating one frame. Borrowed from the caller's detections.
#[derive(Debug)]
pub struct FrameEvaluation<'a, D> {
    pub kept: Vec<&'a D>,
    pub removed: Vec<&'a D>,
    pub stats: FrameStats,
}

/// Partition detections into kept and removed, preserving relative order.
pub fn evaluate_frame<'a, D: ScoredLabel>(
    policy: &FilterPolicy,
    detections: &'a [D],
) -> FrameEvaluation<'a, D> {
    if passes_unchecked(policy, detections) {
        return FrameEvaluation {
            kept: detections.iter().collect(),
            removed: Vec::new(),
            stats: FrameStats {
                total: detections.len(),
                kept: detections.len(),
                filtered: 0,
            },
        };
    }

    let (kept, removed): (Vec<&D>, Vec<&D>) = detections
        .iter()
        .partition(|d| policy.should_keep(d.label(), d.confidence()));
    let stats = FrameStats {
        total: detections.len(),
        kept: kept.len(),
        filtered: removed.len(),
    };
    FrameEvaluation {
        kept,
        removed,
        stats,
    }
}

/// True when per-detection checks cannot change the outcome: there is no
/// label gate and every confidence clears the threshold (NaN clears it).
fn passes_unchecked<D: ScoredLabel>(policy: &FilterPolicy, detections: &[D]) -> bool {
    policy.is_pass_through()
        && detections
            .iter()
            .all(|d| policy.accepts_confidence(d.confidence()))
}

/// Ask the ROI to drop each detection. Failures are logged and do not stop the
/// remaining removals. Returns the number of failed removals.
pub fn apply_removals<R: Roi>(roi: &mut R, removed: &[R::Detection]) -> usize {
    let mut failures = 0;
    for detection in removed {
        if let Err(e) = roi.remove(detection) {
            log::warn!("roi filtering error: {}", e);
            failures += 1;
        }
    }
    failures
}

/// State carried across callback invocations: only the frame counter used to
/// throttle diagnostics.
#[derive(Debug, Default)]
pub struct FrameContext {
    frame_count: u64,
}

impl FrameContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self) -> u64 {
        self.frame_count += 1;
        self.frame_count
    }

    pub fn count(&self) -> u64 {
        self.frame_count
    }

    pub fn is_report_frame(&self) -> bool {
        self.frame_count % REPORT_INTERVAL == 1
    }

    /// Handle one callback invocation.
    ///
    /// Frames without a buffer are counted and skipped. Otherwise the ROI is
    /// filtered in place and the frame's stats are returned.
    pub fn process<R: Roi>(
        &mut self,
        policy: &FilterPolicy,
        frame: Option<&mut R>,
    ) -> Result<FrameStats, FrameAccessError> {
        let count = self.increment();
        let roi = frame.ok_or(FrameAccessError { frame: count })?;
        let report = self.is_report_frame();

        if passes_unchecked(policy, roi.detections()) {
            let total = roi.detections().len();
            if report {
                log::info!("frame {}: {} detections (no filtering)", count, total);
            }
            return Ok(FrameStats {
                total,
                kept: total,
                filtered: 0,
            });
        }

        let (stats, removed, preview) = {
            let evaluation = evaluate_frame(policy, roi.detections());
            let removed: Vec<R::Detection> = evaluation.removed.into_iter().cloned().collect();
            let preview: Vec<String> = evaluation
                .kept
                .iter()
                .take(KEPT_PREVIEW)
                .map(|d| format!("{}({:.2})", d.label(), d.confidence()))
                .collect();
            (evaluation.stats, removed, preview)
        };

        if !removed.is_empty() {
            apply_removals(roi, &removed);
            if report {
                log::info!(
                    "frame {}: kept {}/{} ({:.1}% filtered)",
                    count,
                    stats.kept,
                    stats.total,
                    stats.filtered_percent()
                );
            }
        }

        if report && !preview.is_empty() {
            log::info!("currently showing: [{}]", preview.join(", "));
        }

        Ok(stats)
    }
}
