//! Detection filter
//!
//! Post-inference filtering of object detections by label and confidence.
//!
//! An external inference pipeline calls into the filter once per frame with
//! that frame's detections. The filter decides which detections survive,
//! reports which ones the pipeline should drop from its ROI, and keeps a
//! per-frame tally for diagnostics.
//!
//! # Module Structure
//!
//! - `labels`: label synonym normalization
//! - `policy`: `FilterPolicy` and the keep/drop decision
//! - `frame`: per-frame evaluation, ROI removal, throttled diagnostics
//! - `config`: CLI/config-file merge into effective settings
//! - `replay`: recorded-detection frame source for driving the filter
//! - `error`: typed error taxonomy

pub mod config;
pub mod error;
pub mod frame;
pub mod labels;
pub mod policy;
pub mod replay;

pub use config::{CameraSettings, CliSettings, EffectiveSettings, FileConfig};
pub use error::{ConfigError, FrameAccessError, PolicyError, RemovalError};
pub use frame::{
    apply_removals, evaluate_frame, Detection, FrameContext, FrameEvaluation, FrameStats, Roi,
    ScoredLabel,
};
pub use labels::normalize;
pub use policy::FilterPolicy;
pub use replay::{run_replay, RecordedFrame, ReplaySource, RunSummary};
