//! deforum-core library
//!
//! Turns sampled camera poses into Deforum keyframe schedules:
//! [`delta`] extracts local-space frame-to-frame deltas from a [`scene::Scene`],
//! [`keyframe`] compresses each axis series into `index:(value)` strings and
//! [`output`] assembles the export text.

pub mod delta;
pub mod error;
pub mod keyframe;
pub mod output;
pub mod recorded;
pub mod scene;

pub use delta::{Axis, CameraDeltas, DEFAULT_TRANSLATION_SCALE, extract_deltas};
pub use error::ExportError;
pub use keyframe::{
    Keyframe, decode_keyframes, encode_keyframes, encode_raw_frames, keyframe_string,
    raw_frames_string, schedule_mismatch,
};
pub use output::{
    ExportPayload, OutputFormat, OutputOptions, export_cameras, export_document, render_cameras,
};
pub use recorded::{RecordedObject, RecordedPose, RecordedScene};
pub use scene::{FrameCursor, FrameRange, Scene};
