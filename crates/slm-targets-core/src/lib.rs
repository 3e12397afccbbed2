//! Core numerics for SLM targeting.
//!
//! Maps user-selected points between a projector/calibration space and a
//! camera/sample space, renders mapped targets into an output pattern mask,
//! and extracts per-target fluorescence traces from an image stack by
//! summing the top-k intensities of a window around each target.
//!
//! This crate is intentionally small and purely numeric. It does *not*
//! depend on a concrete image container or any UI; frames arrive as
//! already-decoded in-memory grids and results leave as plain data.

mod calibrate;
mod frame;
mod logger;
mod mapper;
mod mask;
mod record;
mod sampler;
mod trace;

pub use calibrate::{calibrate, Axis, CalibrationError, CorrespondencePair};
pub use frame::{Frame, FrameStack, FrameView, StackError};
pub use mapper::{map_targets, MapError};
pub use mask::{render_mask, Mask, TARGET_VALUE};
pub use record::{CalibrationRecord, RecordError, HEADER_LINES};
pub use sampler::{sample_window, select_window_values, ExtractionParams, ParamError};
pub use trace::{SignalMatrix, TraceBuilder, TraceError};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
