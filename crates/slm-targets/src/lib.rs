//! High-level facade for the `slm-targets-*` workspace.
//!
//! This crate re-exports the numeric core and provides (feature-gated)
//! helpers bridging image files to the core's frame and mask types.
//!
//! ## Quickstart
//!
//! ```no_run
//! use nalgebra::Point2;
//! use slm_targets::{pipeline, ExtractionParams, TraceBuilder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let stack = pipeline::load_stack(&["frame0.png".into(), "frame1.png".into()])?;
//! let params = ExtractionParams::new(2, 25, true)?;
//! let targets = vec![Point2::new(120, 84)];
//! let matrix = TraceBuilder::new(params).build(&stack, &targets)?;
//! println!("trace: {:?}", matrix.row(0));
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `slm_targets::core`: calibration, mapping, sampling and trace types.
//! - `slm_targets::pipeline` (feature `image`): load stacks from grayscale
//!   frame files, save rendered masks.

pub use slm_targets_core as core;

pub use slm_targets_core::{
    calibrate, map_targets, render_mask, Axis, CalibrationError, CalibrationRecord,
    CorrespondencePair, ExtractionParams, Frame, FrameStack, FrameView, MapError, Mask, ParamError,
    RecordError, SignalMatrix, StackError, TraceBuilder, TraceError, TARGET_VALUE,
};

#[cfg(feature = "image")]
pub mod pipeline;
