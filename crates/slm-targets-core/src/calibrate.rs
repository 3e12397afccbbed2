//! Two-point affine calibration between the pattern-generation (calibration)
//! space and the camera space.
//!
//! The fit is a per-axis `cal = scale * cam + offset` solved exactly from two
//! correspondence points; X and Y are independent, which tolerates different
//! magnification per axis but assumes no rotation between the spaces.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::record::CalibrationRecord;

/// Axis label used in error reporting.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
        }
    }
}

/// Errors produced by the affine calibration fit.
#[derive(thiserror::Error, Debug)]
pub enum CalibrationError {
    /// The two camera points share a coordinate on this axis, so the
    /// per-axis scale denominator is zero.
    #[error("degenerate calibration: camera points share the {axis} coordinate")]
    DegenerateAxis { axis: Axis },
    #[error("camera image width must be positive (got {width})")]
    NonPositiveImageWidth { width: f64 },
}

/// Two points in each space, pairing fixed at construction: `calibration[i]`
/// corresponds to `camera[i]`.
///
/// The pairing order is the caller's responsibility; nothing in the point
/// content can reveal a swapped pair (see DESIGN.md).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorrespondencePair {
    pub calibration: [Point2<f64>; 2],
    pub camera: [Point2<f64>; 2],
}

impl CorrespondencePair {
    pub fn new(calibration: [Point2<f64>; 2], camera: [Point2<f64>; 2]) -> Self {
        Self {
            calibration,
            camera,
        }
    }
}

fn fit_axis(cal: [f64; 2], cam: [f64; 2], axis: Axis) -> Result<(f64, f64), CalibrationError> {
    let denom = cam[0] - cam[1];
    if denom == 0.0 {
        return Err(CalibrationError::DegenerateAxis { axis });
    }
    let scale = (cal[0] - cal[1]) / denom;
    let offset = cal[0] - cam[0] * scale;
    Ok((scale, offset))
}

/// Fit the per-axis scale/offset transform from two correspondence points.
///
/// `camera_image_width` is recorded as the calibration image size so that
/// later mapping sessions can correct for a different acquisition size.
/// `output_pattern_size` is the side length of the square SLM pattern the
/// mapped targets will address. Pure function, no side effects.
pub fn calibrate(
    pair: &CorrespondencePair,
    camera_image_width: f64,
    output_pattern_size: u32,
    flip_vertical: bool,
    flip_horizontal: bool,
) -> Result<CalibrationRecord, CalibrationError> {
    if !(camera_image_width > 0.0) {
        return Err(CalibrationError::NonPositiveImageWidth {
            width: camera_image_width,
        });
    }

    let (scale_x, offset_x) = fit_axis(
        [pair.calibration[0].x, pair.calibration[1].x],
        [pair.camera[0].x, pair.camera[1].x],
        Axis::X,
    )?;
    let (scale_y, offset_y) = fit_axis(
        [pair.calibration[0].y, pair.calibration[1].y],
        [pair.camera[0].y, pair.camera[1].y],
        Axis::Y,
    )?;

    log::debug!(
        "calibration fit: scale=({scale_x:.6}, {scale_y:.6}) offset=({offset_x:.6}, {offset_y:.6})"
    );

    Ok(CalibrationRecord {
        scale_x,
        scale_y,
        offset_x,
        offset_y,
        cal_image_size: camera_image_width as u32,
        output_pattern_size,
        flip_vertical,
        flip_horizontal,
    })
}
