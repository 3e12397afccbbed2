//! Mapping of selected targets from source-image pixels into output-pattern
//! pixels through a [`CalibrationRecord`].

use nalgebra::Point2;

use crate::record::CalibrationRecord;

/// Errors produced by target mapping.
#[derive(thiserror::Error, Debug)]
pub enum MapError {
    #[error("no targets supplied")]
    EmptyTargetSet,
    #[error("current source image height must be positive")]
    NonPositiveHeight,
}

/// Map targets into output-pattern pixel coordinates.
///
/// The calibration was fitted against an image of `cal_image_size` pixels;
/// when the current source image has a different height the coordinates are
/// first rescaled by `cal_image_size / current_source_height`. That ratio is
/// carried as a float and rounding happens only at the final coordinate,
/// using round-half-away-from-zero (`f64::round`).
///
/// Mapped points may land outside `[0, output_pattern_size)`; that is not an
/// error here — the mask renderer skips off-canvas points.
pub fn map_targets(
    targets: &[Point2<i32>],
    record: &CalibrationRecord,
    current_source_height: u32,
) -> Result<Vec<Point2<i32>>, MapError> {
    if targets.is_empty() {
        return Err(MapError::EmptyTargetSet);
    }
    if current_source_height == 0 {
        return Err(MapError::NonPositiveHeight);
    }

    let s_offset = record.cal_image_size as f64 / current_source_height as f64;
    log::debug!(
        "mapping {} targets, scale offset {s_offset}",
        targets.len()
    );

    let mapped = targets
        .iter()
        .map(|p| {
            let x = record.scale_x * s_offset * p.x as f64 + record.offset_x;
            let y = record.scale_y * s_offset * p.y as f64 + record.offset_y;
            Point2::new(x.round() as i32, y.round() as i32)
        })
        .collect();
    Ok(mapped)
}
