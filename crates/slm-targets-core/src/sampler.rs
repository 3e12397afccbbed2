//! Windowed intensity sampling around a target.
//!
//! For a target center and radius `r` the sampler collects the in-bounds
//! pixels of the `(2r+1) x (2r+1)` window and sums the `k` selected values.
//! With `sort_before_selecting` set the selection is the k largest
//! intensities; cleared, it is a cheaper degraded mode taking the first k
//! in-bounds cells in enumeration order (column-major, matching the
//! historical scan order).

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::frame::FrameView;

/// Errors validating sampling parameters.
#[derive(thiserror::Error, Debug)]
pub enum ParamError {
    #[error("neighborhood radius must be at least 1 (got {radius})")]
    InvalidRadius { radius: i32 },
    #[error("k must be at least 1 (got {k})")]
    InvalidK { k: usize },
}

/// Validated, immutable sampling configuration.
///
/// `k` larger than the full window is clamped silently at construction;
/// non-positive `radius` or `k` is a configuration error.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtractionParams {
    radius: i32,
    k: usize,
    pub sort_before_selecting: bool,
}

impl ExtractionParams {
    pub fn new(radius: i32, k: usize, sort_before_selecting: bool) -> Result<Self, ParamError> {
        if radius < 1 {
            return Err(ParamError::InvalidRadius { radius });
        }
        if k == 0 {
            return Err(ParamError::InvalidK { k });
        }
        let window = window_len(radius);
        if k > window {
            log::debug!("clamping k from {k} to the window size {window}");
        }
        Ok(Self {
            radius,
            k: k.min(window),
            sort_before_selecting,
        })
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of cells in the full (unclipped) window.
    pub fn window_len(&self) -> usize {
        window_len(self.radius)
    }
}

// In usize: the squared side overflows i32 already at radius 46341.
fn window_len(radius: i32) -> usize {
    let side = 2 * radius as usize + 1;
    side * side
}

/// Collect the selected window intensities into `scratch` (cleared on
/// entry), leaving the chosen k values at the front, and return their count.
///
/// The scratch buffer is caller-owned so that per-(target, frame) loops can
/// reuse one allocation; this function owns clearing it.
pub fn select_window_values(
    frame: &FrameView<'_>,
    center: Point2<i32>,
    params: &ExtractionParams,
    scratch: &mut Vec<u16>,
) -> usize {
    scratch.clear();
    let r = params.radius;
    for x in (center.x - r)..=(center.x + r) {
        for y in (center.y - r)..=(center.y + r) {
            if frame.contains(x, y) {
                scratch.push(frame.get(x, y));
            }
        }
    }
    if params.sort_before_selecting {
        scratch.sort_unstable_by(|a, b| b.cmp(a));
    }
    // Edge targets get a smaller effective sample, never an error.
    params.k.min(scratch.len())
}

/// Sum of the k selected intensities in the window around `center`.
pub fn sample_window(
    frame: &FrameView<'_>,
    center: Point2<i32>,
    params: &ExtractionParams,
    scratch: &mut Vec<u16>,
) -> f64 {
    let taken = select_window_values(frame, center, params, scratch);
    scratch[..taken].iter().map(|&v| v as f64).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    fn ramp_frame(width: usize, height: usize) -> Frame {
        let mut f = Frame::zeros(width, height);
        for (i, v) in f.data.iter_mut().enumerate() {
            *v = i as u16;
        }
        f
    }

    #[test]
    fn full_window_sum_is_selection_order_invariant() {
        let f = ramp_frame(5, 5);
        let mut scratch = Vec::new();
        let center = Point2::new(2, 2);
        for sort in [true, false] {
            let params = ExtractionParams::new(1, 9, sort).expect("params");
            let sum = sample_window(&f.view(), center, &params, &mut scratch);
            // 3x3 window centered at (2,2) of the 5x5 ramp.
            let expected: f64 = [6, 7, 8, 11, 12, 13, 16, 17, 18]
                .iter()
                .map(|&v| v as f64)
                .sum();
            assert_eq!(sum, expected);
        }
    }

    #[test]
    fn corner_window_clips_to_in_bounds_cells() {
        let f = ramp_frame(4, 4);
        let params = ExtractionParams::new(1, 4, true).expect("params");
        let mut scratch = Vec::new();
        let sum = sample_window(&f.view(), Point2::new(0, 0), &params, &mut scratch);
        // Only the 2x2 region {0, 1, 4, 5} is in bounds.
        assert_eq!(sum, 10.0);
    }

    #[test]
    fn top_k_picks_the_largest_values() {
        let mut f = Frame::zeros(5, 5);
        f.data[2 * 5 + 2] = 100;
        f.data[2 * 5 + 3] = 90;
        f.data[3 * 5 + 2] = 80;
        let params = ExtractionParams::new(1, 2, true).expect("params");
        let mut scratch = Vec::new();
        let sum = sample_window(&f.view(), Point2::new(2, 2), &params, &mut scratch);
        assert_eq!(sum, 190.0);
    }

    #[test]
    fn unsorted_mode_takes_enumeration_order() {
        let mut f = Frame::zeros(5, 5);
        // Column-major enumeration starting at (1,1): first cell is (1,1).
        f.data[1 * 5 + 1] = 3;
        f.data[2 * 5 + 2] = 100;
        let params = ExtractionParams::new(1, 1, false).expect("params");
        let mut scratch = Vec::new();
        let sum = sample_window(&f.view(), Point2::new(2, 2), &params, &mut scratch);
        assert_eq!(sum, 3.0);
    }

    #[test]
    fn k_is_clamped_to_window_size() {
        let params = ExtractionParams::new(1, 1000, true).expect("params");
        assert_eq!(params.k(), 9);
    }

    #[test]
    fn huge_radius_does_not_overflow() {
        let params = ExtractionParams::new(46_341, 9, true).expect("params");
        assert_eq!(params.window_len(), 92_683 * 92_683);
        assert_eq!(params.k(), 9);
    }

    #[test]
    fn invalid_radius_and_k_are_rejected() {
        assert!(matches!(
            ExtractionParams::new(0, 5, true),
            Err(ParamError::InvalidRadius { radius: 0 })
        ));
        assert!(matches!(
            ExtractionParams::new(-2, 5, true),
            Err(ParamError::InvalidRadius { .. })
        ));
        assert!(matches!(
            ExtractionParams::new(2, 0, true),
            Err(ParamError::InvalidK { k: 0 })
        ));
    }

    #[test]
    fn scratch_is_cleared_between_calls() {
        let f = ramp_frame(4, 4);
        let params = ExtractionParams::new(1, 4, true).expect("params");
        let mut scratch = vec![9999; 64];
        let sum = sample_window(&f.view(), Point2::new(0, 0), &params, &mut scratch);
        assert_eq!(sum, 10.0);
    }
}
