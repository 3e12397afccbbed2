//! Per-target, per-frame signal extraction across an image stack.
//!
//! Every cell of the signal matrix is the top-k window sum for one target in
//! one frame; each row is the fluorescence trace of one target, with the row
//! index doubling as the stable target identifier used for labeling.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::frame::FrameStack;
use crate::sampler::{sample_window, select_window_values, ExtractionParams};

/// Errors building or normalizing the signal matrix.
#[derive(thiserror::Error, Debug)]
pub enum TraceError {
    #[error("no targets supplied")]
    EmptyTargetSet,
    #[error("extraction cancelled after {frames_done} frames")]
    Cancelled { frames_done: usize },
    #[error("target {target} has a constant trace, nothing to normalize")]
    FlatTrace { target: usize },
}

/// Row-major `targets x frames` grid of window sums.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignalMatrix {
    targets: usize,
    frames: usize,
    data: Vec<f64>,
}

impl SignalMatrix {
    fn zeros(targets: usize, frames: usize) -> Self {
        Self {
            targets,
            frames,
            data: vec![0.0; targets * frames],
        }
    }

    pub fn targets(&self) -> usize {
        self.targets
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    #[inline]
    pub fn value(&self, target: usize, frame: usize) -> f64 {
        self.data[target * self.frames + frame]
    }

    /// One target's trace across all frames.
    pub fn row(&self, target: usize) -> &[f64] {
        &self.data[target * self.frames..(target + 1) * self.frames]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.frames)
    }

    #[inline]
    fn set(&mut self, target: usize, frame: usize, v: f64) {
        self.data[target * self.frames + frame] = v;
    }

    /// Normalize each row in place into a shared plotting range: row `i`
    /// maps onto `[i * plot_scale, (i + 1) * plot_scale]` via
    /// `(v - min) / (max - min) * plot_scale + i * plot_scale`.
    ///
    /// A constant row has no range to normalize into and fails with
    /// [`TraceError::FlatTrace`] instead of propagating NaN. All rows are
    /// scanned before any is rewritten, so on error the matrix is left
    /// untouched.
    pub fn normalize_for_plot(&mut self, plot_scale: f64) -> Result<(), TraceError> {
        let mut extrema = Vec::with_capacity(self.targets);
        for target in 0..self.targets {
            let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);
            for &v in self.row(target) {
                min = min.min(v);
                max = max.max(v);
            }
            if max == min {
                return Err(TraceError::FlatTrace { target });
            }
            extrema.push((min, max));
        }

        for (target, (min, max)) in extrema.into_iter().enumerate() {
            let span = max - min;
            let base = target as f64 * plot_scale;
            for frame in 0..self.frames {
                let v = self.value(target, frame);
                self.set(target, frame, (v - min) / span * plot_scale + base);
            }
        }
        Ok(())
    }
}

/// Drives the window sampler across every (target, frame) pair of a stack.
#[derive(Clone, Copy, Debug)]
pub struct TraceBuilder {
    params: ExtractionParams,
}

impl TraceBuilder {
    pub fn new(params: ExtractionParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ExtractionParams {
        &self.params
    }

    /// Build the full `targets x frames` matrix.
    pub fn build(
        &self,
        stack: &FrameStack,
        targets: &[Point2<i32>],
    ) -> Result<SignalMatrix, TraceError> {
        self.build_until(stack, targets, || true)
    }

    /// Build the matrix with cooperative cancellation: `keep_going` is
    /// consulted once per frame boundary, never inside a single sample.
    pub fn build_until(
        &self,
        stack: &FrameStack,
        targets: &[Point2<i32>],
        mut keep_going: impl FnMut() -> bool,
    ) -> Result<SignalMatrix, TraceError> {
        if targets.is_empty() {
            return Err(TraceError::EmptyTargetSet);
        }

        log::info!(
            "extracting {} targets x {} frames (radius {}, k {})",
            targets.len(),
            stack.len(),
            self.params.radius(),
            self.params.k()
        );

        let mut matrix = SignalMatrix::zeros(targets.len(), stack.len());
        let mut scratch = Vec::with_capacity(self.params.window_len());
        for (f, frame) in stack.iter().enumerate() {
            if !keep_going() {
                return Err(TraceError::Cancelled { frames_done: f });
            }
            for (i, &target) in targets.iter().enumerate() {
                let sum = sample_window(&frame, target, &self.params, &mut scratch);
                matrix.set(i, f, sum);
            }
        }
        Ok(matrix)
    }

    /// Build the matrix and additionally keep, per frame, the k selected
    /// intensities of every target (a `targets x k` grid per frame, shorter
    /// rows zero-padded at clipped edges).
    pub fn build_with_values(
        &self,
        stack: &FrameStack,
        targets: &[Point2<i32>],
    ) -> Result<(SignalMatrix, Vec<Vec<Vec<u16>>>), TraceError> {
        if targets.is_empty() {
            return Err(TraceError::EmptyTargetSet);
        }

        let k = self.params.k();
        let mut matrix = SignalMatrix::zeros(targets.len(), stack.len());
        let mut kept = Vec::with_capacity(stack.len());
        let mut scratch = Vec::with_capacity(self.params.window_len());
        for (f, frame) in stack.iter().enumerate() {
            let mut per_target = Vec::with_capacity(targets.len());
            for (i, &target) in targets.iter().enumerate() {
                let taken = select_window_values(&frame, target, &self.params, &mut scratch);
                matrix.set(i, f, scratch[..taken].iter().map(|&v| v as f64).sum());
                let mut values = scratch[..taken].to_vec();
                values.resize(k, 0);
                per_target.push(values);
            }
            kept.push(per_target);
        }
        Ok((matrix, kept))
    }
}
