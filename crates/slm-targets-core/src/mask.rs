//! Rendering mapped targets into a square pattern mask.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Square 8-bit canvas addressed by the SLM. Target pixels are rendered at
/// the maximum value (255) on a zero background, so the pattern generator
/// only has to threshold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mask {
    size: usize,
    data: Vec<u8>,
}

pub const TARGET_VALUE: u8 = u8::MAX;

impl Mask {
    /// Blank (all-background) mask of `size x size` pixels.
    pub fn blank(size: usize) -> Self {
        Self {
            size,
            data: vec![0; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.size + x]
    }

    /// Set a single target pixel. Off-canvas points are silently skipped;
    /// a mapped target outside the pattern is valid, just not addressable.
    pub fn set_target(&mut self, p: Point2<i32>) {
        if p.x < 0 || p.y < 0 {
            return;
        }
        let (x, y) = (p.x as usize, p.y as usize);
        if x >= self.size || y >= self.size {
            return;
        }
        self.data[y * self.size + x] = TARGET_VALUE;
    }

    /// Mirror the canvas top-to-bottom.
    pub fn flip_vertical(&mut self) {
        let n = self.size;
        for y in 0..n / 2 {
            for x in 0..n {
                self.data.swap(y * n + x, (n - 1 - y) * n + x);
            }
        }
    }

    /// Mirror the canvas left-to-right.
    pub fn flip_horizontal(&mut self) {
        let n = self.size;
        for row in self.data.chunks_exact_mut(n) {
            row.reverse();
        }
    }

    /// Apply the stored flip flags, vertical then horizontal. The flips
    /// commute, but both must apply independently from the two flags.
    pub fn apply_flips(&mut self, flip_vertical: bool, flip_horizontal: bool) {
        if flip_vertical {
            self.flip_vertical();
        }
        if flip_horizontal {
            self.flip_horizontal();
        }
    }
}

/// Render mapped points onto a blank canvas and apply the flips.
pub fn render_mask(
    points: &[Point2<i32>],
    size: usize,
    flip_vertical: bool,
    flip_horizontal: bool,
) -> Mask {
    let mut mask = Mask::blank(size);
    let mut on_canvas = 0usize;
    for &p in points {
        if (0..size as i32).contains(&p.x) && (0..size as i32).contains(&p.y) {
            on_canvas += 1;
        }
        mask.set_target(p);
    }
    if on_canvas < points.len() {
        log::warn!(
            "{} of {} mapped targets fall outside the {size}x{size} pattern",
            points.len() - on_canvas,
            points.len()
        );
    }
    mask.apply_flips(flip_vertical, flip_horizontal);
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_targets_on_zero_background() {
        let mask = render_mask(&[Point2::new(1, 2)], 4, false, false);
        assert_eq!(mask.get(1, 2), TARGET_VALUE);
        let lit = mask.data().iter().filter(|&&v| v != 0).count();
        assert_eq!(lit, 1);
    }

    #[test]
    fn off_canvas_points_are_skipped() {
        let pts = [
            Point2::new(-1, 0),
            Point2::new(0, -3),
            Point2::new(4, 0),
            Point2::new(0, 4),
            Point2::new(3, 3),
        ];
        let mask = render_mask(&pts, 4, false, false);
        let lit = mask.data().iter().filter(|&&v| v != 0).count();
        assert_eq!(lit, 1);
        assert_eq!(mask.get(3, 3), TARGET_VALUE);
    }

    #[test]
    fn vertical_flip_mirrors_rows() {
        let mask = render_mask(&[Point2::new(0, 0)], 3, true, false);
        assert_eq!(mask.get(0, 2), TARGET_VALUE);
        assert_eq!(mask.get(0, 0), 0);
    }

    #[test]
    fn horizontal_flip_mirrors_columns() {
        let mask = render_mask(&[Point2::new(0, 0)], 3, false, true);
        assert_eq!(mask.get(2, 0), TARGET_VALUE);
    }

    #[test]
    fn both_flips_apply_independently() {
        let mask = render_mask(&[Point2::new(0, 1)], 3, true, true);
        assert_eq!(mask.get(2, 1), TARGET_VALUE);
    }
}
