use serde::{Deserialize, Serialize};

/// Borrowed view of one grayscale frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u16], // row-major, len = w*h
}

/// Owned grayscale frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u16>,
}

impl Frame {
    /// Zero-filled frame of the given size.
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}

impl<'a> FrameView<'a> {
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Intensity at (x, y). Out-of-bounds reads return 0.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> u16 {
        if !self.contains(x, y) {
            return 0;
        }
        self.data[y as usize * self.width + x as usize]
    }
}

/// Errors building a frame stack.
#[derive(thiserror::Error, Debug)]
pub enum StackError {
    #[error("stack has no frames")]
    Empty,
    #[error("frame {index} is {got_width}x{got_height}, expected {width}x{height}")]
    MixedDimensions {
        index: usize,
        width: usize,
        height: usize,
        got_width: usize,
        got_height: usize,
    },
}

/// An in-memory, already-decoded image stack with uniform frame dimensions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FrameStack {
    width: usize,
    height: usize,
    frames: Vec<Frame>,
}

impl FrameStack {
    /// Build a stack from decoded frames, checking that dimensions agree.
    pub fn new(frames: Vec<Frame>) -> Result<Self, StackError> {
        let first = frames.first().ok_or(StackError::Empty)?;
        let (width, height) = (first.width, first.height);
        for (index, f) in frames.iter().enumerate() {
            if f.width != width || f.height != height {
                return Err(StackError::MixedDimensions {
                    index,
                    width,
                    height,
                    got_width: f.width,
                    got_height: f.height,
                });
            }
        }
        Ok(Self {
            width,
            height,
            frames,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame(&self, index: usize) -> FrameView<'_> {
        self.frames[index].view()
    }

    pub fn iter(&self) -> impl Iterator<Item = FrameView<'_>> {
        self.frames.iter().map(Frame::view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_reads_are_zero() {
        let mut f = Frame::zeros(3, 2);
        f.data[1 * 3 + 2] = 7;
        let v = f.view();
        assert_eq!(v.get(2, 1), 7);
        assert_eq!(v.get(-1, 0), 0);
        assert_eq!(v.get(3, 0), 0);
        assert_eq!(v.get(0, 2), 0);
    }

    #[test]
    fn stack_rejects_mixed_dimensions() {
        let frames = vec![Frame::zeros(4, 4), Frame::zeros(4, 5)];
        assert!(matches!(
            FrameStack::new(frames),
            Err(StackError::MixedDimensions { index: 1, .. })
        ));
    }

    #[test]
    fn stack_rejects_empty() {
        assert!(matches!(FrameStack::new(vec![]), Err(StackError::Empty)));
    }
}
