//! File-backed helpers around the numeric core.
//!
//! These only decode image files into in-memory grids and encode rendered
//! masks back out; all numerics stay in `slm-targets-core`.

use std::path::{Path, PathBuf};

use crate::core;

/// Errors produced by the file-backed helpers.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Stack(#[from] core::StackError),
    #[error("mask of size {size} does not fit an image buffer")]
    MaskTooLarge { size: usize },
}

/// Decode one grayscale frame. Any supported format works; pixels are
/// widened to 16-bit intensities.
pub fn load_frame(path: impl AsRef<Path>) -> Result<core::Frame, PipelineError> {
    let img = image::open(path)?.to_luma16();
    Ok(core::Frame {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.into_raw(),
    })
}

/// Decode an ordered list of frame files into a stack.
///
/// Frame order follows the argument order; dimension mismatches surface as
/// [`core::StackError::MixedDimensions`].
pub fn load_stack(paths: &[PathBuf]) -> Result<core::FrameStack, PipelineError> {
    let mut frames = Vec::with_capacity(paths.len());
    for path in paths {
        log::debug!("loading frame {}", path.display());
        frames.push(load_frame(path)?);
    }
    Ok(core::FrameStack::new(frames)?)
}

/// View a `image::GrayImage` as a core frame (u8 intensities widened).
pub fn frame_from_gray(img: &image::GrayImage) -> core::Frame {
    core::Frame {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw().iter().map(|&v| v as u16).collect(),
    }
}

/// Convert a rendered mask into an 8-bit grayscale image.
pub fn mask_to_image(mask: &core::Mask) -> Result<image::GrayImage, PipelineError> {
    let size = u32::try_from(mask.size()).map_err(|_| PipelineError::MaskTooLarge {
        size: mask.size(),
    })?;
    image::GrayImage::from_raw(size, size, mask.data().to_vec())
        .ok_or(PipelineError::MaskTooLarge { size: mask.size() })
}

/// Encode the mask to disk; the format follows the file extension.
pub fn save_mask(mask: &core::Mask, path: impl AsRef<Path>) -> Result<(), PipelineError> {
    mask_to_image(mask)?.save(path)?;
    Ok(())
}
