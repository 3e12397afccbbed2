//! The persisted calibration record and its flat-text format.
//!
//! The on-disk layout is line-oriented and order-significant: five free-form
//! header lines (always written, always skipped on read), then the four
//! affine coefficients, the two sizes and the two flip flags, one value per
//! line. Sizes are written as floats and truncated to integers by the
//! reader, matching the historical format.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Number of header/comment lines preceding the payload.
pub const HEADER_LINES: usize = 5;

const SEPARATOR: &str = "-------------------------------------------------------------";

/// Immutable calibration produced once by [`crate::calibrate`] and consumed
/// read-only by the target mapper for the duration of a mapping session.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    pub scale_x: f64,
    pub scale_y: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    /// Width of the camera image the calibration was fitted against.
    pub cal_image_size: u32,
    /// Side length of the square output pattern.
    pub output_pattern_size: u32,
    pub flip_vertical: bool,
    pub flip_horizontal: bool,
}

/// Errors reading or writing the flat record.
#[derive(thiserror::Error, Debug)]
pub enum RecordError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("malformed calibration record at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

fn malformed(line: usize, reason: impl Into<String>) -> RecordError {
    RecordError::Malformed {
        line: line + 1,
        reason: reason.into(),
    }
}

impl CalibrationRecord {
    /// Render the record in the flat-text format. `title` becomes the first
    /// header line (callers usually stamp a date into it).
    pub fn to_flat_text(&self, title: &str) -> String {
        let mut out = String::new();
        out.push_str(title);
        out.push('\n');
        out.push_str(SEPARATOR);
        out.push('\n');
        out.push_str("1. xScale, 2. yScale, 3. xOffset, 4. yOffset\n");
        out.push_str("5. calSize, 6. outputSize, 7. flipVertical, 8. flipHorizontal\n");
        out.push_str(SEPARATOR);
        out.push('\n');
        for v in [
            self.scale_x,
            self.scale_y,
            self.offset_x,
            self.offset_y,
            self.cal_image_size as f64,
            self.output_pattern_size as f64,
        ] {
            out.push_str(&format!("{v}\n"));
        }
        out.push_str(&format!("{}\n{}\n", self.flip_vertical, self.flip_horizontal));
        out
    }

    /// Parse the flat-text format, skipping the five header lines.
    pub fn from_flat_text(text: &str) -> Result<Self, RecordError> {
        let lines: Vec<&str> = text.lines().collect();

        let float = |idx: usize| -> Result<f64, RecordError> {
            let raw = lines
                .get(idx)
                .ok_or_else(|| malformed(idx, "missing line"))?;
            raw.trim()
                .parse::<f64>()
                .map_err(|_| malformed(idx, format!("expected a number, got {raw:?}")))
        };
        let flag = |idx: usize| -> Result<bool, RecordError> {
            let raw = lines
                .get(idx)
                .ok_or_else(|| malformed(idx, "missing line"))?;
            match raw.trim() {
                "true" => Ok(true),
                "false" => Ok(false),
                other => Err(malformed(idx, format!("expected true/false, got {other:?}"))),
            }
        };

        Ok(Self {
            scale_x: float(HEADER_LINES)?,
            scale_y: float(HEADER_LINES + 1)?,
            offset_x: float(HEADER_LINES + 2)?,
            offset_y: float(HEADER_LINES + 3)?,
            cal_image_size: float(HEADER_LINES + 4)? as u32,
            output_pattern_size: float(HEADER_LINES + 5)? as u32,
            flip_vertical: flag(HEADER_LINES + 6)?,
            flip_horizontal: flag(HEADER_LINES + 7)?,
        })
    }

    /// Write the record to disk in the flat-text format.
    pub fn write_flat(&self, path: impl AsRef<Path>, title: &str) -> Result<(), RecordError> {
        fs::write(path, self.to_flat_text(title))?;
        Ok(())
    }

    /// Read a record from disk.
    ///
    /// A missing file surfaces as [`RecordError::Io`]; whether that is fatal
    /// or falls back to caller-supplied defaults is the caller's decision.
    pub fn read_flat(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let raw = fs::read_to_string(path)?;
        Self::from_flat_text(&raw)
    }
}
