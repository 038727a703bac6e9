use crate::error::{LayoutError, OpenCvContext, Result};
use opencv::core::{Mat, Rect, CV_8UC1};
use opencv::prelude::*;
use serde::{Deserialize, Serialize};

/// Projection direction for density profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// One count per row (ink summed across the row)
    Rows,
    /// One count per column (ink summed down the column)
    Columns,
}

/// Half-open index interval `[start, end)` along one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRegion")]
pub struct Region {
    pub start: usize,
    pub end: usize,
}

#[derive(Deserialize)]
struct RawRegion {
    start: usize,
    end: usize,
}

impl TryFrom<RawRegion> for Region {
    type Error = String;

    fn try_from(raw: RawRegion) -> std::result::Result<Self, Self::Error> {
        Region::new(raw.start, raw.end)
            .ok_or_else(|| format!("empty region [{}, {})", raw.start, raw.end))
    }
}

impl Region {
    /// Returns `None` for empty or inverted intervals.
    pub fn new(start: usize, end: usize) -> Option<Self> {
        (end > start).then_some(Self { start, end })
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }
}

/// Single channel 8-bit page mask: 255 = ink, 0 = background.
pub struct BinaryImage {
    mat: Mat,
}

impl BinaryImage {
    pub fn from_mat(mat: Mat) -> Result<Self> {
        if mat.typ() != CV_8UC1 {
            return Err(LayoutError::InvalidImage {
                reason: format!("expected CV_8UC1 mask, got type {}", mat.typ()),
            });
        }
        Ok(Self { mat })
    }

    pub fn mat(&self) -> &Mat {
        &self.mat
    }

    pub fn width(&self) -> usize {
        self.mat.cols().max(0) as usize
    }

    pub fn height(&self) -> usize {
        self.mat.rows().max(0) as usize
    }

    /// Whole-image window
    pub fn full_window(&self) -> Rect {
        Rect::new(0, 0, self.mat.cols(), self.mat.rows())
    }

    /// Ink pixels of one row restricted to `[x, x + w)`.
    pub fn row_slice(&self, y: i32, x: i32, w: i32) -> Result<&[u8]> {
        let row = self.mat.at_row::<u8>(y).op("row access")?;
        let start = x.max(0) as usize;
        let end = (x + w).max(0) as usize;
        row.get(start..end).ok_or_else(|| LayoutError::InvalidImage {
            reason: format!("window [{}, {}) outside row of {}", start, end, row.len()),
        })
    }
}

/// Vertical strip of a page. Borrows the page mask instead of copying it.
pub struct ColumnStrip<'a> {
    pub region: Region,
    page: &'a BinaryImage,
}

impl<'a> ColumnStrip<'a> {
    pub fn new(region: Region, page: &'a BinaryImage) -> Self {
        Self { region, page }
    }

    pub fn page(&self) -> &'a BinaryImage {
        self.page
    }

    pub fn width(&self) -> usize {
        self.region.len()
    }

    /// Strip rectangle in page coordinates
    pub fn window(&self) -> Rect {
        Rect::new(
            self.region.start as i32,
            0,
            self.region.len() as i32,
            self.page.height() as i32,
        )
    }
}

/// Final output unit: absolute rectangle plus its own cropped pixels
#[derive(Clone)]
pub struct ParagraphBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub image: Mat,
}

impl ParagraphBox {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

impl std::fmt::Debug for ParagraphBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParagraphBox")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Scalar, CV_8UC3};

    #[test]
    fn test_region_rejects_empty() {
        assert!(Region::new(5, 5).is_none());
        assert!(Region::new(6, 5).is_none());
        assert_eq!(Region::new(2, 7).unwrap().len(), 5);
    }

    #[test]
    fn test_region_deserialize_checks_bounds() {
        let ok: Region = serde_json::from_str(r#"{"start":2,"end":7}"#).unwrap();
        assert_eq!(ok, Region::new(2, 7).unwrap());
        assert!(serde_json::from_str::<Region>(r#"{"start":5,"end":5}"#).is_err());
        assert!(serde_json::from_str::<Region>(r#"{"start":9,"end":3}"#).is_err());
    }

    #[test]
    fn test_binary_image_requires_single_channel() {
        let color = Mat::new_rows_cols_with_default(4, 4, CV_8UC3, Scalar::all(0.0)).unwrap();
        assert!(BinaryImage::from_mat(color).is_err());

        let mask = Mat::new_rows_cols_with_default(4, 6, CV_8UC1, Scalar::all(0.0)).unwrap();
        let img = BinaryImage::from_mat(mask).unwrap();
        assert_eq!(img.width(), 6);
        assert_eq!(img.height(), 4);
        assert_eq!(img.row_slice(0, 2, 3).unwrap().len(), 3);
        assert!(img.row_slice(0, 4, 3).is_err());
    }
}
