use crate::config::{Binarization, PageOverride};
use crate::error::{LayoutError, OpenCvContext, Result};
use crate::layout::types::BinaryImage;
use opencv::core::{Mat, Rect, Scalar, CV_8UC1};
use opencv::imgproc::{rectangle, threshold, FILLED, LINE_8, THRESH_BINARY_INV, THRESH_OTSU};
use opencv::prelude::*;

/// A grayscale page with its ink mask
pub struct Page {
    pub gray: Mat,
    pub binary: BinaryImage,
    /// Excluded areas to emit as paragraphs ahead of the segmented ones
    pub reserved: Vec<Rect>,
}

/// Ink mask of a grayscale image: dark pixels become 255.
pub fn binarize(gray: &Mat, mode: Binarization) -> Result<Mat> {
    if gray.typ() != CV_8UC1 {
        return Err(LayoutError::InvalidImage {
            reason: format!("expected 8-bit grayscale, got type {}", gray.typ()),
        });
    }

    let mut mask = Mat::default();
    match mode {
        Binarization::Otsu => {
            let level = threshold(gray, &mut mask, 0.0, 255.0, THRESH_BINARY_INV | THRESH_OTSU)
                .op("threshold")?;
            tracing::debug!("Otsu level {}", level);
        }
        Binarization::Fixed { level } => {
            threshold(gray, &mut mask, level as f64, 255.0, THRESH_BINARY_INV).op("threshold")?;
        }
    }
    Ok(mask)
}

fn intersect(a: Rect, b: Rect) -> Rect {
    let x = a.x.max(b.x);
    let y = a.y.max(b.y);
    let right = (a.x + a.width).min(b.x + b.width);
    let bottom = (a.y + a.height).min(b.y + b.height);
    Rect::new(x, y, (right - x).max(0), (bottom - y).max(0))
}

impl Page {
    /// Binarize `gray` and blank out every exclusion of `page_override`.
    pub fn new(gray: Mat, mode: Binarization, page_override: Option<&PageOverride>) -> Result<Self> {
        let mut mask = binarize(&gray, mode)?;
        let mut reserved = Vec::new();
        let bounds = Rect::new(0, 0, gray.cols(), gray.rows());

        for ex in page_override.iter().flat_map(|o| o.exclusions.iter()) {
            let rect = intersect(
                Rect::new(ex.rect.x, ex.rect.y, ex.rect.width, ex.rect.height),
                bounds,
            );
            if rect.width <= 0 || rect.height <= 0 {
                tracing::warn!("Exclusion {:?} lies outside the page, ignored", ex.rect);
                continue;
            }
            rectangle(&mut mask, rect, Scalar::all(0.0), FILLED, LINE_8, 0)
                .op("rectangle")?;
            if ex.emit_as_paragraph {
                reserved.push(rect);
            }
        }

        Ok(Self {
            binary: BinaryImage::from_mat(mask)?,
            gray,
            reserved,
        })
    }
}
