use crate::error::{LayoutError, OpenCvContext, Result};
use crate::layout::types::ParagraphBox;
use opencv::core::{Mat, Rect};
use opencv::prelude::*;

/// Copies `rect` out of `img` after clamping it to the image bounds.
pub fn crop_rect(img: &Mat, rect: Rect) -> Result<Mat> {
    let size = img.size().op("size")?;

    let x = rect.x.clamp(0, size.width);
    let y = rect.y.clamp(0, size.height);
    let w = rect.width.clamp(0, size.width - x);
    let h = rect.height.clamp(0, size.height - y);

    if w <= 0 || h <= 0 {
        return Err(LayoutError::InvalidImage {
            reason: format!(
                "crop {:?} is empty inside {}x{} image",
                rect, size.width, size.height
            ),
        });
    }

    let roi = Mat::roi(img, Rect::new(x, y, w, h)).op("roi")?;
    let mut out = Mat::default();
    roi.copy_to(&mut out).op("copy_to")?;

    Ok(out)
}

/// Build a paragraph box owning its own copy of the pixels under `rect`.
pub fn paragraph_from_rect(gray: &Mat, rect: Rect) -> Result<ParagraphBox> {
    let image = crop_rect(gray, rect)?;
    Ok(ParagraphBox {
        x: rect.x.max(0),
        y: rect.y.max(0),
        width: image.cols(),
        height: image.rows(),
        image,
    })
}
