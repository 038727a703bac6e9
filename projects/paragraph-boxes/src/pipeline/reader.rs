// Reader: loads a page image from disk and prepares its ink mask.

use crate::config::LayoutConfig;
use crate::error::{LayoutError, OpenCvContext, Result};
use crate::layout::page::Page;
use opencv::core::Mat;
use opencv::imgcodecs::{imread, IMREAD_GRAYSCALE};
use opencv::prelude::*;
use std::path::Path;

/// Read an image as 8-bit grayscale.
pub fn read_grayscale(path: &Path) -> Result<Mat> {
    let not_found = || LayoutError::InputNotFound {
        path: path.to_path_buf(),
    };

    if !path.is_file() {
        return Err(not_found());
    }
    let path_str = path.to_str().ok_or_else(not_found)?;

    let gray = imread(path_str, IMREAD_GRAYSCALE).op("imread")?;
    // imread signals undecodable files with an empty Mat
    if gray.empty() {
        return Err(not_found());
    }

    Ok(gray)
}

/// Load, binarize and apply this image's override, if any.
pub fn load_page(path: &Path, config: &LayoutConfig) -> Result<Page> {
    let gray = read_grayscale(path)?;
    let page_override = config.override_for(path);
    if page_override.is_some() {
        tracing::info!("Applying override for {}", path.display());
    }
    let page = Page::new(gray, config.binarization, page_override)?;
    tracing::debug!(
        "Loaded {} ({}x{} px)",
        path.display(),
        page.binary.width(),
        page.binary.height()
    );
    Ok(page)
}
