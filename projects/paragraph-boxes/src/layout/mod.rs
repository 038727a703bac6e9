// Page layout segmentation: columns, then paragraphs within each column.

pub mod blobs;
pub mod columns;
pub mod crop;
pub mod page;
pub mod paragraphs;
pub mod projection;
pub mod regions;
pub mod types;

use crate::config::{LayoutConfig, Strategy};
use crate::error::Result;
use crop::paragraph_from_rect;
use page::Page;
use projection::ProfileObserver;
use types::{ParagraphBox, Region};

/// Everything found on one page
#[derive(Debug)]
pub struct PageLayout {
    /// Column regions, left to right
    pub columns: Vec<Region>,
    /// Reserved areas first, then column by column
    pub paragraphs: Vec<ParagraphBox>,
}

/// Segment a page into paragraph boxes.
pub fn extract_paragraphs(
    page: &Page,
    config: &LayoutConfig,
    observer: &mut dyn ProfileObserver,
) -> Result<PageLayout> {
    let mut boxes = page
        .reserved
        .iter()
        .map(|rect| paragraph_from_rect(&page.gray, *rect))
        .collect::<Result<Vec<_>>>()?;

    let strips = columns::segment_columns(&page.binary, &config.columns, observer)?;
    let columns = strips.iter().map(|s| s.region).collect();

    for strip in &strips {
        let found = match config.strategy {
            Strategy::Projection => paragraphs::segment_paragraphs(
                strip,
                &page.gray,
                &config.lines,
                config.paragraphs.line_spacing_threshold,
                observer,
            )?,
            Strategy::Components => blobs::extract_blobs(strip, &page.gray, &config.paragraphs)?,
        };
        boxes.extend(found);
    }

    Ok(PageLayout {
        columns,
        paragraphs: boxes,
    })
}
