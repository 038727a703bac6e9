use crate::error::Result;
use crate::layout::projection::{project, ProfileObserver};
use crate::layout::regions::{find_regions, RegionPolicy};
use crate::layout::types::{Axis, BinaryImage, ColumnStrip, Region};

/// Column boundaries of a page, left to right.
pub fn detect_columns(
    binary: &BinaryImage,
    policy: &RegionPolicy,
    observer: &mut dyn ProfileObserver,
) -> Result<Vec<Region>> {
    let profile = project(binary, binary.full_window(), Axis::Columns)?;
    observer.observe("columns", Axis::Columns, &profile);
    Ok(find_regions(profile.as_slice(), policy))
}

/// Split a page into column views. No pixels are copied.
pub fn segment_columns<'a>(
    binary: &'a BinaryImage,
    policy: &RegionPolicy,
    observer: &mut dyn ProfileObserver,
) -> Result<Vec<ColumnStrip<'a>>> {
    let regions = detect_columns(binary, policy, observer)?;
    tracing::debug!("Detected {} column(s): {:?}", regions.len(), regions);
    Ok(regions
        .into_iter()
        .map(|region| ColumnStrip::new(region, binary))
        .collect())
}
