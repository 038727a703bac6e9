// Histogram projection: ink-density profiles along one axis of a mask window.

use crate::error::Result;
use crate::layout::types::{Axis, BinaryImage};
use opencv::core::Rect;
use serde::Serialize;

/// Ink count per index along one axis
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DensityProfile(Vec<u32>);

impl DensityProfile {
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn total(&self) -> u64 {
        self.0.iter().map(|&v| v as u64).sum()
    }
}

impl From<Vec<u32>> for DensityProfile {
    fn from(values: Vec<u32>) -> Self {
        Self(values)
    }
}

/// Receives every profile the segmenters compute. Purely diagnostic.
pub trait ProfileObserver {
    fn observe(&mut self, label: &str, axis: Axis, profile: &DensityProfile);
}

/// Closures with the right signature are observers too.
impl<F> ProfileObserver for F
where
    F: FnMut(&str, Axis, &DensityProfile),
{
    fn observe(&mut self, label: &str, axis: Axis, profile: &DensityProfile) {
        self(label, axis, profile)
    }
}

/// Observer that ignores everything
pub struct NoopObserver;

impl ProfileObserver for NoopObserver {
    fn observe(&mut self, _label: &str, _axis: Axis, _profile: &DensityProfile) {}
}

/// Count ink pixels of `window` per row or per column.
///
/// The returned profile has `window.height` entries for [`Axis::Rows`] and
/// `window.width` entries for [`Axis::Columns`].
pub fn project(image: &BinaryImage, window: Rect, axis: Axis) -> Result<DensityProfile> {
    let w = window.width.max(0) as usize;
    let h = window.height.max(0) as usize;
    let mut counts = match axis {
        Axis::Rows => vec![0u32; h],
        Axis::Columns => vec![0u32; w],
    };

    for (dy, y) in (window.y..window.y + window.height).enumerate() {
        let row = image.row_slice(y, window.x, window.width)?;
        match axis {
            Axis::Rows => counts[dy] = row.iter().filter(|&&p| p != 0).count() as u32,
            Axis::Columns => {
                for (dx, &p) in row.iter().enumerate() {
                    if p != 0 {
                        counts[dx] += 1;
                    }
                }
            }
        }
    }

    Ok(DensityProfile(counts))
}
