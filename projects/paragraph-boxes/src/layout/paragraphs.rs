// Line bands within a column, merged into paragraphs by vertical gap.

use crate::error::Result;
use crate::layout::crop::paragraph_from_rect;
use crate::layout::projection::{project, ProfileObserver};
use crate::layout::regions::{find_regions, RegionPolicy};
use crate::layout::types::{Axis, ColumnStrip, ParagraphBox, Region};
use opencv::core::{Mat, Rect};

/// Greedily merge top-to-bottom line bands.
///
/// A band joins the current paragraph when the gap between the paragraph's
/// end and the band's start is strictly below `line_spacing_threshold`.
/// No bands means no paragraphs.
pub fn group_lines(bands: &[Region], line_spacing_threshold: usize) -> Vec<Region> {
    let mut paragraphs = Vec::new();
    let mut bands = bands.iter();

    let Some(first) = bands.next() else {
        return paragraphs;
    };
    let mut current = *first;

    for band in bands {
        let gap = band.start.saturating_sub(current.end);
        if gap < line_spacing_threshold {
            current.end = band.end;
        } else {
            paragraphs.push(current);
            current = *band;
        }
    }
    paragraphs.push(current);

    paragraphs
}

/// Line bands of a column, top to bottom
pub fn detect_line_bands(
    strip: &ColumnStrip<'_>,
    policy: &RegionPolicy,
    observer: &mut dyn ProfileObserver,
) -> Result<Vec<Region>> {
    let profile = project(strip.page(), strip.window(), Axis::Rows)?;
    observer.observe(
        &format!("lines@{}", strip.region.start),
        Axis::Rows,
        &profile,
    );
    Ok(find_regions(profile.as_slice(), policy))
}

/// Projection-based paragraphs of one column, cropped from `gray`.
///
/// Each box spans the full column width.
pub fn segment_paragraphs(
    strip: &ColumnStrip<'_>,
    gray: &Mat,
    lines: &RegionPolicy,
    line_spacing_threshold: usize,
    observer: &mut dyn ProfileObserver,
) -> Result<Vec<ParagraphBox>> {
    let bands = detect_line_bands(strip, lines, observer)?;
    if bands.is_empty() {
        tracing::debug!("Column at x={} has no text lines", strip.region.start);
        return Ok(Vec::new());
    }

    group_lines(&bands, line_spacing_threshold)
        .into_iter()
        .map(|para| {
            let rect = Rect::new(
                strip.region.start as i32,
                para.start as i32,
                strip.width() as i32,
                para.len() as i32,
            );
            paragraph_from_rect(gray, rect)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::projection::NoopObserver;
    use crate::layout::types::BinaryImage;
    use opencv::core::{Scalar, CV_8UC1};
    use opencv::imgproc::{rectangle, FILLED, LINE_8};

    fn r(start: usize, end: usize) -> Region {
        Region::new(start, end).unwrap()
    }

    #[test]
    fn test_group_lines_gap_threshold() {
        let bands = [r(0, 20), r(25, 45), r(100, 120)];
        let paragraphs = group_lines(&bands, 40);
        assert_eq!(paragraphs, vec![r(0, 45), r(100, 120)]);
    }

    #[test]
    fn test_group_lines_gap_equal_to_threshold_splits() {
        let bands = [r(0, 10), r(50, 60)];
        assert_eq!(group_lines(&bands, 40), vec![r(0, 10), r(50, 60)]);
        assert_eq!(group_lines(&bands, 41), vec![r(0, 60)]);
    }

    #[test]
    fn test_group_lines_empty_and_single() {
        assert!(group_lines(&[], 40).is_empty());
        assert_eq!(group_lines(&[r(3, 9)], 40), vec![r(3, 9)]);
    }

    fn page_with_lines(lines: &[(i32, i32)]) -> (BinaryImage, Mat) {
        let mut mask = Mat::new_rows_cols_with_default(200, 160, CV_8UC1, Scalar::all(0.0)).unwrap();
        let mut gray =
            Mat::new_rows_cols_with_default(200, 160, CV_8UC1, Scalar::all(255.0)).unwrap();
        for &(y, h) in lines {
            let rect = Rect::new(20, y, 100, h);
            rectangle(&mut mask, rect, Scalar::all(255.0), FILLED, LINE_8, 0).unwrap();
            rectangle(&mut gray, rect, Scalar::all(0.0), FILLED, LINE_8, 0).unwrap();
        }
        (BinaryImage::from_mat(mask).unwrap(), gray)
    }

    #[test]
    fn test_segment_paragraphs_in_column() {
        // two lines close together, a third one far below
        let (mask, gray) = page_with_lines(&[(10, 12), (30, 12), (120, 12)]);
        let strip = ColumnStrip::new(r(20, 120), &mask);
        let paras =
            segment_paragraphs(&strip, &gray, &RegionPolicy::lines(), 40, &mut NoopObserver)
                .unwrap();

        assert_eq!(paras.len(), 2);
        assert_eq!(paras[0].rect(), Rect::new(20, 10, 100, 32));
        assert_eq!(paras[1].rect(), Rect::new(20, 120, 100, 12));
        assert_eq!(paras[1].image.rows(), 12);
    }

    #[test]
    fn test_blank_column_yields_no_paragraphs() {
        let (mask, gray) = page_with_lines(&[]);
        let strip = ColumnStrip::new(r(0, 160), &mask);
        let paras =
            segment_paragraphs(&strip, &gray, &RegionPolicy::lines(), 40, &mut NoopObserver)
                .unwrap();
        assert!(paras.is_empty());
    }

    #[test]
    fn test_observer_sees_row_profile() {
        let (mask, _gray) = page_with_lines(&[(10, 12)]);
        let strip = ColumnStrip::new(r(20, 120), &mask);
        let mut labels = Vec::new();
        let mut obs = |label: &str, axis: Axis, p: &crate::layout::projection::DensityProfile| {
            labels.push((label.to_string(), axis, p.as_slice().len()));
        };
        detect_line_bands(&strip, &RegionPolicy::lines(), &mut obs).unwrap();
        assert_eq!(labels, vec![("lines@20".to_string(), Axis::Rows, 200)]);
    }
}
