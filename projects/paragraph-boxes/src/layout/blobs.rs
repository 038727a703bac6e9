// Connected-component paragraph candidates and the blob filter.
//
// Each column mask is dilated with a tall rectangle so the lines of one
// paragraph fuse into a single component. Components are then measured on
// the original (undilated) ink and kept only if they look like running text:
// large enough, wide enough, not solid, several lines, not a banner, and few
// ruled rows.

use crate::config::ParagraphConfig;
use crate::error::{OpenCvContext, Result};
use crate::layout::crop::{crop_rect, paragraph_from_rect};
use crate::layout::projection::project;
use crate::layout::regions::{find_regions, RegionPolicy};
use crate::layout::types::{Axis, ColumnStrip, ParagraphBox};
use opencv::core::{Mat, Point, Rect, Scalar, Size, BORDER_CONSTANT, CV_32S};
use opencv::imgproc::{
    connected_components_with_stats, dilate, get_structuring_element, CC_STAT_AREA,
    CC_STAT_HEIGHT, CC_STAT_LEFT, CC_STAT_TOP, CC_STAT_WIDTH, MORPH_RECT,
};
use opencv::prelude::*;
use thiserror::Error;

/// Per-component statistics as reported by the labeler, in column coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobStats {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Pixel count of the dilated component
    pub area: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlobMetrics {
    pub area: i32,
    pub width: i32,
    pub height: i32,
    pub fill_ratio: f64,
    pub text_line_count: usize,
    pub aspect_ratio: f64,
    pub horizontal_rule_count: usize,
}

/// First acceptance condition a blob failed
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    #[error("area {area} too small")]
    TooSmall { area: i32 },
    #[error("width {width} below {min_width:.0}")]
    TooNarrow { width: i32, min_width: f64 },
    #[error("fill ratio {fill_ratio:.2} too dense")]
    TooDense { fill_ratio: f64 },
    #[error("only {lines} text line(s)")]
    TooFewLines { lines: usize },
    #[error("aspect ratio {aspect_ratio:.1} too wide")]
    TooWide { aspect_ratio: f64 },
    #[error("{rules} horizontal rule(s)")]
    TooManyRules { rules: usize },
}

/// Acceptance rule for paragraph candidates
pub struct BlobFilter<'a> {
    config: &'a ParagraphConfig,
}

impl<'a> BlobFilter<'a> {
    pub fn new(config: &'a ParagraphConfig) -> Self {
        Self { config }
    }

    /// `Ok(())` iff every condition holds, otherwise the first failure.
    pub fn evaluate(
        &self,
        m: &BlobMetrics,
        column_width: usize,
    ) -> std::result::Result<(), Rejection> {
        let c = self.config;
        let min_width = c.min_width_frac * column_width as f64;

        if m.area < c.min_para_area {
            return Err(Rejection::TooSmall { area: m.area });
        }
        if (m.width as f64) < min_width {
            return Err(Rejection::TooNarrow {
                width: m.width,
                min_width,
            });
        }
        if m.fill_ratio > c.max_fill_ratio {
            return Err(Rejection::TooDense {
                fill_ratio: m.fill_ratio,
            });
        }
        if m.text_line_count < c.min_text_lines {
            return Err(Rejection::TooFewLines {
                lines: m.text_line_count,
            });
        }
        if m.aspect_ratio > c.max_aspect_ratio {
            return Err(Rejection::TooWide {
                aspect_ratio: m.aspect_ratio,
            });
        }
        if m.horizontal_rule_count > c.max_hlines {
            return Err(Rejection::TooManyRules {
                rules: m.horizontal_rule_count,
            });
        }
        Ok(())
    }
}

/// Label the dilated column mask. Background (label 0) is skipped.
pub fn label_blobs(strip: &ColumnStrip<'_>, config: &ParagraphConfig) -> Result<Vec<BlobStats>> {
    let column = crop_rect(strip.page().mat(), strip.window())?;

    let kernel = get_structuring_element(
        MORPH_RECT,
        Size::new(config.dilation_width_px, config.line_height_px),
        Point::new(-1, -1),
    )
    .op("get_structuring_element")?;

    let mut merged = Mat::default();
    dilate(
        &column,
        &mut merged,
        &kernel,
        Point::new(-1, -1),
        1,
        BORDER_CONSTANT,
        Scalar::default(),
    )
    .op("dilate")?;

    let mut labels = Mat::default();
    let mut stats = Mat::default();
    let mut centroids = Mat::default();
    let count = connected_components_with_stats(
        &merged,
        &mut labels,
        &mut stats,
        &mut centroids,
        8,
        CV_32S,
    )
    .op("connected_components_with_stats")?;

    let stat = |label: i32, col: i32| -> Result<i32> {
        stats.at_2d::<i32>(label, col).copied().op("stats access")
    };

    (1..count)
        .map(|label| {
            Ok(BlobStats {
                x: stat(label, CC_STAT_LEFT)?,
                y: stat(label, CC_STAT_TOP)?,
                width: stat(label, CC_STAT_WIDTH)?,
                height: stat(label, CC_STAT_HEIGHT)?,
                area: stat(label, CC_STAT_AREA)?,
            })
        })
        .collect()
}

/// Measure a blob on the undilated ink inside its bounding box
pub fn measure_blob(
    strip: &ColumnStrip<'_>,
    blob: &BlobStats,
    config: &ParagraphConfig,
) -> Result<BlobMetrics> {
    let window = Rect::new(
        strip.region.start as i32 + blob.x,
        blob.y,
        blob.width,
        blob.height,
    );
    let rows = project(strip.page(), window, Axis::Rows)?;
    let w = blob.width as f64;

    let ink = rows.total() as f64;
    let fill_ratio = ink / (w * blob.height as f64);

    let text_rows = RegionPolicy::any_run(config.row_text_thresh * w);
    let text_line_count = find_regions(rows.as_slice(), &text_rows).len();

    let rule_len = config.hline_min_len_ratio * w;
    let horizontal_rule_count = rows
        .as_slice()
        .iter()
        .filter(|&&count| count as f64 > rule_len)
        .count();

    Ok(BlobMetrics {
        area: blob.area,
        width: blob.width,
        height: blob.height,
        fill_ratio,
        text_line_count,
        aspect_ratio: w / blob.height as f64,
        horizontal_rule_count,
    })
}

/// Component-based paragraphs of one column, in label order.
pub fn extract_blobs(
    strip: &ColumnStrip<'_>,
    gray: &Mat,
    config: &ParagraphConfig,
) -> Result<Vec<ParagraphBox>> {
    let filter = BlobFilter::new(config);
    let mut paragraphs = Vec::new();

    for blob in label_blobs(strip, config)? {
        let metrics = measure_blob(strip, &blob, config)?;
        match filter.evaluate(&metrics, strip.width()) {
            Ok(()) => {
                let rect = Rect::new(
                    strip.region.start as i32 + blob.x,
                    blob.y,
                    blob.width,
                    blob.height,
                );
                paragraphs.push(paragraph_from_rect(gray, rect)?);
            }
            Err(reason) => {
                tracing::debug!(
                    "Rejected blob at ({}, {}) {}x{}: {}",
                    strip.region.start as i32 + blob.x,
                    blob.y,
                    blob.width,
                    blob.height,
                    reason
                );
            }
        }
    }

    Ok(paragraphs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::types::{BinaryImage, Region};
    use opencv::core::CV_8UC1;
    use opencv::imgproc::{rectangle, FILLED, LINE_8};

    fn good_metrics() -> BlobMetrics {
        BlobMetrics {
            area: 20_000,
            width: 300,
            height: 120,
            fill_ratio: 0.4,
            text_line_count: 5,
            aspect_ratio: 2.5,
            horizontal_rule_count: 0,
        }
    }

    #[test]
    fn test_filter_accepts_text_block() {
        let config = ParagraphConfig::default();
        assert_eq!(BlobFilter::new(&config).evaluate(&good_metrics(), 400), Ok(()));
    }

    #[test]
    fn test_small_area_always_rejected() {
        let config = ParagraphConfig::default();
        let filter = BlobFilter::new(&config);
        let m = BlobMetrics {
            area: 500,
            ..good_metrics()
        };
        assert_eq!(
            filter.evaluate(&m, 400),
            Err(Rejection::TooSmall { area: 500 })
        );
        // still rejected for any column width
        assert!(filter.evaluate(&m, 1).is_err());
    }

    #[test]
    fn test_each_condition_rejects() {
        let config = ParagraphConfig::default();
        let filter = BlobFilter::new(&config);
        let cases = [
            BlobMetrics {
                width: 50,
                ..good_metrics()
            },
            BlobMetrics {
                fill_ratio: 0.95,
                ..good_metrics()
            },
            BlobMetrics {
                text_line_count: 1,
                ..good_metrics()
            },
            BlobMetrics {
                aspect_ratio: 8.0,
                ..good_metrics()
            },
            BlobMetrics {
                horizontal_rule_count: 3,
                ..good_metrics()
            },
        ];
        for m in cases {
            assert!(filter.evaluate(&m, 400).is_err(), "{:?} should be rejected", m);
        }
    }

    fn column_page(blocks: &[Rect]) -> (BinaryImage, Mat) {
        let mut mask = Mat::new_rows_cols_with_default(400, 300, CV_8UC1, Scalar::all(0.0)).unwrap();
        let gray = Mat::new_rows_cols_with_default(400, 300, CV_8UC1, Scalar::all(255.0)).unwrap();
        for b in blocks {
            rectangle(&mut mask, *b, Scalar::all(255.0), FILLED, LINE_8, 0).unwrap();
        }
        (BinaryImage::from_mat(mask).unwrap(), gray)
    }

    #[test]
    fn test_extract_keeps_multi_line_paragraph() {
        // four lines of 10px "words" with 4px gaps, 12px between lines;
        // the 5x40 kernel bridges both gaps
        let words: Vec<Rect> = (0..4)
            .flat_map(|line| (0..14).map(move |w| Rect::new(40 + w * 14, 50 + line * 20, 10, 8)))
            .collect();
        let (mask, gray) = column_page(&words);
        let strip = ColumnStrip::new(Region::new(20, 280).unwrap(), &mask);

        let blobs = label_blobs(&strip, &ParagraphConfig::default()).unwrap();
        assert_eq!(blobs.len(), 1);

        let metrics = measure_blob(&strip, &blobs[0], &ParagraphConfig::default()).unwrap();
        assert_eq!(metrics.text_line_count, 4);
        assert!(metrics.fill_ratio < 0.8);
        assert_eq!(metrics.horizontal_rule_count, 0);

        let paras = extract_blobs(&strip, &gray, &ParagraphConfig::default()).unwrap();
        assert_eq!(paras.len(), 1);
        assert!(paras[0].x <= 40 && paras[0].x + paras[0].width >= 232);
        assert!(paras[0].y <= 50 && paras[0].y + paras[0].height >= 118);
    }

    #[test]
    fn test_extract_drops_solid_figure_and_small_marks() {
        let (mask, gray) = column_page(&[
            // solid figure: one "line", fully filled
            Rect::new(40, 30, 200, 120),
            // isolated dot far below
            Rect::new(60, 350, 4, 4),
        ]);
        let strip = ColumnStrip::new(Region::new(20, 280).unwrap(), &mask);
        let paras = extract_blobs(&strip, &gray, &ParagraphConfig::default()).unwrap();
        assert!(paras.is_empty());
    }

    #[test]
    fn test_blank_column_has_no_blobs() {
        let (mask, _gray) = column_page(&[]);
        let strip = ColumnStrip::new(Region::new(0, 300).unwrap(), &mask);
        assert!(label_blobs(&strip, &ParagraphConfig::default())
            .unwrap()
            .is_empty());
    }
}
