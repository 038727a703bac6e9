// Layout configuration.
//
// One `LayoutConfig` value is passed into every entry point. It can be loaded
// from JSON, and `LayoutConfig::default()` reproduces the tuned thresholds for
// scanned A4 pages at roughly 150 dpi.

use crate::error::{LayoutError, Result};
use crate::layout::regions::RegionPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// How grayscale pages are turned into ink masks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum Binarization {
    /// Global Otsu threshold
    Otsu,
    /// Pixels at or below `level` are ink
    Fixed { level: u8 },
}

/// Which paragraph extractor runs inside each column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Row projection, line bands merged by gap
    Projection,
    /// Dilation + connected components + blob filter
    Components,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Projection => "projection",
            Strategy::Components => "components",
        }
    }
}

/// Paragraph extraction thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphConfig {
    /// Vertical extent of the dilation kernel, in pixels
    pub line_height_px: i32,
    /// Horizontal extent of the dilation kernel, in pixels
    #[serde(default = "default_dilation_width")]
    pub dilation_width_px: i32,
    /// Minimum component area (dilated pixels)
    pub min_para_area: i32,
    /// Minimum blob width as a fraction of the column width
    pub min_width_frac: f64,
    /// Maximum ink fraction of the bounding box
    pub max_fill_ratio: f64,
    pub min_text_lines: usize,
    /// A row counts as text when its ink exceeds this fraction of blob width
    pub row_text_thresh: f64,
    /// Maximum width / height
    pub max_aspect_ratio: f64,
    /// Maximum number of ruled rows (tables, separators)
    pub max_hlines: usize,
    /// A row is a ruled line when its ink exceeds this fraction of blob width
    #[serde(default = "default_hline_ratio")]
    pub hline_min_len_ratio: f64,
    /// Line bands closer than this are merged into one paragraph
    pub line_spacing_threshold: usize,
}

fn default_dilation_width() -> i32 {
    5
}

fn default_hline_ratio() -> f64 {
    0.8
}

impl Default for ParagraphConfig {
    fn default() -> Self {
        Self {
            line_height_px: 40,
            dilation_width_px: default_dilation_width(),
            min_para_area: 3000,
            min_width_frac: 0.25,
            max_fill_ratio: 0.80,
            min_text_lines: 2,
            row_text_thresh: 0.05,
            max_aspect_ratio: 6.0,
            max_hlines: 2,
            hline_min_len_ratio: default_hline_ratio(),
            line_spacing_threshold: 40,
        }
    }
}

/// Rectangle in page pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Area blanked out before segmentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exclusion {
    pub rect: PixelRect,
    /// Also emit the excluded area as its own paragraph
    #[serde(default)]
    pub emit_as_paragraph: bool,
}

/// Per-image adjustments, keyed by file name or stem in `LayoutConfig::overrides`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageOverride {
    #[serde(default)]
    pub exclusions: Vec<Exclusion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub binarization: Binarization,
    pub strategy: Strategy,
    pub columns: RegionPolicy,
    pub lines: RegionPolicy,
    pub paragraphs: ParagraphConfig,
    /// Extension of saved paragraph images
    #[serde(default = "default_image_ext")]
    pub image_ext: String,
    #[serde(default)]
    pub overrides: BTreeMap<String, PageOverride>,
}

fn default_image_ext() -> String {
    "png".to_string()
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            binarization: Binarization::Otsu,
            strategy: Strategy::Components,
            columns: RegionPolicy::columns(),
            lines: RegionPolicy::lines(),
            paragraphs: ParagraphConfig::default(),
            image_ext: default_image_ext(),
            overrides: BTreeMap::new(),
        }
    }
}

impl LayoutConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Override for an image, looked up by file name first, then by stem
    pub fn override_for(&self, path: &Path) -> Option<&PageOverride> {
        let name = path.file_name().and_then(|s| s.to_str());
        let stem = path.file_stem().and_then(|s| s.to_str());
        name.and_then(|n| self.overrides.get(n))
            .or_else(|| stem.and_then(|s| self.overrides.get(s)))
    }

    pub fn validate(&self) -> Result<()> {
        validate_policy("columns", &self.columns)?;
        validate_policy("lines", &self.lines)?;

        let p = &self.paragraphs;
        positive_i32("paragraphs.line_height_px", p.line_height_px)?;
        positive_i32("paragraphs.dilation_width_px", p.dilation_width_px)?;
        positive_i32("paragraphs.min_para_area", p.min_para_area)?;
        fraction("paragraphs.min_width_frac", p.min_width_frac)?;
        fraction("paragraphs.max_fill_ratio", p.max_fill_ratio)?;
        fraction("paragraphs.row_text_thresh", p.row_text_thresh)?;
        fraction("paragraphs.hline_min_len_ratio", p.hline_min_len_ratio)?;
        if p.min_text_lines == 0 {
            return Err(LayoutError::invalid_config(
                "paragraphs.min_text_lines",
                "must be at least 1",
            ));
        }
        if !(p.max_aspect_ratio > 0.0) {
            return Err(LayoutError::invalid_config(
                "paragraphs.max_aspect_ratio",
                "must be positive",
            ));
        }
        if p.line_spacing_threshold == 0 {
            return Err(LayoutError::invalid_config(
                "paragraphs.line_spacing_threshold",
                "must be positive",
            ));
        }

        if let Binarization::Fixed { level: 0 } = self.binarization {
            return Err(LayoutError::invalid_config(
                "binarization.level",
                "must be positive",
            ));
        }

        if self.image_ext.is_empty() || self.image_ext.contains(['.', '/', '\\']) {
            return Err(LayoutError::invalid_config(
                "image_ext",
                format!("'{}' is not a bare file extension", self.image_ext),
            ));
        }

        for (id, page) in &self.overrides {
            for ex in &page.exclusions {
                let r = ex.rect;
                if r.x < 0 || r.y < 0 || r.width <= 0 || r.height <= 0 {
                    return Err(LayoutError::invalid_config(
                        format!("overrides.{}", id),
                        format!("exclusion {:?} must have non-negative origin and positive size", r),
                    ));
                }
            }
        }

        Ok(())
    }
}

fn validate_policy(name: &str, policy: &RegionPolicy) -> Result<()> {
    if !(policy.threshold >= 0.0) {
        return Err(LayoutError::invalid_config(
            format!("{}.threshold", name),
            "must be non-negative",
        ));
    }
    if policy.min_width == 0 {
        return Err(LayoutError::invalid_config(
            format!("{}.min_width", name),
            "must be positive",
        ));
    }
    Ok(())
}

fn positive_i32(name: &str, value: i32) -> Result<()> {
    if value <= 0 {
        return Err(LayoutError::invalid_config(
            name,
            format!("must be positive, got {}", value),
        ));
    }
    Ok(())
}

fn fraction(name: &str, value: f64) -> Result<()> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(LayoutError::invalid_config(
            name,
            format!("must be in (0, 1], got {}", value),
        ));
    }
    Ok(())
}
