// Run artifact struct definitions
//
// Structs persisted as JSON files within a run's output directory.

use crate::layout::types::{ParagraphBox, Region};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Pixel bounding box of a saved paragraph
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BBox {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl From<&ParagraphBox> for BBox {
    fn from(p: &ParagraphBox) -> Self {
        let r = p.rect();
        Self {
            x: r.x,
            y: r.y,
            w: r.width,
            h: r.height,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ParagraphRecord {
    pub index: usize,
    pub bbox: BBox,
    /// File name inside the output directory, when images are saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// Successful page in layout.json
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub source: PathBuf,
    pub columns: Vec<Region>,
    pub paragraphs: Vec<ParagraphRecord>,
}

/// Failed page in layout.json
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FailureRecord {
    pub source: PathBuf,
    pub error: String,
}

/// layout.json: everything a run produced
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct LayoutManifest {
    pub pages: Vec<PageRecord>,
    pub failures: Vec<FailureRecord>,
}
