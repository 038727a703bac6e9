use crate::layout::projection::{DensityProfile, ProfileObserver};
use crate::layout::types::Axis;
use crate::layout::PageLayout;
use crate::run_artifacts::{BBox, LayoutManifest, ParagraphRecord};
use anyhow::{Context, Result};
use opencv::core::Vector;
use opencv::imgcodecs::imwrite;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// `{stem}_para_{index:02}.{ext}`
pub fn paragraph_file_name(stem: &str, index: usize, ext: &str) -> String {
    format!("{}_para_{:02}.{}", stem, index, ext)
}

/// Write one image per paragraph into `output_dir` and describe them.
pub fn save_paragraphs(
    layout: &PageLayout,
    stem: &str,
    output_dir: &Path,
    ext: &str,
) -> Result<Vec<ParagraphRecord>> {
    fs::create_dir_all(output_dir)?;

    layout
        .paragraphs
        .iter()
        .enumerate()
        .map(|(index, para)| {
            let filename = paragraph_file_name(stem, index, ext);
            let path = output_dir.join(&filename);
            let path_str = path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Non UTF-8 output path: {:?}", path))?;
            let written = imwrite(path_str, &para.image, &Vector::new())
                .with_context(|| format!("Failed to write {}", filename))?;
            if !written {
                anyhow::bail!("OpenCV refused to write {}", filename);
            }
            Ok(ParagraphRecord {
                index,
                bbox: BBox::from(para),
                file: Some(filename),
            })
        })
        .collect()
}

/// Records without files, for runs that do not save images
pub fn describe_paragraphs(layout: &PageLayout) -> Vec<ParagraphRecord> {
    layout
        .paragraphs
        .iter()
        .enumerate()
        .map(|(index, para)| ParagraphRecord {
            index,
            bbox: BBox::from(para),
            file: None,
        })
        .collect()
}

pub fn write_manifest(manifest: &LayoutManifest, output_dir: &Path) -> Result<()> {
    let path = output_dir.join("layout.json");
    let json = serde_json::to_string_pretty(manifest)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[derive(Serialize)]
struct RecordedProfile {
    label: String,
    axis: Axis,
    values: DensityProfile,
}

/// Keeps every profile of a page so it can be dumped next to the crops
#[derive(Default)]
pub struct ProfileRecorder {
    profiles: Vec<RecordedProfile>,
}

impl ProfileObserver for ProfileRecorder {
    fn observe(&mut self, label: &str, axis: Axis, profile: &DensityProfile) {
        self.profiles.push(RecordedProfile {
            label: label.to_string(),
            axis,
            values: profile.clone(),
        });
    }
}

impl ProfileRecorder {
    /// Writes `{stem}_profiles.json`
    pub fn save(&self, stem: &str, output_dir: &Path) -> Result<()> {
        let path = output_dir.join(format!("{}_profiles.json", stem));
        let json = serde_json::to_string(&self.profiles)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
