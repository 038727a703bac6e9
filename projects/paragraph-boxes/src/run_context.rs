use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "tif", "tiff", "bmp", "webp"];

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RunMetadata {
    pub input: PathBuf,
    pub created_at: DateTime<Utc>,
    pub image_count: usize,
    pub strategy: String,
    #[serde(skip)]
    pub output_dir: PathBuf,
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| IMAGE_EXTENSIONS.contains(&s.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Image files under `input`, sorted. A single file is returned as-is,
/// whatever its extension, so a bad path still surfaces as a page failure.
///
/// Nothing below `skip_dir` is listed, so a previous run's crops are not read
/// back in as pages.
pub fn list_images(input: &Path, skip_dir: Option<&Path>) -> Vec<PathBuf> {
    if !input.is_dir() {
        return vec![input.to_path_buf()];
    }

    let skip = skip_dir.and_then(|d| d.canonicalize().ok());
    let mut images: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_entry(|e| match &skip {
            Some(skip) if e.file_type().is_dir() => e
                .path()
                .canonicalize()
                .map(|p| &p != skip)
                .unwrap_or(true),
            _ => true,
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| is_image(e.path()))
        .map(|e| e.path().to_path_buf())
        .collect();
    images.sort();
    images
}

/// Fail when two images share a stem: their paragraph files would collide
/// in the flat output directory.
pub fn ensure_unique_stems(images: &[PathBuf]) -> Result<()> {
    let mut seen: BTreeMap<&OsStr, &Path> = BTreeMap::new();
    for path in images {
        let Some(stem) = path.file_stem() else {
            continue;
        };
        if let Some(first) = seen.insert(stem, path) {
            bail!(
                "{} and {} would both write {}_para_NN files; rename one or process them separately",
                first.display(),
                path.display(),
                stem.to_string_lossy()
            );
        }
    }
    Ok(())
}

/// Create the output directory on demand and write metadata.json into it.
pub fn create_run(
    output_dir: &Path,
    input: &Path,
    image_count: usize,
    strategy: &str,
) -> Result<RunMetadata> {
    fs::create_dir_all(output_dir)?;

    let metadata = RunMetadata {
        input: input.to_path_buf(),
        created_at: Utc::now(),
        image_count,
        strategy: strategy.to_string(),
        output_dir: output_dir.to_path_buf(),
    };

    let metadata_path = output_dir.join("metadata.json");
    let content = serde_json::to_string_pretty(&metadata)?;
    fs::write(metadata_path, content)?;

    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_images_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.JPG", "notes.txt", "sub/c.tif"] {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"x").unwrap();
        }

        let images = list_images(dir.path(), None);
        let names: Vec<_> = images
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.JPG"),
                PathBuf::from("b.png"),
                PathBuf::from("sub/c.tif")
            ]
        );
    }

    #[test]
    fn test_single_path_passes_through() {
        let images = list_images(Path::new("does/not/exist.png"), None);
        assert_eq!(images, vec![PathBuf::from("does/not/exist.png")]);
    }

    #[test]
    fn test_list_images_skips_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["001.png", "paragraphs/001_para_00.png"] {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"x").unwrap();
        }

        let images = list_images(dir.path(), Some(&dir.path().join("paragraphs")));
        assert_eq!(images, vec![dir.path().join("001.png")]);

        // a missing output directory skips nothing
        let all = list_images(dir.path(), Some(&dir.path().join("elsewhere")));
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_same_stem_in_sibling_dirs_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a/001.png", "b/001.png", "b/002.png"] {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"x").unwrap();
        }

        let images = list_images(dir.path(), None);
        assert_eq!(images.len(), 3);
        let err = ensure_unique_stems(&images).unwrap_err();
        assert!(err.to_string().contains("001_para_NN"));

        ensure_unique_stems(&images[1..]).unwrap();
    }

    #[test]
    fn test_create_run_writes_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/output");
        let metadata = create_run(&out, Path::new("scans"), 3, "components").unwrap();

        let content = fs::read_to_string(out.join("metadata.json")).unwrap();
        let loaded: RunMetadata = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded.image_count, 3);
        assert_eq!(loaded.strategy, "components");
        assert_eq!(metadata.output_dir, out);
    }
}
