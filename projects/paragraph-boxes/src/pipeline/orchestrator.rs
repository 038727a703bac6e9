// Batch orchestrator: fans pages out to worker threads
//
// Pages share nothing but the read-only config, so workers pull jobs from one
// channel and push outcomes into another. A failing or panicking page is
// recorded against its path and never stops its siblings.

use crate::config::LayoutConfig;
use crate::layout::columns::detect_columns;
use crate::layout::extract_paragraphs;
use crate::layout::projection::NoopObserver;
use crate::pipeline::finalize::{describe_paragraphs, save_paragraphs, ProfileRecorder};
use crate::pipeline::reader::load_page;
use crate::pipeline::types::{BatchOptions, BatchResults, PageJob, PageOutcome};
use crate::run_artifacts::PageRecord;
use anyhow::{anyhow, Context, Result};
use crossbeam::channel;
use indicatif::{ProgressBar, ProgressStyle};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Where paragraph images and profile dumps go
#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    /// Save paragraph crops here; `None` only reports boxes
    pub output_dir: Option<PathBuf>,
    pub dump_profiles: bool,
}

fn progress_bar(total: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec:.1.yellow} pages, {eta})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Run `work` on every path with `options.workers` threads.
///
/// Results come back in input order regardless of completion order.
pub fn run_batch<T, F>(paths: &[PathBuf], options: &BatchOptions, work: F) -> BatchResults<T>
where
    T: Send,
    F: Fn(&Path) -> Result<T> + Sync,
{
    let workers = options.workers.clamp(1, paths.len().max(1));
    let pb = progress_bar(paths.len(), options.show_progress);

    let (tx_jobs, rx_jobs) = channel::unbounded::<PageJob>();
    let (tx_out, rx_out) = channel::unbounded::<PageOutcome<T>>();

    for (index, path) in paths.iter().enumerate() {
        // receiver is alive until the scope below ends
        let _ = tx_jobs.send(PageJob {
            index,
            path: path.clone(),
        });
    }
    drop(tx_jobs);

    let scope_result = crossbeam::thread::scope(|s| {
        for worker_id in 0..workers {
            let rx = rx_jobs.clone();
            let tx = tx_out.clone();
            let work = &work;
            let pb = pb.clone();
            s.spawn(move |_| {
                tracing::debug!("Page worker {} started", worker_id);
                for job in rx {
                    let start_inst = Instant::now();
                    let result = match catch_unwind(AssertUnwindSafe(|| work(&job.path))) {
                        Ok(Ok(value)) => Ok(value),
                        Ok(Err(e)) => Err(format!("{:#}", e)),
                        Err(payload) => Err(format!("panicked: {}", panic_message(payload))),
                    };
                    tracing::debug!(
                        "Page {} took {:.1} ms",
                        job.path.display(),
                        start_inst.elapsed().as_secs_f64() * 1000.0
                    );
                    pb.inc(1);
                    if tx
                        .send(PageOutcome {
                            index: job.index,
                            path: job.path,
                            result,
                        })
                        .is_err()
                    {
                        break;
                    }
                }
            });
        }
    });
    drop(tx_out);
    pb.finish_and_clear();

    if scope_result.is_err() {
        tracing::error!("A page worker terminated abnormally");
    }

    let mut outcomes: Vec<PageOutcome<T>> = rx_out.into_iter().collect();
    outcomes.sort_by_key(|o| o.index);

    // pages whose worker died before reporting
    let mut reported = vec![false; paths.len()];
    for o in &outcomes {
        reported[o.index] = true;
    }

    let mut results = BatchResults {
        succeeded: Vec::new(),
        failed: Vec::new(),
    };
    for outcome in outcomes {
        match outcome.result {
            Ok(value) => results.succeeded.push((outcome.path, value)),
            Err(e) => results.failed.push((outcome.path, e)),
        }
    }
    for (index, seen) in reported.iter().enumerate() {
        if !seen {
            results
                .failed
                .push((paths[index].clone(), "worker terminated".to_string()));
        }
    }

    results
}

fn stem_of(path: &Path) -> Result<&str> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("Invalid image name: {}", path.display()))
}

/// Full paragraph extraction for one image, saving crops when asked.
pub fn process_page(path: &Path, config: &LayoutConfig, output: &OutputOptions) -> Result<PageRecord> {
    let page = load_page(path, config)?;
    let mut recorder = ProfileRecorder::default();
    if output.dump_profiles && output.output_dir.is_none() {
        tracing::warn!("Profile dump requested without an output directory, skipping");
    }

    let layout = if output.dump_profiles {
        extract_paragraphs(&page, config, &mut recorder)?
    } else {
        extract_paragraphs(&page, config, &mut NoopObserver)?
    };

    let paragraphs = match &output.output_dir {
        Some(dir) => {
            let stem = stem_of(path)?;
            if output.dump_profiles {
                recorder.save(stem, dir)?;
            }
            save_paragraphs(&layout, stem, dir, &config.image_ext)
                .with_context(|| format!("Saving paragraphs of {}", path.display()))?
        }
        None => describe_paragraphs(&layout),
    };

    tracing::info!(
        "{}: {} column(s), {} paragraph(s)",
        path.display(),
        layout.columns.len(),
        paragraphs.len()
    );

    Ok(PageRecord {
        source: path.to_path_buf(),
        columns: layout.columns,
        paragraphs,
    })
}

/// Column count of one image
pub fn count_columns(path: &Path, config: &LayoutConfig) -> Result<usize> {
    let page = load_page(path, config)?;
    let columns = detect_columns(&page.binary, &config.columns, &mut NoopObserver)?;
    Ok(columns.len())
}
