mod cli;
mod config;
mod error;
mod layout;
mod pipeline;
mod run_artifacts;
mod run_context;

use anyhow::{bail, Context, Result};
use cli::{Args, ColumnsArgs, Command, ParagraphsArgs};
use config::LayoutConfig;
use pipeline::finalize::write_manifest;
use pipeline::orchestrator::{count_columns, process_page, run_batch, OutputOptions};
use pipeline::types::BatchOptions;
use run_artifacts::{FailureRecord, LayoutManifest};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn load_config(path: Option<&Path>) -> Result<LayoutConfig> {
    match path {
        Some(path) => LayoutConfig::from_json_file(path)
            .with_context(|| format!("Loading config {}", path.display())),
        None => Ok(LayoutConfig::default()),
    }
}

fn batch_options(workers: Option<usize>) -> BatchOptions {
    let mut options = BatchOptions {
        show_progress: true,
        ..BatchOptions::default()
    };
    if let Some(workers) = workers {
        options.workers = workers;
    }
    options
}

fn gather_images(input: &Path, skip_dir: Option<&Path>) -> Result<Vec<PathBuf>> {
    let images = run_context::list_images(input, skip_dir);
    if images.is_empty() {
        bail!("No images found under {}", input.display());
    }
    tracing::info!("Found {} image(s) under {}", images.len(), input.display());
    Ok(images)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn report_failures(failed: &[(PathBuf, String)]) {
    for (path, error) in failed {
        tracing::error!("Page {} failed: {}", path.display(), error);
        println!("{} ✗ {}", display_name(path), error);
    }
}

fn run_paragraphs(args: ParagraphsArgs) -> Result<bool> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(strategy) = args.strategy {
        config.strategy = strategy.into();
    }

    let output = OutputOptions {
        output_dir: (!args.no_save).then(|| args.output.clone()),
        dump_profiles: args.dump_profiles,
    };
    let images = gather_images(&args.input, output.output_dir.as_deref())?;
    if output.output_dir.is_some() {
        run_context::ensure_unique_stems(&images)?;
    }

    let results = run_batch(&images, &batch_options(args.workers), |path| {
        process_page(path, &config, &output)
    });

    let mut total_paragraphs = 0;
    for (path, record) in &results.succeeded {
        total_paragraphs += record.paragraphs.len();
        println!(
            "{} → {} col, {} para",
            display_name(path),
            record.columns.len(),
            record.paragraphs.len()
        );
    }
    report_failures(&results.failed);
    println!(
        "{} page(s), {} paragraph(s), {} failure(s)",
        results.succeeded.len(),
        total_paragraphs,
        results.failed.len()
    );

    let all_ok = !results.has_failures();
    if let Some(dir) = &output.output_dir {
        let metadata =
            run_context::create_run(dir, &args.input, images.len(), config.strategy.as_str())?;
        let manifest = LayoutManifest {
            pages: results.succeeded.into_iter().map(|(_, page)| page).collect(),
            failures: results
                .failed
                .into_iter()
                .map(|(source, error)| FailureRecord { source, error })
                .collect(),
        };
        write_manifest(&manifest, dir)?;
        tracing::info!(
            "Wrote layout.json and metadata.json to {}",
            metadata.output_dir.display()
        );
    }

    Ok(all_ok)
}

fn run_columns(args: ColumnsArgs) -> Result<bool> {
    let config = load_config(args.config.as_deref())?;
    let images = gather_images(&args.input, None)?;

    let results = run_batch(&images, &batch_options(args.workers), |path| {
        count_columns(path, &config)
    });

    for (path, count) in &results.succeeded {
        println!("{} → {} col", display_name(path), count);
    }
    report_failures(&results.failed);

    let mut by_count: Vec<&(PathBuf, usize)> = results.succeeded.iter().collect();
    by_count.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    println!("By column count:");
    for (path, count) in by_count {
        println!("  {:>2}  {}", count, display_name(path));
    }
    println!(
        "{} page(s), {} failure(s)",
        results.succeeded.len(),
        results.failed.len()
    );

    Ok(!results.has_failures())
}

fn run(args: Args) -> Result<bool> {
    match args.command {
        Command::Paragraphs(p) => run_paragraphs(p),
        Command::Columns(c) => run_columns(c),
        Command::InitConfig { path } => {
            LayoutConfig::default()
                .to_json_file(&path)
                .with_context(|| format!("Writing {}", path.display()))?;
            println!("Wrote default config to {}", path.display());
            Ok(true)
        }
    }
}

fn main() -> ExitCode {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    let args = Args::parse_args();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
