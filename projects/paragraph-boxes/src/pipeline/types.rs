use std::path::PathBuf;

/// One image queued for a worker
#[derive(Debug, Clone)]
pub struct PageJob {
    pub index: usize,
    pub path: PathBuf,
}

/// What a worker sends back for a job
#[derive(Debug)]
pub struct PageOutcome<T> {
    pub index: usize,
    pub path: PathBuf,
    pub result: Result<T, String>,
}

/// Batch results in input order
#[derive(Debug)]
pub struct BatchResults<T> {
    pub succeeded: Vec<(PathBuf, T)>,
    pub failed: Vec<(PathBuf, String)>,
}

impl<T> BatchResults<T> {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Knobs for a batch run
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub workers: usize,
    pub show_progress: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            show_progress: false,
        }
    }
}
