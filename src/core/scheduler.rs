/// Concurrent classification of many files on a bounded worker pool
///
/// Paths flow through a bounded queue into a fixed number of workers, so at
/// most `concurrency` files are open and buffered at any time. Each worker
/// reports through a result channel; nothing in here takes a lock.

use std::path::{Path, PathBuf};

use crossbeam::channel;
use log::{debug, info, warn};

use crate::core::classifier::{Detection, FileClassifier};
use crate::core::errors::FileReadError;
use crate::core::signatures::SignatureTable;

/// Number of workers used when nothing else is configured
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Lifecycle of one classification task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Queued,
    Running,
    Completed,
    Failed,
}

/// Terminal outcome of one task
#[derive(Debug)]
pub enum TaskOutcome {
    /// The file was read and classified; an unknown type is still a completion
    Completed(Detection),
    /// The file could not be read
    Failed(FileReadError),
}

/// Per-file result handed to the reporting layer
#[derive(Debug)]
pub struct ClassificationResult {
    pub path: PathBuf,
    pub outcome: TaskOutcome,
}

impl ClassificationResult {
    pub fn state(&self) -> TaskState {
        match self.outcome {
            TaskOutcome::Completed(_) => TaskState::Completed,
            TaskOutcome::Failed(_) => TaskState::Failed,
        }
    }

    /// Base name of the file, as shown in reports
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }

    /// Detected type, if the file could be read
    pub fn file_type(&self) -> Option<&str> {
        match &self.outcome {
            TaskOutcome::Completed(detection) => Some(&detection.file_type),
            TaskOutcome::Failed(_) => None,
        }
    }

    pub fn detection(&self) -> Option<&Detection> {
        match &self.outcome {
            TaskOutcome::Completed(detection) => Some(detection),
            TaskOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&FileReadError> {
        match &self.outcome {
            TaskOutcome::Completed(_) => None,
            TaskOutcome::Failed(e) => Some(e),
        }
    }
}

/// Error when the worker pool cannot be created
#[derive(Debug, thiserror::Error)]
#[error("failed to build worker pool: {0}")]
pub struct PoolBuildError(#[from] rayon::ThreadPoolBuildError);

/// Runs one classification task per file on a fixed-size pool
#[derive(Debug, Clone, Copy)]
pub struct ClassificationScheduler {
    concurrency: usize,
}

impl Default for ClassificationScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

impl ClassificationScheduler {
    /// Create a scheduler with `concurrency` workers (at least one)
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Classify every path and wait for all of them to finish
    ///
    /// Results are returned in completion order, one per input path.
    pub fn classify_all<I>(
        &self,
        paths: I,
        signatures: &SignatureTable,
    ) -> Result<Vec<ClassificationResult>, PoolBuildError>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.classify_all_with(paths, signatures, |_| {})
    }

    /// Like [`classify_all`](Self::classify_all), calling `on_complete` from the
    /// worker thread as each task reaches a terminal state
    pub fn classify_all_with<I, F>(
        &self,
        paths: I,
        signatures: &SignatureTable,
        on_complete: F,
    ) -> Result<Vec<ClassificationResult>, PoolBuildError>
    where
        I: IntoIterator<Item = PathBuf>,
        F: Fn(&ClassificationResult) + Sync,
    {
        // Dedicated pool sized to the configured concurrency
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.concurrency)
            .thread_name(|index| format!("classifier-{}", index))
            .build()?;

        // Bounded work queue in, unbounded result channel out
        let (task_tx, task_rx) = channel::bounded::<PathBuf>(self.concurrency);
        let (result_tx, result_rx) = channel::unbounded::<ClassificationResult>();
        let classifier = FileClassifier::new(signatures);
        let on_complete = &on_complete;

        // The producer runs on the calling thread so that every pool thread is
        // free to work; `send` blocks while the queue is full.
        let submitted = pool.in_place_scope(|scope| {
            // One long-lived worker per pool thread
            for worker in 0..self.concurrency {
                let task_rx = task_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move |_| {
                    for path in task_rx.iter() {
                        let result = run_task(worker, &classifier, path);
                        on_complete(&result);
                        if result_tx.send(result).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(task_rx);

            // Feed the queue; closing it lets the workers drain and exit
            let mut submitted = 0usize;
            for path in paths {
                debug!("{}: {:?}", path.display(), TaskState::Queued);
                if task_tx.send(path).is_err() {
                    break;
                }
                submitted += 1;
            }
            drop(task_tx);
            submitted
        });
        drop(result_tx);

        // Every worker has finished, so the channel holds all results
        let results: Vec<ClassificationResult> = result_rx.iter().collect();
        debug_assert_eq!(results.len(), submitted);

        let failed = results
            .iter()
            .filter(|r| r.state() == TaskState::Failed)
            .count();
        info!(
            "Classified {} files with {} workers ({} failed)",
            results.len(),
            self.concurrency,
            failed
        );

        Ok(results)
    }
}

fn run_task(worker: usize, classifier: &FileClassifier<'_>, path: PathBuf) -> ClassificationResult {
    debug!("{}: {:?} on worker {}", path.display(), TaskState::Running, worker);

    let outcome = match classifier.classify_file(&path) {
        Ok(detection) => {
            debug!("{}: {:?}", path.display(), TaskState::Completed);
            TaskOutcome::Completed(detection)
        }
        Err(e) => {
            warn!("{}: {:?}: {}", path.display(), TaskState::Failed, e);
            TaskOutcome::Failed(e)
        }
    };

    ClassificationResult { path, outcome }
}

/// Sort results by path for deterministic reporting
pub fn sort_by_path(results: &mut [ClassificationResult]) {
    results.sort_by(|a, b| a.path.cmp(&b.path));
}

/// Find the result for a given path
pub fn result_for<'r>(results: &'r [ClassificationResult], path: &Path) -> Option<&'r ClassificationResult> {
    results.iter().find(|r| r.path == path)
}
