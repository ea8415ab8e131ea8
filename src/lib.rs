/// Signature Analyzer - identifies file types by their content
///
/// This library scans the raw bytes of files for known signatures loaded from a
/// signature database and reports the detected type of each file.

pub mod core;
pub mod utils;

// Re-export main types for convenience
pub use crate::core::classifier::{classify, Detection, FileClassifier, UNKNOWN_FILE_TYPE};
pub use crate::core::errors::{FileReadError, SignatureLoadError, SignatureParseError};
pub use crate::core::kmp::{search, Pattern};
pub use crate::core::scheduler::{
    ClassificationResult, ClassificationScheduler, TaskOutcome, TaskState,
};
pub use crate::core::signatures::{SignatureRecord, SignatureTable};

/// Classify a single file against a signature database
///
/// This is a convenience function for simple use cases.
///
/// # Arguments
///
/// * `file_path` - Path to the file to classify
/// * `signatures_path` - Path to the `name;pattern;type` signature file
///
/// # Returns
///
/// The detected type, or [`UNKNOWN_FILE_TYPE`]
pub fn classify_file<P: AsRef<std::path::Path>, S: AsRef<std::path::Path>>(
    file_path: P,
    signatures_path: S,
) -> anyhow::Result<String> {
    let signatures = SignatureTable::load(signatures_path.as_ref())?;
    let detection = FileClassifier::new(&signatures).classify_file(file_path.as_ref())?;
    Ok(detection.file_type)
}

/// Library configuration
pub mod config {
    use std::path::Path;

    use anyhow::{Context, Result};
    use log::info;
    use serde::Deserialize;

    use crate::core::scheduler::DEFAULT_CONCURRENCY;
    use crate::utils::file_utils::EnumerateOptions;

    /// Settings read from an optional JSON configuration file
    #[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
    #[serde(default)]
    pub struct AnalyzerConfig {
        /// Worker threads; 0 means one per available CPU
        pub workers: usize,
        pub recursive: bool,
        /// Skip files larger than this many megabytes
        pub max_size_mb: Option<u64>,
        pub include: Vec<String>,
        pub exclude: Vec<String>,
    }

    impl Default for AnalyzerConfig {
        fn default() -> Self {
            Self {
                workers: DEFAULT_CONCURRENCY,
                recursive: false,
                max_size_mb: None,
                include: Vec::new(),
                exclude: Vec::new(),
            }
        }
    }

    impl AnalyzerConfig {
        /// Load a configuration file
        pub fn load(path: &Path) -> Result<Self> {
            let text = std::fs::read_to_string(path)
                .context(format!("Failed to read configuration file: {}", path.display()))?;
            let config = serde_json::from_str(&text)
                .context(format!("Invalid JSON in configuration file: {}", path.display()))?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }

        /// Number of workers to run, resolving 0 to the available parallelism
        pub fn worker_count(&self) -> usize {
            if self.workers == 0 {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            } else {
                self.workers
            }
        }

        /// Enumeration options derived from this configuration
        pub fn enumerate_options(&self) -> EnumerateOptions {
            EnumerateOptions {
                recursive: self.recursive,
                include: self.include.clone(),
                exclude: self.exclude.clone(),
                max_size: self.max_size_mb.map(|mb| mb * 1024 * 1024),
            }
        }
    }

}

/// Command-line application functionality
pub mod app {
    use std::path::Path;

    use anyhow::{Context, Result};

    use crate::config::AnalyzerConfig;
    use crate::core::scheduler::{self, ClassificationResult, ClassificationScheduler};
    use crate::core::signatures::SignatureTable;
    use crate::utils::file_utils;

    /// Classify every file in a directory
    ///
    /// # Arguments
    ///
    /// * `directory` - Directory whose files are classified
    /// * `signatures_path` - Signature database file
    /// * `config` - Enumeration and worker settings
    ///
    /// # Returns
    ///
    /// One result per file, sorted by path
    pub fn run_classifier(
        directory: &Path,
        signatures_path: &Path,
        config: &AnalyzerConfig,
    ) -> Result<Vec<ClassificationResult>> {
        file_utils::ensure_directory(directory)?;
        file_utils::ensure_file(signatures_path)?;

        let signatures = SignatureTable::load(signatures_path)?;
        let files = file_utils::list_files(directory, &config.enumerate_options())?;

        let mut results = ClassificationScheduler::new(config.worker_count())
            .classify_all(files, &signatures)
            .context("Classification failed")?;
        scheduler::sort_by_path(&mut results);

        Ok(results)
    }
}
