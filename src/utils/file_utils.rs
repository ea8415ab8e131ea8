/// File handling utilities
///
/// This module provides the I/O wrappers around the classification engine:
/// path checks, directory enumeration, reading whole files and reading the
/// signature database line by line.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use log::{debug, error, warn};
use regex::Regex;
use walkdir::WalkDir;

use crate::core::errors::FileReadError;

/// What a path on disk turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    File,
    Directory,
    Other,
    Missing,
}

/// Options controlling which files are enumerated
#[derive(Debug, Clone, Default)]
pub struct EnumerateOptions {
    /// Descend into subdirectories
    pub recursive: bool,
    /// Glob patterns a file name must match (empty means all)
    pub include: Vec<String>,
    /// Glob patterns excluding a file name
    pub exclude: Vec<String>,
    /// Skip files larger than this many bytes
    pub max_size: Option<u64>,
}

/// Inspect a path without following it further than metadata
pub fn path_kind(path: &Path) -> PathKind {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => PathKind::File,
        Ok(meta) if meta.is_dir() => PathKind::Directory,
        Ok(_) => PathKind::Other,
        Err(_) => PathKind::Missing,
    }
}

/// Require `path` to be an existing directory
pub fn ensure_directory(path: &Path) -> Result<()> {
    match path_kind(path) {
        PathKind::Directory => Ok(()),
        PathKind::Missing => Err(anyhow!("Directory not found: {}", path.display())),
        _ => Err(anyhow!("Not a directory: {}", path.display())),
    }
}

/// Require `path` to be an existing regular file
pub fn ensure_file(path: &Path) -> Result<()> {
    match path_kind(path) {
        PathKind::File => Ok(()),
        PathKind::Missing => Err(anyhow!("File not found: {}", path.display())),
        _ => Err(anyhow!("Not a file: {}", path.display())),
    }
}

/// Read the whole content of a file into memory
pub fn read_file_bytes(path: &Path) -> Result<Vec<u8>, FileReadError> {
    fs::read(path).map_err(|source| FileReadError {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a text file as raw lines, without line terminators
///
/// Lines are returned as bytes so that signature patterns may contain any
/// byte value. A trailing `\r` is left in place for the caller to handle.
pub fn read_lines(path: &Path) -> io::Result<Vec<Vec<u8>>> {
    let reader = BufReader::new(File::open(path)?);
    reader.split(b'\n').collect()
}

/// Translate a simple glob (`*`, `?`) into an anchored regex
pub fn glob_to_regex(pattern: &str) -> Result<Regex> {
    let mut expr = String::from("^");
    for c in pattern.chars() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');

    Regex::new(&expr).map_err(|e| anyhow!("Invalid glob pattern {:?}: {}", pattern, e))
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns.iter().map(|p| glob_to_regex(p)).collect()
}

/// List the regular files inside `dir`
///
/// Only the top level is listed unless `options.recursive` is set. Include and
/// exclude globs are matched against the file name.
pub fn list_files(dir: &Path, options: &EnumerateOptions) -> Result<Vec<PathBuf>> {
    let include = compile_globs(&options.include)?;
    let exclude = compile_globs(&options.exclude)?;

    let walker = WalkDir::new(dir).min_depth(1).follow_links(false);
    let walker = if options.recursive {
        walker
    } else {
        walker.max_depth(1)
    };

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                error!("Error walking {}: {}", dir.display(), e);
                continue;
            }
        };

        // Symlinks are judged by their target.
        if !entry.path().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy();
        let included = include.is_empty() || include.iter().any(|re| re.is_match(&file_name));
        let excluded = exclude.iter().any(|re| re.is_match(&file_name));
        if !included || excluded {
            debug!("Filtered out {}", entry.path().display());
            continue;
        }

        if let Some(limit) = options.max_size {
            match fs::metadata(entry.path()) {
                Ok(meta) if meta.len() > limit => {
                    warn!(
                        "Skipping {}: exceeds maximum file size ({:.2} MB)",
                        entry.path().display(),
                        meta.len() as f64 / 1024.0 / 1024.0
                    );
                    continue;
                }
                Ok(_) => {}
                Err(e) => error!("Error reading metadata for {}: {}", entry.path().display(), e),
            }
        }

        files.push(entry.into_path());
    }

    debug!("Found {} files in {}", files.len(), dir.display());
    Ok(files)
}
