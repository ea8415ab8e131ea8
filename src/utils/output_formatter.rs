/// Output formatter for classification results
///
/// This module handles formatting and exporting results for the console,
/// JSON and CSV.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use colored::Colorize;
use serde::Serialize;

use crate::core::scheduler::ClassificationResult;

/// One row of an exported report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub file: String,
    pub path: String,
    pub file_type: Option<String>,
    pub signature: Option<String>,
    pub offset: Option<usize>,
    pub error: Option<String>,
}

impl From<&ClassificationResult> for ReportEntry {
    fn from(result: &ClassificationResult) -> Self {
        let detection = result.detection();
        Self {
            file: result.file_name(),
            path: result.path.to_string_lossy().into_owned(),
            file_type: detection.map(|d| d.file_type.clone()),
            signature: detection.and_then(|d| d.signature.clone()),
            offset: detection.and_then(|d| d.offset),
            error: result.error().map(|e| e.to_string()),
        }
    }
}

/// Totals over a set of results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub files: usize,
    pub identified: usize,
    pub unknown: usize,
    pub failed: usize,
}

impl Summary {
    pub fn from_results(results: &[ClassificationResult]) -> Self {
        let mut summary = Self {
            files: results.len(),
            ..Self::default()
        };
        for result in results {
            match result.detection() {
                Some(d) if d.is_unknown() => summary.unknown += 1,
                Some(_) => summary.identified += 1,
                None => summary.failed += 1,
            }
        }
        summary
    }
}

/// Format one result as `<name>: <type>` without colors
pub fn format_line(result: &ClassificationResult) -> String {
    match (result.file_type(), result.error()) {
        (Some(file_type), _) => format!("{}: {}", result.file_name(), file_type),
        (None, Some(e)) => format!("{}: error: {}", result.file_name(), e.source),
        (None, None) => format!("{}:", result.file_name()),
    }
}

/// Format results for console output
///
/// # Arguments
///
/// * `results` - Classification results, in the order they should be printed
/// * `use_markdown` - Whether to wrap the output in triple backticks
pub fn format_results(results: &[ClassificationResult], use_markdown: bool) -> String {
    let mut output = String::new();

    if use_markdown {
        output.push_str("```\n");
    }

    if results.is_empty() {
        output.push_str("No files classified.\n");
    }

    for result in results {
        let name = result.file_name();
        let line = match (result.detection(), result.error()) {
            (Some(d), _) if d.is_unknown() => format!("{}: {}", name, d.file_type.yellow()),
            (Some(d), _) => format!("{}: {}", name.bold(), d.file_type.green()),
            (None, Some(e)) => format!("{}: {}", name, format!("error: {}", e.source).red()),
            (None, None) => format!("{}:", name),
        };
        output.push_str(&line);
        output.push('\n');
    }

    if use_markdown {
        output.push_str("```\n");
    }

    output
}

/// Export results to a JSON file
pub fn export_results_json(results: &[ClassificationResult], output_path: &Path) -> Result<()> {
    let entries: Vec<ReportEntry> = results.iter().map(ReportEntry::from).collect();
    let report = serde_json::json!({
        "generated": Local::now().to_rfc3339(),
        "summary": Summary::from_results(results),
        "results": entries,
    });

    let file = File::create(output_path)
        .context(format!("Failed to create JSON output file: {}", output_path.display()))?;

    serde_json::to_writer_pretty(file, &report).context("Failed to write JSON data")?;

    Ok(())
}

/// Export results to a CSV file
pub fn create_csv_report(results: &[ClassificationResult], output_path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(output_path)
        .context(format!("Failed to create CSV output file: {}", output_path.display()))?;

    for result in results {
        writer
            .serialize(ReportEntry::from(result))
            .context("Failed to write CSV row")?;
    }
    writer.flush().context("Failed to flush CSV output")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classifier::Detection;
    use crate::core::errors::FileReadError;
    use crate::core::scheduler::TaskOutcome;
    use std::io;
    use std::path::PathBuf;

    fn sample() -> Vec<ClassificationResult> {
        vec![
            ClassificationResult {
                path: PathBuf::from("/data/setup.exe"),
                outcome: TaskOutcome::Completed(Detection {
                    file_type: "exe".to_string(),
                    signature: Some("B".to_string()),
                    offset: Some(0),
                }),
            },
            ClassificationResult {
                path: PathBuf::from("/data/notes.txt"),
                outcome: TaskOutcome::Completed(Detection::unknown()),
            },
            ClassificationResult {
                path: PathBuf::from("/data/locked.bin"),
                outcome: TaskOutcome::Failed(FileReadError {
                    path: PathBuf::from("/data/locked.bin"),
                    source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
                }),
            },
        ]
    }

    #[test]
    fn test_format_line() {
        let results = sample();
        assert_eq!(format_line(&results[0]), "setup.exe: exe");
        assert_eq!(format_line(&results[1]), "notes.txt: Unknown file type");
        assert_eq!(format_line(&results[2]), "locked.bin: error: denied");
    }

    #[test]
    fn test_format_results_markdown() {
        colored::control::set_override(false);
        let output = format_results(&sample(), true);
        assert!(output.starts_with("```\n"));
        assert!(output.ends_with("```\n"));
        assert!(output.contains("setup.exe: exe"));
        assert!(output.contains("notes.txt: Unknown file type"));
    }

    #[test]
    fn test_summary() {
        let summary = Summary::from_results(&sample());
        assert_eq!(
            summary,
            Summary {
                files: 3,
                identified: 1,
                unknown: 1,
                failed: 1
            }
        );
    }

    #[test]
    fn test_export_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        export_results_json(&sample(), &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["summary"]["files"], 3);
        assert_eq!(value["results"][0]["file_type"], "exe");
        assert_eq!(value["results"][2]["file_type"], serde_json::Value::Null);
        assert!(value["results"][2]["error"].as_str().unwrap().contains("denied"));
    }

    #[test]
    fn test_export_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        create_csv_report(&sample(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("file,path,file_type,signature,offset,error")
        );
        assert_eq!(lines.next(), Some("setup.exe,/data/setup.exe,exe,B,0,"));
        assert_eq!(content.lines().count(), 4);
    }
}
