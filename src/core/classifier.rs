/// File classification against a signature table
///
/// Signatures are tried in table order and the first one whose pattern occurs
/// anywhere in the content decides the type. Lower-priority signatures are not
/// evaluated once a match is found.

use std::path::Path;

use log::debug;
use serde::Serialize;

use crate::core::errors::FileReadError;
use crate::core::signatures::{SignatureRecord, SignatureTable};
use crate::utils::file_utils;

/// Type reported when no signature matches
pub const UNKNOWN_FILE_TYPE: &str = "Unknown file type";

/// Outcome of classifying one buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detection {
    /// Detected type, or [`UNKNOWN_FILE_TYPE`]
    pub file_type: String,
    /// Name of the winning signature
    pub signature: Option<String>,
    /// Offset of the first occurrence of the winning pattern
    pub offset: Option<usize>,
}

impl Detection {
    /// A detection for content that matched nothing
    pub fn unknown() -> Self {
        Self {
            file_type: UNKNOWN_FILE_TYPE.to_string(),
            signature: None,
            offset: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.signature.is_none()
    }
}

/// Classifies buffers and files against a shared signature table
#[derive(Debug, Clone, Copy)]
pub struct FileClassifier<'a> {
    signatures: &'a SignatureTable,
}

impl<'a> FileClassifier<'a> {
    pub fn new(signatures: &'a SignatureTable) -> Self {
        Self { signatures }
    }

    /// Find the highest-priority signature occurring in `content`
    ///
    /// Returns the record together with the offset of its first occurrence.
    pub fn identify(&self, content: &[u8]) -> Option<(&'a SignatureRecord, usize)> {
        self.signatures
            .iter()
            .find_map(|record| record.pattern().find(content).map(|offset| (record, offset)))
    }

    /// Type of the first matching signature, or [`UNKNOWN_FILE_TYPE`]
    pub fn classify(&self, content: &[u8]) -> &'a str {
        self.identify(content)
            .map_or(UNKNOWN_FILE_TYPE, |(record, _)| record.file_type())
    }

    /// Classify a buffer, keeping which signature matched and where
    pub fn detect(&self, content: &[u8]) -> Detection {
        match self.identify(content) {
            Some((record, offset)) => Detection {
                file_type: record.file_type().to_string(),
                signature: Some(record.name().to_string()),
                offset: Some(offset),
            },
            None => Detection::unknown(),
        }
    }

    /// Read a whole file and classify its content
    ///
    /// The buffer is dropped before this returns.
    pub fn classify_file(&self, path: &Path) -> Result<Detection, FileReadError> {
        let content = file_utils::read_file_bytes(path)?;
        let detection = self.detect(&content);
        debug!(
            "{} ({} bytes) -> {}",
            path.display(),
            content.len(),
            detection.file_type
        );
        Ok(detection)
    }
}

/// Classify `content` against `signatures` without building a classifier
pub fn classify<'a>(content: &[u8], signatures: &'a SignatureTable) -> &'a str {
    FileClassifier::new(signatures).classify(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(lines: &[&str]) -> SignatureTable {
        SignatureTable::from_lines(lines).unwrap()
    }

    #[test]
    fn test_scenario_zip_exe() {
        let signatures = table(&["A;PK;zip", "B;MZ;exe"]);

        assert_eq!(classify(b"MZ\x90\x00\x03", &signatures), "exe");
        assert_eq!(classify(b"PK\x03\x04data", &signatures), "zip");
        assert_eq!(classify(b"plain text", &signatures), UNKNOWN_FILE_TYPE);
    }

    #[test]
    fn test_greater_raw_line_wins() {
        let signatures = table(&["A;PK;zip", "B;MZ;exe"]);
        // Both patterns occur; "B;MZ;exe" sorts first.
        assert_eq!(classify(b"PK....MZ", &signatures), "exe");

        let signatures = table(&["Z;PK;zip", "B;MZ;exe"]);
        assert_eq!(classify(b"PK....MZ", &signatures), "zip");
    }

    #[test]
    fn test_match_anywhere_in_content() {
        let signatures = table(&["JAR;META-INF;jar"]);
        assert_eq!(classify(b"PK\x03\x04....META-INF/MANIFEST.MF", &signatures), "jar");
    }

    #[test]
    fn test_empty_content_is_unknown() {
        let signatures = table(&["A;PK;zip", "B;MZ;exe"]);
        assert_eq!(classify(b"", &signatures), UNKNOWN_FILE_TYPE);
    }

    #[test]
    fn test_empty_table_is_unknown() {
        let signatures = SignatureTable::default();
        assert_eq!(classify(b"MZ", &signatures), UNKNOWN_FILE_TYPE);
    }

    #[test]
    fn test_detect_reports_signature_and_offset() {
        let signatures = table(&["ELF;\x7fELF;elf"]);
        let classifier = FileClassifier::new(&signatures);

        let detection = classifier.detect(b"\0\0\x7fELF");
        assert_eq!(detection.file_type, "elf");
        assert_eq!(detection.signature.as_deref(), Some("ELF"));
        assert_eq!(detection.offset, Some(2));
        assert!(!detection.is_unknown());

        assert_eq!(classifier.detect(b"nope"), Detection::unknown());
    }

    #[test]
    fn test_classification_is_idempotent() {
        let signatures = table(&["A;PK;zip", "B;MZ;exe", "C;%PDF;pdf"]);
        let classifier = FileClassifier::new(&signatures);
        let content = b"%PDF-1.7 ... PK";

        let first = classifier.detect(content);
        for _ in 0..5 {
            assert_eq!(classifier.detect(content), first);
        }
    }

    #[test]
    fn test_classify_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.bin");
        std::fs::write(&path, b"MZ\x90\x00").unwrap();

        let signatures = table(&["A;PK;zip", "B;MZ;exe"]);
        let classifier = FileClassifier::new(&signatures);

        assert_eq!(classifier.classify_file(&path).unwrap().file_type, "exe");
        assert!(classifier.classify_file(&dir.path().join("missing")).is_err());
    }
}
