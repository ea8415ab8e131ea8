/// Signature database parsing and match-priority ordering
///
/// Each line of the database has the form `name;pattern;type`. Double quotes are
/// stripped from the whole line before it is split or sorted. The resulting
/// table is ordered by descending raw line, which is the priority in which
/// signatures are tried against file content.

use std::borrow::Cow;
use std::path::Path;

use log::{debug, info};

use crate::core::errors::{ParseFailure, SignatureLoadError, SignatureParseError};
use crate::core::kmp::Pattern;
use crate::utils::file_utils;

const FIELD_SEPARATOR: u8 = b';';
const QUOTE: u8 = b'"';

/// One parsed `name;pattern;type` record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRecord {
    raw: Vec<u8>,
    name: String,
    pattern: Pattern,
    file_type: String,
}

impl SignatureRecord {
    /// Parse a single database line
    ///
    /// # Arguments
    ///
    /// * `line` - Raw line bytes, without the trailing newline
    /// * `line_number` - 1-based position of the line, used in errors
    pub fn parse(line: &[u8], line_number: usize) -> Result<Self, SignatureParseError> {
        let mut raw: Vec<u8> = line.iter().copied().filter(|&b| b != QUOTE).collect();
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }

        let fields: Vec<&[u8]> = raw.split(|&b| b == FIELD_SEPARATOR).collect();
        let fail = |reason| SignatureParseError {
            line_number,
            line: String::from_utf8_lossy(&raw).into_owned(),
            reason,
        };

        let [name, pattern, file_type] = fields.as_slice() else {
            return Err(fail(ParseFailure::FieldCount(fields.len())));
        };
        if pattern.is_empty() {
            return Err(fail(ParseFailure::EmptyPattern));
        }

        let name = String::from_utf8_lossy(name).into_owned();
        let file_type = String::from_utf8_lossy(file_type).into_owned();
        let pattern = Pattern::new(pattern.to_vec());

        Ok(Self {
            raw,
            name,
            pattern,
            file_type,
        })
    }

    /// The quote-stripped line this record was parsed from
    pub fn raw_line(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.raw)
    }

    /// Sort key; compared bytewise
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn file_type(&self) -> &str {
        &self.file_type
    }
}

/// Immutable, priority-ordered collection of signatures
///
/// Construction sorts once; there is no way to mutate the table afterwards, so
/// it can be shared by reference across worker threads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureTable {
    records: Vec<SignatureRecord>,
}

impl SignatureTable {
    /// Build a table from already parsed records
    pub fn new(mut records: Vec<SignatureRecord>) -> Self {
        // Stable sort, descending by raw line.
        records.sort_by(|a, b| b.raw.cmp(&a.raw));
        Self { records }
    }

    /// Parse and order a sequence of database lines
    ///
    /// Every line must be a record; a blank line is rejected like any other
    /// line without three fields. The first malformed line aborts parsing.
    pub fn from_lines<I, L>(lines: I) -> Result<Self, SignatureParseError>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[u8]>,
    {
        let mut records = Vec::new();

        for (index, line) in lines.into_iter().enumerate() {
            records.push(SignatureRecord::parse(line.as_ref(), index + 1)?);
        }

        Ok(Self::new(records))
    }

    /// Load the signature database from a file
    pub fn load(path: &Path) -> Result<Self, SignatureLoadError> {
        let lines = file_utils::read_lines(path).map_err(|source| SignatureLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Read {} lines from {}", lines.len(), path.display());

        let table = Self::from_lines(&lines)?;
        info!("Loaded {} signatures from {}", table.len(), path.display());

        Ok(table)
    }

    /// Records in match-priority order
    pub fn iter(&self) -> std::slice::Iter<'_, SignatureRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[SignatureRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a SignatureTable {
    type Item = &'a SignatureRecord;
    type IntoIter = std::slice::Iter<'a, SignatureRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
