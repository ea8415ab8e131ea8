/// Exact substring search (Knuth-Morris-Pratt)
///
/// Patterns are compared against file content byte by byte over the unsigned
/// 0-255 domain, so signature bytes at or above 0x80 match the same content bytes.

/// A search pattern with its precomputed failure function
///
/// Building a `Pattern` once and reusing it across many buffers avoids
/// recomputing the failure table for every file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    bytes: Box<[u8]>,
    failure: Box<[usize]>,
}

impl Pattern {
    /// Compile a pattern from its raw bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        let failure = failure_function(&bytes);

        Self {
            bytes: bytes.into_boxed_slice(),
            failure: failure.into_boxed_slice(),
        }
    }

    /// Raw pattern bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Iterate over every start offset of the pattern in `content`,
    /// including overlapping occurrences
    pub fn matches<'p, 'c>(&'p self, content: &'c [u8]) -> Matches<'p, 'c> {
        Matches {
            pattern: self,
            content,
            pos: 0,
            cursor: 0,
        }
    }

    /// Offset of the first occurrence, if any
    pub fn find(&self, content: &[u8]) -> Option<usize> {
        self.matches(content).next()
    }

    /// Whether the pattern occurs anywhere in `content`
    pub fn is_match(&self, content: &[u8]) -> bool {
        self.find(content).is_some()
    }

    /// All start offsets, in increasing order
    pub fn find_all(&self, content: &[u8]) -> Vec<usize> {
        self.matches(content).collect()
    }
}

/// Iterator over match offsets produced by [`Pattern::matches`]
#[derive(Debug, Clone)]
pub struct Matches<'p, 'c> {
    pattern: &'p Pattern,
    content: &'c [u8],
    pos: usize,
    cursor: usize,
}

impl Iterator for Matches<'_, '_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let pattern = &self.pattern.bytes;
        let failure = &self.pattern.failure;

        // An empty pattern never matches.
        if pattern.is_empty() {
            return None;
        }

        while self.pos < self.content.len() {
            let byte = self.content[self.pos];
            let mut j = self.cursor;

            while j > 0 && byte != pattern[j] {
                j = failure[j - 1];
            }
            if byte == pattern[j] {
                j += 1;
            }

            let i = self.pos;
            self.pos += 1;

            if j == pattern.len() {
                self.cursor = failure[j - 1];
                return Some(i + 1 - j);
            }
            self.cursor = j;
        }

        None
    }
}

/// Compute the KMP failure (prefix) function of `pattern`
///
/// `failure[i]` is the length of the longest proper prefix of `pattern[..=i]`
/// that is also a suffix of it.
pub fn failure_function(pattern: &[u8]) -> Vec<usize> {
    let mut failure = vec![0; pattern.len()];

    for i in 1..pattern.len() {
        let mut j = failure[i - 1];
        while j > 0 && pattern[i] != pattern[j] {
            j = failure[j - 1];
        }
        if pattern[i] == pattern[j] {
            j += 1;
        }
        failure[i] = j;
    }

    failure
}

/// Find every start offset of `pattern` in `content`
///
/// Convenience wrapper for one-off searches; compile a [`Pattern`] when the
/// same pattern is searched repeatedly.
pub fn search(content: &[u8], pattern: &[u8]) -> Vec<usize> {
    Pattern::new(pattern).find_all(content)
}
