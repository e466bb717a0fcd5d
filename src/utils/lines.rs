//! Insertion-ordered, case-insensitive line deduplication.

use std::collections::HashSet;

/// Collects text lines, keeping only the first occurrence of each line
/// when compared case-insensitively.
///
/// Lines keep the casing they had when first seen; iteration order is
/// insertion order.
#[derive(Debug, Default, Clone)]
pub struct UniqueLines {
    seen: HashSet<String>,
    lines: Vec<String>,
}

impl UniqueLines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single line. Surrounding whitespace is stripped and blank lines
    /// are ignored. Returns `true` if the line was new.
    pub fn push(&mut self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() {
            return false;
        }
        if !self.seen.insert(line.to_lowercase()) {
            return false;
        }
        self.lines.push(line.to_string());
        true
    }

    /// Add every line of a multi-line block.
    pub fn push_text(&mut self, text: &str) {
        for line in text.lines() {
            self.push(line);
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Join the collected lines with newlines.
    pub fn join(&self) -> String {
        self.lines.join("\n")
    }
}
