use crate::patterns::catalog;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

/// Code context larger than this is sampled (head + tail) instead of scanned whole.
pub const DEFAULT_CODE_SAMPLE_SIZE: usize = 20_000;

const SAMPLE_SEPARATOR: &str = "\n\u{2026}\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub is_suspicious: bool,
    pub warnings: Vec<String>,
    pub severity: Severity,
}

impl ValidationResult {
    pub fn clean() -> Self {
        Self {
            is_suspicious: false,
            warnings: Vec::new(),
            severity: Severity::Low,
        }
    }

    pub fn is_high(&self) -> bool {
        self.severity == Severity::High
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::clean()
    }
}

/// Screen a user-supplied prompt fragment. Severity is the maximum over matched patterns.
pub fn validate_custom_prompt(text: &str) -> ValidationResult {
    scan(text, None, "")
}

/// Screen source code pulled into prompt context.
///
/// Severity is capped at `low`. Inputs longer than `max_sample_size` bytes are scanned as a
/// head window plus a tail window of `max_sample_size / 2` bytes each.
pub fn validate_code_context(text: &str, max_sample_size: usize) -> ValidationResult {
    let sample = sample_windows(text, max_sample_size);
    scan(&sample, Some(Severity::Low), "code context: ")
}

fn scan(text: &str, cap: Option<Severity>, prefix: &str) -> ValidationResult {
    if text.trim().is_empty() {
        return ValidationResult::clean();
    }

    let mut result = ValidationResult::clean();
    for pattern in catalog() {
        let Some(matched) = pattern.find(text) else {
            continue;
        };
        result.is_suspicious = true;
        result
            .warnings
            .push(format!("{prefix}{}: \"{}\"", pattern.description, matched.trim()));
        result.severity = result.severity.max(pattern.severity);
    }

    if let Some(cap) = cap {
        result.severity = result.severity.min(cap);
    }
    result
}

fn sample_windows(text: &str, max_sample_size: usize) -> Cow<'_, str> {
    if text.len() <= max_sample_size {
        return Cow::Borrowed(text);
    }
    let half = max_sample_size / 2;
    let head_end = floor_boundary(text, half);
    let tail_start = ceil_boundary(text, text.len().saturating_sub(half));
    Cow::Owned(format!(
        "{}{SAMPLE_SEPARATOR}{}",
        &text[..head_end],
        &text[tail_start..]
    ))
}

fn floor_boundary(text: &str, mut idx: usize) -> usize {
    idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_boundary(text: &str, mut idx: usize) -> usize {
    idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}
