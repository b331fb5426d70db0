use serde::Serialize;
use std::borrow::Cow;

/// Name of the synthetic section holding everything before the first `## ` header.
pub const PREAMBLE: &str = "_preamble";

const HEADER_MARKER: &str = "## ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub name: String,
    /// Verbatim block, header line included (the preamble has none).
    pub body: String,
}

/// Insertion-ordered map of section name to body. Names are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SectionMap {
    sections: Vec<Section>,
}

impl SectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.body.as_str())
    }

    /// Replace the body in place when `name` exists, otherwise append. A new
    /// [`PREAMBLE`] always goes first. Returns `true` when the section was new.
    pub fn insert(&mut self, name: impl Into<String>, body: impl Into<String>) -> bool {
        let name = name.into();
        let body = body.into();
        if let Some(idx) = self.position(&name) {
            self.sections[idx].body = body;
            return false;
        }
        let idx = if name == PREAMBLE { 0 } else { self.sections.len() };
        self.sections.insert(idx, Section { name, body });
        true
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self.position(name)?;
        Some(self.sections.remove(idx).body)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Section> {
        self.sections.iter()
    }

    fn append_to(&mut self, name: &str, extra: &str) {
        if let Some(idx) = self.position(name) {
            self.sections[idx].body.push_str(extra);
        }
    }
}

impl<'a> IntoIterator for &'a SectionMap {
    type Item = &'a Section;
    type IntoIter = std::slice::Iter<'a, Section>;

    fn into_iter(self) -> Self::IntoIter {
        self.sections.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseAnomaly {
    /// A header repeated an earlier one; its content was folded into the first occurrence.
    DuplicateHeader { name: String, line: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDocument {
    pub sections: SectionMap,
    pub anomalies: Vec<ParseAnomaly>,
}

/// Section name if `line` is an H2 header (`## Name`). H1 and H3+ never match, and
/// neither does a header spelled like the [`PREAMBLE`] sentinel.
pub fn header_name(line: &str) -> Option<&str> {
    let line = line.trim_end_matches(['\n', '\r']);
    let name = line.strip_prefix(HEADER_MARKER)?.trim();
    (!name.is_empty() && name != PREAMBLE).then_some(name)
}

/// Split `doc` into ordered sections.
///
/// `\r\n` line endings become `\n`. Headers inside fenced code blocks are ignored. A
/// repeated header keeps the first position; the repeat's content (minus its header line)
/// is appended to the first body.
pub fn parse_sections(doc: &str) -> ParsedDocument {
    let doc = normalize_line_endings(doc);
    let mut parsed = ParsedDocument::default();
    let mut preamble = String::new();
    let mut current: Option<OpenSection> = None;
    let mut fence: Option<Fence> = None;

    for (idx, line) in doc.split_inclusive('\n').enumerate() {
        let header = if fence.is_none() {
            header_name(line)
        } else {
            None
        };
        fence = next_fence_state(fence, line);

        let Some(name) = header else {
            match current.as_mut() {
                Some(open) => open.body.push_str(line),
                None => preamble.push_str(line),
            }
            continue;
        };

        match current.take() {
            Some(open) => open.close(&mut parsed),
            None if !preamble.trim().is_empty() => {
                parsed.sections.insert(PREAMBLE, std::mem::take(&mut preamble));
            }
            None => {}
        }
        current = Some(OpenSection {
            name: name.to_string(),
            body: line.to_string(),
            line: idx + 1,
        });
    }

    match current {
        Some(open) => open.close(&mut parsed),
        None if !preamble.trim().is_empty() => {
            parsed.sections.insert(PREAMBLE, preamble);
        }
        None => {}
    }
    parsed
}

struct OpenSection {
    name: String,
    body: String,
    line: usize,
}

impl OpenSection {
    fn close(self, parsed: &mut ParsedDocument) {
        if !parsed.sections.contains(&self.name) {
            parsed.sections.insert(self.name, self.body);
            return;
        }
        let rest = self
            .body
            .split_once('\n')
            .map_or("", |(_, rest)| rest);
        parsed.sections.append_to(&self.name, rest);
        parsed.anomalies.push(ParseAnomaly::DuplicateHeader {
            name: self.name,
            line: self.line,
        });
    }
}

/// An open code fence: its marker character and run length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fence {
    marker: char,
    len: usize,
}

fn fence_run(line: &str) -> Option<(Fence, &str)> {
    let trimmed = line.trim_start();
    let marker = trimmed.chars().next().filter(|c| matches!(c, '`' | '~'))?;
    let len = trimmed.chars().take_while(|c| *c == marker).count();
    (len >= 3).then(|| (Fence { marker, len }, &trimmed[len..]))
}

/// CommonMark fences: a closer uses the opener's marker, is at least as long, and carries
/// no info string.
fn next_fence_state(fence: Option<Fence>, line: &str) -> Option<Fence> {
    let run = fence_run(line);
    match (fence, run) {
        (None, Some((opener, _))) => Some(opener),
        (Some(open), Some((closer, rest)))
            if closer.marker == open.marker && closer.len >= open.len && rest.trim().is_empty() =>
        {
            None
        }
        (state, _) => state,
    }
}

fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if text.contains("\r\n") {
        Cow::Owned(text.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Inverse of [`parse_sections`], with whitespace normalization.
///
/// `\r\n` becomes `\n`. Each body loses trailing whitespace, blocks are joined by exactly
/// one blank line, and no run of three or more newlines survives. Non-empty output ends
/// with one newline.
pub fn render_sections(sections: &SectionMap) -> String {
    let joined = sections
        .iter()
        .map(|s| s.body.trim_end())
        .filter(|body| !body.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    let mut out = collapse_blank_runs(&normalize_line_endings(&joined));
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn collapse_blank_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0usize;
    for ch in text.chars() {
        if ch == '\n' {
            newlines += 1;
            if newlines > 2 {
                continue;
            }
        } else {
            newlines = 0;
        }
        out.push(ch);
    }
    out
}
