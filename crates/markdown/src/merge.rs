use crate::change::{ChangeSet, ChangeType, DocumentationChange};
use crate::sections::{header_name, parse_sections, render_sections, ParseAnomaly, SectionMap, PREAMBLE};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppliedKind {
    Added,
    Updated,
    Removed,
    /// `update` named a section that did not exist; it was appended.
    AddedFromUpdate,
    /// `add` named a section that already existed; it was replaced in place.
    UpdatedFromAdd,
    /// `remove` named a section that did not exist.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedChange {
    pub section: String,
    pub kind: AppliedKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    pub document: String,
    pub applied: Vec<AppliedChange>,
    pub anomalies: Vec<ParseAnomaly>,
}

/// Apply `fixes` to `current_doc` and return the rebuilt document.
pub fn apply_incremental_fixes(current_doc: &str, fixes: &ChangeSet) -> String {
    apply_with_report(current_doc, fixes).document
}

/// Like [`apply_incremental_fixes`], also reporting what each change did and any parse
/// anomalies found in `current_doc`.
pub fn apply_with_report(current_doc: &str, fixes: &ChangeSet) -> MergeOutcome {
    let parsed = parse_sections(current_doc);
    let mut sections = parsed.sections;
    let applied = fixes
        .iter()
        .map(|change| apply_change(&mut sections, change))
        .collect();

    MergeOutcome {
        document: render_sections(&sections),
        applied,
        anomalies: parsed.anomalies,
    }
}

fn apply_change(sections: &mut SectionMap, change: &DocumentationChange) -> AppliedChange {
    let name = change.section.trim();
    let kind = match change.change_type {
        ChangeType::Remove => match sections.remove(name) {
            Some(_) => AppliedKind::Removed,
            None => AppliedKind::Skipped,
        },
        ChangeType::Add | ChangeType::Update => {
            let content = change.updated_content.as_deref().unwrap_or_default();
            let added = sections.insert(name, section_body(name, content));
            match (change.change_type, added) {
                (ChangeType::Add, true) => AppliedKind::Added,
                (ChangeType::Add, false) => AppliedKind::UpdatedFromAdd,
                (_, true) => AppliedKind::AddedFromUpdate,
                (_, false) => AppliedKind::Updated,
            }
        }
    };
    AppliedChange {
        section: name.to_string(),
        kind,
    }
}

fn section_body(name: &str, content: &str) -> String {
    if name == PREAMBLE {
        return content.trim_end().to_string();
    }
    let content = strip_echoed_header(name, content).trim_end();
    if content.is_empty() {
        format!("## {name}\n")
    } else {
        format!("## {name}\n\n{content}\n")
    }
}

/// Drop leading copies of the section's own header line.
fn strip_echoed_header<'a>(name: &str, content: &'a str) -> &'a str {
    let mut rest = skip_blank_lines(content);
    loop {
        let (first, tail) = rest.split_once('\n').unwrap_or((rest, ""));
        if header_name(first) != Some(name) {
            return rest;
        }
        rest = skip_blank_lines(tail);
    }
}

fn skip_blank_lines(text: &str) -> &str {
    let mut rest = text;
    while let Some((line, tail)) = rest.split_once('\n') {
        if !line.trim().is_empty() {
            break;
        }
        rest = tail;
    }
    if rest.trim().is_empty() {
        ""
    } else {
        rest
    }
}
