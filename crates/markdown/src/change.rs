use crate::error::{MergeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Add,
    Update,
    Remove,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Remove => "remove",
        })
    }
}

/// One targeted edit to a documentation section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationChange {
    /// Header text of the target section, without the `## ` marker.
    pub section: String,
    pub change_type: ChangeType,
    /// Free-text justification, kept for audit output.
    #[serde(default)]
    pub rationale: String,
    /// Required for `add`/`update`, ignored for `remove`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_content: Option<String>,
}

impl DocumentationChange {
    pub fn add(section: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_content(section, ChangeType::Add, content)
    }

    pub fn update(section: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_content(section, ChangeType::Update, content)
    }

    pub fn remove(section: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            change_type: ChangeType::Remove,
            rationale: String::new(),
            updated_content: None,
        }
    }

    #[must_use]
    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    fn with_content(section: impl Into<String>, change_type: ChangeType, content: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            change_type,
            rationale: String::new(),
            updated_content: Some(content.into()),
        }
    }
}

/// A validated, non-empty list of changes. The only input the merge accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChangeSet {
    changes: Vec<DocumentationChange>,
}

impl ChangeSet {
    pub fn new(changes: Vec<DocumentationChange>) -> Result<Self> {
        if changes.is_empty() {
            return Err(MergeError::EmptyChangeSet);
        }
        for (index, change) in changes.iter().enumerate() {
            if change.section.trim().is_empty() {
                return Err(MergeError::EmptySectionName { index });
            }
            if change.change_type != ChangeType::Remove && change.updated_content.is_none() {
                return Err(MergeError::MissingContent {
                    index,
                    section: change.section.clone(),
                    change_type: change.change_type,
                });
            }
        }
        Ok(Self { changes })
    }

    pub fn changes(&self) -> &[DocumentationChange] {
        &self.changes
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DocumentationChange> {
        self.changes.iter()
    }

    pub fn into_inner(self) -> Vec<DocumentationChange> {
        self.changes
    }
}

impl TryFrom<Vec<DocumentationChange>> for ChangeSet {
    type Error = MergeError;

    fn try_from(changes: Vec<DocumentationChange>) -> Result<Self> {
        Self::new(changes)
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a DocumentationChange;
    type IntoIter = std::slice::Iter<'a, DocumentationChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}
