use crate::change::ChangeType;
use thiserror::Error;

/// Result type for change-set construction
pub type Result<T> = std::result::Result<T, MergeError>;

/// Errors raised while validating a documentation change set
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// A change set must contain at least one change
    #[error("Empty change set: at least one documentation change is required")]
    EmptyChangeSet,

    /// Change targets a section with a blank name
    #[error("Change #{index} has an empty section name")]
    EmptySectionName { index: usize },

    /// `add` and `update` need content to write
    #[error("Change #{index} ({change_type}) for section '{section}' has no updated content")]
    MissingContent {
        index: usize,
        section: String,
        change_type: ChangeType,
    },
}
