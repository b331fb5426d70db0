//! # Docdrift Markdown
//!
//! Surgical, section-level updates to generated markdown documentation.
//!
//! ## Model
//!
//! A document is an ordered map from `## ` header text to the verbatim block under it
//! (header line included). Content before the first header is kept under [`PREAMBLE`].
//!
//! ```text
//! current_doc ──> parse_sections ──> SectionMap ──> apply ChangeSet ──> render_sections
//!                                     (ordered)       add/update/remove     (normalized)
//! ```
//!
//! Untouched sections keep their position; new sections are appended in change order.
//!
//! ## Example
//!
//! ```rust
//! use docdrift_markdown::{apply_incremental_fixes, ChangeSet, DocumentationChange};
//!
//! let doc = "# Module\n\n## Purpose\n\nOld.\n\n## Usage\n\nRun it.\n";
//! let fixes = ChangeSet::new(vec![DocumentationChange::update("Purpose", "New.")]).unwrap();
//!
//! let updated = apply_incremental_fixes(doc, &fixes);
//! assert_eq!(updated, "# Module\n\n## Purpose\n\nNew.\n\n## Usage\n\nRun it.\n");
//! ```

mod change;
mod error;
mod merge;
mod sections;

pub use change::{ChangeSet, ChangeType, DocumentationChange};
pub use error::{MergeError, Result};
pub use merge::{apply_incremental_fixes, apply_with_report, AppliedChange, AppliedKind, MergeOutcome};
pub use sections::{
    header_name, parse_sections, render_sections, ParseAnomaly, ParsedDocument, Section,
    SectionMap, PREAMBLE,
};
