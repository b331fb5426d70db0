use crate::llm::StructuredDoc;
use docdrift_markdown::{render_sections, SectionMap, PREAMBLE};

/// Turns a generated document into markdown.
///
/// The `## ` header text emitted here is what later merges match sections by, so it must
/// stay stable between generations.
pub trait DocFormatter: Send + Sync {
    fn format(&self, doc: &StructuredDoc) -> String;
}

/// `# {title}` followed by one `## {heading}` block per section.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownFormatter;

impl DocFormatter for MarkdownFormatter {
    fn format(&self, doc: &StructuredDoc) -> String {
        let mut sections = SectionMap::new();
        let title = doc.title.trim();
        if !title.is_empty() {
            sections.insert(PREAMBLE, format!("# {title}\n"));
        }
        for section in &doc.sections {
            let heading = section.heading.trim();
            if heading.is_empty() {
                continue;
            }
            sections.insert(heading, format!("## {heading}\n\n{}\n", section.body.trim()));
        }
        render_sections(&sections)
    }
}
