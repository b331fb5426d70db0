use crate::validator::Severity;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// A single catalog entry: compiled, case-insensitive, word-boundary anchored.
#[derive(Debug)]
pub struct InjectionPattern {
    pub id: &'static str,
    pub description: &'static str,
    pub severity: Severity,
    regex: Regex,
}

impl InjectionPattern {
    /// First match in `text`, if any.
    pub fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.regex.find(text).map(|m| m.as_str())
    }
}

const EARLIER: &str = r"(?:(?:previous|prior|above|earlier|preceding)\s+)?";
const QUANTIFIER: &str = r"(?:(?:all|any|the|your|everything)\s+)?";

// Scan order is the order warnings are reported in.
static RAW_CATALOG: Lazy<Vec<(&'static str, &'static str, Severity, String)>> = Lazy::new(|| {
    vec![
        (
            "ignore_instructions",
            "Attempts to make the model ignore its instructions",
            Severity::High,
            format!(r"\bignore\s+{QUANTIFIER}{EARLIER}instructions?\b"),
        ),
        (
            "disregard_task",
            "Attempts to make the model disregard its task",
            Severity::High,
            format!(r"\bdisregard\s+{QUANTIFIER}{EARLIER}(?:instructions?|tasks?|prompts?|rules?)\b"),
        ),
        (
            "forget_prompts",
            "Attempts to make the model forget earlier prompts",
            Severity::High,
            format!(r"\bforget\s+{QUANTIFIER}{EARLIER}(?:instructions?|tasks?|prompts?|rules?)\b"),
        ),
        (
            "system_override",
            "Claims a system override",
            Severity::High,
            r"\bsystem\s+override\b".to_string(),
        ),
        (
            "important_instruction",
            "Frames text as an important instruction",
            Severity::High,
            r"\bimportant\s+instructions?\b".to_string(),
        ),
        (
            "critical_message",
            "Frames text as a critical message",
            Severity::High,
            r"\bcritical\s+message\b".to_string(),
        ),
        (
            "new_task",
            "Tries to assign a new task",
            Severity::High,
            r"\b(?:the\s+)?new\s+task\s+is\b".to_string(),
        ),
        (
            "real_objective",
            "Claims a hidden real objective",
            Severity::High,
            r"\breal\s+objective\b".to_string(),
        ),
        (
            "actual_goal",
            "Claims a hidden actual goal",
            Severity::High,
            r"\bactual\s+goal\b".to_string(),
        ),
        (
            "role_redefinition",
            "Tries to redefine the model's role",
            Severity::High,
            r"\byou\s+are\s+(?:now|actually)\b".to_string(),
        ),
        (
            "priority_framing",
            "Uses highest-priority framing",
            Severity::Medium,
            r"\bhighest\s+priority\b".to_string(),
        ),
        (
            "format_dictation",
            "Tries to dictate the response format",
            Severity::Medium,
            r"\b(?:respond|reply|answer|output)\s+(?:only\s+)?(?:with|in|using)\s+(?:(?:a|an|valid)\s+)?(?:json|yaml|xml)\b"
                .to_string(),
        ),
        (
            "role_marker",
            "Contains a bracketed pseudo-role marker",
            Severity::Medium,
            r"\[\s*(?:system|end|inst|assistant|user)\s*\]".to_string(),
        ),
    ]
});

static CATALOG: Lazy<Vec<InjectionPattern>> = Lazy::new(|| {
    RAW_CATALOG
        .iter()
        .filter_map(|(id, description, severity, pattern)| {
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .ok()?;
            Some(InjectionPattern {
                id: *id,
                description: *description,
                severity: *severity,
                regex,
            })
        })
        .collect()
});

/// The compiled pattern catalog, in scan order.
pub fn catalog() -> &'static [InjectionPattern] {
    &CATALOG
}
