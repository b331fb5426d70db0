//! Prompt templates. Untrusted text (code, existing docs, custom guidance) is always fenced.

const FENCE: &str = "`````";

fn fenced(label: &str, body: &str) -> String {
    format!("{label}:\n{FENCE}\n{}\n{FENCE}\n", body.trim_end())
}

fn guidance(custom_prompt: Option<&str>) -> String {
    match custom_prompt.map(str::trim).filter(|p| !p.is_empty()) {
        Some(prompt) => format!("\n## Additional guidance\n\n{prompt}\n"),
        None => String::new(),
    }
}

pub fn check_prompt(
    module: &str,
    context: &str,
    current_doc: &str,
    custom_prompt: Option<&str>,
) -> String {
    format!(
        "You review documentation for the module `{module}`.\n\
         Decide whether the documentation still matches the code. Report drift only for \
         claims that are wrong or missing, not for style.\n\
         Answer with `drift_detected` and a one-paragraph `rationale`.\n\n\
         {}\n{}{}",
        fenced("Code", context),
        fenced("Current documentation", current_doc),
        guidance(custom_prompt),
    )
}

pub fn generate_prompt(module: &str, context: &str, custom_prompt: Option<&str>) -> String {
    format!(
        "Write documentation for the module `{module}` from its code.\n\
         Return a `title` and an ordered list of `sections`, each with a `heading` and a \
         markdown `body` that does not repeat the heading.\n\n\
         {}{}",
        fenced("Code", context),
        guidance(custom_prompt),
    )
}

pub fn fix_prompt(
    module: &str,
    context: &str,
    current_doc: &str,
    rationale: &str,
    custom_prompt: Option<&str>,
) -> String {
    format!(
        "The documentation for the module `{module}` has drifted from the code.\n\
         Reason: {rationale}\n\n\
         Return the smallest list of `changes` that repairs it. Each change names a \
         `section` by its exact `## ` header text, a `change_type` (add, update or remove), \
         a `rationale`, and for add/update the new `updated_content` of that section.\n\
         Leave correct sections alone.\n\n\
         {}\n{}{}",
        fenced("Code", context),
        fenced("Current documentation", current_doc),
        guidance(custom_prompt),
    )
}
