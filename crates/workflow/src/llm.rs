use crate::error::LlmError;
use docdrift_markdown::DocumentationChange;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::Arc;

/// Model id used by adapters that were not told which model they talk to.
pub const UNKNOWN_MODEL_ID: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationDriftCheck {
    pub drift_detected: bool,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocSection {
    pub heading: String,
    pub body: String,
}

/// Full documentation as produced by a generation call, before formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredDoc {
    pub title: String,
    #[serde(default)]
    pub sections: Vec<DocSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationFixes {
    pub changes: Vec<DocumentationChange>,
}

/// The LLM collaborator. Every call is treated as a pure function of its prompt and
/// [`LlmClient::model_id`].
pub trait LlmClient: Send + Sync {
    /// Identifier that separates cache entries produced by different models.
    fn model_id(&self) -> &str;

    fn check(&self, prompt: &str) -> Result<DocumentationDriftCheck, LlmError>;

    fn generate(&self, prompt: &str) -> Result<StructuredDoc, LlmError>;

    fn propose_fixes(&self, prompt: &str) -> Result<DocumentationFixes, LlmError>;
}

impl<T: LlmClient + ?Sized> LlmClient for Arc<T> {
    fn model_id(&self) -> &str {
        (**self).model_id()
    }

    fn check(&self, prompt: &str) -> Result<DocumentationDriftCheck, LlmError> {
        (**self).check(prompt)
    }

    fn generate(&self, prompt: &str) -> Result<StructuredDoc, LlmError> {
        (**self).generate(prompt)
    }

    fn propose_fixes(&self, prompt: &str) -> Result<DocumentationFixes, LlmError> {
        (**self).propose_fixes(prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Operation {
    Check,
    Generate,
    Fix,
}

#[derive(Serialize)]
struct CommandRequest<'a> {
    operation: Operation,
    model: &'a str,
    prompt: &'a str,
}

/// Adapter that delegates every call to an external program.
///
/// The program receives `{"operation", "model", "prompt"}` as JSON on stdin and must print
/// the JSON response on stdout and exit 0.
#[derive(Debug, Clone)]
pub struct CommandLlm {
    program: String,
    args: Vec<String>,
    model_id: String,
}

impl CommandLlm {
    pub fn new(command: &[String], model: Option<&str>) -> Result<Self, LlmError> {
        let (program, args) = command.split_first().ok_or(LlmError::NotConfigured)?;
        if program.trim().is_empty() {
            return Err(LlmError::NotConfigured);
        }
        let model_id = model
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(UNKNOWN_MODEL_ID)
            .to_string();
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            model_id,
        })
    }

    fn call<T: DeserializeOwned>(&self, operation: Operation, prompt: &str) -> Result<T, LlmError> {
        let request = serde_json::to_vec(&CommandRequest {
            operation,
            model: &self.model_id,
            prompt,
        })?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| LlmError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Feed stdin from a separate thread so a chatty child cannot deadlock on a full pipe.
        let writer = child.stdin.take().map(|mut stdin| {
            std::thread::spawn(move || {
                if let Err(err) = stdin.write_all(&request) {
                    log::debug!("LLM command did not consume its input: {err}");
                }
            })
        });

        let output = child.wait_with_output().map_err(|source| LlmError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        if let Some(writer) = writer {
            let _ = writer.join();
        }

        if !output.status.success() {
            return Err(LlmError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

impl LlmClient for CommandLlm {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn check(&self, prompt: &str) -> Result<DocumentationDriftCheck, LlmError> {
        self.call(Operation::Check, prompt)
    }

    fn generate(&self, prompt: &str) -> Result<StructuredDoc, LlmError> {
        self.call(Operation::Generate, prompt)
    }

    fn propose_fixes(&self, prompt: &str) -> Result<DocumentationFixes, LlmError> {
        self.call(Operation::Fix, prompt)
    }
}
