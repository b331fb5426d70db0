use docdrift_markdown::MergeError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WorkflowError>;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM command is not configured")]
    NotConfigured,

    #[error("Failed to launch LLM command '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("LLM command exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("LLM response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid exclude pattern '{pattern}': {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum WorkflowError {
    /// No documentation exists yet: first generation is needed, not a repair.
    #[error("No documentation found for module '{module}'; generate it first")]
    MissingDocumentation { module: String },

    #[error("Documentation drift detected for module '{module}': {rationale}")]
    DriftDetected { module: String, rationale: String },

    #[error("LLM returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),
}

impl WorkflowError {
    /// `true` for the two outcomes that mean "documentation needs attention".
    pub fn needs_documentation_work(&self) -> bool {
        matches!(
            self,
            Self::MissingDocumentation { .. } | Self::DriftDetected { .. }
        )
    }
}
