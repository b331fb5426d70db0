//! # Docdrift Workflow
//!
//! Decides whether a module's documentation has drifted from its code and, when asked,
//! repairs it section by section instead of regenerating it.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────────────┐
//! │ DriftConfig  │──►│ DriftWorkflow│──►│ LlmClient            │
//! │ (toml)       │   │  assess/run  │   │  check/generate/fix  │
//! └──────────────┘   └──────┬───────┘   └──────────────────────┘
//!                           │
//!        ┌──────────────────┼───────────────────┐
//!        ▼                  ▼                   ▼
//!   DriftCache         guard (screen)     markdown (merge)
//! ```
//!
//! The cache is owned by the caller and shared through an `Arc`, so several workflows
//! (or the threads of [`DriftWorkflow::check_all`]) reuse the same drift checks.
//!
//! ## Example
//!
//! ```no_run
//! use docdrift_cache::DriftCache;
//! use docdrift_workflow::{CommandLlm, DriftWorkflow, Mode, ModuleRequest, WorkflowOptions};
//! use std::sync::Arc;
//!
//! let llm = CommandLlm::new(&["my-llm".to_string()], Some("model-1")).unwrap();
//! let workflow = DriftWorkflow::new(llm, Arc::new(DriftCache::new(1000)), WorkflowOptions::default());
//! let request = ModuleRequest::new("cache", "fn get() {}", Some("# Cache\n".to_string()));
//! let outcome = workflow.run(&request, Mode::Fix).unwrap();
//! if let Some(doc) = outcome.document() {
//!     println!("{doc}");
//! }
//! ```

mod config;
mod context;
mod error;
mod format;
mod llm;
pub mod prompts;
mod workflow;

pub use config::{DriftConfig, DEFAULT_CACHE_PATH, DEFAULT_CONFIG_FILE};
pub use context::{collect_module_context, collect_module_context_excluding};
pub use error::{ConfigError, LlmError, Result, WorkflowError};
pub use format::{DocFormatter, MarkdownFormatter};
pub use llm::{
    CommandLlm, DocSection, DocumentationDriftCheck, DocumentationFixes, LlmClient,
    StructuredDoc, UNKNOWN_MODEL_ID,
};
pub use workflow::{
    DriftStatus, DriftWorkflow, Mode, ModuleCheck, ModuleRequest, ScreeningReport, WorkflowAction,
    WorkflowOptions, WorkflowOutcome,
};
