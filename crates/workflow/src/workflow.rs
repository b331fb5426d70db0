use crate::error::{Result, WorkflowError};
use crate::format::{DocFormatter, MarkdownFormatter};
use crate::llm::{DocumentationDriftCheck, LlmClient};
use crate::prompts;
use docdrift_cache::{DriftCache, SnapshotLoad, SnapshotSave};
use docdrift_guard::{
    validate_code_context, validate_custom_prompt, ValidationResult, DEFAULT_CODE_SAMPLE_SIZE,
};
use docdrift_markdown::{apply_with_report, AppliedChange, ChangeSet};
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowOptions {
    pub custom_prompt: Option<String>,
    pub code_sample_size: usize,
    /// Upper bound on worker threads used by [`DriftWorkflow::check_all`].
    pub max_parallel: usize,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            custom_prompt: None,
            code_sample_size: DEFAULT_CODE_SAMPLE_SIZE,
            max_parallel: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Report only; drift and missing docs become errors.
    Check,
    /// Generate missing docs, repair drifted ones section by section.
    Fix,
    /// Always produce a fresh document.
    Regenerate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRequest {
    pub module: String,
    pub context: String,
    pub current_doc: Option<String>,
}

impl ModuleRequest {
    pub fn new(
        module: impl Into<String>,
        context: impl Into<String>,
        current_doc: Option<String>,
    ) -> Self {
        Self {
            module: module.into(),
            context: context.into(),
            current_doc,
        }
    }

    fn existing_doc(&self) -> Option<&str> {
        self.current_doc
            .as_deref()
            .filter(|doc| !doc.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DriftStatus {
    MissingDocumentation,
    UpToDate { rationale: String },
    Drifted { rationale: String },
}

/// Screening results attached to every outcome. Never blocks the workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScreeningReport {
    pub custom_prompt: ValidationResult,
    pub code_context: ValidationResult,
}

/// One entry of [`DriftWorkflow::check_all`].
#[derive(Debug)]
pub struct ModuleCheck {
    pub module: String,
    pub status: Result<DriftStatus>,
    pub screening: ValidationResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WorkflowAction {
    UpToDate { rationale: String },
    Generated { document: String },
    Repaired {
        document: String,
        rationale: String,
        applied: Vec<AppliedChange>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowOutcome {
    pub module: String,
    #[serde(flatten)]
    pub action: WorkflowAction,
    pub screening: ScreeningReport,
}

impl WorkflowOutcome {
    /// The document to write back, if this outcome produced one.
    pub fn document(&self) -> Option<&str> {
        match &self.action {
            WorkflowAction::UpToDate { .. } => None,
            WorkflowAction::Generated { document } | WorkflowAction::Repaired { document, .. } => {
                Some(document)
            }
        }
    }
}

/// Drift check and repair state machine.
///
/// ```text
///   ModuleRequest ──► assess ──► MissingDocumentation ──► (Fix) generate ──► Generated
///                        │
///                        ├──► Drifted ──► (Fix) propose_fixes ──► merge ──► Repaired
///                        │
///                        └──► UpToDate
/// ```
///
/// In [`Mode::Check`] the first two branches surface as [`WorkflowError`]s instead.
pub struct DriftWorkflow<L> {
    llm: L,
    cache: Arc<DriftCache<DocumentationDriftCheck>>,
    formatter: Box<dyn DocFormatter>,
    options: WorkflowOptions,
    custom_prompt_screening: ValidationResult,
}

impl<L: LlmClient> DriftWorkflow<L> {
    pub fn new(
        llm: L,
        cache: Arc<DriftCache<DocumentationDriftCheck>>,
        options: WorkflowOptions,
    ) -> Self {
        let custom_prompt_screening = options
            .custom_prompt
            .as_deref()
            .map(validate_custom_prompt)
            .unwrap_or_default();
        if custom_prompt_screening.is_high() {
            log::warn!(
                "Custom prompt looks like a prompt injection: {}",
                custom_prompt_screening.warnings.join("; ")
            );
        } else if custom_prompt_screening.is_suspicious {
            log::info!(
                "Custom prompt has {} suspicious phrase(s)",
                custom_prompt_screening.warnings.len()
            );
        }

        Self {
            llm,
            cache,
            formatter: Box::new(MarkdownFormatter),
            options,
            custom_prompt_screening,
        }
    }

    pub fn with_formatter(mut self, formatter: impl DocFormatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    pub fn cache(&self) -> &Arc<DriftCache<DocumentationDriftCheck>> {
        &self.cache
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    pub fn custom_prompt_screening(&self) -> &ValidationResult {
        &self.custom_prompt_screening
    }

    fn custom_prompt(&self) -> Option<&str> {
        self.options.custom_prompt.as_deref()
    }

    /// Screen the module's code context for instruction-like text. Never blocks.
    pub fn screen_context(&self, request: &ModuleRequest) -> ValidationResult {
        let screening = validate_code_context(&request.context, self.options.code_sample_size);
        if screening.is_suspicious {
            log::debug!(
                "Code context of '{}' contains instruction-like text: {}",
                request.module,
                screening.warnings.join("; ")
            );
        }
        screening
    }

    /// Decide whether the module's documentation is missing, drifted or up to date.
    ///
    /// Check results are memoized per `(context, document, model)`.
    pub fn assess(&self, request: &ModuleRequest) -> Result<DriftStatus> {
        let Some(doc) = request.existing_doc() else {
            return Ok(DriftStatus::MissingDocumentation);
        };
        self.check_drift(request, doc)
    }

    fn check_drift(&self, request: &ModuleRequest, doc: &str) -> Result<DriftStatus> {
        let key = self.cache.key(&request.context, doc, self.llm.model_id());
        let check = self.cache.get_or_compute(&key, || {
            log::debug!("Cache miss for '{}', asking the LLM", request.module);
            let prompt =
                prompts::check_prompt(&request.module, &request.context, doc, self.custom_prompt());
            let check = self.llm.check(&prompt)?;
            if check.rationale.trim().is_empty() {
                return Err(WorkflowError::InvalidResponse(format!(
                    "drift check for '{}' returned an empty rationale",
                    request.module
                )));
            }
            Ok(check)
        })?;

        Ok(if check.drift_detected {
            DriftStatus::Drifted {
                rationale: check.rationale,
            }
        } else {
            DriftStatus::UpToDate {
                rationale: check.rationale,
            }
        })
    }

    pub fn run(&self, request: &ModuleRequest, mode: Mode) -> Result<WorkflowOutcome> {
        let code_context = self.screen_context(request);
        let screening = ScreeningReport {
            custom_prompt: self.custom_prompt_screening.clone(),
            code_context,
        };

        let action = match (mode, request.existing_doc()) {
            (Mode::Regenerate, _) | (Mode::Fix, None) => self.generate(request)?,
            (Mode::Check, None) => {
                return Err(WorkflowError::MissingDocumentation {
                    module: request.module.clone(),
                })
            }
            (Mode::Check | Mode::Fix, Some(doc)) => match self.check_drift(request, doc)? {
                DriftStatus::UpToDate { rationale } => WorkflowAction::UpToDate { rationale },
                DriftStatus::Drifted { rationale } if mode == Mode::Check => {
                    return Err(WorkflowError::DriftDetected {
                        module: request.module.clone(),
                        rationale,
                    })
                }
                DriftStatus::Drifted { rationale } => self.repair(request, doc, rationale)?,
                DriftStatus::MissingDocumentation => self.generate(request)?,
            },
        };

        Ok(WorkflowOutcome {
            module: request.module.clone(),
            action,
            screening,
        })
    }

    fn generate(&self, request: &ModuleRequest) -> Result<WorkflowAction> {
        log::info!("Generating documentation for '{}'", request.module);
        let prompt =
            prompts::generate_prompt(&request.module, &request.context, self.custom_prompt());
        let doc = self.llm.generate(&prompt)?;
        if doc.title.trim().is_empty() && doc.sections.is_empty() {
            return Err(WorkflowError::InvalidResponse(format!(
                "generation for '{}' returned an empty document",
                request.module
            )));
        }
        Ok(WorkflowAction::Generated {
            document: self.formatter.format(&doc),
        })
    }

    fn repair(
        &self,
        request: &ModuleRequest,
        current_doc: &str,
        rationale: String,
    ) -> Result<WorkflowAction> {
        log::info!("Repairing documentation for '{}': {rationale}", request.module);
        let prompt = prompts::fix_prompt(
            &request.module,
            &request.context,
            current_doc,
            &rationale,
            self.custom_prompt(),
        );
        let fixes = self.llm.propose_fixes(&prompt)?;
        let changes = ChangeSet::new(fixes.changes)?;
        let outcome = apply_with_report(current_doc, &changes);
        for anomaly in &outcome.anomalies {
            log::warn!("'{}': {anomaly:?}", request.module);
        }
        Ok(WorkflowAction::Repaired {
            document: outcome.document,
            rationale,
            applied: outcome.applied,
        })
    }

    fn check_one(&self, request: &ModuleRequest) -> ModuleCheck {
        ModuleCheck {
            module: request.module.clone(),
            screening: self.screen_context(request),
            status: self.assess(request),
        }
    }

    /// Screen and assess many modules concurrently. Results come back in input order.
    pub fn check_all(&self, requests: &[ModuleRequest]) -> Vec<ModuleCheck> {
        let workers = self.options.max_parallel.clamp(1, requests.len().max(1));
        if workers == 1 {
            return requests.iter().map(|request| self.check_one(request)).collect();
        }

        let next = AtomicUsize::new(0);
        let slots: Mutex<Vec<Option<ModuleCheck>>> =
            Mutex::new((0..requests.len()).map(|_| None).collect());

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    scope.spawn(|| loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(request) = requests.get(index) else {
                            break;
                        };
                        let check = self.check_one(request);
                        slots.lock().unwrap_or_else(PoisonError::into_inner)[index] = Some(check);
                    })
                })
                .collect();
            for handle in handles {
                if let Err(panic) = handle.join() {
                    std::panic::resume_unwind(panic);
                }
            }
        });

        let slots = slots.into_inner().unwrap_or_else(PoisonError::into_inner);
        requests
            .iter()
            .zip(slots)
            .map(|(request, slot)| {
                slot.unwrap_or_else(|| ModuleCheck {
                    module: request.module.clone(),
                    status: Err(WorkflowError::InvalidResponse(format!(
                        "no result recorded for '{}'",
                        request.module
                    ))),
                    screening: ValidationResult::default(),
                })
            })
            .collect()
    }

    pub fn persist_cache(&self, path: &Path) -> SnapshotSave {
        let outcome = self.cache.save_to_disk(path);
        match &outcome {
            SnapshotSave::Saved { entries } => {
                log::debug!("Saved {entries} drift check(s) to {}", path.display())
            }
            SnapshotSave::Failed(reason) => {
                log::warn!("Could not save drift cache to {}: {reason}", path.display())
            }
        }
        outcome
    }

    pub fn restore_cache(&self, path: &Path) -> SnapshotLoad {
        let outcome = self.cache.load_from_disk(path);
        match &outcome {
            SnapshotLoad::Loaded { entries } => {
                log::debug!("Loaded {entries} drift check(s) from {}", path.display())
            }
            SnapshotLoad::Missing => log::debug!("No drift cache at {}", path.display()),
            SnapshotLoad::Unreadable(reason) | SnapshotLoad::Malformed(reason) => {
                log::warn!("Ignoring drift cache {}: {reason}", path.display())
            }
            SnapshotLoad::UnsupportedVersion(version) => log::warn!(
                "Ignoring drift cache {}: unsupported version {version}",
                path.display()
            ),
        }
        outcome
    }
}
