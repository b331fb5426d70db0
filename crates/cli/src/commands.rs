use crate::{ApplyArgs, CacheAction, CheckArgs, FixArgs, ScanArgs, SectionsArgs};
use anyhow::{bail, Context, Result};
use docdrift_cache::{DriftCache, SnapshotLoad};
use docdrift_guard::{validate_code_context, validate_custom_prompt};
use docdrift_markdown::{apply_with_report, parse_sections, ChangeSet, DocumentationChange, ParseAnomaly};
use docdrift_workflow::{
    collect_module_context_excluding, CommandLlm, DocumentationDriftCheck, DriftConfig, DriftStatus,
    DriftWorkflow, Mode, ModuleRequest, WorkflowAction,
};
use serde::Deserialize;
use serde_json::json;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DEFAULT_DOC_FILE: &str = "README.md";

fn load_config(path: Option<&Path>) -> Result<DriftConfig> {
    DriftConfig::load_or_default(path).context("Failed to load configuration")
}

fn build_workflow(config: &DriftConfig) -> Result<DriftWorkflow<CommandLlm>> {
    let llm = CommandLlm::new(&config.llm_command, config.model.as_deref())
        .context("Set [llm] command in docdrift.toml")?;
    let cache = Arc::new(DriftCache::new(config.cache_max_entries));
    let workflow = DriftWorkflow::new(llm, cache, config.workflow_options());
    workflow.restore_cache(&config.cache_path);
    Ok(workflow)
}

fn module_name(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string())
}

fn doc_path(module: &Path, doc: Option<&Path>) -> PathBuf {
    doc.map(Path::to_path_buf)
        .unwrap_or_else(|| module.join(DEFAULT_DOC_FILE))
}

fn module_request(config: &DriftConfig, module: &Path, doc: &Path) -> Result<ModuleRequest> {
    let exclude = config.exclude_set()?;
    let context = collect_module_context_excluding(module, &exclude, &[doc])
        .with_context(|| format!("Failed to read module {}", module.display()))?;
    if context.trim().is_empty() {
        log::warn!("No readable files under {}", module.display());
    }

    let current_doc = match fs::read_to_string(doc) {
        Ok(text) => Some(text),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to read {}", doc.display()));
        }
    };
    Ok(ModuleRequest::new(module_name(module), context, current_doc))
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_document(path: &Path, document: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, document).with_context(|| format!("Failed to write {}", path.display()))
}

pub(crate) fn run_check(args: CheckArgs, config: Option<&Path>) -> Result<()> {
    if args.doc.is_some() && args.modules.len() > 1 {
        bail!("--doc can only be used with a single module");
    }
    let config = load_config(config)?;
    let workflow = build_workflow(&config)?;

    let requests = args
        .modules
        .iter()
        .map(|module| module_request(&config, module, &doc_path(module, args.doc.as_deref())))
        .collect::<Result<Vec<_>>>()?;
    let results = workflow.check_all(&requests);
    workflow.persist_cache(&config.cache_path);

    let mut needs_work = 0;
    let mut failures = 0;
    let mut report = Vec::with_capacity(results.len());
    for check in &results {
        let module = &check.module;
        if check.screening.is_suspicious {
            log::warn!(
                "{module}: code contains instruction-like text: {}",
                check.screening.warnings.join("; ")
            );
        }
        match &check.status {
            Ok(DriftStatus::UpToDate { rationale }) => {
                if !args.json {
                    println!("ok       {module}: {rationale}");
                }
            }
            Ok(DriftStatus::Drifted { rationale }) => {
                needs_work += 1;
                if !args.json {
                    println!("drifted  {module}: {rationale}");
                }
            }
            Ok(DriftStatus::MissingDocumentation) => {
                needs_work += 1;
                if !args.json {
                    println!("missing  {module}");
                }
            }
            Err(err) => {
                failures += 1;
                log::error!("{module}: {err}");
            }
        }
        if args.json {
            let result = match &check.status {
                Ok(status) => json!(status),
                Err(err) => json!({ "status": "error", "error": err.to_string() }),
            };
            report.push(json!({
                "module": module,
                "result": result,
                "screening": check.screening,
            }));
        }
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if failures > 0 {
        bail!("{failures} module(s) could not be checked");
    }
    if needs_work > 0 {
        std::process::exit(1);
    }
    Ok(())
}

pub(crate) fn run_fix(args: FixArgs, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let workflow = build_workflow(&config)?;
    let doc = doc_path(&args.module, args.doc.as_deref());
    let request = module_request(&config, &args.module, &doc)?;

    let mode = if args.regenerate {
        Mode::Regenerate
    } else {
        Mode::Fix
    };
    let outcome = workflow.run(&request, mode);
    workflow.persist_cache(&config.cache_path);
    let outcome = outcome.with_context(|| format!("Failed to fix {}", request.module))?;

    match &outcome.action {
        WorkflowAction::UpToDate { rationale } => {
            println!("{}: up to date ({rationale})", outcome.module);
            return Ok(());
        }
        WorkflowAction::Generated { .. } => {
            log::info!("Generated documentation for {}", outcome.module);
        }
        WorkflowAction::Repaired { applied, .. } => {
            for change in applied {
                log::info!("{:?}: {}", change.kind, change.section);
            }
        }
    }

    if let Some(document) = outcome.document() {
        if args.dry_run {
            print!("{document}");
        } else {
            write_document(&doc, document)?;
            println!("Wrote {}", doc.display());
        }
    }
    Ok(())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ChangesFile {
    Bare(Vec<DocumentationChange>),
    Wrapped { changes: Vec<DocumentationChange> },
}

pub(crate) fn run_apply(args: ApplyArgs) -> Result<()> {
    let document = read_input(&args.doc)?;
    let raw = read_input(&args.changes)?;
    let changes = match serde_json::from_str::<ChangesFile>(&raw)
        .with_context(|| format!("Invalid change file {}", args.changes.display()))?
    {
        ChangesFile::Bare(changes) | ChangesFile::Wrapped { changes } => changes,
    };
    let changes = ChangeSet::new(changes).context("Invalid change set")?;

    let outcome = apply_with_report(&document, &changes);
    for anomaly in &outcome.anomalies {
        log::warn!("{}", describe_anomaly(anomaly));
    }
    for change in &outcome.applied {
        log::info!("{:?}: {}", change.kind, change.section);
    }

    if args.write {
        write_document(&args.doc, &outcome.document)?;
        log::info!("Wrote {}", args.doc.display());
    } else {
        print!("{}", outcome.document);
    }
    Ok(())
}

fn describe_anomaly(anomaly: &ParseAnomaly) -> String {
    match anomaly {
        ParseAnomaly::DuplicateHeader { name, line } => {
            format!("duplicate header '{name}' at line {line}, merged into the first one")
        }
    }
}

pub(crate) fn run_sections(args: SectionsArgs) -> Result<()> {
    let document = read_input(&args.doc)?;
    let parsed = parse_sections(&document);

    if args.json {
        let names: Vec<&str> = parsed.sections.names().collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "sections": names,
                "anomalies": parsed.anomalies,
            }))?
        );
        return Ok(());
    }

    for name in parsed.sections.names() {
        println!("{name}");
    }
    for anomaly in &parsed.anomalies {
        println!("! {}", describe_anomaly(anomaly));
    }
    Ok(())
}

pub(crate) fn run_scan(args: ScanArgs, config: Option<&Path>) -> Result<()> {
    let text = read_input(&args.input)?;
    let result = if args.code {
        let config = load_config(config)?;
        validate_code_context(&text, config.code_sample_size)
    } else {
        validate_custom_prompt(&text)
    };
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub(crate) fn run_cache(action: CacheAction, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let path = &config.cache_path;
    match action {
        CacheAction::Stats => {
            let cache: DriftCache<DocumentationDriftCheck> =
                DriftCache::new(config.cache_max_entries);
            let snapshot = match cache.load_from_disk(path) {
                SnapshotLoad::Loaded { .. } => "loaded".to_string(),
                SnapshotLoad::Missing => "missing".to_string(),
                SnapshotLoad::Unreadable(reason) => format!("unreadable: {reason}"),
                SnapshotLoad::Malformed(reason) => format!("malformed: {reason}"),
                SnapshotLoad::UnsupportedVersion(version) => {
                    format!("unsupported version {version}")
                }
            };
            let stats = cache.stats();
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "path": path.display().to_string(),
                    "snapshot": snapshot,
                    "size": stats.size,
                    "max_size": stats.max_size,
                }))?
            );
        }
        CacheAction::Clear => match fs::remove_file(path) {
            Ok(()) => println!("Cleared {}", path.display()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                println!("No cache at {}", path.display())
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to remove {}", path.display()))
            }
        },
    }
    Ok(())
}
