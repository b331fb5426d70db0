use globset::GlobSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Concatenate every UTF-8 file under `root` (sorted by path) into one prompt context.
///
/// Files matching `exclude` (relative to `root`) and non-UTF-8 files are skipped. Each file
/// is introduced by a `// file: <relative path>` line.
pub fn collect_module_context(root: &Path, exclude: &GlobSet) -> std::io::Result<String> {
    collect_module_context_excluding(root, exclude, &[])
}

/// Like [`collect_module_context`], also skipping the given files (e.g. the module's own docs).
pub fn collect_module_context_excluding(
    root: &Path,
    exclude: &GlobSet,
    skip: &[&Path],
) -> std::io::Result<String> {
    let skip: Vec<PathBuf> = skip
        .iter()
        .filter_map(|path| path.canonicalize().ok())
        .collect();
    let mut out = String::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::other)?;
        if !entry.file_type().is_file() {
            continue;
        }
        if !skip.is_empty()
            && entry
                .path()
                .canonicalize()
                .is_ok_and(|path| skip.contains(&path))
        {
            continue;
        }
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let rel_display = rel.to_string_lossy().replace('\\', "/");
        if exclude.is_match(&rel_display) {
            continue;
        }
        let bytes = std::fs::read(entry.path())?;
        let Ok(text) = String::from_utf8(bytes) else {
            log::debug!("Skipping non-UTF-8 file {}", entry.path().display());
            continue;
        };
        out.push_str("// file: ");
        out.push_str(&rel_display);
        out.push('\n');
        out.push_str(&text);
        if !text.ends_with('\n') {
            out.push('\n');
        }
    }
    Ok(out)
}
