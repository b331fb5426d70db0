use crate::error::ConfigError;
use crate::workflow::WorkflowOptions;
use docdrift_cache::DEFAULT_MAX_ENTRIES;
use docdrift_guard::DEFAULT_CODE_SAMPLE_SIZE;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "docdrift.toml";
pub const DEFAULT_CACHE_PATH: &str = ".docdrift/cache.json";
const DEFAULT_MAX_PARALLEL: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftConfig {
    pub cache_path: PathBuf,
    pub cache_max_entries: usize,
    pub llm_command: Vec<String>,
    pub model: Option<String>,
    pub custom_prompt: Option<String>,
    pub exclude: Vec<String>,
    pub code_sample_size: usize,
    pub max_parallel: usize,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            cache_max_entries: DEFAULT_MAX_ENTRIES,
            llm_command: Vec::new(),
            model: None,
            custom_prompt: None,
            exclude: vec![".git/**".to_string(), "target/**".to_string()],
            code_sample_size: DEFAULT_CODE_SAMPLE_SIZE,
            max_parallel: DEFAULT_MAX_PARALLEL,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    cache: Option<RawCache>,
    llm: Option<RawLlm>,
    prompts: Option<RawPrompts>,
    scan: Option<RawScan>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCache {
    path: Option<PathBuf>,
    max_entries: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLlm {
    command: Option<Vec<String>>,
    model: Option<String>,
    max_parallel: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPrompts {
    custom: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScan {
    exclude: Option<Vec<String>>,
    code_sample_size: Option<usize>,
}

impl DriftConfig {
    /// Load a TOML config. A relative cache path is resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&raw, path)?;
        if config.cache_path.is_relative() {
            if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                config.cache_path = base.join(&config.cache_path);
            }
        }
        Ok(config)
    }

    /// Load `explicit` if given (it must exist), else `docdrift.toml` in the working
    /// directory when present, else defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            return Self::load(fallback);
        }
        Ok(Self::default())
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Self::parse(raw, Path::new("<inline>"))
    }

    fn parse(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let defaults = Self::default();
        let cache = raw.cache.unwrap_or_default();
        let llm = raw.llm.unwrap_or_default();
        let prompts = raw.prompts.unwrap_or_default();
        let scan = raw.scan.unwrap_or_default();

        let config = Self {
            cache_path: cache.path.unwrap_or(defaults.cache_path),
            cache_max_entries: cache.max_entries.unwrap_or(defaults.cache_max_entries),
            llm_command: llm.command.unwrap_or(defaults.llm_command),
            model: llm.model.filter(|m| !m.trim().is_empty()),
            custom_prompt: prompts.custom.filter(|p| !p.trim().is_empty()),
            exclude: scan.exclude.unwrap_or(defaults.exclude),
            code_sample_size: scan.code_sample_size.unwrap_or(defaults.code_sample_size),
            max_parallel: llm.max_parallel.unwrap_or(defaults.max_parallel),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.code_sample_size == 0 {
            return Err(ConfigError::Invalid(
                "scan.code_sample_size must be > 0".to_string(),
            ));
        }
        if self.max_parallel == 0 {
            return Err(ConfigError::Invalid(
                "llm.max_parallel must be > 0".to_string(),
            ));
        }
        self.exclude_set().map(|_| ())
    }

    pub fn exclude_set(&self) -> Result<GlobSet, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude {
            let glob = Glob::new(pattern).map_err(|source| ConfigError::Glob {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        builder.build().map_err(|source| ConfigError::Glob {
            pattern: self.exclude.join(", "),
            source,
        })
    }

    pub fn workflow_options(&self) -> WorkflowOptions {
        WorkflowOptions {
            custom_prompt: self.custom_prompt.clone(),
            code_sample_size: self.code_sample_size,
            max_parallel: self.max_parallel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_config_uses_defaults() {
        assert_eq!(
            DriftConfig::from_toml_str("").expect("config"),
            DriftConfig::default()
        );
    }

    #[test]
    fn parses_every_section() {
        let config = DriftConfig::from_toml_str(
            r#"
[cache]
path = "state/cache.json"
max_entries = 12

[llm]
command = ["my-llm", "--json"]
model = "m-2"
max_parallel = 2

[prompts]
custom = "Focus on the public API."

[scan]
exclude = ["**/*.lock"]
code_sample_size = 500
"#,
        )
        .expect("config");

        assert_eq!(config.cache_path, PathBuf::from("state/cache.json"));
        assert_eq!(config.cache_max_entries, 12);
        assert_eq!(config.llm_command, vec!["my-llm", "--json"]);
        assert_eq!(config.model.as_deref(), Some("m-2"));
        assert_eq!(config.custom_prompt.as_deref(), Some("Focus on the public API."));
        assert_eq!(config.code_sample_size, 500);
        assert_eq!(config.max_parallel, 2);

        let excludes = config.exclude_set().expect("globs");
        assert!(excludes.is_match("Cargo.lock"));
        assert!(excludes.is_match("nested/dir/yarn.lock"));
        assert!(!excludes.is_match("src/lib.rs"));
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = DriftConfig::from_toml_str("[cache]\nsize = 3\n").expect_err("unknown key");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn rejects_bad_globs_and_zero_sizes() {
        let err = DriftConfig::from_toml_str("[scan]\nexclude = [\"[\"]\n").expect_err("glob");
        assert!(matches!(err, ConfigError::Glob { .. }));

        let err = DriftConfig::from_toml_str("[scan]\ncode_sample_size = 0\n").expect_err("zero");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn relative_cache_path_follows_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[cache]\npath = \"c.json\"\n").expect("write");

        let config = DriftConfig::load(&path).expect("config");
        assert_eq!(config.cache_path, dir.path().join("c.json"));
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let err = DriftConfig::load_or_default(Some(Path::new("/no/such/docdrift.toml")))
            .expect_err("missing");
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
