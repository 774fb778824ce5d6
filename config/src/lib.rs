//! `~/.shorten/config.toml` and the validated [`RunPlan`] built from it.
//!
//! Every section and field is optional in the file. Defaults are applied and
//! everything is validated once, in [`ShortenConfig::into_plan`]; components
//! receive the resulting plan by value and never consult the file again.

mod plan;

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::Deserialize;

pub use plan::{OnRemoteFailure, RunPlan};

/// Environment variable naming a config file to use instead of the default.
pub const CONFIG_ENV_VAR: &str = "SHORTEN_CONFIG";

#[derive(Debug, Default, Deserialize)]
pub struct ShortenConfig {
    pub paths: Option<PathsConfig>,
    pub model: Option<ModelConfig>,
    pub sampling: Option<SamplingConfig>,
    pub shorten: Option<ShortenSection>,
    pub retry: Option<RetrySection>,
    pub run: Option<RunConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("no API key: set [model] api_key or the OPENAI_API_KEY environment variable")]
    MissingApiKey,
    #[error("invalid configuration: {0}")]
    Invalid(#[from] shorten_types::ValidationError),
    #[error("invalid API settings: {0}")]
    Api(#[from] shorten_providers::ApiConfigError),
    #[error("no input directory: set [paths] input_dir or pass --input")]
    MissingInputDir,
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } => Some(path),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PathsConfig {
    pub input_dir: Option<String>,
    pub output_dir: Option<String>,
    pub output_prefix: Option<String>,
}

#[derive(Default, Deserialize)]
pub struct ModelConfig {
    pub name: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub token_budget: Option<usize>,
    pub prompt_reserve: Option<usize>,
    pub timeout_secs: Option<u64>,
}

// Manual Debug impl to prevent leaking the API key in logs.
impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("name", &self.name)
            .field(
                "api_key",
                &if self.api_key.is_some() { "[REDACTED]" } else { "None" },
            )
            .field("base_url", &self.base_url)
            .field("token_budget", &self.token_budget)
            .field("prompt_reserve", &self.prompt_reserve)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SamplingConfig {
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub presence_penalty: Option<f64>,
    pub frequency_penalty: Option<f64>,
}

/// `[shorten]`: the ratios and the number of passes.
#[derive(Debug, Default, Deserialize)]
pub struct ShortenSection {
    pub ratio: Option<f64>,
    pub previous_ratio: Option<f64>,
    pub next_ratio: Option<f64>,
    pub repeat: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RetrySection {
    pub max_retries: Option<u32>,
    pub initial_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub jitter: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RunConfig {
    pub on_remote_failure: Option<OnRemoteFailure>,
    pub max_concurrent_documents: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoggingConfig {
    /// Log file appended to alongside stderr.
    pub file: Option<String>,
}

/// Replace `${VAR}` with the variable's value; unset variables become empty.
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(open) = rest.find("${") {
        let Some(close) = rest[open + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..open]);
        let var = &rest[open + 2..open + 2 + close];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &rest[open + 2 + close + 1..];
    }

    out.push_str(rest);
    out
}

/// `~/` prefix resolved against the home directory.
pub(crate) fn expand_home(value: &str) -> PathBuf {
    match (value.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(value),
    }
}

/// Where the config comes from, and whether its absence is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConfigLocation {
    path: PathBuf,
    required: bool,
}

/// First match of: explicit path, `SHORTEN_CONFIG`, the default location.
pub(crate) fn resolve_location(
    explicit: Option<&Path>,
    from_env: Option<OsString>,
    default: Option<PathBuf>,
) -> Option<ConfigLocation> {
    if let Some(path) = explicit {
        return Some(ConfigLocation {
            path: path.to_path_buf(),
            required: true,
        });
    }
    if let Some(path) = from_env.filter(|value| !value.is_empty()) {
        return Some(ConfigLocation {
            path: PathBuf::from(path),
            required: true,
        });
    }
    default.map(|path| ConfigLocation {
        path,
        required: false,
    })
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".shorten").join("config.toml"))
}

impl ShortenConfig {
    /// Load the config, falling back to defaults when the default file is absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(location) =
            resolve_location(explicit, env::var_os(CONFIG_ENV_VAR), config_path())
        else {
            return Ok(Self::default());
        };
        if !location.required && !location.path.exists() {
            tracing::debug!(path = %location.path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::read(&location.path)
    }

    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| {
            tracing::warn!("Failed to read config at {}: {}", path.display(), source);
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::parse(&content, path)
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| {
            tracing::warn!("Failed to parse config at {}: {}", path.display(), source);
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Command-line paths win over the file.
    pub fn override_paths(&mut self, input_dir: Option<&Path>, output_dir: Option<&Path>) {
        let paths = self.paths.get_or_insert_with(PathsConfig::default);
        if let Some(dir) = input_dir {
            paths.input_dir = Some(dir.to_string_lossy().into_owned());
        }
        if let Some(dir) = output_dir {
            paths.output_dir = Some(dir.to_string_lossy().into_owned());
        }
    }
}
