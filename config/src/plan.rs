use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use shorten_context::{BudgetPlan, DEFAULT_PROMPT_RESERVE};
use shorten_providers::retry::RetryConfig;
use shorten_providers::{ApiConfig, DEFAULT_REQUEST_TIMEOUT, OPENAI_API_BASE_URL};
use shorten_types::{ApiKey, SamplingParams, ShortenRequest, ValidationError};

use crate::{ConfigError, ShortenConfig, expand_env_vars, expand_home};

const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_TOKEN_BUDGET: usize = 4096;
const DEFAULT_OUTPUT_DIR: &str = "shortened";
const DEFAULT_SHORTEN_RATIO: f64 = 0.5;
const DEFAULT_CONTEXT_RATIO: f64 = 0.2;

/// What a failed remote rewrite ends.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OnRemoteFailure {
    /// Report the document as not shortened and go on with the next one.
    #[default]
    SkipDocument,
    /// Schedule no further documents; the run exits non-zero.
    AbortRun,
}

impl OnRemoteFailure {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SkipDocument => "skip_document",
            Self::AbortRun => "abort_run",
        }
    }
}

/// Fully validated settings for one batch run.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub output_prefix: String,
    pub model: String,
    pub request: ShortenRequest,
    pub prompt_reserve: usize,
    pub budget: BudgetPlan,
    pub sampling: SamplingParams,
    pub repeat: NonZeroUsize,
    pub on_remote_failure: OnRemoteFailure,
    pub max_concurrent_documents: NonZeroUsize,
    pub log_file: Option<PathBuf>,
    api_key: Option<ApiKey>,
    base_url: String,
    timeout: Duration,
    retry: RetryConfig,
}

impl RunPlan {
    /// Remote settings. Only needed when documents are actually rewritten,
    /// so a missing key is reported here rather than at load time.
    pub fn api_config(&self) -> Result<ApiConfig, ConfigError> {
        let key = self.api_key.clone().ok_or(ConfigError::MissingApiKey)?;
        Ok(ApiConfig::new(key, &self.base_url)?
            .with_timeout(self.timeout)
            .with_retry(self.retry.clone()))
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// The configured key, or the environment's when the config has none.
pub(crate) fn resolve_api_key(configured: Option<&str>, from_env: Option<String>) -> Option<ApiKey> {
    configured
        .and_then(ApiKey::new)
        .or_else(|| from_env.and_then(ApiKey::new))
}

fn expanded(value: Option<&String>) -> Option<String> {
    value
        .map(|v| expand_env_vars(v))
        .filter(|v| !v.trim().is_empty())
}

impl ShortenConfig {
    /// Apply defaults and validate into a [`RunPlan`].
    pub fn into_plan(self) -> Result<RunPlan, ConfigError> {
        let paths = self.paths.unwrap_or_default();
        let model = self.model.unwrap_or_default();
        let sampling = self.sampling.unwrap_or_default();
        let shorten = self.shorten.unwrap_or_default();
        let retry = self.retry.unwrap_or_default();
        let run = self.run.unwrap_or_default();
        let logging = self.logging.unwrap_or_default();

        let input_dir = expanded(paths.input_dir.as_ref())
            .map(|dir| expand_home(&dir))
            .ok_or(ConfigError::MissingInputDir)?;
        let output_dir = expand_home(
            &expanded(paths.output_dir.as_ref()).unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string()),
        );
        let output_prefix = paths
            .output_prefix
            .as_deref()
            .map(expand_env_vars)
            .unwrap_or_default();

        let request = ShortenRequest::new(
            shorten.ratio.unwrap_or(DEFAULT_SHORTEN_RATIO),
            shorten.previous_ratio.unwrap_or(DEFAULT_CONTEXT_RATIO),
            shorten.next_ratio.unwrap_or(DEFAULT_CONTEXT_RATIO),
            model.token_budget.unwrap_or(DEFAULT_TOKEN_BUDGET),
        )?;
        let prompt_reserve = model.prompt_reserve.unwrap_or(DEFAULT_PROMPT_RESERVE);
        let budget = BudgetPlan::new(&request, prompt_reserve)?;
        let repeat =
            NonZeroUsize::new(shorten.repeat.unwrap_or(1)).ok_or(ValidationError::ZeroRepeat)?;
        let max_concurrent_documents = NonZeroUsize::new(run.max_concurrent_documents.unwrap_or(1))
            .ok_or(ValidationError::ZeroConcurrency)?;

        let defaults = SamplingParams::default();
        let sampling = SamplingParams {
            temperature: sampling.temperature.unwrap_or(defaults.temperature),
            top_p: sampling.top_p.unwrap_or(defaults.top_p),
            presence_penalty: sampling.presence_penalty.unwrap_or(defaults.presence_penalty),
            frequency_penalty: sampling.frequency_penalty.unwrap_or(defaults.frequency_penalty),
        };

        let retry_defaults = RetryConfig::default();
        let retry = RetryConfig {
            max_retries: retry.max_retries.unwrap_or(retry_defaults.max_retries),
            initial_delay: retry
                .initial_delay_ms
                .map_or(retry_defaults.initial_delay, Duration::from_millis),
            max_delay: retry
                .max_delay_ms
                .map_or(retry_defaults.max_delay, Duration::from_millis),
            jitter_factor: retry
                .jitter
                .map_or(retry_defaults.jitter_factor, |j| j.clamp(0.0, 1.0)),
        };

        let api_key = resolve_api_key(
            expanded(model.api_key.as_ref()).as_deref(),
            std::env::var(ApiKey::ENV_VAR).ok(),
        );

        Ok(RunPlan {
            input_dir,
            output_dir,
            output_prefix,
            model: expanded(model.name.as_ref()).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            request,
            prompt_reserve,
            budget,
            sampling,
            repeat,
            on_remote_failure: run.on_remote_failure.unwrap_or_default(),
            max_concurrent_documents,
            log_file: expanded(logging.file.as_ref()).map(|file| expand_home(&file)),
            api_key,
            base_url: expanded(model.base_url.as_ref())
                .unwrap_or_else(|| OPENAI_API_BASE_URL.to_string()),
            timeout: model
                .timeout_secs
                .map_or(DEFAULT_REQUEST_TIMEOUT, Duration::from_secs),
            retry,
        })
    }
}
