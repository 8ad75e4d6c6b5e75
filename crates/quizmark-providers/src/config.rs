//! Configuration loading and factories.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quizmark_core::error::DEFAULT_MODEL;
use quizmark_core::oracle::OracleSettings;
use quizmark_core::progress::ScorePolicy;
use quizmark_core::traits::{ContentSource, LlmProvider};

use crate::content::{default_topics, FileContentSource, HttpContentSource, TopicEntry};
use crate::openai::{OpenAiProvider, DEFAULT_TIMEOUT_SECS};

/// Scoring oracle endpoint settings.
///
/// Note: Custom Debug impl masks the API key to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    #[serde(default)]
    pub api_key: String,
    /// Defaults to OpenRouter.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    /// Mirror raw oracle replies to the `quizmark::oracle_echo` log target.
    #[serde(default)]
    pub debug_echo: bool,
    #[serde(default = "default_oracle_timeout")]
    pub timeout_secs: u64,
    /// Sent as `HTTP-Referer`.
    #[serde(default)]
    pub referer: Option<String>,
    /// Sent as `X-Title`.
    #[serde(default)]
    pub title: Option<String>,
}

impl std::fmt::Debug for OracleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleConfig")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("debug_echo", &self.debug_echo)
            .field("timeout_secs", &self.timeout_secs)
            .field("referer", &self.referer)
            .field("title", &self.title)
            .finish()
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: None,
            model: default_model(),
            debug_echo: false,
            timeout_secs: default_oracle_timeout(),
            referer: None,
            title: None,
        }
    }
}

impl OracleConfig {
    pub fn settings(&self) -> OracleSettings {
        OracleSettings {
            model: self.model.clone(),
            debug_echo: self.debug_echo,
        }
    }
}

/// Where questions and set texts come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Base URL of the static content site.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Read documents from this directory instead of over HTTP.
    #[serde(default)]
    pub local_dir: Option<PathBuf>,
    #[serde(default = "default_topics")]
    pub topics: Vec<TopicEntry>,
    #[serde(default = "default_content_timeout")]
    pub timeout_secs: u64,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            local_dir: None,
            topics: default_topics(),
            timeout_secs: default_content_timeout(),
        }
    }
}

/// Top-level quizmark configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizConfig {
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub content: ContentConfig,
    /// Directory holding the persisted progress state.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Score ratio at or above which an attempt counts as passed.
    #[serde(default = "default_pass_ratio")]
    pub pass_ratio: f64,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_oracle_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_content_timeout() -> u64 {
    30
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./quizmark-data")
}
fn default_pass_ratio() -> f64 {
    0.8
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            oracle: OracleConfig::default(),
            content: ContentConfig::default(),
            data_dir: default_data_dir(),
            pass_ratio: default_pass_ratio(),
        }
    }
}

impl QuizConfig {
    pub fn policy(&self) -> ScorePolicy {
        ScorePolicy::new(self.pass_ratio)
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_opt(value: &mut Option<String>) {
    if let Some(v) = value {
        *v = resolve_env_vars(v);
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizmark.toml` in the current directory
/// 2. `~/.config/quizmark/config.toml`
///
/// Environment variable overrides: `QUIZMARK_API_KEY`, `QUIZMARK_MODEL`.
pub fn load_config() -> Result<QuizConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizmark.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match &config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizConfig::default(),
    };

    // Apply env var overrides
    if let Ok(key) = std::env::var("QUIZMARK_API_KEY") {
        config.oracle.api_key = key;
    }
    if let Ok(model) = std::env::var("QUIZMARK_MODEL") {
        if !model.trim().is_empty() {
            config.oracle.model = model;
        }
    }

    // Relative paths in a config file are relative to that file.
    if let Some(parent) = config_path.as_deref().and_then(Path::parent) {
        if let Some(dir) = config.content.local_dir.as_mut().filter(|d| d.is_relative()) {
            *dir = parent.join(&*dir);
        }
        if config.data_dir.is_relative() {
            config.data_dir = parent.join(&config.data_dir);
        }
    }

    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}

/// Parse a TOML string, resolve `${VAR}` references and check ranges.
pub fn parse_config(content: &str) -> Result<QuizConfig> {
    let mut config: QuizConfig = toml::from_str(content)?;

    config.oracle.api_key = resolve_env_vars(&config.oracle.api_key);
    resolve_opt(&mut config.oracle.base_url);
    resolve_opt(&mut config.oracle.referer);
    resolve_opt(&mut config.oracle.title);
    resolve_opt(&mut config.content.base_url);

    if !(config.pass_ratio > 0.0 && config.pass_ratio <= 1.0) {
        anyhow::bail!("pass_ratio must be in (0, 1], got {}", config.pass_ratio);
    }
    if config.oracle.model.trim().is_empty() {
        anyhow::bail!("oracle.model must not be empty");
    }
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizmark"))
}

/// Create the chat-completion provider from its configuration.
pub fn create_provider(config: &OracleConfig) -> Result<Arc<dyn LlmProvider>> {
    if config.api_key.is_empty() {
        tracing::warn!("no API key configured; oracle calls will likely be rejected");
    }
    let provider = OpenAiProvider::new(&config.api_key, config.base_url.clone(), config.timeout_secs)
        .context("failed to create oracle provider")?
        .with_attribution(config.referer.clone(), config.title.clone());
    Ok(Arc::new(provider))
}

/// Create the content source: a local directory when configured, HTTP
/// otherwise.
pub fn create_content_source(config: &ContentConfig) -> Result<Arc<dyn ContentSource>> {
    match &config.local_dir {
        Some(dir) => Ok(Arc::new(FileContentSource::new(
            dir.clone(),
            config.topics.clone(),
        ))),
        None => {
            let source = HttpContentSource::new(
                config.base_url.clone(),
                config.topics.clone(),
                config.timeout_secs,
            )
            .context("failed to create content source")?;
            Ok(Arc::new(source))
        }
    }
}
