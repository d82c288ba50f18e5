use anyhow::{Context, Result, anyhow};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use crate::document::DEFAULT_TRANSLATABLE_KEYS;
use crate::file_utils::FileManager;
use crate::language_utils::get_language_name;
use crate::translation::{SamplingOverrides, TranslateOptions};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Source language, ISO code or English name
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language, ISO code or English name
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranslationConfig {
    /// Model name as known to the Ollama server
    #[serde(default = "default_model")]
    pub model: String,

    /// Ollama server URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// HTTP-level retries for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff base for HTTP retries (in milliseconds), doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Context window passed to the model
    #[serde(default = "default_context_window")]
    pub context_window: u32,

    /// Attempt budget for every summary, frontmatter and section step
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Have a critic review every translation
    #[serde(default = "default_true")]
    pub review: bool,

    /// Give section prompts a summary of the whole document
    #[serde(default = "default_true")]
    pub summarize: bool,

    /// Reuse translations of unchanged sections from the previous output
    #[serde(default = "default_true")]
    pub incremental: bool,

    /// Sections translated at the same time
    #[serde(default = "default_concurrent_sections")]
    pub concurrent_sections: usize,

    /// Frontmatter keys whose values are translated
    #[serde(default = "default_frontmatter_keys")]
    pub frontmatter_keys: Vec<String>,

    /// Markdown banner placed ahead of every translated document
    #[serde(default)]
    pub prepend: Option<String>,

    /// Sampling overrides keyed by prompt category (e.g. `article_worker`)
    #[serde(default)]
    pub sampling: SamplingOverrides,

    /// Give up on a document after this many seconds
    #[serde(default)]
    pub deadline_secs: Option<u64>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            context_window: default_context_window(),
            max_attempts: default_max_attempts(),
            review: true,
            summarize: true,
            incremental: true,
            concurrent_sections: default_concurrent_sections(),
            frontmatter_keys: default_frontmatter_keys(),
            prepend: None,
            sampling: SamplingOverrides::new(),
            deadline_secs: None,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "fr".to_string()
}

fn default_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_context_window() -> u32 {
    8192
}

fn default_max_attempts() -> usize {
    5
}

fn default_concurrent_sections() -> usize {
    4
}

fn default_frontmatter_keys() -> Vec<String> {
    DEFAULT_TRANSLATABLE_KEYS.iter().map(|k| k.to_string()).collect()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load the configuration at `path`, creating it with defaults when missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path).with_context(|| format!("Failed to open config file: {:?}", path))?;
            let config: Config = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            return Ok(config);
        }

        warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).context("Failed to serialize default config to JSON")?;
        FileManager::write_to_file(path, &json)?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        get_language_name(&self.source_language).context("Invalid source language")?;
        get_language_name(&self.target_language).context("Invalid target language")?;

        let translation = &self.translation;
        if translation.model.trim().is_empty() {
            return Err(anyhow!("A model name is required"));
        }
        if translation.endpoint.trim().is_empty() {
            return Err(anyhow!("An endpoint is required"));
        }
        if translation.max_attempts == 0 {
            return Err(anyhow!("max_attempts must be at least 1"));
        }
        if translation.concurrent_sections == 0 {
            return Err(anyhow!("concurrent_sections must be at least 1"));
        }
        if translation.context_window == 0 {
            return Err(anyhow!("context_window must be greater than 0"));
        }
        if let Some(unknown) = translation
            .sampling
            .categories()
            .find(|name| crate::translation::PromptKind::from_name(name).is_none())
        {
            return Err(anyhow!("Unknown sampling category: {}", unknown));
        }

        Ok(())
    }

    /// Options for translating one document with this configuration
    pub fn translate_options(&self) -> Result<TranslateOptions> {
        let translation = &self.translation;
        Ok(TranslateOptions {
            context_window: translation.context_window,
            max_attempts: translation.max_attempts,
            review: translation.review,
            summarize: translation.summarize,
            incremental: translation.incremental,
            concurrent_sections: translation.concurrent_sections,
            frontmatter_keys: translation.frontmatter_keys.clone(),
            prepend: translation.prepend.clone(),
            sampling: translation.sampling.clone(),
            deadline: translation.deadline_secs.map(Duration::from_secs),
            ..TranslateOptions::new(
                &translation.model,
                get_language_name(&self.source_language)?,
                get_language_name(&self.target_language)?,
            )
        })
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            translation: TranslationConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
