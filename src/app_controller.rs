use anyhow::{Context, Result, anyhow};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::app_config::Config;
use crate::document::parse_containers;
use crate::errors::TranslationError;
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::providers::{Ollama, Provider};
use crate::translation::{
    DocumentContext, ExistingTranslations, SummaryCache, TranslationOrchestrator, TranslationStats, load_existing,
    retrofit_checksums,
};
use crate::validation::{AuditReport, Validator};

// @module: Application controller for markdown translation

/// What happened to one input file
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// The output was written
    Translated {
        /// Output path
        output: PathBuf,
        /// Run counters
        stats: TranslationStats,
    },
    /// The output exists and was not produced by this tool, and overwriting was not forced
    Skipped {
        /// Output path
        output: PathBuf,
    },
}

/// Totals of a folder run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FolderSummary {
    /// Files translated
    pub translated: usize,
    /// Files skipped
    pub skipped: usize,
    /// Files that failed, with the error
    pub failed: Vec<(PathBuf, String)>,
    /// Whether the run was cancelled before every file was processed
    pub cancelled: bool,
}

/// Main application controller for markdown translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Text generation backend
    provider: Arc<dyn Provider>,
    // @field: Summary cache shared by every document of the run
    summaries: Arc<SummaryCache>,
    // @field: Cancels every running translation
    cancel: CancellationToken,
}

fn progress_style(unit: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}}",
            unit
        ))
        .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░")
}

impl Controller {
    // @method: Create a controller talking to the configured Ollama server
    pub fn with_config(config: Config) -> Result<Self> {
        let translation = &config.translation;
        let provider = Ollama::new_with_config(
            &translation.endpoint,
            translation.timeout_secs,
            translation.retry_count,
            translation.retry_backoff_ms,
        )
        .context("Failed to create the Ollama client")?;

        Ok(Self::with_provider(config, Arc::new(provider)))
    }

    // @method: Create a controller with an explicit provider
    pub fn with_provider(config: Config, provider: Arc<dyn Provider>) -> Self {
        Self {
            config,
            provider,
            summaries: Arc::new(SummaryCache::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// Token that cancels the run when triggered (e.g. on Ctrl-C)
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Default output path for a source document: `<stem>.<target>.md` next to it
    pub fn output_path_for(&self, input_file: &Path) -> Result<PathBuf> {
        let language = language_utils::short_code(&self.config.target_language)?;
        let dir = input_file.parent().unwrap_or(Path::new("."));
        Ok(FileManager::generate_output_path(input_file, dir, &language))
    }

    /// Translate a single document.
    ///
    /// An existing output is reused incrementally when it was produced by
    /// this tool; any other existing file is only overwritten with `force`.
    pub async fn run(&self, input_file: &Path, output_path: Option<PathBuf>, force: bool) -> Result<FileOutcome> {
        let multi_progress = MultiProgress::new();
        self.run_with_progress(input_file, output_path, &multi_progress, force).await
    }

    async fn run_with_progress(
        &self,
        input_file: &Path,
        output_path: Option<PathBuf>,
        multi_progress: &MultiProgress,
        force: bool,
    ) -> Result<FileOutcome> {
        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output = match output_path {
            Some(path) => path,
            None => self.output_path_for(input_file)?,
        };

        let previous = if FileManager::file_exists(&output) {
            Some(FileManager::read_to_string(&output)?)
        } else {
            None
        };

        if let Some(text) = &previous {
            if !force && !text.trim().is_empty() && parse_containers(text).is_empty() {
                warn!(
                    "Skipping {:?}, the output exists and was not written by mdlingo (use -f to overwrite)",
                    output
                );
                return Ok(FileOutcome::Skipped { output });
            }
        }

        let options = self.config.translate_options()?;
        let existing = if options.incremental && previous.is_some() {
            load_existing(&output)?
        } else {
            ExistingTranslations::new()
        };

        let raw = FileManager::read_to_string(input_file)?;
        info!("Translating {:?} to {}", input_file, options.target_language);

        let progress_bar = multi_progress.add(ProgressBar::new(0));
        progress_bar.set_style(progress_style("sections"));
        progress_bar.set_message(
            input_file
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_default(),
        );

        let pb = progress_bar.clone();
        let orchestrator = TranslationOrchestrator::new(Arc::clone(&self.provider))
            .with_summary_cache(Arc::clone(&self.summaries))
            .with_progress(Arc::new(move |done: usize, total: usize| {
                pb.set_length(total as u64);
                pb.set_position(done as u64);
            }));

        let result = orchestrator
            .translate_document(&raw, &options, &existing, &self.cancel)
            .await;
        progress_bar.finish_and_clear();

        let translated = result.with_context(|| format!("Failed to translate {:?}", input_file))?;
        FileManager::write_to_file(&output, &translated.output)?;

        info!(
            "Success: {} ({} generated, {} reused, {})",
            output.display(),
            translated.stats.generated,
            translated.stats.reused,
            Self::format_duration(translated.stats.duration)
        );

        Ok(FileOutcome::Translated {
            output,
            stats: translated.stats,
        })
    }

    /// Translate every markdown file under `input_dir`.
    ///
    /// A failed document is recorded and the run carries on with the next
    /// one; cancellation stops the run.
    pub async fn run_folder(&self, input_dir: &Path, force: bool) -> Result<FolderSummary> {
        let start_time = std::time::Instant::now();

        if !FileManager::dir_exists(input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let language = language_utils::short_code(&self.config.target_language)?;
        let files = FileManager::find_markdown_files(input_dir, &[language.as_str()])?;
        if files.is_empty() {
            return Err(anyhow!("No markdown files found in directory: {:?}", input_dir));
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(files.len() as u64));
        folder_pb.set_style(progress_style("files"));

        let mut summary = FolderSummary::default();
        for file in &files {
            let file_name = file
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            match self.run_with_progress(file, None, &multi_progress, force).await {
                Ok(FileOutcome::Translated { .. }) => summary.translated += 1,
                Ok(FileOutcome::Skipped { .. }) => summary.skipped += 1,
                Err(e) if matches!(e.downcast_ref::<TranslationError>(), Some(TranslationError::Cancelled)) => {
                    warn!("Translation cancelled, stopping folder run");
                    summary.cancelled = true;
                    break;
                }
                Err(e) => {
                    error!("Error processing file {}: {:#}", file_name, e);
                    summary.failed.push((file.clone(), format!("{:#}", e)));
                }
            }
            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");
        info!(
            "Folder processing completed in {}: {} translated, {} skipped, {} errors",
            Self::format_duration(start_time.elapsed()),
            summary.translated,
            summary.skipped,
            summary.failed.len()
        );

        Ok(summary)
    }

    /// Re-run the critics over a stored translation of `source_file`
    pub async fn validate(&self, source_file: &Path, output_file: &Path, strip_failed: bool) -> Result<AuditReport> {
        let source = FileManager::read_to_string(source_file)?;
        let options = self.config.translate_options()?;

        self.provider
            .ensure_model(&options.model)
            .await
            .with_context(|| format!("Model {} is not available", options.model))?;

        let context = DocumentContext::new(
            &options.model,
            &options.source_language,
            &options.target_language,
            options.context_window,
        )
        .with_sampling(options.sampling.clone());

        let report = Validator::new(Arc::clone(&self.provider), context)
            .with_concurrency(options.concurrent_sections)
            .audit(&source, output_file, options.prepend(), strip_failed)
            .await
            .with_context(|| format!("Failed to validate {:?}", output_file))?;

        Ok(report)
    }

    /// Add missing checksums to an older output of `source_file`
    pub fn retrofit(&self, source_file: &Path, output_file: &Path) -> Result<usize> {
        let source = FileManager::read_to_string(source_file)?;
        let prepend = self.config.translation.prepend.as_deref().filter(|p| !p.trim().is_empty());
        let added = retrofit_checksums(&source, output_file, prepend)
            .with_context(|| format!("Failed to retrofit {:?}", output_file))?;
        Ok(added)
    }

    // Format duration in a human-readable format (HH:MM:SS)
    pub fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
