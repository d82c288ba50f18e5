#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use std::io::Write;
use std::path::PathBuf;

use mdlingo::app_config::{Config, LogLevel};
use mdlingo::app_controller::{Controller, FileOutcome};

/// CLI wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

/// Options shared by every command that talks to the model
#[derive(Args, Debug)]
struct CommonArgs {
    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code or name (e.g., 'en', 'deu', 'French')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code or name (e.g., 'en', 'deu', 'French')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// Markdown file or directory to translate
    #[arg(value_name = "INPUT")]
    input_path: PathBuf,

    /// Output file (single-file input only)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Overwrite existing outputs that were not produced by mdlingo
    #[arg(short, long)]
    force_overwrite: bool,

    /// Skip the critic review of each translation
    #[arg(long)]
    no_review: bool,

    /// Translate every section, ignoring the previous output
    #[arg(long)]
    no_incremental: bool,

    /// Do not give section prompts a document summary
    #[arg(long)]
    no_summary: bool,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a markdown file or every markdown file of a directory
    Translate(TranslateArgs),

    /// Re-check a stored translation against its source with the critics
    Validate {
        /// Source markdown file
        source: PathBuf,

        /// Translated output of the source
        output: PathBuf,

        /// Remove the checksums of failed sections so they are translated again
        #[arg(long)]
        strip_failed: bool,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Add missing section checksums to an older translated output
    Retrofit {
        /// Source markdown file
        source: PathBuf,

        /// Translated output of the source
        output: PathBuf,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Generate shell completions for mdlingo
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// mdlingo - section-by-section markdown translation with a local LLM
#[derive(Parser, Debug)]
#[command(name = "mdlingo")]
#[command(version)]
#[command(about = "Incremental markdown translation through Ollama")]
#[command(long_about = "mdlingo splits markdown documents into sections, translates each one through an
Ollama model with a critic review, and only re-translates sections whose source changed.

EXAMPLES:
    mdlingo translate README.md                    # README.fr.md with the default config
    mdlingo translate -t de docs/                  # Every markdown file under docs/
    mdlingo translate -m qwen2.5:14b --no-review guide.md
    mdlingo validate guide.md guide.de.md --strip-failed
    mdlingo retrofit guide.md guide.de.md
    mdlingo completions bash > mdlingo.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger { level: LevelFilter::Trace }))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Load the config and apply command line overrides on top of it
fn load_config(common: &CommonArgs) -> Result<Config> {
    if let Some(level) = common.log_level {
        log::set_max_level(LogLevel::from(level).into());
    }

    let mut config = Config::load_or_create(&common.config_path)?;

    if let Some(model) = &common.model {
        config.translation.model = model.clone();
    }
    if let Some(source_language) = &common.source_language {
        config.source_language = source_language.clone();
    }
    if let Some(target_language) = &common.target_language {
        config.target_language = target_language.clone();
    }
    match common.log_level {
        Some(level) => config.log_level = level.into(),
        None => log::set_max_level(config.log_level.into()),
    }

    Ok(config)
}

/// Build the controller and cancel its token on Ctrl-C
fn controller_for(config: Config) -> Result<Controller> {
    config.validate().context("Configuration validation failed")?;

    let controller = Controller::with_config(config)?;
    let token = controller.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling the running translation");
            token.cancel();
        }
    });

    Ok(controller)
}

async fn run_translate(args: TranslateArgs) -> Result<()> {
    let mut config = load_config(&args.common)?;
    if args.no_review {
        config.translation.review = false;
    }
    if args.no_incremental {
        config.translation.incremental = false;
    }
    if args.no_summary {
        config.translation.summarize = false;
    }

    let controller = controller_for(config)?;

    if args.input_path.is_file() {
        match controller
            .run(&args.input_path, args.output.clone(), args.force_overwrite)
            .await?
        {
            FileOutcome::Translated { output, stats } => info!(
                "Wrote {} ({} sections, {} attempts)",
                output.display(),
                stats.sections,
                stats.attempts
            ),
            FileOutcome::Skipped { output } => warn!("Left {} untouched", output.display()),
        }
        Ok(())
    } else if args.input_path.is_dir() {
        if args.output.is_some() {
            return Err(anyhow!("--output cannot be used with a directory input"));
        }

        let summary = controller.run_folder(&args.input_path, args.force_overwrite).await?;
        for (file, reason) in &summary.failed {
            error!("{}: {}", file.display(), reason);
        }
        if summary.cancelled {
            return Err(anyhow!("Translation cancelled"));
        }
        if !summary.failed.is_empty() {
            return Err(anyhow!("{} document(s) failed to translate", summary.failed.len()));
        }
        Ok(())
    } else {
        Err(anyhow!("Input path does not exist: {:?}", args.input_path))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "mdlingo", &mut std::io::stdout());
            Ok(())
        }
        Commands::Translate(args) => run_translate(args).await,
        Commands::Validate {
            source,
            output,
            strip_failed,
            common,
        } => {
            let controller = controller_for(load_config(&common)?)?;
            let report = controller.validate(&source, &output, strip_failed).await?;

            for failed in &report.failed {
                warn!("{} ({}): {}", failed.checksum, failed.kind, failed.critique);
            }
            info!(
                "{} sections checked: {} passed, {} failed, {} unchecked, {} checksums stripped",
                report.total(),
                report.passed.len(),
                report.failed.len(),
                report.unchecked.len(),
                report.stripped
            );

            if report.is_clean() {
                Ok(())
            } else {
                Err(anyhow!("Validation found problems in {}", output.display()))
            }
        }
        Commands::Retrofit { source, output, common } => {
            let controller = Controller::with_config(load_config(&common)?)?;
            let added = controller.retrofit(&source, &output)?;
            info!("Added {} checksums to {}", added, output.display());
            Ok(())
        }
    }
}
