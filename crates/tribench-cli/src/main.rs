//! tribench CLI - Command-line interface
//!
//! Usage:
//!   tribench run [--config tribench.toml] [--versions 243,263] [--languages de,en,zh]
//!   tribench extract --input gold.txt --output out.txt --version 243
//!   tribench models
//!   tribench check <gold file>

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tribench_core::config::{parse_languages, parse_versions};
use tribench_core::{AppConfig, LoggingConfig};
use tribench_eval::{
    load_sentences, prepare_benchmark_output, AggregateOptions, Orchestrator, TaskParams,
};
use tribench_extractor::ModelRegistry;

const DEFAULT_CONFIG: &str = "tribench.toml";

#[derive(Parser)]
#[command(name = "tribench")]
#[command(about = "Triplet extraction benchmark runner")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./tribench.toml when present)
    #[arg(short, long, global = true, env = "TRIBENCH_CONFIG")]
    config: Option<PathBuf>,

    /// Model to evaluate
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Keep only the most frequent relation per sentence
    #[arg(long, global = true)]
    most_common: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every configured checkpoint version and language
    Run {
        /// Comma-separated checkpoint versions
        #[arg(long)]
        versions: Option<String>,
        /// Comma-separated language codes
        #[arg(long)]
        languages: Option<String>,
        /// Resolve relative path templates against this directory
        #[arg(long)]
        base_dir: Option<PathBuf>,
        /// Do not write system outputs
        #[arg(long)]
        no_save: bool,
        /// Hide progress bars
        #[arg(long)]
        no_progress: bool,
        /// Write a JSON run report
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Run one model over one gold file, without fallback
    Extract {
        /// Gold annotation file
        #[arg(short, long)]
        input: PathBuf,
        /// System output file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Checkpoint version
        #[arg(long)]
        version: u32,
        /// Language code, only used in messages
        #[arg(long, default_value = "en")]
        language: String,
    },
    /// List registered models
    Models,
    /// Parse a gold annotation file and report its sentences
    Check {
        /// Gold annotation file
        path: PathBuf,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG).is_file() => AppConfig::from_file(DEFAULT_CONFIG)?,
        None => AppConfig::default(),
    };
    let mut config = config.with_env_override()?;

    if let Some(model) = &cli.model {
        config.model.name = model.clone();
    }
    if cli.most_common {
        config.model.most_common = true;
    }
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(logging.include_location)
        .with_line_number(logging.include_location);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(&cli)?;
    init_tracing(&config.logging);

    let registry = ModelRegistry::builtin();

    match cli.command {
        Commands::Run {
            versions,
            languages,
            base_dir,
            no_save,
            no_progress,
            report,
        } => {
            if let Some(versions) = versions {
                config.run.versions = parse_versions(&versions)?;
            }
            if let Some(languages) = languages {
                config.run.languages = parse_languages(&languages);
            }
            if let Some(base) = base_dir {
                config.run = config.run.rooted_at(&base);
            }
            config.run.save_output &= !no_save;
            config.run.progress &= !no_progress;
            config.validate()?;
            tracing::debug!(
                model = %config.model.name,
                versions = ?config.run.versions,
                languages = ?config.run.languages,
                "Configuration loaded"
            );

            let run_report = Orchestrator::new(&config, &registry).run()?;
            println!("{}", run_report.summary());

            if let Some(path) = report {
                run_report
                    .save(&path)
                    .with_context(|| format!("writing run report to {}", path.display()))?;
                println!("Report written to {}", path.display());
            }
        }
        Commands::Extract {
            input,
            output,
            version,
            language,
        } => {
            config.validate()?;
            let mut params = TaskParams::new(&config, version, &language, &config.model.name);
            params.input_path = input;
            params.output_path = output;

            let index = load_sentences(&params.input_path)?;
            let orchestrator = Orchestrator::new(&config, &registry);
            let extractor = orchestrator
                .construct(&params)
                .with_context(|| format!("building model {}", params.model_name))?;

            let mut options = AggregateOptions::default();
            if let Some(path) = &params.output_path {
                options = options.save_to(path);
            }
            if config.run.progress {
                options = options.with_progress(format!("{} v{version}", params.model_name));
            }

            let table = prepare_benchmark_output(extractor.as_ref(), &index, &options)?;
            println!(
                "Sentences: {} | Rows: {} | Discarded: {}",
                table.sentences,
                table.len(),
                table.discarded
            );
        }
        Commands::Models => {
            for entry in registry.entries() {
                let capabilities: Vec<&str> =
                    entry.capabilities.iter().map(|c| c.as_str()).collect();
                println!("{:<32} {}", entry.name, capabilities.join(", "));
            }
        }
        Commands::Check { path } => {
            let index = load_sentences(&path)?;
            println!("{}: {} sentences", path.display(), index.len());
        }
    }

    Ok(())
}
