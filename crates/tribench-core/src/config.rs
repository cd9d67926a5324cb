//! tribench Configuration Management
//!
//! Handles configuration from config files and environment variables,
//! with defaults that reproduce the reference BenchIE evaluation run.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Extraction model configuration
    pub model: ModelConfig,

    /// Benchmark run parameters
    pub run: RunConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        self.apply_env()?;
        Ok(self)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        // Model
        if let Ok(name) = std::env::var("TRIBENCH_MODEL_NAME") {
            self.model.name = name;
        }
        if let Ok(root) = std::env::var("TRIBENCH_CHECKPOINT_ROOT") {
            self.model.checkpoint_root = PathBuf::from(root);
        }
        if let Ok(value) = std::env::var("TRIBENCH_MOST_COMMON") {
            self.model.most_common = parse_bool("TRIBENCH_MOST_COMMON", &value)?;
        }

        // Run
        if let Ok(versions) = std::env::var("TRIBENCH_VERSIONS") {
            self.run.versions = parse_versions(&versions)?;
        }
        if let Ok(languages) = std::env::var("TRIBENCH_LANGUAGES") {
            self.run.languages = parse_languages(&languages);
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Check that the run has something to do
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.name.trim().is_empty() {
            return Err(ConfigError::MissingRequired("model.name".to_string()));
        }
        if self.run.versions.is_empty() {
            return Err(ConfigError::MissingRequired("run.versions".to_string()));
        }
        if self.run.languages.is_empty() {
            return Err(ConfigError::MissingRequired("run.languages".to_string()));
        }
        Ok(())
    }
}

/// Extraction model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Registry name of the model to evaluate
    pub name: String,

    /// Root of the per-model checkpoint tree:
    /// `{checkpoint_root}/{model}/v{version}/`
    pub checkpoint_root: PathBuf,

    /// Explicit checkpoint path template used when the model cannot be
    /// built from the checkpoint tree
    pub best_ckpt_path: String,

    /// Explicit hyperparameter path template, companion of `best_ckpt_path`
    pub best_hparams_path: String,

    /// Keep only the most frequent relation per sentence
    pub most_common: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "LexiconTripletExtractor".to_string(),
            checkpoint_root: PathBuf::from("checkpoints"),
            best_ckpt_path: "checkpoints/v{version}/model.ckpt".to_string(),
            best_hparams_path: "checkpoints/v{version}/hparams.json".to_string(),
            most_common: false,
        }
    }
}

impl ModelConfig {
    /// Checkpoint directory of a model version inside the checkpoint tree
    pub fn checkpoint_dir(&self, model_name: &str, version: u32) -> PathBuf {
        self.checkpoint_root
            .join(model_name)
            .join(format!("v{version}"))
    }

    /// Explicit checkpoint location for a model version
    pub fn checkpoint_spec(&self, model_name: &str, version: u32) -> CheckpointSpec {
        let vars = TemplateVars {
            language: "",
            version,
            model: model_name,
        };
        CheckpointSpec {
            model_name: model_name.to_string(),
            checkpoint_path: render_template(&self.best_ckpt_path, &vars),
            hparams_path: render_template(&self.best_hparams_path, &vars),
        }
    }
}

/// Explicit model name and checkpoint files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointSpec {
    pub model_name: String,
    pub checkpoint_path: PathBuf,
    pub hparams_path: PathBuf,
}

/// Benchmark run parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Checkpoint versions to evaluate
    pub versions: Vec<u32>,

    /// Language codes to evaluate
    pub languages: Vec<String>,

    /// Gold annotation path template
    pub input_template: String,

    /// System output path template
    pub output_template: String,

    /// Write the TSV output for completed tasks
    pub save_output: bool,

    /// Show a progress bar while extracting
    pub progress: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            versions: vec![243, 263],
            languages: vec!["de".to_string(), "en".to_string(), "zh".to_string()],
            input_template: "data/benchie/benchie_gold_annotations_{language}.txt".to_string(),
            output_template: "systems_output/detie{version}benchie_output_{language}.txt"
                .to_string(),
            save_output: true,
            progress: true,
        }
    }
}

impl RunConfig {
    pub fn input_path(&self, language: &str, version: u32, model: &str) -> PathBuf {
        render_template(
            &self.input_template,
            &TemplateVars {
                language,
                version,
                model,
            },
        )
    }

    pub fn output_path(&self, language: &str, version: u32, model: &str) -> PathBuf {
        render_template(
            &self.output_template,
            &TemplateVars {
                language,
                version,
                model,
            },
        )
    }

    /// Resolve relative templates against a base directory
    pub fn rooted_at(mut self, base: &Path) -> Self {
        if Path::new(&self.input_template).is_relative() {
            self.input_template = base.join(&self.input_template).display().to_string();
        }
        if Path::new(&self.output_template).is_relative() {
            self.output_template = base.join(&self.output_template).display().to_string();
        }
        self
    }
}

/// Placeholder values for path templates
#[derive(Debug, Clone, Copy)]
pub struct TemplateVars<'a> {
    pub language: &'a str,
    pub version: u32,
    pub model: &'a str,
}

/// Expand `{language}`, `{version}` and `{model}` in a path template
pub fn render_template(template: &str, vars: &TemplateVars<'_>) -> PathBuf {
    PathBuf::from(
        template
            .replace("{language}", vars.language)
            .replace("{version}", &vars.version.to_string())
            .replace("{model}", vars.model),
    )
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Parse a comma-separated list of checkpoint versions
pub fn parse_versions(value: &str) -> Result<Vec<u32>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse().map_err(|_| ConfigError::InvalidValue {
                key: "versions".to_string(),
                value: s.to_string(),
            })
        })
        .collect()
}

/// Parse a comma-separated list of language codes
pub fn parse_languages(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
