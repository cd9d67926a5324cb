//! Benchmark run orchestration
//!
//! Runs every (checkpoint version, language) task of the configured run.
//! A task first tries the configured model. Construction falls back from
//! the configuration-driven strategy to explicit checkpoint paths; if the
//! model still cannot be built or fails while extracting, every registered
//! triplet extractor is tried in declaration order until one completes.
//!
//! Only construction and extraction failures are recovered from. Anything
//! else (unreadable or inconsistent annotations, output write errors) ends
//! the run.

use std::path::PathBuf;

use crate::aggregate::{prepare_benchmark_output, AggregateOptions};
use crate::annotation::load_sentences;
use crate::report::{RunReport, TaskReport};
use tribench_core::{
    AnnotationIndex, AppConfig, BenchError, CheckpointSpec, EvaluationTask, ExtractorError,
    OutputTable, Result,
};
use tribench_extractor::{Capability, ModelRegistry, TripletExtractor};

/// Result of one construct-and-aggregate attempt
#[derive(Debug)]
pub enum AttemptOutcome {
    /// Neither construction strategy produced an extractor
    ConstructionFailed(ExtractorError),
    /// The extractor was built but failed on a sentence
    ExtractionRunFailed(ExtractorError),
    Success(OutputTable),
}

/// Everything one attempt needs, resolved for a single
/// (version, language, model) combination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskParams {
    pub model_name: String,
    pub checkpoint_version: u32,
    pub language: String,
    pub most_common: bool,
    pub input_path: PathBuf,
    /// `None` when outputs are not saved
    pub output_path: Option<PathBuf>,
    /// Explicit checkpoint used by the secondary construction strategy
    pub checkpoint: CheckpointSpec,
    pub show_progress: bool,
}

impl TaskParams {
    pub fn new(config: &AppConfig, version: u32, language: &str, model_name: &str) -> Self {
        let run = &config.run;
        Self {
            model_name: model_name.to_string(),
            checkpoint_version: version,
            language: language.to_string(),
            most_common: config.model.most_common,
            input_path: run.input_path(language, version, model_name),
            output_path: run
                .save_output
                .then(|| run.output_path(language, version, model_name)),
            checkpoint: config.model.checkpoint_spec(model_name, version),
            show_progress: run.progress,
        }
    }

    fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            save_path: self.output_path.clone(),
            show_progress: self.show_progress,
            label: format!(
                "{} v{} [{}]",
                self.model_name, self.checkpoint_version, self.language
            ),
        }
    }
}

/// Drives the version × language run with model fallback
pub struct Orchestrator<'a> {
    config: &'a AppConfig,
    registry: &'a ModelRegistry,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a AppConfig, registry: &'a ModelRegistry) -> Self {
        Self { config, registry }
    }

    /// Tasks of the run: versions outer, languages inner
    pub fn tasks(&self) -> Vec<EvaluationTask> {
        let run = &self.config.run;
        run.versions
            .iter()
            .flat_map(move |&version| {
                run.languages
                    .iter()
                    .map(move |language| EvaluationTask::new(version, language.as_str()))
            })
            .collect()
    }

    /// Run every task. Skipped tasks are recorded in the report; only fatal
    /// errors are returned.
    pub fn run(&self) -> Result<RunReport> {
        let mut report = RunReport::new();
        let tasks = self.tasks();

        tracing::info!(
            run_id = %report.run_id,
            tasks = tasks.len(),
            model = %self.config.model.name,
            "Starting benchmark run"
        );

        for task in tasks {
            let task_report = self.run_task(&task)?;
            report.push(task_report);
        }

        report.finish();
        tracing::info!(
            run_id = %report.run_id,
            completed = report.completed(),
            skipped = report.skipped(),
            "Benchmark run finished"
        );
        Ok(report)
    }

    /// Run one task, scanning fallback models when the configured one fails
    pub fn run_task(&self, task: &EvaluationTask) -> Result<TaskReport> {
        let version = task.checkpoint_version;
        let model_name = task
            .model_name
            .as_deref()
            .unwrap_or(&self.config.model.name);
        let params = TaskParams::new(self.config, version, &task.language, model_name);

        let index = load_sentences(&params.input_path)?;
        tracing::info!(
            task = %task,
            model = %model_name,
            sentences = index.len(),
            input = %params.input_path.display(),
            "Evaluating"
        );

        let error = match self.attempt(&params, &index)? {
            AttemptOutcome::Success(table) => {
                return Ok(TaskReport::completed(
                    task.clone(),
                    model_name,
                    &table,
                    params.output_path,
                    false,
                ));
            }
            AttemptOutcome::ConstructionFailed(e) | AttemptOutcome::ExtractionRunFailed(e) => e,
        };

        let candidates = self.registry.candidates(Capability::TripletExtractor);
        tracing::error!(
            task = %task,
            model = %model_name,
            error = %error,
            candidates = ?candidates,
            "Model failed, scanning fallback models"
        );

        let mut tried = Vec::with_capacity(candidates.len());
        let mut last_error = Some(error.to_string());
        for candidate in candidates {
            let params = TaskParams::new(self.config, version, &task.language, candidate);
            tried.push(candidate.to_string());

            match self.attempt(&params, &index)? {
                AttemptOutcome::Success(table) => {
                    tracing::info!(
                        task = %task,
                        model = %candidate,
                        rows = table.len(),
                        "Fallback model completed"
                    );
                    return Ok(TaskReport::completed(
                        task.clone(),
                        candidate,
                        &table,
                        params.output_path,
                        true,
                    ));
                }
                AttemptOutcome::ConstructionFailed(e) | AttemptOutcome::ExtractionRunFailed(e) => {
                    tracing::error!(
                        task = %task,
                        error = %e,
                        "'{candidate}' is the wrong model name, moving on with {version}"
                    );
                    last_error = Some(e.to_string());
                }
            }
        }

        tracing::error!(
            task = %task,
            tried = ?tried,
            "No fallback model completed, skipping task"
        );
        Ok(TaskReport::exhausted(task.clone(), tried, last_error))
    }

    /// Construct the extractor for `params` and aggregate over `index`
    pub fn attempt(&self, params: &TaskParams, index: &AnnotationIndex) -> Result<AttemptOutcome> {
        let extractor = match self.construct(params) {
            Ok(extractor) => extractor,
            Err(e) => return Ok(AttemptOutcome::ConstructionFailed(e)),
        };

        match prepare_benchmark_output(extractor.as_ref(), index, &params.aggregate_options()) {
            Ok(table) => Ok(AttemptOutcome::Success(table)),
            Err(BenchError::Extraction(e)) => Ok(AttemptOutcome::ExtractionRunFailed(e)),
            Err(other) => Err(other),
        }
    }

    /// Build an extractor: configuration first, explicit checkpoint second
    pub fn construct(
        &self,
        params: &TaskParams,
    ) -> std::result::Result<Box<dyn TripletExtractor>, ExtractorError> {
        tracing::info!(
            model = %params.model_name,
            version = params.checkpoint_version,
            "Loading triplet extractor from checkpoint"
        );

        let factory = match self.registry.factory(&params.model_name) {
            Ok(factory) => factory,
            Err(e) => {
                tracing::warn!(model = %params.model_name, "{e}");
                return Err(e);
            }
        };

        match factory.from_config(
            &self.config.model,
            &params.model_name,
            params.checkpoint_version,
            params.most_common,
        ) {
            Ok(extractor) => Ok(extractor),
            Err(e) => {
                tracing::warn!(
                    model = %params.model_name,
                    checkpoint = %params.checkpoint.checkpoint_path.display(),
                    "{e}; moving on..."
                );
                factory.from_checkpoint(&params.checkpoint, params.most_common)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_cross_product() {
        let config = AppConfig::default();
        let registry = ModelRegistry::builtin();
        let tasks = Orchestrator::new(&config, &registry).tasks();

        let labels: Vec<String> = tasks.iter().map(ToString::to_string).collect();
        assert_eq!(
            labels,
            vec!["v243/de", "v243/en", "v243/zh", "v263/de", "v263/en", "v263/zh"]
        );
    }

    #[test]
    fn test_task_params_are_resolved_per_model() {
        let config = AppConfig::default();
        let params = TaskParams::new(&config, 263, "en", "CasedLexiconTripletExtractor");

        assert_eq!(params.model_name, "CasedLexiconTripletExtractor");
        assert_eq!(
            params.input_path,
            PathBuf::from("data/benchie/benchie_gold_annotations_en.txt")
        );
        assert_eq!(
            params.output_path,
            Some(PathBuf::from("systems_output/detie263benchie_output_en.txt"))
        );
        assert_eq!(params.checkpoint.model_name, "CasedLexiconTripletExtractor");
        assert_eq!(
            params.checkpoint.checkpoint_path,
            PathBuf::from("checkpoints/v263/model.ckpt")
        );
    }

    #[test]
    fn test_no_output_path_when_not_saving() {
        let mut config = AppConfig::default();
        config.run.save_output = false;
        let params = TaskParams::new(&config, 243, "de", "LexiconTripletExtractor");
        assert_eq!(params.output_path, None);
    }

    #[test]
    fn test_unknown_model_fails_construction() {
        let config = AppConfig::default();
        let registry = ModelRegistry::builtin();
        let orchestrator = Orchestrator::new(&config, &registry);
        let params = TaskParams::new(&config, 243, "en", "DetIE");

        assert!(matches!(
            orchestrator.construct(&params),
            Err(ExtractorError::UnknownModel(_))
        ));
    }
}
