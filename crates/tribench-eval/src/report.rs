//! Run report
//!
//! Per-task outcomes of a benchmark run, printable as a summary and
//! serializable to JSON for bookkeeping next to the system outputs.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tribench_core::{BenchError, EvaluationTask, OutputTable, Result};

/// How a task ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskStatus {
    Completed {
        model_name: String,
        sentences: usize,
        rows: usize,
        discarded: usize,
        output_path: Option<PathBuf>,
        used_fallback: bool,
    },
    /// Every fallback candidate failed; the task was skipped
    FallbackExhausted {
        tried: Vec<String>,
        last_error: Option<String>,
    },
}

/// Outcome of one (version, language) task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskReport {
    pub task: EvaluationTask,
    #[serde(flatten)]
    pub status: TaskStatus,
}

impl TaskReport {
    pub fn completed(
        task: EvaluationTask,
        model_name: impl Into<String>,
        table: &OutputTable,
        output_path: Option<PathBuf>,
        used_fallback: bool,
    ) -> Self {
        Self {
            task,
            status: TaskStatus::Completed {
                model_name: model_name.into(),
                sentences: table.sentences,
                rows: table.len(),
                discarded: table.discarded,
                output_path,
                used_fallback,
            },
        }
    }

    pub fn exhausted(task: EvaluationTask, tried: Vec<String>, last_error: Option<String>) -> Self {
        Self {
            task,
            status: TaskStatus::FallbackExhausted { tried, last_error },
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.status, TaskStatus::Completed { .. })
    }
}

/// All task outcomes of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub tasks: Vec<TaskReport>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            tasks: Vec::new(),
        }
    }

    pub fn push(&mut self, report: TaskReport) {
        self.tasks.push(report);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn completed(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_completed()).count()
    }

    pub fn skipped(&self) -> usize {
        self.tasks.len() - self.completed()
    }

    /// Find the report of a task
    pub fn task(&self, version: u32, language: &str) -> Option<&TaskReport> {
        self.tasks
            .iter()
            .find(|t| t.task.checkpoint_version == version && t.task.language == language)
    }

    /// Human-readable summary
    pub fn summary(&self) -> String {
        let mut out = format!(
            "=== Benchmark Run {} ===\n\n\
             Tasks: {} | Completed: {} | Skipped: {}\n\n",
            self.run_id,
            self.tasks.len(),
            self.completed(),
            self.skipped(),
        );

        for report in &self.tasks {
            let line = match &report.status {
                TaskStatus::Completed {
                    model_name,
                    sentences,
                    rows,
                    discarded,
                    used_fallback,
                    ..
                } => format!(
                    "  {:<10} ok       {} | sentences: {} | rows: {} | discarded: {}{}\n",
                    report.task.to_string(),
                    model_name,
                    sentences,
                    rows,
                    discarded,
                    if *used_fallback { " | fallback" } else { "" },
                ),
                TaskStatus::FallbackExhausted { tried, .. } => format!(
                    "  {:<10} skipped  tried: {}\n",
                    report.task.to_string(),
                    tried.join(", "),
                ),
            };
            out.push_str(&line);
        }

        out
    }

    /// Write the report as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| BenchError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| BenchError::io(path, e))
    }
}
