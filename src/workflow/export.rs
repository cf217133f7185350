use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::engine::TaskArguments;
use crate::workflow::{
    PipelineStep,
    TaskCollection,
};

/// A candidate that was present but failed to save the mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedAttempt {
    pub task: String,
    pub message: String,
}

/// Result of the export step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The mesh was written by `task`.
    Saved {
        task: String,
        failed_attempts: Vec<FailedAttempt>,
    },
    /// No candidate saved the mesh. `available` is the task set at the end.
    NotSaved {
        failed_attempts: Vec<FailedAttempt>,
        available: Vec<String>,
    },
}
impl ExportOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, ExportOutcome::Saved{..})
    }

    /// Name of the task that saved the mesh.
    pub fn saved_with(&self) -> Option<&str> {
        match self {
            ExportOutcome::Saved{task, ..} => Some(task),
            ExportOutcome::NotSaved{..} => None,
        }
    }

    pub fn failed_attempts(&self) -> &[FailedAttempt] {
        match self {
            ExportOutcome::Saved{failed_attempts, ..}
            | ExportOutcome::NotSaved{failed_attempts, ..} => failed_attempts,
        }
    }
}

/// Save the mesh with the first candidate task that works.
/// Candidates missing from the current task set are skipped untouched.
/// Failures of a present candidate are logged and the next one is tried.
/// Never fails: running out of candidates is `ExportOutcome::NotSaved`.
pub fn export_with_candidates(
    tasks: &mut TaskCollection,
    candidates: &[String],
    arguments: &TaskArguments,
) -> ExportOutcome {
    let mut failed_attempts = Vec::new();

    for candidate in candidates {
        match tasks.contains(candidate) {
            Ok(true) => {},
            Ok(false) => {
                debug!("Export task \"{}\" not available, skipping", candidate);
                continue;
            },
            Err(error) => {
                warn!("Could not check for export task \"{}\":\n{}", candidate, error);
                failed_attempts.push(FailedAttempt{task: candidate.clone(), message: error.to_string()});
                continue;
            },
        }

        info!("Trying to save mesh using task: {}", candidate);
        let attempt = tasks
            .resolve(PipelineStep::Export, candidate)
            .and_then(|mut task| {
                task.set_arguments(arguments)?;
                task.execute()
            });
        match attempt {
            Ok(()) => {
                info!("Successfully saved mesh using {}", candidate);
                return ExportOutcome::Saved{task: candidate.clone(), failed_attempts};
            },
            Err(error) => {
                warn!("Could not save using {}:\n{}", candidate, error);
                failed_attempts.push(FailedAttempt{task: candidate.clone(), message: error.to_string()});
            },
        }
    }

    let available = tasks.names_or_empty();
    warn!("Could not automatically save the mesh.");
    warn!("Available tasks are:\n{}", available.iter().map(|task| format!("  - {task}")).join("\n"));
    warn!("Add the correct export task name to `workflow.export_candidates` in the config.");
    ExportOutcome::NotSaved{failed_attempts, available}
}
