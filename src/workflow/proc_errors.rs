use thiserror::Error;

use crate::checkpoint::CheckpointError;
use crate::engine::EngineError;
use crate::workflow::PipelineStep;

/// Workflow process error type.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The engine rejected the workflow template.
    #[error("- Workflow type \"{workflow_type}\" was rejected:\n{source}")]
    WorkflowInit {
        workflow_type: String,
        source: EngineError,
    },
    /// A required task is not in the engine's current task set.
    #[error("- Task \"{task}\" not found during step \"{step}\"\n- Available tasks: [{}]", .available.join(", "))]
    TaskNotFound {
        step: PipelineStep,
        task: String,
        available: Vec<String>,
    },
    /// The engine failed or rejected a task.
    #[error("- Step \"{step}\" failed in task \"{task}\":\n{source}")]
    TaskExecution {
        step: PipelineStep,
        task: String,
        source: EngineError,
    },
    /// The task set could not be read.
    #[error("- Could not list the engine tasks during step \"{step}\":\n{source}")]
    Enumeration {
        step: PipelineStep,
        source: EngineError,
    },
    /// The operator stopped the pipeline at a checkpoint.
    #[error("- Stopped by the operator before step \"{0}\"")]
    Aborted(PipelineStep),
    /// No export candidate persisted the mesh (strict export only).
    #[error("- The mesh was not saved, none of the export tasks succeeded\n- Available tasks: [{}]", .available.join(", "))]
    ExportNotSaved {
        available: Vec<String>,
    },
    #[error("{0}")]
    Checkpoint(#[from] CheckpointError),
}
impl WorkflowError {
    /// Step the error happened in, if it belongs to one.
    pub fn step(&self) -> Option<PipelineStep> {
        match self {
            WorkflowError::WorkflowInit{..} => Some(PipelineStep::InitializeWorkflow),
            WorkflowError::TaskNotFound{step, ..}
            | WorkflowError::TaskExecution{step, ..}
            | WorkflowError::Enumeration{step, ..}
            | WorkflowError::Aborted(step) => Some(*step),
            WorkflowError::ExportNotSaved{..} => Some(PipelineStep::Export),
            WorkflowError::Checkpoint(_) => None,
        }
    }
}

/// Result type for the `workflow` module.
pub type ProcResult<T> = std::result::Result<T, WorkflowError>;
