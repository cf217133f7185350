mod proc_errors;
mod cfg;
mod tasks;
mod export;

use std::path::Path;

use itertools::Itertools;
use strum::{Display, EnumIter};
use tracing::{error, info};

use crate::checkpoint::Checkpoint;
use crate::engine::{
    EngineSession,
    TaskArguments,
};

// Re-export errors
pub use proc_errors::{
    WorkflowError,
    ProcResult,
};
// Re-export cfg handling
pub use cfg::WorkflowCfg;
// Re-export task lookup and export handling
pub use tasks::{
    TaskCollection,
    TaskRef,
};
pub use export::{
    ExportOutcome,
    FailedAttempt,
    export_with_candidates,
};

/// Steps of the meshing pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum PipelineStep {
    #[strum(serialize = "Discover tasks")]
    Discover,
    #[strum(serialize = "Initialize workflow")]
    InitializeWorkflow,
    #[strum(serialize = "Import geometry")]
    ImportGeometry,
    #[strum(serialize = "Generate surface mesh")]
    SurfaceMesh,
    #[strum(serialize = "Generate volume mesh")]
    VolumeMesh,
    #[strum(serialize = "Export mesh")]
    Export,
}

/// Summary of a pipeline run that reached the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// Outcome of the export step.
    pub export: ExportOutcome,
    /// Task names before the workflow was initialized.
    pub tasks_before_init: Vec<String>,
    /// Task names right after the geometry import.
    pub tasks_after_import: Vec<String>,
}

/// Paths the pipeline reads and writes.
#[derive(Debug, Clone, Copy)]
pub struct MeshPaths<'a> {
    pub geometry: &'a Path,
    pub output: &'a Path,
}

/// Run the meshing pipeline on an open session.
/// Steps run strictly in order, each one on the task set left by the previous.
/// Any error other than a failed export candidate is logged together with
/// the current task names and returned, the caller owns the cleanup.
pub fn drive(
    session: &mut dyn EngineSession,
    workflow_cfg: &WorkflowCfg,
    paths: MeshPaths,
    checkpoint: &mut dyn Checkpoint,
) -> ProcResult<PipelineReport> {
    let mut tasks = TaskCollection::new(session);

    match run_steps(&mut tasks, workflow_cfg, paths, checkpoint) {
        Ok(report) => Ok(report),
        Err(err) => {
            match err.step() {
                Some(step) => error!("Step \"{}\" failed:\n{}", step, err),
                None => error!("Pipeline failed:\n{}", err),
            }
            // TaskNotFound already carries the names seen at failure time
            if !matches!(err, WorkflowError::TaskNotFound{..}) {
                log_task_names("Available tasks are", &tasks.names_or_empty());
            }
            Err(err)
        },
    }
}

fn run_steps(
    tasks: &mut TaskCollection,
    workflow_cfg: &WorkflowCfg,
    paths: MeshPaths,
    checkpoint: &mut dyn Checkpoint,
) -> ProcResult<PipelineReport> {

    // 1. Discover the tasks the engine starts with
    stop_if_interrupted(checkpoint, PipelineStep::Discover)?;
    let tasks_before_init = tasks
        .names()
        .map_err(|source| WorkflowError::Enumeration{step: PipelineStep::Discover, source})?;
    log_task_names("Available tasks before initialization", &tasks_before_init);

    // 2. Declare the workflow template
    stop_if_interrupted(checkpoint, PipelineStep::InitializeWorkflow)?;
    info!("Initializing workflow \"{}\"...", workflow_cfg.workflow_type);
    tasks.initialize(&workflow_cfg.workflow_type)?;

    // 3. Import the geometry
    stop_if_interrupted(checkpoint, PipelineStep::ImportGeometry)?;
    info!("Importing geometry...");
    let import_args = TaskArguments::new()
        .with("FileName", paths.geometry.display().to_string())
        .with("LengthUnit", workflow_cfg.length_unit.as_str());
    run_task(tasks, PipelineStep::ImportGeometry, &workflow_cfg.import_task, Some(&import_args))?;

    // The import unlocks new tasks, list them again
    let tasks_after_import = tasks
        .names()
        .map_err(|source| WorkflowError::Enumeration{step: PipelineStep::ImportGeometry, source})?;
    log_task_names("Available tasks after geometry import", &tasks_after_import);

    if !checkpoint.confirm("Check the task names in the engine GUI, then continue to mesh generation.")? {
        return Err(WorkflowError::Aborted(PipelineStep::SurfaceMesh));
    }

    // 4. Surface mesh
    stop_if_interrupted(checkpoint, PipelineStep::SurfaceMesh)?;
    info!("Generating surface mesh...");
    run_task(tasks, PipelineStep::SurfaceMesh, &workflow_cfg.surface_mesh_task, None)?;

    // 5. Volume mesh
    stop_if_interrupted(checkpoint, PipelineStep::VolumeMesh)?;
    info!("Generating volume mesh...");
    run_task(tasks, PipelineStep::VolumeMesh, &workflow_cfg.volume_mesh_task, None)?;

    // 6. Export, trying each candidate name
    stop_if_interrupted(checkpoint, PipelineStep::Export)?;
    let export_args = TaskArguments::new()
        .with("FileName", paths.output.display().to_string())
        .with("FileType", workflow_cfg.export_file_type.as_str());
    let export = export_with_candidates(tasks, &workflow_cfg.export_candidates, &export_args);

    Ok(PipelineReport{export, tasks_before_init, tasks_after_import})
}

/// Stop before `step` if the operator interrupted the run.
fn stop_if_interrupted(checkpoint: &dyn Checkpoint, step: PipelineStep) -> ProcResult<()> {
    if checkpoint.interrupted() {
        return Err(WorkflowError::Aborted(step));
    }
    Ok(())
}

/// Resolve a required task, set its arguments and execute it.
fn run_task(
    tasks: &mut TaskCollection,
    step: PipelineStep,
    name: &str,
    arguments: Option<&TaskArguments>,
) -> ProcResult<()> {
    let mut task = tasks.resolve(step, name)?;
    if let Some(arguments) = arguments {
        task.set_arguments(arguments)?;
    }
    task.execute()
}

fn log_task_names(header: &str, names: &[String]) {
    if names.is_empty() {
        info!("{}: (none)", header);
    }
    else {
        info!("{}:\n{}", header, names.iter().map(|name| format!("  - {name}")).join("\n"));
    }
}
