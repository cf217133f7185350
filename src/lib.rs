pub mod args;
pub mod cfg;
pub mod checkpoint;
pub mod engine;
pub mod io;
pub mod logging;
pub mod session;
pub mod workflow;
mod crate_errors;

use std::path::Path;
use std::time::{Duration, Instant};

use itertools::Itertools;
use tracing::{debug, info, warn};

use checkpoint::Checkpoint;
use engine::{
    EngineChoice,
    EngineProvider,
};
use session::SessionGuard;
use workflow::{
    ExportOutcome,
    MeshPaths,
    PipelineReport,
    WorkflowError,
};

pub use crate_errors::{
    DriverError,
    DriverResult,
};
pub use cfg::PipelineCfg;

/// Target struct.
/// The loaded config and the engine provider it selects.
#[derive(Debug)]
pub struct MeshTarget {
    pub cfg: PipelineCfg,
    pub provider: EngineChoice,
}

/// Result of `create_mesh`: the still-open session and what the pipeline did.
#[derive(Debug)]
pub struct MeshRun {
    pub session: SessionGuard,
    pub report: PipelineReport,
}

/// Result of a full run, after the session was closed.
#[derive(Debug)]
pub struct RunSummary {
    pub report: PipelineReport,
    pub elapsed: Duration,
}

/// [Stage 1.]
/// Build the target from the run arguments.
/// Loads the config file (or the defaults) and constructs the engine provider.
pub fn build_target(run_args: &args::RunArgs) -> DriverResult<MeshTarget> {
    let cfg = PipelineCfg::from_run_args(run_args)?;
    let provider = cfg.engine.build_provider()?;
    Ok(MeshTarget{cfg, provider})
}

/// Render an example config file.
/// With `--engine`, renders that provider's method cfg instead.
pub fn example_config(example_args: &args::ExampleArgs) -> DriverResult<String> {
    let extension = example_args.format.extension();
    match &example_args.engine {
        Some(method_name) => {
            let provider = EngineChoice::from_name(method_name)?;
            Ok(provider.describe_method_cfg(extension)?)
        },
        None => Ok(io::to_cfg_string(&PipelineCfg::default(), extension)?),
    }
}

/// [Stage 2.]
/// Check the paths, open a session and run the meshing pipeline on it.
/// The geometry is checked before the engine is launched.
/// On success the session is handed back open; on failure it is closed
/// before the error is returned.
pub fn create_mesh<P>(cfg: &PipelineCfg, provider: &P, checkpoint: &mut dyn Checkpoint) -> DriverResult<MeshRun>
where P: EngineProvider + ?Sized
{
    // 2.1 Check the input and prepare the output location
    log_input_dir(&cfg.geometry_path);
    let geometry = io::resolve_input(&cfg.geometry_path)?;
    let output = io::prepare_output(&cfg.output_path)?;
    info!("Using geometry file: {}", geometry.display());
    info!("Output will be saved to: {}", output.display());

    // 2.2 Launch the engine
    let mut session = session::acquire(provider, &cfg.launch)?;

    // 2.3 Run the workflow
    let paths = MeshPaths{geometry: &geometry, output: &output};
    let result = workflow::drive(session.session()?, &cfg.workflow, paths, checkpoint);
    match result {
        Ok(report) => Ok(MeshRun{session, report}),
        Err(err) => {
            session.release();
            Err(err.into())
        },
    }
}

/// [Stage 3.]
/// Run the whole process: mesh, report the time, close the session.
/// The session is closed on every path. With `strict_export`, an unsaved
/// mesh is turned into an error after the session is closed.
pub fn run_process<P>(cfg: &PipelineCfg, provider: &P, checkpoint: &mut dyn Checkpoint) -> DriverResult<RunSummary>
where P: EngineProvider + ?Sized
{
    let start = Instant::now();
    info!("Starting meshing process...");

    let MeshRun{session, report} = create_mesh(cfg, provider, checkpoint)?;

    let elapsed = start.elapsed();
    info!("Total meshing time: {:.2} seconds", elapsed.as_secs_f64());

    // 3.1 Teardown, the answer does not matter, the session closes either way
    if let Err(error) = checkpoint.confirm("Close the engine session?") {
        warn!("Teardown prompt failed, closing anyway:\n{}", error);
    }
    session.release();

    if cfg.strict_export {
        if let ExportOutcome::NotSaved{available, ..} = &report.export {
            return Err(WorkflowError::ExportNotSaved{available: available.clone()}.into());
        }
    }
    Ok(RunSummary{report, elapsed})
}

/// Log the files next to the geometry, to help spot a wrong file name.
fn log_input_dir(geometry_path: &Path) {
    let dir = match geometry_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    match io::list_files(dir) {
        Ok(files) => info!(
            "Available files in input directory:\n{}",
            files.iter().map(|file| format!("  - {file}")).join("\n"),
        ),
        Err(error) => debug!("Could not list the input directory:\n{}", error),
    }
}

/// Top-level tests
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_config_parses_back() {
        let example_args = args::ExampleArgs{format: args::Format::Json, engine: None};
        let text = example_config(&example_args).unwrap();
        let cfg: PipelineCfg = serde_json::from_str(&text).unwrap();
        assert_eq!(cfg, PipelineCfg::default());
    }

    #[test]
    fn example_method_cfg() {
        let example_args = args::ExampleArgs{format: args::Format::Yaml, engine: Some("simulated".to_string())};
        let text = example_config(&example_args).unwrap();
        assert!(text.contains("Watertight Geometry"));
        assert!(text.contains("max_processors"));
    }

    #[test]
    fn example_unknown_engine() {
        let example_args = args::ExampleArgs{format: args::Format::Yaml, engine: Some("corba".to_string())};
        assert!(matches!(example_config(&example_args), Err(DriverError::ArgError(_))));
    }
}
