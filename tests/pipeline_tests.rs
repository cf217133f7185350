use std::collections::BTreeMap;
use std::path::PathBuf;

use tempfile::TempDir;

use meshdriver::checkpoint::{AutoConfirm, Interrupt, Interruptible};
use meshdriver::engine::methods::simulated::{self, EngineCall, Journal, SimulatedCfg};
use meshdriver::session::SessionError;
use meshdriver::workflow::{ExportOutcome, PipelineStep, WorkflowError};
use meshdriver::{DriverError, PipelineCfg};

const MESH_TASKS: [&str; 2] = ["Generate the Surface Mesh", "Generate the Volume Mesh"];

/// Scratch directory with a geometry file and a config pointing at it.
struct Workshop {
    _dir: TempDir,
    cfg: PipelineCfg,
    geometry: PathBuf,
}
impl Workshop {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let input_dir = dir.path().join("Input_files");
        std::fs::create_dir_all(&input_dir).unwrap();
        let geometry = input_dir.join("Static Mixer geometry.pmdb");
        std::fs::write(&geometry, b"pmdb").unwrap();

        let cfg = PipelineCfg{
            geometry_path: geometry.clone(),
            output_path: dir.path().join("Output_files").join("static_mixer_mesh.msh"),
            auto_confirm: true,
            ..PipelineCfg::default()
        };
        Workshop{_dir: dir, cfg, geometry}
    }
}

fn engine(cfg: SimulatedCfg) -> (simulated::Method, Journal) {
    let provider = simulated::Method::with_cfg(cfg);
    let journal = provider.journal();
    (provider, journal)
}

fn failing(tasks: &[&str]) -> SimulatedCfg {
    SimulatedCfg{
        failing_tasks: tasks.iter().map(|task| task.to_string()).collect(),
        ..SimulatedCfg::default()
    }
}

#[test]
fn happy_path_returns_open_session() {
    let workshop = Workshop::new();
    let (provider, journal) = engine(SimulatedCfg::default());

    let run = meshdriver::create_mesh(&workshop.cfg, &provider, &mut AutoConfirm).unwrap();
    assert!(run.session.is_active());
    assert_eq!(journal.launches(), 1);
    assert_eq!(journal.exits(), 0);

    assert_eq!(run.report.export.saved_with(), Some("Export Mesh"));
    assert!(run.report.tasks_before_init.is_empty());
    assert!(run.report.tasks_after_import.contains(&"Generate the Volume Mesh".to_string()));
    assert_eq!(journal.executed(), vec![
        "Import Geometry",
        "Generate the Surface Mesh",
        "Generate the Volume Mesh",
        "Export Mesh",
    ]);
    assert!(workshop.cfg.output_path.parent().unwrap().is_dir());

    run.session.release();
    assert_eq!(journal.exits(), 1);
}

#[test]
fn import_and_export_arguments() {
    let workshop = Workshop::new();
    let (provider, journal) = engine(SimulatedCfg::default());
    meshdriver::run_process(&workshop.cfg, &provider, &mut AutoConfirm).unwrap();

    let arguments: BTreeMap<String, _> = journal
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            EngineCall::SetArguments(task, arguments) => Some((task, arguments)),
            _ => None,
        })
        .collect();

    let import = &arguments["Import Geometry"];
    assert_eq!(import.get("FileName").unwrap(), &workshop.geometry.display().to_string());
    assert_eq!(import.get("LengthUnit").unwrap(), "m");

    let export = &arguments["Export Mesh"];
    assert_eq!(export.get("FileName").unwrap(), &workshop.cfg.output_path.display().to_string());
    assert_eq!(export.get("FileType").unwrap(), "Case");
}

#[test]
fn full_run_reports_and_releases() {
    let workshop = Workshop::new();
    let (provider, journal) = engine(SimulatedCfg::default());

    let mut prompts = Vec::new();
    let mut checkpoint = |prompt: &str| {
        prompts.push(prompt.to_string());
        true
    };
    let summary = meshdriver::run_process(&workshop.cfg, &provider, &mut checkpoint).unwrap();

    assert!(summary.report.export.is_saved());
    assert_eq!(prompts.len(), 2);
    assert_eq!(journal.launches(), 1);
    assert_eq!(journal.exits(), 1);
    assert_eq!(journal.calls().last(), Some(&EngineCall::Exit));
}

#[test]
fn missing_geometry_never_launches() {
    let workshop = Workshop::new();
    let cfg = PipelineCfg{geometry_path: workshop.geometry.with_file_name("nope.pmdb"), ..workshop.cfg.clone()};
    let (provider, journal) = engine(SimulatedCfg::default());

    let err = meshdriver::run_process(&cfg, &provider, &mut AutoConfirm).unwrap_err();
    assert!(err.is_file_not_found());
    assert!(journal.calls().is_empty());
}

#[test]
fn acquire_and_release_balance_under_every_failure() {
    let missing_import = SimulatedCfg{
        workflow_tasks: BTreeMap::from([(
            "Watertight Geometry".to_string(),
            vec!["Import CAD and Part Management".to_string(), "Generate the Surface Mesh".to_string()],
        )]),
        ..SimulatedCfg::default()
    };
    let mut no_export = SimulatedCfg::default();
    no_export.unlocks.remove("Generate the Volume Mesh");
    let injections = vec![
        failing(&["Import Geometry"]),
        failing(&["Generate the Surface Mesh"]),
        failing(&["Generate the Volume Mesh"]),
        failing(&["Export Mesh"]),
        missing_import,
        no_export,
        SimulatedCfg{exit_failure: true, ..SimulatedCfg::default()},
    ];

    for injection in injections {
        let workshop = Workshop::new();
        let (provider, journal) = engine(injection.clone());
        let _ = meshdriver::run_process(&workshop.cfg, &provider, &mut AutoConfirm);
        assert_eq!(journal.launches(), 1, "{injection:?}");
        assert_eq!(journal.exits(), 1, "{injection:?}");
    }

    let workshop = Workshop::new();
    let cfg = PipelineCfg{
        workflow: meshdriver::workflow::WorkflowCfg{workflow_type: "Fault-tolerant Meshing".to_string(), ..Default::default()},
        ..workshop.cfg.clone()
    };
    let (provider, journal) = engine(SimulatedCfg::default());
    let err = meshdriver::run_process(&cfg, &provider, &mut AutoConfirm).unwrap_err();
    assert!(matches!(err, DriverError::WorkflowError(WorkflowError::WorkflowInit{..})));
    assert_eq!((journal.launches(), journal.exits()), (1, 1));
}

#[test]
fn failed_import_skips_meshing() {
    let workshop = Workshop::new();
    let (provider, journal) = engine(failing(&["Import Geometry"]));

    let err = meshdriver::run_process(&workshop.cfg, &provider, &mut AutoConfirm).unwrap_err();
    match err {
        DriverError::WorkflowError(WorkflowError::TaskExecution{step, task, ..}) => {
            assert_eq!(step, PipelineStep::ImportGeometry);
            assert_eq!(task, "Import Geometry");
        },
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(journal.executed(), vec!["Import Geometry"]);
}

#[test]
fn failed_surface_mesh_is_not_retried() {
    let workshop = Workshop::new();
    let (provider, journal) = engine(failing(&["Generate the Surface Mesh"]));

    let err = meshdriver::run_process(&workshop.cfg, &provider, &mut AutoConfirm).unwrap_err();
    assert!(matches!(err, DriverError::WorkflowError(WorkflowError::TaskExecution{step: PipelineStep::SurfaceMesh, ..})));
    assert_eq!(journal.executed(), vec!["Import Geometry", "Generate the Surface Mesh"]);
}

#[test]
fn missing_import_task_lists_names_and_releases() {
    let workshop = Workshop::new();
    let (provider, journal) = engine(SimulatedCfg{
        workflow_tasks: BTreeMap::from([(
            "Watertight Geometry".to_string(),
            vec!["Import CAD and Part Management".to_string()],
        )]),
        ..SimulatedCfg::default()
    });

    let err = meshdriver::create_mesh(&workshop.cfg, &provider, &mut AutoConfirm).unwrap_err();
    match err {
        DriverError::WorkflowError(WorkflowError::TaskNotFound{step, task, available}) => {
            assert_eq!(step, PipelineStep::ImportGeometry);
            assert_eq!(task, "Import Geometry");
            assert_eq!(available, vec!["Import CAD and Part Management"]);
        },
        other => panic!("unexpected error: {other}"),
    }
    // Released before the error reached us
    assert_eq!(journal.exits(), 1);
    assert!(journal.executed().is_empty());
}

#[test]
fn export_fallback_after_failure() {
    let workshop = Workshop::new();
    let mut cfg = SimulatedCfg::default();
    cfg.unlocks.insert(
        "Generate the Volume Mesh".to_string(),
        vec!["Save Mesh".to_string(), "Write Mesh".to_string()],
    );
    cfg.failing_tasks.push("Save Mesh".to_string());
    let (provider, journal) = engine(cfg);

    let summary = meshdriver::run_process(&workshop.cfg, &provider, &mut AutoConfirm).unwrap();
    assert_eq!(summary.report.export.saved_with(), Some("Write Mesh"));
    assert_eq!(summary.report.export.failed_attempts()[0].task, "Save Mesh");
    assert!(!journal.executed().contains(&"Write Output".to_string()));
}

#[test]
fn unsaved_mesh_is_degraded_success() {
    let workshop = Workshop::new();
    let mut cfg = SimulatedCfg::default();
    cfg.unlocks.remove("Generate the Volume Mesh");
    let (provider, journal) = engine(cfg);

    let summary = meshdriver::run_process(&workshop.cfg, &provider, &mut AutoConfirm).unwrap();
    match &summary.report.export {
        ExportOutcome::NotSaved{failed_attempts, available} => {
            assert!(failed_attempts.is_empty());
            assert!(available.contains(&"Generate the Volume Mesh".to_string()));
        },
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(journal.exits(), 1);
}

#[test]
fn strict_export_turns_degraded_into_error() {
    let workshop = Workshop::new();
    let cfg = PipelineCfg{strict_export: true, ..workshop.cfg.clone()};
    let mut engine_cfg = SimulatedCfg::default();
    engine_cfg.unlocks.remove("Generate the Volume Mesh");
    let (provider, journal) = engine(engine_cfg);

    let err = meshdriver::run_process(&cfg, &provider, &mut AutoConfirm).unwrap_err();
    assert!(matches!(err, DriverError::WorkflowError(WorkflowError::ExportNotSaved{..})));
    assert_eq!(journal.exits(), 1);
}

#[test]
fn operator_abort_stops_before_meshing() {
    let workshop = Workshop::new();
    let (provider, journal) = engine(SimulatedCfg::default());

    let mut refuse = |_: &str| false;
    let err = meshdriver::run_process(&workshop.cfg, &provider, &mut refuse).unwrap_err();
    assert!(matches!(err, DriverError::WorkflowError(WorkflowError::Aborted(PipelineStep::SurfaceMesh))));
    for task in MESH_TASKS {
        assert!(!journal.executed().contains(&task.to_string()));
    }
    assert_eq!(journal.exits(), 1);
}

#[test]
fn interrupt_stops_at_the_next_step_and_closes_the_engine() {
    let workshop = Workshop::new();

    // Raised before the run starts
    let (provider, journal) = engine(SimulatedCfg::default());
    let interrupt = Interrupt::new();
    interrupt.raise();
    let mut checkpoint = Interruptible::new(Box::new(AutoConfirm), interrupt);
    let err = meshdriver::run_process(&workshop.cfg, &provider, &mut checkpoint).unwrap_err();
    assert!(matches!(err, DriverError::WorkflowError(WorkflowError::Aborted(PipelineStep::Discover))));
    assert!(!journal.calls().iter().any(|call| matches!(call, EngineCall::InitializeWorkflow(_))));
    assert_eq!((journal.launches(), journal.exits()), (1, 1));

    // Raised while the operator is looking at the imported geometry
    let (provider, journal) = engine(SimulatedCfg::default());
    let interrupt = Interrupt::new();
    let ctrl_c = interrupt.clone();
    let mut checkpoint = Interruptible::new(Box::new(move |_: &str| {
        ctrl_c.raise();
        true
    }), interrupt);
    let err = meshdriver::run_process(&workshop.cfg, &provider, &mut checkpoint).unwrap_err();
    assert!(matches!(err, DriverError::WorkflowError(WorkflowError::Aborted(PipelineStep::SurfaceMesh))));
    assert_eq!(journal.executed(), vec!["Import Geometry".to_string()]);
    assert_eq!(journal.exits(), 1);
}

#[test]
fn launch_failures() {
    let workshop = Workshop::new();

    let (provider, journal) = engine(SimulatedCfg{launch_failure: Some("no license".to_string()), ..SimulatedCfg::default()});
    let err = meshdriver::run_process(&workshop.cfg, &provider, &mut AutoConfirm).unwrap_err();
    assert!(matches!(err, DriverError::SessionError(SessionError::Launch{..})));
    assert_eq!((journal.launches(), journal.exits()), (1, 0));

    let (provider, journal) = engine(SimulatedCfg{max_processors: 1, ..SimulatedCfg::default()});
    let err = meshdriver::run_process(&workshop.cfg, &provider, &mut AutoConfirm).unwrap_err();
    assert!(matches!(err, DriverError::SessionError(SessionError::ResourceUnavailable(_))));
    assert_eq!(journal.exits(), 0);
}
