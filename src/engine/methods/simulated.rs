use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Serialize, Deserialize};

use crate::{
    engine,
    args,
    io,
};
use engine::{
    methods,
    EngineError,
    EngineSession,
    LaunchConfig,
    TaskArguments,
};

/// Simulated engine provider.
/// Scripts a meshing workflow in-process. Every call made against the
/// sessions it launches is recorded in a shared `Journal`.
#[derive(Debug)]
pub struct Method {
    /// Arguments for the simulated engine.
    method_args: SimulatedCfg,
    /// Record of calls, shared with all sessions.
    journal: Journal,
}
impl Method {
    pub fn new() -> args::ProcResult<Self> {
        Ok(Method::with_cfg(SimulatedCfg::default()))
    }

    pub fn with_cfg(method_args: SimulatedCfg) -> Self {
        Method{method_args, journal: Journal::default()}
    }

    /// Handle onto the call record.
    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }
}

/// Deserializer from the method cfg file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedCfg {
    /// Tasks visible before the workflow is initialized.
    #[serde(default)]
    pub initial_tasks: Vec<String>,
    /// Tasks added by each accepted workflow type. Unknown types are rejected.
    #[serde(default = "SimulatedCfg::default_workflow_tasks", alias = "workflows")]
    pub workflow_tasks: BTreeMap<String, Vec<String>>,
    /// Tasks that appear once the keyed task has executed.
    #[serde(default = "SimulatedCfg::default_unlocks")]
    pub unlocks: BTreeMap<String, Vec<String>>,
    /// Tasks whose execution fails.
    #[serde(default, alias = "failing")]
    pub failing_tasks: Vec<String>,
    /// Largest processor count the engine accepts.
    #[serde(default = "SimulatedCfg::default_max_processors")]
    pub max_processors: usize,
    /// Make every launch fail with this message.
    #[serde(default)]
    pub launch_failure: Option<String>,
    /// Make `exit` report a failure (the session still closes).
    #[serde(default)]
    pub exit_failure: bool,
}
impl SimulatedCfg {
    pub fn default_workflow_tasks() -> BTreeMap<String, Vec<String>> {
        BTreeMap::from([(
            "Watertight Geometry".to_string(),
            to_strings(&[
                "Import Geometry",
                "Add Local Sizing",
                "Generate the Surface Mesh",
            ]),
        )])
    }
    pub fn default_unlocks() -> BTreeMap<String, Vec<String>> {
        BTreeMap::from([
            (
                "Import Geometry".to_string(),
                to_strings(&[
                    "Describe Geometry",
                    "Update Boundaries",
                    "Update Regions",
                    "Add Boundary Layers",
                    "Generate the Volume Mesh",
                ]),
            ),
            (
                "Generate the Volume Mesh".to_string(),
                to_strings(&["Export Mesh"]),
            ),
        ])
    }
    pub fn default_max_processors() -> usize {
        8
    }
}
impl Default for SimulatedCfg {
    fn default() -> Self {
        SimulatedCfg{
            initial_tasks: Vec::new(),
            workflow_tasks: Self::default_workflow_tasks(),
            unlocks: Self::default_unlocks(),
            failing_tasks: Vec::new(),
            max_processors: Self::default_max_processors(),
            launch_failure: None,
            exit_failure: false,
        }
    }
}

fn to_strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

/// One recorded call against the simulated engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Launch,
    ListTasks,
    InitializeWorkflow(String),
    SetArguments(String, TaskArguments),
    Execute(String),
    Exit,
}

/// Shared, append-only record of engine calls.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<EngineCall>>>);
impl Journal {
    fn record(&self, call: EngineCall) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push(call);
    }

    /// Snapshot of every call so far.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn launches(&self) -> usize {
        self.calls().iter().filter(|call| **call == EngineCall::Launch).count()
    }

    pub fn exits(&self) -> usize {
        self.calls().iter().filter(|call| **call == EngineCall::Exit).count()
    }

    /// Names of the executed tasks, in order. Includes failed executions.
    pub fn executed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::Execute(task) => Some(task),
                _ => None,
            })
            .collect()
    }

    /// Names of the tasks that received arguments, in order.
    pub fn argument_targets(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::SetArguments(task, _) => Some(task),
                _ => None,
            })
            .collect()
    }
}

impl methods::EngineProvider for Method {
    /// Get the name of the engine provider.
    fn get_method_name(&self) -> String {
        "simulated".to_string()
    }

    /// Parse the provider config file
    fn parse_method_cfg(&mut self, method_cfg_file: &Path) -> args::ProcResult<()> {
        self.method_args = io::read_cfg_file(method_cfg_file)?;
        Ok(())
    }

    fn describe_method_cfg(&self, extension: &str) -> io::IoResult<String> {
        io::to_cfg_string(&self.method_args, extension)
    }

    fn launch(&self, launch_cfg: &LaunchConfig) -> engine::ProcResult<Box<dyn EngineSession>> {
        self.journal.record(EngineCall::Launch);

        if let Some(message) = &self.method_args.launch_failure {
            return Err(EngineError::Launch(message.clone()));
        }
        if launch_cfg.processor_count > self.method_args.max_processors {
            return Err(EngineError::Unsupported(format!(
                "{} processors requested, at most {} available",
                launch_cfg.processor_count, self.method_args.max_processors,
            )));
        }

        Ok(Box::new(SimulatedSession{
            cfg: self.method_args.clone(),
            tasks: self.method_args.initial_tasks.clone(),
            arguments: BTreeMap::new(),
            journal: self.journal.clone(),
            closed: false,
        }))
    }
}

/// Session state for the simulated engine.
#[derive(Debug)]
struct SimulatedSession {
    cfg: SimulatedCfg,
    tasks: Vec<String>,
    arguments: BTreeMap<String, TaskArguments>,
    journal: Journal,
    closed: bool,
}
impl SimulatedSession {
    fn check_open(&self) -> engine::ProcResult<()> {
        if self.closed {
            return Err(EngineError::Closed);
        }
        Ok(())
    }

    fn check_task(&self, task: &str) -> engine::ProcResult<()> {
        if !self.tasks.iter().any(|name| name == task) {
            return Err(EngineError::TaskNotFound(task.to_string()));
        }
        Ok(())
    }

    fn add_tasks(&mut self, names: &[String]) {
        for name in names {
            if !self.tasks.contains(name) {
                self.tasks.push(name.clone());
            }
        }
    }
}

impl EngineSession for SimulatedSession {
    fn task_names(&mut self) -> engine::ProcResult<Vec<String>> {
        self.check_open()?;
        self.journal.record(EngineCall::ListTasks);
        Ok(self.tasks.clone())
    }

    fn initialize_workflow(&mut self, workflow_type: &str) -> engine::ProcResult<()> {
        self.check_open()?;
        self.journal.record(EngineCall::InitializeWorkflow(workflow_type.to_string()));

        let workflow_tasks = match self.cfg.workflow_tasks.get(workflow_type) {
            Some(tasks) => tasks.clone(),
            None => return Err(EngineError::Rejected(format!("unknown workflow type \"{workflow_type}\""))),
        };
        self.tasks = self.cfg.initial_tasks.clone();
        self.arguments.clear();
        self.add_tasks(&workflow_tasks);
        Ok(())
    }

    fn set_task_arguments(&mut self, task: &str, arguments: &TaskArguments) -> engine::ProcResult<()> {
        self.check_open()?;
        self.journal.record(EngineCall::SetArguments(task.to_string(), arguments.clone()));
        self.check_task(task)?;
        self.arguments.insert(task.to_string(), arguments.clone());
        Ok(())
    }

    fn execute_task(&mut self, task: &str) -> engine::ProcResult<()> {
        self.check_open()?;
        self.journal.record(EngineCall::Execute(task.to_string()));
        self.check_task(task)?;

        if self.cfg.failing_tasks.iter().any(|name| name == task) {
            return Err(EngineError::Rejected(format!("task \"{task}\" failed to execute")));
        }

        if let Some(unlocked) = self.cfg.unlocks.get(task).cloned() {
            self.add_tasks(&unlocked);
        }
        Ok(())
    }

    fn exit(&mut self) -> engine::ProcResult<()> {
        self.check_open()?;
        self.journal.record(EngineCall::Exit);
        self.closed = true;
        if self.cfg.exit_failure {
            return Err(EngineError::Transport("engine did not acknowledge exit".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineProvider;

    fn launch_default() -> (Method, Box<dyn EngineSession>) {
        let method = Method::new().unwrap();
        let session = method.launch(&LaunchConfig::default()).unwrap();
        (method, session)
    }

    #[test]
    fn import_unlocks_volume_mesh() {
        let (_method, mut session) = launch_default();
        assert!(session.task_names().unwrap().is_empty());

        session.initialize_workflow("Watertight Geometry").unwrap();
        let names = session.task_names().unwrap();
        assert!(names.contains(&"Import Geometry".to_string()));
        assert!(!names.contains(&"Generate the Volume Mesh".to_string()));

        session.execute_task("Import Geometry").unwrap();
        assert!(session.task_names().unwrap().contains(&"Generate the Volume Mesh".to_string()));
    }

    #[test]
    fn unknown_workflow_is_rejected() {
        let (_method, mut session) = launch_default();
        let err = session.initialize_workflow("Fault-tolerant Meshing").unwrap_err();
        assert!(matches!(err, EngineError::Rejected(_)));
    }

    #[test]
    fn missing_task_is_a_lookup_error() {
        let (_method, mut session) = launch_default();
        session.initialize_workflow("Watertight Geometry").unwrap();
        let err = session.execute_task("Save Mesh").unwrap_err();
        assert_eq!(err, EngineError::TaskNotFound("Save Mesh".to_string()));
    }

    #[test]
    fn calls_after_exit_are_refused() {
        let (method, mut session) = launch_default();
        session.exit().unwrap();
        assert_eq!(session.task_names().unwrap_err(), EngineError::Closed);
        assert_eq!(session.exit().unwrap_err(), EngineError::Closed);
        assert_eq!(method.journal().exits(), 1);
    }

    #[test]
    fn processor_limit() {
        let method = Method::with_cfg(SimulatedCfg{max_processors: 1, ..SimulatedCfg::default()});
        let err = method.launch(&LaunchConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::Unsupported(_)));
        assert_eq!(method.journal().launches(), 1);
    }

    #[test]
    fn cfg_parses_with_defaults() {
        let cfg: SimulatedCfg = serde_yaml::from_str("failing:\n  - Export Mesh\n").unwrap();
        assert_eq!(cfg.failing_tasks, vec!["Export Mesh"]);
        assert_eq!(cfg.max_processors, 8);
        assert!(cfg.workflow_tasks.contains_key("Watertight Geometry"));
    }
}
