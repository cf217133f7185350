mod proc_errors;
pub mod methods;

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Serialize, Deserialize};
use strum::{Display, EnumIter};

// Re-export errors
pub use proc_errors::{
    EngineError,
    ProcResult,
};
// Re-export engine methods
pub use methods::{
    EngineChoice,
    EngineProvider,
};

/// Numeric precision of the engine solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Precision {
    Single,
    #[default]
    Double,
}

/// Launch configuration for an engine session.
/// Mirrors the options the engine accepts when it is started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Engine operating mode. The pipeline needs the meshing mode.
    #[serde(default = "LaunchConfig::default_mode")]
    pub mode: String,

    /// Solver precision.
    #[serde(default)]
    pub precision: Precision,

    /// Show the engine GUI while the pipeline runs.
    #[serde(default = "LaunchConfig::default_show_gui", alias = "gui")]
    pub show_gui: bool,

    /// Number of engine processes.
    #[serde(default = "LaunchConfig::default_processor_count", alias = "processors")]
    pub processor_count: usize,

    /// Seconds to wait for the engine to come up.
    #[serde(default = "LaunchConfig::default_start_timeout_s", alias = "timeout")]
    pub start_timeout_s: u64,
}
impl LaunchConfig {
    pub fn default_mode() -> String {
        "meshing".to_string()
    }
    pub fn default_show_gui() -> bool {
        true
    }
    pub fn default_processor_count() -> usize {
        2
    }
    pub fn default_start_timeout_s() -> u64 {
        120
    }

    /// Launch timeout as a `Duration`.
    pub fn start_timeout(&self) -> Duration {
        Duration::from_secs(self.start_timeout_s)
    }
}
impl Default for LaunchConfig {
    fn default() -> Self {
        LaunchConfig{
            mode: Self::default_mode(),
            precision: Precision::default(),
            show_gui: Self::default_show_gui(),
            processor_count: Self::default_processor_count(),
            start_timeout_s: Self::default_start_timeout_s(),
        }
    }
}

/// Arguments handed to a task right before it is executed.
/// Values are passed through untouched, the engine validates them on execute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskArguments(BTreeMap<String, serde_json::Value>);
impl TaskArguments {
    pub fn new() -> Self {
        TaskArguments(BTreeMap::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.0.get(name)
    }
}

/// A live session with the meshing engine.
/// The task set is owned by the engine and changes as tasks execute,
/// so callers enumerate it again instead of caching names.
pub trait EngineSession: std::fmt::Debug {
    /// Names of the tasks currently available in the workflow.
    fn task_names(&mut self) -> ProcResult<Vec<String>>;

    /// Declare the workflow template. Must come before any task.
    fn initialize_workflow(&mut self, workflow_type: &str) -> ProcResult<()>;

    /// Set the arguments of a task. Fails with `EngineError::TaskNotFound` if absent.
    fn set_task_arguments(&mut self, task: &str, arguments: &TaskArguments) -> ProcResult<()>;

    /// Execute a task and block until the engine reports completion.
    fn execute_task(&mut self, task: &str) -> ProcResult<()>;

    /// Shut the engine down. No calls are valid afterwards.
    fn exit(&mut self) -> ProcResult<()>;
}
