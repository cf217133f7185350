use crate::engine::{
    self,
    EngineError,
    EngineSession,
    TaskArguments,
};
use crate::workflow::{
    PipelineStep,
    ProcResult,
    WorkflowError,
};

/// View of the engine's task set.
/// Nothing is cached: every lookup asks the engine for its current names.
pub struct TaskCollection<'s> {
    session: &'s mut dyn EngineSession,
}
impl<'s> TaskCollection<'s> {
    pub fn new(session: &'s mut dyn EngineSession) -> Self {
        TaskCollection{session}
    }

    /// Current task names.
    pub fn names(&mut self) -> engine::ProcResult<Vec<String>> {
        self.session.task_names()
    }

    /// Current task names, or an empty list if the engine cannot answer.
    /// Used for diagnostics on paths that are already failing.
    pub fn names_or_empty(&mut self) -> Vec<String> {
        self.names().unwrap_or_default()
    }

    /// Check whether a task is currently available.
    pub fn contains(&mut self, name: &str) -> engine::ProcResult<bool> {
        Ok(self.names()?.iter().any(|task| task == name))
    }

    /// Declare the workflow template.
    pub fn initialize(&mut self, workflow_type: &str) -> ProcResult<()> {
        self.session
            .initialize_workflow(workflow_type)
            .map_err(|source| WorkflowError::WorkflowInit{workflow_type: workflow_type.to_string(), source})
    }

    /// Resolve a task by name for a required step.
    /// A missing name fails with the names that were available at that moment.
    pub fn resolve(&mut self, step: PipelineStep, name: &str) -> ProcResult<TaskRef<'_>> {
        let available = self.names().map_err(|source| WorkflowError::Enumeration{step, source})?;
        if !available.iter().any(|task| task == name) {
            return Err(WorkflowError::TaskNotFound{step, task: name.to_string(), available});
        }
        Ok(TaskRef{session: &mut *self.session, name: name.to_string(), step})
    }
}

/// Handle to one named task, valid for a single use.
pub struct TaskRef<'c> {
    session: &'c mut dyn EngineSession,
    name: String,
    step: PipelineStep,
}
impl TaskRef<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_arguments(&mut self, arguments: &TaskArguments) -> ProcResult<()> {
        let result = self.session.set_task_arguments(&self.name, arguments);
        result.map_err(|error| self.step_error(error))
    }

    pub fn execute(&mut self) -> ProcResult<()> {
        let result = self.session.execute_task(&self.name);
        result.map_err(|error| self.step_error(error))
    }

    fn step_error(&mut self, error: EngineError) -> WorkflowError {
        match error {
            // The name vanished between lookup and use
            EngineError::TaskNotFound(_) => WorkflowError::TaskNotFound{
                step: self.step,
                task: self.name.clone(),
                available: self.session.task_names().unwrap_or_default(),
            },
            source => WorkflowError::TaskExecution{step: self.step, task: self.name.clone(), source},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineProvider, LaunchConfig};
    use crate::engine::methods::simulated;

    #[test]
    fn resolve_reports_available_names() {
        let provider = simulated::Method::new().unwrap();
        let mut session = provider.launch(&LaunchConfig::default()).unwrap();
        let mut tasks = TaskCollection::new(session.as_mut());
        tasks.initialize("Watertight Geometry").unwrap();

        let err = tasks.resolve(PipelineStep::VolumeMesh, "Generate the Volume Mesh").err().unwrap();
        match err {
            WorkflowError::TaskNotFound{step, task, available} => {
                assert_eq!(step, PipelineStep::VolumeMesh);
                assert_eq!(task, "Generate the Volume Mesh");
                assert!(available.contains(&"Import Geometry".to_string()));
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn resolved_task_executes() {
        let provider = simulated::Method::new().unwrap();
        let journal = provider.journal();
        let mut session = provider.launch(&LaunchConfig::default()).unwrap();
        let mut tasks = TaskCollection::new(session.as_mut());
        tasks.initialize("Watertight Geometry").unwrap();

        let mut task = tasks.resolve(PipelineStep::ImportGeometry, "Import Geometry").unwrap();
        assert_eq!(task.name(), "Import Geometry");
        task.set_arguments(&TaskArguments::new().with("LengthUnit", "m")).unwrap();
        task.execute().unwrap();

        assert_eq!(journal.executed(), vec!["Import Geometry"]);
        assert!(tasks.contains("Generate the Volume Mesh").unwrap());
    }

    #[test]
    fn rejected_workflow_is_init_error() {
        let provider = simulated::Method::new().unwrap();
        let mut session = provider.launch(&LaunchConfig::default()).unwrap();
        let mut tasks = TaskCollection::new(session.as_mut());
        let err = tasks.initialize("Fault-tolerant Meshing").unwrap_err();
        assert!(matches!(err, WorkflowError::WorkflowInit{..}));
    }
}
