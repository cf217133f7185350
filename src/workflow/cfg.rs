use serde::{Serialize, Deserialize};

/// Names and arguments used by the meshing workflow.
/// Engine versions rename tasks, so every name can be overridden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowCfg {
    /// Workflow template declared before any task.
    #[serde(default = "WorkflowCfg::default_workflow_type", alias = "type")]
    pub workflow_type: String,

    /// Length unit of the geometry file.
    #[serde(default = "WorkflowCfg::default_length_unit", alias = "unit")]
    pub length_unit: String,

    /// Geometry import task.
    #[serde(default = "WorkflowCfg::default_import_task")]
    pub import_task: String,

    /// Surface mesh task.
    #[serde(default = "WorkflowCfg::default_surface_mesh_task", alias = "surface_task")]
    pub surface_mesh_task: String,

    /// Volume mesh task.
    #[serde(default = "WorkflowCfg::default_volume_mesh_task", alias = "volume_task")]
    pub volume_mesh_task: String,

    /// Export task names, tried in order.
    #[serde(default = "WorkflowCfg::default_export_candidates", alias = "export_tasks")]
    pub export_candidates: Vec<String>,

    /// File type handed to the export task.
    #[serde(default = "WorkflowCfg::default_export_file_type", alias = "file_type")]
    pub export_file_type: String,
}
impl WorkflowCfg {
    pub fn default_workflow_type() -> String {
        "Watertight Geometry".to_string()
    }
    pub fn default_length_unit() -> String {
        "m".to_string()
    }
    pub fn default_import_task() -> String {
        "Import Geometry".to_string()
    }
    pub fn default_surface_mesh_task() -> String {
        "Generate the Surface Mesh".to_string()
    }
    pub fn default_volume_mesh_task() -> String {
        "Generate the Volume Mesh".to_string()
    }
    pub fn default_export_candidates() -> Vec<String> {
        ["Save Mesh", "Write Output", "Export Mesh", "Write Mesh", "Save Output"]
            .iter()
            .map(|name| name.to_string())
            .collect()
    }
    pub fn default_export_file_type() -> String {
        "Case".to_string()
    }
}
impl Default for WorkflowCfg {
    fn default() -> Self {
        WorkflowCfg{
            workflow_type: Self::default_workflow_type(),
            length_unit: Self::default_length_unit(),
            import_task: Self::default_import_task(),
            surface_mesh_task: Self::default_surface_mesh_task(),
            volume_mesh_task: Self::default_volume_mesh_task(),
            export_candidates: Self::default_export_candidates(),
            export_file_type: Self::default_export_file_type(),
        }
    }
}
