use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

use crate::{
    args,
    engine::{
        EngineChoice,
        EngineProvider,
        LaunchConfig,
    },
    workflow::WorkflowCfg,
};

/// Engine selection in the pipeline config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineArgs {
    /// Engine provider method.
    #[serde(rename = "method", default = "EngineArgs::default_method_name")]
    pub method_name: String,

    /// Provider method_cfg file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_cfg: Option<PathBuf>,
}
impl EngineArgs {
    pub fn default_method_name() -> String {
        "bridge".to_string()
    }

    /// Construct the engine provider and load its method cfg.
    pub fn build_provider(&self) -> args::ProcResult<EngineChoice> {
        let mut provider = EngineChoice::from_name(&self.method_name)?;
        if let Some(method_cfg) = &self.method_cfg {
            provider.parse_method_cfg(method_cfg)?;
        }
        Ok(provider)
    }
}
impl Default for EngineArgs {
    fn default() -> Self {
        EngineArgs{method_name: Self::default_method_name(), method_cfg: None}
    }
}

/// Pipeline config file.
/// Every field has a default, an empty file runs the stock pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineCfg {
    /// Geometry file to import.
    #[serde(default = "PipelineCfg::default_geometry_path", alias = "geometry", alias = "input", alias = "in", alias = "i")]
    pub geometry_path: PathBuf,

    /// Destination of the exported mesh.
    #[serde(default = "PipelineCfg::default_output_path", alias = "output", alias = "out", alias = "o")]
    pub output_path: PathBuf,

    /// Treat an unsaved mesh as a failure.
    #[serde(default)]
    pub strict_export: bool,

    /// Skip the operator prompts.
    #[serde(default, alias = "yes")]
    pub auto_confirm: bool,

    /// Log filter used when `RUST_LOG` is not set.
    #[serde(default = "PipelineCfg::default_log_level")]
    pub log_level: String,

    /// Engine launch options.
    #[serde(default)]
    pub launch: LaunchConfig,

    /// Workflow task names and arguments.
    #[serde(default)]
    pub workflow: WorkflowCfg,

    /// Engine provider.
    #[serde(default)]
    pub engine: EngineArgs,
}
impl PipelineCfg {
    pub fn default_geometry_path() -> PathBuf {
        PathBuf::from("Input_files").join("Static Mixer geometry.pmdb")
    }
    pub fn default_output_path() -> PathBuf {
        PathBuf::from("Output_files").join("static_mixer_mesh.msh")
    }
    pub fn default_log_level() -> String {
        "info".to_string()
    }

    /// Load a config file (json, toml or yaml).
    pub fn from_cfg_file(cfg_file: &Path) -> args::ProcResult<Self> {
        Ok(crate::io::read_cfg_file(cfg_file)?)
    }

    /// Config from an optional file, with command line flags applied on top.
    pub fn from_run_args(run_args: &args::RunArgs) -> args::ProcResult<Self> {
        let mut cfg = match &run_args.cfg_file {
            Some(cfg_file) => Self::from_cfg_file(cfg_file)?,
            None => Self::default(),
        };
        cfg.strict_export |= run_args.strict_export;
        cfg.auto_confirm |= run_args.auto_confirm;
        if run_args.debug {
            cfg.log_level = "debug".to_string();
        }
        Ok(cfg)
    }
}
impl Default for PipelineCfg {
    fn default() -> Self {
        PipelineCfg{
            geometry_path: Self::default_geometry_path(),
            output_path: Self::default_output_path(),
            strict_export: false,
            auto_confirm: false,
            log_level: Self::default_log_level(),
            launch: LaunchConfig::default(),
            workflow: WorkflowCfg::default(),
            engine: EngineArgs::default(),
        }
    }
}
