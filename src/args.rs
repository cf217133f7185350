mod proc_errors;

use std::path::PathBuf;

use clap::{
    Args,
    Parser,
    Subcommand,
    ValueEnum,
};
use strum::{Display, EnumIter};

// Re-export errors
pub use proc_errors::{
    ArgError,
    ProcResult,
    err_str,
};

/// Meshing session driver: import geometry, mesh it, export the mesh.
#[derive(Debug, Parser)]
pub struct MeshDriverCli {
    #[clap(subcommand)]
    pub sub_command: Option<DriverCommand>,
}

/// Parser for the subcommands of the meshdriver binary using clap.
#[derive(Debug, Subcommand)]
pub enum DriverCommand {
    #[command(name = "run")]
    /// Run the meshing pipeline (default when no command is given).
    Run(RunArgs),

    #[command(name = "example")]
    /// Print an example config file.
    Example(ExampleArgs),
}

/// Arguments for the run command. Compiled with clap.
#[derive(Debug, Default, Args)]
pub struct RunArgs {
    #[arg(short, long = "config")]
    /// Path to the pipeline config file (.yaml/.yml, .json or .toml).
    pub cfg_file: Option<PathBuf>,

    #[arg(short = 'y', long = "yes")]
    /// Continue past the operator checkpoints without asking.
    pub auto_confirm: bool,

    #[arg(long)]
    /// Fail when no export task saved the mesh.
    pub strict_export: bool,

    #[arg(short, long)]
    /// Log at debug level.
    pub debug: bool,
}

/// Arguments for the example command. Compiled with clap.
#[derive(Debug, Args)]
pub struct ExampleArgs {
    #[arg(short, long, value_enum, default_value_t = Format::Yaml)]
    /// Output format.
    pub format: Format,

    #[arg(short, long)]
    /// Print the method cfg of this engine provider instead of the pipeline config.
    pub engine: Option<String>,
}

/// Config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Format {
    Yaml,
    Json,
    Toml,
}
impl Format {
    /// File extension for the format.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Yaml => "yaml",
            Format::Json => "json",
            Format::Toml => "toml",
        }
    }
}

/// Parse the command line arguments.
pub fn parse_cli_args() -> MeshDriverCli {
    MeshDriverCli::parse()
}
