use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoErrorType {
    #[error("- File IO Error:\n{0}")]
    File(std::io::Error),
    #[error("- File not found")]
    NotFound,
    #[error("- JSON Serialization/Deserialization Error:\n{0}")]
    SerdeJson(serde_json::Error),
    #[error("- YAML Serialization/Deserialization Error:\n{0}")]
    SerdeYaml(serde_yaml::Error),
    #[error("- TOML Serialization Error:\n{0}")]
    TomlSer(toml::ser::Error),
    #[error("- TOML Deserialization Error:\n{0}")]
    TomlDe(toml::de::Error),
    #[error("- {0}")]
    StringOnly(String),
}

/// Custom verbose IO error struct.
#[derive(Debug)]
pub struct IoError {
    /// Filepath facing an error.
    pub file: Option<String>,
    /// Error cause.
    pub cause: IoErrorType,
}
impl IoError {
    fn at(path: &Path, cause: IoErrorType) -> Self {
        IoError{file: Some(path.display().to_string()), cause}
    }

    /// True if the error is a missing input file.
    pub fn is_not_found(&self) -> bool {
        matches!(self.cause, IoErrorType::NotFound)
    }
}
impl std::fmt::Display for IoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.file {
            Some(ref file) => write!(f, "- Error with file: {}\n{}", file, self.cause),
            None => write!(f, "{}", self.cause),
        }
    }
}
impl std::error::Error for IoError {}

pub type IoResult<T> = std::result::Result<T, IoError>;

/// Open a file with verbose errors.
pub fn open(path: &Path) -> IoResult<std::fs::File> {
    std::fs::File::open(path).map_err(|error| IoError::at(path, IoErrorType::File(error)))
}

/// Read from string with verbose errors
pub fn read_to_string(path: &Path) -> IoResult<String> {
    std::fs::read_to_string(path).map_err(|error| IoError::at(path, IoErrorType::File(error)))
}

/// Read in cfg files from the supported filetypes.
pub fn read_cfg_file<T>(path: &Path) -> IoResult<T>
where T: serde::de::DeserializeOwned
{
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => {
            serde_json::from_reader(open(path)?)
                .map_err(|error| IoError::at(path, IoErrorType::SerdeJson(error)))
        },
        Some("toml") => {
            toml::from_str(&read_to_string(path)?)
                .map_err(|error| IoError::at(path, IoErrorType::TomlDe(error)))
        },
        Some("yaml") | Some("yml") => {
            serde_yaml::from_reader(open(path)?)
                .map_err(|error| IoError::at(path, IoErrorType::SerdeYaml(error)))
        },
        _ => {
            let supported_filetypes = vec!["json", "toml", "yaml", "yml"];
            let error_string = format!("Unsupported filetype for config file: {}\nSupported filetypes: {:?}", path.display(), supported_filetypes);
            Err(IoError::at(path, IoErrorType::StringOnly(error_string)))
        },
    }
}

/// Resolve the geometry input path and check that it exists.
/// Relative paths are resolved against the current directory.
pub fn resolve_input(path: &Path) -> IoResult<PathBuf> {
    let resolved = absolute(path)?;
    if !resolved.is_file() {
        return Err(IoError::at(&resolved, IoErrorType::NotFound));
    }
    Ok(resolved)
}

/// Resolve the output path and make sure its parent directory exists.
pub fn prepare_output(path: &Path) -> IoResult<PathBuf> {
    let resolved = absolute(path)?;
    if let Some(parent) = resolved.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|error| IoError::at(parent, IoErrorType::File(error)))?;
    }
    Ok(resolved)
}

/// List the file names in a directory, sorted.
/// Subdirectories are skipped.
pub fn list_files(dir: &Path) -> IoResult<Vec<String>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|error| IoError::at(dir, IoErrorType::File(error)))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|error| IoError::at(dir, IoErrorType::File(error)))?;
        if entry.path().is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

fn absolute(path: &Path) -> IoResult<PathBuf> {
    std::path::absolute(path).map_err(|error| IoError::at(path, IoErrorType::File(error)))
}

/// Serialize a value into one of the supported config formats.
pub fn to_cfg_string<T>(value: &T, extension: &str) -> IoResult<String>
where T: serde::Serialize
{
    match extension {
        "json" => serde_json::to_string_pretty(value)
            .map_err(|error| IoError{file: None, cause: IoErrorType::SerdeJson(error)}),
        "toml" => toml::to_string_pretty(value)
            .map_err(|error| IoError{file: None, cause: IoErrorType::TomlSer(error)}),
        "yaml" | "yml" => serde_yaml::to_string(value)
            .map_err(|error| IoError{file: None, cause: IoErrorType::SerdeYaml(error)}),
        _ => Err(IoError{file: None, cause: IoErrorType::StringOnly(format!("Unsupported config format: {}", extension))}),
    }
}
