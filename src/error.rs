use thiserror::Error;

use crate::core::TaskId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("No home directory")]
    NoHomeDir,

    #[error("Precedence graph contains a cycle through task {task}")]
    Cycle { task: TaskId },

    #[error("Longest precedence chain needs {required} stations, only {available} available")]
    Infeasible { required: usize, available: usize },

    #[error("Invalid input for {entity}: {reason}")]
    InvalidInput { entity: String, reason: String },
}

impl Error {
    pub fn invalid_input(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    /// Name of the error kind as printed by the CLI.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Cycle { .. } => "CycleError",
            Error::Infeasible { .. } => "InfeasibleError",
            Error::InvalidInput { .. } => "InvalidInputError",
            Error::Io(_) => "IoError",
            Error::Json(_) => "OutputError",
            Error::TomlParse(_) | Error::NoHomeDir => "ConfigError",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Cycle { .. } => 2,
            Error::Infeasible { .. } => 3,
            Error::InvalidInput { .. } => 4,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
