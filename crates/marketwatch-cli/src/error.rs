use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] marketwatch_core::ValidationError),

    #[error(transparent)]
    Config(#[from] marketwatch_core::ConfigError),

    #[error(transparent)]
    Fetch(#[from] marketwatch_core::FetchError),

    #[error(transparent)]
    Persistence(#[from] marketwatch_core::PersistenceError),

    #[error(transparent)]
    Export(#[from] marketwatch_core::ExportError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Config(_) => 2,
            Self::Fetch(_) => 3,
            Self::Serialization(_) => 4,
            Self::Persistence(_) => 6,
            Self::Export(_) => 7,
            Self::Io(_) => 10,
        }
    }
}
