use thiserror::Error;

/// Errors raised by the settings store.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Number of attempts must be at least 1 (got {0})")]
    InvalidAttempts(u32),

    #[error("Incorrect index: no alias at position {0}")]
    AliasIndex(usize),
}

pub type Result<T> = std::result::Result<T, SettingsError>;
