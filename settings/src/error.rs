use thiserror::Error;

pub type Result<T> = std::result::Result<T, SettingsError>;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Settings storage error: {0}")]
    Storage(String),

    #[error("Option path error: {0}")]
    Path(#[from] options::OptionsError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
