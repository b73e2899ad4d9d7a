use thiserror::Error;

pub type Result<T> = std::result::Result<T, OptionsError>;

#[derive(Error, Debug)]
pub enum OptionsError {
    #[error("Option path error: {0}")]
    Path(String),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),
}
