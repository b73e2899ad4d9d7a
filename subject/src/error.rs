use thiserror::Error;

pub type Result<T> = std::result::Result<T, SubjectError>;

#[derive(Error, Debug)]
pub enum SubjectError {
    #[error("Invalid principal spec: {0}")]
    InvalidPrincipal(String),
}
