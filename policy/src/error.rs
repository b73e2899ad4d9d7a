use thiserror::Error;

pub type Result<T> = std::result::Result<T, PolicyError>;

#[derive(Error, Debug)]
pub enum PolicyError {
    /// Malformed JSON or a statement missing a mandatory field. The
    /// offending document is skipped entirely; the request goes on.
    #[error("Policy parsing failed: {0}")]
    Parse(String),

    /// Circular parent references between policy documents. The cycle is
    /// broken at the point of detection.
    #[error("Policy inheritance cycle through '{0}'")]
    Cycle(String),
}
