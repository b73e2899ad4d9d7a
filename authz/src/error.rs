//! Error types for the access engine.
//!
//! Query paths (`is_denied`, `get_redirect`, `get_effective_settings`) are
//! total and never surface errors; the variants here cover the mutation
//! side. Degradations during resolution are reported on the diagnostics
//! channel instead.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The settings store rejected a write or delete.
    #[error("Settings mutation failed: {0}")]
    Settings(#[from] settings::SettingsError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use settings::SettingsError;

    #[test]
    fn test_error_display() {
        let err = EngineError::from(SettingsError::Storage("disk gone".to_string()));
        assert_eq!(
            err.to_string(),
            "Settings mutation failed: Settings storage error: disk gone"
        );
    }
}
