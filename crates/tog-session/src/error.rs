//! Error types for session orchestration

/// Errors from the session surface
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Prompt text was empty or whitespace-only
    #[error("prompt must not be empty")]
    EmptyPrompt,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_error_display() {
        assert!(SessionError::EmptyPrompt.to_string().contains("empty"));
    }
}
