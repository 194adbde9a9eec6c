pub type PlakatResult<T> = Result<T, PlakatError>;

#[derive(thiserror::Error, Debug)]
pub enum PlakatError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("allocation error: {0}")]
    Allocation(String),

    #[error("render error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlakatError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn allocation(msg: impl Into<String>) -> Self {
        Self::Allocation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            PlakatError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            PlakatError::allocation("x")
                .to_string()
                .contains("allocation error:")
        );
        assert!(
            PlakatError::internal("x")
                .to_string()
                .contains("render error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = PlakatError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
