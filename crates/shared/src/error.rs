use thiserror::Error;

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("persistence error for state key '{key}': {source}")]
    Persistence {
        key: String,
        source: anyhow::Error,
    },
}

impl SelectionError {
    pub fn persistence(key: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Persistence {
            key: key.into(),
            source,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, SelectionError::Configuration(_))
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, SelectionError::Persistence { .. })
    }
}

pub type Result<T> = std::result::Result<T, SelectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_error_names_key_and_cause() {
        let err = SelectionError::persistence("grid1", anyhow::anyhow!("quota exceeded"));
        assert!(err.is_persistence());
        assert_eq!(
            err.to_string(),
            "persistence error for state key 'grid1': quota exceeded"
        );
    }

    #[test]
    fn persistence_error_exposes_source() {
        use std::error::Error as _;

        let err = SelectionError::persistence("grid1", anyhow::anyhow!("disk full"));
        let source = err.source().expect("source");
        assert_eq!(source.to_string(), "disk full");
    }

    #[test]
    fn configuration_error_display() {
        let err = SelectionError::Configuration("record index field is required".into());
        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "configuration error: record index field is required"
        );
    }
}
