use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Store '{}' is not a readable index: {reason}", path.display())]
    StoreFormat { path: PathBuf, reason: String },

    #[error("Could not save store '{}': {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not encode store '{}': {reason}", path.display())]
    PersistenceFormat { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn store_format(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        AppError::StoreFormat {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Persistence {
            path: path.into(),
            source,
        }
    }

    pub fn persistence_format(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        AppError::PersistenceFormat {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Configuration(_) => "configuration",
            AppError::StoreFormat { .. } => "store_format",
            AppError::Persistence { .. } | AppError::PersistenceFormat { .. } => "persistence",
            AppError::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_format_message_names_path() {
        let err = AppError::store_format("/tmp/Libro7.xlsx", "zip header missing");
        let msg = err.to_string();
        assert!(msg.contains("/tmp/Libro7.xlsx"));
        assert!(msg.contains("zip header missing"));
        assert_eq!(err.kind(), "store_format");
    }

    #[test]
    fn test_persistence_keeps_io_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked");
        let err = AppError::persistence("index.xlsx", io);
        assert_eq!(err.kind(), "persistence");
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "locked");
    }
}
