use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for {field}: {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Source data error: {message}")]
    SourceError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Source,
    Processing,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::CsvError(_) | EtlError::SourceError { .. } => ErrorCategory::Source,
            EtlError::SerializationError(_) => ErrorCategory::Processing,
            EtlError::ZipError(_) | EtlError::IoError(_) => ErrorCategory::Output,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::IoError(e) if e.kind() == std::io::ErrorKind::Interrupted => {
                ErrorSeverity::Medium
            }
            EtlError::CsvError(_)
            | EtlError::SourceError { .. }
            | EtlError::SerializationError(_)
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorSeverity::High,
            EtlError::ZipError(_) | EtlError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    /// Process exit code for a failed run.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => "Check the command line arguments or the TOML configuration file",
            ErrorCategory::Source => "Check that the source files exist and match the expected pallet/box layout",
            ErrorCategory::Processing => "Inspect the source records; invalid pallets and boxes are skipped automatically",
            ErrorCategory::Output => "Check that the output directory exists and is writable",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Source => format!("Could not read pallet records: {}", self),
            ErrorCategory::Processing => format!("Could not process pallet records: {}", self),
            ErrorCategory::Output => format!("Could not write the report: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_high_severity() {
        let err = EtlError::MissingConfigError {
            field: "source.path".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("source.path"));
    }

    #[test]
    fn test_error_severity_maps_to_nonzero_exit() {
        let errors = [
            EtlError::SourceError {
                message: "expected a JSON array of pallets".to_string(),
            },
            EtlError::IoError(std::io::Error::new(std::io::ErrorKind::NotFound, "missing")),
            EtlError::IoError(std::io::Error::new(std::io::ErrorKind::Interrupted, "signal")),
        ];
        let severities: Vec<_> = errors.iter().map(EtlError::severity).collect();
        assert_eq!(
            severities,
            vec![ErrorSeverity::High, ErrorSeverity::Critical, ErrorSeverity::Medium]
        );
        assert!(errors.iter().all(|e| e.exit_code() != 0));
    }

    #[test]
    fn test_serialization_errors_are_processing() {
        let err: EtlError = serde_json::from_str::<serde_json::Value>("not json")
            .unwrap_err()
            .into();
        assert_eq!(err.category(), ErrorCategory::Processing);
        assert_eq!(err.severity(), ErrorSeverity::High);
    }
}
