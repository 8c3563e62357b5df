use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Per-field validation messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        // 每個欄位只保留第一個錯誤
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(MarketError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Cannot connect to {service}")]
    Connectivity {
        service: BackendService,
        #[source]
        source: reqwest::Error,
    },

    #[error("Backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfig { field: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidation { field: String, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Which part of the hosted backend a connectivity failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendService {
    Database,
    Storage,
    Auth,
}

impl fmt::Display for BackendService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendService::Database => "database",
            BackendService::Storage => "storage service",
            BackendService::Auth => "authentication service",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Connectivity,
    Backend,
    NotFound,
    Validation,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MarketError {
    /// Classify a transport error: anything that never reached the backend
    /// is reported as a connectivity failure for the given service.
    pub fn from_transport(service: BackendService, err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            MarketError::Connectivity {
                service,
                source: err,
            }
        } else {
            MarketError::Http(err)
        }
    }

    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        MarketError::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    pub fn invalid_value(field: &str, value: impl fmt::Display, reason: impl Into<String>) -> Self {
        MarketError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            MarketError::Connectivity { .. } | MarketError::Http(_) => ErrorCategory::Connectivity,
            MarketError::Backend { .. } => ErrorCategory::Backend,
            MarketError::NotFound { .. } => ErrorCategory::NotFound,
            MarketError::Validation(_) | MarketError::InvalidValue { .. } => {
                ErrorCategory::Validation
            }
            MarketError::MissingConfig { .. } | MarketError::ConfigValidation { .. } => {
                ErrorCategory::Configuration
            }
            MarketError::Io(_) | MarketError::Serialization(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::NotFound => ErrorSeverity::Low,
            ErrorCategory::Connectivity | ErrorCategory::Backend => ErrorSeverity::Medium,
            ErrorCategory::Validation | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Message meant for the person using the app, not for logs.
    pub fn user_friendly_message(&self) -> String {
        match self {
            MarketError::Connectivity { service, .. } => format!(
                "Cannot connect to {}. Your backend project may be paused or deleted. \
                 Please check the project status in your backend dashboard.",
                service
            ),
            MarketError::Http(_) => "The request to the backend failed".to_string(),
            MarketError::Backend { message, .. } => message.clone(),
            MarketError::NotFound { resource, .. } => format!("{} not found", resource),
            MarketError::Validation(errors) => format!("Please fix the highlighted fields ({})", errors),
            MarketError::InvalidValue { field, reason, .. } => format!("{}: {}", field, reason),
            MarketError::MissingConfig { field } => {
                format!("Configuration value '{}' is required", field)
            }
            MarketError::ConfigValidation { field, message } => format!("{}: {}", field, message),
            MarketError::Io(e) => format!("File system error: {}", e),
            MarketError::Serialization(_) => "Unexpected data format from the backend".to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Connectivity => {
                "Check your network connection and that the backend project is running"
            }
            ErrorCategory::Backend => "Retry the action; if it keeps failing, check the backend logs",
            ErrorCategory::NotFound => "Go back to the marketplace and pick another item",
            ErrorCategory::Validation => "Correct the listed fields and try again",
            ErrorCategory::Configuration => "Review skillswap.toml and the referenced environment variables",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, MarketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_keep_first_message() {
        let mut errors = FieldErrors::new();
        errors.add("email", "Email is required");
        errors.add("email", "Please enter a valid email address");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("email"), Some("Email is required"));
    }

    #[test]
    fn test_empty_field_errors_is_ok() {
        assert!(FieldErrors::new().into_result().is_ok());

        let mut errors = FieldErrors::new();
        errors.add("password", "Password is required");
        let err = errors.into_result().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_not_found_is_low_severity() {
        let err = MarketError::not_found("Profile", "42");
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.user_friendly_message(), "Profile not found");
    }

    #[test]
    fn test_backend_message_is_passed_through() {
        let err = MarketError::Backend {
            status: 409,
            message: "duplicate key value".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Backend);
        assert_eq!(err.user_friendly_message(), "duplicate key value");
    }
}
