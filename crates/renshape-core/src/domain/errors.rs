use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RenshapeResult<T> = Result<T, RenshapeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Success,
    InputValidation,
    NotFound,
    MalformedSource,
    ExternalToolFailure,
    StoreIoFailure,
    Internal,
}

impl ErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::InputValidation => 2,
            Self::NotFound => 3,
            Self::MalformedSource => 4,
            Self::ExternalToolFailure => 5,
            Self::StoreIoFailure => 6,
            Self::Internal => 7,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::InputValidation => "InputValidation",
            Self::NotFound => "NotFound",
            Self::MalformedSource => "MalformedSource",
            Self::ExternalToolFailure => "ExternalToolFailure",
            Self::StoreIoFailure => "StoreIoFailure",
            Self::Internal => "Internal",
        }
    }

    /// Errors scoped to one nuclide. A batch logs them and moves on.
    pub const fn is_per_nuclide(self) -> bool {
        matches!(
            self,
            Self::NotFound | Self::MalformedSource | Self::ExternalToolFailure
        )
    }

    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::Success)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenshapeError {
    category: ErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl RenshapeError {
    pub fn new(category: ErrorCategory, placeholder: &'static str, message: impl Into<String>) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn input_validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::InputValidation, placeholder, message)
    }

    pub fn not_found(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::NotFound, placeholder, message)
    }

    pub fn malformed_source(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::MalformedSource, placeholder, message)
    }

    pub fn external_tool(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::ExternalToolFailure, placeholder, message)
    }

    pub fn store_io(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::StoreIoFailure, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Internal, placeholder, message)
    }

    pub const fn category(&self) -> ErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        let severity = if self.category.is_fatal() {
            "ERROR"
        } else {
            "INFO"
        };
        format!("{}: [{}] {}", severity, self.placeholder, self.message)
    }
}

impl Display for RenshapeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.as_str(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for RenshapeError {}

#[cfg(test)]
mod tests {
    use super::{ErrorCategory, RenshapeError};

    #[test]
    fn exit_codes_are_stable() {
        let cases = [
            (ErrorCategory::Success, 0),
            (ErrorCategory::InputValidation, 2),
            (ErrorCategory::NotFound, 3),
            (ErrorCategory::MalformedSource, 4),
            (ErrorCategory::ExternalToolFailure, 5),
            (ErrorCategory::StoreIoFailure, 6),
            (ErrorCategory::Internal, 7),
        ];

        for (category, exit_code) in cases {
            assert_eq!(category.exit_code(), exit_code, "{}", category.as_str());
        }
    }

    #[test]
    fn only_store_and_internal_errors_abort_a_batch() {
        assert!(ErrorCategory::NotFound.is_per_nuclide());
        assert!(ErrorCategory::MalformedSource.is_per_nuclide());
        assert!(ErrorCategory::ExternalToolFailure.is_per_nuclide());
        assert!(!ErrorCategory::StoreIoFailure.is_per_nuclide());
        assert!(!ErrorCategory::Internal.is_per_nuclide());
    }

    #[test]
    fn diagnostic_line_includes_placeholder() {
        let error = RenshapeError::not_found("ARCHIVE.NOT_FOUND", "nuclide '135I' is not in the archive");

        assert_eq!(error.exit_code(), 3);
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [ARCHIVE.NOT_FOUND] nuclide '135I' is not in the archive"
        );
        assert_eq!(
            error.to_string(),
            "NotFound [ARCHIVE.NOT_FOUND] nuclide '135I' is not in the archive"
        );
    }
}
