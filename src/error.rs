// Error handling and response types for the confpack application
// Defines the domain error taxonomy, the actix-web error wrapper, and error code constants

use std::fmt::{Display, Formatter};

use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};

use crate::model::common::RestResult;

// Application-specific error types
#[derive(thiserror::Error, Debug)]
pub enum ConfpackError {
    #[error("validation error: {0}")]
    Validation(String), // Malformed or empty content for the declared type
    #[error("resource not found: {0}")]
    NotFound(String), // Referenced resource key / scope combination absent
    #[error("protected resource: {0}")]
    Protected(String), // Deletion attempted on a system-reserved alias
    #[error("storage error: {0}")]
    Storage(String), // Byte storage failure
    #[error("archive format error: {0}")]
    ArchiveFormat(String), // Unzip failure, missing manifest, undecodable JSON
    #[error("database error: {0}")]
    Database(String), // Database operation errors
    #[error("internal error: {0}")]
    Internal(String), // Internal server errors
}

// Wrapper for application errors to implement actix-web error handling
#[derive(Debug)]
pub struct AppError {
    inner: anyhow::Error, // Wrapped anyhow error
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        AppError { inner: value }
    }
}

impl From<ConfpackError> for AppError {
    fn from(value: ConfpackError) -> Self {
        AppError {
            inner: anyhow::Error::new(value),
        }
    }
}

impl actix_web::error::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        if let Some(e) = self.inner.downcast_ref::<ConfpackError>() {
            match e {
                ConfpackError::Validation(message) => RestResult::<String>::http_response(
                    400,
                    PARAMETER_VALIDATE_ERROR.code,
                    message.to_string(),
                    String::new(),
                ),
                ConfpackError::NotFound(message) => RestResult::<String>::http_response(
                    404,
                    RESOURCE_NOT_FOUND.code,
                    message.to_string(),
                    String::new(),
                ),
                ConfpackError::Protected(message) => RestResult::<String>::http_response(
                    403,
                    RESOURCE_PROTECTED.code,
                    message.to_string(),
                    String::new(),
                ),
                ConfpackError::ArchiveFormat(message) => RestResult::<String>::http_response(
                    400,
                    PARSING_DATA_FAILED.code,
                    message.to_string(),
                    String::new(),
                ),
                ConfpackError::Storage(message) => RestResult::<String>::http_response(
                    500,
                    DATA_ACCESS_ERROR.code,
                    message.to_string(),
                    String::new(),
                ),
                ConfpackError::Database(message) => RestResult::<String>::http_response(
                    500,
                    DATA_ACCESS_ERROR.code,
                    message.to_string(),
                    String::new(),
                ),
                ConfpackError::Internal(message) => RestResult::<String>::http_response(
                    500,
                    SERVER_ERROR.code,
                    message.to_string(),
                    String::new(),
                ),
            }
        } else {
            // Never surface internal stack traces; generic classification only
            RestResult::<String>::http_response(
                500,
                SERVER_ERROR.code,
                self.inner.to_string(),
                String::new(),
            )
        }
    }
}

// Error code structure for API responses
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ErrorCode<'a> {
    pub code: i32,        // Numeric error code
    pub message: &'a str, // Human-readable error message
}

// General success and error codes
pub const SUCCESS: ErrorCode<'static> = ErrorCode {
    code: 0,
    message: "success",
};

pub const PARAMETER_MISSING: ErrorCode<'static> = ErrorCode {
    code: 10000,
    message: "parameter missing",
};

pub const DATA_ACCESS_ERROR: ErrorCode<'static> = ErrorCode {
    code: 10002,
    message: "data access error",
};

pub const PARAMETER_VALIDATE_ERROR: ErrorCode<'static> = ErrorCode {
    code: 20002,
    message: "parameter validate error",
};

pub const RESOURCE_NOT_FOUND: ErrorCode<'static> = ErrorCode {
    code: 20004,
    message: "resource not found",
};

pub const RESOURCE_PROTECTED: ErrorCode<'static> = ErrorCode {
    code: 20005,
    message: "resource protected",
};

pub const SERVER_ERROR: ErrorCode<'static> = ErrorCode {
    code: 30000,
    message: "server error",
};

pub const PARSING_DATA_FAILED: ErrorCode<'static> = ErrorCode {
    code: 100004,
    message: "Failed to parse data",
};

pub const DATA_EMPTY: ErrorCode<'static> = ErrorCode {
    code: 100005,
    message: "Imported file data is empty",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confpack_error_display() {
        let err = ConfpackError::Validation("bad color".to_string());
        assert_eq!(format!("{}", err), "validation error: bad color");

        let err = ConfpackError::NotFound("cfg-1".to_string());
        assert_eq!(format!("{}", err), "resource not found: cfg-1");

        let err = ConfpackError::Protected("business_select".to_string());
        assert_eq!(format!("{}", err), "protected resource: business_select");

        let err = ConfpackError::ArchiveFormat("missing manifest".to_string());
        assert_eq!(format!("{}", err), "archive format error: missing manifest");
    }

    #[test]
    fn test_app_error_from_anyhow() {
        let anyhow_err = anyhow::anyhow!("test error");
        let app_err = AppError::from(anyhow_err);
        assert_eq!(format!("{}", app_err), "test error");
    }

    #[test]
    fn test_error_code_constants() {
        assert_eq!(SUCCESS.code, 0);
        assert_eq!(SUCCESS.message, "success");
        assert_eq!(PARAMETER_MISSING.code, 10000);
        assert_eq!(RESOURCE_NOT_FOUND.code, 20004);
        assert_eq!(RESOURCE_PROTECTED.code, 20005);
        assert_eq!(PARSING_DATA_FAILED.code, 100004);
    }
}
