use std::any::Any;
use std::io;
use thiserror::Error;

/// Errors raised while registering routes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("route `{pattern}`: segment `{segment}` would be absorbed by existing wildcard `{existing}`")]
    Conflict {
        pattern: String,
        existing: String,
        segment: String,
    },
}

impl RouteError {
    pub(crate) fn invalid(pattern: &str, reason: impl Into<String>) -> Self {
        RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by the host layer and by handler helpers.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    #[error("Payload too large: {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Request headers exceed {0} bytes")]
    HeaderTooLarge(usize),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Too many connections")]
    TooManyConnections,

    #[error("Panic: {0}")]
    Panic(String),
}

impl ServerError {
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::BadRequest(_) => 400,
            ServerError::PayloadTooLarge(_) => 413,
            ServerError::Json(_) => 422,
            ServerError::HeaderTooLarge(_) => 431,
            ServerError::UnsupportedMethod(_) => 501,
            ServerError::TooManyConnections => 503,
            ServerError::Io(_) | ServerError::Panic(_) => 500,
        }
    }
}

pub type ServerResult<T> = Result<T, ServerError>;

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ServerError::BadRequest("x".into()).status_code(), 400);
        assert_eq!(ServerError::UnsupportedMethod("BREW".into()).status_code(), 501);
        assert_eq!(ServerError::HeaderTooLarge(8192).status_code(), 431);
        assert_eq!(ServerError::TooManyConnections.status_code(), 503);
        assert_eq!(ServerError::Panic("boom".into()).status_code(), 500);
    }

    #[test]
    fn test_panic_message() {
        let payload = std::panic::catch_unwind(|| panic!("boom {}", 1)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "boom 1");
    }

    #[test]
    fn test_route_error_display() {
        let err = RouteError::invalid("/a/*b/c", "wildcard must be the last segment");
        assert_eq!(
            err.to_string(),
            "invalid route pattern `/a/*b/c`: wildcard must be the last segment"
        );
    }
}
