//! Unified application error model and the typed errors it is built from.
//! Session and dialect code return the typed errors below; frontends convert
//! them into `AppError` for a status code and a stable machine-readable code.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use thiserror::Error;

use crate::dialect::VersionParseError;
use crate::language::{Translatable, TranslatableError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("authenticated session has already been initialized")]
    AlreadyInitialized,
    #[error("authenticated session used before init")]
    NotInitialized,
}

/// The bound directory configuration failed to close. The session is
/// invalidated regardless.
#[derive(Debug, Error)]
#[error("failed to release directory connection for \"{identifier}\"")]
pub struct ResourceReleaseError {
    pub identifier: String,
    #[source]
    pub source: anyhow::Error,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    ResourceRelease(#[from] ResourceReleaseError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    UserInput { code: String, message: String },
    Auth { code: String, message: String },
    Io { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::UserInput { code, .. }
            | AppError::Auth { code, .. }
            | AppError::Io { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::UserInput { message, .. }
            | AppError::Auth { message, .. }
            | AppError::Io { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn user<S: Into<String>>(code: S, msg: S) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn auth<S: Into<String>>(code: S, msg: S) -> Self { AppError::Auth { code: code.into(), message: msg.into() } }
    pub fn io<S: Into<String>>(code: S, msg: S) -> Self { AppError::Io { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::UserInput { .. } => 400,
            AppError::Auth { .. } => 401,
            AppError::Io { .. } => 503,
            AppError::Internal { .. } => 500,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<TranslatableError> for AppError {
    // The translation key doubles as the code so clients can localize.
    fn from(err: TranslatableError) -> Self {
        AppError::Auth { code: err.translatable_message().key.clone(), message: err.message().to_string() }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Lifecycle(e) => AppError::internal("session_lifecycle".to_string(), e.to_string()),
            SessionError::ResourceRelease(e) => AppError::io("resource_release".to_string(), format!("{:#}", anyhow::Error::from(e))),
        }
    }
}

impl From<VersionParseError> for AppError {
    fn from(err: VersionParseError) -> Self {
        AppError::UserInput { code: "version_parse".into(), message: err.to_string() }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal { code: "internal".into(), message: format!("{:#}", err) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::CredentialsInfo;

    #[test]
    fn http_status_mapping() {
        assert_eq!(AppError::user("bad_input", "oops").http_status(), 400);
        assert_eq!(AppError::auth("auth", "no").http_status(), 401);
        assert_eq!(AppError::io("io", "io").http_status(), 503);
        assert_eq!(AppError::internal("internal", "panic").http_status(), 500);
    }

    #[test]
    fn translatable_error_maps_key_to_code() {
        let e = TranslatableError::invalid("Invalid login.", "LOGIN.ERROR_INVALID_LOGIN", CredentialsInfo::username_password());
        let app: AppError = e.into();
        assert_eq!(app.code_str(), "LOGIN.ERROR_INVALID_LOGIN");
        assert_eq!(app.message(), "Invalid login.");
        assert_eq!(app.http_status(), 401);
    }

    #[test]
    fn release_error_keeps_cause_text() {
        let err = SessionError::from(ResourceReleaseError {
            identifier: "alice".into(),
            source: anyhow::anyhow!("socket closed"),
        });
        let app = AppError::from(err);
        assert_eq!(app.code_str(), "resource_release");
        assert!(app.message().contains("alice"));
        assert!(app.message().contains("socket closed"));
    }

    #[test]
    fn serializes_with_type_tag() {
        let v = serde_json::to_value(AppError::from(SessionError::from(LifecycleError::NotInitialized))).unwrap();
        assert_eq!(v["type"], "internal");
        assert_eq!(v["code"], "session_lifecycle");
    }
}
