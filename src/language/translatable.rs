use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::continuation::ContinuationState;
use super::message::{Translatable, TranslatableMessage};
use crate::identity::CredentialsInfo;

type Cause = Arc<dyn Error + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialsErrorKind {
    /// More credentials are needed before authentication can proceed.
    Insufficient,
    /// The supplied credentials were rejected.
    Invalid,
}

/// A credentials error with a localizable description. Fields are fixed at
/// construction; cloning shares the cause.
#[derive(Debug, Clone)]
pub struct TranslatableError {
    kind: CredentialsErrorKind,
    message: String,
    translatable: TranslatableMessage,
    cause: Option<Cause>,
    credentials_info: CredentialsInfo,
    continuation: Option<ContinuationState>,
}

/// Every constructor of [`TranslatableError`] goes through here.
#[derive(Debug)]
pub struct TranslatableErrorBuilder {
    inner: TranslatableError,
}

impl TranslatableErrorBuilder {
    pub fn kind(mut self, kind: CredentialsErrorKind) -> Self {
        self.inner.kind = kind;
        self
    }

    pub fn cause<E>(mut self, cause: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.inner.cause = Some(Arc::new(cause));
        self
    }

    pub fn credentials_info(mut self, info: CredentialsInfo) -> Self {
        self.inner.credentials_info = info;
        self
    }

    pub fn continuation(mut self, continuation: ContinuationState) -> Self {
        self.inner.continuation = Some(continuation);
        self
    }

    pub fn build(self) -> TranslatableError {
        self.inner
    }
}

impl TranslatableError {
    /// `translatable` may be a full [`TranslatableMessage`] or a bare key.
    pub fn builder<M, T>(message: M, translatable: T) -> TranslatableErrorBuilder
    where
        M: Into<String>,
        T: Into<TranslatableMessage>,
    {
        TranslatableErrorBuilder {
            inner: TranslatableError {
                kind: CredentialsErrorKind::Insufficient,
                message: message.into(),
                translatable: translatable.into(),
                cause: None,
                credentials_info: CredentialsInfo::empty(),
                continuation: None,
            },
        }
    }

    pub fn insufficient<M, T>(message: M, translatable: T, info: CredentialsInfo) -> Self
    where
        M: Into<String>,
        T: Into<TranslatableMessage>,
    {
        Self::builder(message, translatable).credentials_info(info).build()
    }

    pub fn insufficient_caused_by<M, T, E>(message: M, translatable: T, cause: E, info: CredentialsInfo) -> Self
    where
        M: Into<String>,
        T: Into<TranslatableMessage>,
        E: Error + Send + Sync + 'static,
    {
        Self::builder(message, translatable).cause(cause).credentials_info(info).build()
    }

    /// The multi-step form: the client is expected to answer `query_identifier`
    /// for `provider_identifier`, echoing `state` back before `expires`
    /// (milliseconds since the epoch).
    pub fn insufficient_with_continuation<M, K>(
        message: M,
        key: K,
        info: CredentialsInfo,
        state: impl Into<String>,
        provider_identifier: impl Into<String>,
        query_identifier: impl Into<String>,
        expires: i64,
    ) -> Self
    where
        M: Into<String>,
        K: Into<String>,
    {
        let continuation = ContinuationState {
            state: state.into(),
            provider_identifier: provider_identifier.into(),
            query_identifier: query_identifier.into(),
            expires_at: expires,
        };
        Self::builder(message, TranslatableMessage::new(key))
            .credentials_info(info)
            .continuation(continuation)
            .build()
    }

    pub fn invalid<M, T>(message: M, translatable: T, info: CredentialsInfo) -> Self
    where
        M: Into<String>,
        T: Into<TranslatableMessage>,
    {
        Self::builder(message, translatable)
            .kind(CredentialsErrorKind::Invalid)
            .credentials_info(info)
            .build()
    }

    pub fn kind(&self) -> CredentialsErrorKind { self.kind }

    pub fn message(&self) -> &str { &self.message }

    pub fn credentials_info(&self) -> &CredentialsInfo { &self.credentials_info }

    pub fn continuation(&self) -> Option<&ContinuationState> { self.continuation.as_ref() }

    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }
}

impl Translatable for TranslatableError {
    fn translatable_message(&self) -> &TranslatableMessage { &self.translatable }

    fn fallback_message(&self) -> &str { &self.message }
}

impl Display for TranslatableError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for TranslatableError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_deref().map(|c| c as &(dyn Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{render, MessageCatalog};
    use serde_json::Value;
    use std::collections::HashMap;

    struct Catalog(HashMap<&'static str, &'static str>);

    impl MessageCatalog for Catalog {
        fn lookup(&self, key: &str, _variables: Option<&Value>) -> Option<String> {
            self.0.get(key).map(|s| s.to_string())
        }
    }

    #[test]
    fn key_and_envelope_forms_agree() {
        let info = CredentialsInfo::username_password();
        let a = TranslatableError::insufficient("TOTP required", "LOGIN.INFO_TOTP_REQUIRED", info.clone());
        let b = TranslatableError::insufficient(
            "TOTP required",
            TranslatableMessage::new("LOGIN.INFO_TOTP_REQUIRED"),
            info,
        );
        assert_eq!(a.translatable_message().key, b.translatable_message().key);
        assert_eq!(a.translatable_message(), b.translatable_message());
        assert!(a.continuation().is_none());
    }

    #[test]
    fn continuation_fields_survive_construction() {
        let e = TranslatableError::insufficient_with_continuation(
            "Verification required",
            "LOGIN.INFO_VERIFICATION_REQUIRED",
            CredentialsInfo::empty(),
            "st-123",
            "duo",
            "duo-code",
            1_893_456_000_000,
        );
        let c = e.continuation().expect("continuation");
        assert_eq!(c.state, "st-123");
        assert_eq!(c.provider_identifier, "duo");
        assert_eq!(c.query_identifier, "duo-code");
        assert_eq!(c.expires_at, 1_893_456_000_000);
        assert_eq!(e.kind(), CredentialsErrorKind::Insufficient);
    }

    #[test]
    fn cause_is_exposed_as_source() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "directory unreachable");
        let e = TranslatableError::insufficient_caused_by("Login failed", "LOGIN.ERROR", io, CredentialsInfo::empty());
        assert_eq!(e.source().map(|s| s.to_string()).as_deref(), Some("directory unreachable"));
        assert_eq!(e.to_string(), "Login failed");
    }

    #[test]
    fn render_falls_back_to_literal_message() {
        let e = TranslatableError::invalid("Invalid login.", "LOGIN.ERROR_INVALID_LOGIN", CredentialsInfo::username_password());
        let empty = Catalog(HashMap::new());
        assert_eq!(render(&e, &empty), "Invalid login.");

        let de = Catalog(HashMap::from([("LOGIN.ERROR_INVALID_LOGIN", "Ungültige Anmeldung.")]));
        assert_eq!(render(&e, &de), "Ungültige Anmeldung.");
        assert_eq!(e.kind(), CredentialsErrorKind::Invalid);
    }
}
