use std::fmt::{Debug, Formatter};

use serde::{Deserialize, Serialize};

/// What the user submitted when authenticating. Held as a snapshot; never
/// re-validated here.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
    pub remote_address: Option<String>,
    pub remote_hostname: Option<String>,
}

impl Credentials {
    pub fn new<S: Into<String>>(username: S, password: S) -> Self {
        Self { username: Some(username.into()), password: Some(password.into()), ..Default::default() }
    }

    pub fn with_remote_address<S: Into<String>>(mut self, addr: S) -> Self {
        self.remote_address = Some(addr.into());
        self
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("remote_address", &self.remote_address)
            .field("remote_hostname", &self.remote_hostname)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldKind {
    Username,
    Password,
    Text,
    Query,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
}

impl Field {
    pub fn new<S: Into<String>>(name: S, kind: FieldKind) -> Self {
        Self { name: name.into(), kind }
    }
}

/// The form of credentials a provider expects, sent back to the client when
/// the ones it supplied were missing or rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsInfo {
    pub fields: Vec<Field>,
}

impl CredentialsInfo {
    pub fn new(fields: Vec<Field>) -> Self { Self { fields } }

    pub fn empty() -> Self { Self::default() }

    pub fn username_password() -> Self {
        Self::new(vec![
            Field::new("username", FieldKind::Username),
            Field::new("password", FieldKind::Password),
        ])
    }
}
