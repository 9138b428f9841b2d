use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message key plus optional substitution values, resolved to text by a
/// rendering layer in the user's language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatableMessage {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
}

impl TranslatableMessage {
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self { key: key.into(), variables: None }
    }

    pub fn with_variables<S: Into<String>>(key: S, variables: Value) -> Self {
        Self { key: key.into(), variables: Some(variables) }
    }
}

impl From<&str> for TranslatableMessage {
    fn from(key: &str) -> Self { Self::new(key) }
}

impl From<String> for TranslatableMessage {
    fn from(key: String) -> Self { Self::new(key) }
}

/// Anything carrying both a translatable message and a literal fallback.
pub trait Translatable {
    fn translatable_message(&self) -> &TranslatableMessage;

    /// Human-readable as written, for logs and catalogs that miss the key.
    fn fallback_message(&self) -> &str;
}

/// Localization collaborator. Returns `None` when it has no entry for `key`.
pub trait MessageCatalog {
    fn lookup(&self, key: &str, variables: Option<&Value>) -> Option<String>;
}

/// Resolve `item` through `catalog`, falling back to its literal message.
pub fn render(item: &dyn Translatable, catalog: &dyn MessageCatalog) -> String {
    let msg = item.translatable_message();
    catalog
        .lookup(&msg.key, msg.variables.as_ref())
        .unwrap_or_else(|| item.fallback_message().to_string())
}
