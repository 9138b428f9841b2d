//! Localizable messages and the credentials errors that carry them.

mod continuation;
mod message;
mod translatable;

pub use continuation::ContinuationState;
pub use message::{render, MessageCatalog, Translatable, TranslatableMessage};
pub use translatable::{CredentialsErrorKind, TranslatableError, TranslatableErrorBuilder};
