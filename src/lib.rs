pub mod config;
pub mod dialect;
pub mod error;
pub mod identity;
pub mod language;

pub use config::Settings;
pub use dialect::{CapabilityPolicy, VersionInfo};
pub use error::{AppError, AppResult, LifecycleError, ResourceReleaseError, SessionError};
pub use identity::{AuthenticatedSession, SessionRegistry};
pub use language::{Translatable, TranslatableError, TranslatableMessage};
