//! Directory-backed identities and the lifecycle of their sessions.
//! Keep the public surface thin and split implementation across sub-modules.

mod credentials;
mod directory;
mod dn;
mod registry;
mod session;

pub use credentials::{Credentials, CredentialsInfo, Field, FieldKind};
pub use directory::{AuthenticationProvider, DirectoryConfig};
pub use dn::{DistinguishedName, DnParseError, Rdn};
pub use registry::{InvalidationReport, SessionRegistry, SessionToken};
pub use session::AuthenticatedSession;
