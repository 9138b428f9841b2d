use anyhow::Result;

use super::dn::DistinguishedName;

/// A configuration bound to a directory server on behalf of one user. The
/// session that receives it owns it and is the only caller of `close`.
pub trait DirectoryConfig: Send + Sync {
    /// The username the rest of the system knows this user by.
    fn username(&self) -> &str;

    /// The DN that was used for the bind.
    fn bind_dn(&self) -> &DistinguishedName;

    /// Release the underlying connection. Implementations need not tolerate
    /// being called twice.
    fn close(&self) -> Result<()>;
}

pub trait AuthenticationProvider: Send + Sync {
    fn identifier(&self) -> &str;
}
