use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::credentials::Credentials;
use super::directory::{AuthenticationProvider, DirectoryConfig};
use super::dn::DistinguishedName;
use crate::error::{LifecycleError, ResourceReleaseError, SessionError};

struct SessionState {
    identifier: String,
    bind_dn: DistinguishedName,
    credentials: Credentials,
    tokens: HashMap<String, String>,
    effective_groups: HashSet<String>,
    config: Box<dyn DirectoryConfig>,
}

/// A user authenticated against a directory. Owns the directory
/// configuration bound for that user until `invalidate` releases it.
///
/// Everything captured at `init` stays readable after invalidation.
pub struct AuthenticatedSession {
    provider: Arc<dyn AuthenticationProvider>,
    state: OnceCell<SessionState>,
    released: Mutex<bool>,
}

impl AuthenticatedSession {
    pub fn new(provider: Arc<dyn AuthenticationProvider>) -> Self {
        Self { provider, state: OnceCell::new(), released: Mutex::new(false) }
    }

    /// Bind this session to `config`. `tokens` are the name/value pairs applied
    /// as parameter tokens when connections are established for this user.
    ///
    /// May succeed only once. On a second call the new `config` is dropped
    /// without being closed.
    pub fn init(
        &self,
        config: Box<dyn DirectoryConfig>,
        credentials: Credentials,
        tokens: HashMap<String, String>,
        effective_groups: HashSet<String>,
    ) -> Result<(), LifecycleError> {
        let state = SessionState {
            identifier: config.username().to_string(),
            bind_dn: config.bind_dn().clone(),
            credentials,
            tokens,
            effective_groups,
            config,
        };
        let identifier = state.identifier.clone();
        self.state.set(state).map_err(|_| LifecycleError::AlreadyInitialized)?;
        debug!(target: "dirauth::session", "session.init user={} provider={}", identifier, self.provider.identifier());
        Ok(())
    }

    fn state(&self) -> Result<&SessionState, LifecycleError> {
        self.state.get().ok_or(LifecycleError::NotInitialized)
    }

    pub fn is_initialized(&self) -> bool { self.state.get().is_some() }

    pub fn identifier(&self) -> Result<&str, LifecycleError> {
        Ok(self.state()?.identifier.as_str())
    }

    pub fn tokens(&self) -> Result<&HashMap<String, String>, LifecycleError> {
        Ok(&self.state()?.tokens)
    }

    pub fn bind_dn(&self) -> Result<&DistinguishedName, LifecycleError> {
        Ok(&self.state()?.bind_dn)
    }

    pub fn effective_groups(&self) -> Result<&HashSet<String>, LifecycleError> {
        Ok(&self.state()?.effective_groups)
    }

    pub fn credentials(&self) -> Result<&Credentials, LifecycleError> {
        Ok(&self.state()?.credentials)
    }

    /// The directory configuration to use for further queries on behalf of
    /// this user. Still returned after invalidation, but closed by then.
    pub fn ldap_configuration(&self) -> Result<&dyn DirectoryConfig, LifecycleError> {
        Ok(self.state()?.config.as_ref())
    }

    pub fn authentication_provider(&self) -> &Arc<dyn AuthenticationProvider> {
        &self.provider
    }

    pub fn is_invalidated(&self) -> bool { *self.released.lock() }

    /// Release the bound directory configuration. Only the first call closes
    /// it; concurrent callers wait until that close has finished and later
    /// calls return `Ok(())`. A failed close is returned once and never
    /// retried.
    pub fn invalidate(&self) -> Result<(), SessionError> {
        let state = self.state()?;
        let mut released = self.released.lock();
        if *released {
            return Ok(());
        }
        *released = true;
        match state.config.close() {
            Ok(()) => {
                debug!(target: "dirauth::session", "session.invalidate user={}", state.identifier);
                Ok(())
            }
            Err(source) => {
                warn!(target: "dirauth::session", "session.invalidate user={} close failed: {:#}", state.identifier, source);
                Err(ResourceReleaseError { identifier: state.identifier.clone(), source }.into())
            }
        }
    }
}

impl std::fmt::Debug for AuthenticatedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedSession")
            .field("provider", &self.provider.identifier())
            .field("identifier", &self.state.get().map(|s| s.identifier.as_str()))
            .field("invalidated", &self.is_invalidated())
            .finish()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
