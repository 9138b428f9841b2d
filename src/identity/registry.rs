use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use base64::Engine;
use parking_lot::RwLock;
use tracing::{debug, info};

use super::session::AuthenticatedSession;
use crate::error::SessionError;

pub type SessionToken = String;

struct SessionEntry {
    session: Arc<AuthenticatedSession>,
    issued_at: Instant,
    expires_at: Instant,
}

/// Outcome of removing several sessions at once. Every removed session has
/// been invalidated; `failures` holds the ones whose release failed.
#[derive(Debug, Default)]
pub struct InvalidationReport {
    pub invalidated: usize,
    pub failures: Vec<SessionError>,
}

fn gen_token() -> Result<SessionToken> {
    // 256-bit random token base64url without padding
    let mut buf = [0u8; 32];
    getrandom::getrandom(&mut buf).map_err(|e| anyhow!("session token generation failed: {}", e))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf))
}

/// Active sessions keyed by token. Each removal path (logout, revocation,
/// expiry) invalidates the session it removes.
pub struct SessionRegistry {
    ttl: Duration,
    sessions: RwLock<HashMap<SessionToken, SessionEntry>>,
    user_index: RwLock<HashMap<String, HashSet<SessionToken>>>,
}

impl Default for SessionRegistry {
    fn default() -> Self { Self::new(Duration::from_secs(60 * 60)) }
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, sessions: RwLock::new(HashMap::new()), user_index: RwLock::new(HashMap::new()) }
    }

    pub fn ttl(&self) -> Duration { self.ttl }

    pub fn len(&self) -> usize { self.sessions.read().len() }

    pub fn is_empty(&self) -> bool { self.sessions.read().is_empty() }

    /// Register an initialized session and hand back its token.
    pub fn issue(&self, session: Arc<AuthenticatedSession>) -> Result<SessionToken> {
        self.issue_at(session, Instant::now())
    }

    pub fn issue_at(&self, session: Arc<AuthenticatedSession>, now: Instant) -> Result<SessionToken> {
        let user = session.identifier()?.to_string();
        let expires_at = now
            .checked_add(self.ttl)
            .ok_or_else(|| anyhow!("session ttl of {}s is out of range", self.ttl.as_secs()))?;
        let token = gen_token()?;
        let entry = SessionEntry { session, issued_at: now, expires_at };
        // Lock order: sessions, then user_index
        let mut sessions = self.sessions.write();
        let mut idx = self.user_index.write();
        sessions.insert(token.clone(), entry);
        idx.entry(user.clone()).or_default().insert(token.clone());
        drop(idx);
        drop(sessions);
        debug!(target: "dirauth::registry", "session.issue user={} ttl_secs={}", user, self.ttl.as_secs());
        Ok(token)
    }

    /// The live session for `token`, or `None` if unknown or past its expiry.
    pub fn get(&self, token: &str) -> Option<Arc<AuthenticatedSession>> {
        self.get_at(token, Instant::now())
    }

    pub fn get_at(&self, token: &str, now: Instant) -> Option<Arc<AuthenticatedSession>> {
        let map = self.sessions.read();
        map.get(token).filter(|e| e.expires_at > now).map(|e| e.session.clone())
    }

    /// How long `token` has been registered.
    pub fn age(&self, token: &str) -> Option<Duration> {
        self.sessions.read().get(token).map(|e| e.issued_at.elapsed())
    }

    fn remove(&self, token: &str) -> Option<SessionEntry> {
        let mut sessions = self.sessions.write();
        let entry = sessions.remove(token)?;
        if let Ok(user) = entry.session.identifier() {
            let mut idx = self.user_index.write();
            if let Some(set) = idx.get_mut(user) {
                set.remove(token);
                if set.is_empty() { idx.remove(user); }
            }
        }
        Some(entry)
    }

    /// Remove and invalidate the session for `token`. `Ok(false)` if there
    /// was none.
    pub fn logout(&self, token: &str) -> Result<bool, SessionError> {
        match self.remove(token) {
            Some(entry) => {
                entry.session.invalidate()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn invalidate_all(&self, tokens: Vec<SessionToken>) -> InvalidationReport {
        let mut report = InvalidationReport::default();
        for t in tokens {
            if let Some(entry) = self.remove(&t) {
                report.invalidated += 1;
                if let Err(e) = entry.session.invalidate() {
                    report.failures.push(e);
                }
            }
        }
        report
    }

    pub fn revoke_user(&self, user: &str) -> InvalidationReport {
        let tokens: Vec<SessionToken> = self
            .user_index
            .read()
            .get(user)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        let report = self.invalidate_all(tokens);
        info!(target: "dirauth::registry", "session.revoke user={} count={}", user, report.invalidated);
        report
    }

    pub fn sweep_expired(&self) -> InvalidationReport {
        self.sweep_expired_at(Instant::now())
    }

    pub fn sweep_expired_at(&self, now: Instant) -> InvalidationReport {
        let expired: Vec<SessionToken> = self
            .sessions
            .read()
            .iter()
            .filter(|(_, e)| e.expires_at <= now)
            .map(|(t, _)| t.clone())
            .collect();
        let report = self.invalidate_all(expired);
        if report.invalidated > 0 {
            debug!(target: "dirauth::registry", "session.sweep expired={} failed={}", report.invalidated, report.failures.len());
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{AuthenticationProvider, Credentials, DirectoryConfig, DistinguishedName};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Provider;
    impl AuthenticationProvider for Provider {
        fn identifier(&self) -> &str { "ldap" }
    }

    struct Config {
        user: String,
        dn: DistinguishedName,
        closes: Arc<AtomicUsize>,
    }

    impl DirectoryConfig for Config {
        fn username(&self) -> &str { &self.user }
        fn bind_dn(&self) -> &DistinguishedName { &self.dn }
        fn close(&self) -> Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn live_session(user: &str, closes: &Arc<AtomicUsize>) -> Arc<AuthenticatedSession> {
        let s = AuthenticatedSession::new(Arc::new(Provider));
        let config = Config { user: user.into(), dn: DistinguishedName::default(), closes: closes.clone() };
        s.init(Box::new(config), Credentials::default(), HashMap::new(), HashSet::new()).unwrap();
        Arc::new(s)
    }

    #[test]
    fn issue_get_logout() {
        let closes = Arc::new(AtomicUsize::new(0));
        let reg = SessionRegistry::default();
        let token = reg.issue(live_session("alice", &closes)).unwrap();
        assert_eq!(reg.get(&token).unwrap().identifier().unwrap(), "alice");
        assert!(reg.logout(&token).unwrap());
        assert!(!reg.logout(&token).unwrap());
        assert!(reg.get(&token).is_none());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn uninitialized_session_cannot_be_issued() {
        let reg = SessionRegistry::default();
        assert!(reg.issue(Arc::new(AuthenticatedSession::new(Arc::new(Provider)))).is_err());
        assert!(reg.is_empty());
    }

    #[test]
    fn sweep_invalidates_only_expired() {
        let closes = Arc::new(AtomicUsize::new(0));
        let reg = SessionRegistry::new(Duration::from_secs(60));
        let t0 = Instant::now();
        let old = reg.issue_at(live_session("alice", &closes), t0).unwrap();
        let fresh = reg.issue_at(live_session("bob", &closes), t0 + Duration::from_secs(30)).unwrap();

        let later = t0 + Duration::from_secs(61);
        assert!(reg.get_at(&old, later).is_none());
        let report = reg.sweep_expired_at(later);
        assert_eq!(report.invalidated, 1);
        assert!(report.failures.is_empty());
        assert_eq!(reg.len(), 1);
        assert!(reg.get_at(&fresh, later).is_some());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn logout_after_direct_invalidate_does_not_close_twice() {
        let closes = Arc::new(AtomicUsize::new(0));
        let reg = SessionRegistry::default();
        let session = live_session("alice", &closes);
        let token = reg.issue(session.clone()).unwrap();
        session.invalidate().unwrap();
        assert!(reg.logout(&token).unwrap());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn revoke_user_removes_all_of_their_sessions() {
        let closes = Arc::new(AtomicUsize::new(0));
        let reg = SessionRegistry::default();
        reg.issue(live_session("alice", &closes)).unwrap();
        reg.issue(live_session("alice", &closes)).unwrap();
        let bob = reg.issue(live_session("bob", &closes)).unwrap();
        let report = reg.revoke_user("alice");
        assert_eq!(report.invalidated, 2);
        assert_eq!(reg.len(), 1);
        assert!(reg.get(&bob).is_some());
        assert_eq!(closes.load(Ordering::SeqCst), 2);
        assert_eq!(reg.revoke_user("alice").invalidated, 0);
    }

    #[test]
    fn oversized_ttl_is_rejected_not_panicking() {
        let closes = Arc::new(AtomicUsize::new(0));
        let reg = SessionRegistry::new(Duration::from_secs(u64::MAX));
        let err = reg.issue(live_session("alice", &closes)).unwrap_err();
        assert!(err.to_string().contains("out of range"));
        assert!(reg.is_empty());
    }

    #[test]
    fn revocation_racing_issue_leaves_no_stale_index() {
        let closes = Arc::new(AtomicUsize::new(0));
        let reg = Arc::new(SessionRegistry::default());
        let issuer = {
            let (reg, closes) = (reg.clone(), closes.clone());
            std::thread::spawn(move || {
                for _ in 0..200 {
                    reg.issue(live_session("alice", &closes)).unwrap();
                }
            })
        };
        let mut revoked = 0;
        while !issuer.is_finished() {
            revoked += reg.revoke_user("alice").invalidated;
        }
        issuer.join().unwrap();
        revoked += reg.revoke_user("alice").invalidated;

        assert_eq!(revoked, 200);
        assert!(reg.is_empty());
        assert!(reg.user_index.read().is_empty());
        assert_eq!(closes.load(Ordering::SeqCst), 200);
    }
}
