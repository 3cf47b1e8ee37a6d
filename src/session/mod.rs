//! Per-session state
//!
//! A session owns exactly one current location (or none yet) and the last
//! coordinates its client reported. The store is replaced wholesale on each
//! resolution; nothing is merged and nothing is persisted.

use crate::error::{Error, Result};
use crate::resolve::{BrowserCoordinates, ResolvedLocation, Signals};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Holder for the session's current location
///
/// `set` is the only mutator and is called with the resolver's result.
#[derive(Debug, Clone, Default)]
pub struct SessionLocationStore {
    location: Option<ResolvedLocation>,
    updated_at: Option<DateTime<Utc>>,
}

impl SessionLocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current location, if one has been resolved
    pub fn get(&self) -> Option<&ResolvedLocation> {
        self.location.as_ref()
    }

    /// Replace the current location
    pub fn set(&mut self, location: ResolvedLocation) {
        self.location = Some(location);
        self.updated_at = Some(Utc::now());
    }

    /// When the location was last replaced
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

/// Coordinates the client device last reported
#[derive(Debug, Clone, Default)]
pub struct BrowserLocationSource {
    latest: Option<BrowserCoordinates>,
}

impl BrowserLocationSource {
    pub fn report(&mut self, coords: BrowserCoordinates) {
        self.latest = Some(coords);
    }

    pub fn current(&self) -> Option<&BrowserCoordinates> {
        self.latest.as_ref()
    }

    /// Drop the cached fix so the client is asked again
    pub fn forget(&mut self) -> Option<BrowserCoordinates> {
        self.latest.take()
    }
}

/// One user session
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub location: SessionLocationStore,
    pub browser: BrowserLocationSource,
    pub created_at: DateTime<Utc>,
    /// Last time the session was written to
    pub last_active: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            location: SessionLocationStore::new(),
            browser: BrowserLocationSource::default(),
            created_at: now,
            last_active: now,
        }
    }

    fn is_idle(&self, timeout: Option<Duration>, now: DateTime<Utc>) -> bool {
        timeout.is_some_and(|timeout| now - self.last_active > timeout)
    }

    /// Base signals with this session's browser fix attached
    pub fn signals(&self, mut base: Signals) -> Signals {
        if base.browser.is_none() {
            base.browser = self.browser.current().cloned();
        }
        base
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            created_at: self.created_at,
            location: self.location.get().cloned(),
            updated_at: self.location.updated_at(),
            browser: self.browser.current().cloned(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub location: Option<ResolvedLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser: Option<BrowserCoordinates>,
}

/// All live sessions, keyed by id
///
/// With an idle timeout, sessions not written to within it are treated as
/// ended and are dropped the next time a session is created.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<Uuid, Session>,
    idle_timeout: Option<Duration>,
}

impl SessionRegistry {
    /// A registry whose sessions never expire
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that expires sessions idle for `secs`; 0 disables expiry
    pub fn with_idle_timeout(secs: u64) -> Self {
        Self {
            sessions: HashMap::new(),
            idle_timeout: i64::try_from(secs)
                .ok()
                .filter(|secs| *secs > 0)
                .and_then(Duration::try_seconds),
        }
    }

    /// Start a new, unresolved session
    pub fn create(&mut self) -> &mut Session {
        self.prune_idle(Utc::now());
        let session = Session::new();
        let id = session.id;
        self.sessions.entry(id).or_insert(session)
    }

    pub fn get(&self, id: &Uuid) -> Result<&Session> {
        let timeout = self.idle_timeout;
        self.sessions
            .get(id)
            .filter(|session| !session.is_idle(timeout, Utc::now()))
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    /// Look up a session for writing; marks it active
    pub fn get_mut(&mut self, id: &Uuid) -> Result<&mut Session> {
        let timeout = self.idle_timeout;
        let now = Utc::now();
        let session = self
            .sessions
            .get_mut(id)
            .filter(|session| !session.is_idle(timeout, now))
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
        session.last_active = now;
        Ok(session)
    }

    /// Drop every session idle as of `now`; returns how many were dropped
    pub fn prune_idle(&mut self, now: DateTime<Utc>) -> usize {
        let timeout = self.idle_timeout;
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_idle(timeout, now));
        let pruned = before - self.sessions.len();
        if pruned > 0 {
            debug!("Expired {} idle session(s)", pruned);
        }
        pruned
    }

    /// End a session
    pub fn remove(&mut self, id: &Uuid) -> Result<Session> {
        self.sessions
            .remove(id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
