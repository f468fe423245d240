//! A Salesforce-style connector assembled from connkit generated units.
//!
//! This crate holds the user side of the module declared in `connkit.toml`:
//! the module type with its connect triple and operations, its error enum
//! and an in-memory [`Org`] standing in for the remote service. The build
//! script generates the rest into [`salesforce`].

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use connkit_runtime::SourceCallback;
use parking_lot::Mutex;
use thiserror::Error;

include!(concat!(env!("OUT_DIR"), "/connkit.rs"));

#[derive(Debug, Error)]
pub enum SalesforceError {
    #[error("session expired")]
    SessionExpired,

    #[error("not connected")]
    NotConnected,

    #[error("login rejected for '{0}'")]
    LoginRejected(String),

    #[error("malformed query '{0}'")]
    MalformedQuery(String),

    #[error("no priority for level {0}")]
    InvalidLevel(i64),

    #[error("listener rejected a record: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Low,
    High,
}

#[derive(Debug, Default)]
struct OrgState {
    accounts: Mutex<Vec<String>>,
    /// Calls left that fail with `SessionExpired`.
    expiring: AtomicUsize,
    sessions: AtomicUsize,
    closed: AtomicUsize,
    calls: AtomicUsize,
}

/// In-memory org shared by every session opened against it.
#[derive(Debug, Clone, Default)]
pub struct Org {
    state: Arc<OrgState>,
}

impl Org {
    pub fn with_accounts<'a>(accounts: impl IntoIterator<Item = &'a str>) -> Self {
        let org = Self::default();
        org.state
            .accounts
            .lock()
            .extend(accounts.into_iter().map(String::from));
        org
    }

    /// Make the next `calls` operations fail with an expired session.
    pub fn expire_sessions(&self, calls: usize) {
        self.state.expiring.store(calls, Ordering::SeqCst);
    }

    /// Sessions opened so far.
    pub fn sessions(&self) -> usize {
        self.state.sessions.load(Ordering::SeqCst)
    }

    /// Sessions closed so far.
    pub fn closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Operation calls that reached the org.
    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    fn accounts(&self) -> Vec<String> {
        self.state.accounts.lock().clone()
    }

    fn call(&self) -> Result<(), SalesforceError> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        let expired = self
            .state
            .expiring
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if expired {
            return Err(SalesforceError::SessionExpired);
        }
        Ok(())
    }
}

/// The module type. Configuration fields are filled by the generated
/// `SalesforceConfig`.
#[derive(Debug, Default)]
pub struct Salesforce {
    pub url: String,
    pub org: Org,
    session: Option<String>,
    started: bool,
}

impl Salesforce {
    pub fn start(&mut self) -> Result<(), SalesforceError> {
        self.started = true;
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), SalesforceError> {
        self.started = false;
        Ok(())
    }

    pub fn connect(&mut self, username: String, password: String) -> Result<(), SalesforceError> {
        if password.is_empty() {
            return Err(SalesforceError::LoginRejected(username));
        }
        let n = self.org.state.sessions.fetch_add(1, Ordering::SeqCst) + 1;
        self.session = Some(format!("{}-{}", username, n));
        Ok(())
    }

    pub fn disconnect(&mut self) -> Result<(), SalesforceError> {
        if self.session.take().is_some() {
            self.org.state.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    pub fn is_connected(&self) -> Result<bool, SalesforceError> {
        Ok(self.started && self.session.is_some())
    }

    pub fn session_id(&self) -> &str {
        self.session.as_deref().unwrap_or("none")
    }

    pub fn query(&mut self, soql: String) -> Result<Vec<String>, SalesforceError> {
        self.ensure_connected()?;
        self.org.call()?;
        if !soql.trim_start().to_ascii_uppercase().starts_with("SELECT") {
            return Err(SalesforceError::MalformedQuery(soql));
        }
        Ok(self.org.accounts())
    }

    pub fn update(
        &mut self,
        sobject: String,
        fields: HashMap<String, String>,
        priority: Priority,
    ) -> Result<Vec<String>, SalesforceError> {
        self.ensure_connected()?;
        self.org.call()?;
        let mut pairs: Vec<String> = fields
            .into_iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        pairs.sort();
        pairs.insert(0, format!("{}:{:?}", sobject, priority));
        Ok(pairs)
    }

    pub fn watch_accounts(&mut self, emitter: &SourceCallback) -> Result<(), SalesforceError> {
        self.ensure_connected()?;
        for account in self.org.accounts() {
            if emitter.is_stopping() {
                break;
            }
            emitter
                .process(account)
                .map_err(|e| SalesforceError::Rejected(e.to_string()))?;
        }
        Ok(())
    }

    /// Registered as the `i64` to [`Priority`] transformer.
    pub fn priority_from_level(level: i64) -> Result<Priority, SalesforceError> {
        match level {
            0..=4 => Ok(Priority::Low),
            5..=9 => Ok(Priority::High),
            other => Err(SalesforceError::InvalidLevel(other)),
        }
    }

    fn ensure_connected(&self) -> Result<(), SalesforceError> {
        match self.is_connected()? {
            true => Ok(()),
            false => Err(SalesforceError::NotConnected),
        }
    }
}
