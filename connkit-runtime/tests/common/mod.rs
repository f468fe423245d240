#![allow(dead_code)]

use std::{
    hash::{Hash, Hasher},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use connkit_runtime::{
    ConnectionError, ConnectionKey, KeyHasher, Lifecycle, ManagedConnection,
};

#[derive(Debug, Default)]
pub struct Counters {
    pub created: AtomicUsize,
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
}

impl Counters {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Key over `user`; `pass` is carried but not part of the identity.
#[derive(Debug, Clone)]
pub struct UserKey {
    pub user: String,
    pub pass: Option<String>,
}

impl UserKey {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            pass: None,
        }
    }

    pub fn with_pass(mut self, pass: impl Into<String>) -> Self {
        self.pass = Some(pass.into());
        self
    }
}

impl PartialEq for UserKey {
    fn eq(&self, other: &Self) -> bool {
        self.user == other.user
    }
}

impl Eq for UserKey {}

impl Hash for UserKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i32(self.key_hash());
    }
}

impl ConnectionKey for UserKey {
    fn key_hash(&self) -> i32 {
        KeyHasher::new().field(&self.user).finish()
    }

    fn describe(&self) -> String {
        format!("[user = {}]", self.user)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session expired")]
    Expired,
    #[error("bad request: {0}")]
    BadRequest(String),
}

pub struct Session {
    pub counters: Arc<Counters>,
    pub user: Option<String>,
}

impl Lifecycle for Session {}

impl ManagedConnection for Session {
    type Key = UserKey;
    type Config = Arc<Counters>;

    fn create(config: &Arc<Counters>) -> Result<Self, ConnectionError> {
        config.created.fetch_add(1, Ordering::SeqCst);
        Ok(Self {
            counters: Arc::clone(config),
            user: None,
        })
    }

    fn open(&mut self, key: &UserKey) -> Result<(), ConnectionError> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        self.user = Some(key.user.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<(), ConnectionError> {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        self.user = None;
        Ok(())
    }

    fn is_valid(&self) -> Result<bool, ConnectionError> {
        Ok(self.user.is_some())
    }

    fn connection_id(&self) -> String {
        self.user.clone().unwrap_or_else(|| "unknown".to_string())
    }
}
