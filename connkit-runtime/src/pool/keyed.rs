use std::{
    collections::{HashMap, VecDeque},
    hash::Hash,
    time::Instant,
};

use parking_lot::{Condvar, Mutex};
use tracing::warn;

use super::{ExhaustedAction, PoolConfig};
use crate::{BoxError, PoolError};

/// Creates and maintains the objects held by a [`KeyedPool`].
pub trait KeyedObjectFactory<K, V>: Send + Sync {
    /// Create a new object for `key`.
    fn make(&self, key: &K) -> Result<V, BoxError>;

    /// Dispose of an object that leaves the pool for good.
    fn destroy(&self, key: &K, object: V) -> Result<(), BoxError>;

    /// Report whether an object is still usable. Never fails.
    fn validate(&self, key: &K, object: &V) -> bool;

    /// Prepare an object before it is handed out.
    fn activate(&self, key: &K, object: &mut V) -> Result<(), BoxError>;

    /// Prepare an object before it goes back to the idle list.
    fn passivate(&self, key: &K, object: &mut V) -> Result<(), BoxError>;
}

struct State<K, V> {
    idle: HashMap<K, VecDeque<V>>,
    active: HashMap<K, usize>,
    closed: bool,
}

impl<K: Eq + Hash + Clone, V> State<K, V> {
    fn active(&self, key: &K) -> usize {
        self.active.get(key).copied().unwrap_or(0)
    }

    fn acquire_slot(&mut self, key: &K) {
        *self.active.entry(key.clone()).or_insert(0) += 1;
    }

    fn release_slot(&mut self, key: &K) {
        if let Some(count) = self.active.get_mut(key) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.active.remove(key);
            }
        }
    }
}

/// A pool of objects grouped by key.
///
/// Objects are moved out on [`borrow`](Self::borrow) and must come back
/// through [`return_object`](Self::return_object) or
/// [`invalidate`](Self::invalidate). With `Fail` or `Block`, at most
/// `max_active` objects per key are out at any time.
pub struct KeyedPool<K, V, F> {
    factory: F,
    config: PoolConfig,
    state: Mutex<State<K, V>>,
    available: Condvar,
}

impl<K, V, F> KeyedPool<K, V, F>
where
    K: Eq + Hash + Clone,
    F: KeyedObjectFactory<K, V>,
{
    pub fn new(factory: F, config: PoolConfig) -> Self {
        Self {
            factory,
            config,
            state: Mutex::new(State {
                idle: HashMap::new(),
                active: HashMap::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Take an object for `key`, reusing an idle one when possible.
    ///
    /// Every object is activated before it is handed out. An idle object
    /// that fails activation is destroyed and the borrow tries again; a new
    /// one that fails activation fails the borrow.
    pub fn borrow(&self, key: &K) -> Result<V, PoolError> {
        let started = Instant::now();

        loop {
            let idle = self.reserve(key, started)?;
            let from_idle = idle.is_some();

            let mut object = match idle {
                Some(object) => object,
                None => match self.factory.make(key) {
                    Ok(object) => object,
                    Err(err) => {
                        self.release_slot(key);
                        return Err(PoolError::Factory(err));
                    }
                },
            };

            match self.factory.activate(key, &mut object) {
                Ok(()) => return Ok(object),
                Err(err) => {
                    self.release_slot(key);
                    if let Err(destroy_err) = self.factory.destroy(key, object) {
                        warn!(error = %destroy_err, "failed to destroy an object that could not be activated");
                    }
                    if !from_idle {
                        return Err(PoolError::Factory(err));
                    }
                    warn!(error = %err, "discarding idle object that could not be activated");
                }
            }
        }
    }

    /// Reserve a slot for `key`, returning an idle object if one exists.
    fn reserve(&self, key: &K, started: Instant) -> Result<Option<V>, PoolError> {
        let mut state = self.state.lock();

        loop {
            if state.closed {
                return Err(PoolError::Closed);
            }

            if let Some(object) = state.idle.get_mut(key).and_then(VecDeque::pop_front) {
                state.acquire_slot(key);
                return Ok(Some(object));
            }

            let active = state.active(key);
            let under_limit = self.config.max_active.is_none_or(|max| active < max);
            if under_limit || self.config.exhausted_action == ExhaustedAction::Grow {
                state.acquire_slot(key);
                return Ok(None);
            }

            if self.config.exhausted_action == ExhaustedAction::Fail {
                return Err(PoolError::Exhausted { active });
            }

            match self.config.max_wait {
                None => self.available.wait(&mut state),
                Some(max_wait) => {
                    let waited = started.elapsed();
                    if waited >= max_wait {
                        return Err(PoolError::Timeout { waited });
                    }
                    // Timing out just loops back to the elapsed check above.
                    let _ = self.available.wait_for(&mut state, max_wait - waited);
                }
            }
        }
    }

    fn release_slot(&self, key: &K) {
        self.state.lock().release_slot(key);
        self.available.notify_all();
    }

    /// Give a borrowed object back to the pool.
    ///
    /// The object is passivated and kept idle unless the idle list is full,
    /// the pool is closed or passivation failed; in those cases it is
    /// destroyed.
    pub fn return_object(&self, key: &K, mut object: V) -> Result<(), PoolError> {
        let passivated = self.factory.passivate(key, &mut object);
        if let Err(err) = &passivated {
            warn!(error = %err, "failed to passivate pooled object, destroying it");
        }

        {
            let mut state = self.state.lock();
            state.release_slot(key);

            let idle_len = state.idle.get(key).map_or(0, VecDeque::len);
            let keep = passivated.is_ok()
                && !state.closed
                && self.config.max_idle.is_none_or(|max| idle_len < max);

            if keep {
                state.idle.entry(key.clone()).or_default().push_back(object);
                drop(state);
                self.available.notify_all();
                return Ok(());
            }
        }

        self.available.notify_all();
        self.factory
            .destroy(key, object)
            .map_err(PoolError::Factory)
    }

    /// Destroy a borrowed object instead of returning it.
    pub fn invalidate(&self, key: &K, object: V) -> Result<(), PoolError> {
        self.release_slot(key);
        self.factory
            .destroy(key, object)
            .map_err(PoolError::Factory)
    }

    /// Objects currently borrowed for `key`.
    pub fn num_active(&self, key: &K) -> usize {
        self.state.lock().active(key)
    }

    /// Idle objects held for `key`.
    pub fn num_idle(&self, key: &K) -> usize {
        self.state.lock().idle.get(key).map_or(0, VecDeque::len)
    }

    /// Objects currently borrowed across all keys.
    pub fn total_active(&self) -> usize {
        self.state.lock().active.values().sum()
    }

    /// Destroy every idle object.
    pub fn clear(&self) {
        let drained: Vec<(K, V)> = {
            let mut state = self.state.lock();
            state
                .idle
                .drain()
                .flat_map(|(key, objects)| objects.into_iter().map(move |o| (key.clone(), o)))
                .collect()
        };

        for (key, object) in drained {
            if let Err(err) = self.factory.destroy(&key, object) {
                warn!(error = %err, "failed to destroy idle object while clearing pool");
            }
        }
    }

    /// Close the pool: wake waiters, refuse new borrows and destroy idle objects.
    ///
    /// Objects still borrowed are destroyed when they are returned.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.available.notify_all();
        self.clear();
    }
}
