//! Connection keys, connection factories and the connection manager.

use std::{fmt::Debug, hash::Hash, sync::Arc};

use tracing::{debug, warn};

use crate::{
    BoxError, ConnectionError, KeyedObjectFactory, KeyedPool, Lifecycle, PoolConfig, PoolError,
    PoolingProfile,
};

/// A field contributing to a connection key hash.
///
/// Hashes are deterministic across processes so keys can be logged and
/// compared between runs.
pub trait KeyField {
    fn key_hash(&self) -> i32;
}

impl KeyField for str {
    fn key_hash(&self) -> i32 {
        self.encode_utf16()
            .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
    }
}

impl KeyField for String {
    fn key_hash(&self) -> i32 {
        self.as_str().key_hash()
    }
}

impl KeyField for bool {
    fn key_hash(&self) -> i32 {
        if *self { 1231 } else { 1237 }
    }
}

impl KeyField for i32 {
    fn key_hash(&self) -> i32 {
        *self
    }
}

impl KeyField for i64 {
    fn key_hash(&self) -> i32 {
        (*self ^ ((*self as u64) >> 32) as i64) as i32
    }
}

impl KeyField for u16 {
    fn key_hash(&self) -> i32 {
        i32::from(*self)
    }
}

impl KeyField for u32 {
    fn key_hash(&self) -> i32 {
        *self as i32
    }
}

impl KeyField for u64 {
    fn key_hash(&self) -> i32 {
        (*self ^ (*self >> 32)) as i32
    }
}

impl<T: KeyField> KeyField for Option<T> {
    fn key_hash(&self) -> i32 {
        self.as_ref().map_or(0, KeyField::key_hash)
    }
}

impl<T: KeyField + ?Sized> KeyField for &T {
    fn key_hash(&self) -> i32 {
        (**self).key_hash()
    }
}

/// Accumulates key field hashes: seed 1, then `hash * 31 + field` per field.
#[derive(Debug, Clone, Copy)]
pub struct KeyHasher(i32);

impl Default for KeyHasher {
    fn default() -> Self {
        Self(1)
    }
}

impl KeyHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(self, field: &impl KeyField) -> Self {
        Self(self.0.wrapping_mul(31).wrapping_add(field.key_hash()))
    }

    pub fn finish(self) -> i32 {
        self.0
    }
}

/// Structural identity of a pooled connection.
///
/// Implementations compare and hash the key fields only.
pub trait ConnectionKey: Clone + Eq + Hash + Debug + Send + Sync + 'static {
    /// Deterministic hash of the key fields.
    fn key_hash(&self) -> i32;

    /// Key fields rendered for log lines.
    fn describe(&self) -> String;
}

/// A module whose instances hold a connection.
pub trait ManagedConnection: Lifecycle + Send + Sized + 'static {
    type Key: ConnectionKey;
    type Config: Send + Sync + 'static;

    /// Create an unconnected instance from the module configuration.
    fn create(config: &Self::Config) -> Result<Self, ConnectionError>;

    /// Establish the connection for `key`.
    fn open(&mut self, key: &Self::Key) -> Result<(), ConnectionError>;

    /// Tear the connection down.
    fn close(&mut self) -> Result<(), ConnectionError>;

    /// Whether the connection is usable.
    fn is_valid(&self) -> Result<bool, ConnectionError>;

    /// Identifier of the current connection, for log lines.
    fn connection_id(&self) -> String {
        "unknown".to_string()
    }
}

/// Pool factory for connection-holding module instances.
pub struct ConnectionFactory<M: ManagedConnection> {
    config: Arc<M::Config>,
}

impl<M: ManagedConnection> ConnectionFactory<M> {
    pub fn new(config: Arc<M::Config>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &M::Config {
        &self.config
    }
}

impl<M: ManagedConnection> KeyedObjectFactory<M::Key, M> for ConnectionFactory<M> {
    /// Create an instance from the configuration and run initialise/start.
    fn make(&self, _key: &M::Key) -> Result<M, BoxError> {
        let mut connection = M::create(&self.config)?;
        connection.initialise()?;
        connection.start()?;
        Ok(connection)
    }

    /// Close, then stop and dispose even if closing failed.
    ///
    /// A close failure is returned in preference to later cleanup failures,
    /// which are logged.
    fn destroy(&self, key: &M::Key, mut connection: M) -> Result<(), BoxError> {
        let closed = connection.close();
        let stopped = connection.stop();
        let disposed = connection.dispose();

        match closed {
            Err(err) => {
                for cleanup in [stopped.err(), disposed.err()].into_iter().flatten() {
                    warn!(key = %key.describe(), error = %cleanup, "cleanup failed after disconnect error");
                }
                Err(err.into())
            }
            Ok(()) => {
                stopped?;
                disposed?;
                Ok(())
            }
        }
    }

    /// Validation errors count as "invalid" and never propagate.
    fn validate(&self, key: &M::Key, connection: &M) -> bool {
        match connection.is_valid() {
            Ok(valid) => valid,
            Err(err) => {
                warn!(key = %key.describe(), error = %err, "connection validation failed");
                false
            }
        }
    }

    /// Reconnect in place when the connection is not valid.
    fn activate(&self, key: &M::Key, connection: &mut M) -> Result<(), BoxError> {
        if !self.validate(key, connection) {
            connection.open(key)?;
        }
        Ok(())
    }

    fn passivate(&self, _key: &M::Key, _connection: &mut M) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Hands out pooled connections by key.
pub struct ConnectionManager<M: ManagedConnection> {
    pool: KeyedPool<M::Key, M, ConnectionFactory<M>>,
    profile: Option<PoolingProfile>,
}

impl<M: ManagedConnection> ConnectionManager<M> {
    /// Build a manager; without a profile the pool defaults apply.
    pub fn new(config: M::Config, profile: Option<PoolingProfile>) -> Self {
        Self::from_shared(Arc::new(config), profile)
    }

    pub fn from_shared(config: Arc<M::Config>, profile: Option<PoolingProfile>) -> Self {
        let pool_config = PoolConfig::from_profile(profile.as_ref());
        Self {
            pool: KeyedPool::new(ConnectionFactory::new(config), pool_config),
            profile,
        }
    }

    pub fn config(&self) -> &M::Config {
        self.pool.factory().config()
    }

    pub fn pooling_profile(&self) -> Option<&PoolingProfile> {
        self.profile.as_ref()
    }

    pub fn acquire_connection(&self, key: &M::Key) -> Result<M, PoolError> {
        debug!("Attempting to acquire a connection using {}", key.describe());
        let connection = self.pool.borrow(key)?;
        debug!(
            "Connection has been acquired with [id={}]",
            connection.connection_id()
        );
        Ok(connection)
    }

    pub fn release_connection(&self, key: &M::Key, connection: M) -> Result<(), PoolError> {
        debug!(
            "Releasing the connection back into the pool [id={}]",
            connection.connection_id()
        );
        self.pool.return_object(key, connection)
    }

    pub fn destroy_connection(&self, key: &M::Key, connection: M) -> Result<(), PoolError> {
        debug!(
            "Destroying connection [id={}]",
            connection.connection_id()
        );
        self.pool.invalidate(key, connection)
    }

    /// Connections currently handed out for `key`.
    pub fn num_active(&self, key: &M::Key) -> usize {
        self.pool.num_active(key)
    }

    pub fn num_idle(&self, key: &M::Key) -> usize {
        self.pool.num_idle(key)
    }

    pub fn total_active(&self) -> usize {
        self.pool.total_active()
    }

    pub fn close(&self) {
        self.pool.close();
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct Host(String);

    impl ConnectionKey for Host {
        fn key_hash(&self) -> i32 {
            KeyHasher::new().field(&self.0).finish()
        }

        fn describe(&self) -> String {
            format!("[host = {}]", self.0)
        }
    }

    struct Flaky {
        steps: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Lifecycle for Flaky {
        fn stop(&mut self) -> Result<(), crate::LifecycleError> {
            self.steps.lock().push("stop");
            Ok(())
        }

        fn dispose(&mut self) -> Result<(), crate::LifecycleError> {
            self.steps.lock().push("dispose");
            Ok(())
        }
    }

    impl ManagedConnection for Flaky {
        type Key = Host;
        type Config = Arc<Mutex<Vec<&'static str>>>;

        fn create(config: &Self::Config) -> Result<Self, ConnectionError> {
            Ok(Self {
                steps: Arc::clone(config),
            })
        }

        fn open(&mut self, _key: &Host) -> Result<(), ConnectionError> {
            Ok(())
        }

        fn close(&mut self) -> Result<(), ConnectionError> {
            self.steps.lock().push("close");
            Err(ConnectionError::new("socket already closed"))
        }

        fn is_valid(&self) -> Result<bool, ConnectionError> {
            Err(ConnectionError::new("ping failed"))
        }
    }

    #[test]
    fn test_destroy_cleans_up_before_reporting_close_failure() {
        let steps = Arc::new(Mutex::new(Vec::new()));
        let factory = ConnectionFactory::<Flaky>::new(Arc::new(Arc::clone(&steps)));
        let key = Host("db".to_string());

        let connection = factory.make(&key).unwrap();
        let err = factory.destroy(&key, connection).unwrap_err();

        assert_eq!(err.to_string(), "socket already closed");
        assert_eq!(*steps.lock(), vec!["close", "stop", "dispose"]);
    }

    #[test]
    fn test_validation_error_counts_as_invalid() {
        let steps = Arc::new(Mutex::new(Vec::new()));
        let factory = ConnectionFactory::<Flaky>::new(Arc::new(Arc::clone(&steps)));
        let key = Host("db".to_string());

        let connection = factory.make(&key).unwrap();
        assert!(!factory.validate(&key, &connection));
    }

    #[test]
    fn test_string_hash_matches_polynomial() {
        // 'a' = 97, 'b' = 98 -> 97 * 31 + 98
        assert_eq!("ab".key_hash(), 97 * 31 + 98);
        assert_eq!("".key_hash(), 0);
    }

    #[test]
    fn test_key_hasher_seed_and_accumulation() {
        assert_eq!(KeyHasher::new().finish(), 1);

        let hash = KeyHasher::new()
            .field(&"ab".to_string())
            .field(&true)
            .finish();
        assert_eq!(hash, (31 + "ab".key_hash()) * 31 + 1231);
    }

    #[test]
    fn test_option_and_integer_fields() {
        assert_eq!(None::<String>.key_hash(), 0);
        assert_eq!(Some(7i32).key_hash(), 7);
        assert_eq!(1i64.key_hash(), 1);
        assert_eq!((1i64 << 32).key_hash(), 1);
    }
}
