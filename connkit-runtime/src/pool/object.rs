use super::{KeyedObjectFactory, KeyedPool, PoolConfig};
use crate::{BoxError, PoolError};

/// Factory for a keyless [`ObjectPool`].
pub trait PoolableObjectFactory<V>: Send + Sync {
    fn make(&self) -> Result<V, BoxError>;

    fn destroy(&self, object: V) -> Result<(), BoxError>;

    fn validate(&self, _object: &V) -> bool {
        true
    }

    fn activate(&self, _object: &mut V) -> Result<(), BoxError> {
        Ok(())
    }

    fn passivate(&self, _object: &mut V) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Adapts a keyless factory to the single `()` key.
struct Keyless<F>(F);

impl<V, F> KeyedObjectFactory<(), V> for Keyless<F>
where
    F: PoolableObjectFactory<V>,
{
    fn make(&self, _key: &()) -> Result<V, BoxError> {
        self.0.make()
    }

    fn destroy(&self, _key: &(), object: V) -> Result<(), BoxError> {
        self.0.destroy(object)
    }

    fn validate(&self, _key: &(), object: &V) -> bool {
        self.0.validate(object)
    }

    fn activate(&self, _key: &(), object: &mut V) -> Result<(), BoxError> {
        self.0.activate(object)
    }

    fn passivate(&self, _key: &(), object: &mut V) -> Result<(), BoxError> {
        self.0.passivate(object)
    }
}

/// A pool of interchangeable objects, for poolable modules without a
/// connection identity.
pub struct ObjectPool<V, F> {
    inner: KeyedPool<(), V, Keyless<F>>,
}

impl<V, F> ObjectPool<V, F>
where
    F: PoolableObjectFactory<V>,
{
    pub fn new(factory: F, config: PoolConfig) -> Self {
        Self {
            inner: KeyedPool::new(Keyless(factory), config),
        }
    }

    pub fn factory(&self) -> &F {
        &self.inner.factory().0
    }

    pub fn borrow(&self) -> Result<V, PoolError> {
        self.inner.borrow(&())
    }

    pub fn return_object(&self, object: V) -> Result<(), PoolError> {
        self.inner.return_object(&(), object)
    }

    pub fn invalidate(&self, object: V) -> Result<(), PoolError> {
        self.inner.invalidate(&(), object)
    }

    pub fn num_active(&self) -> usize {
        self.inner.num_active(&())
    }

    pub fn num_idle(&self) -> usize {
        self.inner.num_idle(&())
    }

    pub fn close(&self) {
        self.inner.close();
    }
}
