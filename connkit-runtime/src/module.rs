//! Pooled module instances for modules without connection management.

use std::sync::Arc;

use tracing::warn;

use crate::{BoxError, Lifecycle, ObjectPool, PoolConfig, PoolableObjectFactory, PoolingProfile};

/// A module whose instances can be pooled and handed out per call.
pub trait PoolableModule: Lifecycle + Send + Sized + 'static {
    type Config: Send + Sync + 'static;

    /// Create an instance carrying the module configuration.
    fn create(config: &Self::Config) -> Result<Self, BoxError>;
}

/// Creates and tears down pooled module instances.
pub struct ModuleObjectFactory<M: PoolableModule> {
    config: Arc<M::Config>,
}

impl<M: PoolableModule> ModuleObjectFactory<M> {
    pub fn new(config: Arc<M::Config>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &M::Config {
        &self.config
    }
}

impl<M: PoolableModule> PoolableObjectFactory<M> for ModuleObjectFactory<M> {
    fn make(&self) -> Result<M, BoxError> {
        let mut module = M::create(&self.config)?;
        module.initialise()?;
        module.start()?;
        Ok(module)
    }

    /// Stop, then dispose even if stopping failed. The stop error wins.
    fn destroy(&self, mut module: M) -> Result<(), BoxError> {
        let stopped = module.stop();
        let disposed = module.dispose();
        match stopped {
            Err(err) => {
                if let Err(cleanup) = disposed {
                    warn!(error = %cleanup, "dispose failed after stop error");
                }
                Err(err.into())
            }
            Ok(()) => Ok(disposed?),
        }
    }
}

/// Pool of module instances.
pub type ModulePool<M> = ObjectPool<M, ModuleObjectFactory<M>>;

/// Build a module pool from an optional pooling profile.
pub fn module_pool<M: PoolableModule>(
    config: M::Config,
    profile: Option<&PoolingProfile>,
) -> ModulePool<M> {
    ObjectPool::new(
        ModuleObjectFactory::new(Arc::new(config)),
        PoolConfig::from_profile(profile),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::LifecycleError;

    static STARTED: AtomicUsize = AtomicUsize::new(0);
    static DISPOSED: AtomicUsize = AtomicUsize::new(0);

    struct Counter {
        base: u32,
    }

    impl Lifecycle for Counter {
        fn start(&mut self) -> Result<(), LifecycleError> {
            STARTED.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn dispose(&mut self) -> Result<(), LifecycleError> {
            DISPOSED.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl PoolableModule for Counter {
        type Config = u32;

        fn create(config: &u32) -> Result<Self, BoxError> {
            Ok(Self { base: *config })
        }
    }

    struct Stuck {
        disposed: Arc<AtomicUsize>,
    }

    impl Lifecycle for Stuck {
        fn stop(&mut self) -> Result<(), LifecycleError> {
            Err(LifecycleError::new("stop", "worker did not exit"))
        }

        fn dispose(&mut self) -> Result<(), LifecycleError> {
            self.disposed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl PoolableModule for Stuck {
        type Config = Arc<AtomicUsize>;

        fn create(config: &Self::Config) -> Result<Self, BoxError> {
            Ok(Self {
                disposed: Arc::clone(config),
            })
        }
    }

    #[test]
    fn test_destroy_disposes_after_failed_stop() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let factory = ModuleObjectFactory::<Stuck>::new(Arc::new(Arc::clone(&disposed)));

        let module = factory.make().unwrap();
        let err = factory.destroy(module).unwrap_err();

        assert_eq!(err.to_string(), "lifecycle phase 'stop' failed");
        assert_eq!(disposed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_pooled_instances_run_lifecycle() {
        let pool = module_pool::<Counter>(7, None);

        let module = pool.borrow().unwrap();
        assert_eq!(module.base, 7);
        assert_eq!(STARTED.load(Ordering::SeqCst), 1);

        pool.return_object(module).unwrap();
        let module = pool.borrow().unwrap();
        assert_eq!(STARTED.load(Ordering::SeqCst), 1);

        pool.invalidate(module).unwrap();
        assert_eq!(DISPOSED.load(Ordering::SeqCst), 1);
    }
}
