//! Named object registry used to resolve module configurations at call time.

use std::{
    any::{Any, type_name},
    sync::Arc,
};

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::{Evaluator, ProcessError};

type Shared = Arc<dyn Any + Send + Sync>;

/// Objects registered by name, looked up by name or by type.
#[derive(Default)]
pub struct ObjectRegistry {
    objects: RwLock<IndexMap<String, Shared>>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `object` under `name`, replacing any previous entry.
    pub fn register<T: Any + Send + Sync>(&self, name: impl Into<String>, object: Arc<T>) {
        self.objects.write().insert(name.into(), object);
    }

    pub fn lookup_named<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        let object = self.objects.read().get(name).cloned()?;
        object.downcast::<T>().ok()
    }

    /// The first registered object of type `T`.
    pub fn lookup_by_type<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.objects
            .read()
            .values()
            .find_map(|object| Arc::clone(object).downcast::<T>().ok())
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

/// How a processor finds its module configuration.
#[derive(Debug, Clone)]
pub enum ConfigRef<T> {
    Instance(Arc<T>),
    Named(String),
    ByType,
}

impl<T: Any + Send + Sync> ConfigRef<T> {
    pub fn resolve(&self, registry: &ObjectRegistry, operation: &str) -> Result<Arc<T>, ProcessError> {
        match self {
            ConfigRef::Instance(object) => Ok(Arc::clone(object)),
            ConfigRef::Named(name) => registry.lookup_named(name).ok_or_else(|| {
                ProcessError::configuration(
                    operation,
                    format!("no {} registered as '{name}'", type_name::<T>()),
                )
            }),
            ConfigRef::ByType => registry.lookup_by_type().ok_or_else(|| {
                ProcessError::configuration(
                    operation,
                    format!("no {} registered", type_name::<T>()),
                )
            }),
        }
    }
}

/// What a processor needs at call time besides its module.
#[derive(Clone, Default)]
pub struct RuntimeContext {
    pub registry: Arc<ObjectRegistry>,
    pub evaluator: Evaluator,
}

impl RuntimeContext {
    pub fn new(registry: Arc<ObjectRegistry>, evaluator: Evaluator) -> Self {
        Self {
            registry,
            evaluator,
        }
    }
}
