//! Class-role registry.
//!
//! Generators never reference each other directly. A generator that emits a
//! type registers it under a semantic [`Role`] for its module, and later
//! generators look the role up. Registering a role again shadows the earlier
//! handle; this is how capability layers wrap one another.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

/// Semantic roles a generated (or user) type can fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Role {
    /// The outermost runtime value of a module.
    ModuleObject,
    /// The type whose instances execute operations.
    ConnectorObject,
    ConnectionKey,
    ConnectionManager,
    PoolObject,
    Config,
    /// A role introduced by a downstream generator.
    Custom(&'static str),
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::ModuleObject => "module-object",
            Role::ConnectorObject => "connector-object",
            Role::ConnectionKey => "connection-key",
            Role::ConnectionManager => "connection-manager",
            Role::PoolObject => "pool-object",
            Role::Config => "config",
            Role::Custom(name) => name,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a registered type comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TypeOrigin {
    /// Written by the user and named in the manifest.
    User,
    /// Emitted by the named generator.
    Generated(&'static str),
}

/// A Rust type filling a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeHandle {
    /// Path of the type as generated code refers to it.
    pub rust_type: String,
    /// Generated unit defining the type, if any.
    pub unit: Option<String>,
    pub origin: TypeOrigin,
    /// Field holding the previous layer, for types that wrap one.
    pub wraps: Option<String>,
    /// Constructor taking the previous layer by value.
    pub constructor: Option<String>,
}

impl TypeHandle {
    /// A type written by the user.
    pub fn user(rust_type: impl Into<String>) -> Self {
        Self {
            rust_type: rust_type.into(),
            unit: None,
            origin: TypeOrigin::User,
            wraps: None,
            constructor: None,
        }
    }

    /// A type emitted by `generator` into `unit`.
    pub fn generated(
        rust_type: impl Into<String>,
        unit: impl Into<String>,
        generator: &'static str,
    ) -> Self {
        Self {
            rust_type: rust_type.into(),
            unit: Some(unit.into()),
            origin: TypeOrigin::Generated(generator),
            wraps: None,
            constructor: None,
        }
    }

    /// Mark the type as wrapping the previous layer in `field`, built with
    /// `constructor`.
    pub fn wrapping(mut self, field: impl Into<String>, constructor: impl Into<String>) -> Self {
        self.wraps = Some(field.into());
        self.constructor = Some(constructor.into());
        self
    }

    /// Expression building this type around `inner`.
    pub fn construct(&self, inner: &str) -> String {
        match &self.constructor {
            Some(constructor) => format!("{}({})", constructor, inner),
            None => inner.to_string(),
        }
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.unit {
            Some(unit) => write!(f, "{} ({})", self.rust_type, unit),
            None => f.write_str(&self.rust_type),
        }
    }
}

/// A role was looked up before any generator registered it.
#[derive(Debug, Clone, Error)]
#[error("role '{role}' is not registered for module '{module}'")]
pub struct RoleNotFoundError {
    pub module: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
struct Assignment {
    module: String,
    role: Role,
    handle: TypeHandle,
}

/// Compilation-scoped map from `(module, role)` to the current handle.
#[derive(Debug, Clone, Default)]
pub struct RoleRegistry {
    current: IndexMap<(String, Role), TypeHandle>,
    history: Vec<Assignment>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle` for `role`, shadowing any earlier registration.
    pub fn register(&mut self, module: &str, role: Role, handle: TypeHandle) {
        self.history.push(Assignment {
            module: module.to_string(),
            role,
            handle: handle.clone(),
        });
        self.current.insert((module.to_string(), role), handle);
    }

    /// The most recently registered handle for `role`.
    pub fn lookup(&self, module: &str, role: Role) -> Result<&TypeHandle, RoleNotFoundError> {
        self.current
            .get(&(module.to_string(), role))
            .ok_or_else(|| RoleNotFoundError {
                module: module.to_string(),
                role,
            })
    }

    pub fn is_registered(&self, module: &str, role: Role) -> bool {
        self.current.contains_key(&(module.to_string(), role))
    }

    /// Every handle registered for `role`, innermost first.
    pub fn layers(&self, module: &str, role: Role) -> Vec<&TypeHandle> {
        self.history
            .iter()
            .filter(|a| a.module == module && a.role == role)
            .map(|a| &a.handle)
            .collect()
    }

    /// Roles registered for `module` with their current handles, in first
    /// registration order.
    pub fn roles(&self, module: &str) -> impl Iterator<Item = (Role, &TypeHandle)> {
        self.current
            .iter()
            .filter(move |((m, _), _)| m == module)
            .map(|((_, role), handle)| (*role, handle))
    }

    /// Modules with at least one registration, in first registration order.
    pub fn modules(&self) -> Vec<&str> {
        let mut modules: Vec<&str> = Vec::new();
        for (module, _) in self.current.keys() {
            if !modules.contains(&module.as_str()) {
                modules.push(module);
            }
        }
        modules
    }

    /// Field access path from a value of type `from` down to the `to` layer
    /// of the module-object chain, e.g. `.inner.inner`.
    ///
    /// Returns `None` when `to` is not reachable through wrapping fields,
    /// such as an instance held in a pool.
    pub fn layer_path(&self, module: &str, from: &str, to: &str) -> Option<String> {
        let chain = self.layers(module, Role::ModuleObject);
        let start = chain.iter().rposition(|h| h.rust_type == from)?;

        let mut path = String::new();
        for handle in chain[..=start].iter().rev() {
            if handle.rust_type == to {
                return Some(path);
            }
            path.push('.');
            path.push_str(handle.wraps.as_deref()?);
        }
        None
    }
}
