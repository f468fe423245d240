//! Capability queries on generated modules.
//!
//! Each adapter layer (lifecycle, pooling, connection management, OAuth) is a
//! component owned by the generated module; a module answers capability
//! queries by exposing the components it holds.

use std::fmt;

use crate::{
    ConnectionManager, LifecycleState, ManagedConnection, ObjectPool, OAuthState,
    PoolableObjectFactory, PoolingProfile,
};

/// Capabilities a generated module can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Lifecycle,
    Pooling,
    ConnectionManagement,
    OAuth,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::Lifecycle,
        Capability::Pooling,
        Capability::ConnectionManagement,
        Capability::OAuth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Lifecycle => "lifecycle",
            Capability::Pooling => "pooling",
            Capability::ConnectionManagement => "connection-management",
            Capability::OAuth => "oauth",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Object pool statistics and control.
pub trait Pooling: Send + Sync {
    fn num_active(&self) -> usize;
    fn num_idle(&self) -> usize;
    fn close(&self);
}

impl<V, F> Pooling for ObjectPool<V, F>
where
    V: Send + 'static,
    F: PoolableObjectFactory<V>,
{
    fn num_active(&self) -> usize {
        ObjectPool::num_active(self)
    }

    fn num_idle(&self) -> usize {
        ObjectPool::num_idle(self)
    }

    fn close(&self) {
        ObjectPool::close(self)
    }
}

/// Connection manager statistics and control.
pub trait ConnectionManagement: Send + Sync {
    fn total_active(&self) -> usize;
    fn pooling_profile(&self) -> Option<&PoolingProfile>;
    fn close(&self);
}

impl<M> ConnectionManagement for ConnectionManager<M>
where
    M: ManagedConnection,
    M::Config: Send + Sync,
{
    fn total_active(&self) -> usize {
        ConnectionManager::total_active(self)
    }

    fn pooling_profile(&self) -> Option<&PoolingProfile> {
        ConnectionManager::pooling_profile(self)
    }

    fn close(&self) {
        ConnectionManager::close(self)
    }
}

/// Implemented by every generated module. Components the module does not hold
/// report `None`.
pub trait Capabilities {
    fn lifecycle(&self) -> Option<&LifecycleState> {
        None
    }

    fn pooling(&self) -> Option<&dyn Pooling> {
        None
    }

    fn connection_management(&self) -> Option<&dyn ConnectionManagement> {
        None
    }

    fn oauth(&self) -> Option<&OAuthState> {
        None
    }

    fn is_capable_of(&self, capability: Capability) -> bool {
        match capability {
            Capability::Lifecycle => self.lifecycle().is_some(),
            Capability::Pooling => self.pooling().is_some(),
            Capability::ConnectionManagement => self.connection_management().is_some(),
            Capability::OAuth => self.oauth().is_some(),
        }
    }

    fn capabilities(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| self.is_capable_of(*c))
            .collect()
    }
}
