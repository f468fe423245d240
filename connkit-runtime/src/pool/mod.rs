//! Keyed and keyless object pools.
//!
//! The pool is the only synchronization point of generated connectors:
//! borrow, return and invalidate may be called from any thread.

mod keyed;
mod object;
mod profile;

pub use keyed::{KeyedObjectFactory, KeyedPool};
pub use object::{ObjectPool, PoolableObjectFactory};
pub use profile::{ExhaustedAction, PoolConfig, PoolingProfile};
