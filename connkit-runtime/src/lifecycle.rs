//! Module lifecycle.

use tracing::debug;

use crate::{BoxError, LifecycleError};

/// Lifecycle hooks of a module instance. Every hook defaults to a no-op.
pub trait Lifecycle {
    fn initialise(&mut self) -> Result<(), LifecycleError> {
        Ok(())
    }

    fn start(&mut self) -> Result<(), LifecycleError> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), LifecycleError> {
        Ok(())
    }

    fn dispose(&mut self) -> Result<(), LifecycleError> {
        Ok(())
    }
}

/// Where an instance is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecyclePhase {
    #[default]
    Created,
    Initialised,
    Started,
    Stopped,
    Disposed,
}

impl LifecyclePhase {
    pub fn name(&self) -> &'static str {
        match self {
            LifecyclePhase::Created => "created",
            LifecyclePhase::Initialised => "initialise",
            LifecyclePhase::Started => "start",
            LifecyclePhase::Stopped => "stop",
            LifecyclePhase::Disposed => "dispose",
        }
    }

    fn accepts(&self, next: LifecyclePhase) -> bool {
        use LifecyclePhase::*;
        matches!(
            (self, next),
            (Created, Initialised)
                | (Initialised | Stopped, Started)
                | (Started, Stopped)
                | (Created | Initialised | Started | Stopped, Disposed)
        )
    }
}

/// Tracks the current phase so each hook only runs on a valid transition.
#[derive(Debug, Clone, Default)]
pub struct LifecycleState {
    phase: LifecyclePhase,
}

impl LifecycleState {
    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    /// Run `hook` if moving to `next` is a valid transition.
    ///
    /// Invalid transitions (starting twice, stopping before starting) are
    /// skipped. The phase only advances when the hook succeeds, so an
    /// instance whose `stop` failed can still be disposed.
    pub fn run<E>(
        &mut self,
        next: LifecyclePhase,
        hook: impl FnOnce() -> Result<(), E>,
    ) -> Result<(), LifecycleError>
    where
        E: Into<BoxError>,
    {
        if !self.phase.accepts(next) {
            debug!(
                from = self.phase.name(),
                to = next.name(),
                "skipping lifecycle transition"
            );
            return Ok(());
        }
        hook().map_err(|e| LifecycleError::new(next.name(), e))?;
        self.phase = next;
        Ok(())
    }
}
