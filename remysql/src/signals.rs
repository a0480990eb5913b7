//! Termination signal trap
//!
//! The executor arms a trap for the duration of each statement. While armed,
//! termination-class signals are intercepted instead of killing the process;
//! after the statement returns the executor asks whether one arrived. A
//! statement that "succeeded" under an observed termination signal is still
//! surfaced as a failure, since the process is expected to exit imminently.

#[cfg(unix)]
use futures::FutureExt;
#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};
#[cfg(unix)]
use tracing::debug;

/// Transient watch over termination-class signals.
pub struct TerminationTrap {
    #[cfg(unix)]
    watched: Vec<(&'static str, Signal)>,
}

#[cfg(unix)]
impl TerminationTrap {
    /// Install the trap. Registration failures downgrade to an unarmed trap;
    /// statement execution must not fail because signal delivery could not
    /// be observed.
    pub fn arm() -> Self {
        let kinds = [
            ("SIGTERM", SignalKind::terminate()),
            ("SIGINT", SignalKind::interrupt()),
            ("SIGQUIT", SignalKind::quit()),
        ];
        let mut watched = Vec::with_capacity(kinds.len());
        for (name, kind) in kinds {
            match signal(kind) {
                Ok(stream) => watched.push((name, stream)),
                Err(err) => debug!(signal = name, error = %err, "signal trap not armed"),
            }
        }
        Self { watched }
    }

    /// Name of a termination signal observed since arming, if any.
    pub fn observed(&mut self) -> Option<&'static str> {
        for (name, stream) in &mut self.watched {
            if let Some(Some(())) = stream.recv().now_or_never() {
                return Some(name);
            }
        }
        None
    }
}

#[cfg(not(unix))]
impl TerminationTrap {
    pub fn arm() -> Self {
        Self {}
    }

    pub fn observed(&mut self) -> Option<&'static str> {
        None
    }
}
