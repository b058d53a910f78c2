//! Cooperative cancellation gate.

use contracts::CancellationSource;

/// Polled abort check for the integration loops.
///
/// A disabled gate never aborts, regardless of the source state.
#[derive(Clone, Copy)]
pub struct CancellationGate<'a> {
    source: Option<&'a dyn CancellationSource>,
}

impl<'a> CancellationGate<'a> {
    pub fn new(source: Option<&'a dyn CancellationSource>, enabled: bool) -> Self {
        Self {
            source: source.filter(|_| enabled),
        }
    }

    pub fn disabled() -> Self {
        Self { source: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.source.is_some()
    }

    pub fn should_abort(&self) -> bool {
        self.source.is_some_and(|source| source.is_abort_requested())
    }
}

impl std::fmt::Debug for CancellationGate<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationGate")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
