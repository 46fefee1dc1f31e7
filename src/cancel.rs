use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared stop signal for one audit run. Setting it stops new dispatches;
/// requests already in flight run to completion or timeout.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Records an interrupt. Returns true when the run was already cancelled,
    /// meaning the caller should stop waiting and exit.
    pub fn interrupt(&self) -> bool {
        self.cancelled.swap(true, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let flag = CancellationFlag::new();
        let other = flag.clone();
        assert!(!other.is_cancelled());
        flag.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn test_second_interrupt_requests_exit() {
        let flag = CancellationFlag::new();
        assert!(!flag.interrupt());
        assert!(flag.is_cancelled());
        assert!(flag.interrupt());
    }
}
