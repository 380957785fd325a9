//! Time-based coalescing of window resize events.

/// What the host should do with an incoming resize event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAction {
    /// Dispatch right away; no batching window is configured.
    Dispatch,
    /// Schedule one flush after this many milliseconds.
    Schedule(u32),
    /// A flush is already pending; drop the event.
    Coalesced,
}

/// Collapses a burst of resize events into one handled callback.
///
/// A single pending flag, not a counter: at most one flush is ever queued.
#[derive(Debug, Clone, Default)]
pub struct ResizeCoalescer {
    window_ms: Option<u32>,
    pending: bool,
}

impl ResizeCoalescer {
    /// Creates a coalescer with an optional batching window.
    #[must_use]
    pub const fn new(window_ms: Option<u32>) -> Self {
        Self {
            window_ms,
            pending: false,
        }
    }

    /// Records a resize event.
    pub const fn on_resize(&mut self) -> ResizeAction {
        match self.window_ms {
            None | Some(0) => ResizeAction::Dispatch,
            Some(_) if self.pending => ResizeAction::Coalesced,
            Some(window) => {
                self.pending = true;
                ResizeAction::Schedule(window)
            }
        }
    }

    /// Consumes the pending flag. Returns `true` if a flush was owed.
    pub const fn flush(&mut self) -> bool {
        let pending = self.pending;
        self.pending = false;
        pending
    }

    /// Returns `true` while a flush is queued.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_collapses_to_one_flush() {
        let mut coalescer = ResizeCoalescer::new(Some(50));
        assert_eq!(coalescer.on_resize(), ResizeAction::Schedule(50));
        assert_eq!(coalescer.on_resize(), ResizeAction::Coalesced);
        assert_eq!(coalescer.on_resize(), ResizeAction::Coalesced);
        assert!(coalescer.flush());
        assert!(!coalescer.flush());
        assert_eq!(coalescer.on_resize(), ResizeAction::Schedule(50));
    }

    #[test]
    fn no_window_dispatches_immediately() {
        let mut coalescer = ResizeCoalescer::new(None);
        assert_eq!(coalescer.on_resize(), ResizeAction::Dispatch);
        assert_eq!(coalescer.on_resize(), ResizeAction::Dispatch);
        assert!(!coalescer.is_pending());
    }
}
