//! Display-refresh aligned coalescing of updates.

/// Keeps only the latest value scheduled between two frames.
///
/// The host asks for a frame only when [`FrameScheduler::schedule`] returns
/// `true`; every later call before the frame just replaces the pending value.
#[derive(Debug, Clone)]
pub struct FrameScheduler<T> {
    pending: Option<T>,
    frame_requested: bool,
    coalesced: u64,
}

impl<T> Default for FrameScheduler<T> {
    fn default() -> Self {
        Self {
            pending: None,
            frame_requested: false,
            coalesced: 0,
        }
    }
}

impl<T> FrameScheduler<T> {
    /// Create an idle scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` for the next frame.
    ///
    /// Returns `true` if this call needs a new frame request.
    pub fn schedule(&mut self, value: T) -> bool {
        if self.pending.replace(value).is_some() {
            self.coalesced += 1;
        }
        if self.frame_requested {
            false
        } else {
            self.frame_requested = true;
            true
        }
    }

    /// Called on the frame tick: hands out the latest value.
    pub fn take(&mut self) -> Option<T> {
        self.frame_requested = false;
        self.pending.take()
    }

    /// Drop any pending value without running it.
    pub fn cancel(&mut self) {
        self.frame_requested = false;
        self.pending = None;
    }

    /// Whether a frame has been requested and not yet run.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.frame_requested
    }

    /// Number of values replaced before they reached a frame.
    #[must_use]
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}
