//! Debounced settings writes.
//!
//! Rapid configuration changes (dragging a color picker, scrubbing the
//! smoothing slider) must coalesce into at most one disk write per quiet
//! interval, and only the *last* observed state may be written. This is
//! modeled explicitly as a pending write with a deadline: every new change
//! replaces the payload and restarts the countdown; the write fires when the
//! deadline elapses uninterrupted, or immediately on [`DebouncedSave::flush`]
//! (used before switching files so a pending save still targets the previous
//! file's key).

use std::time::{Duration, Instant};

use crate::persistence::FileSettings;

/// Default quiet interval before a pending write fires.
pub const DEFAULT_QUIET_INTERVAL: Duration = Duration::from_millis(500);

struct PendingWrite {
    key: String,
    settings: FileSettings,
    deadline: Instant,
}

/// A cancel-and-restart write scheduler for one settings entry at a time.
pub struct DebouncedSave {
    quiet: Duration,
    pending: Option<PendingWrite>,
}

impl Default for DebouncedSave {
    fn default() -> Self {
        Self::new()
    }
}

impl DebouncedSave {
    pub fn new() -> Self {
        Self::with_interval(DEFAULT_QUIET_INTERVAL)
    }

    pub fn with_interval(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    /// Schedule a write of `settings` under `key`, replacing any pending
    /// payload and restarting the countdown from `now`.
    pub fn schedule(&mut self, key: String, settings: FileSettings, now: Instant) {
        self.pending = Some(PendingWrite {
            key,
            settings,
            deadline: now + self.quiet,
        });
    }

    /// Take the pending write if its deadline has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<(String, FileSettings)> {
        if self.pending.as_ref()?.deadline > now {
            return None;
        }
        self.take()
    }

    /// Take the pending write immediately, regardless of its deadline.
    pub fn flush(&mut self) -> Option<(String, FileSettings)> {
        self.take()
    }

    /// Drop the pending write without firing it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Key of the pending write, if any.
    pub fn pending_key(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.key.as_str())
    }

    fn take(&mut self) -> Option<(String, FileSettings)> {
        self.pending.take().map(|p| (p.key, p.settings))
    }
}
