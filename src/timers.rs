//! Enforcement timer queue.
//!
//! Timers carry the target's stable key (a folded nick or channel
//! name), never a reference; the callback re-resolves through the
//! registries when it fires and no-ops if the key no longer resolves or
//! the guarded condition is already satisfied. One timer exists per
//! (kind, key); scheduling again supersedes the old deadline.

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Disconnect the holder of a protected nick and hold the nick.
    Collide,
    /// Give up a held nick.
    Release,
    /// Part a channel the service joined to make an enforcement ban
    /// stick.
    InhabitPart,
}

/// A pending timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    pub kind: TimerKind,
    /// Folded nick or channel name.
    pub key: String,
    pub deadline: i64,
}

/// The timer queue, polled once per tick by the event loop.
#[derive(Debug, Default)]
pub struct TimerQueue {
    timers: Vec<Timer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Schedule, superseding any existing timer of the same kind for
    /// the same key.
    pub fn schedule(&mut self, kind: TimerKind, key: &str, deadline: i64) {
        self.cancel(kind, key);
        self.timers.push(Timer {
            kind,
            key: key.to_owned(),
            deadline,
        });
    }

    /// Cancel one (kind, key) timer. Missing timers are fine.
    pub fn cancel(&mut self, kind: TimerKind, key: &str) {
        self.timers.retain(|t| !(t.kind == kind && t.key == key));
    }

    /// Cancel every timer for a key, any kind.
    pub fn cancel_all(&mut self, key: &str) {
        self.timers.retain(|t| t.key != key);
    }

    pub fn pending(&self, kind: TimerKind, key: &str) -> bool {
        self.timers.iter().any(|t| t.kind == kind && t.key == key)
    }

    /// Remove and return every timer due at `now`.
    pub fn due(&mut self, now: i64) -> Vec<Timer> {
        let (due, pending): (Vec<Timer>, Vec<Timer>) =
            self.timers.drain(..).partition(|t| t.deadline <= now);
        self.timers = pending;
        due
    }
}
