//! Timers and debouncing on a caller-driven clock.
//!
//! Nothing here reads the wall clock. The host passes the current time in
//! (`Duration` since any fixed origin, e.g. `performance.now()`) and polls
//! for due timers, so the queue is deterministic and independent of any UI
//! framework's effect or lifecycle hooks.

use std::time::Duration;

/// Quiescence window for container resizes.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(500);

/// Identifies one scheduled timer. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy)]
struct Entry {
    handle: TimerHandle,
    deadline: Duration,
}

/// One-shot timers ordered by deadline.
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    pending: Vec<Entry>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a timer firing `delay` after `now`.
    pub fn schedule(&mut self, delay: Duration, now: Duration) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.pending.push(Entry {
            handle,
            deadline: now.saturating_add(delay),
        });
        handle
    }

    /// Cancel a pending timer. Returns `false` if it already fired or was
    /// cancelled before.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|e| e.handle != handle);
        self.pending.len() != before
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|e| e.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest pending deadline, for hosts that arm a single native timer.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.iter().map(|e| e.deadline).min()
    }

    /// Remove and return every timer due at `now`, earliest first. Timers
    /// with equal deadlines fire in scheduling order.
    pub fn fire_due(&mut self, now: Duration) -> Vec<TimerHandle> {
        let mut due: Vec<Entry> = Vec::new();
        self.pending.retain(|e| {
            if e.deadline <= now {
                due.push(*e);
                false
            } else {
                true
            }
        });
        due.sort_by_key(|e| (e.deadline, e.handle));
        due.into_iter().map(|e| e.handle).collect()
    }
}

/// Trailing-edge debouncer carrying the latest payload.
///
/// Every [`trigger`](Self::trigger) cancels the pending timer and schedules
/// a new one, so a burst of triggers yields one payload (the last) once the
/// burst has been quiet for the whole delay.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    timers: TimerQueue,
    pending: Option<(TimerHandle, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            timers: TimerQueue::new(),
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace the pending payload and restart the quiescence window.
    pub fn trigger(&mut self, payload: T, now: Duration) {
        if let Some((handle, _)) = self.pending.take() {
            self.timers.cancel(handle);
        }
        let handle = self.timers.schedule(self.delay, now);
        self.pending = Some((handle, payload));
    }

    /// Drop the pending payload without firing.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some((handle, _)) => self.timers.cancel(handle),
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    /// The payload, once, if its timer is due at `now`.
    pub fn poll(&mut self, now: Duration) -> Option<T> {
        let fired = self.timers.fire_due(now);
        match self.pending.take() {
            Some((handle, payload)) if fired.contains(&handle) => Some(payload),
            other => {
                self.pending = other;
                None
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_fire_due_in_deadline_order() {
        let mut q = TimerQueue::new();
        let late = q.schedule(ms(300), ms(0));
        let early = q.schedule(ms(100), ms(0));
        let tie = q.schedule(ms(50), ms(50));
        assert_eq!(q.fire_due(ms(99)), vec![]);
        assert_eq!(q.fire_due(ms(100)), vec![early, tie]);
        assert_eq!(q.len(), 1);
        assert_eq!(q.fire_due(ms(1000)), vec![late]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let mut q = TimerQueue::new();
        let h = q.schedule(ms(10), ms(0));
        assert!(q.cancel(h));
        assert!(!q.cancel(h));
        assert!(q.fire_due(ms(1_000_000)).is_empty());
    }

    #[test]
    fn test_handles_are_unique() {
        let mut q = TimerQueue::new();
        let a = q.schedule(ms(1), ms(0));
        q.fire_due(ms(5));
        let b = q.schedule(ms(1), ms(0));
        assert_ne!(a, b);
        assert!(!q.is_pending(a));
        assert!(q.is_pending(b));
    }

    #[test]
    fn test_debounce_burst_yields_last_payload_once() {
        let mut d = Debouncer::new(RESIZE_DEBOUNCE);
        for i in 0..10u64 {
            d.trigger(i, ms(i * 100));
        }
        // Last trigger at 900ms: nothing until 1400ms.
        assert_eq!(d.poll(ms(1399)), None);
        assert!(d.is_pending());
        assert_eq!(d.poll(ms(1400)), Some(9));
        assert_eq!(d.poll(ms(5000)), None);
        assert!(!d.is_pending());
    }

    #[test]
    fn test_debounce_spaced_triggers_fire_separately() {
        let mut d = Debouncer::new(ms(500));
        d.trigger("a", ms(0));
        assert_eq!(d.poll(ms(500)), Some("a"));
        d.trigger("b", ms(600));
        assert_eq!(d.next_deadline(), Some(ms(1100)));
        assert_eq!(d.poll(ms(1100)), Some("b"));
    }

    #[test]
    fn test_debounce_cancel() {
        let mut d = Debouncer::new(ms(500));
        d.trigger(1, ms(0));
        assert!(d.cancel());
        assert!(!d.cancel());
        assert_eq!(d.poll(ms(10_000)), None);
    }
}
