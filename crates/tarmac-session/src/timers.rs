#![forbid(unsafe_code)]

//! Deterministic one-shot timers.
//!
//! The queue never reads a clock. The host advances it explicitly and
//! drains due timers one at a time with [`TimerQueue::pop_due`], so a timer
//! scheduled while handling another one can still fire within the same
//! advance.
//!
//! ```
//! use std::time::Duration;
//! use tarmac_session::timers::TimerQueue;
//!
//! let mut q = TimerQueue::new();
//! let id = q.schedule(Duration::from_millis(100), "warn");
//! let target = q.now() + Duration::from_millis(150);
//! assert_eq!(q.pop_due(target), Some((id, "warn")));
//! assert_eq!(q.pop_due(target), None);
//! q.settle(target);
//! assert_eq!(q.now(), Duration::from_millis(150));
//! ```

use std::time::Duration;

/// Handle of a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    pub const fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Timer<T> {
    id: TimerId,
    deadline: Duration,
    payload: T,
}

/// Pending one-shot timers carrying a payload each.
#[derive(Debug, Clone)]
pub struct TimerQueue<T> {
    now: Duration,
    next_id: u64,
    pending: Vec<Timer<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            pending: Vec::new(),
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed since the queue was created.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Fire `payload` once, `delay` from now.
    pub fn schedule(&mut self, delay: Duration, payload: T) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending.push(Timer {
            id,
            deadline: self.now + delay,
            payload,
        });
        id
    }

    /// Cancel a pending timer. Returns `false` if it already fired or was
    /// cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t.id != id);
        self.pending.len() != before
    }

    /// Cancel everything.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|t| t.id == id)
    }

    /// Absolute deadline of a pending timer.
    pub fn deadline(&self, id: TimerId) -> Option<Duration> {
        self.pending.iter().find(|t| t.id == id).map(|t| t.deadline)
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.iter().map(|t| t.deadline).min()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return the earliest timer due at or before `target`,
    /// moving the clock to its deadline. Ties fire in scheduling order.
    pub fn pop_due(&mut self, target: Duration) -> Option<(TimerId, T)> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.deadline <= target)
            .min_by_key(|(_, t)| (t.deadline, t.id))
            .map(|(i, _)| i)?;
        let timer = self.pending.remove(idx);
        self.now = self.now.max(timer.deadline);
        Some((timer.id, timer.payload))
    }

    /// Move the clock to `target` without firing anything. The clock never
    /// runs backwards.
    pub fn settle(&mut self, target: Duration) {
        self.now = self.now.max(target);
    }

    /// Advance by `dt`, returning every timer that came due, in order.
    ///
    /// Timers scheduled by the caller while handling the result are not
    /// included; use [`pop_due`](Self::pop_due) for that.
    pub fn advance(&mut self, dt: Duration) -> Vec<(TimerId, T)> {
        let target = self.now + dt;
        let mut fired = Vec::new();
        while let Some(due) = self.pop_due(target) {
            fired.push(due);
        }
        self.settle(target);
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn fires_in_deadline_order() {
        let mut q = TimerQueue::new();
        let late = q.schedule(ms(300), "late");
        let early = q.schedule(ms(100), "early");
        let fired = q.advance(ms(500));
        assert_eq!(fired, vec![(early, "early"), (late, "late")]);
        assert_eq!(q.now(), ms(500));
        assert!(q.is_empty());
    }

    #[test]
    fn ties_fire_in_scheduling_order() {
        let mut q = TimerQueue::new();
        let a = q.schedule(ms(50), 'a');
        let b = q.schedule(ms(50), 'b');
        assert_eq!(q.advance(ms(50)), vec![(a, 'a'), (b, 'b')]);
    }

    #[test]
    fn not_yet_due_stays_pending() {
        let mut q = TimerQueue::new();
        let id = q.schedule(ms(100), ());
        assert!(q.advance(ms(99)).is_empty());
        assert!(q.is_pending(id));
        assert_eq!(q.deadline(id), Some(ms(100)));
        assert_eq!(q.advance(ms(1)).len(), 1);
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut q = TimerQueue::new();
        let id = q.schedule(ms(10), ());
        assert!(q.cancel(id));
        assert!(!q.cancel(id));
        assert!(q.advance(ms(100)).is_empty());
    }

    #[test]
    fn pop_due_moves_clock_to_deadline() {
        let mut q = TimerQueue::new();
        q.schedule(ms(40), 1);
        let target = ms(100);
        assert!(q.pop_due(target).is_some());
        assert_eq!(q.now(), ms(40));
        q.schedule(ms(30), 2);
        assert_eq!(q.pop_due(target).map(|(_, v)| v), Some(2));
        assert_eq!(q.now(), ms(70));
        q.settle(target);
        q.settle(ms(10));
        assert_eq!(q.now(), target);
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let mut q = TimerQueue::new();
        let a = q.schedule(ms(1), ());
        let b = q.schedule(ms(1), ());
        assert!(a < b);
        assert_eq!(q.next_deadline(), Some(ms(1)));
        q.clear();
        assert_eq!(q.next_deadline(), None);
    }
}
