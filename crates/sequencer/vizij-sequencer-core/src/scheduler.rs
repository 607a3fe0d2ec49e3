//! Cancellable timers on an injectable clock.
//!
//! Timers are ordered by `(due, insertion)` so that work due at the same
//! instant runs in the order it was scheduled. A cancelled timer is removed
//! from the live table immediately and its heap entry is skipped lazily; it
//! can never fire.
//!
//! While due timers are drained, `now()` reports the due time of the timer
//! being fired (logical time). Work scheduled from inside a firing timer is
//! therefore placed relative to when it *should* have happened, not when the
//! host got around to ticking.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;

use hashbrown::HashMap;

use crate::clock::{Clock, Millis};
use crate::ids::{IdAllocator, StepId, TimerId};

/// What a timer does when it fires.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimerAction {
    /// Start a queued step (forward pass).
    Play(StepId),
    /// Start a queued step in reverse (rewind pass).
    Rewind(StepId),
    /// A running step reached the end of its duration.
    Complete(StepId),
    /// The post-animation pad elapsed; the sequence is complete.
    PadElapsed,
}

/// A timer popped from the queue.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Fired {
    pub id: TimerId,
    pub due: Millis,
    pub action: TimerAction,
}

#[derive(Debug)]
struct Entry {
    due: Millis,
    seq: u64,
    id: TimerId,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Reversed: BinaryHeap is a max-heap, we want the earliest (due, seq) on top.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .total_cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

pub struct Scheduler {
    clock: Box<dyn Clock>,
    ids: IdAllocator,
    queue: BinaryHeap<Entry>,
    live: HashMap<TimerId, (Millis, TimerAction)>,
    next_seq: u64,
    logical_now: Option<Millis>,
}

impl Scheduler {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self {
            clock,
            ids: IdAllocator::new(),
            queue: BinaryHeap::new(),
            live: HashMap::new(),
            next_seq: 0,
            logical_now: None,
        }
    }

    /// Current scheduling time: the firing timer's due time while draining,
    /// the clock otherwise.
    #[inline]
    pub fn now(&self) -> Millis {
        self.logical_now.unwrap_or_else(|| self.clock.now_ms())
    }

    /// Raw clock time, ignoring logical time.
    #[inline]
    pub fn clock_now(&self) -> Millis {
        self.clock.now_ms()
    }

    /// Schedule `action` to fire `delay` ms from now. Non-positive or
    /// non-finite delays fire on the next drain.
    pub fn schedule(&mut self, delay: Millis, action: TimerAction) -> TimerId {
        let delay = if delay.is_finite() && delay > 0.0 {
            delay
        } else {
            0.0
        };
        let due = self.now() + delay;
        let id = self.ids.alloc_timer();
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.queue.push(Entry { due, seq, id });
        self.live.insert(id, (due, action));
        id
    }

    /// Cancel a pending timer. Returns `true` only for the call that actually
    /// removed it.
    #[inline]
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.live.remove(&id).is_some()
    }

    #[inline]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.live.contains_key(&id)
    }

    /// Absolute due time of a pending timer.
    #[inline]
    pub fn due_of(&self, id: TimerId) -> Option<Millis> {
        self.live.get(&id).map(|(due, _)| *due)
    }

    /// Number of live timers.
    #[inline]
    pub fn pending(&self) -> usize {
        self.live.len()
    }

    /// Earliest due time among live timers.
    pub fn next_due(&self) -> Option<Millis> {
        self.live
            .values()
            .map(|(due, _)| *due)
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Pop the next live timer due at or before `now`, advancing logical time.
    pub fn pop_due(&mut self, now: Millis) -> Option<Fired> {
        loop {
            let top = self.queue.peek()?;
            if !self.live.contains_key(&top.id) {
                self.queue.pop();
                continue;
            }
            if top.due > now {
                return None;
            }
            let entry = self.queue.pop()?;
            let (due, action) = self.live.remove(&entry.id)?;
            let logical = match self.logical_now {
                Some(prev) if prev > due => prev,
                _ => due,
            };
            self.logical_now = Some(logical);
            return Some(Fired {
                id: entry.id,
                due,
                action,
            });
        }
    }

    /// Leave logical time; subsequent scheduling uses the clock again.
    #[inline]
    pub fn settle(&mut self) {
        self.logical_now = None;
    }

    /// Drop every pending timer. Returns how many were cancelled.
    pub fn clear(&mut self) -> usize {
        let n = self.live.len();
        self.live.clear();
        self.queue.clear();
        n
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.live.len())
            .field("logical_now", &self.logical_now)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn drain(s: &mut Scheduler, now: Millis) -> Vec<TimerAction> {
        let mut out = Vec::new();
        while let Some(f) = s.pop_due(now) {
            out.push(f.action);
        }
        s.settle();
        out
    }

    #[test]
    fn equal_due_times_fire_in_insertion_order() {
        let clock = ManualClock::new();
        let mut s = Scheduler::new(Box::new(clock.clone()));
        s.schedule(100.0, TimerAction::Play(StepId(2)));
        s.schedule(100.0, TimerAction::Play(StepId(0)));
        s.schedule(50.0, TimerAction::Play(StepId(1)));
        s.schedule(100.0, TimerAction::Play(StepId(3)));
        clock.advance(100.0);
        assert_eq!(
            drain(&mut s, clock.now_ms()),
            vec![
                TimerAction::Play(StepId(1)),
                TimerAction::Play(StepId(2)),
                TimerAction::Play(StepId(0)),
                TimerAction::Play(StepId(3)),
            ]
        );
    }

    #[test]
    fn cancelled_timer_never_fires_and_cancels_once() {
        let clock = ManualClock::new();
        let mut s = Scheduler::new(Box::new(clock.clone()));
        let a = s.schedule(10.0, TimerAction::Complete(StepId(0)));
        let b = s.schedule(20.0, TimerAction::PadElapsed);
        assert!(s.cancel(a));
        assert!(!s.cancel(a));
        clock.advance(1000.0);
        assert_eq!(drain(&mut s, clock.now_ms()), vec![TimerAction::PadElapsed]);
        assert!(!s.is_pending(b));
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn not_yet_due_timers_stay_queued() {
        let clock = ManualClock::new();
        let mut s = Scheduler::new(Box::new(clock.clone()));
        let id = s.schedule(500.0, TimerAction::Play(StepId(0)));
        clock.advance(499.0);
        assert!(drain(&mut s, clock.now_ms()).is_empty());
        assert_eq!(s.due_of(id), Some(500.0));
        assert_eq!(s.next_due(), Some(500.0));
    }

    #[test]
    fn logical_time_anchors_follow_up_timers() {
        let clock = ManualClock::new();
        let mut s = Scheduler::new(Box::new(clock.clone()));
        s.schedule(100.0, TimerAction::Play(StepId(0)));
        clock.advance(1000.0);
        let fired = s.pop_due(clock.now_ms()).expect("due");
        assert_eq!(fired.due, 100.0);
        assert_eq!(s.now(), 100.0);
        let follow = s.schedule(500.0, TimerAction::Complete(StepId(0)));
        assert_eq!(s.due_of(follow), Some(600.0));
        s.settle();
        assert_eq!(s.now(), 1000.0);
    }

    #[test]
    fn negative_delay_fires_immediately() {
        let clock = ManualClock::starting_at(40.0);
        let mut s = Scheduler::new(Box::new(clock.clone()));
        s.schedule(-250.0, TimerAction::Rewind(StepId(4)));
        assert_eq!(
            drain(&mut s, clock.now_ms()),
            vec![TimerAction::Rewind(StepId(4))]
        );
    }

    #[test]
    fn clear_drops_everything() {
        let clock = ManualClock::new();
        let mut s = Scheduler::new(Box::new(clock.clone()));
        s.schedule(1.0, TimerAction::PadElapsed);
        s.schedule(2.0, TimerAction::PadElapsed);
        assert_eq!(s.clear(), 2);
        clock.advance(10.0);
        assert!(drain(&mut s, clock.now_ms()).is_empty());
    }
}
