use std::cmp::Ordering;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Tick-based one-shot timer queue. Entries are tagged with the epoch that
/// was current when they were scheduled; `bump_epoch` invalidates every
/// entry scheduled before the bump without walking the heap. Draining
/// happens between ticks, never during one.
#[derive(Debug)]
pub struct TimerQueue<A> {
    heap: BinaryHeap<Reverse<TimerEntry<A>>>,
    epoch: u64,
    next_seq: u64,
}

#[derive(Debug)]
struct TimerEntry<A> {
    fire_at_tick: u64,
    seq: u64,
    epoch: u64,
    action: A,
}

impl<A> PartialEq for TimerEntry<A> {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at_tick == other.fire_at_tick && self.seq == other.seq
    }
}

impl<A> Eq for TimerEntry<A> {}

impl<A> PartialOrd for TimerEntry<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A> Ord for TimerEntry<A> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.fire_at_tick, self.seq).cmp(&(other.fire_at_tick, other.seq))
    }
}

impl<A> Default for TimerQueue<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> TimerQueue<A> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            epoch: 0,
            next_seq: 0,
        }
    }

    pub fn schedule(&mut self, now_tick: u64, delay_ticks: u64, action: A) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);
        self.heap.push(Reverse(TimerEntry {
            fire_at_tick: now_tick.saturating_add(delay_ticks),
            seq,
            epoch: self.epoch,
            action,
        }));
    }

    /// Invalidates everything currently scheduled. Stale entries stay in
    /// the heap and are dropped lazily when they come due.
    pub fn bump_epoch(&mut self) {
        self.epoch = self.epoch.saturating_add(1);
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Pops every entry due at or before `now_tick`, in (fire_at, schedule
    /// order) order, silently discarding stale-epoch entries.
    pub fn drain_due(&mut self, now_tick: u64) -> Vec<A> {
        let mut due = Vec::new();
        while let Some(Reverse(entry)) = self.heap.peek() {
            if entry.fire_at_tick > now_tick {
                break;
            }
            let Some(Reverse(entry)) = self.heap.pop() else {
                break;
            };
            if entry.epoch == self.epoch {
                due.push(entry.action);
            }
        }
        due
    }

    /// Scheduled entries still carrying the current epoch.
    pub fn pending_count(&self) -> usize {
        self.heap
            .iter()
            .filter(|Reverse(entry)| entry.epoch == self.epoch)
            .count()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_fire_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(0, 30, "late");
        timers.schedule(0, 10, "early");
        timers.schedule(0, 20, "middle");

        assert!(timers.drain_due(9).is_empty());
        assert_eq!(timers.drain_due(30), vec!["early", "middle", "late"]);
        assert!(timers.drain_due(1000).is_empty());
    }

    #[test]
    fn ties_resolve_in_schedule_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(5, 10, "first");
        timers.schedule(5, 10, "second");
        timers.schedule(5, 10, "third");

        assert_eq!(timers.drain_due(15), vec!["first", "second", "third"]);
    }

    #[test]
    fn bump_epoch_discards_stale_entries() {
        let mut timers = TimerQueue::new();
        timers.schedule(0, 5, "stale");
        timers.bump_epoch();
        timers.schedule(0, 5, "fresh");

        assert_eq!(timers.pending_count(), 1);
        assert_eq!(timers.drain_due(5), vec!["fresh"]);
    }

    #[test]
    fn stale_entries_never_resurface_in_later_drains() {
        let mut timers = TimerQueue::new();
        timers.schedule(0, 100, "stale");
        timers.bump_epoch();

        assert!(timers.drain_due(100).is_empty());
        assert!(timers.drain_due(10_000).is_empty());
        assert_eq!(timers.pending_count(), 0);
    }

    #[test]
    fn due_now_is_inclusive() {
        let mut timers = TimerQueue::new();
        timers.schedule(10, 0, "now");
        assert_eq!(timers.drain_due(10), vec!["now"]);
    }
}
