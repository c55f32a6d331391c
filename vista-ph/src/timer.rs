//! Timer service
//!
//! The playhead expresses all waiting as scheduled tasks. A [`TimerService`]
//! hands back a [`TimerHandle`] for every schedule; when a task fires, the
//! owner delivers `(handle, task)` to [`crate::Playhead::on_timer`]. Cancelled
//! handles never fire.
//!
//! [`ManualTimers`] is a deterministic virtual-clock implementation used by the
//! tests; the tokio-backed implementation lives in [`crate::sim::driver`].

use crate::playhead::SeekVerification;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Identifies one scheduled task; unique for the lifetime of a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Work the playhead asked to be woken up for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerTask {
    /// Periodic gap/stall poll
    GapJump,

    /// One reverse-playback step
    TrickPlay,

    /// Debounced early-seek batch before metadata loads
    EarlySeek,

    /// Check that a corrective seek was applied
    VerifySeek(SeekVerification),
}

/// Scheduling and wall-clock source for the playhead
pub trait TimerService: Send + Sync {
    /// Wall clock used for stall timing
    fn now(&self) -> Instant;

    /// Fire `task` once after `delay`
    fn schedule_once(&self, delay: Duration, task: TimerTask) -> TimerHandle;

    /// Fire `task` every `period`, first after one period
    fn schedule_repeating(&self, period: Duration, task: TimerTask) -> TimerHandle;

    /// Cancel a pending task; unknown or already-fired handles are ignored
    fn cancel(&self, handle: TimerHandle);
}

#[derive(Debug)]
struct Scheduled {
    due: Duration,
    seq: u64,
    handle: TimerHandle,
    task: TimerTask,
    period: Option<Duration>,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due.cmp(&other.due).then(self.seq.cmp(&other.seq))
    }
}

#[derive(Debug)]
struct ManualInner {
    elapsed: Duration,
    next_id: u64,
    next_seq: u64,
    queue: BinaryHeap<Reverse<Scheduled>>,
}

/// Virtual-clock timer service
///
/// Time only moves when the owner calls [`ManualTimers::pop_due`] or
/// [`ManualTimers::run_for`]. Tasks due at the same instant fire in the
/// order they were scheduled.
#[derive(Debug)]
pub struct ManualTimers {
    origin: Instant,
    inner: Mutex<ManualInner>,
}

impl ManualTimers {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            inner: Mutex::new(ManualInner {
                elapsed: Duration::ZERO,
                next_id: 1,
                next_seq: 0,
                queue: BinaryHeap::new(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualInner> {
        // A panic while holding this lock can only come from a test assertion
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Virtual time since construction
    pub fn elapsed(&self) -> Duration {
        self.lock().elapsed
    }

    /// Number of tasks still scheduled
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// True if any pending task matches `predicate`
    pub fn has_pending(&self, predicate: impl Fn(&TimerTask) -> bool) -> bool {
        self.lock().queue.iter().any(|Reverse(s)| predicate(&s.task))
    }

    /// Pop the earliest task due at or before `deadline`, advancing the clock
    /// to its due time. Repeating tasks are re-armed before returning, so the
    /// caller may cancel them while handling the fire.
    pub fn pop_due(&self, deadline: Duration) -> Option<(TimerHandle, TimerTask)> {
        let mut inner = self.lock();
        let due = inner.queue.peek().map(|Reverse(s)| s.due)?;
        if due > deadline {
            return None;
        }
        let Reverse(fired) = inner.queue.pop()?;
        inner.elapsed = inner.elapsed.max(fired.due);

        if let Some(period) = fired.period {
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.queue.push(Reverse(Scheduled {
                due: fired.due + period,
                seq,
                handle: fired.handle,
                task: fired.task,
                period: Some(period),
            }));
        }

        Some((fired.handle, fired.task))
    }

    /// Fire everything due within `span`, in order, then settle the clock at
    /// the end of the span
    pub fn run_for(&self, span: Duration, mut deliver: impl FnMut(TimerHandle, TimerTask)) {
        let deadline = self.elapsed() + span;
        while let Some((handle, task)) = self.pop_due(deadline) {
            deliver(handle, task);
        }
        let mut inner = self.lock();
        inner.elapsed = inner.elapsed.max(deadline);
    }

    fn push(&self, delay: Duration, task: TimerTask, period: Option<Duration>) -> TimerHandle {
        let mut inner = self.lock();
        let handle = TimerHandle::new(inner.next_id);
        inner.next_id += 1;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        let due = inner.elapsed + delay;
        inner.queue.push(Reverse(Scheduled {
            due,
            seq,
            handle,
            task,
            period,
        }));
        handle
    }
}

impl Default for ManualTimers {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerService for ManualTimers {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn schedule_once(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        self.push(delay, task, None)
    }

    fn schedule_repeating(&self, period: Duration, task: TimerTask) -> TimerHandle {
        self.push(period, task, Some(period))
    }

    fn cancel(&self, handle: TimerHandle) {
        self.lock().queue.retain(|Reverse(s)| s.handle != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_fires_once_at_due_time() {
        let timers = ManualTimers::new();
        let handle = timers.schedule_once(Duration::from_millis(100), TimerTask::EarlySeek);

        assert!(timers.pop_due(Duration::from_millis(99)).is_none());
        assert_eq!(
            timers.pop_due(Duration::from_millis(100)),
            Some((handle, TimerTask::EarlySeek))
        );
        assert_eq!(timers.elapsed(), Duration::from_millis(100));
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn test_repeating_rearms() {
        let timers = ManualTimers::new();
        timers.schedule_repeating(Duration::from_millis(250), TimerTask::GapJump);

        let mut fired = 0;
        timers.run_for(Duration::from_secs(1), |_, task| {
            assert_eq!(task, TimerTask::GapJump);
            fired += 1;
        });
        assert_eq!(fired, 4);
        assert_eq!(timers.pending(), 1);
    }

    #[test]
    fn test_cancel_removes_task() {
        let timers = ManualTimers::new();
        let handle = timers.schedule_repeating(Duration::from_millis(250), TimerTask::TrickPlay);
        timers.cancel(handle);
        assert_eq!(timers.pending(), 0);

        let mut fired = 0;
        timers.run_for(Duration::from_secs(1), |_, _| fired += 1);
        assert_eq!(fired, 0);
        assert_eq!(timers.elapsed(), Duration::from_secs(1));
    }

    #[test]
    fn test_same_due_time_fires_in_schedule_order() {
        let timers = ManualTimers::new();
        let first = timers.schedule_once(Duration::from_millis(50), TimerTask::EarlySeek);
        let second = timers.schedule_once(Duration::from_millis(50), TimerTask::GapJump);

        let mut order = Vec::new();
        timers.run_for(Duration::from_millis(50), |handle, _| order.push(handle));
        assert_eq!(order, vec![first, second]);
    }

    #[test]
    fn test_now_tracks_virtual_clock() {
        let timers = ManualTimers::new();
        let start = timers.now();
        timers.run_for(Duration::from_millis(1500), |_, _| {});
        assert_eq!(timers.now() - start, Duration::from_millis(1500));
    }
}
