//! Periodic task scheduling.
//!
//! Engines never own a timer. They are handed a [`Scheduler`] so the same
//! engine can be driven by a real timer thread or by a virtual clock that a
//! test advances by hand.

use parking_lot::{Condvar, Mutex, MutexGuard};
use std::{
    cmp::Ordering,
    collections::BinaryHeap,
    fmt,
    sync::{Arc, OnceLock},
    thread,
    time::{Duration, Instant},
};

/// Returned by a periodic task to keep or cancel its schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    Continue,
    Stop,
}

/// A periodic task. Receives the scheduler time of the tick.
pub type Task = Box<dyn FnMut(Duration) -> Tick + Send>;

pub trait Scheduler: Send + Sync {
    /// Monotonic time since the scheduler was created.
    fn now(&self) -> Duration;

    /// Run `task` immediately and then every `period` until it returns
    /// [`Tick::Stop`]. `period` must be non-zero.
    fn schedule_periodic(&self, period: Duration, task: Task);
}

struct Entry {
    due: Instant,
    seq: u64,
    period: Duration,
    task: Task,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // reversed so the max-heap pops the earliest deadline
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Default)]
struct Queue {
    entries: BinaryHeap<Entry>,
    next_seq: u64,
    shutdown: bool,
}

struct Timer {
    origin: Instant,
    queue: Mutex<Queue>,
    wake: Condvar,
}

impl Timer {
    fn run(&self) {
        let mut queue = self.queue.lock();
        loop {
            if queue.shutdown {
                return;
            }
            let Some(next_due) = queue.entries.peek().map(|entry| entry.due) else {
                self.wake.wait(&mut queue);
                continue;
            };
            let now = Instant::now();
            if next_due > now {
                self.wake.wait_until(&mut queue, next_due);
                continue;
            }
            let Some(mut entry) = queue.entries.pop() else {
                continue;
            };

            let tick = MutexGuard::unlocked(&mut queue, || {
                (entry.task)(now.saturating_duration_since(self.origin))
            });

            if tick == Tick::Continue {
                entry.due += entry.period;
                // skip ticks missed while the task or the system was slow
                if entry.due <= now {
                    entry.due = now + entry.period;
                }
                queue.entries.push(entry);
            }
        }
    }
}

/// Real-time scheduler backed by a single timer thread.
pub struct ThreadScheduler {
    timer: Arc<Timer>,
}

impl ThreadScheduler {
    pub fn new() -> Self {
        let timer = Arc::new(Timer {
            origin: Instant::now(),
            queue: Mutex::new(Queue::default()),
            wake: Condvar::new(),
        });
        let worker = timer.clone();
        thread::Builder::new()
            .name("reel-timer".to_string())
            .spawn(move || worker.run())
            .expect("failed to spawn reel timer thread");
        Self { timer }
    }

    /// Process-wide scheduler shared by every engine that does not bring
    /// its own.
    pub fn shared() -> Arc<ThreadScheduler> {
        static SHARED: OnceLock<Arc<ThreadScheduler>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(ThreadScheduler::new())).clone()
    }

    /// Number of tasks currently scheduled.
    pub fn pending(&self) -> usize {
        self.timer.queue.lock().entries.len()
    }
}

impl Default for ThreadScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        self.timer.queue.lock().shutdown = true;
        self.timer.wake.notify_all();
    }
}

impl fmt::Debug for ThreadScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

impl Scheduler for ThreadScheduler {
    fn now(&self) -> Duration {
        self.timer.origin.elapsed()
    }

    fn schedule_periodic(&self, period: Duration, task: Task) {
        debug_assert!(!period.is_zero(), "periodic task needs a non-zero period");
        let mut queue = self.timer.queue.lock();
        let seq = queue.next_seq;
        queue.next_seq += 1;
        queue.entries.push(Entry {
            due: Instant::now(),
            seq,
            period,
            task,
        });
        drop(queue);
        self.timer.wake.notify_all();
    }
}

struct ManualEntry {
    id: u64,
    due: Duration,
    period: Duration,
    task: Task,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_id: u64,
    entries: Vec<ManualEntry>,
}

/// Virtual clock. Time only moves when [`ManualScheduler::advance`] is
/// called, and tasks run on the calling thread.
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `by`, running every task that falls due in
    /// deadline order. Tasks may schedule further tasks while running.
    pub fn advance(&self, by: Duration) {
        let target = self.state.lock().now + by;
        loop {
            let mut state = self.state.lock();
            let next = state
                .entries
                .iter()
                .enumerate()
                .filter(|(_, entry)| entry.due <= target)
                .min_by_key(|(_, entry)| (entry.due, entry.id))
                .map(|(idx, _)| idx);
            let Some(idx) = next else {
                state.now = target;
                return;
            };
            let mut entry = state.entries.swap_remove(idx);
            state.now = state.now.max(entry.due);
            let now = state.now;
            drop(state);

            if (entry.task)(now) == Tick::Continue {
                entry.due = now + entry.period;
                self.state.lock().entries.push(entry);
            }
        }
    }

    /// Number of tasks currently scheduled.
    pub fn pending(&self) -> usize {
        self.state.lock().entries.len()
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ManualScheduler")
            .field("now", &state.now)
            .field("pending", &state.entries.len())
            .finish()
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> Duration {
        self.state.lock().now
    }

    fn schedule_periodic(&self, period: Duration, task: Task) {
        debug_assert!(!period.is_zero(), "periodic task needs a non-zero period");
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        let due = state.now;
        state.entries.push(ManualEntry {
            id,
            due,
            period,
            task,
        });
    }
}
