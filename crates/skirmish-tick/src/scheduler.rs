//! Deferred callbacks on the orchestration thread.
//!
//! Countdown ticks, delayed checks and forced-kick timers are all posted
//! here with a delay in ticks. Tasks run in order of due tick, then of
//! posting, each receiving `&mut C` (the state the host hands to
//! [`Scheduler::advance`]).
//!
//! Cancellation is a flag shared between the queued task and its
//! [`TaskHandle`]: a task cancelled before it comes due never runs, and a
//! repeating task cancelled from inside its own callback is not
//! rescheduled.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// The callback type stored by the scheduler.
pub type TaskFn<C> = Box<dyn FnMut(&mut C) + Send>;

/// Cancels a scheduled task. Cloning shares the same flag.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: u64,
    cancelled: Arc<AtomicBool>,
}

impl TaskHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Prevents any future run of the task.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

struct Task<C> {
    interval: Option<u64>,
    cancelled: Arc<AtomicBool>,
    run: TaskFn<C>,
}

/// Single-threaded tick-based task queue.
pub struct Scheduler<C> {
    now: u64,
    next_id: u64,
    /// (due tick, task id); ids grow monotonically, so ties run in posting order.
    queue: BinaryHeap<Reverse<(u64, u64)>>,
    tasks: HashMap<u64, Task<C>>,
}

impl<C> Scheduler<C> {
    pub fn new() -> Self {
        Self {
            now: 0,
            next_id: 0,
            queue: BinaryHeap::new(),
            tasks: HashMap::new(),
        }
    }

    /// The number of ticks advanced so far.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Runs `f` once, `delay` ticks from now. A delay of 0 runs on the next
    /// tick.
    pub fn run_later<F>(&mut self, delay: u64, f: F) -> TaskHandle
    where
        F: FnMut(&mut C) + Send + 'static,
    {
        self.post(delay, None, Box::new(f))
    }

    /// Runs `f` every `interval` ticks, the first time `initial_delay`
    /// ticks from now. An interval of 0 is treated as 1.
    pub fn run_repeating<F>(&mut self, initial_delay: u64, interval: u64, f: F) -> TaskHandle
    where
        F: FnMut(&mut C) + Send + 'static,
    {
        self.post(initial_delay, Some(interval.max(1)), Box::new(f))
    }

    fn post(&mut self, delay: u64, interval: Option<u64>, run: TaskFn<C>) -> TaskHandle {
        self.next_id += 1;
        let id = self.next_id;
        let cancelled = Arc::new(AtomicBool::new(false));
        let due = self.now + delay.max(1);
        self.queue.push(Reverse((due, id)));
        self.tasks.insert(
            id,
            Task {
                interval,
                cancelled: Arc::clone(&cancelled),
                run,
            },
        );
        tracing::trace!(task = id, due, ?interval, "task scheduled");
        TaskHandle { id, cancelled }
    }

    /// Advances one tick and runs every task that is now due. Returns how
    /// many callbacks ran.
    pub fn advance(&mut self, ctx: &mut C) -> usize {
        self.now += 1;
        let mut ran = 0;

        while let Some(Reverse((due, id))) = self.queue.peek().copied() {
            if due > self.now {
                break;
            }
            self.queue.pop();

            let Some(mut task) = self.tasks.remove(&id) else {
                continue;
            };
            if task.cancelled.load(Ordering::Acquire) {
                tracing::trace!(task = id, "cancelled task dropped");
                continue;
            }

            (task.run)(ctx);
            ran += 1;

            if let Some(interval) = task.interval {
                if !task.cancelled.load(Ordering::Acquire) {
                    self.queue.push(Reverse((self.now + interval, id)));
                    self.tasks.insert(id, task);
                }
            }
        }

        ran
    }

    /// Number of tasks still queued, cancelled ones excluded.
    pub fn pending(&self) -> usize {
        self.tasks
            .values()
            .filter(|t| !t.cancelled.load(Ordering::Acquire))
            .count()
    }

    /// Cancels and drops every queued task.
    pub fn cancel_all(&mut self) {
        for task in self.tasks.values() {
            task.cancelled.store(true, Ordering::Release);
        }
        self.tasks.clear();
        self.queue.clear();
    }
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}
