//! # Task Management System
//!
//! A fixed pool of worker threads fed through per-worker channels.
//!
//! ## Architecture Overview
//! - `TaskManager`: owns the workers, dispatches tasks round-robin and queues
//!   whatever cannot be dispatched yet
//! - `Task`: a unit of work executed on a worker
//! - `TaskOutcome`: what a worker sends back for every task it received
//! - `BudgetedQueue`: FIFO drained a bounded number of items per tick, used by
//!   the chunk streamer
//!
//! ## Task Lifecycle
//! 1. Tasks are published via `TaskManager::publish_task()`
//! 2. A task goes to the next worker with a free slot, or waits in the queue
//! 3. Workers process tasks and send back a `TaskOutcome` on a channel shared
//!    by all workers
//! 4. The primary thread collects outcomes with `process_completed_tasks()`,
//!    which frees the worker slots
//! 5. `process_queued_tasks()` hands waiting tasks to the freed workers
//!
//! Each worker accepts [`MAX_TASKS_IN_FLIGHT`] task at a time, so the number of
//! tasks running concurrently never exceeds the number of workers. A task that
//! panics still produces an outcome, so its slot is always released.
//!
//! ## Example Usage
//! ```
//! use voxel_streaming::engine_state::task_management::{task::Task, TaskManager};
//!
//! struct Square(u64);
//!
//! impl Task for Square {
//!     type Id = u64;
//!     type Output = u64;
//!     fn id(&self) -> u64 { self.0 }
//!     fn process(self) -> u64 { self.0 * self.0 }
//! }
//!
//! let mut manager = TaskManager::new(2, "square").unwrap();
//! manager.publish_task(Square(3));
//! let outcome = manager
//!     .wait_for_completed(std::time::Duration::from_secs(5))
//!     .unwrap();
//! assert_eq!(outcome.result, Ok(9));
//! ```

pub mod budgeted_queue;
pub mod task;

use std::{
    any::Any,
    collections::VecDeque,
    panic::{self, AssertUnwindSafe},
    sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender},
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{debug, error, info};

use crate::error::VoxelError;

pub use budgeted_queue::BudgetedQueue;
use task::{Task, TaskOutcome};

/// Maximum number of tasks that can be in flight per worker channel.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

/// The primary thread's end of one worker.
struct TaskChannel<T: Task> {
    task_sender: Option<Sender<T>>,
    num_tasks_in_flight: usize,
    worker: Option<JoinHandle<()>>,
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// Dropping the manager closes every task channel and joins the workers after
/// they finish the task they are running. Queued tasks are discarded.
pub struct TaskManager<T: Task> {
    channels: Vec<TaskChannel<T>>,
    result_receiver: Receiver<TaskOutcome<T::Id, T::Output>>,
    queued_tasks: VecDeque<T>,
    current_channel: usize,
}

impl<T: Task> TaskManager<T> {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    ///
    /// # Arguments
    /// * `num_workers` - Number of worker threads to create
    /// * `name` - Prefix of the worker thread names
    ///
    /// # Returns
    /// The manager, or `VoxelError::Io` if a thread could not be spawned.
    pub fn new(num_workers: usize, name: &str) -> Result<Self, VoxelError> {
        let (result_tx, result_rx) = channel::<TaskOutcome<T::Id, T::Output>>();
        let mut channels = Vec::with_capacity(num_workers);

        info!(
            "Starting {} `{}` workers (available parallelism: {:?})",
            num_workers,
            name,
            thread::available_parallelism()
        );

        for worker_index in 0..num_workers {
            let (task_tx, task_rx) = channel::<T>();
            let result_tx = result_tx.clone();

            let task_closure = move || {
                while let Ok(task) = task_rx.recv() {
                    let id = task.id();
                    let result = panic::catch_unwind(AssertUnwindSafe(|| task.process()))
                        .map_err(panic_message);
                    if let Err(message) = &result {
                        error!("Worker {} task panicked: {}", worker_index, message);
                    }
                    let outcome = TaskOutcome {
                        worker: worker_index,
                        id,
                        result,
                    };
                    if result_tx.send(outcome).is_err() {
                        break;
                    }
                }
            };

            let worker = thread::Builder::new()
                .name(format!("{}-{}", name, worker_index))
                .spawn(task_closure)?;

            channels.push(TaskChannel {
                task_sender: Some(task_tx),
                num_tasks_in_flight: 0,
                worker: Some(worker),
            });
        }

        Ok(TaskManager {
            channels,
            result_receiver: result_rx,
            queued_tasks: VecDeque::new(),
            current_channel: 0,
        })
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// # Returns
    /// - `Ok(())` if the task was handed to the worker
    /// - `Err(task)` if the worker is gone
    fn try_send_task(&mut self, task: T, channel_idx: usize) -> Result<(), T> {
        let channel = &mut self.channels[channel_idx];
        let Some(sender) = &channel.task_sender else {
            return Err(task);
        };
        match sender.send(task) {
            Ok(()) => {
                channel.num_tasks_in_flight += 1;
                Ok(())
            }
            Err(err) => Err(err.0),
        }
    }

    /// Finds a worker channel that can accept a new task, starting from the
    /// channel after the last one used.
    fn find_available_channel(&self) -> Option<usize> {
        let count = self.channels.len();
        (0..count)
            .map(|offset| (self.current_channel + offset) % count)
            .find(|&idx| self.channels[idx].num_tasks_in_flight < MAX_TASKS_IN_FLIGHT)
    }

    /// Publishes a new task for execution.
    ///
    /// # Returns
    /// - `true` if the task was immediately handed to a worker
    /// - `false` if the task was queued because all workers are busy
    pub fn publish_task(&mut self, task: T) -> bool {
        match self.find_available_channel() {
            Some(channel_idx) => match self.try_send_task(task, channel_idx) {
                Ok(()) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    true
                }
                Err(task) => {
                    self.queued_tasks.push_back(task);
                    false
                }
            },
            None => {
                self.queued_tasks.push_back(task);
                false
            }
        }
    }

    /// Hands queued tasks to free workers, oldest first.
    ///
    /// # Returns
    /// The number of tasks dispatched.
    pub fn process_queued_tasks(&mut self) -> usize {
        let mut dispatched = 0;
        while let Some(channel_idx) = self.find_available_channel() {
            let Some(task) = self.queued_tasks.pop_front() else {
                break;
            };
            match self.try_send_task(task, channel_idx) {
                Ok(()) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    dispatched += 1;
                }
                Err(task) => {
                    error!("Worker {} is disconnected, keeping task queued", channel_idx);
                    self.queued_tasks.push_front(task);
                    break;
                }
            }
        }
        if dispatched > 0 {
            debug!(
                "Dispatched {} queued tasks, {} still waiting",
                dispatched,
                self.queued_tasks.len()
            );
        }
        dispatched
    }

    /// Collects every outcome that is already available without blocking.
    pub fn process_completed_tasks(&mut self) -> Vec<TaskOutcome<T::Id, T::Output>> {
        let mut outcomes = Vec::new();
        while let Ok(outcome) = self.result_receiver.try_recv() {
            self.release(&outcome);
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Blocks until one outcome arrives or `timeout` elapses.
    ///
    /// Returns `None` on timeout, or immediately when nothing is in flight.
    pub fn wait_for_completed(
        &mut self,
        timeout: Duration,
    ) -> Option<TaskOutcome<T::Id, T::Output>> {
        if self.in_flight() == 0 {
            return None;
        }
        match self.result_receiver.recv_timeout(timeout) {
            Ok(outcome) => {
                self.release(&outcome);
                Some(outcome)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    fn release(&mut self, outcome: &TaskOutcome<T::Id, T::Output>) {
        if let Some(channel) = self.channels.get_mut(outcome.worker) {
            channel.num_tasks_in_flight = channel.num_tasks_in_flight.saturating_sub(1);
        }
    }

    /// Tasks handed to workers whose outcome has not been collected yet.
    pub fn in_flight(&self) -> usize {
        self.channels
            .iter()
            .map(|channel| channel.num_tasks_in_flight)
            .sum()
    }

    /// Tasks waiting for a free worker.
    pub fn queued(&self) -> usize {
        self.queued_tasks.len()
    }

    pub fn num_workers(&self) -> usize {
        self.channels.len()
    }
}

impl<T: Task> Drop for TaskManager<T> {
    fn drop(&mut self) {
        self.queued_tasks.clear();
        for channel in &mut self.channels {
            channel.task_sender.take();
        }
        for (idx, channel) in self.channels.iter_mut().enumerate() {
            if let Some(worker) = channel.worker.take() {
                if worker.join().is_err() {
                    error!("Worker {} terminated abnormally", idx);
                }
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    struct Sleepy {
        id: usize,
        running: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    impl Task for Sleepy {
        type Id = usize;
        type Output = ();

        fn id(&self) -> usize {
            self.id
        }

        fn process(self) {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(5));
            self.running.fetch_sub(1, Ordering::SeqCst);
        }
    }

    struct Explodes(bool);

    impl Task for Explodes {
        type Id = bool;
        type Output = u8;

        fn id(&self) -> bool {
            self.0
        }

        fn process(self) -> u8 {
            if self.0 {
                panic!("boom");
            }
            7
        }
    }

    #[test]
    fn concurrency_never_exceeds_worker_count() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut manager = TaskManager::new(2, "sleepy").unwrap();

        for id in 0..8 {
            manager.publish_task(Sleepy {
                id,
                running: running.clone(),
                peak: peak.clone(),
            });
        }
        assert_eq!(manager.in_flight(), 2);
        assert_eq!(manager.queued(), 6);

        let mut finished = Vec::new();
        while finished.len() < 8 {
            if let Some(outcome) = manager.wait_for_completed(Duration::from_secs(5)) {
                finished.push(outcome.id);
            }
            manager.process_queued_tasks();
            assert!(manager.in_flight() <= 2);
        }

        finished.sort_unstable();
        assert_eq!(finished, (0..8).collect::<Vec<_>>());
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn panicking_task_releases_its_slot() {
        let mut manager = TaskManager::new(1, "explodes").unwrap();

        assert!(manager.publish_task(Explodes(true)));
        assert!(!manager.publish_task(Explodes(false)));

        let failed = manager.wait_for_completed(Duration::from_secs(5)).unwrap();
        assert!(failed.id);
        assert_eq!(failed.result, Err("boom".to_string()));
        assert_eq!(manager.in_flight(), 0);

        assert_eq!(manager.process_queued_tasks(), 1);
        let ok = manager.wait_for_completed(Duration::from_secs(5)).unwrap();
        assert_eq!(ok.result, Ok(7));
    }

    #[test]
    fn waiting_with_nothing_in_flight_returns_immediately() {
        let mut manager: TaskManager<Explodes> = TaskManager::new(1, "idle").unwrap();
        assert!(manager.wait_for_completed(Duration::from_secs(60)).is_none());
    }
}
