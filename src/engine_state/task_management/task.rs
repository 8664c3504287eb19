//! # Task System Core Traits
//!
//! ## Task Lifecycle
//! 1. A `Task` is created and scheduled via `TaskManager::publish_task()`
//! 2. The task's `process()` method is called on a worker thread
//! 3. The worker sends back a [`TaskOutcome`] carrying the task's ID and its
//!    output, or the panic message if processing panicked
//! 4. The owner drains outcomes on the primary thread and applies them
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred to a worker
//! - Outputs must be `Send` to be transferred back to the primary thread
//! - A task owns everything it reads; nothing is shared with the primary
//!   thread while it runs except through explicitly synchronized handles

/// A unit of work executed on a worker thread.
///
/// Tasks should own all the data they need. The `id` is captured before
/// processing starts so that the outcome can still be attributed if
/// `process` panics.
pub trait Task: Send + 'static {
    /// Identifies the task in its outcome.
    type Id: Send + 'static;
    type Output: Send + 'static;

    fn id(&self) -> Self::Id;

    /// Performs the work. Runs on a worker thread.
    fn process(self) -> Self::Output;
}

/// What a worker reports for one task.
#[derive(Debug)]
pub struct TaskOutcome<I, O> {
    /// Index of the worker that ran the task.
    pub worker: usize,
    pub id: I,
    /// The task output, or the panic message if processing panicked.
    pub result: Result<O, String>,
}
