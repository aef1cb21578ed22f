#![deny(unsafe_code)]
#![forbid(unreachable_pub)]

//! Native thread handles with a strict join/detach lifecycle.
//!
//! Every task runs on its own OS thread and is owned by a [`TaskHandle`].
//! The handle must be resolved exactly once: [`TaskHandle::join`] blocks and
//! returns the task's value (or the panic it raised, as a [`TaskFailure`]),
//! [`TaskHandle::detach`] lets the task run on unobserved. Resolving twice is
//! a [`TaskError::NotJoinable`]; dropping an unresolved handle is reported
//! through its [`LeakPolicy`].
//!
//! Arguments reach the task through the [`bind`] module, which moves or
//! copies by default and only shares caller storage when asked to.
//! [`TaskGroup`] launches batches and joins them in fork order.
//!
//! # Quick Start
//!
//! ```
//! use bound_threads::{start, TaskGroup};
//!
//! fn checksum(data: Vec<u8>, seed: u32) -> u32 {
//!     data.iter().fold(seed, |acc, &b| acc.wrapping_mul(31).wrapping_add(u32::from(b)))
//! }
//!
//! let mut handle = start(checksum, (vec![1, 2, 3], 7)).expect("launch");
//! let sum = handle.join().expect("task ok");
//! assert!(!handle.is_joinable());
//!
//! let mut group = TaskGroup::new();
//! for seed in 0..4u32 {
//!     group.fork(checksum, (vec![1, 2, 3], seed)).expect("fork");
//! }
//! let sums: Vec<u32> = group.join_all().into_iter().map(Result::unwrap).collect();
//! assert_eq!(sums.len(), 4);
//! # let _ = sum;
//! ```
//!
//! # Features
//!
//! - `task-trace`: emit a `tracing` trace event for every launch, join and
//!   detach

/// Trace-level lifecycle events, compiled in only with `task-trace`.
macro_rules! task_trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "task-trace")]
        tracing::trace!($($arg)*);
    };
}

pub mod bind;
pub mod config;
pub mod errors;
pub mod group;
pub mod sink;
pub mod thread;

#[cfg(test)]
mod tests;

// ============================================================================
// Public API
// ============================================================================

// Tasks
pub use thread::{
    available_parallelism, scope, this_task, yield_now, Scope, TaskBuilder, TaskHandle, TaskId,
    TaskState,
};

// Binding
pub use bind::{bind, bind_member, bind_member_ref, Task};

// Fork-join
pub use group::TaskGroup;

// Configuration
pub use config::{Config, LeakPolicy};

// Errors
pub use errors::{
    BindingError, LaunchError, NotJoinableError, Operation, TaskError, TaskFailure, TaskResult,
};

// ============================================================================
// Convenience Functions
// ============================================================================

/// Bind `f` to the argument tuple `args` and launch it with default
/// configuration.
pub fn start<F, A>(f: F, args: A) -> Result<TaskHandle<'static, F::Output>, LaunchError>
where
    F: bind::Invoke<A> + 'static,
    F::Output: 'static,
    A: Send + 'static,
{
    TaskBuilder::new().start(f, args)
}

/// Launch a zero-argument closure with default configuration.
pub fn spawn<F, R>(f: F) -> Result<TaskHandle<'static, R>, LaunchError>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    TaskBuilder::new().spawn(f)
}

/// Launch an already bound task with default configuration.
pub fn launch<T>(task: T) -> Result<TaskHandle<'static, T::Output>, LaunchError>
where
    T: Task + 'static,
    T::Output: 'static,
{
    TaskBuilder::new().launch(task)
}
