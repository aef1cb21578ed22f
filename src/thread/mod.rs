//! Native task handles and their lifecycle.
//!
//! A task is one OS thread running one bound closure. The handle that
//! launched it must be resolved exactly once, by [`TaskHandle::join`] or
//! [`TaskHandle::detach`].

use std::fmt;
use std::num::NonZeroU64;
use std::thread;

use portable_atomic::{AtomicU64, Ordering};

pub mod builder;
pub mod handle;
pub(crate) mod inner;
pub mod scope;

pub use builder::TaskBuilder;
pub use handle::TaskHandle;
pub use scope::{scope, Scope};

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for tasks.
///
/// Task IDs are never reused and are guaranteed to be non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(NonZeroU64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl TaskId {
    pub(crate) fn next() -> Self {
        // The counter only yields 0 after wrapping around.
        loop {
            if let Some(id) = NonZeroU64::new(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed)) {
                return Self(id);
            }
        }
    }

    /// Get the raw ID value.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

/// Lifecycle of a [`TaskHandle`].
///
/// `Running` and `Finished` are the joinable states. `Joined` and
/// `Detached` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TaskState {
    /// The handle owns no execution unit.
    Unstarted = 0,
    Running = 1,
    /// The work function returned but nobody has joined yet.
    Finished = 2,
    Joined = 3,
    Detached = 4,
}

impl TaskState {
    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            1 => TaskState::Running,
            2 => TaskState::Finished,
            3 => TaskState::Joined,
            4 => TaskState::Detached,
            _ => TaskState::Unstarted,
        }
    }

    /// Whether `join`/`detach` are valid in this state.
    pub fn is_joinable(self) -> bool {
        matches!(self, TaskState::Running | TaskState::Finished)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Joined | TaskState::Detached)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Unstarted => "unstarted",
            TaskState::Running => "running",
            TaskState::Finished => "finished",
            TaskState::Joined => "joined",
            TaskState::Detached => "detached",
        };
        f.write_str(s)
    }
}

/// Queries about the task the calling thread is running, if any.
pub mod this_task {
    use super::inner::CURRENT;
    use super::TaskId;

    /// ID of the task running on this thread, `None` outside a task.
    pub fn id() -> Option<TaskId> {
        CURRENT.with(|current| current.borrow().as_ref().map(|inner| inner.id))
    }

    /// Name of the task running on this thread, `None` outside a task.
    pub fn name() -> Option<String> {
        CURRENT.with(|current| current.borrow().as_ref().map(|inner| inner.name.clone()))
    }
}

/// Give up the rest of this thread's time slice.
#[inline]
pub fn yield_now() {
    thread::yield_now();
}

/// Number of execution units the platform can run in parallel.
///
/// Falls back to 1 when the platform cannot tell.
pub fn available_parallelism() -> usize {
    match thread::available_parallelism() {
        Ok(n) => n.get(),
        Err(err) => {
            tracing::warn!(error = %err, "available parallelism unknown, assuming 1");
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_ids_increase_and_are_non_zero() {
        let a = TaskId::next();
        let b = TaskId::next();
        assert!(a.get() > 0);
        assert!(b > a);
    }

    #[test]
    fn state_round_trips_through_u8() {
        for state in [
            TaskState::Unstarted,
            TaskState::Running,
            TaskState::Finished,
            TaskState::Joined,
            TaskState::Detached,
        ] {
            assert_eq!(TaskState::from_u8(state as u8), state);
        }
        assert_eq!(TaskState::from_u8(200), TaskState::Unstarted);
    }

    #[test]
    fn only_running_and_finished_are_joinable() {
        assert!(TaskState::Running.is_joinable());
        assert!(TaskState::Finished.is_joinable());
        assert!(!TaskState::Unstarted.is_joinable());
        assert!(!TaskState::Joined.is_joinable());
        assert!(!TaskState::Detached.is_joinable());
        assert!(TaskState::Detached.is_terminal());
    }

    #[test]
    fn this_task_is_empty_outside_tasks() {
        assert_eq!(this_task::id(), None);
        assert_eq!(this_task::name(), None);
    }

    #[test]
    fn parallelism_is_at_least_one() {
        assert!(available_parallelism() >= 1);
    }
}
