//! State shared between a task handle and the thread it launched.

use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use portable_atomic::{AtomicU8, Ordering};

use super::{TaskId, TaskState};
use crate::bind::Task;
use crate::errors::TaskFailure;

thread_local! {
    /// The task running on this thread, set for the lifetime of the task body.
    pub(crate) static CURRENT: RefCell<Option<Arc<TaskInner>>> = const { RefCell::new(None) };
}

pub(crate) struct TaskInner {
    pub(crate) id: TaskId,
    pub(crate) name: String,
    state: AtomicU8,
}

impl TaskInner {
    pub(crate) fn new(id: TaskId, name: String) -> Self {
        Self {
            id,
            name,
            state: AtomicU8::new(TaskState::Running as u8),
        }
    }

    pub(crate) fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Called by the handle once it has resolved the task.
    pub(crate) fn settle(&self, terminal: TaskState) -> TaskState {
        debug_assert!(terminal.is_terminal());
        TaskState::from_u8(self.state.swap(terminal as u8, Ordering::AcqRel))
    }

    /// Called by the task's own thread after the body returns. A handle that
    /// already detached keeps its state.
    fn finish(&self) {
        let _ = self.state.compare_exchange(
            TaskState::Running as u8,
            TaskState::Finished as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}

/// Clears [`CURRENT`] and marks the task finished, even if the body unwinds.
struct FinishGuard(Arc<TaskInner>);

impl Drop for FinishGuard {
    fn drop(&mut self) {
        CURRENT.with(|current| current.borrow_mut().take());
        self.0.finish();
    }
}

/// Body of every execution unit: run the task, turning a panic into a
/// [`TaskFailure`] that is handed to whoever joins.
pub(crate) fn run<T: Task>(inner: Arc<TaskInner>, task: T) -> Result<T::Output, TaskFailure> {
    CURRENT.with(|current| *current.borrow_mut() = Some(inner.clone()));
    let guard = FinishGuard(inner);

    let outcome = panic::catch_unwind(AssertUnwindSafe(move || task.run()));

    let inner = guard.0.clone();
    drop(guard);

    outcome.map_err(|payload| {
        let failure = TaskFailure::from_payload(payload, Some(inner.id), Some(inner.name.clone()));
        tracing::debug!(
            task_id = inner.id.get(),
            task_name = %inner.name,
            message = %failure.message,
            "task body panicked; failure held for join"
        );
        failure
    })
}
