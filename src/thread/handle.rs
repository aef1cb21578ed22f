//! The owning handle of one execution unit.

use std::fmt;
use std::process;
use std::sync::Arc;
use std::thread::{self, JoinHandle, ScopedJoinHandle, Thread};

use super::inner::TaskInner;
use super::{TaskId, TaskState};
use crate::config::LeakPolicy;
use crate::errors::{NotJoinableError, Operation, TaskError, TaskFailure, TaskResult};

/// Native thread behind a handle, either free-standing or tied to a scope.
pub(crate) enum Native<'scope, T> {
    Global(JoinHandle<T>),
    Scoped(ScopedJoinHandle<'scope, T>),
}

impl<'scope, T> Native<'scope, T> {
    fn join(self) -> thread::Result<T> {
        match self {
            Native::Global(handle) => handle.join(),
            Native::Scoped(handle) => handle.join(),
        }
    }

    fn thread(&self) -> &Thread {
        match self {
            Native::Global(handle) => handle.thread(),
            Native::Scoped(handle) => handle.thread(),
        }
    }
}

/// Owns one execution unit and the right to observe its outcome.
///
/// A handle returned from a launch is joinable. It leaves that state through
/// exactly one successful call to [`join`](Self::join) or
/// [`detach`](Self::detach); any later call fails with
/// [`TaskError::NotJoinable`]. Dropping a handle that is still joinable is a
/// usage error handled by its [`LeakPolicy`].
///
/// `'scope` is `'static` for tasks launched with [`start`](crate::start) and
/// the scope lifetime for tasks launched inside [`scope`](crate::scope).
pub struct TaskHandle<'scope, T> {
    inner: Option<Arc<TaskInner>>,
    native: Option<Native<'scope, Result<T, TaskFailure>>>,
    on_leak: LeakPolicy,
}

impl<'scope, T> TaskHandle<'scope, T> {
    pub(crate) fn new(
        inner: Arc<TaskInner>,
        native: Native<'scope, Result<T, TaskFailure>>,
        on_leak: LeakPolicy,
    ) -> Self {
        Self {
            inner: Some(inner),
            native: Some(native),
            on_leak,
        }
    }

    /// A handle that owns no execution unit. It is never joinable.
    pub fn unstarted() -> Self {
        Self {
            inner: None,
            native: None,
            on_leak: LeakPolicy::default(),
        }
    }

    pub fn state(&self) -> TaskState {
        self.inner
            .as_ref()
            .map_or(TaskState::Unstarted, |inner| inner.state())
    }

    /// Whether `join` or `detach` would succeed right now.
    pub fn is_joinable(&self) -> bool {
        self.state().is_joinable()
    }

    /// Whether the work function has returned and the handle is still
    /// waiting to be joined.
    pub fn is_finished(&self) -> bool {
        self.state() == TaskState::Finished
    }

    pub fn id(&self) -> Option<TaskId> {
        self.inner.as_ref().map(|inner| inner.id)
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.as_ref().map(|inner| inner.name.as_str())
    }

    /// The native thread, while the handle still owns it.
    pub fn thread(&self) -> Option<&Thread> {
        self.native.as_ref().map(Native::thread)
    }

    pub fn leak_policy(&self) -> LeakPolicy {
        self.on_leak
    }

    /// Block until the task completes and take its outcome.
    ///
    /// Returns the work function's value, or [`TaskError::Failed`] if it
    /// panicked. Fails with [`TaskError::NotJoinable`] on a handle that was
    /// already joined or detached, without blocking.
    pub fn join(&mut self) -> TaskResult<T> {
        let (inner, native) = self.take_native(Operation::Join)?;

        task_trace!(task_id = inner.id.get(), task_name = %inner.name, "joining task");

        let outcome = match native.join() {
            Ok(outcome) => outcome,
            // The body runs under catch_unwind, so this only happens if
            // dropping its output panicked.
            Err(payload) => Err(TaskFailure::from_payload(
                payload,
                Some(inner.id),
                Some(inner.name.clone()),
            )),
        };
        inner.settle(TaskState::Joined);

        task_trace!(task_id = inner.id.get(), ok = outcome.is_ok(), "task joined");

        outcome.map_err(TaskError::from)
    }

    /// Join only if the task has already finished.
    ///
    /// `Ok(None)` means the task is still running and the handle stays
    /// joinable.
    pub fn try_join(&mut self) -> TaskResult<Option<T>> {
        match self.state() {
            TaskState::Finished => self.join().map(Some),
            TaskState::Running => Ok(None),
            _ => Err(self.not_joinable(Operation::Join).into()),
        }
    }

    /// Give the execution unit to the runtime without waiting for it.
    ///
    /// The unit keeps running and is reclaimed when it returns; its outcome,
    /// including any failure, can no longer be observed.
    pub fn detach(&mut self) -> TaskResult<()> {
        let (inner, native) = self.take_native(Operation::Detach)?;
        inner.settle(TaskState::Detached);
        drop(native);

        task_trace!(task_id = inner.id.get(), task_name = %inner.name, "task detached");
        Ok(())
    }

    fn take_native(
        &mut self,
        operation: Operation,
    ) -> Result<(Arc<TaskInner>, Native<'scope, Result<T, TaskFailure>>), NotJoinableError> {
        if !self.is_joinable() {
            return Err(self.not_joinable(operation));
        }
        match (&self.inner, self.native.take()) {
            (Some(inner), Some(native)) => Ok((inner.clone(), native)),
            _ => Err(self.not_joinable(operation)),
        }
    }

    fn not_joinable(&self, operation: Operation) -> NotJoinableError {
        NotJoinableError {
            operation,
            state: self.state(),
            task: self.id(),
        }
    }
}

impl<'scope, T> Default for TaskHandle<'scope, T> {
    fn default() -> Self {
        Self::unstarted()
    }
}

impl<'scope, T> fmt::Debug for TaskHandle<'scope, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("state", &self.state())
            .finish()
    }
}

impl<'scope, T> Drop for TaskHandle<'scope, T> {
    fn drop(&mut self) {
        if !self.is_joinable() {
            return;
        }

        let (id, name) = match &self.inner {
            Some(inner) => (inner.id.get(), inner.name.clone()),
            None => return,
        };
        tracing::error!(
            task_id = id,
            task_name = %name,
            policy = %self.on_leak,
            "task handle dropped while still joinable"
        );

        match self.on_leak {
            LeakPolicy::Abort => process::abort(),
            LeakPolicy::Panic if thread::panicking() => process::abort(),
            LeakPolicy::Panic => {
                // Release the thread first so unwinding leaves nothing joinable.
                let _ = self.detach();
                panic!("task {name} dropped while still joinable; call join() or detach() first");
            }
            LeakPolicy::Detach => {
                let _ = self.detach();
            }
        }
    }
}
