//! Error types for launching, joining, detaching and binding tasks.
//!
//! Launch and binding errors are reported immediately to the caller that
//! caused them. Failures raised inside a work function are held by the task
//! handle and delivered only through `join`.

use std::any::Any;
use std::fmt;
use std::io;

use crate::thread::{TaskId, TaskState};

/// Result type for task operations.
pub type TaskResult<T> = Result<T, TaskError>;

/// Error type for every task operation.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// The execution unit could not be created.
    #[error("task launch error: {0}")]
    Launch(#[from] LaunchError),
    /// `join` or `detach` on a handle that is not joinable.
    #[error("{0}")]
    NotJoinable(#[from] NotJoinableError),
    /// Callable and arguments do not agree.
    #[error("binding error: {0}")]
    Binding(#[from] BindingError),
    /// The work function panicked.
    #[error("{0}")]
    Failed(#[from] TaskFailure),
}

impl TaskError {
    /// Returns `true` for [`TaskError::NotJoinable`].
    pub fn is_not_joinable(&self) -> bool {
        matches!(self, TaskError::NotJoinable(_))
    }

    /// Returns `true` for [`TaskError::Failed`].
    pub fn is_failure(&self) -> bool {
        matches!(self, TaskError::Failed(_))
    }

    /// The captured task failure, if this is one.
    pub fn failure(&self) -> Option<&TaskFailure> {
        match self {
            TaskError::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Errors that can occur while creating an execution unit.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// The operating system refused to create the thread.
    #[error("failed to spawn thread: {0}")]
    Spawn(#[source] io::Error),
    /// Thread name is too long or contains a NUL byte
    #[error("invalid task name: {0:?}")]
    InvalidName(String),
    /// Requested stack size is outside the accepted range
    #[error("invalid stack size: {0} bytes")]
    InvalidStackSize(usize),
}

impl LaunchError {
    /// Whether the failure came from resource exhaustion in the OS.
    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(self, LaunchError::Spawn(_))
    }
}

/// Which lifecycle operation was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Join,
    Detach,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Join => f.write_str("join"),
            Operation::Detach => f.write_str("detach"),
        }
    }
}

/// `join` or `detach` called on a handle in a non-joinable state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "cannot {operation} task{}: handle is {state}",
    .task.map(|id| format!(" {id}")).unwrap_or_default()
)]
pub struct NotJoinableError {
    pub operation: Operation,
    pub state: TaskState,
    pub task: Option<TaskId>,
}

/// Mismatch between a callable's parameters and the supplied arguments.
///
/// Statically typed binding turns these into compile errors; the dynamic
/// binder reports them at bind time, before any execution unit exists.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("expected {expected} argument(s), found {found}")]
    Arity { expected: usize, found: usize },
    #[error("argument {index}: expected `{expected}`, found `{found}`")]
    Type {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },
}

/// A panic raised inside a work function, captured at the unit boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("task {} panicked: {message}", .name.as_deref().unwrap_or("<unnamed>"))]
pub struct TaskFailure {
    pub message: String,
    pub task: Option<TaskId>,
    pub name: Option<String>,
}

impl TaskFailure {
    pub(crate) fn from_payload(
        payload: Box<dyn Any + Send>,
        task: Option<TaskId>,
        name: Option<String>,
    ) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };

        Self { message, task, name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_message_from_str_and_string_payloads() {
        let f = TaskFailure::from_payload(Box::new("boom"), None, None);
        assert_eq!(f.message, "boom");

        let f = TaskFailure::from_payload(Box::new(String::from("bang")), None, Some("w".into()));
        assert_eq!(f.message, "bang");
        assert_eq!(f.to_string(), "task w panicked: bang");

        let f = TaskFailure::from_payload(Box::new(7u32), None, None);
        assert_eq!(f.message, "unknown panic payload");
    }

    #[test]
    fn not_joinable_display_names_operation_and_state() {
        let err = NotJoinableError {
            operation: Operation::Detach,
            state: TaskState::Joined,
            task: None,
        };
        assert_eq!(err.to_string(), "cannot detach task: handle is joined");
    }

    #[test]
    fn conversions_into_task_error() {
        let err: TaskError = BindingError::Arity { expected: 2, found: 1 }.into();
        assert!(matches!(err, TaskError::Binding(BindingError::Arity { expected: 2, found: 1 })));

        let err: TaskError = LaunchError::InvalidStackSize(1).into();
        assert!(!err.is_not_joinable());
        assert!(!err.is_failure());
    }
}
