//! Task builder for configuring a launch.

use std::sync::Arc;
use std::thread;

use super::handle::{Native, TaskHandle};
use super::inner::{self, TaskInner};
use super::scope::Scope;
use super::TaskId;
use crate::bind::{bind, Invoke, Task};
use crate::config::{self, LeakPolicy};
use crate::errors::LaunchError;

/// Longest accepted task name, in bytes.
pub const MAX_NAME_LEN: usize = 64;
/// Smallest accepted stack size.
pub const MIN_STACK_SIZE: usize = 16 * 1024;
/// Largest accepted stack size.
pub const MAX_STACK_SIZE: usize = 1024 * 1024 * 1024;

/// Builder for configuring and launching tasks.
///
/// Fields left unset fall back to the process-wide [`config`](crate::config).
#[derive(Debug, Clone, Default)]
pub struct TaskBuilder {
    name: Option<String>,
    stack_size: Option<usize>,
    on_leak: Option<LeakPolicy>,
}

impl TaskBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the task name. It is also the native thread's name.
    pub fn name<T: Into<String>>(mut self, name: T) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the stack size in bytes.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    /// Set what happens if the handle is dropped while still joinable.
    pub fn on_leak(mut self, policy: LeakPolicy) -> Self {
        self.on_leak = Some(policy);
        self
    }

    /// Bind `f` to `args` and launch it.
    pub fn start<F, A>(self, f: F, args: A) -> Result<TaskHandle<'static, F::Output>, LaunchError>
    where
        F: Invoke<A> + 'static,
        F::Output: 'static,
        A: Send + 'static,
    {
        self.launch(bind(f, args))
    }

    /// Launch a zero-argument closure.
    pub fn spawn<F, R>(self, f: F) -> Result<TaskHandle<'static, R>, LaunchError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.launch(bind(f, ()))
    }

    /// Launch an already bound task.
    pub fn launch<T>(self, task: T) -> Result<TaskHandle<'static, T::Output>, LaunchError>
    where
        T: Task + 'static,
        T::Output: 'static,
    {
        let (native, inner, on_leak) = self.prepare()?;
        let shared = inner.clone();
        let handle = native
            .spawn(move || inner::run(shared, task))
            .map_err(LaunchError::Spawn)?;

        task_trace!(task_id = inner.id.get(), task_name = %inner.name, "task launched");
        Ok(TaskHandle::new(inner, Native::Global(handle), on_leak))
    }

    /// Launch a task inside `scope`. The task may borrow anything that
    /// outlives the scope.
    pub fn launch_scoped<'scope, 'env, T>(
        self,
        scope: Scope<'scope, 'env>,
        task: T,
    ) -> Result<TaskHandle<'scope, T::Output>, LaunchError>
    where
        T: Task + 'scope,
        T::Output: 'scope,
    {
        let (native, inner, on_leak) = self.prepare()?;
        let shared = inner.clone();
        let handle = native
            .spawn_scoped(scope.raw(), move || inner::run(shared, task))
            .map_err(LaunchError::Spawn)?;

        task_trace!(task_id = inner.id.get(), task_name = %inner.name, "scoped task launched");
        Ok(TaskHandle::new(inner, Native::Scoped(handle), on_leak))
    }

    /// Validate the configuration and reserve an ID. Nothing is spawned
    /// unless this succeeds.
    fn prepare(self) -> Result<(thread::Builder, Arc<TaskInner>, LeakPolicy), LaunchError> {
        let defaults = config::global();

        if let Some(name) = &self.name {
            if name.len() > MAX_NAME_LEN || name.contains('\0') {
                return Err(LaunchError::InvalidName(name.clone()));
            }
        }

        let stack_size = self.stack_size.or(defaults.stack_size);
        if let Some(size) = stack_size {
            if !(MIN_STACK_SIZE..=MAX_STACK_SIZE).contains(&size) {
                return Err(LaunchError::InvalidStackSize(size));
            }
        }

        let id = TaskId::next();
        let name = self
            .name
            .unwrap_or_else(|| format!("{}-{}", defaults.name_prefix, id.get()));

        let mut native = thread::Builder::new().name(name.clone());
        if let Some(size) = stack_size {
            native = native.stack_size(size);
        }

        let on_leak = self.on_leak.unwrap_or(defaults.on_leak);
        Ok((native, Arc::new(TaskInner::new(id, name)), on_leak))
    }
}
