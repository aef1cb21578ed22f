//! Fork-join batches of task handles.

use crate::bind::{bind, Invoke, Task};
use crate::errors::{LaunchError, TaskResult};
use crate::thread::builder::MAX_NAME_LEN;
use crate::thread::{Scope, TaskBuilder, TaskHandle};

/// An ordered batch of task handles.
///
/// Handles are kept in fork order and [`join_all`](Self::join_all) reports
/// results in that order, whatever order the tasks actually finish in.
/// Handles are never copied out; individual ones can be reached through
/// [`get_mut`](Self::get_mut) and resolved early.
///
/// Dropping a group drops its handles, so any that are still joinable are
/// reported through their [`LeakPolicy`](crate::LeakPolicy).
pub struct TaskGroup<'scope, T> {
    handles: Vec<TaskHandle<'scope, T>>,
    name: Option<String>,
}

impl<'scope, T> TaskGroup<'scope, T> {
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
            name: None,
        }
    }

    /// A group whose tasks are named `"{name}-{index}"`.
    ///
    /// If the result would be longer than [`MAX_NAME_LEN`] bytes, `name` is
    /// cut back on a character boundary so the index still fits.
    pub fn named<S: Into<String>>(name: S) -> Self {
        Self {
            handles: Vec::new(),
            name: Some(name.into()),
        }
    }

    /// Append an already launched handle and return its index.
    pub fn push(&mut self, handle: TaskHandle<'scope, T>) -> usize {
        self.handles.push(handle);
        self.handles.len() - 1
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TaskHandle<'scope, T>> {
        self.handles.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut TaskHandle<'scope, T>> {
        self.handles.get_mut(index)
    }

    /// How many handles could still be joined or detached.
    pub fn joinable_count(&self) -> usize {
        self.handles.iter().filter(|h| h.is_joinable()).count()
    }

    /// Join every handle in fork order.
    ///
    /// Never stops early: a failed task or a handle that was already
    /// resolved produces an `Err` in its slot and the rest are still joined.
    pub fn join_all(&mut self) -> Vec<TaskResult<T>> {
        let results: Vec<_> = self.handles.iter_mut().map(TaskHandle::join).collect();

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            tracing::debug!(
                group = self.name.as_deref().unwrap_or(""),
                total = results.len(),
                failed,
                "join_all finished with errors"
            );
        }
        results
    }

    /// Detach every handle that is still joinable and return how many were
    /// detached. For discarding a group whose outcomes are not needed.
    pub fn detach_all(&mut self) -> usize {
        let mut detached = 0;
        for handle in self.handles.iter_mut().filter(|h| h.is_joinable()) {
            if handle.detach().is_ok() {
                detached += 1;
            }
        }
        detached
    }

    fn builder(&self) -> TaskBuilder {
        match &self.name {
            Some(name) => TaskBuilder::new().name(indexed_name(name, self.handles.len())),
            None => TaskBuilder::new(),
        }
    }
}

fn indexed_name(name: &str, index: usize) -> String {
    let suffix = format!("-{index}");
    let mut keep = MAX_NAME_LEN.saturating_sub(suffix.len()).min(name.len());
    while !name.is_char_boundary(keep) {
        keep -= 1;
    }
    format!("{}{}", &name[..keep], suffix)
}

impl<T: Send + 'static> TaskGroup<'static, T> {
    /// Bind `f` to `args`, launch it, and append the handle.
    ///
    /// On a launch error nothing is appended.
    pub fn fork<F, A>(&mut self, f: F, args: A) -> Result<usize, LaunchError>
    where
        F: Invoke<A, Output = T> + 'static,
        A: Send + 'static,
    {
        self.fork_task(bind(f, args))
    }

    pub fn fork_task<K>(&mut self, task: K) -> Result<usize, LaunchError>
    where
        K: Task<Output = T> + 'static,
    {
        let handle = self.builder().launch(task)?;
        Ok(self.push(handle))
    }

    /// Like [`fork`](Self::fork) with an explicit builder. The group's
    /// naming is not applied.
    pub fn fork_with<F, A>(
        &mut self,
        builder: TaskBuilder,
        f: F,
        args: A,
    ) -> Result<usize, LaunchError>
    where
        F: Invoke<A, Output = T> + 'static,
        A: Send + 'static,
    {
        let handle = builder.start(f, args)?;
        Ok(self.push(handle))
    }
}

impl<'scope, T: Send + 'scope> TaskGroup<'scope, T> {
    /// Fork a task into `scope`; it may borrow from the enclosing frame.
    pub fn fork_in<'env, F, A>(
        &mut self,
        scope: Scope<'scope, 'env>,
        f: F,
        args: A,
    ) -> Result<usize, LaunchError>
    where
        F: Invoke<A, Output = T> + 'scope,
        A: Send + 'scope,
    {
        let handle = self.builder().launch_scoped(scope, bind(f, args))?;
        Ok(self.push(handle))
    }
}

impl<'scope, T> Default for TaskGroup<'scope, T> {
    fn default() -> Self {
        Self::new()
    }
}
