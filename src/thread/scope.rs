//! Tasks that borrow from the launching stack frame.
//!
//! Reference captures ([`by_ref`](crate::bind::by_ref),
//! [`by_mut`](crate::bind::by_mut)) only compile here: the scope cannot
//! return before every task launched in it has finished, so borrowed storage
//! always outlives the execution units that use it.

use std::thread;

use super::builder::TaskBuilder;
use super::handle::TaskHandle;
use crate::bind::{bind, Invoke, Task};
use crate::errors::LaunchError;

/// A launch scope handed to the closure passed to [`scope`].
#[derive(Clone, Copy)]
pub struct Scope<'scope, 'env: 'scope> {
    raw: &'scope thread::Scope<'scope, 'env>,
}

impl<'scope, 'env> Scope<'scope, 'env> {
    pub(crate) fn raw(self) -> &'scope thread::Scope<'scope, 'env> {
        self.raw
    }

    /// Bind `f` to `args` and launch it in this scope.
    pub fn start<F, A>(self, f: F, args: A) -> Result<TaskHandle<'scope, F::Output>, LaunchError>
    where
        F: Invoke<A> + 'scope,
        F::Output: 'scope,
        A: Send + 'scope,
    {
        self.launch(bind(f, args))
    }

    /// Launch a zero-argument closure in this scope.
    pub fn spawn<F, R>(self, f: F) -> Result<TaskHandle<'scope, R>, LaunchError>
    where
        F: FnOnce() -> R + Send + 'scope,
        R: Send + 'scope,
    {
        self.launch(bind(f, ()))
    }

    /// Launch an already bound task in this scope.
    pub fn launch<T>(self, task: T) -> Result<TaskHandle<'scope, T::Output>, LaunchError>
    where
        T: Task + 'scope,
        T::Output: 'scope,
    {
        TaskBuilder::new().launch_scoped(self, task)
    }
}

/// Run `f` with a [`Scope`] for launching borrowing tasks.
///
/// Units that were detached, or whose handles were released by
/// [`LeakPolicy::Detach`](crate::LeakPolicy::Detach), are waited for before
/// `scope` returns.
///
/// ```
/// use bound_threads::{bind::by_mut, scope};
///
/// let mut total = 0u64;
/// scope(|s| {
///     let mut h = s
///         .start(|mut t: bound_threads::bind::Mut<'_, u64>| *t += 5, (by_mut(&mut total),))
///         .unwrap();
///     h.join().unwrap();
/// });
/// assert_eq!(total, 5);
/// ```
pub fn scope<'env, F, R>(f: F) -> R
where
    F: for<'scope> FnOnce(Scope<'scope, 'env>) -> R,
{
    thread::scope(|raw| f(Scope { raw }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::{by_mut, by_ref, Mut, Ref};
    use crate::thread::TaskState;

    #[test]
    fn scoped_task_reads_borrowed_data() {
        let words = vec!["a", "bb", "ccc"];
        let total = scope(|s| {
            let mut h = s
                .start(
                    |w: Ref<'_, Vec<&str>>| w.iter().map(|s| s.len()).sum::<usize>(),
                    (by_ref(&words),),
                )
                .expect("launch");
            h.join().expect("join")
        });
        assert_eq!(total, 6);
        assert_eq!(words.len(), 3);
    }

    #[test]
    fn scoped_mutation_is_visible_after_join() {
        let mut hits = Vec::new();
        scope(|s| {
            let mut h = s
                .start(|mut v: Mut<'_, Vec<u32>>, n: u32| v.push(n), (by_mut(&mut hits), 9))
                .expect("launch");
            h.join().expect("join");
            assert_eq!(h.state(), TaskState::Joined);
        });
        assert_eq!(hits, vec![9]);
    }

    #[test]
    fn detached_scoped_task_finishes_before_scope_returns() {
        let mut flag = false;
        scope(|s| {
            let mut h = s
                .start(|mut f: Mut<'_, bool>| *f = true, (by_mut(&mut flag),))
                .expect("launch");
            h.detach().expect("detach");
        });
        assert!(flag);
    }
}
