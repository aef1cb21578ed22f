//! Stress tests for concurrency and high-load scenarios.

#[cfg(test)]
mod stress_tests {
    use std::sync::Arc;

    use portable_atomic::{AtomicU64, Ordering};

    use crate::bind::{by_ref, shared, Ref, Shared};
    use crate::tests::TEST_CONFIG;
    use crate::{scope, spawn, TaskBuilder, TaskGroup};

    #[test]
    fn test_massive_task_creation() {
        let task_count = TEST_CONFIG.lock().stress_task_count;
        let counter = Arc::new(AtomicU64::new(0));
        let mut group = TaskGroup::named("stress");

        for i in 0..task_count {
            group
                .fork(
                    |counter: Shared<AtomicU64>, i: usize| {
                        counter.fetch_add(1, Ordering::SeqCst);
                        i
                    },
                    (shared(&counter), i),
                )
                .expect("Failed to fork task");
        }

        for (expected, result) in group.join_all().into_iter().enumerate() {
            assert_eq!(result.expect("Task failed"), expected);
        }

        assert_eq!(counter.load(Ordering::SeqCst), task_count as u64);
    }

    #[test]
    fn test_borrowed_atomic_counts_every_increment() {
        let task_count = 8;
        let iterations = 1000;
        let hits = AtomicU64::new(0);

        scope(|s| {
            let mut group = TaskGroup::new();
            for _ in 0..task_count {
                group
                    .fork_in(
                        s,
                        |hits: Ref<'_, AtomicU64>, n: u64| {
                            for _ in 0..n {
                                hits.fetch_add(1, Ordering::Relaxed);
                            }
                        },
                        (by_ref(&hits), iterations),
                    )
                    .expect("Failed to fork task");
            }
            for result in group.join_all() {
                result.expect("Task failed");
            }
        });

        assert_eq!(hits.load(Ordering::SeqCst), task_count * iterations);
    }

    #[test]
    fn test_many_detached_tasks() {
        let task_count = TEST_CONFIG.lock().stress_task_count;
        let done = Arc::new(AtomicU64::new(0));

        for _ in 0..task_count {
            let done = done.clone();
            let mut handle = spawn(move || {
                done.fetch_add(1, Ordering::SeqCst);
            })
            .expect("Failed to launch task");
            handle.detach().expect("detach");
        }

        while done.load(Ordering::SeqCst) < task_count as u64 {
            crate::yield_now();
        }
    }

    #[test]
    fn test_failures_under_load_are_all_reported() {
        let task_count = TEST_CONFIG.lock().stress_task_count.min(32);
        let mut group = TaskGroup::new();

        for i in 0..task_count {
            group
                .fork_with(
                    TaskBuilder::new().name(format!("maybe-{i}")),
                    |i: usize| {
                        if i % 3 == 0 {
                            panic!("task {i} failed");
                        }
                        i
                    },
                    (i,),
                )
                .expect("Failed to fork task");
        }

        let results = group.join_all();
        assert_eq!(results.len(), task_count);
        for (i, result) in results.into_iter().enumerate() {
            match result {
                Ok(value) => {
                    assert_ne!(i % 3, 0);
                    assert_eq!(value, i);
                }
                Err(err) => {
                    assert_eq!(i % 3, 0);
                    let failure = err.failure().expect("task failure");
                    assert_eq!(failure.message, format!("task {i} failed"));
                    assert_eq!(failure.name, Some(format!("maybe-{i}")));
                }
            }
        }
    }
}
