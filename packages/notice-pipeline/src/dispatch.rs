//! Bounded-concurrency dispatcher.
//!
//! A token is taken from the admission pool *before* a task is spawned and is
//! returned when the task finishes (success, error or panic), so at most `k`
//! candidate tasks exist at any time.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

use crate::error::DispatchError;

pub struct Dispatcher<T> {
    permits: Arc<Semaphore>,
    tasks: JoinSet<T>,
}

impl<T: Send + 'static> Dispatcher<T> {
    /// A dispatcher admitting at most `max_concurrency` tasks (minimum 1).
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
            tasks: JoinSet::new(),
        }
    }

    /// Wait for a free token, then spawn `task` holding it.
    pub async fn submit<F>(&mut self, task: F) -> Result<(), DispatchError>
    where
        F: Future<Output = T> + Send + 'static,
    {
        let permit = self.permits.clone().acquire_owned().await?;
        self.tasks.spawn(async move {
            let output = task.await;
            drop(permit);
            output
        });
        Ok(())
    }

    /// Wait for every spawned task. Panicked tasks surface as `Err`.
    pub async fn join_all(mut self) -> Vec<Result<T, JoinError>> {
        let mut results = Vec::with_capacity(self.tasks.len());
        while let Some(result) = self.tasks.join_next().await {
            results.push(result);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_never_exceeds_limit() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = Dispatcher::new(3);

        for _ in 0..12 {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            dispatcher
                .submit(async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                })
                .await
                .unwrap();
        }

        let results = dispatcher.join_all().await;
        assert_eq!(results.len(), 12);
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_panicking_task_returns_its_token() {
        let mut dispatcher = Dispatcher::new(1);

        dispatcher
            .submit(async { panic!("boom") })
            .await
            .unwrap();
        // Would block forever if the panicked task kept its token
        dispatcher.submit(async { 7 }).await.unwrap();

        let results = dispatcher.join_all().await;
        assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
        assert!(results.iter().any(|r| matches!(r, Ok(7))));
    }
}
