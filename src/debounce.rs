use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{trace, warn};
use tokio::runtime::{Handle, TryCurrentError};
use tokio::task::JoinHandle;

/// Collapses bursts of calls into one delayed execution of `action`.
///
/// Each [`Debouncer::call`] aborts the pending timer (if any) and starts a new
/// one; `action` runs with the arguments of the last call once `wait` passes
/// without another call. Timers live on the Tokio runtime the debouncer was
/// created in. Dropping the debouncer leaves a pending call to run.
pub struct Debouncer<A> {
    wait: Duration,
    action: Arc<dyn Fn(A) + Send + Sync>,
    pending: Mutex<Option<JoinHandle<()>>>,
    runtime: Handle,
}

impl<A: Send + 'static> Debouncer<A> {
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime; use [`Debouncer::try_new`]
    /// to get an error instead.
    pub fn new<F>(wait: Duration, action: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Debouncer {
            wait,
            action: Arc::new(action),
            pending: Mutex::new(None),
            runtime: Handle::current(),
        }
    }

    pub fn try_new<F>(wait: Duration, action: F) -> Result<Self, TryCurrentError>
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Ok(Debouncer {
            wait,
            action: Arc::new(action),
            pending: Mutex::new(None),
            runtime: Handle::try_current()?,
        })
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    pub fn call(&self, args: A) {
        let action = Arc::clone(&self.action);
        let wait = self.wait;
        let mut pending = match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = pending.take() {
            previous.abort();
            trace!("Debounced call superseded");
        }
        *pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(wait).await;
            action(args);
        }));
    }

    /// Drops the pending invocation without running it.
    pub fn cancel(&self) {
        match self.pending.lock() {
            Ok(mut pending) => {
                if let Some(previous) = pending.take() {
                    previous.abort();
                }
            }
            Err(_) => warn!("Debouncer lock poisoned, nothing cancelled"),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .map(|pending| pending.as_ref().map_or(false, |task| !task.is_finished()))
            .unwrap_or(false)
    }
}

pub fn debounce<A, F>(action: F, wait_ms: u64) -> Debouncer<A>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    Debouncer::new(Duration::from_millis(wait_ms), action)
}

// test module
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl Fn(u32) + Send + Sync + 'static) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        (calls, move |value| sink.lock().unwrap().push(value))
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_runs_once_with_last_args() {
        let (calls, action) = recorder();
        let debounced = debounce(action, 100);

        for value in 1..=5 {
            debounced.call(value);
            tokio::time::sleep(Duration::from_millis(30)).await;
        }
        assert!(calls.lock().unwrap().is_empty());
        assert!(debounced.is_pending());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*calls.lock().unwrap(), vec![5]);
        assert!(!debounced.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_after_quiet_period_runs_again() {
        let (calls, action) = recorder();
        let debounced = debounce(action, 50);

        debounced.call(1);
        tokio::time::sleep(Duration::from_millis(60)).await;
        debounced.call(2);
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(*calls.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_pending_call() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let debounced = Debouncer::new(Duration::from_millis(20), move |_: ()| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        debounced.call(());
        debounced.cancel();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!debounced.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_debouncer_still_runs_pending_call() {
        let count = Arc::new(AtomicUsize::new(0));
        {
            let counter = Arc::clone(&count);
            let debounced = debounce(
                move |_: ()| {
                    counter.fetch_add(1, Ordering::SeqCst);
                },
                50,
            );
            debounced.call(());
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_try_new_outside_runtime_is_an_error() {
        assert!(Debouncer::try_new(Duration::from_millis(10), |_: ()| {}).is_err());
    }

    #[test]
    #[should_panic]
    fn test_new_outside_runtime_panics() {
        let _ = debounce(|_: ()| {}, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_action_does_not_reach_caller() {
        let debounced = debounce(|_: ()| panic!("boom"), 10);
        debounced.call(());
        tokio::time::sleep(Duration::from_millis(20)).await;

        let (calls, action) = recorder();
        let next = debounce(action, 10);
        next.call(7);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(*calls.lock().unwrap(), vec![7]);
    }
}
