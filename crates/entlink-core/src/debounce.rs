//! Debounced async calls.
//!
//! [`Debouncer`] holds a single "latest request" slot and a timer. Each call
//! re-arms the timer, replacing the arguments the wrapped function will
//! eventually receive. When the quiet period elapses the latest arguments run
//! once and every caller attached to that slot receives a clone of the same
//! result through a shared future.
//!
//! Once the timer fires the slot detaches: a call arriving while the wrapped
//! function is still running opens a fresh slot instead of aborting it. The
//! stale request runs to completion but its result is discarded and its
//! callers receive [`LinkerError::Cancelled`], so a slow older request can
//! never be observed after a newer one.

use crate::error::{LinkerError, Result};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::trace;

type DebouncedFn<A, T> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<T>> + Send + Sync>;
type SharedResult<T> = Shared<BoxFuture<'static, Result<T>>>;

struct Slot<T> {
    generation: u64,
    timer: Option<JoinHandle<()>>,
    pending: Option<(oneshot::Sender<Result<T>>, SharedResult<T>)>,
}

/// Collapses bursts of calls into a single invocation of the wrapped function.
pub struct Debouncer<A, T> {
    func: DebouncedFn<A, T>,
    wait: Duration,
    slot: Arc<Mutex<Slot<T>>>,
}

impl<A, T> Debouncer<A, T>
where
    A: Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Wrap `func` so it only runs after `wait` has passed without another call.
    pub fn new<F, Fut>(wait: Duration, func: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            func: Arc::new(move |args| func(args).boxed()),
            wait,
            slot: Arc::new(Mutex::new(Slot {
                generation: 0,
                timer: None,
                pending: None,
            })),
        }
    }

    /// Schedule `args` and wait for the result of the slot it joined.
    ///
    /// Resolves to [`LinkerError::Cancelled`] if the debouncer is dropped
    /// before the call runs, or if a newer call arrived while this one was
    /// in flight.
    pub async fn call(&self, args: A) -> Result<T> {
        self.arm(args).await
    }

    fn arm(&self, args: A) -> SharedResult<T> {
        let mut slot = self.slot.lock();

        slot.generation += 1;
        let generation = slot.generation;

        if let Some(timer) = slot.timer.take() {
            trace!("Debounce re-armed, dropping pending call");
            timer.abort();
        }

        let waiter = match &slot.pending {
            Some((_, shared)) => shared.clone(),
            None => {
                let (tx, rx) = oneshot::channel();
                let shared = rx
                    .map(|received| received.unwrap_or(Err(LinkerError::Cancelled)))
                    .boxed()
                    .shared();
                slot.pending = Some((tx, shared.clone()));
                shared
            }
        };

        let slot_ref = Arc::clone(&self.slot);
        let func = Arc::clone(&self.func);
        let wait = self.wait;

        slot.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(wait).await;

            let sender = {
                let mut slot = slot_ref.lock();
                // A newer call re-armed the timer after we woke up
                if slot.generation != generation {
                    return;
                }
                slot.timer = None;
                slot.pending.take().map(|(tx, _)| tx)
            };

            if let Some(sender) = sender {
                trace!("Debounce fired (generation {})", generation);
                let result = func(args).await;
                let superseded = slot_ref.lock().generation != generation;
                let result = if superseded {
                    trace!("Discarding superseded result (generation {})", generation);
                    Err(LinkerError::Cancelled)
                } else {
                    result
                };
                // Every waiter may have gone away
                let _ = sender.send(result);
            }
        }));

        waiter
    }
}

impl<A, T> Drop for Debouncer<A, T> {
    fn drop(&mut self) {
        let mut slot = self.slot.lock();
        if let Some(timer) = slot.timer.take() {
            timer.abort();
        }
        slot.pending = None;
    }
}
