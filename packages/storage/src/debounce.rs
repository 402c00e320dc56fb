//! Debounced-task abstraction: coalesce rapid writes, persist the latest
//! value after a quiet period.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Holds the most recent submitted value and a timer; when the quiet
/// window elapses without another submission, the flush callback runs
/// with that value. Dropping the debouncer cancels any pending flush.
pub struct Debouncer<T: Send + 'static> {
    window: Duration,
    pending: Arc<Mutex<Option<T>>>,
    timer: Mutex<Option<JoinHandle<()>>>,
    flush: Arc<dyn Fn(T) + Send + Sync>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Creates a debouncer that calls `flush` with the latest value once
    /// `window` passes without a new submission.
    pub fn new(window: Duration, flush: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            window,
            pending: Arc::new(Mutex::new(None)),
            timer: Mutex::new(None),
            flush: Arc::new(flush),
        }
    }

    /// Records `value` as the latest candidate and restarts the timer.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if an internal mutex is poisoned.
    pub fn submit(&self, value: T) {
        *self.pending.lock().expect("debouncer mutex poisoned") = Some(value);

        let mut timer = self.timer.lock().expect("debouncer mutex poisoned");
        if let Some(handle) = timer.take() {
            handle.abort();
        }

        let pending = Arc::clone(&self.pending);
        let flush = Arc::clone(&self.flush);
        let window = self.window;
        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let value = pending.lock().expect("debouncer mutex poisoned").take();
            if let Some(value) = value {
                flush(value);
            }
        }));
    }

    /// Flushes any pending value immediately, bypassing the timer.
    ///
    /// # Panics
    ///
    /// Panics if an internal mutex is poisoned.
    pub fn flush_now(&self) {
        if let Some(handle) = self
            .timer
            .lock()
            .expect("debouncer mutex poisoned")
            .take()
        {
            handle.abort();
        }
        let value = self.pending.lock().expect("debouncer mutex poisoned").take();
        if let Some(value) = value {
            (self.flush)(value);
        }
    }

    /// Discards any pending value without flushing.
    ///
    /// # Panics
    ///
    /// Panics if an internal mutex is poisoned.
    pub fn cancel(&self) {
        if let Some(handle) = self
            .timer
            .lock()
            .expect("debouncer mutex poisoned")
            .take()
        {
            handle.abort();
        }
        self.pending
            .lock()
            .expect("debouncer mutex poisoned")
            .take();
    }
}

impl<T: Send + 'static> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self
            .timer
            .lock()
            .expect("debouncer mutex poisoned")
            .take()
        {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn rapid_submits_collapse_to_trailing_value() {
        let flushed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&flushed);
        let debouncer = Debouncer::new(Duration::from_millis(20), move |v: u32| {
            sink.lock().unwrap().push(v);
        });

        debouncer.submit(1);
        debouncer.submit(2);
        debouncer.submit(3);
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(*flushed.lock().unwrap(), vec![3]);
    }

    #[tokio::test]
    async fn flush_now_skips_the_wait() {
        let count = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&count);
        let debouncer = Debouncer::new(Duration::from_secs(60), move |(): ()| {
            sink.fetch_add(1, Ordering::SeqCst);
        });

        debouncer.submit(());
        debouncer.flush_now();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // Nothing left to flush.
        debouncer.flush_now();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancel_discards_pending_value() {
        let count = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&count);
        let debouncer = Debouncer::new(Duration::from_millis(10), move |(): ()| {
            sink.fetch_add(1, Ordering::SeqCst);
        });

        debouncer.submit(());
        debouncer.cancel();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
