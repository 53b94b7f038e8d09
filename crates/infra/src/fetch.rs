//! Bounded wait around boundary fetches.
//!
//! The fetch runs on its own named thread; the caller waits at most
//! `timeout` for the answer. On expiry the shared cancellation flag is
//! raised (repositories may poll it to abandon work) and the caller gets
//! [`FetchError::Timeout`]. A late answer is dropped, never merged.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

use crate::repository::RepositoryError;

/// Cooperative cancellation signal shared with the fetch thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetch '{name}' timed out after {timeout:?}")]
    Timeout { name: String, timeout: Duration },

    #[error("fetch '{name}' failed: {source}")]
    Repository {
        name: String,
        #[source]
        source: RepositoryError,
    },

    #[error("fetch '{name}' worker exited without an answer")]
    WorkerLost { name: String },

    #[error("failed to spawn fetch worker '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }
}

/// Run `fetch` with a deadline of `timeout`.
///
/// The worker thread is detached: after a timeout it keeps running until
/// `fetch` returns (or notices the cancellation flag), and its result is
/// discarded.
pub fn bounded_fetch<T, F>(name: &str, timeout: Duration, fetch: F) -> Result<T, FetchError>
where
    T: Send + 'static,
    F: FnOnce(&CancellationFlag) -> Result<T, RepositoryError> + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel::<Result<T, RepositoryError>>(1);
    let flag = CancellationFlag::new();
    let worker_flag = flag.clone();
    let started = Instant::now();

    thread::Builder::new()
        .name(format!("fetch-{name}"))
        .spawn(move || {
            let result = fetch(&worker_flag);
            // The receiver is gone after a timeout.
            let _ = tx.send(result);
        })
        .map_err(|source| FetchError::Spawn {
            name: name.to_string(),
            source,
        })?;

    match rx.recv_timeout(timeout) {
        Ok(Ok(value)) => {
            debug!(fetch = name, elapsed_ms = started.elapsed().as_millis() as u64, "fetch completed");
            Ok(value)
        }
        Ok(Err(source)) => Err(FetchError::Repository {
            name: name.to_string(),
            source,
        }),
        Err(mpsc::RecvTimeoutError::Timeout) => {
            flag.cancel();
            Err(FetchError::Timeout {
                name: name.to_string(),
                timeout,
            })
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(FetchError::WorkerLost {
            name: name.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_value_within_deadline() {
        let value = bounded_fetch("quick", Duration::from_secs(5), |_| Ok(42)).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn repository_error_is_passed_through() {
        let err = bounded_fetch::<(), _>("broken", Duration::from_secs(5), |_| {
            Err(RepositoryError::Unavailable("connection refused".into()))
        })
        .unwrap_err();
        assert!(matches!(
            err,
            FetchError::Repository {
                source: RepositoryError::Unavailable(_),
                ..
            }
        ));
    }

    #[test]
    fn slow_fetch_times_out_and_raises_cancellation() {
        let (seen_tx, seen_rx) = mpsc::channel::<bool>();
        let err = bounded_fetch::<u32, _>("stalled", Duration::from_millis(50), move |cancel| {
            let deadline = Instant::now() + Duration::from_secs(5);
            while !cancel.is_cancelled() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(5));
            }
            let _ = seen_tx.send(cancel.is_cancelled());
            Err(RepositoryError::Cancelled)
        })
        .unwrap_err();

        assert!(err.is_timeout());
        assert!(seen_rx.recv_timeout(Duration::from_secs(5)).unwrap());
    }

    #[test]
    fn panicking_worker_is_reported() {
        let err = bounded_fetch::<u32, _>("panics", Duration::from_secs(5), |_| panic!("boom")).unwrap_err();
        assert!(matches!(err, FetchError::WorkerLost { .. }));
    }
}
