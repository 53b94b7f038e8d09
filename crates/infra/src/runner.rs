//! Background restock runner.
//!
//! Scores the current inventory on a fixed schedule (and on demand) and hands
//! the resulting order lines to a [`RestockOrderSink`]; the purchase-order
//! generator lives downstream. The worker blocks on its command channel until
//! the next run is due, so an idle runner costs nothing.
//!
//! A failed run (repository error or fetch timeout) is retried per
//! [`RetryPolicy`] and never reaches the sink: fallback results are not
//! orders.

use std::io;
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use bistro_analytics::restock::RestockOrderLine;

use crate::repository::AnalyticsRepository;
use crate::service::AnalyticsService;

/// Receiver of restock order lines.
pub trait RestockOrderSink: Send + Sync + 'static {
    fn submit(&self, lines: Vec<RestockOrderLine>);
}

/// In-memory sink for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryRestockOrderSink {
    batches: Mutex<Vec<Vec<RestockOrderLine>>>,
}

impl InMemoryRestockOrderSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every submitted batch, oldest first.
    pub fn batches(&self) -> Vec<Vec<RestockOrderLine>> {
        self.batches.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl RestockOrderSink for InMemoryRestockOrderSink {
    fn submit(&self, lines: Vec<RestockOrderLine>) {
        self.batches.lock().unwrap_or_else(PoisonError::into_inner).push(lines);
    }
}

/// How failed runs are retried before waiting for the next scheduled run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based), doubling each time up to
    /// `max_delay`. `None` once the retries are used up.
    pub fn delay(&self, retry: u32) -> Option<Duration> {
        if retry == 0 || retry > self.max_retries {
            return None;
        }
        let factor = 2u32.checked_pow(retry - 1).unwrap_or(u32::MAX);
        Some(self.initial_delay.saturating_mul(factor).min(self.max_delay))
    }
}

/// Restock runner settings.
#[derive(Debug, Clone)]
pub struct RestockRunner {
    pub interval: Duration,
    pub retry: RetryPolicy,
    /// Reference-time source; the wall clock outside tests.
    pub clock: fn() -> DateTime<Utc>,
}

impl Default for RestockRunner {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15 * 60),
            retry: RetryPolicy::default(),
            clock: Utc::now,
        }
    }
}

enum Command {
    Run,
    Shutdown,
}

/// Handle to a spawned runner. Dropping it stops the worker after its
/// current run; [`RestockRunnerHandle::shutdown`] also waits for it.
#[derive(Debug)]
pub struct RestockRunnerHandle {
    commands: mpsc::Sender<Command>,
    join: Option<thread::JoinHandle<()>>,
}

impl RestockRunnerHandle {
    /// Request a run now, e.g. after a stock movement. Requests that pile up
    /// while a run is in progress collapse into a single run.
    pub fn trigger(&self) {
        let _ = self.commands.send(Command::Run);
    }

    pub fn shutdown(mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl RestockRunner {
    /// Spawn the worker thread. The first run starts immediately.
    pub fn spawn<R, S>(
        &self,
        name: &'static str,
        service: Arc<AnalyticsService<R>>,
        sink: Arc<S>,
    ) -> io::Result<RestockRunnerHandle>
    where
        R: AnalyticsRepository + 'static,
        S: RestockOrderSink,
    {
        let (commands, inbox) = mpsc::channel();
        let worker = Worker {
            name,
            settings: self.clone(),
            inbox,
            service,
            sink,
        };
        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker.run())?;

        Ok(RestockRunnerHandle {
            commands,
            join: Some(join),
        })
    }
}

struct Worker<R, S> {
    name: &'static str,
    settings: RestockRunner,
    inbox: mpsc::Receiver<Command>,
    service: Arc<AnalyticsService<R>>,
    sink: Arc<S>,
}

impl<R, S> Worker<R, S>
where
    R: AnalyticsRepository + 'static,
    S: RestockOrderSink,
{
    fn run(self) {
        info!(runner = self.name, interval = ?self.settings.interval, "restock runner started");

        let mut next_scheduled = Instant::now() + self.settings.interval;
        let mut due = Instant::now();
        let mut failures = 0u32;

        loop {
            let wait = due.saturating_duration_since(Instant::now());
            match self.inbox.recv_timeout(wait) {
                Ok(Command::Run) => {
                    if !self.drain_pending_runs() {
                        break;
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Ok(Command::Shutdown) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }

            let now = Instant::now();
            while next_scheduled <= now {
                next_scheduled += self.settings.interval;
            }

            if self.run_once() {
                failures = 0;
                due = next_scheduled;
                continue;
            }

            failures += 1;
            match self.settings.retry.delay(failures) {
                Some(delay) => due = Instant::now() + delay,
                None => {
                    warn!(runner = self.name, failures, "retries exhausted; waiting for next scheduled run");
                    failures = 0;
                    due = next_scheduled;
                }
            }
        }

        info!(runner = self.name, "restock runner stopped");
    }

    /// Swallow queued run requests. `false` once a shutdown is seen.
    fn drain_pending_runs(&self) -> bool {
        loop {
            match self.inbox.try_recv() {
                Ok(Command::Run) => {}
                Err(mpsc::TryRecvError::Empty) => return true,
                Ok(Command::Shutdown) | Err(mpsc::TryRecvError::Disconnected) => return false,
            }
        }
    }

    /// Score and submit. `false` if the inventory could not be fetched.
    fn run_once(&self) -> bool {
        match self.service.try_restock_recommendations((self.settings.clock)()) {
            Ok(recommendations) => {
                let lines: Vec<RestockOrderLine> = recommendations.iter().map(|r| r.order_line()).collect();
                if lines.is_empty() {
                    debug!(runner = self.name, "nothing to restock");
                } else {
                    info!(runner = self.name, lines = lines.len(), "submitting restock order lines");
                    self.sink.submit(lines);
                }
                true
            }
            Err(e) => {
                warn!(runner = self.name, error = %e, timeout = e.is_timeout(), "restock scoring failed");
                false
            }
        }
    }
}
