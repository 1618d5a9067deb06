//! Daily reset of every bin to the "needs collection" state
//!
//! [`ResetScheduler::tick`] is the whole decision: compare today with the
//! last successful reset and, if a new day began, push one bulk update. The
//! [`ResetPoller`] just calls it on a background thread at a fixed interval.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{Local, NaiveDate};
use tracing::{debug, error, info, warn};

use binroute_domain::model::BinFilter;
use binroute_domain::repository::CollectionGateway;
use binroute_domain::service::{reset_updates, DailyReset, ResetDecision};
use binroute_infra::persistence::FileResetMarker;
use binroute_store::{lock, SharedRegistry};
use binroute_types::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Already reset today
    UpToDate,
    Reset { date: NaiveDate, bins: usize },
    /// Will be retried on the next tick
    Failed { date: NaiveDate, error: String },
}

pub struct ResetScheduler {
    state: DailyReset,
    gateway: Arc<dyn CollectionGateway>,
    registry: SharedRegistry,
    marker: Option<FileResetMarker>,
}

impl ResetScheduler {
    pub fn new(gateway: Arc<dyn CollectionGateway>, registry: SharedRegistry) -> Self {
        Self {
            state: DailyReset::new(None),
            gateway,
            registry,
            marker: None,
        }
    }

    /// Remember the last reset date across restarts
    pub fn with_marker(mut self, marker: FileResetMarker) -> Result<Self> {
        self.state = DailyReset::new(marker.load()?);
        self.marker = Some(marker);
        Ok(self)
    }

    pub fn last_reset(&self) -> Option<NaiveDate> {
        self.state.last_reset()
    }

    /// Tick against the local calendar date
    pub fn tick_now(&mut self) -> TickOutcome {
        self.tick(Local::now().date_naive())
    }

    pub fn tick(&mut self, today: NaiveDate) -> TickOutcome {
        let date = match self.state.check(today) {
            ResetDecision::UpToDate => return TickOutcome::UpToDate,
            ResetDecision::Due(date) => date,
        };
        if let Err(e) = self.state.begin() {
            debug!(error = %e, "reset already running");
            return TickOutcome::UpToDate;
        }

        let result = self.reset_all();
        self.state.finish(today, result.is_ok());

        match result {
            Ok(bins) => {
                if let Some(marker) = &self.marker {
                    if let Err(e) = marker.save(date) {
                        warn!(error = %e, "failed to persist reset date");
                    }
                }
                info!(%date, bins, "daily reset applied");
                TickOutcome::Reset { date, bins }
            }
            Err(e) => {
                error!(%date, error = %e, "daily reset failed, will retry");
                TickOutcome::Failed {
                    date,
                    error: e.to_string(),
                }
            }
        }
    }

    /// One bulk write for every known bin; the registry stays locked
    /// throughout so collections cannot interleave.
    fn reset_all(&self) -> Result<usize> {
        let mut registry = lock(&self.registry)?;
        let bins = self.gateway.fetch_bins(&BinFilter::default())?;
        let updates = reset_updates(&bins);
        let updated = self.gateway.bulk_update_bins(&updates)?;
        let count = updated.len();
        registry.replace_all(bins)?;
        for bin in updated {
            registry.upsert(bin)?;
        }
        Ok(count)
    }
}

/// Background thread calling [`ResetScheduler::tick_now`]
///
/// Ticks once immediately, then every `interval`. Stops when dropped.
pub struct ResetPoller {
    stop_tx: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<ResetScheduler>>,
}

impl ResetPoller {
    pub fn spawn(mut scheduler: ResetScheduler, interval: Duration) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::spawn(move || {
            loop {
                scheduler.tick_now();
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            debug!("reset poller stopped");
            scheduler
        });
        Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    /// Stop polling and hand the scheduler back
    pub fn stop(mut self) -> Option<ResetScheduler> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Option<ResetScheduler> {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(scheduler) => Some(scheduler),
            Err(_) => {
                error!("reset poller thread panicked");
                None
            }
        }
    }
}

impl Drop for ResetPoller {
    fn drop(&mut self) {
        self.shutdown();
    }
}
