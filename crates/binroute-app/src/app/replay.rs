//! Replays queued offline mutations against the remote store in FIFO order

use tracing::{info, warn};

use binroute_domain::model::{MutationKind, PendingMutation, Route};
use binroute_domain::repository::{CollectionGateway, MutationQueue};
use binroute_types::{Error, Result};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: usize,
    /// Rejected by the remote (validation, conflict, missing target) and discarded
    pub dropped: usize,
    /// Still queued because the remote became unreachable
    pub remaining: usize,
}

pub struct OfflineReplayer<'a> {
    queue: &'a dyn MutationQueue,
    gateway: &'a dyn CollectionGateway,
}

impl<'a> OfflineReplayer<'a> {
    pub fn new(queue: &'a dyn MutationQueue, gateway: &'a dyn CollectionGateway) -> Self {
        Self { queue, gateway }
    }

    pub fn replay(&self) -> Result<ReplaySummary> {
        self.replay_with_progress(|_, _| {})
    }

    /// Replay until the queue drains or the remote is unreachable again.
    ///
    /// `progress` is called after each entry with (done, total).
    pub fn replay_with_progress<F>(&self, mut progress: F) -> Result<ReplaySummary>
    where
        F: FnMut(usize, usize),
    {
        let pending = self.queue.pending()?;
        let total = pending.len();
        let mut summary = ReplaySummary::default();
        let mut processed = 0;

        for mutation in &pending {
            match apply(self.gateway, mutation) {
                Ok(_) => summary.applied += 1,
                Err(e) if e.is_retryable() => {
                    warn!(error = %e, "remote unavailable, replay paused");
                    break;
                }
                Err(e) => {
                    warn!(
                        kind = ?mutation.kind,
                        route_id = %mutation.route_id,
                        error = %e,
                        "queued mutation rejected, dropping"
                    );
                    summary.dropped += 1;
                }
            }
            processed += 1;
            progress(processed, total);
        }

        self.queue.acknowledge(processed)?;
        summary.remaining = total - processed;
        info!(
            applied = summary.applied,
            dropped = summary.dropped,
            remaining = summary.remaining,
            "offline replay finished"
        );
        Ok(summary)
    }
}

fn apply(gateway: &dyn CollectionGateway, mutation: &PendingMutation) -> Result<Route> {
    let route_id = mutation.route_id.as_str();
    match mutation.kind {
        MutationKind::StartRoute => {
            let checklist = mutation
                .checklist()
                .ok_or_else(|| Error::validation("queued start has no checklist"))?;
            gateway.start_route(route_id, &checklist)
        }
        MutationKind::CollectBin => {
            let weight = mutation
                .actual_weight()
                .ok_or_else(|| Error::validation("queued collection has no weight"))?;
            gateway.collect_bin(route_id, bin_id(mutation)?, weight)
        }
        MutationKind::SkipBin => {
            let reason = mutation
                .reason()
                .ok_or_else(|| Error::validation("queued skip has no reason"))?;
            gateway.skip_bin(route_id, bin_id(mutation)?, reason)
        }
        MutationKind::CompleteRoute => gateway.complete_route(route_id),
        MutationKind::CancelRoute => gateway.cancel_route(route_id),
    }
}

fn bin_id(mutation: &PendingMutation) -> Result<&str> {
    mutation
        .bin_id
        .as_deref()
        .ok_or_else(|| Error::validation("queued mutation has no bin"))
}
