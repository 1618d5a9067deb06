//! Bin registry adapter
//!
//! Bin CRUD goes to the remote store first; the shared registry only ever
//! holds what the remote confirmed.

use std::sync::Arc;

use tracing::{info, warn};

use binroute_domain::model::{Bin, BinFilter, BinPatch};
use binroute_domain::repository::CollectionGateway;
use binroute_store::{lock, SharedRegistry};
use binroute_types::{Error, Result};

/// Result of a bulk bin import
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ImportSummary {
    pub created: usize,
    /// Ids that already existed remotely
    pub skipped: Vec<String>,
}

pub struct BinAdmin {
    gateway: Arc<dyn CollectionGateway>,
    registry: SharedRegistry,
}

impl BinAdmin {
    pub fn new(gateway: Arc<dyn CollectionGateway>, registry: SharedRegistry) -> Self {
        Self { gateway, registry }
    }

    /// Replace the local snapshot with the remote bins
    pub fn refresh(&self) -> Result<usize> {
        let bins = self.gateway.fetch_bins(&BinFilter::default())?;
        let count = bins.len();
        lock(&self.registry)?.replace_all(bins)?;
        Ok(count)
    }

    /// Bins from the local snapshot, sorted by id
    pub fn list(&self, filter: &BinFilter) -> Result<Vec<Bin>> {
        let registry = lock(&self.registry)?;
        Ok(registry.query(filter).into_iter().cloned().collect())
    }

    pub fn get(&self, bin_id: &str) -> Result<Bin> {
        lock(&self.registry)?
            .get(bin_id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("bin {}", bin_id)))
    }

    pub fn create(&self, bin: &Bin) -> Result<Bin> {
        bin.validate()?;
        let mut registry = lock(&self.registry)?;
        if registry.contains(&bin.bin_id) {
            return Err(Error::conflict(format!("bin {} already exists", bin.bin_id)));
        }
        let created = self.gateway.create_bin(bin)?;
        registry.upsert(created.clone())?;
        info!(bin_id = %created.bin_id, "bin registered");
        Ok(created)
    }

    pub fn update(&self, bin_id: &str, patch: &BinPatch) -> Result<Bin> {
        if patch.is_empty() {
            return Err(Error::validation("nothing to update"));
        }
        let mut registry = lock(&self.registry)?;
        if let Some(current) = registry.get(bin_id) {
            patch.applied_to(current)?;
        }
        let updated = self.gateway.update_bin(bin_id, patch)?;
        registry.upsert(updated.clone())?;
        info!(bin_id, "bin updated");
        Ok(updated)
    }

    pub fn delete(&self, bin_id: &str) -> Result<()> {
        let mut registry = lock(&self.registry)?;
        self.gateway.delete_bin(bin_id)?;
        if registry.delete(bin_id).is_err() {
            warn!(bin_id, "deleted bin was not in local registry");
        }
        info!(bin_id, "bin removed");
        Ok(())
    }

    /// Mark a bin as needing collection (85% full, weight 85% of capacity)
    pub fn mark_needs_collection(&self, bin_id: &str) -> Result<Bin> {
        let patch = self.get(bin_id)?.needs_collection_patch();
        self.update(bin_id, &patch)
    }

    /// Register bins, skipping ids the remote already knows
    pub fn import(&self, bins: &[Bin]) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();
        for bin in bins {
            match self.create(bin) {
                Ok(_) => summary.created += 1,
                Err(Error::Conflict(_)) => summary.skipped.push(bin.bin_id.clone()),
                Err(e) => return Err(e),
            }
        }
        Ok(summary)
    }
}
