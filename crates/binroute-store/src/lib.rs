//! Owned snapshots of the remote store's bins and routes
//!
//! `BinRegistry` is the only shared mutable resource in the coordinator. It
//! is handed around as a [`SharedRegistry`] so every bin write (collection
//! side effects, daily reset, admin edits) goes through one lock.

pub mod routes;

pub use routes::RouteBook;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use binroute_domain::model::{Bin, BinFilter, BinPatch, BinUpdate};
use binroute_types::{Error, Result, TransportError};
use tracing::debug;

/// Handle to the registry shared between the lifecycle manager and the reset poller
pub type SharedRegistry = Arc<Mutex<BinRegistry>>;

pub fn shared(registry: BinRegistry) -> SharedRegistry {
    Arc::new(Mutex::new(registry))
}

/// Lock the shared registry, turning a poisoned lock into a storage error
pub fn lock(registry: &SharedRegistry) -> Result<MutexGuard<'_, BinRegistry>> {
    registry
        .lock()
        .map_err(|_| TransportError::Storage("bin registry lock poisoned".to_string()).into())
}

/// In-memory collection of bins keyed by `bin_id`
#[derive(Debug, Default, Clone)]
pub struct BinRegistry {
    bins: BTreeMap<String, Bin>,
}

impl BinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bins(bins: Vec<Bin>) -> Result<Self> {
        let mut registry = Self::new();
        registry.replace_all(bins)?;
        Ok(registry)
    }

    /// Replace the whole snapshot with a fresh fetch
    pub fn replace_all(&mut self, bins: Vec<Bin>) -> Result<()> {
        let mut next = BTreeMap::new();
        for bin in bins {
            bin.validate()?;
            next.insert(bin.bin_id.clone(), bin);
        }
        debug!(count = next.len(), "bin registry refreshed");
        self.bins = next;
        Ok(())
    }

    pub fn create(&mut self, bin: Bin) -> Result<&Bin> {
        bin.validate()?;
        if self.bins.contains_key(&bin.bin_id) {
            return Err(Error::conflict(format!("bin {} already exists", bin.bin_id)));
        }
        let id = bin.bin_id.clone();
        Ok(self.bins.entry(id).or_insert(bin))
    }

    /// Insert or overwrite with a record the remote store returned
    pub fn upsert(&mut self, bin: Bin) -> Result<()> {
        bin.validate()?;
        self.bins.insert(bin.bin_id.clone(), bin);
        Ok(())
    }

    pub fn update(&mut self, bin_id: &str, patch: &BinPatch) -> Result<&Bin> {
        let current = self
            .bins
            .get(bin_id)
            .ok_or_else(|| Error::not_found(format!("bin {}", bin_id)))?;
        let next = patch.applied_to(current)?;
        self.bins.insert(bin_id.to_string(), next);
        self.get(bin_id)
            .ok_or_else(|| Error::not_found(format!("bin {}", bin_id)))
    }

    /// Apply a bulk update; validated up front so a bad entry changes nothing
    pub fn apply_updates(&mut self, updates: &[BinUpdate]) -> Result<()> {
        let mut staged = Vec::with_capacity(updates.len());
        for update in updates {
            let current = self
                .bins
                .get(&update.bin_id)
                .ok_or_else(|| Error::not_found(format!("bin {}", update.bin_id)))?;
            staged.push(update.patch.applied_to(current)?);
        }
        for bin in staged {
            self.bins.insert(bin.bin_id.clone(), bin);
        }
        Ok(())
    }

    pub fn delete(&mut self, bin_id: &str) -> Result<Bin> {
        self.bins
            .remove(bin_id)
            .ok_or_else(|| Error::not_found(format!("bin {}", bin_id)))
    }

    pub fn get(&self, bin_id: &str) -> Option<&Bin> {
        self.bins.get(bin_id)
    }

    pub fn contains(&self, bin_id: &str) -> bool {
        self.bins.contains_key(bin_id)
    }

    pub fn query(&self, filter: &BinFilter) -> Vec<&Bin> {
        self.bins.values().filter(|b| filter.matches(b)).collect()
    }

    /// Cloned snapshot for the statistics engine
    pub fn snapshot(&self) -> Vec<Bin> {
        self.bins.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}
