//! Day-boundary reset state machine
//!
//! Armed with the date of the last successful reset. A check on a new date
//! moves to resetting; success re-arms with the new date, failure re-arms
//! with the old one so the next check tries again.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use binroute_types::{Error, Result};

use crate::model::{Bin, BinUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "state", content = "lastReset")]
pub enum ResetPhase {
    Armed(Option<NaiveDate>),
    Resetting,
}

/// What a check decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetDecision {
    /// Already reset today
    UpToDate,
    /// A reset for this date should run now
    Due(NaiveDate),
}

#[derive(Debug, Clone)]
pub struct DailyReset {
    last_reset: Option<NaiveDate>,
    resetting: bool,
}

impl DailyReset {
    pub fn new(last_reset: Option<NaiveDate>) -> Self {
        Self {
            last_reset,
            resetting: false,
        }
    }

    pub fn last_reset(&self) -> Option<NaiveDate> {
        self.last_reset
    }

    pub fn phase(&self) -> ResetPhase {
        if self.resetting {
            ResetPhase::Resetting
        } else {
            ResetPhase::Armed(self.last_reset)
        }
    }

    pub fn check(&self, today: NaiveDate) -> ResetDecision {
        if self.last_reset == Some(today) {
            ResetDecision::UpToDate
        } else {
            ResetDecision::Due(today)
        }
    }

    /// Enter the resetting state
    pub fn begin(&mut self) -> Result<()> {
        if self.resetting {
            return Err(Error::conflict("reset already running"));
        }
        self.resetting = true;
        Ok(())
    }

    /// Re-arm; the date only advances when the bulk update succeeded
    pub fn finish(&mut self, today: NaiveDate, succeeded: bool) {
        self.resetting = false;
        if succeeded {
            self.last_reset = Some(today);
        }
    }
}

/// The bulk update that marks every bin as needing collection
pub fn reset_updates(bins: &[Bin]) -> Vec<BinUpdate> {
    bins.iter()
        .map(|bin| BinUpdate {
            bin_id: bin.bin_id.clone(),
            patch: bin.needs_collection_patch(),
        })
        .collect()
}
