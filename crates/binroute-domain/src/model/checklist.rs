//! Pre-route checklist

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use binroute_types::{Error, Result};

/// Items every collector confirms before leaving the depot
const STANDARD_ITEMS: [(&str, &str); 5] = [
    ("vehicle", "Vehicle inspected"),
    ("safety-gear", "Safety gear worn"),
    ("fuel", "Fuel level checked"),
    ("route-review", "Route reviewed"),
    ("communication", "Communication device charged"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: String,
    pub label: String,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checklist {
    pub items: Vec<ChecklistItem>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Checklist {
    /// The fixed checklist with nothing ticked
    pub fn standard() -> Self {
        Self {
            items: STANDARD_ITEMS
                .iter()
                .map(|(id, label)| ChecklistItem {
                    id: id.to_string(),
                    label: label.to_string(),
                    checked: false,
                })
                .collect(),
            completed_at: None,
        }
    }

    pub fn check(&mut self, id: &str) -> Result<()> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| Error::validation(format!("unknown checklist item: {}", id)))?;
        item.checked = true;
        Ok(())
    }

    pub fn check_all(&mut self) {
        for item in &mut self.items {
            item.checked = true;
        }
    }

    pub fn unchecked(&self) -> Vec<&ChecklistItem> {
        self.items.iter().filter(|item| !item.checked).collect()
    }

    pub fn all_checked(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(|item| item.checked)
    }

    /// Stamp the completion time; fails while anything is unchecked
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<()> {
        if !self.all_checked() {
            return Err(Error::validation("checklist incomplete"));
        }
        self.completed_at = Some(now);
        Ok(())
    }

    /// Every item checked and a completion timestamp present
    pub fn is_complete(&self) -> bool {
        self.all_checked() && self.completed_at.is_some()
    }
}
