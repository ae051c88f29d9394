use crate::normalize::{MonthlyRecord, WeeklyRecord};
use crate::util::identity_key;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which monthly row decides the sector of a worker listed more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    First,
    #[default]
    Last,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectorMap {
    by_identity: HashMap<String, String>,
    unregistered: String,
}

impl SectorMap {
    pub fn build(monthly: &[MonthlyRecord], policy: DedupPolicy, unregistered: &str) -> Self {
        let mut by_identity = HashMap::new();
        for rec in monthly {
            let key = identity_key(&rec.identity);
            match policy {
                DedupPolicy::First => {
                    by_identity.entry(key).or_insert_with(|| rec.sector.clone());
                }
                DedupPolicy::Last => {
                    by_identity.insert(key, rec.sector.clone());
                }
            }
        }
        Self {
            by_identity,
            unregistered: unregistered.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.by_identity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_identity.is_empty()
    }

    pub fn unregistered(&self) -> &str {
        &self.unregistered
    }

    /// Sector of `identity`, or the unregistered sentinel.
    pub fn resolve(&self, identity: &str) -> &str {
        self.by_identity
            .get(&identity_key(identity))
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.unregistered)
    }

    /// Sector for a weekly row: its own code when it carries one, the map otherwise.
    pub fn sector_of<'a>(&'a self, record: &'a WeeklyRecord) -> &'a str {
        match record.sector.as_deref() {
            Some(own) if !own.trim().is_empty() => own,
            _ => self.resolve(&record.identity),
        }
    }

    /// Fills in the sector of every weekly row that lacks one.
    pub fn apply(&self, weekly: &mut [WeeklyRecord]) {
        for rec in weekly.iter_mut() {
            if rec.sector.as_deref().is_none_or(|s| s.trim().is_empty()) {
                rec.sector = Some(self.resolve(&rec.identity).to_string());
            }
        }
    }
}
