//! Per-session state: the datasets currently loaded and the justification
//! notes typed by the user. Every load recomputes the datasets from scratch;
//! only the notes outlive a reload.

use crate::config::Config;
use crate::error::{LoadError, ValidationError};
use crate::ingest::Table;
use crate::normalize::{self, MonthlyDataset, WeeklyDataset};
use crate::sector::SectorMap;
use crate::util::identity_key;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user's correction to one monthly row, as saved from the table editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyEdit {
    pub identity: String,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub monthly_deviation: Option<f64>,
    #[serde(default)]
    pub cumulative_deviation: Option<f64>,
    #[serde(default)]
    pub potential_remaining: Option<f64>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    cfg: Config,
    weekly: Option<WeeklyDataset>,
    monthly: Option<MonthlyDataset>,
    notes: BTreeMap<String, String>,
}

impl Session {
    pub fn new(id: SessionId, cfg: &Config) -> Self {
        Self {
            id,
            cfg: cfg.clone(),
            weekly: None,
            monthly: None,
            notes: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn weekly(&self) -> Option<&WeeklyDataset> {
        self.weekly.as_ref()
    }

    pub fn monthly(&self) -> Option<&MonthlyDataset> {
        self.monthly.as_ref()
    }

    pub fn notes(&self) -> &BTreeMap<String, String> {
        &self.notes
    }

    pub fn load_weekly(&mut self, table: &Table) -> Result<&WeeklyDataset, LoadError> {
        let ds = normalize::weekly_from_table(&self.cfg, table)?;
        info!(
            session = %self.id,
            "weekly dataset: {} workers, {} rows dropped",
            ds.records.len(),
            ds.table.dropped
        );
        Ok(&*self.weekly.insert(ds))
    }

    pub fn load_monthly(&mut self, table: &Table) -> Result<&MonthlyDataset, LoadError> {
        let mut ds = normalize::monthly_from_table(&self.cfg, table)?;
        for rec in &mut ds.records {
            if let Some(note) = self.notes.get(&identity_key(&rec.identity)) {
                rec.note = note.clone();
            }
        }
        info!(
            session = %self.id,
            "monthly dataset: {} workers, {} rows dropped",
            ds.records.len(),
            ds.table.dropped
        );
        Ok(&*self.monthly.insert(ds))
    }

    /// Records a justification note. The worker must be in the monthly dataset.
    pub fn set_note(&mut self, identity: &str, note: &str) -> Result<(), ValidationError> {
        let key = identity_key(identity);
        let monthly = self
            .monthly
            .as_mut()
            .ok_or(ValidationError::NoDataset("monthly"))?;
        let mut found = false;
        for rec in monthly.records.iter_mut().filter(|r| r.identity == key) {
            rec.note = note.to_string();
            found = true;
        }
        if !found {
            return Err(ValidationError::UnknownWorker(key));
        }
        debug!(session = %self.id, "note set for {key}");
        self.notes.insert(key, note.to_string());
        Ok(())
    }

    /// Sets every note in `notes`, skipping workers absent from the monthly
    /// dataset. Returns the identities that were skipped.
    pub fn import_notes(&mut self, notes: &BTreeMap<String, String>) -> Vec<String> {
        let mut skipped = Vec::new();
        for (identity, note) in notes {
            if let Err(e) = self.set_note(identity, note) {
                warn!(session = %self.id, "note ignored: {e}");
                skipped.push(identity.clone());
            }
        }
        skipped
    }

    /// Merges edited rows into the loaded monthly dataset, keyed by identity.
    pub fn apply_edits(&mut self, edits: &[MonthlyEdit]) -> Result<usize, ValidationError> {
        let monthly = self
            .monthly
            .as_mut()
            .ok_or(ValidationError::NoDataset("monthly"))?;

        // All-or-nothing: check every identity before touching anything.
        for edit in edits {
            let key = identity_key(&edit.identity);
            if !monthly.records.iter().any(|r| r.identity == key) {
                return Err(ValidationError::UnknownWorker(key));
            }
        }

        let mut changed = 0;
        for edit in edits {
            let key = identity_key(&edit.identity);
            for rec in monthly.records.iter_mut().filter(|r| r.identity == key) {
                if let Some(s) = &edit.sector {
                    rec.sector = s.trim().to_string();
                }
                if let Some(v) = edit.monthly_deviation {
                    rec.monthly_deviation = v;
                }
                if let Some(v) = edit.cumulative_deviation {
                    rec.cumulative_deviation = v;
                }
                if let Some(v) = edit.potential_remaining {
                    rec.potential_remaining = v;
                }
                if let Some(n) = &edit.note {
                    rec.note = n.clone();
                }
                changed += 1;
            }
            if let Some(n) = &edit.note {
                self.notes.insert(key, n.clone());
            }
        }
        info!(session = %self.id, "applied {} edit(s) to {} row(s)", edits.len(), changed);
        Ok(changed)
    }

    /// Identity → sector lookup from the monthly dataset; empty when none is loaded.
    pub fn sector_map(&self) -> SectorMap {
        let records = self
            .monthly
            .as_ref()
            .map(|m| m.records.as_slice())
            .unwrap_or(&[]);
        SectorMap::build(records, self.cfg.sector.dedup, &self.cfg.sector.unregistered)
    }
}

/// Sessions keyed by id. Nothing is shared between two sessions.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<SessionId, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, id: &SessionId, cfg: &Config) -> &mut Session {
        self.sessions
            .entry(id.clone())
            .or_insert_with(|| Session::new(id.clone(), cfg))
    }

    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    pub fn close(&mut self, id: &SessionId) -> Option<Session> {
        self.sessions.remove(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
