use chrono::Utc;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;

use super::locator::{DirectoryLocator, Locator};
use super::validator::validate_thesis;
use super::{ensure_valid_id, read_entity, write_entity, TradeStore};
use crate::error::{EntityKind, StoreError, StoreResult};
use crate::models::{Quarter, Thesis, ThesisSummary, VersionHistory};

/// Fields that never count as a user change when describing an update.
const UNTRACKED_FIELDS: &[&str] = &["id", "versions", "createdAt", "updatedAt"];

/// Thesis documents in a flat `theses/<prefix>_<id>.json` directory.
pub struct ThesisStore {
    locator: Arc<dyn Locator>,
    trades: Arc<TradeStore>,
}

impl ThesisStore {
    pub fn new(root: impl Into<PathBuf>, trades: Arc<TradeStore>) -> Self {
        Self::with_locator(Arc::new(DirectoryLocator::flat(root)), trades)
    }

    pub fn with_locator(locator: Arc<dyn Locator>, trades: Arc<TradeStore>) -> Self {
        Self { locator, trades }
    }

    /// Create or update a thesis, returning its id.
    ///
    /// Creation rejects a second active thesis for the same year and quarter.
    /// An update appends one version derived from the persisted state and
    /// never re-checks quarter uniqueness.
    pub async fn save(&self, thesis: &Thesis) -> StoreResult<String> {
        ensure_valid_id(&thesis.id)?;
        let incoming = validate_thesis(serde_json::to_value(thesis)?)?;

        match self.locator.locate(&incoming.id).await? {
            Some(path) => self.update(path, incoming).await,
            None => self.create(incoming).await,
        }
    }

    async fn create(&self, mut thesis: Thesis) -> StoreResult<String> {
        if thesis.is_active {
            if let Some(existing) = self.find_active(thesis.year, thesis.quarter).await? {
                return Err(StoreError::Conflict {
                    year: thesis.year,
                    quarter: thesis.quarter,
                    existing_id: existing.id,
                });
            }
        }

        let now = Utc::now();
        thesis.versions = VersionHistory::new();
        thesis.created_at = now;
        thesis.updated_at = now;

        let path = self
            .locator
            .root()
            .join(format!("{}_{}.json", thesis.file_prefix(), thesis.id));
        write_entity(&path, &thesis).await?;

        log::info!("Created thesis {} for {} {}", thesis.id, thesis.year, thesis.quarter);
        Ok(thesis.id)
    }

    async fn update(&self, path: PathBuf, incoming: Thesis) -> StoreResult<String> {
        let prior = read_entity(&path, validate_thesis).await?;
        let now = Utc::now();
        let changes = describe_changes(&prior, &incoming)?;

        let mut updated = incoming;
        updated.versions = prior.versions.append(changes, now);
        updated.created_at = prior.created_at;
        updated.updated_at = now;

        write_entity(&path, &updated).await?;

        log::info!(
            "Updated thesis {} (version {})",
            updated.id,
            updated.versions.len()
        );
        Ok(updated.id)
    }

    pub async fn load(&self, id: &str) -> StoreResult<Thesis> {
        let path = self
            .locator
            .locate(id)
            .await?
            .ok_or_else(|| StoreError::not_found(EntityKind::Thesis, id))?;

        read_entity(&path, validate_thesis).await
    }

    /// Every readable, valid thesis, newest first. Bad files are skipped.
    pub async fn load_all(&self) -> StoreResult<Vec<Thesis>> {
        let mut theses = Vec::new();

        for path in self.locator.entries().await? {
            match read_entity(&path, validate_thesis).await {
                Ok(thesis) => theses.push(thesis),
                Err(e) => log::warn!("Skipping thesis file {:?} ({:?}): {}", path, e.kind(), e),
            }
        }

        theses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(theses)
    }

    /// Summaries with the number of trades linked to each thesis.
    pub async fn list(&self) -> StoreResult<Vec<ThesisSummary>> {
        let theses = self.load_all().await?;
        let trades = self.trades.load_all().await?;

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for trade in &trades {
            if let Some(thesis_id) = trade.linked_thesis_id.as_deref() {
                *counts.entry(thesis_id).or_default() += 1;
            }
        }

        Ok(theses
            .iter()
            .map(|t| ThesisSummary::from_thesis(t, counts.get(t.id.as_str()).copied().unwrap_or(0)))
            .collect())
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        let path = self
            .locator
            .locate(id)
            .await?
            .ok_or_else(|| StoreError::not_found(EntityKind::Thesis, id))?;

        fs::remove_file(&path).await?;
        log::info!("Deleted thesis {} (linked trades keep their reference)", id);
        Ok(())
    }

    /// The active thesis for a quarter, if any. Absence is not an error.
    pub async fn get_active(&self, year: i32, quarter: Quarter) -> StoreResult<Option<Thesis>> {
        self.find_active(year, quarter).await
    }

    /// Toggle `isActive` through a normal update, recording a version.
    pub async fn set_active(&self, id: &str, active: bool) -> StoreResult<Thesis> {
        let mut thesis = self.load(id).await?;
        thesis.is_active = active;
        self.save(&thesis).await?;
        self.load(id).await
    }

    async fn find_active(&self, year: i32, quarter: Quarter) -> StoreResult<Option<Thesis>> {
        let theses = self.load_all().await?;
        Ok(theses
            .into_iter()
            .find(|t| t.is_active && t.year == year && t.quarter == quarter))
    }
}

/// Human-readable list of the top-level fields that differ.
fn describe_changes(prior: &Thesis, incoming: &Thesis) -> StoreResult<String> {
    let before = serde_json::to_value(prior)?;
    let after = serde_json::to_value(incoming)?;

    let keys: BTreeSet<&String> = match (&before, &after) {
        (Value::Object(a), Value::Object(b)) => a.keys().chain(b.keys()).collect(),
        _ => BTreeSet::new(),
    };

    let changed: Vec<&str> = keys
        .into_iter()
        .map(String::as_str)
        .filter(|k| !UNTRACKED_FIELDS.iter().any(|u| u == k))
        .filter(|k| before.get(*k) != after.get(*k))
        .collect();

    if changed.is_empty() {
        Ok("No field changes".to_string())
    } else {
        Ok(format!("Updated {}", changed.join(", ")))
    }
}
