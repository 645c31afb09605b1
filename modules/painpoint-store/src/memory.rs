// In-process store. Same contract as the Postgres store, no durability.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use painpoint_common::{Analysis, IdeaAnalysis, SavedAnalysis};
use uuid::Uuid;

use crate::error::Result;
use crate::store::{clamp_limit, AnalysisStore};

#[derive(Default)]
pub struct MemoryAnalysisStore {
    rows: Mutex<Vec<SavedAnalysis>>,
}

impl MemoryAnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SavedAnalysis>> {
        // A poisoned lock only means a test panicked mid-update; the rows are still usable.
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn update<F>(&self, id: Uuid, f: F) -> Option<SavedAnalysis>
    where
        F: FnOnce(&mut SavedAnalysis),
    {
        let mut rows = self.lock();
        let row = rows.iter_mut().find(|row| row.id == id)?;
        f(row);
        Some(row.clone())
    }
}

#[async_trait]
impl AnalysisStore for MemoryAnalysisStore {
    async fn insert(&self, title: &str, analysis: &Analysis) -> Result<SavedAnalysis> {
        let mut rows = self.lock();
        // Keep created_at strictly increasing so newest-first ordering is stable
        // even when inserts land within the same clock tick.
        let mut created_at = Utc::now();
        if let Some(last) = rows.iter().map(|row| row.created_at).max() {
            if created_at <= last {
                created_at = last + Duration::microseconds(1);
            }
        }

        let saved = SavedAnalysis {
            id: Uuid::new_v4(),
            created_at,
            title: title.to_string(),
            analysis: analysis.clone(),
            market_analysis: BTreeMap::new(),
        };
        rows.push(saved.clone());
        Ok(saved)
    }

    async fn list(&self, limit: i64) -> Result<Vec<SavedAnalysis>> {
        let mut rows = self.lock().clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(clamp_limit(limit) as usize);
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> Result<Option<SavedAnalysis>> {
        Ok(self.lock().iter().find(|row| row.id == id).cloned())
    }

    async fn update_title(&self, id: Uuid, title: &str) -> Result<Option<SavedAnalysis>> {
        Ok(self.update(id, |row| row.title = title.to_string()))
    }

    async fn put_market_analysis(
        &self,
        id: Uuid,
        idea: &str,
        research: &IdeaAnalysis,
    ) -> Result<Option<SavedAnalysis>> {
        Ok(self.update(id, |row| {
            row.market_analysis.insert(idea.to_string(), research.clone());
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut rows = self.lock();
        let before = rows.len();
        rows.retain(|row| row.id != id);
        Ok(rows.len() < before)
    }
}
