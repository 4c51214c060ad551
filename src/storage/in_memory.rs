//! In-memory implementation of EntitySource for mock data and testing

use crate::core::auth::CurrentUser;
use crate::core::entity::Entity;
use crate::core::record::Record;
use crate::core::service::EntitySource;
use crate::core::stats::DerivedStats;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// A scripted answer to one `fetch_entities` call
#[derive(Debug, Clone)]
struct Scripted<T> {
    delay: Duration,
    result: Result<Vec<T>, String>,
}

/// In-memory entity source
///
/// Stands in for the backend while pages run on mock data. Latency and
/// failures can be injected to exercise loading, error and timeout paths.
/// Uses RwLock for thread-safe access; clones share the same data.
#[derive(Clone)]
pub struct InMemorySource<T> {
    entities: Arc<RwLock<Vec<T>>>,
    categories: Arc<RwLock<Vec<String>>>,
    stats: Arc<RwLock<Option<DerivedStats>>>,
    failure: Arc<RwLock<Option<String>>>,
    script: Arc<RwLock<VecDeque<Scripted<T>>>>,
    latency: Duration,
    calls: Arc<AtomicUsize>,
}

impl<T: Entity> InMemorySource<T> {
    /// Create a source serving the given entities
    pub fn new(entities: Vec<T>) -> Self {
        Self {
            entities: Arc::new(RwLock::new(entities)),
            categories: Arc::new(RwLock::new(Vec::new())),
            stats: Arc::new(RwLock::new(None)),
            failure: Arc::new(RwLock::new(None)),
            script: Arc::new(RwLock::new(VecDeque::new())),
            latency: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Delay applied to every unscripted fetch
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_categories(self, categories: Vec<String>) -> Self {
        if let Ok(mut slot) = self.categories.write() {
            *slot = categories;
        }
        self
    }

    pub fn with_stats(self, stats: DerivedStats) -> Self {
        if let Ok(mut slot) = self.stats.write() {
            *slot = Some(stats);
        }
        self
    }

    /// Replace the served entities
    pub fn set_entities(&self, entities: Vec<T>) -> Result<()> {
        let mut slot = self
            .entities
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
        *slot = entities;
        Ok(())
    }

    /// Make every following fetch fail with this message
    pub fn fail_with(&self, message: impl Into<String>) -> Result<()> {
        let mut slot = self
            .failure
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
        *slot = Some(message.into());
        Ok(())
    }

    /// Stop failing
    pub fn recover(&self) -> Result<()> {
        let mut slot = self
            .failure
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
        *slot = None;
        Ok(())
    }

    /// Queue the answer of the next unanswered fetch
    ///
    /// Scripted answers are consumed in call order, before the served
    /// entities and the failure flag are consulted.
    pub fn enqueue(&self, delay: Duration, result: Result<Vec<T>, String>) -> Result<()> {
        let mut script = self
            .script
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
        script.push_back(Scripted { delay, result });
        Ok(())
    }

    /// Number of `fetch_entities` calls so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_scripted(&self) -> Result<Option<Scripted<T>>> {
        let mut script = self
            .script
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
        Ok(script.pop_front())
    }
}

impl InMemorySource<Record> {
    /// Create a source from a JSON array of objects (mock fixtures)
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(Self::new(Record::list_from_json_str(json)?))
    }
}

#[async_trait]
impl<T: Entity> EntitySource<T> for InMemorySource<T> {
    async fn fetch_entities(&self, _user: &CurrentUser) -> Result<Vec<T>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(scripted) = self.next_scripted()? {
            if !scripted.delay.is_zero() {
                tokio::time::sleep(scripted.delay).await;
            }
            return scripted.result.map_err(|message| anyhow!(message));
        }

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let failure = self
            .failure
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?
            .clone();
        if let Some(message) = failure {
            return Err(anyhow!(message));
        }

        let entities = self
            .entities
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
        Ok(entities.clone())
    }

    async fn fetch_stats(&self, _user: &CurrentUser) -> Result<Option<DerivedStats>> {
        let stats = self
            .stats
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
        Ok(stats.clone())
    }

    async fn fetch_categories(&self, _user: &CurrentUser) -> Result<Vec<String>> {
        let categories = self
            .categories
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
        Ok(categories.clone())
    }
}
