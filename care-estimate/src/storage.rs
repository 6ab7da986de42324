use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::wizard::WizardSession;

/// Trait for storing and retrieving wizard sessions
#[async_trait]
pub trait WizardStorage: Send + Sync {
    async fn save(&self, session: WizardSession) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<WizardSession>>;
    async fn delete(&self, id: &str) -> Result<()>;
    /// Drop every session created before `cutoff`, returning how many went
    async fn purge_created_before(&self, cutoff: DateTime<Utc>) -> Result<usize>;
}

/// In-memory implementation of WizardStorage
#[derive(Default)]
pub struct InMemoryWizardStorage {
    sessions: Arc<DashMap<String, WizardSession>>,
}

impl InMemoryWizardStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl WizardStorage for InMemoryWizardStorage {
    async fn save(&self, session: WizardSession) -> Result<()> {
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<WizardSession>> {
        Ok(self.sessions.get(id).map(|entry| entry.clone()))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions.remove(id);
        Ok(())
    }

    async fn purge_created_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.created_at >= cutoff);
        Ok(before.saturating_sub(self.sessions.len()))
    }
}
