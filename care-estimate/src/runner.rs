//! WizardRunner – loads a wizard session, applies exactly **one** step and
//! persists the updated session back to storage.
//!
//! An HTTP handler serving the wizard runs one step per request, so the
//! runner is created once at startup and shared:
//!
//! ```rust,ignore
//! let runner = WizardRunner::new(Scoring::default(), Arc::new(InMemoryWizardStorage::new()));
//! let session = runner.start().await?;
//! let session = runner.run(&session.id, WizardInput::Finance { monthly_income: 40_000.0 }).await?;
//! ```
//!
//! A failed step leaves the stored session untouched. Sessions older than the
//! runner's TTL are purged whenever a new one is started.

use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{EstimateError, Result};
use crate::scoring::Scoring;
use crate::storage::WizardStorage;
use crate::wizard::{WizardInput, WizardSession};

/// Sessions live for an hour unless configured otherwise
pub const DEFAULT_SESSION_TTL_SECS: i64 = 3600;

#[derive(Clone)]
pub struct WizardRunner {
    scoring: Scoring,
    storage: Arc<dyn WizardStorage>,
    session_ttl: Duration,
}

impl WizardRunner {
    pub fn new(scoring: Scoring, storage: Arc<dyn WizardStorage>) -> Self {
        Self {
            scoring,
            storage,
            session_ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
        }
    }

    pub fn with_session_ttl(mut self, session_ttl: Duration) -> Self {
        self.session_ttl = session_ttl;
        self
    }

    pub fn scoring(&self) -> &Scoring {
        &self.scoring
    }

    /// Create and persist an empty session, evicting expired ones first
    pub async fn start(&self) -> Result<WizardSession> {
        self.purge_expired().await?;
        let session = WizardSession::new();
        self.storage.save(session.clone()).await?;
        info!(session_id = %session.id, "Wizard session created");
        Ok(session)
    }

    pub async fn get(&self, session_id: &str) -> Result<WizardSession> {
        self.storage
            .get(session_id)
            .await?
            .ok_or_else(|| EstimateError::SessionNotFound(session_id.to_string()))
    }

    pub async fn delete(&self, session_id: &str) -> Result<()> {
        self.get(session_id).await?;
        self.storage.delete(session_id).await?;
        info!(session_id = %session_id, "Wizard session deleted");
        Ok(())
    }

    /// Remove sessions created more than the TTL ago
    pub async fn purge_expired(&self) -> Result<usize> {
        let purged = self
            .storage
            .purge_created_before(Utc::now() - self.session_ttl)
            .await?;
        if purged > 0 {
            debug!(purged, "Expired wizard sessions removed");
        }
        Ok(purged)
    }

    /// Apply one step to the stored session and save the result
    pub async fn run(&self, session_id: &str, input: WizardInput) -> Result<WizardSession> {
        // 1. Load session
        let mut session = self.get(session_id).await?;

        // 2. Apply exactly one step
        session.apply(input, &self.scoring)?;

        // 3. Persist so the next step starts where this one left off
        self.storage.save(session.clone()).await?;

        info!(
            session_id = %session_id,
            step = ?session.step,
            "Wizard step applied"
        );
        Ok(session)
    }
}
