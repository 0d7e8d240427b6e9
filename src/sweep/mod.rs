//! Scheduled reconciliation of expired sessions with user status.
//!
//! Every run reads all stored sessions, collects the users whose session
//! cookie has expired, deactivates them in one batched update, then prunes
//! expired rows from the store. Runs never overlap.

mod schedule;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;
use tracing::{debug, error, info, warn};

use crate::routes::user::User;
use crate::session::{SessionRecord, SessionStore, StoreError};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[async_trait]
pub trait UserStatusRepository: Send + Sync {
    /// Marks every listed user inactive in a single statement.
    async fn deactivate_users(&self, user_ids: &[i64]) -> Result<u64, sqlx::Error>;
}

#[async_trait]
impl UserStatusRepository for MySqlPool {
    async fn deactivate_users(&self, user_ids: &[i64]) -> Result<u64, sqlx::Error> {
        User::deactivate_many(self, user_ids).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("failed to read sessions: {0}")]
    Store(#[from] StoreError),
    #[error("failed to deactivate users: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SweepReport {
    pub scanned: usize,
    pub malformed: usize,
    pub expired_sessions: usize,
    pub deactivated_user_ids: Vec<i64>,
    pub rows_updated: u64,
    pub pruned: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SweepOutcome {
    Completed(SweepReport),
    /// Another run was still in progress.
    Skipped,
    Failed,
}

pub struct SessionSweep {
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserStatusRepository>,
    clock: Arc<dyn Clock>,
    running: AtomicBool,
}

struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SessionSweep {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserStatusRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            users,
            clock,
            running: AtomicBool::new(false),
        }
    }

    /// One guarded run. Errors are logged, never returned.
    pub async fn trigger(&self) -> SweepOutcome {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Session sweep still running, skipping this trigger");
            return SweepOutcome::Skipped;
        }
        let _guard = RunningGuard(&self.running);

        match self.run_once().await {
            Ok(report) => SweepOutcome::Completed(report),
            Err(e) => {
                error!("Error deactivating expired sessions: {}", e);
                SweepOutcome::Failed
            }
        }
    }

    pub async fn run_once(&self) -> Result<SweepReport, SweepError> {
        let sessions = self.sessions.all().await?;
        let mut report = SweepReport::default();

        if sessions.is_empty() {
            warn!("No sessions found, nothing to sweep");
            return Ok(report);
        }

        let now = self.clock.now();
        let mut expired_users = BTreeSet::new();

        for (sid, payload) in &sessions {
            report.scanned += 1;
            let record = match SessionRecord::from_payload(payload) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping malformed session {}: {}", sid, e);
                    report.malformed += 1;
                    continue;
                }
            };

            if !record.is_expired_at(now) {
                continue;
            }
            report.expired_sessions += 1;
            if let Some(user) = record.user {
                expired_users.insert(user.id);
            }
        }

        if !expired_users.is_empty() {
            let ids: Vec<i64> = expired_users.into_iter().collect();
            report.rows_updated = self.users.deactivate_users(&ids).await?;
            info!(
                "Marked {} user(s) as inactive due to expired sessions",
                ids.len()
            );
            report.deactivated_user_ids = ids;
        }

        report.pruned = self.sessions.clear_expired(now).await?;
        debug!(
            scanned = report.scanned,
            expired = report.expired_sessions,
            pruned = report.pruned,
            "Session sweep finished"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests;
