use std::sync::Mutex;
use std::time::Duration as StdDuration;

use chrono::Duration;
use serde_json::{Value, json};
use tokio::sync::Notify;

use super::*;
use crate::session::{InMemorySessionStore, SessionCookie, SessionMap, SessionUser};

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Default)]
struct RecordingUsers {
    calls: Mutex<Vec<Vec<i64>>>,
}

impl RecordingUsers {
    fn calls(&self) -> Vec<Vec<i64>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserStatusRepository for RecordingUsers {
    async fn deactivate_users(&self, user_ids: &[i64]) -> Result<u64, sqlx::Error> {
        self.calls.lock().unwrap().push(user_ids.to_vec());
        Ok(user_ids.len() as u64)
    }
}

/// Serves a fixed `all()` response; everything else is a no-op.
struct FixedSessions {
    all: Result<SessionMap, String>,
}

#[async_trait]
impl SessionStore for FixedSessions {
    async fn get(&self, _sid: &str) -> Result<Option<SessionRecord>, StoreError> {
        Ok(None)
    }

    async fn set(&self, _sid: &str, _record: &SessionRecord) -> Result<(), StoreError> {
        Ok(())
    }

    async fn touch(&self, _sid: &str, _record: &SessionRecord) -> Result<(), StoreError> {
        Ok(())
    }

    async fn destroy(&self, _sid: &str) -> Result<(), StoreError> {
        Ok(())
    }

    async fn all(&self) -> Result<SessionMap, StoreError> {
        self.all
            .clone()
            .map_err(|msg| StoreError::Database(sqlx::Error::Protocol(msg)))
    }

    async fn clear_expired(&self, _now: DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(0)
    }
}

fn now() -> DateTime<Utc> {
    "2025-03-01T10:00:00Z".parse().unwrap()
}

fn payload(expires: Option<DateTime<Utc>>, user_id: Option<i64>) -> Value {
    let mut body = json!({ "cookie": { "originalMaxAge": 86400000, "httpOnly": true, "path": "/" } });
    if let Some(expires) = expires {
        body["cookie"]["expires"] = json!(expires.to_rfc3339());
    }
    if let Some(id) = user_id {
        body["user"] = json!({ "id": id, "username": format!("user{id}") });
    }
    body
}

fn sweep_over(sessions: SessionMap) -> (SessionSweep, Arc<RecordingUsers>) {
    let users = Arc::new(RecordingUsers::default());
    let sweep = SessionSweep::new(
        Arc::new(FixedSessions { all: Ok(sessions) }),
        users.clone(),
        Arc::new(FixedClock(now())),
    );
    (sweep, users)
}

#[tokio::test]
async fn expired_session_deactivates_its_user() {
    let sessions = SessionMap::from([(
        "a".to_string(),
        payload(Some(now() - Duration::minutes(5)), Some(7)),
    )]);
    let (sweep, users) = sweep_over(sessions);

    let report = sweep.run_once().await.unwrap();

    assert_eq!(users.calls(), vec![vec![7]]);
    assert_eq!(report.deactivated_user_ids, vec![7]);
    assert_eq!(report.expired_sessions, 1);
}

#[tokio::test]
async fn live_or_undated_sessions_leave_users_alone() {
    let sessions = SessionMap::from([
        ("future".to_string(), payload(Some(now() + Duration::hours(1)), Some(1))),
        ("undated".to_string(), payload(None, Some(2))),
    ]);
    let (sweep, users) = sweep_over(sessions);

    let report = sweep.run_once().await.unwrap();

    assert!(users.calls().is_empty());
    assert_eq!(report.scanned, 2);
    assert_eq!(report.expired_sessions, 0);
}

#[tokio::test]
async fn expired_session_without_user_triggers_no_update() {
    let sessions = SessionMap::from([(
        "anon".to_string(),
        payload(Some(now() - Duration::hours(1)), None),
    )]);
    let (sweep, users) = sweep_over(sessions);

    let report = sweep.run_once().await.unwrap();

    assert!(users.calls().is_empty());
    assert_eq!(report.expired_sessions, 1);
}

#[tokio::test]
async fn empty_store_is_a_no_op() {
    let (sweep, users) = sweep_over(SessionMap::new());

    let report = sweep.run_once().await.unwrap();

    assert!(users.calls().is_empty());
    assert_eq!(report, SweepReport::default());
}

#[tokio::test]
async fn shared_user_is_updated_once() {
    let expired = Some(now() - Duration::minutes(1));
    let sessions = SessionMap::from([
        ("a".to_string(), payload(expired, Some(7))),
        ("b".to_string(), payload(expired, Some(7))),
        ("c".to_string(), payload(expired, Some(3))),
    ]);
    let (sweep, users) = sweep_over(sessions);

    sweep.run_once().await.unwrap();

    assert_eq!(users.calls(), vec![vec![3, 7]]);
}

#[tokio::test]
async fn malformed_payload_is_skipped_without_error() {
    let sessions = SessionMap::from([
        ("bad".to_string(), json!("not a session")),
        ("worse".to_string(), json!([1, 2, 3])),
    ]);
    let (sweep, users) = sweep_over(sessions);

    let report = sweep.run_once().await.unwrap();

    assert_eq!(report.malformed, 2);
    assert!(users.calls().is_empty());
}

#[tokio::test]
async fn store_failure_is_swallowed_by_trigger() {
    let users = Arc::new(RecordingUsers::default());
    let sweep = SessionSweep::new(
        Arc::new(FixedSessions {
            all: Err("connection refused".into()),
        }),
        users.clone(),
        Arc::new(FixedClock(now())),
    );

    assert_eq!(sweep.trigger().await, SweepOutcome::Failed);
    assert!(users.calls().is_empty());
    // The guard is released after a failure.
    assert_eq!(sweep.trigger().await, SweepOutcome::Failed);
}

struct BlockingSessions {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl SessionStore for BlockingSessions {
    async fn get(&self, _sid: &str) -> Result<Option<SessionRecord>, StoreError> {
        Ok(None)
    }

    async fn set(&self, _sid: &str, _record: &SessionRecord) -> Result<(), StoreError> {
        Ok(())
    }

    async fn touch(&self, _sid: &str, _record: &SessionRecord) -> Result<(), StoreError> {
        Ok(())
    }

    async fn destroy(&self, _sid: &str) -> Result<(), StoreError> {
        Ok(())
    }

    async fn all(&self) -> Result<SessionMap, StoreError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(SessionMap::new())
    }

    async fn clear_expired(&self, _now: DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(0)
    }
}

#[tokio::test]
async fn overlapping_trigger_is_skipped() {
    let store = Arc::new(BlockingSessions {
        entered: Notify::new(),
        release: Notify::new(),
    });
    let sweep = Arc::new(SessionSweep::new(
        store.clone(),
        Arc::new(RecordingUsers::default()),
        Arc::new(FixedClock(now())),
    ));

    let first = tokio::spawn({
        let sweep = sweep.clone();
        async move { sweep.trigger().await }
    });
    store.entered.notified().await;

    assert_eq!(sweep.trigger().await, SweepOutcome::Skipped);

    store.release.notify_one();
    assert!(matches!(
        first.await.unwrap(),
        SweepOutcome::Completed(_)
    ));
}

#[tokio::test]
async fn deactivates_before_pruning_expired_rows() {
    let store = Arc::new(InMemorySessionStore::new());
    let real_now = Utc::now();

    let mut cookie = SessionCookie::new(Duration::hours(24), false, "lax");
    cookie.set_expires(real_now - Duration::hours(1));
    let mut stale = SessionRecord::new(cookie);
    stale.user = Some(SessionUser {
        id: 11,
        username: Some("clerk".into()),
        role: None,
    });
    store.set("stale", &stale).await.unwrap();

    let mut live = SessionRecord::new(SessionCookie::new(Duration::hours(24), false, "lax"));
    live.cookie.touch(real_now);
    store.set("live", &live).await.unwrap();

    let users = Arc::new(RecordingUsers::default());
    let sweep = SessionSweep::new(store.clone(), users.clone(), Arc::new(FixedClock(real_now)));

    let report = sweep.run_once().await.unwrap();

    assert_eq!(users.calls(), vec![vec![11]]);
    assert_eq!(report.pruned, 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn scheduler_runs_once_per_period() {
    let sessions = SessionMap::from([(
        "a".to_string(),
        payload(Some(now() - Duration::minutes(5)), Some(7)),
    )]);
    let (sweep, users) = sweep_over(sessions);
    let handle = Arc::new(sweep).spawn(StdDuration::from_secs(300));

    tokio::time::sleep(StdDuration::from_secs(299)).await;
    assert!(users.calls().is_empty());

    tokio::time::sleep(StdDuration::from_secs(2)).await;
    assert_eq!(users.calls().len(), 1);

    tokio::time::sleep(StdDuration::from_secs(300)).await;
    assert_eq!(users.calls().len(), 2);

    handle.abort();
}

#[tokio::test(start_paused = true)]
async fn zero_period_still_sweeps() {
    let sessions = SessionMap::from([(
        "a".to_string(),
        payload(Some(now() - Duration::minutes(5)), Some(7)),
    )]);
    let (sweep, users) = sweep_over(sessions);
    let handle = Arc::new(sweep).spawn(StdDuration::ZERO);

    tokio::time::sleep(StdDuration::from_millis(10_500)).await;

    assert!(!handle.is_finished());
    assert!(!users.calls().is_empty());
    assert!(users.calls().iter().all(|ids| ids == &vec![7]));

    handle.abort();
}
