//! Lifecycle engine.
//!
//! Consumes the join-event stream and a periodic timer tick, drives the
//! membership store through its state machine, issues removal commands to the
//! chat client and emits lifecycle notifications. One engine task multiplexes
//! both triggers, so store mutations from joins and sweeps never interleave.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use crate::client::{ChatClient, ConnectionState, JoinEvent};
use crate::error::{Error, Result};
use crate::notify::{Notification, NotifierSet};
use crate::store::MemberStore;
use crate::types::MemberRecord;

/// Engine parameters. One engine instance serves every tracked group; the
/// previous generation of this system ran a near-identical bot process per
/// interval/policy combination and these four knobs are what actually varied.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Sweep interval.
    pub check_interval: std::time::Duration,
    /// Retention for records with the default expiry policy.
    pub default_expiry: Duration,
    /// Group ids to track; empty tracks every group the client reports.
    pub target_groups: Vec<String>,
}

impl EngineConfig {
    pub fn tracks(&self, group_id: &str) -> bool {
        self.target_groups.is_empty() || self.target_groups.iter().any(|g| g == group_id)
    }
}

/// Counters for one sweep cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepOutcome {
    pub expired: usize,
    pub removed: usize,
    pub failed: usize,
}

pub struct LifecycleEngine<C> {
    store: Arc<MemberStore>,
    client: Arc<C>,
    notifiers: NotifierSet,
    config: EngineConfig,
}

impl<C: ChatClient> LifecycleEngine<C> {
    pub fn new(
        store: Arc<MemberStore>,
        client: Arc<C>,
        notifiers: NotifierSet,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            client,
            notifiers,
            config,
        }
    }

    /// Drive the engine until the join-event channel closes.
    ///
    /// Joins and sweep ticks are handled on this single task, which is the
    /// serialization point for all engine-originated store mutations.
    pub async fn run(self, mut joins: mpsc::Receiver<JoinEvent>) {
        let mut ticker = interval(self.config.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval = ?self.config.check_interval,
            groups = self.config.target_groups.len(),
            "lifecycle engine running"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.sweep(Utc::now()).await {
                        Ok(outcome) if outcome.expired > 0 => {
                            info!(
                                expired = outcome.expired,
                                removed = outcome.removed,
                                failed = outcome.failed,
                                "sweep finished"
                            );
                        }
                        Ok(_) => debug!("sweep finished, nothing expired"),
                        Err(err) => warn!(error = %err, "sweep skipped"),
                    }
                }
                event = joins.recv() => {
                    match event {
                        Some(event) => {
                            if let Err(err) = self.on_join(event).await {
                                error!(error = %err, "join event not recorded");
                            }
                        }
                        None => {
                            info!("join stream closed, engine stopping");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Handle one member-joined event.
    ///
    /// Identity resolution is best-effort: on failure the raw platform id is
    /// tracked instead. Duplicate events for the same pair collapse into the
    /// store's idempotent upsert. Returns `None` for untracked groups.
    pub async fn on_join(&self, event: JoinEvent) -> Result<Option<MemberRecord>> {
        if !self.config.tracks(&event.group_id) {
            return Ok(None);
        }

        let member_id = match self.client.resolve_identity(&event.member_id).await {
            Ok(canonical) => canonical,
            Err(err) => {
                debug!(raw_id = %event.member_id, error = %err, "identity unresolved, tracking raw id");
                event.member_id.clone()
            }
        };

        let record = self.store.upsert(&event.group_id, &member_id)?;
        info!(group_id = %record.group_id, member_id = %record.member_id, "member tracked");
        self.notifiers.dispatch(Notification::member_joined(&record));
        Ok(Some(record))
    }

    /// Run one expiry sweep at `now`.
    ///
    /// Skipped wholesale while the client is not ready - the readiness check
    /// runs before `find_expirable`, so no record is advanced to `expired`
    /// without a removal attempt following in the same cycle. Per-member
    /// failures are isolated: the member is marked `failed` and the batch
    /// continues. A record whose transition is refused (an admin touched it
    /// mid-batch) is skipped the same way; only a store persistence failure
    /// aborts the cycle. There is no retry within a sweep, and a `failed`
    /// record stays out of future sweeps until it is reactivated by a rejoin.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepOutcome> {
        let state = self.client.connection_state();
        if state != ConnectionState::Ready {
            return Err(Error::NotReady(state));
        }

        let due = self
            .store
            .find_expirable(now, self.config.default_expiry)?;
        let mut outcome = SweepOutcome {
            expired: due.len(),
            ..SweepOutcome::default()
        };

        for record in due {
            match self
                .client
                .remove_member(&record.group_id, &record.member_id)
                .await
            {
                Ok(()) => {
                    match self.store.mark_removed(&record.group_id, &record.member_id) {
                        Ok(()) => {
                            outcome.removed += 1;
                            info!(group_id = %record.group_id, member_id = %record.member_id, "member removed");
                            self.notifiers.dispatch(Notification::member_removed(&record));
                        }
                        Err(err) if err.is_persistence() => return Err(err),
                        // Admin moved the record out of `expired` mid-batch;
                        // nothing left to record for it.
                        Err(err) => {
                            warn!(
                                group_id = %record.group_id,
                                member_id = %record.member_id,
                                error = %err,
                                "removal not recorded"
                            );
                        }
                    }
                }
                Err(err) => {
                    let reason = err.to_string();
                    match self
                        .store
                        .mark_failed(&record.group_id, &record.member_id, &reason)
                    {
                        Ok(()) => {
                            outcome.failed += 1;
                            warn!(
                                group_id = %record.group_id,
                                member_id = %record.member_id,
                                reason = %reason,
                                "removal failed"
                            );
                        }
                        Err(err) if err.is_persistence() => return Err(err),
                        Err(err) => {
                            warn!(
                                group_id = %record.group_id,
                                member_id = %record.member_id,
                                reason = %reason,
                                error = %err,
                                "removal failure not recorded"
                            );
                        }
                    }
                }
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExpiryPolicy, MemberStatus};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Scripted chat client: resolution map, removal failures, readiness,
    /// plus a one-shot hook to interleave an admin action with the sweep.
    struct MockClient {
        state: Mutex<ConnectionState>,
        resolve_to: Mutex<Option<String>>,
        resolve_fails: bool,
        failing_members: HashSet<String>,
        removals: Mutex<Vec<(String, String)>>,
        on_first_removal: Mutex<Option<Box<dyn FnOnce() + Send>>>,
    }

    impl MockClient {
        fn ready() -> Self {
            Self {
                state: Mutex::new(ConnectionState::Ready),
                ..Self::default()
            }
        }
    }

    impl Default for MockClient {
        fn default() -> Self {
            Self {
                state: Mutex::new(ConnectionState::Disconnected),
                resolve_to: Mutex::new(None),
                resolve_fails: false,
                failing_members: HashSet::new(),
                removals: Mutex::new(Vec::new()),
                on_first_removal: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl ChatClient for MockClient {
        async fn resolve_identity(&self, raw_id: &str) -> Result<String> {
            if self.resolve_fails {
                return Err(Error::Resolution("contact lookup failed".to_string()));
            }
            Ok(self
                .resolve_to
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| raw_id.to_string()))
        }

        async fn remove_member(&self, group_id: &str, member_id: &str) -> Result<()> {
            if let Some(action) = self.on_first_removal.lock().unwrap().take() {
                action();
            }
            self.removals
                .lock()
                .unwrap()
                .push((group_id.to_string(), member_id.to_string()));
            if self.failing_members.contains(member_id) {
                return Err(Error::Removal("rate limited".to_string()));
            }
            Ok(())
        }

        async fn send_message(&self, _recipient: &str, _text: &str) -> Result<()> {
            Ok(())
        }

        async fn group_participants(&self, _group_id: &str) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        fn connection_state(&self) -> ConnectionState {
            *self.state.lock().unwrap()
        }
    }

    fn engine_with(client: MockClient, dir: &TempDir) -> (LifecycleEngine<MockClient>, Arc<MemberStore>) {
        let store = Arc::new(MemberStore::open(dir.path().join("members.json")).unwrap());
        let config = EngineConfig {
            check_interval: std::time::Duration::from_secs(60),
            default_expiry: Duration::days(30),
            target_groups: vec!["g1@g.us".to_string()],
        };
        let engine = LifecycleEngine::new(
            Arc::clone(&store),
            Arc::new(client),
            NotifierSet::new(),
            config,
        );
        (engine, store)
    }

    #[tokio::test]
    async fn join_resolves_identity_to_canonical_id() {
        let dir = TempDir::new().unwrap();
        let client = MockClient::ready();
        *client.resolve_to.lock().unwrap() = Some("77011234567@c.us".to_string());
        let (engine, store) = engine_with(client, &dir);

        let record = engine
            .on_join(JoinEvent {
                group_id: "g1@g.us".to_string(),
                member_id: "208361782014140@lid".to_string(),
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.member_id, "77011234567@c.us");
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn join_falls_back_to_raw_id_on_resolution_failure() {
        let dir = TempDir::new().unwrap();
        let client = MockClient {
            resolve_fails: true,
            ..MockClient::ready()
        };
        let (engine, _store) = engine_with(client, &dir);

        let record = engine
            .on_join(JoinEvent {
                group_id: "g1@g.us".to_string(),
                member_id: "208361782014140@lid".to_string(),
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.member_id, "208361782014140@lid");
    }

    #[tokio::test]
    async fn join_ignores_untracked_groups() {
        let dir = TempDir::new().unwrap();
        let (engine, store) = engine_with(MockClient::ready(), &dir);

        let outcome = engine
            .on_join(JoinEvent {
                group_id: "other@g.us".to_string(),
                member_id: "77011234567@c.us".to_string(),
            })
            .await
            .unwrap();

        assert!(outcome.is_none());
        assert!(store.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_joins_collapse_to_one_record() {
        let dir = TempDir::new().unwrap();
        let (engine, store) = engine_with(MockClient::ready(), &dir);
        let event = JoinEvent {
            group_id: "g1@g.us".to_string(),
            member_id: "77011234567@c.us".to_string(),
        };

        engine.on_join(event.clone()).await.unwrap();
        engine.on_join(event).await.unwrap();

        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sweep_removes_expired_member() {
        let dir = TempDir::new().unwrap();
        let (engine, store) = engine_with(MockClient::ready(), &dir);

        store.upsert("g1@g.us", "u1@c.us").unwrap();
        let now = Utc::now() + Duration::days(31);
        let outcome = engine.sweep(now).await.unwrap();

        assert_eq!(outcome, SweepOutcome { expired: 1, removed: 1, failed: 0 });
        let record = &store.list().unwrap()[0];
        assert_eq!(record.status, MemberStatus::Removed);
        assert!(record.removed_at.is_some());
    }

    #[tokio::test]
    async fn sweep_marks_failure_and_does_not_retry() {
        let dir = TempDir::new().unwrap();
        let client = MockClient {
            failing_members: HashSet::from(["u1@c.us".to_string()]),
            ..MockClient::ready()
        };
        let (engine, store) = engine_with(client, &dir);

        store.upsert("g1@g.us", "u1@c.us").unwrap();
        let day31 = Utc::now() + Duration::days(31);
        let outcome = engine.sweep(day31).await.unwrap();

        assert_eq!(outcome.failed, 1);
        let record = &store.list().unwrap()[0];
        assert_eq!(record.status, MemberStatus::Failed);
        assert_eq!(record.fail_reason.as_deref(), Some("Removal failed: rate limited"));

        // A later sweep leaves the failed record alone.
        let day32 = day31 + Duration::days(1);
        let outcome = engine.sweep(day32).await.unwrap();
        assert_eq!(outcome, SweepOutcome::default());
        assert_eq!(engine.client.removals.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_batch() {
        let dir = TempDir::new().unwrap();
        let client = MockClient {
            failing_members: HashSet::from(["bad@c.us".to_string()]),
            ..MockClient::ready()
        };
        let (engine, store) = engine_with(client, &dir);

        store.upsert("g1@g.us", "bad@c.us").unwrap();
        store.upsert("g1@g.us", "good@c.us").unwrap();

        let outcome = engine.sweep(Utc::now() + Duration::days(31)).await.unwrap();

        assert_eq!(outcome, SweepOutcome { expired: 2, removed: 1, failed: 1 });
        let records = store.list().unwrap();
        let good = records.iter().find(|r| r.member_id == "good@c.us").unwrap();
        assert_eq!(good.status, MemberStatus::Removed);
    }

    #[tokio::test]
    async fn admin_action_mid_batch_does_not_strand_the_rest() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemberStore::open(dir.path().join("members.json")).unwrap());
        store.upsert("g1@g.us", "u1@c.us").unwrap();
        store.upsert("g1@g.us", "u2@c.us").unwrap();
        store.upsert("g1@g.us", "u3@c.us").unwrap();

        // While the sweep handles u1, an admin deletes u2 out from under it,
        // so u2's mark_removed is refused with InvalidTransition.
        let client = MockClient::ready();
        let admin_store = Arc::clone(&store);
        *client.on_first_removal.lock().unwrap() =
            Some(Box::new(move || {
                admin_store.mark_manually_removed(1).unwrap();
            }));

        let config = EngineConfig {
            check_interval: std::time::Duration::from_secs(60),
            default_expiry: Duration::days(30),
            target_groups: vec!["g1@g.us".to_string()],
        };
        let engine = LifecycleEngine::new(
            Arc::clone(&store),
            Arc::new(client),
            NotifierSet::new(),
            config,
        );

        let outcome = engine.sweep(Utc::now() + Duration::days(31)).await.unwrap();

        // u2's transition was refused, but u3 still got its removal attempt.
        assert_eq!(outcome.expired, 3);
        assert_eq!(outcome.removed, 2);
        assert_eq!(outcome.failed, 0);
        assert_eq!(engine.client.removals.lock().unwrap().len(), 3);

        let records = store.list().unwrap();
        assert_eq!(records[0].status, MemberStatus::Removed);
        assert_eq!(records[1].status, MemberStatus::ManuallyRemoved);
        assert_eq!(records[2].status, MemberStatus::Removed);
    }

    #[tokio::test]
    async fn sweep_is_skipped_when_client_not_ready() {
        let dir = TempDir::new().unwrap();
        let (engine, store) = engine_with(MockClient::default(), &dir);

        store.upsert("g1@g.us", "u1@c.us").unwrap();
        let err = engine.sweep(Utc::now() + Duration::days(31)).await.unwrap_err();

        assert!(matches!(err, Error::NotReady(ConnectionState::Disconnected)));
        // Nothing advanced to expired, so the next ready sweep still sees it.
        assert_eq!(store.list().unwrap()[0].status, MemberStatus::Active);
    }

    #[tokio::test]
    async fn never_policy_outlives_any_sweep() {
        let dir = TempDir::new().unwrap();
        let (engine, store) = engine_with(MockClient::ready(), &dir);

        store.upsert("g1@g.us", "u1@c.us").unwrap();
        store.set_expiry(0, ExpiryPolicy::Never).unwrap();

        let outcome = engine.sweep(Utc::now() + Duration::days(3650)).await.unwrap();

        assert_eq!(outcome, SweepOutcome::default());
        assert_eq!(store.list().unwrap()[0].status, MemberStatus::Active);
    }
}
