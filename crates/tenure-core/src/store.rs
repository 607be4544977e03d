//! Membership store.
//!
//! Authoritative, invariant-preserving collection of [`MemberRecord`]s backed
//! by a single JSON file: an ordered sequence of records, appended on first
//! join and never physically deleted by the engine. Admin operations address
//! records by their position in that sequence.
//!
//! Every mutating operation rewrites the whole file (temp file + rename)
//! before the in-memory state is committed, so a crash between operations
//! loses at most the in-flight one and a failed write leaves both memory and
//! disk untouched. An interior mutex serializes mutations; the read-modify-
//! write cycle of each operation is never visible half-done to readers.

use chrono::{DateTime, Duration, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::{ExpiryPolicy, MemberRecord, MemberStatus};

pub struct MemberStore {
    path: PathBuf,
    records: Mutex<Vec<MemberRecord>>,
}

impl MemberStore {
    /// Open the store at `path`, creating an empty one if the file is
    /// missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let records = if path.exists() {
            let data = fs::read_to_string(&path)?;
            serde_json::from_str(&data)?
        } else {
            persist(&path, &[])?;
            Vec::new()
        };

        info!(path = %path.display(), records = records.len(), "member store opened");
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    /// Track a join for `(group_id, member_id)`.
    ///
    /// Reactivates the existing record for the pair if there is one (any
    /// status), otherwise appends a fresh record. Idempotent: repeated calls
    /// while already active just refresh `joined_at`.
    pub fn upsert(&self, group_id: &str, member_id: &str) -> Result<MemberRecord> {
        self.mutate(|records| {
            let now = Utc::now();
            match records.iter_mut().find(|r| r.is_pair(group_id, member_id)) {
                Some(existing) => {
                    existing.reactivate(now);
                    debug!(group_id, member_id, "reactivated member");
                    Ok(existing.clone())
                }
                None => {
                    let record = MemberRecord::new(group_id, member_id, now);
                    records.push(record.clone());
                    debug!(group_id, member_id, "tracking new member");
                    Ok(record)
                }
            }
        })
    }

    /// Administrative expiry-policy override for the record at `index`.
    pub fn set_expiry(&self, index: usize, policy: ExpiryPolicy) -> Result<MemberRecord> {
        self.mutate(|records| {
            let record = records.get_mut(index).ok_or(Error::NotFound(index))?;
            record.expiry = policy;
            Ok(record.clone())
        })
    }

    /// Mark the record at `index` as removed by hand. The admin already
    /// handled the platform side out-of-band, so no client call is made.
    pub fn mark_manually_removed(&self, index: usize) -> Result<MemberRecord> {
        self.mutate(|records| {
            let record = records.get_mut(index).ok_or(Error::NotFound(index))?;
            record.status = MemberStatus::ManuallyRemoved;
            record.removed_at = Some(Utc::now());
            Ok(record.clone())
        })
    }

    /// Collect every active, non-exempt record whose retention ran out at
    /// `now`, advancing each one to `expired` before returning it.
    ///
    /// The status advance is the commit point: a record returned here is not
    /// returned by a later sweep unless it is reactivated first.
    pub fn find_expirable(
        &self,
        now: DateTime<Utc>,
        default_expiry: Duration,
    ) -> Result<Vec<MemberRecord>> {
        self.mutate(|records| {
            let mut due = Vec::new();
            for record in records.iter_mut() {
                if record.status == MemberStatus::Active && record.is_overdue(now, default_expiry) {
                    record.status = MemberStatus::Expired;
                    due.push(record.clone());
                }
            }
            Ok(due)
        })
    }

    /// Transition an `expired` record to `removed`.
    pub fn mark_removed(&self, group_id: &str, member_id: &str) -> Result<()> {
        self.transition_expired(group_id, member_id, |record| {
            record.status = MemberStatus::Removed;
            record.removed_at = Some(Utc::now());
        })
    }

    /// Transition an `expired` record to `failed`, recording the reason.
    pub fn mark_failed(&self, group_id: &str, member_id: &str, reason: &str) -> Result<()> {
        self.transition_expired(group_id, member_id, |record| {
            record.status = MemberStatus::Failed;
            record.failed_at = Some(Utc::now());
            record.fail_reason = Some(reason.to_string());
        })
    }

    /// Read-only snapshot of all records, in storage order.
    pub fn list(&self) -> Result<Vec<MemberRecord>> {
        let records = self.records.lock().map_err(|_| Error::LockPoisoned)?;
        Ok(records.clone())
    }

    /// Whether the pair has any record the engine still owns (anything but
    /// `manually_removed`). Used by participant sync to skip enrolled members.
    pub fn is_tracked(&self, group_id: &str, member_id: &str) -> bool {
        let Ok(records) = self.records.lock() else {
            return false;
        };
        records
            .iter()
            .any(|r| r.is_pair(group_id, member_id) && r.status != MemberStatus::ManuallyRemoved)
    }

    /// Guarded transition out of `expired`; any other current status is an
    /// `InvalidTransition` and the record stays untouched. This is what makes
    /// double-processing of a sweep batch harmless.
    fn transition_expired(
        &self,
        group_id: &str,
        member_id: &str,
        apply: impl FnOnce(&mut MemberRecord),
    ) -> Result<()> {
        self.mutate(|records| {
            let record = records
                .iter_mut()
                .find(|r| r.is_pair(group_id, member_id))
                .ok_or_else(|| Error::UnknownMember {
                    group_id: group_id.to_string(),
                    member_id: member_id.to_string(),
                })?;

            if record.status != MemberStatus::Expired {
                return Err(Error::InvalidTransition {
                    group_id: group_id.to_string(),
                    member_id: member_id.to_string(),
                    status: record.status,
                });
            }

            apply(record);
            Ok(())
        })
    }

    /// Run `op` against a working copy of the record set, persist, then
    /// commit. Errors from `op` or from the write leave the committed state
    /// exactly as it was.
    fn mutate<T>(&self, op: impl FnOnce(&mut Vec<MemberRecord>) -> Result<T>) -> Result<T> {
        let mut guard = self.records.lock().map_err(|_| Error::LockPoisoned)?;
        let mut working = guard.clone();
        let out = op(&mut working)?;
        persist(&self.path, &working)?;
        *guard = working;
        Ok(out)
    }
}

fn persist(path: &Path, records: &[MemberRecord]) -> Result<()> {
    let data = serde_json::to_vec_pretty(records)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
