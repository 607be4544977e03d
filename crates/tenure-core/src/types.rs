//! Membership record data model.
//!
//! One `MemberRecord` per tracked (group, member) pair. Records are appended
//! to the store on first join and never physically deleted by the engine;
//! "removal" is a status change. The wire/persisted shape is camelCase JSON
//! with optional fields omitted, e.g.:
//!
//! ```json
//! {
//!   "groupId": "120363424613797548@g.us",
//!   "memberId": "77011234567@c.us",
//!   "joinedAt": "2026-08-01T10:15:00Z",
//!   "status": "active",
//!   "expiresAt": "2months"
//! }
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a tracked member.
///
/// `active → expired → {removed | failed}`, plus the administrative shortcut
/// `active → manually_removed`. Any state returns to `active` on rejoin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Active,
    Expired,
    Removed,
    Failed,
    ManuallyRemoved,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Active => "active",
            MemberStatus::Expired => "expired",
            MemberStatus::Removed => "removed",
            MemberStatus::Failed => "failed",
            MemberStatus::ManuallyRemoved => "manually_removed",
        }
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retention policy for a single record.
///
/// `Default` inherits the engine-wide retention duration and is omitted from
/// the persisted record. Unrecognized persisted values also deserialize to
/// `Default`, so a sweep falls back to the global duration rather than
/// rejecting the record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExpiryPolicy {
    #[serde(rename = "1month")]
    OneMonth,
    #[serde(rename = "2months")]
    TwoMonths,
    #[serde(rename = "3months")]
    ThreeMonths,
    #[serde(rename = "never")]
    Never,
    #[default]
    #[serde(other, rename = "default")]
    Default,
}

impl ExpiryPolicy {
    /// Retention duration under this policy; `None` means exempt from expiry.
    pub fn effective_duration(&self, default: Duration) -> Option<Duration> {
        match self {
            ExpiryPolicy::OneMonth => Some(Duration::days(30)),
            ExpiryPolicy::TwoMonths => Some(Duration::days(60)),
            ExpiryPolicy::ThreeMonths => Some(Duration::days(90)),
            ExpiryPolicy::Never => None,
            ExpiryPolicy::Default => Some(default),
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, ExpiryPolicy::Default)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpiryPolicy::OneMonth => "1month",
            ExpiryPolicy::TwoMonths => "2months",
            ExpiryPolicy::ThreeMonths => "3months",
            ExpiryPolicy::Never => "never",
            ExpiryPolicy::Default => "default",
        }
    }
}

impl fmt::Display for ExpiryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpiryPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "1month" => Ok(ExpiryPolicy::OneMonth),
            "2months" => Ok(ExpiryPolicy::TwoMonths),
            "3months" => Ok(ExpiryPolicy::ThreeMonths),
            "never" => Ok(ExpiryPolicy::Never),
            "default" => Ok(ExpiryPolicy::Default),
            other => Err(format!(
                "unknown expiry policy '{other}' (expected 1month, 2months, 3months, never or default)"
            )),
        }
    }
}

/// One tracked (group, member) relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRecord {
    pub group_id: String,
    pub member_id: String,
    /// Start of the current active period; reset on every reactivation.
    pub joined_at: DateTime<Utc>,
    pub status: MemberStatus,
    #[serde(
        default,
        rename = "expiresAt",
        skip_serializing_if = "ExpiryPolicy::is_default"
    )]
    pub expiry: ExpiryPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_reason: Option<String>,
}

impl MemberRecord {
    /// Fresh record for a first-time join.
    pub fn new(group_id: impl Into<String>, member_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            group_id: group_id.into(),
            member_id: member_id.into(),
            joined_at: now,
            status: MemberStatus::Active,
            expiry: ExpiryPolicy::Default,
            removed_at: None,
            failed_at: None,
            fail_reason: None,
        }
    }

    /// Reset back to active tracking on rejoin. Clears every terminal stamp
    /// and restarts the retention clock; the expiry policy is kept.
    pub fn reactivate(&mut self, now: DateTime<Utc>) {
        self.status = MemberStatus::Active;
        self.joined_at = now;
        self.removed_at = None;
        self.failed_at = None;
        self.fail_reason = None;
    }

    pub fn is_pair(&self, group_id: &str, member_id: &str) -> bool {
        self.group_id == group_id && self.member_id == member_id
    }

    /// Whether this record is overdue at `now` under `default_expiry`.
    pub fn is_overdue(&self, now: DateTime<Utc>, default_expiry: Duration) -> bool {
        match self.expiry.effective_duration(default_expiry) {
            Some(duration) => now - self.joined_at > duration,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_names() {
        let json = serde_json::to_string(&MemberStatus::ManuallyRemoved).unwrap();
        assert_eq!(json, "\"manually_removed\"");
        let status: MemberStatus = serde_json::from_str("\"expired\"").unwrap();
        assert_eq!(status, MemberStatus::Expired);
    }

    #[test]
    fn default_policy_is_omitted_from_wire() {
        let record = MemberRecord::new("g@g.us", "7700@c.us", Utc::now());
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("expiresAt").is_none());
        assert!(json.get("removedAt").is_none());
        assert_eq!(json["status"], "active");
    }

    #[test]
    fn named_policy_round_trips() {
        let mut record = MemberRecord::new("g@g.us", "7700@c.us", Utc::now());
        record.expiry = ExpiryPolicy::TwoMonths;
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["expiresAt"], "2months");
        let back: MemberRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back.expiry, ExpiryPolicy::TwoMonths);
    }

    #[test]
    fn unknown_policy_falls_back_to_default() {
        let json = serde_json::json!({
            "groupId": "g@g.us",
            "memberId": "7700@c.us",
            "joinedAt": "2026-08-01T10:15:00Z",
            "status": "active",
            "expiresAt": "2031-01-01T00:00:00Z"
        });
        let record: MemberRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.expiry, ExpiryPolicy::Default);
    }

    #[test]
    fn effective_duration_resolves_presets() {
        let default = Duration::days(7);
        assert_eq!(
            ExpiryPolicy::OneMonth.effective_duration(default),
            Some(Duration::days(30))
        );
        assert_eq!(
            ExpiryPolicy::Default.effective_duration(default),
            Some(default)
        );
        assert_eq!(ExpiryPolicy::Never.effective_duration(default), None);
    }

    #[test]
    fn reactivation_clears_terminal_stamps() {
        let t0 = Utc::now();
        let mut record = MemberRecord::new("g@g.us", "7700@c.us", t0);
        record.status = MemberStatus::Failed;
        record.failed_at = Some(t0);
        record.fail_reason = Some("rate limited".to_string());

        let t1 = t0 + Duration::minutes(5);
        record.reactivate(t1);

        assert_eq!(record.status, MemberStatus::Active);
        assert_eq!(record.joined_at, t1);
        assert!(record.failed_at.is_none());
        assert!(record.fail_reason.is_none());
    }
}
