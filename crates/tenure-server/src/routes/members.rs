//! Membership admin routes.
//!
//! - GET /api/members - List tracked members, optional search
//! - PUT /api/members/{id} - Update a record's expiry policy
//! - DELETE /api/members/{id} - Mark a record manually removed

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use tenure_core::identity;
use tenure_core::types::{ExpiryPolicy, MemberRecord};

use crate::routes::{api_error, core_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemberRequest {
    /// Expiry policy name: `1month`, `2months`, `3months`, `never`, `default`.
    pub expires_at: String,
}

/// A record enriched for the admin surface: its index in the store plus
/// display-formatted identity.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    pub id: usize,
    #[serde(flatten)]
    pub record: MemberRecord,
    pub phone_number: String,
    pub raw_phone: String,
}

impl MemberView {
    fn new(id: usize, record: MemberRecord) -> Self {
        Self {
            id,
            phone_number: identity::display_id(&record.member_id),
            raw_phone: identity::raw_phone(&record.member_id)
                .unwrap_or_default()
                .to_string(),
            record,
        }
    }

    fn matches(&self, query: &str) -> bool {
        self.raw_phone.contains(query) || self.phone_number.to_lowercase().contains(query)
    }
}

pub async fn list_members(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<MemberView>>, ApiError> {
    let records = state.store.list().map_err(core_error)?;
    let mut views: Vec<MemberView> = records
        .into_iter()
        .enumerate()
        .map(|(id, record)| MemberView::new(id, record))
        .collect();

    if let Some(search) = query.search.filter(|s| !s.is_empty()) {
        let needle = search.to_lowercase();
        views.retain(|v| v.matches(&needle));
    }

    Ok(Json(views))
}

pub async fn update_member(
    State(state): State<Arc<AppState>>,
    Path(id): Path<usize>,
    Json(body): Json<UpdateMemberRequest>,
) -> Result<Json<MemberView>, ApiError> {
    let policy: ExpiryPolicy = body
        .expires_at
        .parse()
        .map_err(|e: String| api_error(StatusCode::BAD_REQUEST, e))?;

    let record = state.store.set_expiry(id, policy).map_err(core_error)?;
    Ok(Json(MemberView::new(id, record)))
}

pub async fn delete_member(
    State(state): State<Arc<AppState>>,
    Path(id): Path<usize>,
) -> Result<Json<MemberView>, ApiError> {
    let record = state.store.mark_manually_removed(id).map_err(core_error)?;
    Ok(Json(MemberView::new(id, record)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn view_enriches_with_display_identity() {
        let record = MemberRecord::new("g@g.us", "77011234567@c.us", Utc::now());
        let view = MemberView::new(3, record);
        assert_eq!(view.id, 3);
        assert_eq!(view.phone_number, "+7 (701) 123-45-67");
        assert_eq!(view.raw_phone, "77011234567");
    }

    #[test]
    fn search_matches_raw_and_formatted() {
        let record = MemberRecord::new("g@g.us", "77011234567@c.us", Utc::now());
        let view = MemberView::new(0, record);
        assert!(view.matches("7701123"));
        assert!(view.matches("(701) 123"));
        assert!(!view.matches("5555"));
    }

    #[test]
    fn view_serializes_flat() {
        let record = MemberRecord::new("g@g.us", "77011234567@c.us", Utc::now());
        let json = serde_json::to_value(MemberView::new(0, record)).unwrap();
        assert_eq!(json["groupId"], "g@g.us");
        assert_eq!(json["phoneNumber"], "+7 (701) 123-45-67");
        assert_eq!(json["status"], "active");
    }
}
