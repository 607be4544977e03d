//! Participant sync endpoint.
//!
//! POST /api/sync enrolls every current participant of the target groups
//! that is not already tracked. Used after first pairing, when the engine
//! has no join history to go on.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use tenure_core::client::{ChatClient, ConnectionState};

use crate::routes::{api_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub total: usize,
    pub added: usize,
    pub skipped: usize,
    pub groups: Vec<GroupReport>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupReport {
    pub id: String,
    pub participants: usize,
    pub added: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn sync_participants(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SyncReport>, ApiError> {
    if state.client.connection_state() != ConnectionState::Ready {
        return Err(api_error(StatusCode::BAD_REQUEST, "chat client not ready"));
    }

    let mut report = SyncReport::default();

    for group_id in &state.config.target_groups {
        let mut group = GroupReport {
            id: group_id.clone(),
            participants: 0,
            added: 0,
            error: None,
        };

        match state.client.group_participants(group_id).await {
            Ok(participants) => {
                for raw_id in participants {
                    // Best-effort resolution, same fallback as the join path.
                    let member_id = state
                        .client
                        .resolve_identity(&raw_id)
                        .await
                        .unwrap_or(raw_id);

                    group.participants += 1;
                    report.total += 1;

                    if state.store.is_tracked(group_id, &member_id) {
                        report.skipped += 1;
                        continue;
                    }
                    match state.store.upsert(group_id, &member_id) {
                        Ok(_) => {
                            group.added += 1;
                            report.added += 1;
                        }
                        Err(err) => {
                            warn!(group_id = %group_id, member_id = %member_id, error = %err, "sync upsert failed");
                            group.error.get_or_insert_with(|| err.to_string());
                        }
                    }
                }
                info!(
                    group_id = %group_id,
                    added = group.added,
                    participants = group.participants,
                    "group synced"
                );
            }
            Err(err) => {
                warn!(group_id = %group_id, error = %err, "group sync failed");
                group.error = Some(err.to_string());
            }
        }

        report.groups.push(group);
    }

    Ok(Json(report))
}
