//! API client for the tenure-server admin surface.

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use tenure_core::client::ClientStatus;
use tenure_core::types::{ExpiryPolicy, MemberStatus};

/// A tracked member as the admin API reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: usize,
    pub group_id: String,
    pub member_id: String,
    pub joined_at: chrono::DateTime<chrono::Utc>,
    pub status: MemberStatus,
    #[serde(default, rename = "expiresAt")]
    pub expiry: ExpiryPolicy,
    pub phone_number: String,
    pub raw_phone: String,
    #[serde(default)]
    pub fail_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub total: usize,
    pub added: usize,
    pub skipped: usize,
    pub groups: Vec<GroupReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupReport {
    pub id: String,
    pub participants: usize,
    pub added: usize,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Surface the server's JSON error body on non-2xx responses.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };
        bail!("server error ({status}): {message}")
    }

    pub async fn list_members(&self, search: Option<&str>) -> Result<Vec<Member>> {
        let mut request = self.client.get(self.url("/api/members"));
        if let Some(search) = search {
            request = request.query(&[("search", search)]);
        }
        let response = Self::check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    pub async fn set_policy(&self, id: usize, policy: &str) -> Result<Member> {
        let response = self
            .client
            .put(self.url(&format!("/api/members/{id}")))
            .json(&serde_json::json!({ "expiresAt": policy }))
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    pub async fn remove_member(&self, id: usize) -> Result<Member> {
        let response = self
            .client
            .delete(self.url(&format!("/api/members/{id}")))
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    pub async fn sync(&self) -> Result<SyncReport> {
        let response = self.client.post(self.url("/api/sync")).send().await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    pub async fn status(&self) -> Result<ClientStatus> {
        let response = self.client.get(self.url("/api/status")).send().await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }
}
