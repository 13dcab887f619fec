//! Slack Web API client for the `users.*` read methods.
//!
//! The Web API answers HTTP 200 for most failures and reports them in the
//! `{"ok": false, "error": "<code>"}` envelope.

use std::collections::HashSet;
use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::errors::SlackError;
use crate::models::ResolvedMember;

/// Error code `users.lookupByEmail` returns when nobody has the address.
const USERS_NOT_FOUND: &str = "users_not_found";

/// Page size requested from `users.list`.
const LIST_PAGE_LIMIT: &str = "200";

/// A member object as returned by `users.list` / `users.lookupByEmail`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackMember {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub profile: SlackProfile,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlackProfile {
    pub email: Option<String>,
    pub real_name: Option<String>,
}

impl SlackMember {
    pub fn email(&self) -> Option<&str> {
        self.profile.email.as_deref()
    }

    pub fn to_resolved(&self, email: &str) -> ResolvedMember {
        ResolvedMember {
            member_id: self.id.clone(),
            username: self.name.clone(),
            email: email.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    ok: bool,
    error: Option<String>,
    user: Option<SlackMember>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    ok: bool,
    error: Option<String>,
    #[serde(default)]
    members: Vec<SlackMember>,
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    next_cursor: Option<String>,
}

/// Asynchronous Slack Web API client.
#[derive(Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl SlackClient {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Result<Self, SlackError> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .user_agent("slackauthor/0.1")
            .build()?;
        info!(api_url = %api_url, "created SlackClient");
        Ok(Self {
            http,
            api_url,
            token: token.into(),
        })
    }

    /// `users.lookupByEmail`: `Ok(None)` when no member has the address.
    #[instrument(skip(self))]
    pub async fn lookup_by_email(&self, email: &str) -> Result<Option<SlackMember>, SlackError> {
        let url = format!("{}/users.lookupByEmail", self.api_url);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("email", email)])
            .send()
            .await?;
        let body: LookupResponse = read_json(resp).await?;
        interpret_lookup(body)
    }

    /// One page of `users.list`. Returns the members and the next cursor.
    #[instrument(skip(self))]
    pub async fn list_members_page(
        &self,
        cursor: Option<&str>,
    ) -> Result<(Vec<SlackMember>, Option<String>), SlackError> {
        let url = format!("{}/users.list", self.api_url);
        let mut req = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("limit", LIST_PAGE_LIMIT)]);
        if let Some(cursor) = cursor {
            req = req.query(&[("cursor", cursor)]);
        }
        let resp = req.send().await?;
        let body: ListResponse = read_json(resp).await?;
        interpret_list(body)
    }

    /// Every page of `users.list`, following `next_cursor` until it is empty.
    pub async fn list_all_members(&self) -> Result<Vec<SlackMember>, SlackError> {
        let members =
            collect_pages(|cursor| async move { self.list_members_page(cursor.as_deref()).await })
                .await?;
        debug!(count = members.len(), "fetched Slack member listing");
        Ok(members)
    }
}

/// Drive a cursor-paginated listing to the end. A cursor that was already
/// requested ends the walk, so a misbehaving server cannot loop it.
async fn collect_pages<F, Fut>(mut fetch_page: F) -> Result<Vec<SlackMember>, SlackError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<(Vec<SlackMember>, Option<String>), SlackError>>,
{
    let mut members = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor: Option<String> = None;
    loop {
        let (page, next) = fetch_page(cursor.take()).await?;
        members.extend(page);
        match next {
            Some(next) if seen.insert(next.clone()) => cursor = Some(next),
            Some(next) => {
                warn!(cursor = %next, "users.list repeated a cursor, stopping");
                break;
            }
            None => break,
        }
    }
    Ok(members)
}

async fn read_json<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T, SlackError> {
    let status = resp.status();
    if status.as_u16() == 429 {
        let retry_after = resp
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();
        return Err(SlackError::RateLimited { retry_after });
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        warn!(status = %status, body = %body, "Slack API returned error status");
        return Err(SlackError::Status {
            status: status.as_u16(),
            body,
        });
    }
    resp.json::<T>()
        .await
        .map_err(|e| SlackError::ParseError(e.to_string()))
}

fn interpret_lookup(body: LookupResponse) -> Result<Option<SlackMember>, SlackError> {
    if !body.ok {
        let code = body.error.unwrap_or_else(|| "unknown_error".into());
        if code == USERS_NOT_FOUND {
            return Ok(None);
        }
        return Err(SlackError::Api { code });
    }
    match body.user {
        Some(user) => Ok(Some(user)),
        None => Err(SlackError::ParseError(
            "users.lookupByEmail returned ok without a user".into(),
        )),
    }
}

fn interpret_list(body: ListResponse) -> Result<(Vec<SlackMember>, Option<String>), SlackError> {
    if !body.ok {
        return Err(SlackError::Api {
            code: body.error.unwrap_or_else(|| "unknown_error".into()),
        });
    }
    let next = body
        .response_metadata
        .and_then(|m| m.next_cursor)
        .filter(|c| !c.is_empty());
    Ok((body.members, next))
}
