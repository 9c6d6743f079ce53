//! Remote Ledger Client
//!
//! `LedgerApi` is the seam between coordination logic and the remote ledger:
//! the HTTP implementation lives here, tests substitute mocks. All requests
//! carry a bearer token and a fixed timeout; rate-limit responses are
//! surfaced as their own error so callers can advise a retry window.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::error::{DEFAULT_COOLDOWN_SECS, LedgerError};
use super::types::{
    Account, AccountId, MutationEvent, MutationReceipt, MutationRequest, account_from_value,
    integer_from,
};
use crate::config::LedgerConfig;

/// The ledger's documented maximum history page size.
pub const MAX_HISTORY_PAGE: u32 = 100;

/// Clamp a caller-supplied history limit into the service's accepted range.
///
/// Out-of-range values are silently clamped, not rejected.
pub fn clamp_history_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_HISTORY_PAGE)
}

/// Typed contract over the remote ledger service.
///
/// Mutation submission is never retried by implementations; a retried debit
/// or credit could double-apply.
#[async_trait]
pub trait LedgerApi: Send + Sync {
    /// Resolve a caller-system identity to a ledger account.
    ///
    /// A lookup miss is a normal outcome, not an error. Single attempt.
    async fn find_account(&self, linked_identity: &str) -> Result<Option<Account>, LedgerError>;

    /// Fetch the raw player detail document.
    async fn fetch_details(&self, account_id: &AccountId) -> Result<Value, LedgerError>;

    /// Submit a signed-amount mutation. Exactly one attempt.
    async fn mutate(&self, request: &MutationRequest) -> Result<MutationReceipt, LedgerError>;

    /// Fetch a page of the account's transaction history.
    async fn fetch_history(
        &self,
        account_id: &AccountId,
        limit: u32,
        page: u32,
    ) -> Result<Vec<MutationEvent>, LedgerError>;

    /// Query the dedicated balance endpoints. `Ok(None)` when no endpoint
    /// yields a numeric value.
    async fn fetch_balance(&self, account_id: &AccountId) -> Result<Option<i64>, LedgerError>;
}

/// HTTP implementation of [`LedgerApi`].
pub struct HttpLedgerClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    /// Simulation mode: mutations make no network call and return a
    /// synthetic receipt labeled as simulated.
    simulate: bool,
}

impl HttpLedgerClient {
    pub fn new(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LedgerError::Remote(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
            simulate: config.simulate,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json(&self, path: &str) -> Result<Value, LedgerError> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| LedgerError::Remote(format!("GET {path}: {e}")))?;

        decode_response(response).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, LedgerError> {
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| LedgerError::Remote(format!("POST {path}: {e}")))?;

        decode_response(response).await
    }
}

#[async_trait]
impl LedgerApi for HttpLedgerClient {
    async fn find_account(&self, linked_identity: &str) -> Result<Option<Account>, LedgerError> {
        let body = json!({ "service_id": linked_identity });
        match self.post_json("players/find", &body).await {
            Ok(doc) => Ok(account_from_value(&doc)),
            Err(LedgerError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn fetch_details(&self, account_id: &AccountId) -> Result<Value, LedgerError> {
        // The detail route varies by deployment. Alternates are tried
        // strictly one after another; concurrent fan-out would amplify the
        // ledger's per-account rate limit.
        let shapes = [
            format!("player/{account_id}?include=stats"),
            format!("player/{account_id}"),
            format!("players/{account_id}"),
        ];

        let mut last_error = LedgerError::NotFound;
        for path in &shapes {
            match self.get_json(path).await {
                Ok(doc) => {
                    debug!(account_id = %account_id, path = %path, "fetched player details");
                    return Ok(doc);
                }
                Err(e) => {
                    debug!(account_id = %account_id, path = %path, error = %e, "detail request shape failed");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    async fn mutate(&self, request: &MutationRequest) -> Result<MutationReceipt, LedgerError> {
        if self.simulate {
            info!(
                account_id = %request.account_id,
                amount = request.amount,
                "simulated mutation (no ledger call)"
            );
            return Ok(MutationReceipt {
                account_id: request.account_id.clone(),
                amount: request.amount,
                description: request.description.clone(),
                simulated: true,
                created_at: chrono::Utc::now().timestamp_millis(),
            });
        }

        let body = json!({
            "amount": request.amount,
            "description": request.description,
        });
        let path = format!("player/{}/mutate-tokens", request.account_id);

        // One attempt only. Retrying here could double-apply the mutation.
        self.post_json(&path, &body).await?;

        info!(
            account_id = %request.account_id,
            amount = request.amount,
            "ledger mutation accepted"
        );
        Ok(MutationReceipt {
            account_id: request.account_id.clone(),
            amount: request.amount,
            description: request.description.clone(),
            simulated: false,
            created_at: chrono::Utc::now().timestamp_millis(),
        })
    }

    async fn fetch_history(
        &self,
        account_id: &AccountId,
        limit: u32,
        page: u32,
    ) -> Result<Vec<MutationEvent>, LedgerError> {
        let per_page = clamp_history_limit(limit);
        let path = format!("player/{account_id}/token-transactions?per_page={per_page}&page={page}");
        let doc = self.get_json(&path).await?;

        Ok(events_from_value(&doc))
    }

    async fn fetch_balance(&self, account_id: &AccountId) -> Result<Option<i64>, LedgerError> {
        for endpoint in ["token-balance", "balance"] {
            let path = format!("player/{account_id}/{endpoint}");
            match self.get_json(&path).await {
                Ok(doc) => {
                    if let Some(amount) = balance_from_value(&doc) {
                        debug!(account_id = %account_id, endpoint, amount, "balance endpoint hit");
                        return Ok(Some(amount));
                    }
                }
                Err(e) => {
                    debug!(account_id = %account_id, endpoint, error = %e, "balance endpoint failed");
                }
            }
        }
        Ok(None)
    }
}

/// Map an HTTP response into JSON or the error taxonomy.
async fn decode_response(response: reqwest::Response) -> Result<Value, LedgerError> {
    let status = response.status();

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(LedgerError::NotFound);
    }
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_COOLDOWN_SECS);
        return Err(LedgerError::RateLimited { retry_after_secs });
    }

    let body = response.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(LedgerError::Remote(remote_message(status.as_u16(), &body)));
    }
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&body)
        .map_err(|e| LedgerError::Remote(format!("invalid JSON from ledger: {e}")))
}

/// Extract a diagnostic message from a remote error payload when present.
fn remote_message(status: u16, body: &str) -> String {
    if let Ok(doc) = serde_json::from_str::<Value>(body) {
        for key in ["error", "message"] {
            if let Some(msg) = doc.get(key).and_then(|v| v.as_str()) {
                return format!("HTTP {status}: {msg}");
            }
        }
    }
    let snippet: String = body.chars().take(120).collect();
    if snippet.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {snippet}")
    }
}

/// Pull the event list out of a history response, which may be a bare array
/// or an envelope document.
fn events_from_value(doc: &Value) -> Vec<MutationEvent> {
    let entries = if let Some(list) = doc.as_array() {
        list
    } else if let Some(list) = doc
        .get("data")
        .or_else(|| doc.get("transactions"))
        .and_then(|v| v.as_array())
    {
        list
    } else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| match serde_json::from_value(entry.clone()) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(error = %e, "skipping undecodable history entry");
                None
            }
        })
        .collect()
}

/// Read a numeric balance out of a balance-endpoint response, which may be
/// a bare number or a document containing one.
fn balance_from_value(doc: &Value) -> Option<i64> {
    if let Some(n) = integer_from(doc) {
        return Some(n);
    }
    for key in ["balance", "tokens", "amount", "value"] {
        if let Some(n) = doc.get(key).and_then(integer_from) {
            return Some(n);
        }
    }
    None
}
