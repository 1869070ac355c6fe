use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subscription tier. Fixes the request ceiling applied to a key at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Pro,
    Enterprise,
}

impl Plan {
    /// Request ceiling a key on this plan starts with.
    pub fn request_limit(self) -> i64 {
        match self {
            Plan::Free => 200,
            Plan::Pro => 5_000,
            Plan::Enterprise => 50_000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Pro => "pro",
            Plan::Enterprise => "enterprise",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "free" => Some(Plan::Free),
            "pro" => Some(Plan::Pro),
            "enterprise" => Some(Plan::Enterprise),
            _ => None,
        }
    }
}

/// A registered developer account.
#[derive(Debug, Clone)]
pub struct User {
    /// UUIDv4, assigned at signup
    pub id: String,
    pub full_name: String,
    /// Unique, matched exactly as provided at signup
    pub email: String,
    /// Argon2 PHC string; the plaintext is never stored or logged
    pub password_hash: String,
    /// Opaque bearer token for the chat endpoint, generated once at signup
    pub api_key: String,
    pub plan: Plan,
    /// Lifetime counter; there is no reset, the key expires instead
    pub requests_used: i64,
    pub request_limit: i64,
    /// The key is usable until this instant
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Usage counters returned with every successful chat response.
#[derive(Debug, Clone, Serialize)]
pub struct UsageSnapshot {
    pub used: i64,
    pub limit: i64,
    pub plan: Plan,
}
