use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::user::{Plan, UsageSnapshot, User};

/// How long a freshly issued key stays valid.
const KEY_TTL_DAYS: i64 = 30;

/// SQLite-backed credential store.
///
/// The single connection behind a mutex is also the write-serialization
/// point: every statement runs alone, so the conditional increment in
/// [`UserStore::try_charge`] can never interleave with a racing one.
pub struct UserStore {
    conn: Mutex<Connection>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Email already exists")]
    DuplicateEmail,
}

impl UserStore {
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        // Parse sqlite: prefix if present
        let path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);

        // Create parent directories if needed (":memory:" has none)
        if let Some(parent) = Path::new(path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
        {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
        }

        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                full_name TEXT NOT NULL DEFAULT '',
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                api_key TEXT NOT NULL UNIQUE,
                plan TEXT NOT NULL,
                requests_used INTEGER NOT NULL DEFAULT 0,
                request_limit INTEGER NOT NULL,
                expires_at TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::info!("User store initialized with database: {}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Create a user with a fresh API key and a 30-day expiry.
    ///
    /// The unique index on `email` is the only duplicate check; a lost
    /// signup race surfaces as [`StoreError::DuplicateEmail`] instead of a
    /// second row.
    pub fn create_user(
        &self,
        full_name: &str,
        email: &str,
        password_hash: &str,
        plan: Plan,
    ) -> Result<User, StoreError> {
        let conn = self.lock()?;
        let now = Utc::now();

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            full_name: full_name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            api_key: generate_api_key(),
            plan,
            requests_used: 0,
            request_limit: plan.request_limit(),
            expires_at: now + Duration::days(KEY_TTL_DAYS),
            created_at: now,
        };

        let inserted = conn.execute(
            "INSERT INTO users (id, full_name, email, password_hash, api_key, plan,
                                requests_used, request_limit, expires_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                user.id,
                user.full_name,
                user.email,
                user.password_hash,
                user.api_key,
                user.plan.as_str(),
                user.requests_used,
                user.request_limit,
                user.expires_at.to_rfc3339(),
                user.created_at.to_rfc3339(),
            ],
        );

        match inserted {
            Ok(_) => {
                tracing::info!(user_id = %user.id, email = %user.email, "created user");
                Ok(user)
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::DuplicateEmail)
            }
            Err(e) => Err(StoreError::Database(e.to_string())),
        }
    }

    /// Exact-match lookup by API key. Read-only.
    pub fn find_by_api_key(&self, api_key: &str) -> Result<Option<User>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, full_name, email, password_hash, api_key, plan,
                    requests_used, request_limit, expires_at, created_at
             FROM users WHERE api_key = ?1",
            params![api_key],
            user_from_row,
        )
        .optional()
        .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Exact-match lookup by email. Read-only.
    pub fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, full_name, email, password_hash, api_key, plan,
                    requests_used, request_limit, expires_at, created_at
             FROM users WHERE email = ?1",
            params![email],
            user_from_row,
        )
        .optional()
        .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Atomically spend one unit of quota.
    ///
    /// A single conditional UPDATE: the increment applies only while
    /// `requests_used < request_limit`, so two requests that both passed a
    /// stale pre-check cannot jointly overrun the ceiling. `None` means the
    /// increment was not applied.
    pub fn try_charge(&self, user_id: &str) -> Result<Option<UsageSnapshot>, StoreError> {
        let conn = self.lock()?;

        let applied = conn
            .execute(
                "UPDATE users SET requests_used = requests_used + 1
                 WHERE id = ?1 AND requests_used < request_limit",
                params![user_id],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        if applied == 0 {
            return Ok(None);
        }

        let snapshot = conn
            .query_row(
                "SELECT requests_used, request_limit, plan FROM users WHERE id = ?1",
                params![user_id],
                |row| {
                    Ok(UsageSnapshot {
                        used: row.get(0)?,
                        limit: row.get(1)?,
                        plan: plan_from_name(&row.get::<_, String>(2)?),
                    })
                },
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Some(snapshot))
    }

    /// Overwrite a key's expiry. The renewal operation acts through this.
    pub fn set_expires_at(
        &self,
        api_key: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let updated = conn
            .execute(
                "UPDATE users SET expires_at = ?1 WHERE api_key = ?2",
                params![expires_at.to_rfc3339(), api_key],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(updated > 0)
    }

    /// Move a key to another plan, taking on that plan's request ceiling.
    /// `requests_used` is left untouched. The upgrade operation acts
    /// through this.
    pub fn update_plan(&self, api_key: &str, plan: Plan) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let updated = conn
            .execute(
                "UPDATE users SET plan = ?1, request_limit = ?2 WHERE api_key = ?3",
                params![plan.as_str(), plan.request_limit(), api_key],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(updated > 0)
    }

    pub(crate) fn set_request_limit(&self, api_key: &str, limit: i64) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let updated = conn
            .execute(
                "UPDATE users SET request_limit = ?1 WHERE api_key = ?2",
                params![limit, api_key],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(updated > 0)
    }
}

/// 16 random bytes as lowercase hex, the key format issued at signup.
fn generate_api_key() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn plan_from_name(name: &str) -> Plan {
    Plan::from_name(name).unwrap_or(Plan::Free)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let now = Utc::now();
    let parse = |s: String| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(now)
    };
    Ok(User {
        id: row.get(0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        api_key: row.get(4)?,
        plan: plan_from_name(&row.get::<_, String>(5)?),
        requests_used: row.get(6)?,
        request_limit: row.get(7)?,
        expires_at: parse(row.get(8)?),
        created_at: parse(row.get(9)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn memory_store() -> UserStore {
        UserStore::new(":memory:").unwrap()
    }

    fn sample_user(store: &UserStore, email: &str) -> User {
        store
            .create_user("Ama Serwaa", email, "argon2-phc-string", Plan::Free)
            .unwrap()
    }

    #[test]
    fn create_assigns_key_and_defaults() {
        let store = memory_store();
        let user = sample_user(&store, "ama@example.com");

        assert!(uuid::Uuid::parse_str(&user.id).is_ok());
        assert_eq!(user.api_key.len(), 32);
        assert!(user.api_key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(user.requests_used, 0);
        assert_eq!(user.request_limit, 200);
        assert_eq!(user.plan, Plan::Free);
        assert!(user.expires_at > user.created_at);
    }

    #[test]
    fn api_keys_are_unique_per_user() {
        let store = memory_store();
        let first = sample_user(&store, "one@example.com");
        let second = sample_user(&store, "two@example.com");
        assert_ne!(first.api_key, second.api_key);
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let store = memory_store();
        sample_user(&store, "ama@example.com");
        let err = store
            .create_user("Kofi Mensah", "ama@example.com", "other-hash", Plan::Free)
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[test]
    fn find_by_api_key_is_exact_match() {
        let store = memory_store();
        let user = sample_user(&store, "ama@example.com");

        let found = store.find_by_api_key(&user.api_key).unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.email, user.email);

        assert!(store
            .find_by_api_key(&user.api_key.to_uppercase())
            .unwrap()
            .is_none());
        assert!(store.find_by_api_key("deadbeef").unwrap().is_none());
    }

    #[test]
    fn find_by_email_is_case_sensitive() {
        let store = memory_store();
        sample_user(&store, "Ama@example.com");
        assert!(store.find_by_email("Ama@example.com").unwrap().is_some());
        assert!(store.find_by_email("ama@example.com").unwrap().is_none());
    }

    #[test]
    fn try_charge_counts_up_to_the_limit() {
        let store = memory_store();
        let user = sample_user(&store, "ama@example.com");
        store.set_request_limit(&user.api_key, 3).unwrap();

        for expected in 1..=3 {
            let snapshot = store.try_charge(&user.id).unwrap().unwrap();
            assert_eq!(snapshot.used, expected);
            assert_eq!(snapshot.limit, 3);
        }

        assert!(store.try_charge(&user.id).unwrap().is_none());
        let row = store.find_by_api_key(&user.api_key).unwrap().unwrap();
        assert_eq!(row.requests_used, 3);
    }

    #[test]
    fn free_plan_exhausts_at_two_hundred() {
        let store = memory_store();
        let user = sample_user(&store, "ama@example.com");

        for expected in 1..=200 {
            let snapshot = store.try_charge(&user.id).unwrap().unwrap();
            assert_eq!(snapshot.used, expected);
        }
        assert!(store.try_charge(&user.id).unwrap().is_none());
    }

    #[test]
    fn concurrent_charges_stop_at_the_limit() {
        let store = Arc::new(memory_store());
        let user = sample_user(&store, "ama@example.com");
        store.set_request_limit(&user.api_key, 5).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let user_id = user.id.clone();
                std::thread::spawn(move || store.try_charge(&user_id).unwrap().is_some())
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&ok| ok)
            .count();

        assert_eq!(successes, 5);
        let row = store.find_by_api_key(&user.api_key).unwrap().unwrap();
        assert_eq!(row.requests_used, 5);
    }

    #[test]
    fn update_plan_raises_the_ceiling() {
        let store = memory_store();
        let user = sample_user(&store, "ama@example.com");
        store.try_charge(&user.id).unwrap().unwrap();

        assert!(store.update_plan(&user.api_key, Plan::Pro).unwrap());

        let row = store.find_by_api_key(&user.api_key).unwrap().unwrap();
        assert_eq!(row.plan, Plan::Pro);
        assert_eq!(row.request_limit, 5_000);
        assert_eq!(row.requests_used, 1);
    }

    #[test]
    fn set_expires_at_overwrites_the_expiry() {
        let store = memory_store();
        let user = sample_user(&store, "ama@example.com");

        let past = Utc::now() - Duration::days(1);
        assert!(store.set_expires_at(&user.api_key, past).unwrap());
        assert!(!store.set_expires_at("deadbeef", past).unwrap());

        let row = store.find_by_api_key(&user.api_key).unwrap().unwrap();
        assert!(row.expires_at < Utc::now());
    }

    #[test]
    fn survives_reopen_with_sqlite_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}/nested/users.db", dir.path().display());

        let api_key = {
            let store = UserStore::new(&url).unwrap();
            sample_user(&store, "ama@example.com").api_key
        };

        let reopened = UserStore::new(&url).unwrap();
        let found = reopened.find_by_api_key(&api_key).unwrap().unwrap();
        assert_eq!(found.email, "ama@example.com");
    }
}
