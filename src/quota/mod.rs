use std::sync::Arc;

use chrono::Utc;

use crate::models::user::{UsageSnapshot, User};
use crate::store::{StoreError, UserStore};

/// Eligibility of a key at a single instant. Nothing is persisted; the
/// status is derived fresh from the user row on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    Valid,
    Expired,
    Exhausted,
}

impl KeyStatus {
    /// Expiry takes precedence: a key that is both expired and out of quota
    /// reports as expired.
    pub fn of(user: &User) -> Self {
        if Utc::now() > user.expires_at {
            KeyStatus::Expired
        } else if user.requests_used >= user.request_limit {
            KeyStatus::Exhausted
        } else {
            KeyStatus::Valid
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QuotaError {
    #[error("API key expired")]
    Expired,
    #[error("Usage limit reached. Upgrade plan.")]
    LimitReached,
    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

/// Gates chat requests against key expiry and plan quotas.
pub struct QuotaEnforcer {
    store: Arc<UserStore>,
}

impl QuotaEnforcer {
    pub fn new(store: Arc<UserStore>) -> Self {
        Self { store }
    }

    /// Pre-check a user's key and hand out the right to spend one unit.
    ///
    /// Nothing is charged here. The caller performs the upstream work and
    /// then calls [`Reservation::commit`], so a failed authorization never
    /// costs a unit and an upstream call is never made for an ineligible
    /// key.
    pub fn authorize_and_reserve(&self, user: &User) -> Result<Reservation, QuotaError> {
        match KeyStatus::of(user) {
            KeyStatus::Expired => Err(QuotaError::Expired),
            KeyStatus::Exhausted => Err(QuotaError::LimitReached),
            KeyStatus::Valid => Ok(Reservation {
                store: Arc::clone(&self.store),
                user_id: user.id.clone(),
            }),
        }
    }
}

/// Pre-approved, not-yet-charged permission to spend one usage unit.
///
/// Dropping a reservation without committing costs nothing.
#[must_use]
pub struct Reservation {
    store: Arc<UserStore>,
    user_id: String,
}

impl Reservation {
    /// Charge the unit. The store applies the increment only while
    /// `requests_used < request_limit`, so a reservation that raced another
    /// request past the same pre-check comes back as `LimitReached` instead
    /// of overrunning the cap.
    pub fn commit(self) -> Result<UsageSnapshot, QuotaError> {
        match self.store.try_charge(&self.user_id)? {
            Some(snapshot) => Ok(snapshot),
            None => Err(QuotaError::LimitReached),
        }
    }
}
