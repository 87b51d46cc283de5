// Database-backed write lock
// Mutual exclusion across instances via a unique lock_key row. Acquisition
// retries with jittered backoff until the timeout elapses; stale rows are
// reclaimed once their expiry passes.

use std::time::Duration;

use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::entity::write_lock;
use crate::error::ConfpackError;
use crate::model::common::now_millis;

const BACKOFF_BASE_MS: u64 = 50;
const BACKOFF_CAP_MS: u64 = 500;

pub struct LockGuard {
    pub key: String,
    pub token: String,
}

fn backoff_delay(attempt: u32) -> Duration {
    let base = BACKOFF_BASE_MS.saturating_mul(1 << attempt.min(4)).min(BACKOFF_CAP_MS);
    let jitter = rand::rng().random_range(0..BACKOFF_BASE_MS);
    Duration::from_millis(base + jitter)
}

/// Acquire the lock named `key`, waiting up to `timeout`. The returned guard
/// must be passed back to [`release`]; a crashed holder's row is reclaimable
/// after `ttl`.
pub async fn acquire(
    db: &DatabaseConnection,
    key: &str,
    ttl: Duration,
    timeout: Duration,
) -> anyhow::Result<LockGuard> {
    let deadline = tokio::time::Instant::now() + timeout;
    let token = Uuid::new_v4().to_string();
    let mut attempt: u32 = 0;

    loop {
        let now = now_millis();
        let reclaimed = write_lock::Entity::delete_many()
            .filter(write_lock::Column::LockKey.eq(key))
            .filter(write_lock::Column::ExpiresAt.lt(now))
            .exec(db)
            .await?;
        if reclaimed.rows_affected > 0 {
            warn!(%key, "reclaimed expired lock");
        }

        let row = write_lock::ActiveModel {
            lock_key: Set(key.to_string()),
            owner_token: Set(token.clone()),
            expires_at: Set(now + ttl.as_millis() as i64),
            ..Default::default()
        };
        match row.insert(db).await {
            Ok(_) => {
                debug!(%key, "lock acquired");
                return Ok(LockGuard {
                    key: key.to_string(),
                    token,
                });
            }
            Err(e) => {
                if tokio::time::Instant::now() >= deadline {
                    return Err(ConfpackError::Internal(format!(
                        "timed out acquiring lock '{}': {}",
                        key, e
                    ))
                    .into());
                }
                tokio::time::sleep(backoff_delay(attempt)).await;
                attempt = attempt.saturating_add(1);
            }
        }
    }
}

/// Release a held lock. Only the owning token's row is removed; an expired
/// and reclaimed lock releases as a no-op.
pub async fn release(db: &DatabaseConnection, guard: LockGuard) -> anyhow::Result<()> {
    let result = write_lock::Entity::delete_many()
        .filter(write_lock::Column::LockKey.eq(guard.key.as_str()))
        .filter(write_lock::Column::OwnerToken.eq(guard.token.as_str()))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        warn!(key = %guard.key, "lock was no longer held at release");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_and_stays_capped() {
        for attempt in 0..10 {
            let delay = backoff_delay(attempt).as_millis() as u64;
            assert!(delay >= BACKOFF_BASE_MS.saturating_mul(1 << attempt.min(4)).min(BACKOFF_CAP_MS));
            assert!(delay < BACKOFF_CAP_MS + BACKOFF_BASE_MS);
        }
    }
}
