use crate::models::{DbAvailabilityBlock, DbAvailabilityRule};
use chrono::{DateTime, Utc};
use eyre::Result;
use slotwise_core::models::availability::AvailabilityRule;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

pub async fn list_rules(pool: &Pool<Postgres>, owner_id: Uuid) -> Result<Vec<DbAvailabilityRule>> {
    tracing::debug!("Listing availability rules for owner: {}", owner_id);

    let rules = sqlx::query_as::<_, DbAvailabilityRule>(
        r#"
        SELECT id, owner_id, day_of_week, start_minute, end_minute, enabled, created_at
        FROM availability_rules
        WHERE owner_id = $1
        ORDER BY day_of_week ASC, start_minute ASC
        "#,
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await?;

    Ok(rules)
}

/// Replace the owner's entire rule set. Delete and insert run in one
/// transaction; a partially replaced rule set is not a reachable state.
pub async fn replace_rules(
    pool: &Pool<Postgres>,
    owner_id: Uuid,
    rules: &[AvailabilityRule],
) -> Result<()> {
    tracing::debug!(
        "Replacing availability rules for owner {}: {} rows",
        owner_id,
        rules.len()
    );

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM availability_rules WHERE owner_id = $1")
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;

    for rule in rules {
        sqlx::query(
            r#"
            INSERT INTO availability_rules
                (id, owner_id, day_of_week, start_minute, end_minute, enabled, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(rule.day_of_week)
        .bind(rule.start_minute)
        .bind(rule.end_minute)
        .bind(rule.enabled)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(())
}

pub async fn create_block(
    pool: &Pool<Postgres>,
    owner_id: Uuid,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    reason: Option<&str>,
) -> Result<DbAvailabilityBlock> {
    let block = sqlx::query_as::<_, DbAvailabilityBlock>(
        r#"
        INSERT INTO availability_blocks (id, owner_id, starts_at, ends_at, reason, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, owner_id, starts_at, ends_at, reason, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(owner_id)
    .bind(starts_at)
    .bind(ends_at)
    .bind(reason)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(block)
}

/// Blocks whose half-open interval intersects `[from, to)`.
pub async fn list_blocks_in_range(
    pool: &Pool<Postgres>,
    owner_id: Uuid,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<DbAvailabilityBlock>> {
    let blocks = sqlx::query_as::<_, DbAvailabilityBlock>(
        r#"
        SELECT id, owner_id, starts_at, ends_at, reason, created_at
        FROM availability_blocks
        WHERE owner_id = $1 AND starts_at < $3 AND ends_at > $2
        ORDER BY starts_at ASC
        "#,
    )
    .bind(owner_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(blocks)
}
