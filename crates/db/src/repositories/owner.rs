use crate::models::DbOwner;
use chrono::Utc;
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

pub async fn create_owner(
    pool: &Pool<Postgres>,
    name: &str,
    slug: &str,
    email: &str,
    timezone: &str,
) -> Result<DbOwner> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    tracing::debug!("Creating owner: id={}, slug={}, timezone={}", id, slug, timezone);

    let owner = sqlx::query_as::<_, DbOwner>(
        r#"
        INSERT INTO owners (id, name, slug, email, timezone, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, name, slug, email, timezone, created_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(slug)
    .bind(email)
    .bind(timezone)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(owner)
}

/// Insert-or-update keyed on slug; used by the seed binary.
pub async fn upsert_owner(
    pool: &Pool<Postgres>,
    name: &str,
    slug: &str,
    email: &str,
    timezone: &str,
) -> Result<DbOwner> {
    let owner = sqlx::query_as::<_, DbOwner>(
        r#"
        INSERT INTO owners (id, name, slug, email, timezone, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (slug) DO UPDATE
        SET name = EXCLUDED.name, email = EXCLUDED.email, timezone = EXCLUDED.timezone
        RETURNING id, name, slug, email, timezone, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(slug)
    .bind(email)
    .bind(timezone)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(owner)
}

pub async fn get_owner_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbOwner>> {
    tracing::debug!("Getting owner by id: {}", id);

    let owner = sqlx::query_as::<_, DbOwner>(
        r#"
        SELECT id, name, slug, email, timezone, created_at
        FROM owners
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(owner)
}

pub async fn get_owner_by_slug(pool: &Pool<Postgres>, slug: &str) -> Result<Option<DbOwner>> {
    tracing::debug!("Getting owner by slug: {}", slug);

    let owner = sqlx::query_as::<_, DbOwner>(
        r#"
        SELECT id, name, slug, email, timezone, created_at
        FROM owners
        WHERE slug = $1
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(owner)
}
