use crate::models::DbMeetingType;
use chrono::Utc;
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

pub async fn create_meeting_type(
    pool: &Pool<Postgres>,
    owner_id: Uuid,
    slug: &str,
    name: &str,
    duration_minutes: i32,
    location_value: Option<&str>,
) -> Result<DbMeetingType> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    tracing::debug!(
        "Creating meeting type: id={}, owner_id={}, slug={}, duration={}",
        id,
        owner_id,
        slug,
        duration_minutes
    );

    let meeting_type = sqlx::query_as::<_, DbMeetingType>(
        r#"
        INSERT INTO meeting_types (id, owner_id, slug, name, duration_minutes, location_value, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, owner_id, slug, name, duration_minutes, location_value, created_at
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .bind(slug)
    .bind(name)
    .bind(duration_minutes)
    .bind(location_value)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(meeting_type)
}

/// Insert-or-update keyed on (owner, slug); used by the seed binary.
pub async fn upsert_meeting_type(
    pool: &Pool<Postgres>,
    owner_id: Uuid,
    slug: &str,
    name: &str,
    duration_minutes: i32,
    location_value: Option<&str>,
) -> Result<DbMeetingType> {
    let meeting_type = sqlx::query_as::<_, DbMeetingType>(
        r#"
        INSERT INTO meeting_types (id, owner_id, slug, name, duration_minutes, location_value, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (owner_id, slug) DO UPDATE
        SET name = EXCLUDED.name,
            duration_minutes = EXCLUDED.duration_minutes,
            location_value = EXCLUDED.location_value
        RETURNING id, owner_id, slug, name, duration_minutes, location_value, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(owner_id)
    .bind(slug)
    .bind(name)
    .bind(duration_minutes)
    .bind(location_value)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(meeting_type)
}

pub async fn get_meeting_type_by_slug(
    pool: &Pool<Postgres>,
    owner_id: Uuid,
    slug: &str,
) -> Result<Option<DbMeetingType>> {
    tracing::debug!("Getting meeting type: owner_id={}, slug={}", owner_id, slug);

    let meeting_type = sqlx::query_as::<_, DbMeetingType>(
        r#"
        SELECT id, owner_id, slug, name, duration_minutes, location_value, created_at
        FROM meeting_types
        WHERE owner_id = $1 AND slug = $2
        "#,
    )
    .bind(owner_id)
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(meeting_type)
}

pub async fn get_meeting_type_by_id(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<DbMeetingType>> {
    let meeting_type = sqlx::query_as::<_, DbMeetingType>(
        r#"
        SELECT id, owner_id, slug, name, duration_minutes, location_value, created_at
        FROM meeting_types
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(meeting_type)
}
