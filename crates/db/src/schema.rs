use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Create owners table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS owners (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name VARCHAR(255) NOT NULL,
            slug VARCHAR(255) NOT NULL UNIQUE,
            email VARCHAR(255) NOT NULL,
            timezone VARCHAR(64) NOT NULL DEFAULT 'UTC',
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create meeting_types table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meeting_types (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            owner_id UUID NOT NULL REFERENCES owners(id),
            slug VARCHAR(255) NOT NULL,
            name VARCHAR(255) NOT NULL,
            duration_minutes INTEGER NOT NULL DEFAULT 30,
            location_value VARCHAR(255) NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT positive_duration CHECK (duration_minutes > 0),
            CONSTRAINT unique_owner_slug UNIQUE (owner_id, slug)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create availability_rules table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS availability_rules (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            owner_id UUID NOT NULL REFERENCES owners(id),
            day_of_week SMALLINT NOT NULL,
            start_minute INTEGER NOT NULL,
            end_minute INTEGER NOT NULL,
            enabled BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_day_of_week CHECK (day_of_week BETWEEN 0 AND 6),
            CONSTRAINT valid_minute_range CHECK (
                start_minute >= 0 AND end_minute <= 1440 AND start_minute < end_minute
            )
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create availability_blocks table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS availability_blocks (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            owner_id UUID NOT NULL REFERENCES owners(id),
            starts_at TIMESTAMP WITH TIME ZONE NOT NULL,
            ends_at TIMESTAMP WITH TIME ZONE NOT NULL,
            reason VARCHAR(255) NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_block_range CHECK (ends_at > starts_at)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create bookings table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bookings (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            owner_id UUID NOT NULL REFERENCES owners(id),
            meeting_type_id UUID NOT NULL REFERENCES meeting_types(id),
            guest_name VARCHAR(255) NOT NULL,
            guest_email VARCHAR(255) NOT NULL,
            starts_at TIMESTAMP WITH TIME ZONE NOT NULL,
            ends_at TIMESTAMP WITH TIME ZONE NOT NULL,
            status VARCHAR(16) NOT NULL DEFAULT 'CONFIRMED',
            cancel_token VARCHAR(64) NOT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            cancelled_at TIMESTAMP WITH TIME ZONE NULL,
            CONSTRAINT valid_booking_range CHECK (ends_at > starts_at),
            CONSTRAINT valid_status CHECK (status IN ('CONFIRMED', 'CANCELLED'))
        );
        "#,
    )
    .execute(pool)
    .await?;

    // The sole concurrency-control primitive: at most one CONFIRMED booking
    // per (owner, instant). Partial so a cancelled booking frees its slot.
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS uniq_confirmed_booking_start
            ON bookings(owner_id, starts_at)
            WHERE status = 'CONFIRMED';
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes (one statement per call; sqlx prepares each query)
    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_meeting_types_owner_id ON meeting_types(owner_id)",
        "CREATE INDEX IF NOT EXISTS idx_availability_rules_owner_id ON availability_rules(owner_id)",
        "CREATE INDEX IF NOT EXISTS idx_availability_blocks_owner_id ON availability_blocks(owner_id)",
        "CREATE INDEX IF NOT EXISTS idx_availability_blocks_starts_at ON availability_blocks(starts_at)",
        "CREATE INDEX IF NOT EXISTS idx_bookings_owner_id ON bookings(owner_id)",
        "CREATE INDEX IF NOT EXISTS idx_bookings_starts_at ON bookings(starts_at)",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Database schema initialized successfully.");
    Ok(())
}
