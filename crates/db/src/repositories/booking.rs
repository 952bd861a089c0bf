use crate::models::{DbBooking, NewBooking};
use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

/// Outcome of a booking commit. The unique index on (owner_id, starts_at)
/// for CONFIRMED rows is the sole arbiter of a race between two guests;
/// the loser gets `SlotTaken`, never an overwrite.
#[derive(Debug)]
pub enum BookingInsert {
    Created(DbBooking),
    SlotTaken,
}

pub async fn insert_booking(pool: &Pool<Postgres>, booking: &NewBooking) -> Result<BookingInsert> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    tracing::debug!(
        "Inserting booking: id={}, owner_id={}, starts_at={}",
        id,
        booking.owner_id,
        booking.starts_at
    );

    let inserted = sqlx::query_as::<_, DbBooking>(
        r#"
        INSERT INTO bookings
            (id, owner_id, meeting_type_id, guest_name, guest_email,
             starts_at, ends_at, status, cancel_token, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'CONFIRMED', $8, $9)
        RETURNING id, owner_id, meeting_type_id, guest_name, guest_email,
                  starts_at, ends_at, status, cancel_token, created_at, cancelled_at
        "#,
    )
    .bind(id)
    .bind(booking.owner_id)
    .bind(booking.meeting_type_id)
    .bind(&booking.guest_name)
    .bind(&booking.guest_email)
    .bind(booking.starts_at)
    .bind(booking.ends_at)
    .bind(&booking.cancel_token)
    .bind(now)
    .fetch_one(pool)
    .await;

    match inserted {
        Ok(row) => Ok(BookingInsert::Created(row)),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            tracing::debug!("Booking insert lost the race for {}", booking.starts_at);
            Ok(BookingInsert::SlotTaken)
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn get_booking_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbBooking>> {
    tracing::debug!("Getting booking by id: {}", id);

    let booking = sqlx::query_as::<_, DbBooking>(
        r#"
        SELECT id, owner_id, meeting_type_id, guest_name, guest_email,
               starts_at, ends_at, status, cancel_token, created_at, cancelled_at
        FROM bookings
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(booking)
}

/// Confirmed bookings whose half-open interval intersects `[from, to)`.
pub async fn list_confirmed_in_range(
    pool: &Pool<Postgres>,
    owner_id: Uuid,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<DbBooking>> {
    let bookings = sqlx::query_as::<_, DbBooking>(
        r#"
        SELECT id, owner_id, meeting_type_id, guest_name, guest_email,
               starts_at, ends_at, status, cancel_token, created_at, cancelled_at
        FROM bookings
        WHERE owner_id = $1 AND status = 'CONFIRMED' AND starts_at < $3 AND ends_at > $2
        ORDER BY starts_at ASC
        "#,
    )
    .bind(owner_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(bookings)
}

/// One-way CONFIRMED -> CANCELLED transition.
pub async fn cancel_booking(
    pool: &Pool<Postgres>,
    id: Uuid,
    cancelled_at: DateTime<Utc>,
) -> Result<DbBooking> {
    let booking = sqlx::query_as::<_, DbBooking>(
        r#"
        UPDATE bookings
        SET status = 'CANCELLED', cancelled_at = $2
        WHERE id = $1
        RETURNING id, owner_id, meeting_type_id, guest_name, guest_email,
                  starts_at, ends_at, status, cancel_token, created_at, cancelled_at
        "#,
    )
    .bind(id)
    .bind(cancelled_at)
    .fetch_one(pool)
    .await?;

    Ok(booking)
}
