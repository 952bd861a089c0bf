//! # Booking Handlers
//!
//! The reservation protocol, the public booking page, and cancellation.
//!
//! ## Reservation
//!
//! A reservation request names an instant the guest saw in a slot listing.
//! That listing may be stale, so the handler re-reads the rules plus the
//! blocks and confirmed bookings of the single local calendar day containing
//! the requested instant, re-runs the slot engine scoped to that day, and
//! requires the requested start to exactly equal a generated slot. Two
//! concurrent requests for the same instant can both pass that check; the
//! partial unique index on (owner_id, starts_at) decides the winner at
//! insert time and the loser surfaces 409 Conflict. There is no retry loop:
//! the slot is gone either way.
//!
//! Confirmation delivery is best-effort. A notification failure is logged
//! and swallowed; booking durability never depends on it.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use std::sync::Arc;
use slotwise_core::{
    errors::{SlotError, SlotResult},
    models::availability::AvailabilityRule,
    models::booking::{
        BookingDetail, BookingResponse, BookingStatus, CancelBookingRequest,
        CancelBookingResponse, CreateBookingRequest, CreateBookingResponse, GetBookingResponse,
    },
    models::meeting_type::MeetingTypeDetail,
    models::owner::OwnerSummary,
    models::slot::UtcRange,
    slots::{SlotQuery, generate_slots, local_day_start},
};
use slotwise_db::models::{DbBooking, NewBooking};
use slotwise_db::repositories::booking::BookingInsert;
use uuid::Uuid;

use crate::{
    ApiState,
    handlers::LEAD_TIME_MINUTES,
    handlers::slots::parse_owner_timezone,
    middleware::error_handling::AppError,
    notify::{BookingNotification, ics::create_booking_ics},
};

#[axum::debug_handler]
pub async fn create_booking(
    State(state): State<Arc<ApiState>>,
    Path((owner_slug, meeting_type_slug)): Path<(String, String)>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<Json<CreateBookingResponse>, AppError> {
    if payload.guest_name.trim().is_empty() {
        return Err(AppError(SlotError::Validation(
            "guestName is required".to_string(),
        )));
    }
    if payload.guest_email.trim().is_empty() {
        return Err(AppError(SlotError::Validation(
            "guestEmail is required".to_string(),
        )));
    }

    let requested_start = DateTime::parse_from_rfc3339(&payload.starts_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            SlotError::Validation("startsAt must be a valid ISO date string".to_string())
        })?;

    let owner = slotwise_db::repositories::owner::get_owner_by_slug(&state.db_pool, &owner_slug)
        .await
        .map_err(SlotError::Database)?
        .ok_or_else(|| SlotError::NotFound("Owner not found".to_string()))?;

    let meeting_type = slotwise_db::repositories::meeting_type::get_meeting_type_by_slug(
        &state.db_pool,
        owner.id,
        &meeting_type_slug,
    )
    .await
    .map_err(SlotError::Database)?
    .ok_or_else(|| SlotError::NotFound("Meeting type not found".to_string()))?;

    let tz = parse_owner_timezone(&owner.timezone)?;
    let duration_minutes = i64::from(meeting_type.duration_minutes);
    let requested_end = requested_start + Duration::minutes(duration_minutes);

    // The lead-time buffer applies at commit time too, so a slot cannot be
    // booked after it has slipped inside the buffer between listing and
    // submitting.
    if requested_start < Utc::now() + Duration::minutes(LEAD_TIME_MINUTES) {
        return Err(AppError(SlotError::SlotUnavailable(
            "Slot is not available".to_string(),
        )));
    }

    // Narrow re-read: only the single local day containing the requested
    // instant, freshly loaded.
    let local_day = requested_start.with_timezone(&tz).date_naive();
    let day = local_day.format("%Y-%m-%d").to_string();
    let day_start = local_day_start(tz, local_day)
        .ok_or_else(|| SlotError::Internal("Could not resolve day start".to_string().into()))?;
    let day_end = local_day
        .succ_opt()
        .and_then(|next| local_day_start(tz, next))
        .ok_or_else(|| SlotError::Internal("Could not resolve day end".to_string().into()))?;

    let rules = slotwise_db::repositories::availability::list_rules(&state.db_pool, owner.id)
        .await
        .map_err(SlotError::Database)?;
    let blocks = slotwise_db::repositories::availability::list_blocks_in_range(
        &state.db_pool,
        owner.id,
        day_start,
        day_end,
    )
    .await
    .map_err(SlotError::Database)?;
    let bookings = slotwise_db::repositories::booking::list_confirmed_in_range(
        &state.db_pool,
        owner.id,
        day_start,
        day_end,
    )
    .await
    .map_err(SlotError::Database)?;

    let rules: Vec<AvailabilityRule> = rules.iter().map(|r| r.to_rule()).collect();
    let blocks: Vec<UtcRange> = blocks.iter().map(|b| b.to_range()).collect();
    let bookings: Vec<UtcRange> = bookings.iter().map(|b| b.to_range()).collect();

    let slots = generate_slots(&SlotQuery {
        from: &day,
        to: &day,
        timezone: &owner.timezone,
        duration_minutes,
        rules: &rules,
        blocks: &blocks,
        bookings: &bookings,
    });

    // Exact match only: the requested instant must be a currently
    // generatable slot start, with no tolerance window.
    if !slots.iter().any(|slot| slot.starts_at == requested_start) {
        return Err(AppError(SlotError::SlotUnavailable(
            "Slot is not available".to_string(),
        )));
    }

    let new_booking = NewBooking {
        owner_id: owner.id,
        meeting_type_id: meeting_type.id,
        guest_name: payload.guest_name.clone(),
        guest_email: payload.guest_email.clone(),
        starts_at: requested_start,
        ends_at: requested_end,
        cancel_token: generate_cancel_token(),
    };

    // The unique index is the sole arbiter of the race from here on
    let inserted = slotwise_db::repositories::booking::insert_booking(&state.db_pool, &new_booking)
        .await
        .map_err(SlotError::Database)?;

    let booking = match inserted {
        BookingInsert::Created(booking) => booking,
        BookingInsert::SlotTaken => {
            return Err(AppError(SlotError::Conflict(
                "Slot already booked".to_string(),
            )));
        }
    };

    // Best-effort notifications; never rolled back into the booking outcome
    let cancel_url = format!(
        "{}/booking/{}/cancel?token={}",
        state.public_base_url, booking.id, booking.cancel_token
    );
    let ics = create_booking_ics(
        booking.id,
        &format!("Call with {}", owner.name),
        &format!("Meeting type: {}", meeting_type.slug),
        booking.starts_at,
        booking.ends_at,
    );
    let notification = BookingNotification {
        guest_name: booking.guest_name.clone(),
        guest_email: booking.guest_email.clone(),
        owner_name: owner.name.clone(),
        owner_email: owner.email.clone(),
        meeting_type_slug: meeting_type.slug.clone(),
        starts_at: booking.starts_at,
        ends_at: booking.ends_at,
        cancel_url,
        ics,
    };
    if let Err(err) = state.notifier.booking_confirmed(&notification).await {
        tracing::error!(
            "Failed to send booking notifications for {}: {:#}",
            booking.id,
            err
        );
    }

    Ok(Json(CreateBookingResponse {
        booking: to_booking_response(&booking)?,
    }))
}

#[axum::debug_handler]
pub async fn get_booking(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<GetBookingResponse>, AppError> {
    let booking = slotwise_db::repositories::booking::get_booking_by_id(&state.db_pool, id)
        .await
        .map_err(SlotError::Database)?
        .ok_or_else(|| SlotError::NotFound("Booking not found".to_string()))?;

    let owner = slotwise_db::repositories::owner::get_owner_by_id(&state.db_pool, booking.owner_id)
        .await
        .map_err(SlotError::Database)?
        .ok_or_else(|| SlotError::NotFound("Booking owner not found".to_string()))?;

    let meeting_type = slotwise_db::repositories::meeting_type::get_meeting_type_by_id(
        &state.db_pool,
        booking.meeting_type_id,
    )
    .await
    .map_err(SlotError::Database)?
    .ok_or_else(|| SlotError::NotFound("Booking meeting type not found".to_string()))?;

    let detail = BookingDetail {
        id: booking.id,
        status: parse_status(&booking)?,
        starts_at: booking.starts_at,
        ends_at: booking.ends_at,
        created_at: booking.created_at,
        guest_name: booking.guest_name,
        guest_email: booking.guest_email,
        owner: OwnerSummary {
            slug: owner.slug,
            name: owner.name,
            timezone: owner.timezone,
        },
        meeting_type: MeetingTypeDetail {
            slug: meeting_type.slug,
            name: meeting_type.name,
            duration_minutes: meeting_type.duration_minutes,
            location_value: meeting_type.location_value,
        },
    };

    Ok(Json(GetBookingResponse { booking: detail }))
}

#[axum::debug_handler]
pub async fn cancel_booking(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CancelBookingRequest>,
) -> Result<Json<CancelBookingResponse>, AppError> {
    if payload.token.is_empty() {
        return Err(AppError(SlotError::Validation(
            "token is required".to_string(),
        )));
    }

    let booking = slotwise_db::repositories::booking::get_booking_by_id(&state.db_pool, id)
        .await
        .map_err(SlotError::Database)?
        .ok_or_else(|| SlotError::NotFound("Booking not found".to_string()))?;

    if booking.cancel_token != payload.token {
        return Err(AppError(SlotError::InvalidToken(
            "Invalid cancel token".to_string(),
        )));
    }

    // Idempotent: cancelling an already-cancelled booking succeeds with no
    // second transition
    if booking.status == BookingStatus::Cancelled.as_str() {
        return Ok(Json(CancelBookingResponse { ok: true }));
    }

    slotwise_db::repositories::booking::cancel_booking(&state.db_pool, booking.id, Utc::now())
        .await
        .map_err(SlotError::Database)?;

    Ok(Json(CancelBookingResponse { ok: true }))
}

/// 32 random bytes, hex-encoded: the guest's possession token for
/// cancellation.
fn generate_cancel_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

fn parse_status(booking: &DbBooking) -> SlotResult<BookingStatus> {
    BookingStatus::parse(&booking.status).ok_or_else(|| {
        SlotError::Internal(
            format!("Booking {} has unknown status {}", booking.id, booking.status).into(),
        )
    })
}

fn to_booking_response(booking: &DbBooking) -> SlotResult<BookingResponse> {
    Ok(BookingResponse {
        id: booking.id,
        starts_at: booking.starts_at,
        ends_at: booking.ends_at,
        guest_name: booking.guest_name.clone(),
        guest_email: booking.guest_email.clone(),
        status: parse_status(booking)?,
    })
}
