//! # Candidate Slot Listing
//!
//! Read path for guests browsing an owner's bookable slots. Resolves the
//! owner and meeting type, loads the weekly rules plus every block and
//! confirmed booking intersecting the requested local-day range, runs the
//! slot generation engine, and finally drops slots starting inside the
//! lead-time buffer. The buffer is a listing-path courtesy; the reservation
//! handler re-checks it at commit time.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use std::sync::Arc;
use slotwise_core::{
    errors::SlotError,
    models::availability::AvailabilityRule,
    models::meeting_type::MeetingTypeSummary,
    models::slot::{DateRange, SlotsResponse, UtcRange},
    slots::{SlotQuery, generate_slots, local_day_start},
};

use crate::{ApiState, handlers::LEAD_TIME_MINUTES, middleware::error_handling::AppError};

/// Query parameters for the slot listing endpoint
#[derive(Debug, Deserialize)]
pub struct SlotRangeQuery {
    /// Inclusive range start, a plain YYYY-MM-DD date in the owner's timezone
    pub from: String,

    /// Inclusive range end, same format
    pub to: String,
}

#[axum::debug_handler]
pub async fn list_slots(
    State(state): State<Arc<ApiState>>,
    Path((owner_slug, meeting_type_slug)): Path<(String, String)>,
    Query(query): Query<SlotRangeQuery>,
) -> Result<Json<SlotsResponse>, AppError> {
    let from = parse_range_date(&query.from, "from")?;
    let to = parse_range_date(&query.to, "to")?;

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

    // UTC bounds of the owner's local days [from, to]; the engine excludes
    // precisely, so these only scope the storage reads.
    let range_start = local_day_start(tz, from)
        .ok_or_else(|| SlotError::Internal("Could not resolve range start".to_string().into()))?;
    let range_end = to
        .succ_opt()
        .and_then(|day_after| local_day_start(tz, day_after))
        .ok_or_else(|| SlotError::Internal("Could not resolve range end".to_string().into()))?;

    let rules = slotwise_db::repositories::availability::list_rules(&state.db_pool, owner.id)
        .await
        .map_err(SlotError::Database)?;
    let blocks = slotwise_db::repositories::availability::list_blocks_in_range(
        &state.db_pool,
        owner.id,
        range_start,
        range_end,
    )
    .await
    .map_err(SlotError::Database)?;
    let bookings = slotwise_db::repositories::booking::list_confirmed_in_range(
        &state.db_pool,
        owner.id,
        range_start,
        range_end,
    )
    .await
    .map_err(SlotError::Database)?;

    let rules: Vec<AvailabilityRule> = rules.iter().map(|r| r.to_rule()).collect();
    let blocks: Vec<UtcRange> = blocks.iter().map(|b| b.to_range()).collect();
    let bookings: Vec<UtcRange> = bookings.iter().map(|b| b.to_range()).collect();

    let slots = generate_slots(&SlotQuery {
        from: &query.from,
        to: &query.to,
        timezone: &owner.timezone,
        duration_minutes: i64::from(meeting_type.duration_minutes),
        rules: &rules,
        blocks: &blocks,
        bookings: &bookings,
    });

    // Lead-time buffer: slots starting in the next few minutes are not
    // realistically bookable
    let earliest_bookable = Utc::now() + Duration::minutes(LEAD_TIME_MINUTES);
    let slots = slots
        .into_iter()
        .filter(|slot| slot.starts_at >= earliest_bookable)
        .collect();

    Ok(Json(SlotsResponse {
        timezone: owner.timezone,
        meeting_type: MeetingTypeSummary {
            slug: meeting_type.slug,
            duration_minutes: meeting_type.duration_minutes,
        },
        range: DateRange {
            from: query.from,
            to: query.to,
        },
        slots,
    }))
}

pub(crate) fn parse_range_date(value: &str, field: &str) -> Result<NaiveDate, SlotError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| SlotError::Validation(format!("{field} must be YYYY-MM-DD")))
}

pub(crate) fn parse_owner_timezone(timezone: &str) -> Result<Tz, SlotError> {
    timezone.parse::<Tz>().map_err(|_| {
        SlotError::Internal(
            format!("Owner timezone {timezone} is not a valid IANA zone").into(),
        )
    })
}
