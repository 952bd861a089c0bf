use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mockall::predicate;
use pretty_assertions::assert_eq;
use slotwise_api::handlers::LEAD_TIME_MINUTES;
use slotwise_api::middleware::error_handling::AppError;
use slotwise_api::notify::{BookingNotification, Notifier};
use slotwise_core::errors::SlotError;
use slotwise_core::models::availability::AvailabilityRule;
use slotwise_core::models::booking::{
    BookingResponse, BookingStatus, CancelBookingRequest, CancelBookingResponse,
    CreateBookingRequest,
};
use slotwise_core::models::slot::UtcRange;
use slotwise_core::slots::{SlotQuery, generate_slots, local_day_start};
use slotwise_db::models::NewBooking;
use slotwise_db::repositories::booking::BookingInsert;
use uuid::Uuid;

use crate::test_utils::{TestContext, db_booking, db_rule, sample_meeting_type, sample_owner, utc};

/// A notifier whose delivery always fails; reservations must succeed anyway.
struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn booking_confirmed(&self, _notification: &BookingNotification) -> eyre::Result<()> {
        Err(eyre::eyre!("smtp transport down"))
    }
}

/// Mirrors the reservation protocol in `handlers::booking::create_booking`
/// against mock repositories: validate input, narrow re-read of the
/// requested instant's local day, engine re-run, exact-match check, commit,
/// best-effort notification.
async fn test_reserve_wrapper(
    ctx: &TestContext,
    notifier: &dyn Notifier,
    owner_slug: &str,
    meeting_type_slug: &str,
    payload: CreateBookingRequest,
) -> Result<BookingResponse, AppError> {
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
            AppError(SlotError::Validation(
                "startsAt must be a valid ISO date string".to_string(),
            ))
        })?;

    let owner = ctx
        .owner_repo
        .get_owner_by_slug(owner_slug.to_string())
        .await?
        .ok_or_else(|| AppError(SlotError::NotFound("Owner not found".to_string())))?;

    let meeting_type = ctx
        .meeting_type_repo
        .get_meeting_type_by_slug(owner.id, meeting_type_slug.to_string())
        .await?
        .ok_or_else(|| AppError(SlotError::NotFound("Meeting type not found".to_string())))?;

    let tz: chrono_tz::Tz = owner.timezone.parse().expect("valid timezone in test data");
    let duration_minutes = i64::from(meeting_type.duration_minutes);

    if requested_start < Utc::now() + Duration::minutes(LEAD_TIME_MINUTES) {
        return Err(AppError(SlotError::SlotUnavailable(
            "Slot is not available".to_string(),
        )));
    }

    let local_day = requested_start.with_timezone(&tz).date_naive();
    let day = local_day.format("%Y-%m-%d").to_string();
    let day_start = local_day_start(tz, local_day).expect("resolvable day start");
    let day_end = local_day
        .succ_opt()
        .and_then(|next| local_day_start(tz, next))
        .expect("resolvable day end");

    let rules = ctx.availability_repo.list_rules(owner.id).await?;
    let blocks = ctx
        .availability_repo
        .list_blocks_in_range(owner.id, day_start, day_end)
        .await?;
    let bookings = ctx
        .booking_repo
        .list_confirmed_in_range(owner.id, day_start, day_end)
        .await?;

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

    if !slots.iter().any(|slot| slot.starts_at == requested_start) {
        return Err(AppError(SlotError::SlotUnavailable(
            "Slot is not available".to_string(),
        )));
    }

    let inserted = ctx
        .booking_repo
        .insert_booking(NewBooking {
            owner_id: owner.id,
            meeting_type_id: meeting_type.id,
            guest_name: payload.guest_name.clone(),
            guest_email: payload.guest_email.clone(),
            starts_at: requested_start,
            ends_at: requested_start + Duration::minutes(duration_minutes),
            cancel_token: "a-cancel-token".to_string(),
        })
        .await?;

    let booking = match inserted {
        BookingInsert::Created(booking) => booking,
        BookingInsert::SlotTaken => {
            return Err(AppError(SlotError::Conflict(
                "Slot already booked".to_string(),
            )));
        }
    };

    // Best-effort, exactly like the handler: a delivery failure is swallowed
    let notification = BookingNotification {
        guest_name: booking.guest_name.clone(),
        guest_email: booking.guest_email.clone(),
        owner_name: owner.name.clone(),
        owner_email: owner.email.clone(),
        meeting_type_slug: meeting_type.slug.clone(),
        starts_at: booking.starts_at,
        ends_at: booking.ends_at,
        cancel_url: format!("http://localhost:3000/booking/{}/cancel", booking.id),
        ics: String::new(),
    };
    let _ = notifier.booking_confirmed(&notification).await;

    let status = BookingStatus::parse(&booking.status).expect("known status");
    Ok(BookingResponse {
        id: booking.id,
        starts_at: booking.starts_at,
        ends_at: booking.ends_at,
        guest_name: booking.guest_name,
        guest_email: booking.guest_email,
        status,
    })
}

/// Mirrors `handlers::booking::cancel_booking` against mock repositories.
async fn test_cancel_wrapper(
    ctx: &TestContext,
    id: Uuid,
    payload: CancelBookingRequest,
) -> Result<CancelBookingResponse, AppError> {
    if payload.token.is_empty() {
        return Err(AppError(SlotError::Validation(
            "token is required".to_string(),
        )));
    }

    let booking = ctx
        .booking_repo
        .get_booking_by_id(id)
        .await?
        .ok_or_else(|| AppError(SlotError::NotFound("Booking not found".to_string())))?;

    if booking.cancel_token != payload.token {
        return Err(AppError(SlotError::InvalidToken(
            "Invalid cancel token".to_string(),
        )));
    }

    if booking.status == BookingStatus::Cancelled.as_str() {
        return Ok(CancelBookingResponse { ok: true });
    }

    ctx.booking_repo.cancel_booking(booking.id, Utc::now()).await?;

    Ok(CancelBookingResponse { ok: true })
}

fn booking_request(starts_at: &str) -> CreateBookingRequest {
    CreateBookingRequest {
        starts_at: starts_at.to_string(),
        guest_name: "Ada".to_string(),
        guest_email: "ada@example.com".to_string(),
    }
}

// 2030-01-07 is a Monday, comfortably past any lead-time buffer.

#[tokio::test]
async fn test_reserve_commits_exactly_matching_slot() {
    let mut ctx = TestContext::new();
    let owner = sample_owner("UTC");
    let meeting_type = sample_meeting_type(owner.id, 30);
    let owner_id = owner.id;
    let meeting_type_id = meeting_type.id;

    let rules = vec![db_rule(owner_id, 1, 9 * 60, 10 * 60)];

    {
        let owner = owner.clone();
        ctx.owner_repo
            .expect_get_owner_by_slug()
            .with(predicate::eq("martin".to_string()))
            .returning(move |_| Ok(Some(owner.clone())));
    }
    {
        let meeting_type = meeting_type.clone();
        ctx.meeting_type_repo
            .expect_get_meeting_type_by_slug()
            .with(predicate::eq(owner_id), predicate::eq("30min".to_string()))
            .returning(move |_, _| Ok(Some(meeting_type.clone())));
    }
    ctx.availability_repo
        .expect_list_rules()
        .returning(move |_| Ok(rules.clone()));
    ctx.availability_repo
        .expect_list_blocks_in_range()
        .returning(|_, _, _| Ok(vec![]));
    ctx.booking_repo
        .expect_list_confirmed_in_range()
        .returning(|_, _, _| Ok(vec![]));

    let expected_start = utc(2030, 1, 7, 9, 0);
    ctx.booking_repo
        .expect_insert_booking()
        .withf(move |booking: &NewBooking| {
            booking.owner_id == owner_id && booking.starts_at == expected_start
        })
        .times(1)
        .returning(move |booking| {
            Ok(BookingInsert::Created(db_booking(
                booking.owner_id,
                meeting_type_id,
                booking.starts_at,
                booking.ends_at,
                "CONFIRMED",
                &booking.cancel_token,
            )))
        });

    let response = test_reserve_wrapper(
        &ctx,
        &slotwise_api::notify::LogNotifier,
        "martin",
        "30min",
        booking_request("2030-01-07T09:00:00.000Z"),
    )
    .await
    .expect("reservation should commit");

    assert_eq!(response.starts_at, expected_start);
    assert_eq!(response.ends_at, utc(2030, 1, 7, 9, 30));
    assert_eq!(response.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn test_reserve_rejects_instant_off_the_slot_grid() {
    let mut ctx = TestContext::new();
    let owner = sample_owner("UTC");
    let meeting_type = sample_meeting_type(owner.id, 30);
    let owner_id = owner.id;

    let rules = vec![db_rule(owner_id, 1, 9 * 60, 10 * 60)];

    {
        let owner = owner.clone();
        ctx.owner_repo
            .expect_get_owner_by_slug()
            .returning(move |_| Ok(Some(owner.clone())));
    }
    {
        let meeting_type = meeting_type.clone();
        ctx.meeting_type_repo
            .expect_get_meeting_type_by_slug()
            .returning(move |_, _| Ok(Some(meeting_type.clone())));
    }
    ctx.availability_repo
        .expect_list_rules()
        .returning(move |_| Ok(rules.clone()));
    ctx.availability_repo
        .expect_list_blocks_in_range()
        .returning(|_, _, _| Ok(vec![]));
    ctx.booking_repo
        .expect_list_confirmed_in_range()
        .returning(|_, _, _| Ok(vec![]));
    // No insert expectation: an off-grid request must never reach commit

    let error = test_reserve_wrapper(
        &ctx,
        &slotwise_api::notify::LogNotifier,
        "martin",
        "30min",
        booking_request("2030-01-07T09:05:00.000Z"),
    )
    .await
    .expect_err("9:05 is not a generated slot start");

    assert!(matches!(error.0, SlotError::SlotUnavailable(_)));
}

#[tokio::test]
async fn test_reserve_maps_lost_race_to_conflict() {
    let mut ctx = TestContext::new();
    let owner = sample_owner("UTC");
    let meeting_type = sample_meeting_type(owner.id, 30);
    let owner_id = owner.id;

    let rules = vec![db_rule(owner_id, 1, 9 * 60, 10 * 60)];

    {
        let owner = owner.clone();
        ctx.owner_repo
            .expect_get_owner_by_slug()
            .returning(move |_| Ok(Some(owner.clone())));
    }
    {
        let meeting_type = meeting_type.clone();
        ctx.meeting_type_repo
            .expect_get_meeting_type_by_slug()
            .returning(move |_, _| Ok(Some(meeting_type.clone())));
    }
    ctx.availability_repo
        .expect_list_rules()
        .returning(move |_| Ok(rules.clone()));
    ctx.availability_repo
        .expect_list_blocks_in_range()
        .returning(|_, _, _| Ok(vec![]));
    ctx.booking_repo
        .expect_list_confirmed_in_range()
        .returning(|_, _, _| Ok(vec![]));

    // Both racers passed revalidation; the storage constraint picks this
    // request as the loser
    ctx.booking_repo
        .expect_insert_booking()
        .times(1)
        .returning(|_| Ok(BookingInsert::SlotTaken));

    let error = test_reserve_wrapper(
        &ctx,
        &slotwise_api::notify::LogNotifier,
        "martin",
        "30min",
        booking_request("2030-01-07T09:00:00.000Z"),
    )
    .await
    .expect_err("lost race must surface a conflict");

    assert!(matches!(error.0, SlotError::Conflict(_)));
}

#[tokio::test]
async fn test_reserve_excludes_already_booked_instant() {
    let mut ctx = TestContext::new();
    let owner = sample_owner("UTC");
    let meeting_type = sample_meeting_type(owner.id, 30);
    let owner_id = owner.id;
    let meeting_type_id = meeting_type.id;

    let rules = vec![db_rule(owner_id, 1, 9 * 60, 10 * 60)];
    let existing = db_booking(
        owner_id,
        meeting_type_id,
        utc(2030, 1, 7, 9, 0),
        utc(2030, 1, 7, 9, 30),
        "CONFIRMED",
        "someone-elses-token",
    );

    {
        let owner = owner.clone();
        ctx.owner_repo
            .expect_get_owner_by_slug()
            .returning(move |_| Ok(Some(owner.clone())));
    }
    {
        let meeting_type = meeting_type.clone();
        ctx.meeting_type_repo
            .expect_get_meeting_type_by_slug()
            .returning(move |_, _| Ok(Some(meeting_type.clone())));
    }
    ctx.availability_repo
        .expect_list_rules()
        .returning(move |_| Ok(rules.clone()));
    ctx.availability_repo
        .expect_list_blocks_in_range()
        .returning(|_, _, _| Ok(vec![]));
    ctx.booking_repo
        .expect_list_confirmed_in_range()
        .returning(move |_, _, _| Ok(vec![existing.clone()]));

    let error = test_reserve_wrapper(
        &ctx,
        &slotwise_api::notify::LogNotifier,
        "martin",
        "30min",
        booking_request("2030-01-07T09:00:00.000Z"),
    )
    .await
    .expect_err("booked instant is no longer generatable");

    assert!(matches!(error.0, SlotError::SlotUnavailable(_)));
}

#[tokio::test]
async fn test_reserve_rejects_instant_inside_lead_time_buffer() {
    let mut ctx = TestContext::new();
    let owner = sample_owner("UTC");
    let meeting_type = sample_meeting_type(owner.id, 30);

    {
        let owner = owner.clone();
        ctx.owner_repo
            .expect_get_owner_by_slug()
            .returning(move |_| Ok(Some(owner.clone())));
    }
    {
        let meeting_type = meeting_type.clone();
        ctx.meeting_type_repo
            .expect_get_meeting_type_by_slug()
            .returning(move |_, _| Ok(Some(meeting_type.clone())));
    }
    // No rule/block/booking reads: the buffer check short-circuits first

    let error = test_reserve_wrapper(
        &ctx,
        &slotwise_api::notify::LogNotifier,
        "martin",
        "30min",
        booking_request("2020-01-06T09:00:00.000Z"),
    )
    .await
    .expect_err("past instant sits inside the lead-time buffer");

    assert!(matches!(error.0, SlotError::SlotUnavailable(_)));
}

#[tokio::test]
async fn test_reserve_validates_guest_fields_and_instant() {
    let ctx = TestContext::new();

    let mut missing_name = booking_request("2030-01-07T09:00:00.000Z");
    missing_name.guest_name = "  ".to_string();
    let error = test_reserve_wrapper(
        &ctx,
        &slotwise_api::notify::LogNotifier,
        "martin",
        "30min",
        missing_name,
    )
    .await
    .expect_err("blank guest name");
    assert!(matches!(error.0, SlotError::Validation(_)));

    let error = test_reserve_wrapper(
        &ctx,
        &slotwise_api::notify::LogNotifier,
        "martin",
        "30min",
        booking_request("next tuesday"),
    )
    .await
    .expect_err("unparseable instant");
    assert!(matches!(error.0, SlotError::Validation(_)));
}

#[tokio::test]
async fn test_reserve_survives_notification_failure() {
    let mut ctx = TestContext::new();
    let owner = sample_owner("UTC");
    let meeting_type = sample_meeting_type(owner.id, 30);
    let owner_id = owner.id;
    let meeting_type_id = meeting_type.id;

    let rules = vec![db_rule(owner_id, 1, 9 * 60, 10 * 60)];

    {
        let owner = owner.clone();
        ctx.owner_repo
            .expect_get_owner_by_slug()
            .returning(move |_| Ok(Some(owner.clone())));
    }
    {
        let meeting_type = meeting_type.clone();
        ctx.meeting_type_repo
            .expect_get_meeting_type_by_slug()
            .returning(move |_, _| Ok(Some(meeting_type.clone())));
    }
    ctx.availability_repo
        .expect_list_rules()
        .returning(move |_| Ok(rules.clone()));
    ctx.availability_repo
        .expect_list_blocks_in_range()
        .returning(|_, _, _| Ok(vec![]));
    ctx.booking_repo
        .expect_list_confirmed_in_range()
        .returning(|_, _, _| Ok(vec![]));
    ctx.booking_repo
        .expect_insert_booking()
        .times(1)
        .returning(move |booking| {
            Ok(BookingInsert::Created(db_booking(
                booking.owner_id,
                meeting_type_id,
                booking.starts_at,
                booking.ends_at,
                "CONFIRMED",
                &booking.cancel_token,
            )))
        });

    // Delivery fails, the booking still stands
    let response = test_reserve_wrapper(
        &ctx,
        &FailingNotifier,
        "martin",
        "30min",
        booking_request("2030-01-07T09:00:00.000Z"),
    )
    .await
    .expect("booking durability must not depend on notification delivery");

    assert_eq!(response.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn test_cancel_transitions_confirmed_booking() {
    let mut ctx = TestContext::new();
    let owner_id = Uuid::new_v4();
    let booking = db_booking(
        owner_id,
        Uuid::new_v4(),
        utc(2030, 1, 7, 9, 0),
        utc(2030, 1, 7, 9, 30),
        "CONFIRMED",
        "valid-token",
    );
    let booking_id = booking.id;

    {
        let booking = booking.clone();
        ctx.booking_repo
            .expect_get_booking_by_id()
            .with(predicate::eq(booking_id))
            .returning(move |_| Ok(Some(booking.clone())));
    }
    {
        let booking = booking.clone();
        ctx.booking_repo
            .expect_cancel_booking()
            .with(predicate::eq(booking_id), predicate::always())
            .times(1)
            .returning(move |_, cancelled_at| {
                let mut cancelled = booking.clone();
                cancelled.status = "CANCELLED".to_string();
                cancelled.cancelled_at = Some(cancelled_at);
                Ok(cancelled)
            });
    }

    let response = test_cancel_wrapper(
        &ctx,
        booking_id,
        CancelBookingRequest {
            token: "valid-token".to_string(),
        },
    )
    .await
    .expect("cancellation should succeed");

    assert_eq!(response, CancelBookingResponse { ok: true });
}

#[tokio::test]
async fn test_cancel_is_idempotent_for_cancelled_booking() {
    let mut ctx = TestContext::new();
    let booking = db_booking(
        Uuid::new_v4(),
        Uuid::new_v4(),
        utc(2030, 1, 7, 9, 0),
        utc(2030, 1, 7, 9, 30),
        "CANCELLED",
        "valid-token",
    );
    let booking_id = booking.id;

    ctx.booking_repo
        .expect_get_booking_by_id()
        .returning(move |_| Ok(Some(booking.clone())));
    // No cancel_booking expectation: a second cancel performs no transition

    let response = test_cancel_wrapper(
        &ctx,
        booking_id,
        CancelBookingRequest {
            token: "valid-token".to_string(),
        },
    )
    .await
    .expect("second cancel still succeeds");

    assert_eq!(response, CancelBookingResponse { ok: true });
}

#[tokio::test]
async fn test_cancel_rejects_wrong_token() {
    let mut ctx = TestContext::new();
    let booking = db_booking(
        Uuid::new_v4(),
        Uuid::new_v4(),
        utc(2030, 1, 7, 9, 0),
        utc(2030, 1, 7, 9, 30),
        "CONFIRMED",
        "valid-token",
    );
    let booking_id = booking.id;

    ctx.booking_repo
        .expect_get_booking_by_id()
        .returning(move |_| Ok(Some(booking.clone())));

    let error = test_cancel_wrapper(
        &ctx,
        booking_id,
        CancelBookingRequest {
            token: "stolen-guess".to_string(),
        },
    )
    .await
    .expect_err("wrong token must not cancel");

    assert!(matches!(error.0, SlotError::InvalidToken(_)));
}

#[tokio::test]
async fn test_cancel_missing_booking_is_not_found() {
    let mut ctx = TestContext::new();

    ctx.booking_repo
        .expect_get_booking_by_id()
        .returning(|_| Ok(None));

    let error = test_cancel_wrapper(
        &ctx,
        Uuid::new_v4(),
        CancelBookingRequest {
            token: "valid-token".to_string(),
        },
    )
    .await
    .expect_err("unknown booking id");

    assert!(matches!(error.0, SlotError::NotFound(_)));
}

#[tokio::test]
async fn test_cancel_requires_token() {
    let ctx = TestContext::new();

    let error = test_cancel_wrapper(
        &ctx,
        Uuid::new_v4(),
        CancelBookingRequest {
            token: String::new(),
        },
    )
    .await
    .expect_err("empty token");

    assert!(matches!(error.0, SlotError::Validation(_)));
}
