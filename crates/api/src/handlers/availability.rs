//! # Availability Handlers
//!
//! Handlers for reading and replacing an owner's weekly availability model.
//!
//! The weekly model is edited as a whole: the client submits every day with
//! its enabled flag and "HH:MM" ranges, the validator flattens it into rule
//! rows, and the owner's entire rule set is replaced atomically
//! (delete-then-insert in one transaction). There is no partial-edit path;
//! a day's rules only ever change together.

use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;
use slotwise_core::{
    errors::SlotError,
    models::availability::{AvailabilityRule, WeeklySchedule},
    validate::validate_weekly,
};
use uuid::Uuid;

use crate::{ApiState, middleware::error_handling::AppError};

#[axum::debug_handler]
pub async fn get_weekly(
    State(state): State<Arc<ApiState>>,
    Path(owner_id): Path<Uuid>,
) -> Result<Json<WeeklySchedule>, AppError> {
    // Ensure the owner exists before reporting an empty schedule
    slotwise_db::repositories::owner::get_owner_by_id(&state.db_pool, owner_id)
        .await
        .map_err(SlotError::Database)?
        .ok_or_else(|| SlotError::NotFound(format!("Owner with ID {} not found", owner_id)))?;

    let rules = slotwise_db::repositories::availability::list_rules(&state.db_pool, owner_id)
        .await
        .map_err(SlotError::Database)?;

    let rules: Vec<AvailabilityRule> = rules.iter().map(|r| r.to_rule()).collect();

    Ok(Json(WeeklySchedule::from_rules(&rules)))
}

#[axum::debug_handler]
pub async fn replace_weekly(
    State(state): State<Arc<ApiState>>,
    Path(owner_id): Path<Uuid>,
    Json(payload): Json<WeeklySchedule>,
) -> Result<Json<WeeklySchedule>, AppError> {
    // Reject before touching storage; an invalid day fails the whole replace
    let rows = validate_weekly(&payload)?;

    slotwise_db::repositories::owner::get_owner_by_id(&state.db_pool, owner_id)
        .await
        .map_err(SlotError::Database)?
        .ok_or_else(|| SlotError::NotFound(format!("Owner with ID {} not found", owner_id)))?;

    slotwise_db::repositories::availability::replace_rules(&state.db_pool, owner_id, &rows)
        .await
        .map_err(SlotError::Database)?;

    // Echo back the persisted state, rebuilt from a fresh read
    let rules = slotwise_db::repositories::availability::list_rules(&state.db_pool, owner_id)
        .await
        .map_err(SlotError::Database)?;

    let rules: Vec<AvailabilityRule> = rules.iter().map(|r| r.to_rule()).collect();

    Ok(Json(WeeklySchedule::from_rules(&rules)))
}
