// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FitTrack

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    auth::Auth,
    error::ApiError,
    models::{CreateWorkoutLogRequest, WorkoutLog, WorkoutLogUpdate},
    state::AppState,
    storage::OwnershipEnforcer,
};

const CONTEXT: &str = "Workout log";

#[derive(Debug, Deserialize, IntoParams)]
pub struct LogDateQuery {
    /// Day to list, `YYYY-MM-DD`.
    pub date: NaiveDate,
}

/// Fetch a log and check it belongs to `user_id`.
async fn owned_log(state: &AppState, log_id: &str, user_id: &str) -> Result<WorkoutLog, ApiError> {
    let log = state
        .fitness
        .get_workout_log(log_id)
        .await
        .map_err(|e| ApiError::from_storage(e, CONTEXT))?;
    log.verify_ownership(user_id).map_err(|e| {
        tracing::warn!(error = %e, "Workout log access denied");
        ApiError::from_storage(e, CONTEXT)
    })?;
    Ok(log)
}

#[utoipa::path(
    get,
    path = "/v1/workout-logs",
    params(LogDateQuery),
    tag = "Workout Logs",
    responses((status = 200, body = [WorkoutLog]))
)]
pub async fn list_workout_logs(
    Auth(session): Auth,
    State(state): State<AppState>,
    Query(query): Query<LogDateQuery>,
) -> Result<Json<Vec<WorkoutLog>>, ApiError> {
    let logs = state
        .fitness
        .list_workout_logs(session.user_id(), query.date)
        .await
        .map_err(|e| ApiError::from_storage(e, "Workout logs"))?;
    Ok(Json(logs))
}

#[utoipa::path(
    post,
    path = "/v1/workout-logs",
    request_body = CreateWorkoutLogRequest,
    tag = "Workout Logs",
    responses((status = 201, body = WorkoutLog))
)]
pub async fn create_workout_log(
    Auth(session): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateWorkoutLogRequest>,
) -> Result<(StatusCode, Json<WorkoutLog>), ApiError> {
    let log = state
        .fitness
        .create_workout_log(request.into_new(session.user_id()))
        .await
        .map_err(|e| ApiError::from_storage(e, CONTEXT))?;
    Ok((StatusCode::CREATED, Json(log)))
}

#[utoipa::path(
    put,
    path = "/v1/workout-logs/{log_id}",
    params(("log_id" = String, Path, description = "Identifier of the log entry")),
    request_body = WorkoutLogUpdate,
    tag = "Workout Logs",
    responses(
        (status = 200, body = WorkoutLog),
        (status = 400, description = "No fields to update"),
        (status = 403, description = "Log belongs to another user"),
        (status = 404, description = "Log not found")
    )
)]
pub async fn update_workout_log(
    Path(log_id): Path<String>,
    Auth(session): Auth,
    State(state): State<AppState>,
    Json(update): Json<WorkoutLogUpdate>,
) -> Result<Json<WorkoutLog>, ApiError> {
    if update.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }
    owned_log(&state, &log_id, session.user_id()).await?;

    let log = state
        .fitness
        .update_workout_log(&log_id, update)
        .await
        .map_err(|e| ApiError::from_storage(e, CONTEXT))?;
    Ok(Json(log))
}

#[utoipa::path(
    delete,
    path = "/v1/workout-logs/{log_id}",
    params(("log_id" = String, Path, description = "Identifier of the log entry")),
    tag = "Workout Logs",
    responses(
        (status = 204),
        (status = 403, description = "Log belongs to another user"),
        (status = 404, description = "Log not found")
    )
)]
pub async fn delete_workout_log(
    Path(log_id): Path<String>,
    Auth(session): Auth,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    owned_log(&state, &log_id, session.user_id()).await?;
    state
        .fitness
        .delete_workout_log(&log_id)
        .await
        .map_err(|e| ApiError::from_storage(e, CONTEXT))?;
    Ok(StatusCode::NO_CONTENT)
}
