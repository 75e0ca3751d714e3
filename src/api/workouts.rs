// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FitTrack

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    auth::Auth,
    error::ApiError,
    models::{CreateWorkoutRequest, Workout},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/v1/workouts",
    tag = "Workouts",
    responses((status = 200, body = [Workout]))
)]
pub async fn list_workouts(
    Auth(session): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Workout>>, ApiError> {
    let workouts = state
        .fitness
        .list_workouts(session.user_id())
        .await
        .map_err(|e| ApiError::from_storage(e, "Workouts"))?;
    Ok(Json(workouts))
}

#[utoipa::path(
    post,
    path = "/v1/workouts",
    request_body = CreateWorkoutRequest,
    tag = "Workouts",
    responses(
        (status = 201, body = Workout),
        (status = 400, description = "Name or date missing, or duration not positive")
    )
)]
pub async fn create_workout(
    Auth(session): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateWorkoutRequest>,
) -> Result<(StatusCode, Json<Workout>), ApiError> {
    let new = request
        .into_new(session.user_id())
        .map_err(ApiError::bad_request)?;
    let workout = state
        .fitness
        .create_workout(new)
        .await
        .map_err(|e| ApiError::from_storage(e, "Workout"))?;
    Ok((StatusCode::CREATED, Json(workout)))
}
