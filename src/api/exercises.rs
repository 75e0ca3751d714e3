// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FitTrack

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{auth::Auth, error::ApiError, models::Exercise, state::AppState};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ExerciseQuery {
    pub muscle_group: Option<String>,
    pub difficulty: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[utoipa::path(
    get,
    path = "/v1/exercises",
    params(ExerciseQuery),
    tag = "Exercises",
    responses((status = 200, body = [Exercise]))
)]
pub async fn list_exercises(
    Auth(_session): Auth,
    State(state): State<AppState>,
    Query(query): Query<ExerciseQuery>,
) -> Result<Json<Vec<Exercise>>, ApiError> {
    let exercises = state
        .fitness
        .list_exercises(non_blank(&query.muscle_group), non_blank(&query.difficulty))
        .await
        .map_err(|e| ApiError::from_storage(e, "Exercises"))?;
    Ok(Json(exercises))
}
