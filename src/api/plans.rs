// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FitTrack

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    ai::AiError,
    auth::Auth,
    error::ApiError,
    models::{AiPlanRequest, AiPlanResponse, GeneratePlanRequest, WorkoutPlan},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/v1/workout-plans",
    tag = "Workout Plans",
    responses((status = 200, body = [WorkoutPlan]))
)]
pub async fn list_workout_plans(
    Auth(session): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<WorkoutPlan>>, ApiError> {
    let plans = state
        .fitness
        .list_workout_plans(session.user_id())
        .await
        .map_err(|e| ApiError::from_storage(e, "Workout plans"))?;
    Ok(Json(plans))
}

/// Record a generated plan from difficulty, length, and goals.
#[utoipa::path(
    post,
    path = "/v1/workout-plans",
    request_body = GeneratePlanRequest,
    tag = "Workout Plans",
    responses(
        (status = 201, body = WorkoutPlan),
        (status = 400, description = "Duration not positive")
    )
)]
pub async fn create_workout_plan(
    Auth(session): Auth,
    State(state): State<AppState>,
    Json(request): Json<GeneratePlanRequest>,
) -> Result<(StatusCode, Json<WorkoutPlan>), ApiError> {
    let new = request
        .into_new(session.user_id())
        .map_err(ApiError::bad_request)?;
    let plan = state
        .fitness
        .create_workout_plan(new)
        .await
        .map_err(|e| ApiError::from_storage(e, "Workout plan"))?;

    tracing::info!(user_id = %session.user_id(), plan_id = %plan.id, "Workout plan created");
    Ok((StatusCode::CREATED, Json(plan)))
}

/// Ask the AI trainer to write a plan for a free-text request.
#[utoipa::path(
    post,
    path = "/v1/workout-plans/ai",
    request_body = AiPlanRequest,
    tag = "Workout Plans",
    responses(
        (status = 200, body = AiPlanResponse),
        (status = 400, description = "Prompt missing"),
        (status = 502, description = "AI service failed"),
        (status = 503, description = "AI service not configured")
    )
)]
pub async fn generate_ai_plan(
    Auth(_session): Auth,
    State(state): State<AppState>,
    Json(request): Json<AiPlanRequest>,
) -> Result<Json<AiPlanResponse>, ApiError> {
    let prompt = request.prompt.trim();
    if prompt.is_empty() {
        return Err(ApiError::bad_request("Invalid prompt format"));
    }
    let client = state.ai.as_ref().ok_or(AiError::NotConfigured)?;
    let plan = client.generate_workout_plan(prompt).await?;
    Ok(Json(AiPlanResponse { plan }))
}
