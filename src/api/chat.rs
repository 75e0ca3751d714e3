// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FitTrack

use axum::{extract::State, Json};

use crate::{
    ai::{AiError, ChatRequest, ChatResponse},
    auth::Auth,
    error::ApiError,
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/v1/chat",
    request_body = ChatRequest,
    tag = "AI Trainer",
    responses(
        (status = 200, body = ChatResponse),
        (status = 400, description = "No messages, or a blank message"),
        (status = 502, description = "AI service failed"),
        (status = 503, description = "AI service not configured")
    )
)]
pub async fn chat(
    Auth(session): Auth,
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if request.messages.is_empty() || request.messages.iter().any(|m| m.content.trim().is_empty()) {
        return Err(ApiError::bad_request("Invalid messages format"));
    }
    let client = state.ai.as_ref().ok_or(AiError::NotConfigured)?;

    tracing::debug!(user_id = %session.user_id(), messages = request.messages.len(), "Trainer chat");
    let response = client.chat(request.messages).await?;
    Ok(Json(ChatResponse { response }))
}
