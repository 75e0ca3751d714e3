// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FitTrack

//! AI trainer integration.
//!
//! The trainer is an OpenAI-compatible chat completion API (DeepSeek by
//! default). See [`deepseek::CompletionClient`].

pub mod deepseek;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use deepseek::CompletionClient;

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("AI completion service is not configured")]
    NotConfigured,

    #[error("AI request failed: {0}")]
    Request(String),

    #[error("AI service returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("AI response was invalid: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    pub response: String,
}
