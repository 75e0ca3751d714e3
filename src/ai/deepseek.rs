// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FitTrack

//! Chat completion client for DeepSeek (or any OpenAI-compatible endpoint).

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AiError, ChatMessage};
use crate::config::AiConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const TEMPERATURE: f32 = 0.7;
const CHAT_MAX_TOKENS: u32 = 500;
const PLAN_MAX_TOKENS: u32 = 1000;

const TRAINER_PROMPT: &str = "You are an expert fitness trainer and workout program designer. \
Provide helpful advice, form corrections, and program adjustments based on user questions.";
const PLAN_DESIGNER_PROMPT: &str = "You are an expert fitness trainer and workout program designer. \
Create detailed, safe, and effective workout plans based on user requirements.";

#[derive(Debug, Clone)]
pub struct CompletionClient {
    endpoint: String,
    api_key: String,
    model: String,
    http: Client,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl CompletionClient {
    pub fn new(config: &AiConfig) -> Result<Self, AiError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AiError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint: format!(
                "{}/chat/completions",
                config.api_url.as_str().trim_end_matches('/')
            ),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            http,
        })
    }

    /// Answer a trainer conversation. The fixed trainer prompt goes first.
    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, AiError> {
        self.complete(with_system_prompt(TRAINER_PROMPT, messages), CHAT_MAX_TOKENS)
            .await
    }

    /// Write a workout plan for a free-text request.
    pub async fn generate_workout_plan(&self, prompt: &str) -> Result<String, AiError> {
        let messages = vec![
            ChatMessage::system(PLAN_DESIGNER_PROMPT),
            ChatMessage::user(prompt),
        ];
        self.complete(messages, PLAN_MAX_TOKENS).await
    }

    async fn complete(&self, messages: Vec<ChatMessage>, max_tokens: u32) -> Result<String, AiError> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
            temperature: TEMPERATURE,
            max_tokens,
        };
        debug!(model = %self.model, messages = request.messages.len(), max_tokens, "Sending completion request");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AiError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Upstream { status, body });
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AiError::InvalidResponse(format!("invalid JSON: {e}")))?;
        extract_content(body)
    }
}

fn with_system_prompt(prompt: &str, messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
    let mut all = Vec::with_capacity(messages.len() + 1);
    all.push(ChatMessage::system(prompt));
    all.extend(messages);
    all
}

fn extract_content(response: CompletionResponse) -> Result<String, AiError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| AiError::InvalidResponse("no completion choices returned".to_string()))
}
