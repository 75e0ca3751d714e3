// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FitTrack

//! FitTrack - Fitness Tracking Backend
//!
//! HTTP service behind the FitTrack web app: sign-in across email/password
//! and OAuth providers, session issuance, workout tracking, and an AI
//! trainer.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Credential verification, OAuth account linking, sessions
//! - `ai` - AI trainer completion client
//! - `storage` - Hosted and in-memory stores
//! - `telemetry` - Tracing subscriber setup

pub mod ai;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
pub mod telemetry;
