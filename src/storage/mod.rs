// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FitTrack

//! # Storage Module
//!
//! Typed access to the two hosted collaborators this service depends on:
//!
//! - the **identity store**, which verifies passwords and registers accounts
//! - the **relational store**, which holds user profiles and fitness data
//!
//! Both are reached through async traits so handlers never know which
//! backend is in use.
//!
//! ## Backends
//!
//! - [`HostedBackend`]: GoTrue-compatible auth + PostgREST-compatible tables
//!   over HTTPS (production)
//! - [`MemoryBackend`]: process-local maps (development mode and tests)
//!
//! ## Error Model
//!
//! Every call returns a [`StorageResult`]. "No rows" is always
//! [`StorageError::NotFound`] so callers can treat it as an expected branch;
//! uniqueness violations are [`StorageError::AlreadyExists`].

pub mod hosted;
pub mod memory;
pub mod ownership;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::auth::{Identity, NewIdentity};
use crate::models::{
    Exercise, NewWorkout, NewWorkoutLog, NewWorkoutPlan, Workout, WorkoutLog, WorkoutLogUpdate,
    WorkoutPlan,
};

pub use hosted::HostedBackend;
pub use memory::MemoryBackend;
pub use ownership::{OwnedResource, OwnershipEnforcer};

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No matching row
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness constraint violated
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// The upstream refused the request (bad credentials, validation)
    #[error("Rejected by upstream: {0}")]
    Rejected(String),

    /// Ownership check failed
    #[error("Permission denied: user {user_id} cannot access {resource}")]
    PermissionDenied { user_id: String, resource: String },

    /// Transport failure or unexpected upstream status
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Response body could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for StorageError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            StorageError::Serialization(e.to_string())
        } else {
            StorageError::Upstream(e.to_string())
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

/// Result type for store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// A user record as returned by the identity store after a password check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedUser {
    pub id: String,
    /// May be absent for phone-only upstream accounts.
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    /// Opaque upstream access token, if the store issued one.
    pub access_token: Option<String>,
}

/// Hosted identity store: password verification and registration.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Verify an email/password pair.
    ///
    /// # Errors
    /// `Rejected` for bad credentials; `Upstream` for transport failures.
    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> StorageResult<VerifiedUser>;

    /// Register a new email/password account.
    ///
    /// # Errors
    /// `AlreadyExists` when the email is taken; `Rejected` on validation.
    async fn sign_up(&self, email: &str, password: &str) -> StorageResult<VerifiedUser>;
}

/// The `users` table: one row per email.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by normalized email.
    ///
    /// # Errors
    /// `NotFound` when no row matches.
    async fn find_user_by_email(&self, email: &str) -> StorageResult<Identity>;

    /// Insert a user.
    ///
    /// # Errors
    /// `AlreadyExists` when the email's uniqueness constraint is violated.
    async fn insert_user(&self, user: NewIdentity) -> StorageResult<Identity>;

    /// Cheap round trip proving the table is reachable; used by readiness.
    async fn ping(&self) -> StorageResult<()>;
}

/// Workouts, logs, plans and the exercise catalogue.
#[async_trait]
pub trait FitnessStore: Send + Sync {
    async fn create_workout(&self, workout: NewWorkout) -> StorageResult<Workout>;

    /// Workouts for a user, newest first.
    async fn list_workouts(&self, user_id: &str) -> StorageResult<Vec<Workout>>;

    async fn create_workout_log(&self, log: NewWorkoutLog) -> StorageResult<WorkoutLog>;

    async fn get_workout_log(&self, log_id: &str) -> StorageResult<WorkoutLog>;

    /// Logs for a user on one date, oldest first.
    async fn list_workout_logs(&self, user_id: &str, date: NaiveDate)
        -> StorageResult<Vec<WorkoutLog>>;

    async fn update_workout_log(
        &self,
        log_id: &str,
        update: WorkoutLogUpdate,
    ) -> StorageResult<WorkoutLog>;

    async fn delete_workout_log(&self, log_id: &str) -> StorageResult<()>;

    async fn create_workout_plan(&self, plan: NewWorkoutPlan) -> StorageResult<WorkoutPlan>;

    /// Plans created by a user, newest first.
    async fn list_workout_plans(&self, user_id: &str) -> StorageResult<Vec<WorkoutPlan>>;

    /// Exercises, optionally filtered by muscle group and difficulty.
    async fn list_exercises(
        &self,
        muscle_group: Option<&str>,
        difficulty: Option<&str>,
    ) -> StorageResult<Vec<Exercise>>;
}
