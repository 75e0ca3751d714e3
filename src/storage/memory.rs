// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FitTrack

//! In-memory backend for development mode and tests.
//!
//! Implements every store trait over process-local tables guarded by one
//! `RwLock`. Enforces the same constraints the hosted backend does: unique
//! emails on `users` and on password accounts, "no rows" as `NotFound`.
//! Passwords are kept as HMAC-SHA256 digests keyed by a per-account salt.
//!
//! Nothing here survives a restart.

use std::collections::HashMap;

use async_trait::async_trait;
use base64ct::{Base64, Encoding};
use chrono::{NaiveDate, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{FitnessStore, IdentityStore, StorageError, StorageResult, UserStore, VerifiedUser};
use crate::auth::{Identity, NewIdentity};
use crate::models::{
    Exercise, NewWorkout, NewWorkoutLog, NewWorkoutPlan, Workout, WorkoutLog, WorkoutLogUpdate,
    WorkoutPlan,
};

type HmacSha256 = Hmac<Sha256>;

/// Shortest password the identity store accepts.
const MIN_PASSWORD_LEN: usize = 6;

struct PasswordAccount {
    id: String,
    email: String,
    salt: String,
    digest: String,
}

#[derive(Default)]
struct Tables {
    accounts: HashMap<String, PasswordAccount>,
    users: HashMap<String, Identity>,
    workouts: Vec<Workout>,
    logs: Vec<WorkoutLog>,
    plans: Vec<WorkoutPlan>,
    exercises: Vec<Exercise>,
}

#[derive(Default)]
pub struct MemoryBackend {
    tables: RwLock<Tables>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows in the `users` table.
    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }

    /// Add an exercise to the catalogue.
    pub async fn insert_exercise(&self, exercise: Exercise) {
        self.tables.write().await.exercises.push(exercise);
    }
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

fn password_digest(salt: &str, password: &str) -> StorageResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(salt.as_bytes())
        .map_err(|e| StorageError::Upstream(format!("invalid HMAC key: {e}")))?;
    mac.update(password.as_bytes());
    Ok(mac)
}

#[async_trait]
impl IdentityStore for MemoryBackend {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> StorageResult<VerifiedUser> {
        let tables = self.tables.read().await;
        let account = tables
            .accounts
            .get(&email_key(email))
            .ok_or_else(|| StorageError::Rejected("Invalid login credentials".to_string()))?;

        let expected = Base64::decode_vec(&account.digest)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        password_digest(&account.salt, password)?
            .verify_slice(&expected)
            .map_err(|_| StorageError::Rejected("Invalid login credentials".to_string()))?;

        let profile = tables.users.values().find(|u| u.email == account.email);
        Ok(VerifiedUser {
            id: account.id.clone(),
            email: Some(account.email.clone()),
            name: profile.and_then(|p| p.name.clone()),
            avatar_url: profile.and_then(|p| p.avatar_url.clone()),
            access_token: Some(format!("mem-{}", Uuid::new_v4().simple())),
        })
    }

    async fn sign_up(&self, email: &str, password: &str) -> StorageResult<VerifiedUser> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(StorageError::Rejected(format!(
                "Password should be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let key = email_key(email);
        let mut tables = self.tables.write().await;
        if tables.accounts.contains_key(&key) {
            return Err(StorageError::AlreadyExists(format!("Account {key}")));
        }

        let salt = Uuid::new_v4().to_string();
        let digest = Base64::encode_string(&password_digest(&salt, password)?.finalize().into_bytes());
        let account = PasswordAccount {
            id: Uuid::new_v4().to_string(),
            email: key.clone(),
            salt,
            digest,
        };
        let user = VerifiedUser {
            id: account.id.clone(),
            email: Some(key.clone()),
            name: None,
            avatar_url: None,
            access_token: None,
        };
        tables.accounts.insert(key, account);
        Ok(user)
    }
}

#[async_trait]
impl UserStore for MemoryBackend {
    async fn find_user_by_email(&self, email: &str) -> StorageResult<Identity> {
        let key = email_key(email);
        self.tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("User {key}")))
    }

    async fn insert_user(&self, user: NewIdentity) -> StorageResult<Identity> {
        let email = email_key(&user.email);
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == email) {
            return Err(StorageError::AlreadyExists(format!(
                "duplicate key value violates unique constraint: users.email = {email}"
            )));
        }

        let identity = Identity {
            id: Uuid::new_v4().to_string(),
            email,
            name: user.name,
            avatar_url: user.avatar_url,
            provider: user.provider,
            created_at: Utc::now(),
        };
        tables.users.insert(identity.id.clone(), identity.clone());
        Ok(identity)
    }

    async fn ping(&self) -> StorageResult<()> {
        Ok(())
    }
}

#[async_trait]
impl FitnessStore for MemoryBackend {
    async fn create_workout(&self, workout: NewWorkout) -> StorageResult<Workout> {
        let created = Workout {
            id: Uuid::new_v4().to_string(),
            user_id: workout.user_id,
            name: workout.name,
            description: workout.description,
            workout_type: workout.workout_type,
            duration: workout.duration,
            difficulty: workout.difficulty,
            date: Some(workout.date),
            created_at: Utc::now(),
        };
        self.tables.write().await.workouts.push(created.clone());
        Ok(created)
    }

    async fn list_workouts(&self, user_id: &str) -> StorageResult<Vec<Workout>> {
        let tables = self.tables.read().await;
        let mut workouts: Vec<Workout> = tables
            .workouts
            .iter()
            .rev()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect();
        workouts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(workouts)
    }

    async fn create_workout_log(&self, log: NewWorkoutLog) -> StorageResult<WorkoutLog> {
        let now = Utc::now();
        let created = WorkoutLog {
            id: Uuid::new_v4().to_string(),
            user_id: log.user_id,
            workout_plan_id: log.workout_plan_id,
            exercise_id: log.exercise_id,
            sets: log.sets,
            reps: log.reps,
            weight: log.weight,
            notes: log.notes,
            date: log.date,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.logs.push(created.clone());
        Ok(created)
    }

    async fn get_workout_log(&self, log_id: &str) -> StorageResult<WorkoutLog> {
        self.tables
            .read()
            .await
            .logs
            .iter()
            .find(|l| l.id == log_id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("Workout log {log_id}")))
    }

    async fn list_workout_logs(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> StorageResult<Vec<WorkoutLog>> {
        let tables = self.tables.read().await;
        let mut logs: Vec<WorkoutLog> = tables
            .logs
            .iter()
            .filter(|l| l.user_id == user_id && l.date == date)
            .cloned()
            .collect();
        logs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(logs)
    }

    async fn update_workout_log(
        &self,
        log_id: &str,
        update: WorkoutLogUpdate,
    ) -> StorageResult<WorkoutLog> {
        let mut tables = self.tables.write().await;
        let log = tables
            .logs
            .iter_mut()
            .find(|l| l.id == log_id)
            .ok_or_else(|| StorageError::NotFound(format!("Workout log {log_id}")))?;
        update.apply_to(log);
        log.updated_at = Utc::now();
        Ok(log.clone())
    }

    async fn delete_workout_log(&self, log_id: &str) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        let before = tables.logs.len();
        tables.logs.retain(|l| l.id != log_id);
        if tables.logs.len() == before {
            return Err(StorageError::NotFound(format!("Workout log {log_id}")));
        }
        Ok(())
    }

    async fn create_workout_plan(&self, plan: NewWorkoutPlan) -> StorageResult<WorkoutPlan> {
        let created = WorkoutPlan {
            id: Uuid::new_v4().to_string(),
            name: plan.name,
            description: plan.description,
            difficulty_level: plan.difficulty_level,
            duration_weeks: plan.duration_weeks,
            created_by: plan.created_by,
            is_ai_generated: plan.is_ai_generated,
            created_at: Utc::now(),
        };
        self.tables.write().await.plans.push(created.clone());
        Ok(created)
    }

    async fn list_workout_plans(&self, user_id: &str) -> StorageResult<Vec<WorkoutPlan>> {
        let tables = self.tables.read().await;
        let mut plans: Vec<WorkoutPlan> = tables
            .plans
            .iter()
            .rev()
            .filter(|p| p.created_by.as_deref() == Some(user_id))
            .cloned()
            .collect();
        plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(plans)
    }

    async fn list_exercises(
        &self,
        muscle_group: Option<&str>,
        difficulty: Option<&str>,
    ) -> StorageResult<Vec<Exercise>> {
        let tables = self.tables.read().await;
        Ok(tables
            .exercises
            .iter()
            .filter(|e| muscle_group.map_or(true, |m| e.muscle_group.as_deref() == Some(m)))
            .filter(|e| difficulty.map_or(true, |d| e.difficulty_level.as_deref() == Some(d)))
            .cloned()
            .collect())
    }
}
