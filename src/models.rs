// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FitTrack

//! # API Data Models
//!
//! Request/response structures for the REST API and the row types exchanged
//! with the relational store. Row types serialize with the store's column
//! names, so the same struct is used for the HTTP body and the table row.
//!
//! ## Model Categories
//!
//! - **Workouts**: completed or planned sessions
//! - **Workout Logs**: per-exercise sets/reps/weight entries for a date
//! - **Workout Plans**: multi-week programs, optionally AI-generated
//! - **Exercises**: read-only catalogue

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Workouts
// =============================================================================

/// A workout session owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Workout {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Free-form category (e.g. "strength", "cardio").
    #[serde(rename = "type", default)]
    pub workout_type: Option<String>,
    /// Duration in minutes.
    pub duration: u32,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for the `workouts` table.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewWorkout {
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub workout_type: Option<String>,
    pub duration: u32,
    pub difficulty: Option<String>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateWorkoutRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub workout_type: Option<String>,
    /// Duration in minutes; must be positive.
    pub duration: u32,
    #[serde(default)]
    pub difficulty: Option<String>,
    /// Required; absent dates are rejected with a 400.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl CreateWorkoutRequest {
    /// Validate and attach the owner.
    pub fn into_new(self, user_id: &str) -> Result<NewWorkout, &'static str> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Workout name is required");
        }
        if self.duration == 0 {
            return Err("Workout duration must be greater than zero");
        }
        let Some(date) = self.date else {
            return Err("Workout date is required");
        };
        Ok(NewWorkout {
            user_id: user_id.to_string(),
            name: name.to_string(),
            description: self.description,
            workout_type: self.workout_type,
            duration: self.duration,
            difficulty: self.difficulty,
            date,
        })
    }
}

// =============================================================================
// Workout Logs
// =============================================================================

/// One logged exercise entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct WorkoutLog {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub workout_plan_id: Option<String>,
    #[serde(default)]
    pub exercise_id: Option<String>,
    #[serde(default)]
    pub sets: Option<u32>,
    #[serde(default)]
    pub reps: Option<u32>,
    /// Load in kilograms.
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for the `workout_logs` table.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewWorkoutLog {
    pub user_id: String,
    pub workout_plan_id: Option<String>,
    pub exercise_id: Option<String>,
    pub sets: Option<u32>,
    pub reps: Option<u32>,
    pub weight: Option<f64>,
    pub notes: Option<String>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateWorkoutLogRequest {
    #[serde(default)]
    pub workout_plan_id: Option<String>,
    #[serde(default)]
    pub exercise_id: Option<String>,
    #[serde(default)]
    pub sets: Option<u32>,
    #[serde(default)]
    pub reps: Option<u32>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    pub date: NaiveDate,
}

impl CreateWorkoutLogRequest {
    pub fn into_new(self, user_id: &str) -> NewWorkoutLog {
        NewWorkoutLog {
            user_id: user_id.to_string(),
            workout_plan_id: self.workout_plan_id,
            exercise_id: self.exercise_id,
            sets: self.sets,
            reps: self.reps,
            weight: self.weight,
            notes: self.notes,
            date: self.date,
        }
    }
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct WorkoutLogUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workout_plan_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sets: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl WorkoutLogUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the present fields to `log`.
    pub fn apply_to(self, log: &mut WorkoutLog) {
        if let Some(v) = self.workout_plan_id {
            log.workout_plan_id = Some(v);
        }
        if let Some(v) = self.exercise_id {
            log.exercise_id = Some(v);
        }
        if let Some(v) = self.sets {
            log.sets = Some(v);
        }
        if let Some(v) = self.reps {
            log.reps = Some(v);
        }
        if let Some(v) = self.weight {
            log.weight = Some(v);
        }
        if let Some(v) = self.notes {
            log.notes = Some(v);
        }
        if let Some(v) = self.date {
            log.date = v;
        }
    }
}

// =============================================================================
// Workout Plans
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }

    /// Capitalized form used in plan names.
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct WorkoutPlan {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub difficulty_level: Option<String>,
    #[serde(default)]
    pub duration_weeks: Option<u32>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub is_ai_generated: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for the `workout_plans` table.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewWorkoutPlan {
    pub name: String,
    pub description: Option<String>,
    pub difficulty_level: Option<String>,
    pub duration_weeks: Option<u32>,
    pub created_by: Option<String>,
    pub is_ai_generated: bool,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GeneratePlanRequest {
    pub difficulty: Difficulty,
    /// Program length in weeks; must be positive.
    pub duration: u32,
    #[serde(default)]
    pub goals: Vec<String>,
}

impl GeneratePlanRequest {
    /// Build the generated plan record for `user_id`.
    pub fn into_new(self, user_id: &str) -> Result<NewWorkoutPlan, &'static str> {
        if self.duration == 0 {
            return Err("Plan duration must be at least one week");
        }
        let goals: Vec<&str> = self
            .goals
            .iter()
            .map(|g| g.trim())
            .filter(|g| !g.is_empty())
            .collect();

        Ok(NewWorkoutPlan {
            name: format!("{} {}-Week Plan", self.difficulty.label(), self.duration),
            description: Some(format!(
                "AI-generated {} workout plan for {}",
                self.difficulty.as_str(),
                goals.join(", ")
            )),
            difficulty_level: Some(self.difficulty.as_str().to_string()),
            duration_weeks: Some(self.duration),
            created_by: Some(user_id.to_string()),
            is_ai_generated: true,
        })
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AiPlanRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AiPlanResponse {
    pub plan: String,
}

// =============================================================================
// Exercises
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub muscle_group: Option<String>,
    #[serde(default)]
    pub difficulty_level: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
}
