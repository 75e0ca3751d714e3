// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FitTrack

//! Hosted backend client.
//!
//! Talks to a Supabase-style deployment over HTTPS:
//!
//! - `/auth/v1/*`: GoTrue-compatible identity service (password sign-in,
//!   sign-up)
//! - `/rest/v1/{table}`: PostgREST-compatible table access
//!
//! ## Error Mapping
//!
//! | Upstream | [`StorageError`] |
//! |----------|------------------|
//! | PostgREST `PGRST116` (no rows for a single-object read) | `NotFound` |
//! | Postgres `23505` / HTTP 409 | `AlreadyExists` |
//! | other 4xx | `Rejected` |
//! | 5xx, transport | `Upstream` |

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{header::ACCEPT, Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

use super::{FitnessStore, IdentityStore, StorageError, StorageResult, UserStore, VerifiedUser};
use crate::auth::{Identity, NewIdentity};
use crate::config::HostedBackendConfig;
use crate::models::{
    Exercise, NewWorkout, NewWorkoutLog, NewWorkoutPlan, Workout, WorkoutLog, WorkoutLogUpdate,
    WorkoutPlan,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
/// PostgREST media type that makes single-row reads fail with `PGRST116`.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const NO_ROWS_CODE: &str = "PGRST116";
const UNIQUE_VIOLATION_CODE: &str = "23505";

const USERS: &str = "users";
const WORKOUTS: &str = "workouts";
const WORKOUT_LOGS: &str = "workout_logs";
const WORKOUT_PLANS: &str = "workout_plans";
const EXERCISES: &str = "exercises";

#[derive(Debug, Clone)]
pub struct HostedBackend {
    base_url: String,
    api_key: String,
    http: Client,
}

/// PostgREST error body.
#[derive(Debug, Default, Deserialize)]
struct RestErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// GoTrue error body; field names vary across versions.
#[derive(Debug, Default, Deserialize)]
struct AuthErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Option<GoTrueMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct GoTrueMetadata {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
}

impl HostedBackend {
    pub fn new(config: &HostedBackendConfig) -> StorageResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StorageError::Upstream(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.url.as_str().trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            http,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn table(&self, method: Method, table: &str) -> RequestBuilder {
        self.request(method, &format!("/rest/v1/{table}"))
    }

    async fn select_many<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> StorageResult<Vec<T>> {
        let response = self.table(Method::GET, table).query(query).send().await?;
        read_rest(response, table).await
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> StorageResult<T> {
        let response = self
            .table(Method::GET, table)
            .query(query)
            .header(ACCEPT, SINGLE_OBJECT)
            .send()
            .await?;
        read_rest(response, table).await
    }

    async fn insert_one<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        table: &str,
        row: &B,
    ) -> StorageResult<T> {
        let response = self
            .table(Method::POST, table)
            .header("Prefer", "return=representation")
            .header(ACCEPT, SINGLE_OBJECT)
            .json(row)
            .send()
            .await?;
        read_rest(response, table).await
    }

    async fn sign_in_request(&self, email: &str, password: &str) -> StorageResult<Response> {
        Ok(self
            .request(Method::POST, "/auth/v1/token")
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?)
    }
}

/// Decode a PostgREST response or map its error body.
async fn read_rest<T: DeserializeOwned>(response: Response, table: &str) -> StorageResult<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }
    let body = response.text().await.unwrap_or_default();
    Err(map_rest_error(status, &body, table))
}

fn map_rest_error(status: StatusCode, body: &str, table: &str) -> StorageError {
    let parsed: RestErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .unwrap_or_else(|| format!("{table}: HTTP {}", status.as_u16()));

    match parsed.code.as_deref() {
        Some(NO_ROWS_CODE) => StorageError::NotFound(format!("{table}: {message}")),
        Some(UNIQUE_VIOLATION_CODE) => StorageError::AlreadyExists(format!("{table}: {message}")),
        _ if status == StatusCode::CONFLICT => {
            StorageError::AlreadyExists(format!("{table}: {message}"))
        }
        _ if status.is_client_error() => StorageError::Rejected(format!("{table}: {message}")),
        _ => StorageError::Upstream(format!("{table}: HTTP {}: {message}", status.as_u16())),
    }
}

fn map_auth_error(status: StatusCode, body: &str) -> StorageError {
    let parsed: AuthErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .error_description
        .or(parsed.msg)
        .or(parsed.message)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    let already_registered = parsed.error_code.as_deref() == Some("user_already_exists")
        || message.to_lowercase().contains("already registered");
    if already_registered {
        StorageError::AlreadyExists(message)
    } else if status.is_client_error() {
        StorageError::Rejected(message)
    } else {
        StorageError::Upstream(format!("HTTP {}: {message}", status.as_u16()))
    }
}

/// Pull the user (and session token, if present) out of a GoTrue response.
///
/// Token grants return `{access_token, user}`; sign-up without auto-confirm
/// returns the bare user object.
fn parse_auth_response(body: Value) -> StorageResult<VerifiedUser> {
    let access_token = body
        .get("access_token")
        .and_then(Value::as_str)
        .map(str::to_string);
    let user_value = match body.get("user") {
        Some(user) => user.clone(),
        None => body,
    };
    let user: GoTrueUser = serde_json::from_value(user_value)?;
    let metadata = user.user_metadata.unwrap_or_default();

    Ok(VerifiedUser {
        id: user.id,
        email: user.email.filter(|e| !e.is_empty()),
        name: metadata.name.or(metadata.full_name),
        avatar_url: metadata.avatar_url,
        access_token,
    })
}

async fn read_auth(response: Response) -> StorageResult<VerifiedUser> {
    let status = response.status();
    if status.is_success() {
        return parse_auth_response(response.json::<Value>().await?);
    }
    let body = response.text().await.unwrap_or_default();
    Err(map_auth_error(status, &body))
}

#[async_trait]
impl IdentityStore for HostedBackend {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> StorageResult<VerifiedUser> {
        read_auth(self.sign_in_request(email, password).await?).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> StorageResult<VerifiedUser> {
        let response = self
            .request(Method::POST, "/auth/v1/signup")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        read_auth(response).await
    }
}

#[async_trait]
impl UserStore for HostedBackend {
    async fn find_user_by_email(&self, email: &str) -> StorageResult<Identity> {
        self.select_one(
            USERS,
            &[("email", format!("eq.{email}")), ("select", "*".to_string())],
        )
        .await
    }

    async fn insert_user(&self, user: NewIdentity) -> StorageResult<Identity> {
        self.insert_one(USERS, &user).await
    }

    async fn ping(&self) -> StorageResult<()> {
        self.select_many::<Value>(
            USERS,
            &[("select", "id".to_string()), ("limit", "1".to_string())],
        )
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl FitnessStore for HostedBackend {
    async fn create_workout(&self, workout: NewWorkout) -> StorageResult<Workout> {
        self.insert_one(WORKOUTS, &workout).await
    }

    async fn list_workouts(&self, user_id: &str) -> StorageResult<Vec<Workout>> {
        self.select_many(
            WORKOUTS,
            &[
                ("user_id", format!("eq.{user_id}")),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn create_workout_log(&self, log: NewWorkoutLog) -> StorageResult<WorkoutLog> {
        self.insert_one(WORKOUT_LOGS, &log).await
    }

    async fn get_workout_log(&self, log_id: &str) -> StorageResult<WorkoutLog> {
        self.select_one(WORKOUT_LOGS, &[("id", format!("eq.{log_id}"))])
            .await
    }

    async fn list_workout_logs(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> StorageResult<Vec<WorkoutLog>> {
        self.select_many(
            WORKOUT_LOGS,
            &[
                ("user_id", format!("eq.{user_id}")),
                ("date", format!("eq.{date}")),
                ("order", "created_at.asc".to_string()),
            ],
        )
        .await
    }

    async fn update_workout_log(
        &self,
        log_id: &str,
        update: WorkoutLogUpdate,
    ) -> StorageResult<WorkoutLog> {
        let response = self
            .table(Method::PATCH, WORKOUT_LOGS)
            .query(&[("id", format!("eq.{log_id}"))])
            .header("Prefer", "return=representation")
            .header(ACCEPT, SINGLE_OBJECT)
            .json(&update)
            .send()
            .await?;
        read_rest(response, WORKOUT_LOGS).await
    }

    async fn delete_workout_log(&self, log_id: &str) -> StorageResult<()> {
        let response = self
            .table(Method::DELETE, WORKOUT_LOGS)
            .query(&[("id", format!("eq.{log_id}"))])
            .header("Prefer", "return=representation")
            .send()
            .await?;
        let deleted: Vec<Value> = read_rest(response, WORKOUT_LOGS).await?;
        if deleted.is_empty() {
            return Err(StorageError::NotFound(format!("Workout log {log_id}")));
        }
        Ok(())
    }

    async fn create_workout_plan(&self, plan: NewWorkoutPlan) -> StorageResult<WorkoutPlan> {
        self.insert_one(WORKOUT_PLANS, &plan).await
    }

    async fn list_workout_plans(&self, user_id: &str) -> StorageResult<Vec<WorkoutPlan>> {
        self.select_many(
            WORKOUT_PLANS,
            &[
                ("created_by", format!("eq.{user_id}")),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn list_exercises(
        &self,
        muscle_group: Option<&str>,
        difficulty: Option<&str>,
    ) -> StorageResult<Vec<Exercise>> {
        let mut query = vec![("select", "*".to_string())];
        if let Some(group) = muscle_group {
            query.push(("muscle_group", format!("eq.{group}")));
        }
        if let Some(level) = difficulty {
            query.push(("difficulty_level", format!("eq.{level}")));
        }
        self.select_many(EXERCISES, &query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_rows_maps_to_not_found() {
        let body = r#"{"code":"PGRST116","details":"The result contains 0 rows","hint":null,"message":"JSON object requested, multiple (or no) rows returned"}"#;
        let err = map_rest_error(StatusCode::NOT_ACCEPTABLE, body, USERS);
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn unique_violation_maps_to_already_exists() {
        let body = r#"{"code":"23505","message":"duplicate key value violates unique constraint \"users_email_key\""}"#;
        assert!(matches!(
            map_rest_error(StatusCode::CONFLICT, body, USERS),
            StorageError::AlreadyExists(_)
        ));
        assert!(matches!(
            map_rest_error(StatusCode::CONFLICT, "", USERS),
            StorageError::AlreadyExists(_)
        ));
    }

    #[test]
    fn other_statuses_map_by_class() {
        assert!(matches!(
            map_rest_error(StatusCode::BAD_REQUEST, r#"{"code":"22P02","message":"bad uuid"}"#, USERS),
            StorageError::Rejected(_)
        ));
        assert!(matches!(
            map_rest_error(StatusCode::BAD_GATEWAY, "<html>", USERS),
            StorageError::Upstream(_)
        ));
    }

    #[test]
    fn auth_errors_distinguish_existing_accounts() {
        let taken = r#"{"code":422,"error_code":"user_already_exists","msg":"User already registered"}"#;
        assert!(matches!(
            map_auth_error(StatusCode::UNPROCESSABLE_ENTITY, taken),
            StorageError::AlreadyExists(_)
        ));

        let bad_login = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        match map_auth_error(StatusCode::BAD_REQUEST, bad_login) {
            StorageError::Rejected(msg) => assert_eq!(msg, "Invalid login credentials"),
            other => panic!("unexpected {other:?}"),
        }

        assert!(matches!(
            map_auth_error(StatusCode::SERVICE_UNAVAILABLE, ""),
            StorageError::Upstream(_)
        ));
    }

    #[test]
    fn parses_token_grant_response() {
        let body = json!({
            "access_token": "eyJ.upstream",
            "token_type": "bearer",
            "user": {
                "id": "8d6f",
                "email": "pat@example.com",
                "user_metadata": { "full_name": "Pat", "avatar_url": "https://cdn/p.png" }
            }
        });
        let user = parse_auth_response(body).unwrap();
        assert_eq!(user.id, "8d6f");
        assert_eq!(user.email.as_deref(), Some("pat@example.com"));
        assert_eq!(user.name.as_deref(), Some("Pat"));
        assert_eq!(user.avatar_url.as_deref(), Some("https://cdn/p.png"));
        assert_eq!(user.access_token.as_deref(), Some("eyJ.upstream"));
    }

    #[test]
    fn parses_bare_user_response() {
        let body = json!({ "id": "8d6f", "email": "", "user_metadata": {} });
        let user = parse_auth_response(body).unwrap();
        assert_eq!(user.id, "8d6f");
        assert_eq!(user.email, None);
        assert_eq!(user.access_token, None);
    }

    #[test]
    fn builds_against_trimmed_base_url() {
        let backend = HostedBackend::new(&HostedBackendConfig {
            url: url::Url::parse("https://db.example.com/").unwrap(),
            api_key: "anon".into(),
        })
        .unwrap();
        assert_eq!(backend.base_url, "https://db.example.com");
    }
}
