// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FitTrack

use axum::{
    body::Body,
    http::Request,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::Span;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    ai::{ChatMessage, ChatRequest, ChatResponse, ChatRole},
    auth::{providers::ProviderKind, ClientSessionView, Provider, ProviderInfo},
    models::{
        AiPlanRequest, AiPlanResponse, CreateWorkoutLogRequest, CreateWorkoutRequest, Difficulty,
        Exercise, GeneratePlanRequest, Workout, WorkoutLog, WorkoutLogUpdate, WorkoutPlan,
    },
    state::AppState,
};

pub mod auth;
pub mod chat;
pub mod exercises;
pub mod health;
pub mod plans;
pub mod workout_logs;
pub mod workouts;

const REQUEST_ID_HEADER: &str = "x-request-id";

fn request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id
    )
}

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/auth/providers", get(auth::list_providers))
        .route("/auth/signin", post(auth::sign_in))
        .route("/auth/callback/{provider}", post(auth::oauth_callback))
        .route("/auth/signup", post(auth::sign_up))
        .route("/auth/signout", post(auth::sign_out))
        .route("/auth/session", get(auth::get_session))
        .route(
            "/workouts",
            get(workouts::list_workouts).post(workouts::create_workout),
        )
        .route(
            "/workout-logs",
            get(workout_logs::list_workout_logs).post(workout_logs::create_workout_log),
        )
        .route(
            "/workout-logs/{log_id}",
            put(workout_logs::update_workout_log).delete(workout_logs::delete_workout_log),
        )
        .route(
            "/workout-plans",
            get(plans::list_workout_plans).post(plans::create_workout_plan),
        )
        .route("/workout-plans/ai", post(plans::generate_ai_plan))
        .route("/exercises", get(exercises::list_exercises))
        .route("/chat", post(chat::chat));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(request_span))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        auth::list_providers,
        auth::sign_in,
        auth::oauth_callback,
        auth::sign_up,
        auth::sign_out,
        auth::get_session,
        workouts::list_workouts,
        workouts::create_workout,
        workout_logs::list_workout_logs,
        workout_logs::create_workout_log,
        workout_logs::update_workout_log,
        workout_logs::delete_workout_log,
        plans::list_workout_plans,
        plans::create_workout_plan,
        plans::generate_ai_plan,
        exercises::list_exercises,
        chat::chat
    ),
    components(
        schemas(
            Provider,
            ProviderKind,
            ProviderInfo,
            ClientSessionView,
            auth::SignInRequest,
            auth::OAuthCallbackRequest,
            auth::SignUpRequest,
            auth::SignInResponse,
            auth::SignUpResponse,
            auth::SignOutResponse,
            Workout,
            CreateWorkoutRequest,
            WorkoutLog,
            CreateWorkoutLogRequest,
            WorkoutLogUpdate,
            Difficulty,
            WorkoutPlan,
            GeneratePlanRequest,
            AiPlanRequest,
            AiPlanResponse,
            Exercise,
            ChatRole,
            ChatMessage,
            ChatRequest,
            ChatResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Auth", description = "Sign-in, sign-up, and sessions"),
        (name = "Workouts", description = "Workout sessions"),
        (name = "Workout Logs", description = "Per-exercise log entries"),
        (name = "Workout Plans", description = "Generated and AI-written plans"),
        (name = "Exercises", description = "Exercise catalog"),
        (name = "AI Trainer", description = "Chat with the AI trainer")
    )
)]
struct ApiDoc;


#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::to_bytes,
        http::{header, Method, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(AppState::default());
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn health_is_public_and_tagged_with_request_id() {
        let app = router(AppState::default());
        let response = send(&app, Method::GET, "/health/live", None, None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn protected_routes_require_a_session() {
        let app = router(AppState::default());
        let response = send(&app, Method::GET, "/v1/workouts", None, None).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["error_code"], "missing_auth_header");
    }

    #[tokio::test]
    async fn sign_up_sign_in_and_use_session() {
        let app = router(AppState::default());
        let credentials = json!({ "email": "pat@example.com", "password": "hunter22" });

        let response = send(&app, Method::POST, "/v1/auth/signup", None, Some(credentials.clone())).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = send(&app, Method::POST, "/v1/auth/signin", None, Some(credentials)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(header::SET_COOKIE));
        let body = json_body(response).await;
        let token = body["token"].as_str().unwrap().to_string();

        let response = send(
            &app,
            Method::POST,
            "/v1/workouts",
            Some(&token),
            Some(json!({
                "name": "Morning run",
                "type": "cardio",
                "duration": 30,
                "date": "2026-03-02"
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = send(&app, Method::GET, "/v1/workouts", Some(&token), None).await;
        let workouts = json_body(response).await;
        assert_eq!(workouts.as_array().unwrap().len(), 1);
        assert_eq!(workouts[0]["type"], "cardio");

        let response = send(&app, Method::GET, "/v1/auth/session", Some(&token), None).await;
        let session = json_body(response).await;
        assert_eq!(session["email"], "pat@example.com");
        assert_eq!(session["provider"], "credentials");
    }

    #[tokio::test]
    async fn session_cookie_authenticates() {
        let app = router(test_support::state_with_codes(&[(
            "g-1",
            Provider::Google,
            "pat@example.com",
        )]));
        let response = send(
            &app,
            Method::POST,
            "/v1/auth/callback/google",
            None,
            Some(json!({ "code": "g-1" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        let pair = cookie.split(';').next().unwrap().to_string();

        let request = Request::builder()
            .uri("/v1/auth/session")
            .header(header::COOKIE, pair)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["provider"], "google");
    }

    #[tokio::test]
    async fn oauth_callback_ignores_client_supplied_profiles() {
        let app = router(test_support::state_with_codes(&[(
            "g-1",
            Provider::Google,
            "victim@example.com",
        )]));
        let response = send(
            &app,
            Method::POST,
            "/v1/auth/callback/google",
            None,
            Some(json!({ "code": "g-1" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let forged = json!({ "provider_account_id": "made-up", "email": "victim@example.com" });
        let response = send(&app, Method::POST, "/v1/auth/callback/github", None, Some(forged)).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!response.headers().contains_key(header::SET_COOKIE));

        let forged = json!({
            "code": "made-up",
            "provider_account_id": "made-up",
            "email": "victim@example.com"
        });
        let response = send(&app, Method::POST, "/v1/auth/callback/github", None, Some(forged)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(!response.headers().contains_key(header::SET_COOKIE));
        assert_eq!(json_body(response).await["error_code"], "oauth_rejected");
    }

    #[tokio::test]
    async fn password_and_oauth_sessions_share_data() {
        let app = router(test_support::state_with_codes(&[(
            "g-1",
            Provider::Google,
            "pat@example.com",
        )]));
        let credentials = json!({ "email": "pat@example.com", "password": "hunter22" });
        send(&app, Method::POST, "/v1/auth/signup", None, Some(credentials.clone())).await;
        let response = send(&app, Method::POST, "/v1/auth/signin", None, Some(credentials)).await;
        let password_token = json_body(response).await["token"].as_str().unwrap().to_string();

        let response = send(
            &app,
            Method::POST,
            "/v1/workouts",
            Some(&password_token),
            Some(json!({ "name": "Deadlifts", "duration": 40, "date": "2026-03-02" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = send(&app, Method::POST, "/v1/auth/callback/google", None, Some(json!({ "code": "g-1" }))).await;
        let google_token = json_body(response).await["token"].as_str().unwrap().to_string();

        let response = send(&app, Method::GET, "/v1/workouts", Some(&google_token), None).await;
        let workouts = json_body(response).await;
        assert_eq!(workouts.as_array().unwrap().len(), 1);
        assert_eq!(workouts[0]["name"], "Deadlifts");
    }

    #[tokio::test]
    async fn readiness_reports_store() {
        let app = router(AppState::default());
        let response = send(&app, Method::GET, "/health/ready", None, None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["checks"]["storage"], "ok");
    }

    #[tokio::test]
    async fn failed_sign_in_is_generic() {
        let app = router(AppState::default());
        let response = send(
            &app,
            Method::POST,
            "/v1/auth/signin",
            None,
            Some(json!({ "email": "nobody@example.com", "password": "whatever" })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Invalid email or password");
    }

    #[tokio::test]
    async fn openapi_document_lists_routes() {
        let app = router(AppState::default());
        let response = send(&app, Method::GET, "/api-doc/openapi.json", None, None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let doc = json_body(response).await;
        assert!(doc["paths"]["/v1/workout-logs/{log_id}"].is_object());
        assert!(doc["paths"]["/v1/auth/callback/{provider}"].is_object());
    }
}
