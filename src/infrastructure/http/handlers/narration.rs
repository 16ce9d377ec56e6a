//! Narration Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{
    NarrationStatus, StartNarrationResponse, StopNarrationCommand, StopNarrationResponse,
    ToggleNarrationCommand, ToggleNarrationResponse,
};
use crate::infrastructure::http::dto::{ApiResponse, NarrationStartRequest, NarrationToggleRequest};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

pub async fn start_narration(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NarrationStartRequest>,
) -> Result<Json<ApiResponse<StartNarrationResponse>>, ApiError> {
    let result = state.start_handler.handle(req.into_command())?;
    Ok(Json(ApiResponse::success(result)))
}

pub async fn stop_narration(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StopNarrationResponse>> {
    Json(ApiResponse::success(
        state.stop_handler.handle(StopNarrationCommand),
    ))
}

pub async fn toggle_narration(
    State(state): State<Arc<AppState>>,
    // 活跃时允许空 body
    body: Option<Json<NarrationToggleRequest>>,
) -> Result<Json<ApiResponse<ToggleNarrationResponse>>, ApiError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let cmd = ToggleNarrationCommand {
        start: req.into_command(),
    };

    let result = state.toggle_handler.handle(cmd)?;
    Ok(Json(ApiResponse::success(result)))
}

pub async fn narration_status(State(state): State<Arc<AppState>>) -> Json<ApiResponse<NarrationStatus>> {
    Json(ApiResponse::success(state.narrator.status()))
}

#[cfg(test)]
mod tests {
    use crate::application::Narrator;
    use crate::config::NarrationConfig;
    use crate::infrastructure::adapters::{
        FakeSynthesizer, NullPlaybackEngine, SilentSpeechSynthesizer,
    };
    use crate::infrastructure::events::EventPublisher;
    use crate::infrastructure::http::{create_routes, AppState};
    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn app_with(playback: NullPlaybackEngine) -> (Router, Narrator) {
        let config = NarrationConfig::default();
        let narrator = Narrator::new(
            config.clone(),
            Arc::new(FakeSynthesizer::with_defaults()),
            Arc::new(SilentSpeechSynthesizer::new(175)),
            Arc::new(playback),
            EventPublisher::arc(),
        );
        let state = AppState::new(narrator.clone(), &config).unwrap();
        (create_routes().with_state(Arc::new(state)), narrator)
    }

    fn app() -> (Router, Narrator) {
        app_with(NullPlaybackEngine::new())
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_then_status() {
        let (app, narrator) = app();

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/narration/start",
                r#"{"text": "1 In the beginning.\n2 And the earth.", "voice": "male"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["errno"], 0);
        assert_eq!(body["data"]["total_chunks"], 2);
        assert_eq!(body["data"]["anchors"][1], "verse-2");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/narration/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["data"]["active"], true);
        assert_eq!(body["data"]["total_chunks"], 2);

        narrator.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_blank_text_is_bad_request() {
        let (app, _) = app();
        let response = app
            .oneshot(post_json("/api/narration/start", r#"{"text": "   "}"#))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["errno"], 400);
        assert!(body["data"].is_null());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_without_device_is_unavailable() {
        let (app, narrator) = app_with(NullPlaybackEngine::failing_open());
        let response = app
            .oneshot(post_json("/api/narration/start", r#"{"text": "Hello there."}"#))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["errno"], 503);
        assert!(!narrator.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_when_idle() {
        let (app, _) = app();
        let response = app
            .oneshot(post_json("/api/narration/stop", ""))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["errno"], 0);
        assert_eq!(body["data"]["was_active"], false);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_on_and_off() {
        let (app, narrator) = app();

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/narration/toggle",
                r#"{"text": "First paragraph.\n\nSecond paragraph.", "mode": "fluid"}"#,
            ))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["data"]["active"], true);
        assert_eq!(body["data"]["total_chunks"], 2);
        assert!(narrator.is_active());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/narration/toggle")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["data"]["active"], false);
        assert!(!narrator.is_active());
    }

    #[tokio::test]
    async fn test_ping() {
        let (app, _) = app();
        let response = app
            .oneshot(Request::builder().uri("/api/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["narrating"], false);
    }
}
