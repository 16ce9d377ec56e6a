//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping               GET   健康检查
//! - /api/narration/start    POST  分段并开始朗读（替换已有会话）
//! - /api/narration/stop     POST  停止朗读
//! - /api/narration/toggle   POST  空闲时开始，活跃时停止
//! - /api/narration/status   GET   当前朗读状态
//! - /ws/narration           WS    朗读事件推送

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/narration", get(handlers::narration_websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/narration", narration_routes())
}

/// Narration 路由
fn narration_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/start", post(handlers::start_narration))
        .route("/stop", post(handlers::stop_narration))
        .route("/toggle", post(handlers::toggle_narration))
        .route("/status", get(handlers::narration_status))
}
