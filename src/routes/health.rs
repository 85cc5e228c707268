//! Health check endpoints

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
    pub engine: String,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "dots-ocr-gateway",
        engine: state.engine().name().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum_test::TestServer;

    use crate::config::Config;
    use crate::engine::mock::MockEngine;
    use crate::state::AppState;

    #[tokio::test]
    async fn test_health_reports_engine() {
        let state = AppState::new(Config::default(), Arc::new(MockEngine::with_pages(vec![])));
        let server = TestServer::new(crate::app(state)).unwrap();

        let response = server.get("/health").await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "dots-ocr-gateway");
        assert_eq!(body["engine"], "mock");
    }
}
