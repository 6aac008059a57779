use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use placement::workflows::{placement_router, PlacementState};
use serde_json::json;

pub(crate) fn with_service_routes(state: PlacementState) -> axum::Router {
    placement_router(state)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck(Extension(state): Extension<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "notifications": state.notifications.stats(),
    }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use placement::workflows::assessment::{
        AssessmentService, HtmlReportRenderer, InMemoryResourceCache, UnconfiguredFormProvider,
    };
    use placement::workflows::hiring::{ApplicationLifecycle, OfferLetterStore};
    use placement::workflows::notify::{NotificationDispatcher, TracingNotifier};
    use placement::workflows::store::InMemoryStore;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app(ready: bool, results: &std::path::Path) -> axum::Router {
        let store = Arc::new(InMemoryStore::default());
        let notifications = NotificationDispatcher::spawn(Arc::new(TracingNotifier));
        let placement = PlacementState {
            assessments: AssessmentService::new(
                store.clone(),
                Arc::new(InMemoryResourceCache::default()),
                Arc::new(UnconfiguredFormProvider),
                Arc::new(HtmlReportRenderer::new(results)),
                notifications.clone(),
                Duration::from_secs(1),
            ),
            lifecycle: ApplicationLifecycle::new(
                store,
                OfferLetterStore::new(results.join("offers")),
                notifications.clone(),
            ),
        };
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            notifications,
        };
        with_service_routes(placement).layer(Extension(state))
    }

    #[tokio::test]
    async fn readiness_reflects_startup_flag() {
        let dir = tempfile::tempdir().expect("tempdir");

        let starting = app(false, dir.path())
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let ready = app(true, dir.path())
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(starting.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ready.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_reports_notification_counters() {
        let dir = tempfile::tempdir().expect("tempdir");

        let response = app(true, dir.path())
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body["status"], "ok");
        assert_eq!(body["notifications"]["attempted"], 0);
    }

    #[tokio::test]
    async fn workflow_routes_are_mounted() {
        let dir = tempfile::tempdir().expect("tempdir");

        let response = app(true, dir.path())
            .oneshot(
                Request::get("/api/v1/jobs/1/funnel")
                    .header("x-user-id", "1")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
