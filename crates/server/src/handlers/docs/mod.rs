use std::sync::Arc;

use aide::{
    axum::{routing::get, ApiRouter},
    openapi::OpenApi,
    redoc::Redoc,
};
use axum::{Extension, Json};
use db::DatabaseConnection;

/// Create an [`ApiRouter`] that provides an API server with documentation routes.
pub(crate) fn routes() -> ApiRouter<Arc<DatabaseConnection>> {
    ApiRouter::new()
        .route("/", Redoc::new("/docs/api.json").axum_route())
        .route(
            "/api.json",
            get(|Extension(oapi): Extension<Arc<OpenApi>>| async move { Json(oapi) }),
        )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    use crate::testing::{create_database, test_router, ResponseBodyExt};

    #[tokio::test]
    async fn api_document() {
        let db = create_database().await;

        let response = test_router(Arc::new(db))
            .oneshot(
                Request::builder()
                    .uri("/docs/api.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let document = response.json().await;

        assert_eq!(document["info"]["title"], "Loft Manager API");
        assert!(document["paths"]
            .as_object()
            .map(|paths| !paths.is_empty())
            .unwrap_or_default());
    }

    #[tokio::test]
    async fn cors_preflight() {
        let db = create_database().await;

        let response = test_router(Arc::new(db))
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/birds")
                    .header("Origin", "https://loft.example.com")
                    .header("Access-Control-Request-Method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }
}
