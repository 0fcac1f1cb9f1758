//! Axum router construction.
//!
//! Everything except `/health` is mounted under the configured base path:
//! the API at `{base_path}/api/v1`, the docs at `{base_path}/api/docs` and
//! the stored segments at `{base_path}/{static_mount}`.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::context::AppContext;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::media::split_by_size,
        routes::health::health_check,
        routes::admin::tools,
    ),
    components(schemas(
        routes::media::ApiErrorItem,
        routes::media::ApiErrorResponse,
        routes::media::SplitResponse,
        routes::health::HealthResponse,
        ms_av::ToolInfo,
    ))
)]
struct ApiDoc;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let server = &ctx.config.server;
    let base = server.normalized_base_path().to_string();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = match server.max_upload_mb {
        Some(mb) => {
            let bytes = mb.saturating_mul(1024 * 1024);
            DefaultBodyLimit::max(usize::try_from(bytes).unwrap_or(usize::MAX))
        }
        None => DefaultBodyLimit::disable(),
    };

    let api = Router::new()
        .route(
            &format!("{base}/api/v1/media/split-by-size"),
            post(routes::media::split_by_size).layer(body_limit),
        )
        .route(
            &format!("{base}/api/v1/admin/tools"),
            get(routes::admin::tools),
        );

    let mut app = Router::new()
        .route("/health", get(routes::health::health_check))
        .merge(api)
        .merge(
            SwaggerUi::new(format!("{base}/api/docs"))
                .url(format!("{base}/api/openapi.json"), ApiDoc::openapi()),
        );

    if server.static_mount.trim_matches('/').is_empty() {
        tracing::warn!("No static mount configured; segments will not be served");
    } else {
        let storage_dir = ctx.ingestor.storage_dir().to_path_buf();
        tracing::info!(
            "Serving {} at {}",
            storage_dir.display(),
            server.static_route()
        );
        app = app.nest_service(&server.static_route(), ServeDir::new(storage_dir));
    }

    app.layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
