// The `server` module exposes the gateway over HTTP.

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use uuid::Uuid;

use crate::gateway::Gateway;
use crate::shutdown::Shutdown;

pub use error::{ApiError, ApiResult};

/// Largest accepted image upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Room for multipart framing and the text fields sent next to the image.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
}

impl AppState {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }
}

pub fn app_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/chat", post(handlers::chat))
        .route("/generate-image", post(handlers::generate_image))
        .route("/generate-animation", post(handlers::generate_animation))
        .route("/cartoon-story", post(handlers::cartoon_story))
        .route("/generate-ad", post(handlers::generate_ad))
        .route("/transform-photo", post(handlers::transform_photo));

    Router::new()
        .route("/", get(handlers::root))
        .nest("/api", api)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + FORM_OVERHEAD_BYTES))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    request_id = %Uuid::new_v4(),
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
}

/// Serves `router` until `shutdown` fires, then drains in-flight requests.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    mut shutdown: Box<dyn Shutdown>,
) -> std::io::Result<()> {
    info!(addr = ?listener.local_addr().ok(), "Listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.wait_for_signal().await })
        .await?;
    info!("Server stopped");
    Ok(())
}
