//! Khata Web Server
//!
//! Axum-based REST API for the Khata Telegram Mini App expense tracker.
//!
//! Security features:
//! - Telegram init-data authentication (secure by default, --no-auth for local dev)
//! - Restrictive CORS policy
//! - Input validation before any query is issued
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use khata_core::db::Database;

mod handlers;
pub mod telegram;

pub use telegram::TelegramUser;

/// Maximum JSON request body size (64 KB)
pub const MAX_BODY_SIZE: usize = 64 * 1024;

/// Header carrying raw Telegram init data (alternative to Authorization)
const TG_INIT_DATA_HEADER: &str = "x-telegram-init-data";

/// Authorization scheme prefix for init data, per the Mini App convention
const TMA_SCHEME: &str = "tma ";

/// Dev-mode identity header, honored only when authentication is disabled
const DEV_USER_HEADER: &str = "x-telegram-user-id";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Whether authentication is required (secure by default)
    pub require_auth: bool,
    /// Bot token the init-data signature is verified against
    pub bot_token: Option<String>,
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // Zero-config must be the safe path
            require_auth: true,
            bot_token: None,
            allowed_origins: vec![],
        }
    }
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
}

/// Authentication middleware - validates Telegram init data
///
/// The Mini App sends the raw `initData` string either as
/// `Authorization: tma <init-data>` or in `X-Telegram-Init-Data`. The
/// signature is checked against the configured bot token; handlers then
/// re-read the authenticated identity from the same headers.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.require_auth {
        return next.run(request).await;
    }

    let Some(token) = state.config.bot_token.as_deref() else {
        error!("Authentication required but no bot token configured");
        return unauthorized();
    };

    match init_data_from_headers(request.headers()) {
        Some(init_data) => {
            match telegram::validate_init_data(&init_data, token, chrono::Utc::now()) {
                Ok(user) => {
                    info!(telegram_user_id = user.id, path = %request.uri().path(), "Authenticated via init data");
                    next.run(request).await
                }
                Err(e) => {
                    warn!(error = %e, path = %request.uri().path(), "Invalid init data");
                    unauthorized()
                }
            }
        }
        None => {
            warn!(path = %request.uri().path(), "Unauthorized request - no init data");
            unauthorized()
        }
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "Authentication required"
        })),
    )
        .into_response()
}

/// Pull the raw init-data string out of the request headers
fn init_data_from_headers(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(auth) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(init_data) = auth.strip_prefix(TMA_SCHEME) {
            return Some(init_data.to_string());
        }
    }
    headers
        .get(TG_INIT_DATA_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Resolve the authenticated Telegram identity from request headers.
///
/// With authentication enabled this re-validates the init data the
/// middleware already accepted. With `--no-auth` the identity comes from
/// the `X-Telegram-User-Id` dev header instead.
pub fn get_telegram_user(
    headers: &axum::http::HeaderMap,
    config: &ServerConfig,
) -> Option<TelegramUser> {
    if config.require_auth {
        let token = config.bot_token.as_deref()?;
        let init_data = init_data_from_headers(headers)?;
        telegram::validate_init_data(&init_data, token, chrono::Utc::now()).ok()
    } else {
        let id = headers
            .get(DEV_USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<i64>().ok())?;
        Some(TelegramUser {
            id,
            first_name: None,
            last_name: None,
            username: None,
        })
    }
}

/// Success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Create the application router
pub fn create_router(db: Database, config: ServerConfig) -> Router {
    let state = Arc::new(AppState {
        db,
        config: config.clone(),
    });

    let api_routes = Router::new()
        // Identity
        .route("/me", get(handlers::get_me))
        .route("/users", post(handlers::register_user))
        // Expenses
        .route(
            "/expenses",
            get(handlers::list_expenses).post(handlers::create_expense),
        )
        .route(
            "/expenses/entry-dates",
            get(handlers::expense_entry_dates),
        )
        .route(
            "/expenses/:id",
            axum::routing::delete(handlers::delete_expense),
        )
        // Budget period settings
        .route(
            "/settings",
            get(handlers::get_settings).put(handlers::update_settings),
        )
        // Budget snapshot (the dashboard widget)
        .route("/budget", get(handlers::get_budget_snapshot))
        // Family cohort
        .route("/family", get(handlers::get_family))
        // Onboarding
        .route(
            "/onboarding",
            get(handlers::get_onboarding).put(handlers::update_onboarding),
        );

    // Build CORS layer
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    Router::new()
        // Liveness probes, outside the auth boundary
        .route("/ping", get(handlers::ping))
        .route("/health", get(handlers::health))
        .nest(
            "/api",
            api_routes.layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
}

/// Start the server
pub async fn serve(db: Database, host: &str, port: u16, config: ServerConfig) -> anyhow::Result<()> {
    if !config.require_auth {
        warn!("⚠️  Authentication disabled - do not expose to network!");
    } else if config.bot_token.is_none() {
        anyhow::bail!("Authentication enabled but KHATA_BOT_TOKEN is not set");
    }

    let app = create_router(db, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn unauthorized(msg: &str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}

/// Map core errors onto HTTP statuses: validation failures are the
/// caller's fault, store failures are ours
pub(crate) fn core_error(err: khata_core::Error) -> AppError {
    match err {
        khata_core::Error::InvalidData(msg) => AppError::bad_request(&msg),
        khata_core::Error::NotFound(msg) => AppError::not_found(&msg),
        other => AppError::from(other),
    }
}
