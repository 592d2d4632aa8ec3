use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post, put};
use axum::{middleware as axum_middleware, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config;
use crate::database::Database;
use crate::handlers::{admin, protected, public};
use crate::middleware::{optional_auth, require_auth, require_staff};

pub fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Public auth routes (rate-limited inside the handlers)
        .merge(auth_public_routes())
        // Public catalog browse
        .merge(catalog_routes())
        // Split-visibility routes: anonymous reads, authenticated writes
        .merge(mixed_routes())
        // Authenticated user surface
        .merge(user_routes())
        // Staff surface
        .merge(admin_routes())
        // Global middleware
        .layer(DefaultBodyLimit::max(config::config().api.max_request_size_bytes))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn auth_public_routes() -> Router {
    use public::auth;

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/password/reset", post(auth::password_reset_request))
        .route("/auth/password/reset/confirm", post(auth::password_reset_confirm))
}

fn catalog_routes() -> Router {
    use public::catalog;

    Router::new()
        .route("/api/series", get(catalog::series_list))
        .route("/api/series/:id", get(catalog::series_get))
        // Reference listings: /api/genres, /api/tags, /api/studios,
        // /api/platforms (static sibling routes take precedence)
        .route("/api/:kind", get(catalog::reference_list))
}

/// Routes readable without a session but writable only with one. The
/// optional resolver attaches a Principal when a valid token is present;
/// the handlers' own gates enforce the rest.
fn mixed_routes() -> Router {
    use protected::{comments, lists};
    use public::catalog;

    Router::new()
        .route(
            "/api/series/:id/comments",
            get(catalog::series_comments).post(comments::create),
        )
        .route("/api/lists/:id", get(lists::detail).delete(lists::delete))
        .route("/api/lists/:id/entries/:series_id", post(lists::entry_toggle))
        .layer(axum_middleware::from_fn(optional_auth))
}

fn user_routes() -> Router {
    use protected::{auth, comments, lists, notifications, series, users};

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/auth/password", put(auth::change_password))
        .route("/api/users/:id/follow", post(users::follow_toggle))
        .route("/api/users/:id/followers", get(users::followers))
        .route("/api/users/:id/following", get(users::following))
        .route("/api/series/:id/favourite", post(series::favourite_toggle))
        .route("/api/series/:id/tracking", post(series::tracking_toggle))
        .route("/api/lists", get(lists::index).post(lists::create))
        .route("/api/comments/:id", axum::routing::delete(comments::delete))
        .route("/api/notifications", get(notifications::index))
        .route("/api/notifications/read-all", put(notifications::mark_all_read))
        .route("/api/notifications/:id/read", put(notifications::mark_read))
        .route(
            "/api/settings",
            get(notifications::get_settings).put(notifications::put_settings),
        )
        .layer(axum_middleware::from_fn(require_auth))
}

fn admin_routes() -> Router {
    use admin::{catalog, series, users};

    Router::new()
        .route("/api/admin/users", get(users::index))
        .route("/api/admin/users/:id/roles", put(users::set_roles))
        .route("/api/admin/users/:id/deactivate", put(users::deactivate))
        .route("/api/admin/series", post(series::create))
        .route(
            "/api/admin/series/:id",
            put(series::update).delete(series::delete),
        )
        .route("/api/admin/:kind", post(catalog::create))
        .route(
            "/api/admin/:kind/:id",
            put(catalog::update).delete(catalog::delete),
        )
        // Coarse staff gate for the whole surface; handlers declare the
        // finer role sets per operation
        .layer(axum_middleware::from_fn(require_staff))
        .layer(axum_middleware::from_fn(require_auth))
}

fn cors_layer() -> CorsLayer {
    let security = &config::config().security;
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Anitomo API",
            "version": version,
            "description": "Anime/manga tracking backend",
            "endpoints": {
                "home": "/ (public)",
                "auth": "/auth/register, /auth/login, /auth/password/reset (public)",
                "catalog": "/api/series, /api/genres, /api/tags, /api/studios, /api/platforms (public)",
                "social": "/api/users/:id/follow, /api/series/:id/favourite, /api/lists (authenticated)",
                "notifications": "/api/notifications, /api/settings (authenticated)",
                "admin": "/api/admin/* (staff roles)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match Database::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                axum::http::StatusCode::SERVICE_UNAVAILABLE,
                axum::response::Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": "unreachable"
                    }
                })),
            )
        }
    }
}

/// Port resolution: ANITOMO_API_PORT, then PORT, then 3000
pub fn resolve_port() -> u16 {
    std::env::var("ANITOMO_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000)
}

pub async fn serve(port: u16) -> anyhow::Result<()> {
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Anitomo API listening on http://{}", bind_addr);
    axum::serve(listener, app()).await?;
    Ok(())
}
