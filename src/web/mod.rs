use std::sync::Arc;

use axum::{
    extract::FromRef,
    middleware::{from_fn, from_fn_with_state},
    response::Redirect,
    routing::{delete, get, get_service, patch, post, put},
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL};
use sqlx::SqlitePool;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;

pub mod extract;
pub mod middleware;
pub mod routes;

use self::middleware::{auth as auth_middleware, locale as locale_middleware};
use self::routes::{activities, activity, admin, auth, calendar, docs, notifications};

/// Shared by every handler: the pool plus read-only settings.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: AppConfig) -> Self {
        Self {
            pool,
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(|| async { Redirect::to("/static/index.html") }))
        .route("/health", get(docs::health_handler))
        .route("/openapi.json", get(docs::openapi_handler))
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/activities", get(activities::activities_handler))
        .route("/activities/:name", get(activity::activity_handler))
        .route("/activities/:name/waitlist", get(activity::waitlist_handler))
        .route(
            "/activities/:name/calendar.ics",
            get(calendar::activity_calendar_handler),
        );

    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/me", get(auth::me_handler))
        .route("/activities/:name/signup", post(activity::signup_handler))
        .route(
            "/activities/:name/unregister",
            delete(activity::unregister_handler),
        )
        .route(
            "/me/registrations",
            get(activities::my_registrations_handler),
        )
        .route("/me/calendar.ics", get(calendar::my_calendar_handler))
        .route("/notifications", get(notifications::list_handler))
        .route(
            "/notifications/:id/read",
            post(notifications::mark_read_handler),
        )
        .layer(from_fn_with_state(
            state.clone(),
            auth_middleware::require_auth,
        ));

    // require_admin runs after require_auth: the later layer is the outer one
    let admin_routes = Router::new()
        .route("/admin", get(admin::panel_handler))
        .route("/admin/activities", post(admin::create_activity_handler))
        .route(
            "/admin/activities/:name",
            patch(admin::update_activity_handler)
                .delete(admin::delete_activity_handler),
        )
        .route("/admin/users", get(admin::users_handler))
        .route("/admin/users/:email/role", put(admin::set_role_handler))
        .route(
            "/admin/export/registrations",
            get(admin::export_registrations_handler),
        )
        .layer(from_fn(auth_middleware::require_admin))
        .layer(from_fn_with_state(
            state.clone(),
            auth_middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .nest_service(
            "/static",
            get_service(ServeDir::new(&state.config.static_dir)),
        )
        .layer(from_fn(locale_middleware::localize_errors))
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .with_state(state)
}
