// src/main.rs

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
};
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Deklaracje modułów
mod config; // dla src/config.rs
mod errors; // dla src/errors.rs
mod htmx_handlers; // dla src/htmx_handlers.rs
mod models; // dla src/models.rs
mod notifications; // dla src/notifications.rs
mod preview; // dla src/preview.rs
mod product_api; // dla src/product_api.rs
mod response; // dla src/response.rs
mod session; // dla src/session.rs
mod staging; // dla src/staging.rs
mod state; // dla src/state.rs

use crate::config::AppConfig;
use crate::htmx_handlers::*;
use crate::preview::PreviewRegistry;
use crate::product_api::HttpProductApi;
use crate::session::{FormStore, require_api_session, require_session};
use crate::state::AppState;

pub fn build_router(app_state: AppState) -> Router {
    let max_upload_bytes = app_state.config.max_upload_bytes;

    // Strona formularza: bez tokenu przekierowanie do logowania
    let page = Router::new()
        .route("/admin/products/new", get(new_product_page_handler))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            require_session,
        ));

    // Trasy htmx formularza i podglądy: bez tokenu 401
    let form_routes = Router::new()
        .route(
            "/htmx/admin/product-form",
            delete(discard_form_htmx_handler),
        )
        .route(
            "/htmx/admin/product-form/field",
            post(update_field_htmx_handler),
        )
        .route(
            "/htmx/admin/product-form/attachments",
            post(upload_attachments_htmx_handler),
        )
        .route(
            "/htmx/admin/product-form/attachments/{id}",
            delete(remove_attachment_htmx_handler),
        )
        .route(
            "/htmx/admin/product-form/drag/start/{index}",
            post(drag_start_htmx_handler),
        )
        .route(
            "/htmx/admin/product-form/drag/over/{index}",
            post(drag_over_htmx_handler),
        )
        .route(
            "/htmx/admin/product-form/drag/leave",
            post(drag_leave_htmx_handler),
        )
        .route(
            "/htmx/admin/product-form/drag/end",
            post(drag_end_htmx_handler),
        )
        .route(
            "/htmx/admin/product-form/drop/{from}/{to}",
            post(drop_attachment_htmx_handler),
        )
        .route(
            "/htmx/admin/product-form/previews/{key}",
            get(preview_handler),
        )
        .route(
            "/htmx/admin/product-form/submit",
            post(submit_product_htmx_handler),
        )
        .route_layer(middleware::from_fn(require_api_session));

    Router::new()
        .merge(page)
        .merge(form_routes)
        .route("/logout", post(logout_handler))
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(app_state)
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    // Inicjalizacja systemu logowania (tracing)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "car_export_admin=debug,tower_http=debug".into()), // np. RUST_LOG=info cargo run
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Inicjalizacja serwera...");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Niepoprawna konfiguracja: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        "API produktów: {}, limit załączników: {}",
        config.product_api_url,
        config.max_attachments
    );

    let app_state = AppState {
        product_api: Arc::new(HttpProductApi::new(config.product_api_url.clone())),
        forms: FormStore::new(
            PreviewRegistry::new(),
            config.max_attachments,
            config.form_idle,
            config.max_form_sessions,
        ),
        config: Arc::new(config),
    };

    let addr = app_state.config.bind_addr;
    let app = build_router(app_state);

    tracing::info!("Serwer nasłuchuje na {}", addr);

    // Utworzenie listenera TCP
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Nie można powiązać adresu {}: {}", addr, e);
            return; // Zakończ, jeśli nie można uruchomić serwera
        }
    };

    // Uruchomienie serwera Axum
    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
        tracing::error!("Błąd serwera: {}", e);
    }
}
