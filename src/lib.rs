use std::sync::Arc;

use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod controllers;
pub mod db;
pub mod errors;
pub mod models;
pub mod routers;
pub mod secrets;
pub mod validator;

use controllers::SongController;
use db::SongStore;
use routers::song_routes;
use secrets::CorsOrigins;

/// Builds the songs API router around an already constructed store.
pub fn app(store: Arc<dyn SongStore>, cors: CorsLayer) -> Router {
    song_routes()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(SongController::new(store))
}

pub fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    // Credentials may only be combined with an explicit origin list.
    match origins {
        CorsOrigins::Any => cors.allow_origin(Any),
        CorsOrigins::List(list) => cors
            .allow_origin(AllowOrigin::list(list.clone()))
            .allow_credentials(true),
    }
}
