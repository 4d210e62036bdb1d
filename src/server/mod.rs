mod handlers;
mod state;

use axum::routing::get;
use axum::Router;
use state::AppState;
use std::io;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::city::CityReferenceTable;
use crate::location::{CityStore, LocationService, ReverseGeocoder};

pub fn build_router(geocoder: Box<dyn ReverseGeocoder>, table: Arc<CityReferenceTable>) -> Router {
    let store = Arc::new(CityStore::new());
    let state = Arc::new(AppState {
        service: Mutex::new(LocationService::new(geocoder, store.clone(), table.clone())),
        store,
        table,
    });

    Router::new()
        .route("/api/transform", get(handlers::transform))
        .route("/api/city-id", get(handlers::city_id))
        .route("/api/cities", get(handlers::city_list))
        .route("/api/locate", get(handlers::locate))
        .route("/api/state", get(handlers::store_state))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, router: Router) -> io::Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("mars-locator listening on http://{}", addr);
    axum::serve(listener, router).await
}
