use std::sync::Arc;

use axum::{Router, routing::get};
use mongodb_connector::catalog_store::CatalogStore;
use mongodb_connector::category_store::CategoryStore;
use mongodb_connector::connector;
use tokio::net::TcpListener;
use tracing::info;
use utils::logger::configure_logger;

mod routes;
mod service_layers;

use service_layers::build_service_layers;

pub(crate) struct ServerState {
    categories: CategoryStore,
    catalog: CatalogStore,
}

#[tokio::main]
async fn main() {
    configure_logger();

    info!("connecting to MongoDB");
    let (client, db) = connector::connect().await.expect("failed to connect to MongoDB");

    let catalog = CatalogStore::new(&db, client)
        .await
        .expect("failed to initialize catalog store");
    let categories = CategoryStore::new(&db);

    let state = Arc::new(ServerState { categories, catalog });

    info!("starting read API");

    let router = Router::new()
        .route("/api/categories", get(routes::categories::categories_handler))
        .route("/api/goods_history", get(routes::history::history_handler))
        .with_state(state)
        .layer(build_service_layers());

    let listener = TcpListener::bind("0.0.0.0:3001")
        .await
        .expect("failed to bind read API listener");

    axum::serve(listener, router)
        .await
        .expect("read API server stopped unexpectedly");
}
