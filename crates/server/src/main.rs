mod auth;
mod handlers;
mod pagination;
mod policy;
mod scanner;
mod schema;
mod storage;
mod validation;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use aide::{
    axum::ApiRouter,
    openapi::{Info, OpenApi},
};
use axum::{
    http::Method,
    middleware::from_fn_with_state,
    Extension, Router, Server,
};
use common::{config::Config, logging, s3};
use db::{Database, DatabaseConnection};
use storage::BlobStorage;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::new()?;

    logging::init(&config);

    let Some(address) = config.server.as_ref().map(|server| server.address) else {
        return Err(anyhow::Error::msg("unable to load server config"));
    };

    info!("connecting to database");
    let database = Arc::new(Database::connect(&config.database.url).await?);
    let storage = Arc::new(s3::ConfiguredClient::new(&config.storage).await);
    let server = Server::bind(&address);
    let config = Arc::new(config);

    info!(%address, "starting API server");

    server
        .serve(app_router(database, config, storage).into_make_service())
        .await?;

    Ok(())
}

/// Cross-origin policy for browser clients.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

fn app_router(
    database: Arc<DatabaseConnection>,
    config: Arc<Config>,
    storage: Arc<dyn BlobStorage>,
) -> Router {
    let mut api = OpenApi {
        info: Info {
            title: String::from("Loft Manager API"),
            version: String::from(env!("CARGO_PKG_VERSION")),
            ..Info::default()
        },
        ..OpenApi::default()
    };

    let protected_routes = ApiRouter::new()
        .nest("/users", handlers::users::routes())
        .nest("/teams", handlers::teams::routes())
        .nest("/birds", handlers::birds::routes())
        .nest("/eventTypes", handlers::event_types::routes())
        .nest("/raceTypes", handlers::race_types::routes())
        .nest("/feeSchemes", handlers::fee_schemes::routes())
        .nest("/prizeSchemes", handlers::prize_schemes::routes())
        .nest("/bettingSchemes", handlers::betting_schemes::routes())
        .nest("/events", handlers::events::routes())
        .nest("/eventInventories", handlers::event_inventories::routes())
        .nest("/races", handlers::races::routes())
        .nest("/baskets", handlers::baskets::routes())
        .nest("/payments", handlers::payments::routes())
        .route_layer(from_fn_with_state(
            database.clone(),
            auth::require_authentication,
        ));

    ApiRouter::new()
        .merge(protected_routes)
        .nest("/auth", handlers::auth::routes(database.clone()))
        .nest("/docs", handlers::docs::routes())
        .finish_api(&mut api)
        .layer(Extension(Arc::new(api)))
        .layer(Extension(config))
        .layer(Extension(storage))
        .layer(cors())
        .with_state(database)
}
