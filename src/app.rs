use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
};
use tower_http::cors::CorsLayer;

use crate::{
    config::AppConfig,
    database,
    error::{AppError, Result},
    middleware::caller_middleware,
    routes,
    services::{CatalogService, MediaUrlService, OrderService},
    store::{CatalogStore, MemoryStore, OrderStore, PgStore, StoreHealth},
};

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub orders: OrderService,
    pub media: MediaUrlService,
    pub store_health: Arc<dyn StoreHealth>,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn with_store<S>(store: Arc<S>, config: &AppConfig) -> Self
    where
        S: CatalogStore + OrderStore + StoreHealth + 'static,
    {
        let catalog: Arc<dyn CatalogStore> = store.clone();
        let orders: Arc<dyn OrderStore> = store.clone();

        Self {
            catalog: CatalogService::new(catalog.clone()),
            orders: OrderService::new(orders, catalog),
            media: MediaUrlService::new(config.media.public_base_url.clone()),
            store_health: store,
            jwt_secret: Arc::from(config.auth.jwt_secret.as_str()),
        }
    }
}

pub async fn build(config: &AppConfig) -> Result<Router> {
    let state = match config.database.url {
        Some(ref url) => {
            let pool = database::create_pool(url, &config.database).await?;
            AppState::with_store(Arc::new(PgStore::new(pool)), config)
        }
        None => {
            tracing::warn!("DB_URL not set, using the in-memory store; data will not persist");
            AppState::with_store(Arc::new(MemoryStore::new()), config)
        }
    };

    router(state, config)
}

pub fn router(state: AppState, config: &AppConfig) -> Result<Router> {
    let allowed_origins: Vec<HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| AppError::ConfigError(format!("Invalid CORS origin: {}", origin)))
        })
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .allow_origin(allowed_origins);

    let app = routes::create_router()
        .layer(middleware::from_fn_with_state(
            state.clone(),
            caller_middleware,
        ))
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(cors)
        .with_state(state);

    Ok(app)
}
