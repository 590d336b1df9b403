use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error};
use std::sync::Arc;
use tracing::{info, error, warn};
use tracing_subscriber::EnvFilter;
use workwear_sizing::config::{Settings, StorageBackend};
use workwear_sizing::core::SizeResolver;
use workwear_sizing::models::ErrorResponse;
use workwear_sizing::routes::{self, sizing::AppState};
use workwear_sizing::services::{
    CatalogCache, CatalogStore, MemoryStore, PostgresStore, RecordStore, SeedData, SizingService,
    TokenVerifier,
};

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    let response = HttpResponse::BadRequest().json(ErrorResponse {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    });
    error::InternalError::from_response(err, response).into()
}

/// Handle path parameter errors (e.g. malformed UUIDs)
pub fn handle_path_error(err: error::PathError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(ErrorResponse {
        error: "invalid_path".to_string(),
        message: format!("Invalid path: {}", err),
        status_code: 400,
    });
    error::InternalError::from_response(err, response).into()
}

fn init_logging(settings: &Settings) {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| settings.logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| settings.logging.format.clone());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    init_logging(&settings);
    info!("Starting workwear sizing service...");

    // Storage handles are created once here and passed down explicitly
    let mut postgres: Option<Arc<PostgresStore>> = None;
    let (catalog, records): (Arc<dyn CatalogStore>, Arc<dyn RecordStore>) = match settings.storage.backend {
        StorageBackend::Postgres => {
            let store = PostgresStore::from_settings(
                &settings.database.url,
                settings.database.max_connections,
                settings.database.min_connections,
                settings.database.acquire_timeout_secs,
                settings.database.idle_timeout_secs,
            )
            .await
            .map_err(|e| {
                error!("Failed to connect to PostgreSQL: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
            })?;

            let store = Arc::new(store);
            postgres = Some(store.clone());
            info!(
                "PostgreSQL store initialized (max: {} connections)",
                settings.database.max_connections.unwrap_or(10)
            );
            let catalog: Arc<dyn CatalogStore> = store.clone();
            let records: Arc<dyn RecordStore> = store;
            (catalog, records)
        }
        StorageBackend::Memory => {
            info!("Using in-memory store; data is lost on shutdown");
            let store = Arc::new(MemoryStore::new());

            match &settings.storage.seed_path {
                Some(path) => {
                    let seed = SeedData::load(path).map_err(|e| {
                        error!("Failed to read seed file {}: {}", path, e);
                        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
                    })?;
                    let count = seed.apply(&store).await.map_err(|e| {
                        error!("Failed to apply seed file {}: {}", path, e);
                        std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
                    })?;
                    info!("Seeded {} garments from {}", count, path);
                }
                None => warn!("No storage.seed_path set; the in-memory catalog is empty"),
            }

            let catalog: Arc<dyn CatalogStore> = store.clone();
            let records: Arc<dyn RecordStore> = store;
            (catalog, records)
        }
    };

    let cache = Arc::new(CatalogCache::new(
        catalog,
        settings.cache.capacity,
        settings.cache.ttl_secs,
    ));
    info!(
        "Catalog cache initialized (capacity: {}, TTL: {}s)",
        settings.cache.capacity, settings.cache.ttl_secs
    );

    let resolver = SizeResolver::new(settings.sizing.default_label.clone());
    info!("Size resolver initialized with default label {}", resolver.default_label());

    let app_state = AppState {
        service: SizingService::new(cache, records, resolver),
        verifier: TokenVerifier::new(&settings.auth.jwt_secret, settings.auth.leeway_secs),
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    let result = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::PathConfig::default().error_handler(handle_path_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await;

    if let Some(store) = postgres {
        store.close().await;
    }
    info!("Workwear sizing service stopped");

    result
}
