use actix_cors::Cors;
use actix_web::{error, middleware, web, App, HttpResponse, HttpServer};
use recipe_match::config::Settings;
use recipe_match::core::{EngineError, QueryCatalog};
use recipe_match::routes::{self, AppState};
use recipe_match::services::{
    CompatibilityEngine, ElasticClient, GraphMatchEngine, GraphStore, Neo4jClient, RelevanceSearchClient,
    SearchAuth, SearchBackend,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Handle JSON payload errors
fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    let body = EngineError::validation(format!("Invalid JSON: {}", err)).to_response();
    error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
}

/// Handle query payload errors
fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    let body = EngineError::validation(format!("Invalid query: {}", err)).to_response();
    error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
}

/// Credentials for the search cluster; an API key wins over basic auth
fn search_auth(settings: &Settings) -> SearchAuth {
    match (&settings.search.api_key, &settings.search.username, &settings.search.password) {
        (Some(key), _, _) => SearchAuth::ApiKey(key.clone()),
        (None, Some(username), Some(password)) => SearchAuth::Basic {
            username: username.clone(),
            password: password.clone(),
        },
        _ => SearchAuth::None,
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    // Initialize logging; LOG_LEVEL / LOG_FORMAT override the configured values
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| settings.logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| settings.logging.format.clone());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .with_target(false)
        .with_level(true);

    match log_format.as_str() {
        "pretty" => subscriber.pretty().init(),
        "compact" => subscriber.compact().init(),
        _ => subscriber.init(),
    }

    info!("Starting Recipe Match service...");
    info!("Configuration loaded successfully");

    // Store clients are built once and shared by every worker
    let graph: Arc<dyn GraphStore> = Arc::new(
        Neo4jClient::new(
            settings.graph.endpoint.clone(),
            settings.graph.database.clone(),
            settings.graph.username.clone(),
            settings.graph.password.clone(),
            settings.graph.request_timeout(),
        )
        .map_err(|e| {
            error!("Failed to create graph client: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
        })?
        .with_max_candidates(settings.graph.max_candidates),
    );

    info!("Graph client initialized ({})", settings.graph.endpoint);

    let search: Arc<dyn SearchBackend> = Arc::new(
        ElasticClient::new(
            settings.search.endpoint.clone(),
            settings.search.index.clone(),
            search_auth(&settings),
            settings.search.request_timeout(),
        )
        .map_err(|e| {
            error!("Failed to create search client: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
        })?,
    );

    info!("Search client initialized ({}/{})", settings.search.endpoint, settings.search.index);

    let catalog = QueryCatalog::standard();
    info!("Query catalog loaded with {} templates", catalog.len());

    // Build application state
    let app_state = AppState {
        matcher: GraphMatchEngine::new(graph.clone()),
        compatibility: CompatibilityEngine::new(graph),
        relevance: RelevanceSearchClient::new(search, catalog, settings.search.limits()),
        match_limits: settings.matching.limits(),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
