use actix_web::{web, HttpResponse};
use tracing::Instrument;

use crate::core::EngineError;
use crate::models::{CatalogEntry, CatalogSearchParams, IngredientSearchRequest, ItemsResponse};
use crate::routes::{validate, AppState};

/// Configure relevance search routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/search/catalog", web::get().to(list_catalog))
        .route("/search/catalog/{key}", web::get().to(search_catalog))
        .route("/search/loose", web::post().to(search_loose))
        .route("/search/anchored", web::post().to(search_anchored));
}

/// List the cataloged relevance queries
async fn list_catalog(state: web::Data<AppState>) -> HttpResponse {
    let entries: Vec<CatalogEntry> = state
        .relevance
        .catalog()
        .entries()
        .map(|(query, template)| CatalogEntry {
            key: query.key().to_string(),
            description: template.description.clone(),
        })
        .collect();

    HttpResponse::Ok().json(ItemsResponse::from(entries))
}

/// Run a cataloged relevance query
///
/// GET /api/v1/search/catalog/{key}?size=10
///
/// Hit-producing queries answer `{"items": [...]}`; aggregating queries
/// answer with the aggregation object as returned by the index.
async fn search_catalog(
    state: web::Data<AppState>,
    key: web::Path<String>,
    params: web::Query<CatalogSearchParams>,
) -> Result<HttpResponse, EngineError> {
    validate(&*params)?;

    let span = tracing::info_span!("search_catalog", request_id = %uuid::Uuid::new_v4(), key = %key.as_str());
    async move {
        tracing::info!("Running catalog query {}", key);
        let response = state.relevance.search_catalog(&key, params.size).await?;
        Ok::<_, EngineError>(HttpResponse::Ok().json(response))
    }
    .instrument(span)
    .await
}

/// Ingredient text search where every ingredient is optional
///
/// POST /api/v1/search/loose
async fn search_loose(
    state: web::Data<AppState>,
    req: web::Json<IngredientSearchRequest>,
) -> Result<HttpResponse, EngineError> {
    validate(&*req)?;

    let span = tracing::info_span!("search_loose", request_id = %uuid::Uuid::new_v4());
    async move {
        tracing::info!("Loose ingredient search over {} ingredients", req.ingredients.len());
        let response = state.relevance.search_loose(&req.ingredients, req.size).await?;
        Ok::<_, EngineError>(HttpResponse::Ok().json(response))
    }
    .instrument(span)
    .await
}

/// Ingredient text search anchored on the last ingredient
///
/// POST /api/v1/search/anchored
///
/// Request body:
/// ```json
/// {
///   "ingredients": ["garlic", "lemon", "chicken"],
///   "size": 10
/// }
/// ```
async fn search_anchored(
    state: web::Data<AppState>,
    req: web::Json<IngredientSearchRequest>,
) -> Result<HttpResponse, EngineError> {
    validate(&*req)?;

    let span = tracing::info_span!("search_anchored", request_id = %uuid::Uuid::new_v4());
    async move {
        tracing::info!(
            "Anchored ingredient search on {:?} with {} optional",
            req.ingredients.last(),
            req.ingredients.len().saturating_sub(1)
        );
        let response = state.relevance.search_anchored(&req.ingredients, req.size).await?;
        Ok::<_, EngineError>(HttpResponse::Ok().json(response))
    }
    .instrument(span)
    .await
}
