use actix_web::{web, HttpResponse, Responder};
use tracing::Instrument;

use crate::core::EngineError;
use crate::models::{HealthResponse, IngredientQueryRequest, ItemsResponse};
use crate::routes::{validate, AppState};

/// Configure recipe and ingredient routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/recipes/match", web::post().to(match_recipes))
        .route("/ingredients/compatible", web::post().to(compatible_ingredients));
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Recipes ranked by ingredient overlap
///
/// POST /api/v1/recipes/match
///
/// Request body:
/// ```json
/// {
///   "ingredients": ["chicken", "garlic"],
///   "limit": 10
/// }
/// ```
async fn match_recipes(
    state: web::Data<AppState>,
    req: web::Json<IngredientQueryRequest>,
) -> Result<HttpResponse, EngineError> {
    validate(&*req)?;
    let limit = state.match_limits.resolve(req.limit, "limit")?;

    let span = tracing::info_span!("match_recipes", request_id = %uuid::Uuid::new_v4());
    async move {
        tracing::info!("Matching recipes for {} ingredients, limit: {}", req.ingredients.len(), limit);

        let matches = state.matcher.match_recipes(&req.ingredients, Some(limit)).await?;

        tracing::info!("Returning {} recipes", matches.len());
        Ok::<_, EngineError>(HttpResponse::Ok().json(ItemsResponse::from(matches)))
    }
    .instrument(span)
    .await
}

/// Novel ingredients ranked by compatibility with the known set
///
/// POST /api/v1/ingredients/compatible
///
/// Request body:
/// ```json
/// {
///   "ingredients": ["chicken", "garlic"],
///   "limit": 10
/// }
/// ```
async fn compatible_ingredients(
    state: web::Data<AppState>,
    req: web::Json<IngredientQueryRequest>,
) -> Result<HttpResponse, EngineError> {
    validate(&*req)?;
    let limit = state.match_limits.resolve(req.limit, "limit")?;

    let span = tracing::info_span!("compatible_ingredients", request_id = %uuid::Uuid::new_v4());
    async move {
        tracing::info!("Finding ingredients compatible with {} known, limit: {}", req.ingredients.len(), limit);

        let candidates = state
            .compatibility
            .find_compatible_ingredients(&req.ingredients, Some(limit))
            .await?;

        tracing::info!("Returning {} candidates", candidates.len());
        Ok::<_, EngineError>(HttpResponse::Ok().json(ItemsResponse::from(candidates)))
    }
    .instrument(span)
    .await
}
