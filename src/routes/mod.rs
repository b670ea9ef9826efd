// Route exports
pub mod recipes;
pub mod search;

use actix_web::web;
use validator::Validate;

use crate::core::{EngineError, ResultLimits};
use crate::services::{CompatibilityEngine, GraphMatchEngine, RelevanceSearchClient};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub matcher: GraphMatchEngine,
    pub compatibility: CompatibilityEngine,
    pub relevance: RelevanceSearchClient,
    pub match_limits: ResultLimits,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(recipes::configure)
            .configure(search::configure),
    );
}

/// Run `validator` checks, reporting failures as validation errors
pub(crate) fn validate<T: Validate>(request: &T) -> Result<(), EngineError> {
    request.validate().map_err(|errors| {
        tracing::info!("Validation failed: {}", errors);
        EngineError::validation(errors.to_string())
    })
}
