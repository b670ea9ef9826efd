// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Recipe, RecipeNeighborhood, MatchResult, CompatibilityCandidate, RelevanceHit};
pub use requests::{IngredientQueryRequest, IngredientSearchRequest, CatalogSearchParams};
pub use responses::{ItemsResponse, HealthResponse, ErrorResponse, CatalogEntry};
