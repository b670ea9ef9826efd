use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request body shared by the recipe-match and compatibility endpoints
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IngredientQueryRequest {
    #[validate(length(max = 64))]
    #[serde(alias = "knownIngredients")]
    pub ingredients: Vec<String>,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Request body for the generated loose/anchored relevance queries
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IngredientSearchRequest {
    #[validate(length(min = 1, max = 64))]
    pub ingredients: Vec<String>,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub size: Option<i64>,
}

/// Query string for catalog searches
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CatalogSearchParams {
    #[validate(range(min = 0))]
    #[serde(default)]
    pub size: Option<i64>,
}
