//! Recipe Match - ingredient-driven recipe and pairing recommendations
//!
//! This library ranks recipes by exact ingredient overlap, discovers novel
//! ingredients that pair well with a known set, and runs cataloged relevance
//! queries against the recipe search index.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{rank_by_overlap, rank_compatible_ingredients, EngineError, QueryCatalog, ResultLimits};
pub use models::{CompatibilityCandidate, MatchResult, Recipe, RecipeNeighborhood, RelevanceHit};
pub use services::{CompatibilityEngine, GraphMatchEngine, GraphStore, RelevanceSearchClient, SearchBackend};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Verify that the library exports work correctly
        let catalog = QueryCatalog::standard();
        assert!(!catalog.is_empty());
    }
}
