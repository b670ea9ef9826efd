use std::collections::BTreeSet;
use std::sync::Arc;

use crate::core::{rank_by_overlap, rank_compatible_ingredients, EngineError, EngineResult};
use crate::models::{CompatibilityCandidate, MatchResult};
use crate::services::graph::{GraphStore, GraphStoreError};

/// Distinct query ingredients in a stable order
fn distinct(ingredients: &[String]) -> Vec<String> {
    ingredients
        .iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn upstream(err: GraphStoreError) -> EngineError {
    tracing::error!("Graph store query failed: {}", err);
    err.into()
}

/// Exact ingredient-overlap ranking over the recipe graph
#[derive(Clone)]
pub struct GraphMatchEngine {
    store: Arc<dyn GraphStore>,
}

impl GraphMatchEngine {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Recipes sharing at least one ingredient with `ingredients`, best overlap first
    ///
    /// An empty ingredient set matches nothing and never reaches the store.
    /// `None` for `limit` returns every match; callers cap it.
    pub async fn match_recipes(
        &self,
        ingredients: &[String],
        limit: Option<usize>,
    ) -> EngineResult<Vec<MatchResult>> {
        let query = distinct(ingredients);
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let neighborhoods = self.store.recipes_touching(&query).await.map_err(upstream)?;
        let candidates = neighborhoods.len();
        let results = rank_by_overlap(&query, neighborhoods, limit);

        tracing::debug!("Ranked {} of {} touching recipes", results.len(), candidates);

        Ok(results)
    }
}

/// Novel-ingredient discovery ("mix-and-max") over the recipe graph
#[derive(Clone)]
pub struct CompatibilityEngine {
    store: Arc<dyn GraphStore>,
}

impl CompatibilityEngine {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Ingredients outside `known` ranked by compatibility with it
    ///
    /// Recomputed in full on every call.
    pub async fn find_compatible_ingredients(
        &self,
        known: &[String],
        limit: Option<usize>,
    ) -> EngineResult<Vec<CompatibilityCandidate>> {
        let known = distinct(known);
        if known.is_empty() {
            return Ok(Vec::new());
        }

        let neighborhoods = self.store.recipes_touching(&known).await.map_err(upstream)?;
        let candidates = rank_compatible_ingredients(&known, &neighborhoods, limit);

        tracing::debug!(
            "Found {} compatible ingredients across {} recipes",
            candidates.len(),
            neighborhoods.len()
        );

        Ok(candidates)
    }
}
