use std::collections::{BTreeSet, HashSet};

use crate::models::{MatchResult, RecipeNeighborhood};

/// Rank recipes by exact ingredient overlap with the query set
///
/// `matchingScore` is the number of distinct query ingredients the recipe
/// contains. Recipes sharing nothing with the query are dropped rather than
/// scored zero. Ordering is score descending, then recipe id ascending.
///
/// # Arguments
/// * `query` - Query ingredient names, compared as exact strings
/// * `neighborhoods` - Candidate recipes with their ingredient lists
/// * `limit` - Maximum number of results; `None` returns every match
pub fn rank_by_overlap(
    query: &[String],
    neighborhoods: Vec<RecipeNeighborhood>,
    limit: Option<usize>,
) -> Vec<MatchResult> {
    if query.is_empty() {
        return Vec::new();
    }

    let query: HashSet<&str> = query.iter().map(String::as_str).collect();
    let mut seen_recipes = HashSet::new();

    let mut results: Vec<MatchResult> = neighborhoods
        .into_iter()
        .filter(|n| seen_recipes.insert(n.recipe.recipe_id))
        .filter_map(|n| {
            let matching: BTreeSet<String> = n
                .ingredient_set()
                .into_iter()
                .filter(|name| query.contains(name))
                .map(str::to_string)
                .collect();

            if matching.is_empty() {
                return None;
            }

            Some(MatchResult {
                recipe: n.recipe,
                matching_score: matching.len(),
                matching_ingredient_names: matching,
            })
        })
        .collect();

    results.sort_by(|a, b| {
        b.matching_score
            .cmp(&a.matching_score)
            .then_with(|| a.recipe.recipe_id.cmp(&b.recipe.recipe_id))
    });

    if let Some(limit) = limit {
        results.truncate(limit);
    }

    results
}
