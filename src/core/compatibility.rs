use std::collections::{BTreeMap, HashSet};

use crate::models::{CompatibilityCandidate, RecipeNeighborhood};

/// Per-ingredient running totals across the recipes it appears in
#[derive(Debug, Default)]
struct CandidateTally {
    recipe_count: usize,
    overlap_sum: usize,
    rating_sum: f64,
    rating_samples: usize,
}

/// Compatibility score for a novel ingredient
///
/// score = mean overlap * log10(recipe count)
///
/// An ingredient seen in a single recipe scores exactly zero however strong
/// the overlap was, since log10(1) = 0.
#[inline]
pub fn compatibility_score(ingredient_compatibility: f64, recipe_count: usize) -> f64 {
    if recipe_count == 0 {
        return 0.0;
    }
    ingredient_compatibility * (recipe_count as f64).log10()
}

/// Rank novel ingredients by how well they pair with a known set ("mix-and-max")
///
/// # Pipeline Stages
/// 1. Keep recipes sharing at least one known ingredient and holding at least
///    one novel ingredient; overlap = distinct known ingredients in the recipe
/// 2. Per-recipe mean review rating (recipes without reviews give no sample)
/// 3. Group by novel ingredient: recipe count, mean of rating samples, mean overlap
/// 4. Rank by `compatibility_score` descending
///
/// Ties fall back to mean overlap, then recipe count (both descending), then
/// ingredient name ascending.
pub fn rank_compatible_ingredients(
    known: &[String],
    neighborhoods: &[RecipeNeighborhood],
    limit: Option<usize>,
) -> Vec<CompatibilityCandidate> {
    let known: HashSet<&str> = known.iter().map(String::as_str).collect();
    if known.is_empty() {
        return Vec::new();
    }

    let mut seen_recipes = HashSet::new();
    let mut tallies: BTreeMap<&str, CandidateTally> = BTreeMap::new();

    for neighborhood in neighborhoods {
        if !seen_recipes.insert(neighborhood.recipe.recipe_id) {
            continue;
        }

        // Stage 1
        let ingredients = neighborhood.ingredient_set();
        let overlap = ingredients.iter().filter(|name| known.contains(*name)).count();
        if overlap == 0 {
            continue;
        }

        // Stage 2
        let recipe_rating = neighborhood.mean_rating();

        // Stage 3
        for novel in ingredients.iter().filter(|name| !known.contains(*name)) {
            let tally = tallies.entry(*novel).or_default();
            tally.recipe_count += 1;
            tally.overlap_sum += overlap;
            if let Some(rating) = recipe_rating {
                tally.rating_sum += rating;
                tally.rating_samples += 1;
            }
        }
    }

    // Stage 4
    let mut candidates: Vec<CompatibilityCandidate> = tallies
        .into_iter()
        .map(|(name, tally)| {
            let ingredient_compatibility = tally.overlap_sum as f64 / tally.recipe_count as f64;
            let avg_rating = (tally.rating_samples > 0)
                .then(|| tally.rating_sum / tally.rating_samples as f64);

            CompatibilityCandidate {
                ingredient_name: name.to_string(),
                recipe_count: tally.recipe_count,
                avg_rating,
                ingredient_compatibility,
                compatibility_score: compatibility_score(ingredient_compatibility, tally.recipe_count),
            }
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.compatibility_score
            .partial_cmp(&a.compatibility_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                b.ingredient_compatibility
                    .partial_cmp(&a.ingredient_compatibility)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| b.recipe_count.cmp(&a.recipe_count))
            .then_with(|| a.ingredient_name.cmp(&b.ingredient_name))
    });

    if let Some(limit) = limit {
        candidates.truncate(limit);
    }

    candidates
}
