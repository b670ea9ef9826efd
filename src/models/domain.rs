use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Recipe record as stored on the graph `Recipe` node
///
/// Property names follow the recipe dataset (`RecipeId`, `AggregatedRating`, ...)
/// so the same struct reads graph properties and search documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Recipe {
    #[serde(deserialize_with = "recipe_id")]
    pub recipe_id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub aggregated_rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub review_count: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub recipe_servings: Option<f64>,
    /// ISO-8601 duration as imported, e.g. `PT45M`
    #[serde(default, deserialize_with = "lenient_text")]
    pub total_time: Option<String>,
    #[serde(default)]
    pub recipe_category: Option<String>,
    #[serde(default, deserialize_with = "text_list")]
    pub keywords: Vec<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub protein_content: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub calories: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub recipe_instructions: Option<String>,
}

// The recipe dataset was imported from CSV, so the same property can arrive as
// a JSON number, a numeric string, a list or a single delimited string.

fn recipe_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.fract() == 0.0).map(|f| f as i64),
        _ => None,
    }
    .ok_or_else(|| serde::de::Error::custom(format!("invalid RecipeId: {}", value)))
}

/// Numbers or numeric strings; anything else reads as absent
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// A string, or a list of strings joined by newlines
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// A list of strings, or one comma-separated string
fn text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    })
}

impl Recipe {
    /// Minimal recipe carrying only its identity
    pub fn with_id(recipe_id: i64) -> Self {
        Self {
            recipe_id,
            name: None,
            aggregated_rating: None,
            review_count: None,
            recipe_servings: None,
            total_time: None,
            recipe_category: None,
            keywords: Vec::new(),
            protein_content: None,
            calories: None,
            description: None,
            recipe_instructions: None,
        }
    }
}

/// A recipe together with its CONTAINS and FOR neighbourhood
///
/// This is the row shape the graph store hands to both ranking engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeNeighborhood {
    pub recipe: Recipe,
    /// Names of every ingredient the recipe CONTAINS
    #[serde(default)]
    pub ingredients: Vec<String>,
    /// Ratings of every review FOR the recipe
    #[serde(rename = "reviewRatings", default)]
    pub review_ratings: Vec<f64>,
}

impl RecipeNeighborhood {
    /// Distinct ingredient names; a recipe lists an ingredient at most once
    pub fn ingredient_set(&self) -> BTreeSet<&str> {
        self.ingredients.iter().map(String::as_str).collect()
    }

    /// Mean review rating, `None` when the recipe has no reviews
    pub fn mean_rating(&self) -> Option<f64> {
        if self.review_ratings.is_empty() {
            return None;
        }
        Some(self.review_ratings.iter().sum::<f64>() / self.review_ratings.len() as f64)
    }
}

/// Recipe ranked by exact ingredient overlap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub recipe: Recipe,
    #[serde(rename = "matchingScore")]
    pub matching_score: usize,
    #[serde(rename = "matchingIngredientNames")]
    pub matching_ingredient_names: BTreeSet<String>,
}

/// Novel ingredient ranked by compatibility with a known set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityCandidate {
    #[serde(rename = "ingredientName")]
    pub ingredient_name: String,
    #[serde(rename = "recipeCount")]
    pub recipe_count: usize,
    /// Mean of per-recipe mean ratings; `None` when no contributing recipe had a review
    #[serde(rename = "avgRating")]
    pub avg_rating: Option<f64>,
    /// Mean number of known ingredients shared per recipe
    #[serde(rename = "ingredientCompatibility")]
    pub ingredient_compatibility: f64,
    #[serde(rename = "compatibilityScore")]
    pub compatibility_score: f64,
}

/// Single search hit in backend relevance order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceHit {
    pub id: Option<String>,
    pub score: f64,
    /// Recipe document as indexed; kept opaque
    pub document: serde_json::Value,
}
