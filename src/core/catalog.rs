use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::core::error::{EngineError, EngineResult};

/// Free-text field holding the recipe's ingredient list
pub const INGREDIENT_FIELD: &str = "RecipeIngredientParts";

/// Nested review path and its text field
const REVIEWS_PATH: &str = "Reviews";
const REVIEW_TEXT_FIELD: &str = "Reviews.Review";

/// Emits numerator / denominator only when the denominator is present and non-zero
const RATIO_SCRIPT: &str = "if (doc[params.denominator].size() > 0 && doc[params.denominator].value != 0 \
    && doc[params.numerator].size() > 0) { emit(doc[params.numerator].value / doc[params.denominator].value); }";

/// Term combination for a match clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
}

impl Operator {
    fn as_str(&self) -> &'static str {
        match self {
            Operator::And => "and",
            Operator::Or => "or",
        }
    }
}

/// Single leaf or nested clause of a relevance query
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Match {
        field: String,
        query: String,
        operator: Option<Operator>,
        boost: Option<f64>,
    },
    Range {
        field: String,
        gte: Option<f64>,
        lte: Option<f64>,
    },
    Nested {
        path: String,
        clause: Box<Clause>,
    },
}

impl Clause {
    pub fn text(field: &str, query: &str) -> Self {
        Clause::Match {
            field: field.to_string(),
            query: query.to_string(),
            operator: None,
            boost: None,
        }
    }

    pub fn any_of(field: &str, query: &str) -> Self {
        Clause::text(field, query).with_operator(Operator::Or)
    }

    pub fn all_of(field: &str, query: &str) -> Self {
        Clause::text(field, query).with_operator(Operator::And)
    }

    pub fn at_least(field: &str, gte: f64) -> Self {
        Clause::Range { field: field.to_string(), gte: Some(gte), lte: None }
    }

    pub fn at_most(field: &str, lte: f64) -> Self {
        Clause::Range { field: field.to_string(), gte: None, lte: Some(lte) }
    }

    pub fn between(field: &str, gte: f64, lte: f64) -> Self {
        Clause::Range { field: field.to_string(), gte: Some(gte), lte: Some(lte) }
    }

    /// Match against the nested review text
    pub fn in_reviews(clause: Clause) -> Self {
        Clause::Nested { path: REVIEWS_PATH.to_string(), clause: Box::new(clause) }
    }

    pub fn with_operator(mut self, op: Operator) -> Self {
        if let Clause::Match { operator, .. } = &mut self {
            *operator = Some(op);
        }
        self
    }

    pub fn boosted(mut self, weight: f64) -> Self {
        match &mut self {
            Clause::Match { boost, .. } => *boost = Some(weight),
            Clause::Nested { clause, .. } => {
                let inner = (**clause).clone();
                **clause = inner.boosted(weight);
            }
            Clause::Range { .. } => {}
        }
        self
    }

    /// Field the clause targets, nested clauses report their inner field
    pub fn field(&self) -> &str {
        match self {
            Clause::Match { field, .. } | Clause::Range { field, .. } => field,
            Clause::Nested { clause, .. } => clause.field(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Clause::Match { field, query, operator: None, boost: None } => {
                json!({ "match": { field.as_str(): query } })
            }
            Clause::Match { field, query, operator, boost } => {
                let mut body = Map::new();
                body.insert("query".into(), json!(query));
                if let Some(op) = operator {
                    body.insert("operator".into(), json!(op.as_str()));
                }
                if let Some(boost) = boost {
                    body.insert("boost".into(), json!(boost));
                }
                json!({ "match": { field.as_str(): Value::Object(body) } })
            }
            Clause::Range { field, gte, lte } => {
                let mut bounds = Map::new();
                if let Some(gte) = gte {
                    bounds.insert("gte".into(), json!(gte));
                }
                if let Some(lte) = lte {
                    bounds.insert("lte".into(), json!(lte));
                }
                json!({ "range": { field.as_str(): Value::Object(bounds) } })
            }
            Clause::Nested { path, clause } => {
                json!({ "nested": { "path": path, "query": clause.to_json() } })
            }
        }
    }
}

/// Numeric field computed at query time from two stored fields
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedMetric {
    pub name: String,
    pub numerator: String,
    pub denominator: String,
}

impl DerivedMetric {
    pub fn ratio(name: &str, numerator: &str, denominator: &str) -> Self {
        Self {
            name: name.to_string(),
            numerator: numerator.to_string(),
            denominator: denominator.to_string(),
        }
    }

    fn to_mapping(&self) -> Value {
        json!({
            "type": "double",
            "script": {
                "source": RATIO_SCRIPT,
                "params": {
                    "numerator": self.numerator,
                    "denominator": self.denominator,
                }
            }
        })
    }
}

/// Bucketed summary requested alongside the hits
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregation {
    DateHistogram {
        name: String,
        field: String,
        interval: String,
        format: String,
    },
    Terms {
        name: String,
        field: String,
        /// Optional `(name, field)` average computed inside each bucket
        average: Option<(String, String)>,
    },
}

impl Aggregation {
    fn name(&self) -> &str {
        match self {
            Aggregation::DateHistogram { name, .. } | Aggregation::Terms { name, .. } => name,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Aggregation::DateHistogram { field, interval, format, .. } => json!({
                "date_histogram": {
                    "field": field,
                    "calendar_interval": interval,
                    "format": format,
                }
            }),
            Aggregation::Terms { field, average, .. } => {
                let mut agg = json!({ "terms": { "field": field } });
                if let Some((avg_name, avg_field)) = average {
                    agg["aggs"] = json!({ avg_name.as_str(): { "avg": { "field": avg_field } } });
                }
                agg
            }
        }
    }
}

/// Parametrized relevance query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryTemplate {
    pub name: String,
    pub description: String,
    /// Required and scored
    pub must: Vec<Clause>,
    /// Required, not scored
    pub filter: Vec<Clause>,
    /// Optional, scored
    pub should: Vec<Clause>,
    pub must_not: Vec<Clause>,
    pub minimum_should_match: Option<u32>,
    pub derived_metrics: Vec<DerivedMetric>,
    pub aggregations: Vec<Aggregation>,
    /// Fixed result size; overrides the caller's size when set
    pub size: Option<usize>,
}

impl QueryTemplate {
    fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }

    pub fn is_aggregating(&self) -> bool {
        !self.aggregations.is_empty()
    }

    pub fn effective_size(&self, requested: usize) -> usize {
        self.size.unwrap_or(requested)
    }

    /// Render as a search request body
    pub fn to_request_body(&self, requested_size: usize) -> Value {
        let clauses = |list: &[Clause]| Value::Array(list.iter().map(Clause::to_json).collect());

        let mut bool_query = Map::new();
        for (key, list) in [
            ("must", &self.must),
            ("filter", &self.filter),
            ("should", &self.should),
            ("must_not", &self.must_not),
        ] {
            if !list.is_empty() {
                bool_query.insert(key.into(), clauses(list.as_slice()));
            }
        }
        if let Some(msm) = self.minimum_should_match {
            bool_query.insert("minimum_should_match".into(), json!(msm));
        }

        let mut body = json!({
            "size": self.effective_size(requested_size),
            "query": { "bool": Value::Object(bool_query) },
        });

        if !self.derived_metrics.is_empty() {
            let mappings: Map<String, Value> = self
                .derived_metrics
                .iter()
                .map(|m| (m.name.clone(), m.to_mapping()))
                .collect();
            body["runtime_mappings"] = Value::Object(mappings);
        }

        if !self.aggregations.is_empty() {
            let aggs: Map<String, Value> = self
                .aggregations
                .iter()
                .map(|a| (a.name().to_string(), a.to_json()))
                .collect();
            body["aggs"] = Value::Object(aggs);
        }

        body
    }
}

/// Stable keys of the cataloged relevance queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CatalogQuery {
    RomanticDinner,
    PartyCrowd,
    MicrowaveOnly,
    QuickChickenOnionCheese,
    HighProteinRatio,
    LactoseFree,
    CornByYear,
    HealthySnacks,
    PositiveReviewAuthors,
    CollegeBudget,
}

impl CatalogQuery {
    pub const ALL: [CatalogQuery; 10] = [
        CatalogQuery::RomanticDinner,
        CatalogQuery::PartyCrowd,
        CatalogQuery::MicrowaveOnly,
        CatalogQuery::QuickChickenOnionCheese,
        CatalogQuery::HighProteinRatio,
        CatalogQuery::LactoseFree,
        CatalogQuery::CornByYear,
        CatalogQuery::HealthySnacks,
        CatalogQuery::PositiveReviewAuthors,
        CatalogQuery::CollegeBudget,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            CatalogQuery::RomanticDinner => "romantic-dinner",
            CatalogQuery::PartyCrowd => "party-crowd",
            CatalogQuery::MicrowaveOnly => "microwave-only",
            CatalogQuery::QuickChickenOnionCheese => "quick-chicken-onion-cheese",
            CatalogQuery::HighProteinRatio => "high-protein-ratio",
            CatalogQuery::LactoseFree => "lactose-free",
            CatalogQuery::CornByYear => "corn-by-year",
            CatalogQuery::HealthySnacks => "healthy-snacks",
            CatalogQuery::PositiveReviewAuthors => "positive-review-authors",
            CatalogQuery::CollegeBudget => "college-budget",
        }
    }
}

impl fmt::Display for CatalogQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for CatalogQuery {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CatalogQuery::ALL
            .iter()
            .copied()
            .find(|q| q.key() == s)
            .ok_or_else(|| EngineError::validation(format!("unknown catalog query: {}", s)))
    }
}

/// Ordered collection of named relevance queries
#[derive(Debug, Clone)]
pub struct QueryCatalog {
    entries: Vec<(CatalogQuery, QueryTemplate)>,
}

impl QueryCatalog {
    /// Catalog of the shipped relevance queries
    pub fn standard() -> Self {
        let entries = CatalogQuery::ALL
            .iter()
            .map(|&q| (q, standard_template(q)))
            .collect();
        Self { entries }
    }

    pub fn get(&self, query: CatalogQuery) -> Option<&QueryTemplate> {
        self.entries.iter().find(|(q, _)| *q == query).map(|(_, t)| t)
    }

    /// Look a template up by its key, failing validation for unknown keys
    pub fn resolve(&self, key: &str) -> EngineResult<&QueryTemplate> {
        let query = key.parse::<CatalogQuery>()?;
        self.get(query)
            .ok_or_else(|| EngineError::validation(format!("catalog query not available: {}", key)))
    }

    pub fn entries(&self) -> impl Iterator<Item = (CatalogQuery, &QueryTemplate)> {
        self.entries.iter().map(|(q, t)| (*q, t))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for QueryCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Match the same terms across the recipe's descriptive fields and reviews
fn across_text_fields(terms: &str, fields: &[&str]) -> Vec<Clause> {
    let mut clauses: Vec<Clause> = fields.iter().map(|f| Clause::any_of(f, terms)).collect();
    clauses.push(Clause::in_reviews(Clause::any_of(REVIEW_TEXT_FIELD, terms)));
    clauses
}

fn standard_template(query: CatalogQuery) -> QueryTemplate {
    match query {
        CatalogQuery::RomanticDinner => {
            let mut t = QueryTemplate::new(query.key(), "Dinner for two with romantic reviews and keywords");
            t.must = vec![Clause::between("RecipeServings", 2.0, 3.0)];
            t.should = vec![
                Clause::in_reviews(Clause::text(REVIEW_TEXT_FIELD, "romantic").boosted(2.0)),
                Clause::text("Keywords", "romantic").boosted(2.0),
                Clause::text("Description", "romantic").boosted(2.0),
                Clause::at_least("AggregatedRating", 3.5),
            ];
            t
        }
        CatalogQuery::PartyCrowd => {
            let mut t = QueryTemplate::new(query.key(), "Large-batch recipes for parties and gatherings");
            t.must = vec![Clause::at_least("RecipeServings", 10.0)];
            t.should = vec![
                Clause::any_of("Keywords", "party, large groups, gathering, celebration, event, buffet").boosted(2.0),
                Clause::any_of("RecipeCategory", "Dessert, Appetizer, Main, Party, Buffet").boosted(1.5),
                Clause::any_of("Description", "party, large groups, gathering, celebration, event").boosted(1.5),
                Clause::in_reviews(
                    Clause::any_of(REVIEW_TEXT_FIELD, "party, celebration, gathering, event, buffet").boosted(3.0),
                ),
            ];
            t.minimum_should_match = Some(1);
            t
        }
        CatalogQuery::MicrowaveOnly => {
            let mut t = QueryTemplate::new(query.key(), "Microwave recipes needing no oven, pan, pot or fryer");
            t.must = vec![Clause::text("RecipeInstructions", "microwave")];
            t.must_not = vec![
                Clause::any_of("Keywords", "oven pan pot fryer"),
                Clause::any_of("RecipeInstructions", "oven pan pot fryer"),
            ];
            t.should = vec![
                Clause::text("Keywords", "microwave"),
                Clause::in_reviews(Clause::text(REVIEW_TEXT_FIELD, "microwave")),
            ];
            t
        }
        CatalogQuery::QuickChickenOnionCheese => {
            let mut t = QueryTemplate::new(query.key(), "Chicken, onion and cheese in thirty minutes or less");
            t.must = vec![
                Clause::all_of(INGREDIENT_FIELD, "chicken onion cheese"),
                Clause::at_most("TotalTime", 30.0),
            ];
            t
        }
        CatalogQuery::HighProteinRatio => {
            let terms = "healthy gym protein fit strong weight nutritious";
            let mut t = QueryTemplate::new(query.key(), "Protein to calorie ratio of at least 0.2");
            t.derived_metrics = vec![DerivedMetric::ratio("pcratio", "ProteinContent", "Calories")];
            t.must = vec![Clause::at_least("pcratio", 0.2)];
            t.should = vec![
                Clause::any_of("Description", terms),
                Clause::any_of("Keywords", terms).boosted(3.0),
                Clause::any_of("RecipeCategory", terms),
                Clause::in_reviews(Clause::any_of(REVIEW_TEXT_FIELD, terms)),
            ];
            t
        }
        CatalogQuery::LactoseFree => {
            let mut t = QueryTemplate::new(query.key(), "Recipes without dairy ingredients");
            t.must_not = vec![Clause::any_of(INGREDIENT_FIELD, "milk cheese lactose yogurt")];
            t.should = vec![
                Clause::text("Keywords", "lactose free"),
                Clause::text("Description", "lactose free intolerant"),
                Clause::text("RecipeCategory", "lactose free"),
                Clause::in_reviews(Clause::text(REVIEW_TEXT_FIELD, "lactose free intolerant")),
            ];
            t
        }
        CatalogQuery::CornByYear => {
            let mut t = QueryTemplate::new(query.key(), "Corn recipes bucketed by publication year");
            t.must = vec![Clause::text(INGREDIENT_FIELD, "corn")];
            t.aggregations = vec![Aggregation::DateHistogram {
                name: "by_review_year".to_string(),
                field: "DatePublished".to_string(),
                interval: "year".to_string(),
                format: "yyyy".to_string(),
            }];
            t.size = Some(1);
            t
        }
        CatalogQuery::HealthySnacks => {
            let mut t = QueryTemplate::new(query.key(), "High-protein snacks that are not desserts");
            t.must = vec![
                Clause::text("RecipeCategory", "Snacks"),
                Clause::at_least("ProteinContent", 20.0),
            ];
            t.should = vec![
                Clause::all_of("Description", "healthy snack"),
                Clause::in_reviews(Clause::all_of(REVIEW_TEXT_FIELD, "healthy snack")),
                Clause::text("Keywords", "healthy snack"),
            ];
            t.must_not = vec![
                Clause::text("RecipeCategory", "dessert"),
                Clause::text("Keywords", "dessert"),
            ];
            t
        }
        CatalogQuery::PositiveReviewAuthors => {
            let mut t = QueryTemplate::new(query.key(), "Authors of well-reviewed recipes with their average rating");
            t.must = vec![
                Clause::at_least("AggregatedRating", 4.0),
                Clause::at_least("ReviewCount", 10.0),
                Clause::in_reviews(Clause::any_of(REVIEW_TEXT_FIELD, "great excellent good amazing awesome")),
            ];
            t.aggregations = vec![Aggregation::Terms {
                name: "positive_sentiment_per_author".to_string(),
                field: "AuthorId".to_string(),
                average: Some(("average_rating".to_string(), "AggregatedRating".to_string())),
            }];
            t.size = Some(2);
            t
        }
        CatalogQuery::CollegeBudget => {
            let mut t = QueryTemplate::new(query.key(), "Cheap, easy recipes under an hour");
            t.should = across_text_fields(
                "college student cheap easy",
                &["Description", "Keywords", "RecipeCategory"],
            );
            t.must_not = vec![Clause::at_least("TotalTime", 60.0)];
            t.minimum_should_match = Some(1);
            t
        }
    }
}

fn check_ingredients(ingredients: &[String]) -> EngineResult<()> {
    if ingredients.is_empty() {
        return Err(EngineError::validation("at least one ingredient is required"));
    }
    if ingredients.iter().any(|i| i.trim().is_empty()) {
        return Err(EngineError::validation("ingredient names must not be blank"));
    }
    Ok(())
}

/// Every ingredient is an optional, scored match on the ingredient text
pub fn loose_match(ingredients: &[String]) -> EngineResult<QueryTemplate> {
    check_ingredients(ingredients)?;

    let mut t = QueryTemplate::new("loose-match", "Any of the given ingredients, ranked by text relevance");
    t.should = ingredients.iter().map(|i| Clause::text(INGREDIENT_FIELD, i)).collect();
    Ok(t)
}

/// The last ingredient is a required filter, the rest are optional and scored
pub fn anchored_match(ingredients: &[String]) -> EngineResult<QueryTemplate> {
    check_ingredients(ingredients)?;

    let (anchor, optional) = ingredients
        .split_last()
        .ok_or_else(|| EngineError::validation("at least one ingredient is required"))?;

    let mut t = QueryTemplate::new("anchored-match", "Must contain the last ingredient, ranked by the others");
    t.filter = vec![Clause::text(INGREDIENT_FIELD, anchor)];
    t.should = optional.iter().map(|i| Clause::text(INGREDIENT_FIELD, i)).collect();
    Ok(t)
}
