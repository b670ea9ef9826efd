use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::core::EngineError;
use crate::models::{Recipe, RecipeNeighborhood};

/// Errors that can occur when interacting with the graph store
#[derive(Debug, Error)]
pub enum GraphStoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Query failed ({code}): {message}")]
    QueryError { code: String, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

impl From<GraphStoreError> for EngineError {
    fn from(err: GraphStoreError) -> Self {
        match err {
            GraphStoreError::RequestError(e) if e.is_timeout() => {
                EngineError::UpstreamTimeout("graph store did not respond in time".to_string())
            }
            _ => EngineError::Upstream("graph store request failed".to_string()),
        }
    }
}

/// Read access to the recipe graph
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Recipes CONTAINing at least one of `ingredients`, with their full
    /// ingredient lists and the ratings of the reviews FOR them
    async fn recipes_touching(
        &self,
        ingredients: &[String],
    ) -> Result<Vec<RecipeNeighborhood>, GraphStoreError>;
}

/// Ingredient names are bound as `$ingredients`, never spliced into the text.
///
/// Candidates are capped at `$max_candidates`, keeping the recipes with the
/// largest overlap. Ratings are collected in a `WITH` so the final ordering
/// can still see `r`.
const RECIPES_TOUCHING: &str = "\
MATCH (known:Ingredient)<-[:CONTAINS]-(r:Recipe)
WHERE known.name IN $ingredients
WITH r, count(DISTINCT known) AS overlap
ORDER BY overlap DESC, r.RecipeId
LIMIT $max_candidates
MATCH (r)-[:CONTAINS]->(i:Ingredient)
WITH r, collect(DISTINCT i.name) AS ingredients
OPTIONAL MATCH (review:Review)-[:FOR]->(r)
WITH r, ingredients, collect(review.Rating) AS ratings
ORDER BY r.RecipeId
RETURN properties(r) AS recipe, ingredients, ratings";

/// Default ceiling on recipes pulled per graph query
pub const DEFAULT_MAX_CANDIDATES: usize = 5_000;

#[derive(Debug, Serialize)]
struct Statement<'a> {
    statement: &'a str,
    parameters: Value,
    #[serde(rename = "resultDataContents")]
    result_data_contents: [&'a str; 1],
}

/// Neo4j client speaking the HTTP transactional API
///
/// Each call is a single auto-commit transaction against
/// `{endpoint}/db/{database}/tx/commit`.
pub struct Neo4jClient {
    base_url: String,
    database: String,
    username: String,
    password: String,
    max_candidates: usize,
    client: Client,
}

impl Neo4jClient {
    /// Create a new Neo4j client; `timeout` bounds every request
    pub fn new(
        base_url: String,
        database: String,
        username: String,
        password: String,
        timeout: Duration,
    ) -> Result<Self, GraphStoreError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            database,
            username,
            password,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            client,
        })
    }

    /// Cap how many touching recipes a single query may return
    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates.max(1);
        self
    }

    fn commit_url(&self) -> String {
        format!(
            "{}/db/{}/tx/commit",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.database)
        )
    }

    /// Run one parameterized statement and return its rows
    async fn run(&self, statement: &str, parameters: Value) -> Result<Vec<Vec<Value>>, GraphStoreError> {
        let statement = Statement {
            statement,
            parameters,
            result_data_contents: ["row"],
        };
        let payload = json!({ "statements": [statement] });

        let response = self
            .client
            .post(self.commit_url())
            .basic_auth(&self.username, Some(&self.password))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Graph store returned {}: {}", status, body);
            return Err(GraphStoreError::ApiError(format!("Graph query failed: {}", status)));
        }

        let json: Value = response.json().await?;
        parse_rows(json)
    }
}

/// Extract the row arrays of the first statement result
fn parse_rows(mut json: Value) -> Result<Vec<Vec<Value>>, GraphStoreError> {
    if let Some(error) = json
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
    {
        return Err(GraphStoreError::QueryError {
            code: error.get("code").and_then(Value::as_str).unwrap_or("unknown").to_string(),
            message: error.get("message").and_then(Value::as_str).unwrap_or_default().to_string(),
        });
    }

    let data = json
        .get_mut("results")
        .and_then(|r| r.get_mut(0))
        .and_then(|r| r.get_mut("data"))
        .and_then(Value::as_array_mut)
        .map(std::mem::take)
        .ok_or_else(|| GraphStoreError::InvalidResponse("Missing results data".into()))?;

    Ok(data
        .into_iter()
        .filter_map(|mut entry| match entry.get_mut("row").map(Value::take) {
            Some(Value::Array(row)) => Some(row),
            _ => None,
        })
        .collect())
}

/// Map a `[recipe, ingredients, ratings]` row into the typed neighbourhood
fn to_neighborhood(row: Vec<Value>) -> Result<RecipeNeighborhood, GraphStoreError> {
    let mut columns = row.into_iter();
    let (Some(recipe), Some(ingredients), Some(ratings)) = (columns.next(), columns.next(), columns.next())
    else {
        return Err(GraphStoreError::InvalidResponse("Expected three columns".into()));
    };

    let recipe: Recipe = serde_json::from_value(recipe)
        .map_err(|e| GraphStoreError::InvalidResponse(format!("Failed to parse recipe: {}", e)))?;
    let ingredients: Vec<String> = serde_json::from_value(ingredients)
        .map_err(|e| GraphStoreError::InvalidResponse(format!("Failed to parse ingredients: {}", e)))?;
    let review_ratings: Vec<f64> = ratings
        .as_array()
        .map(|r| r.iter().filter_map(Value::as_f64).collect())
        .unwrap_or_default();

    Ok(RecipeNeighborhood {
        recipe,
        ingredients,
        review_ratings,
    })
}

#[async_trait]
impl GraphStore for Neo4jClient {
    async fn recipes_touching(
        &self,
        ingredients: &[String],
    ) -> Result<Vec<RecipeNeighborhood>, GraphStoreError> {
        tracing::debug!("Fetching recipes touching {} ingredients", ingredients.len());

        let parameters = json!({
            "ingredients": ingredients,
            "max_candidates": self.max_candidates,
        });
        let rows = self.run(RECIPES_TOUCHING, parameters).await?;

        // One malformed row fails the whole call; rankings never see a partial set
        let neighborhoods = rows
            .into_iter()
            .map(to_neighborhood)
            .collect::<Result<Vec<_>, _>>()?;

        if neighborhoods.len() == self.max_candidates {
            tracing::warn!("Graph query hit the candidate ceiling of {}", self.max_candidates);
        }
        tracing::debug!("Graph store returned {} recipes", neighborhoods.len());

        Ok(neighborhoods)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> Neo4jClient {
        Neo4jClient::new(
            base_url.to_string(),
            "neo4j".to_string(),
            "neo4j".to_string(),
            "secret".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_commit_url() {
        let c = client("http://localhost:7474/");
        assert_eq!(c.commit_url(), "http://localhost:7474/db/neo4j/tx/commit");
    }

    #[test]
    fn test_query_binds_parameters() {
        assert!(RECIPES_TOUCHING.contains("WHERE known.name IN $ingredients"));
        assert!(RECIPES_TOUCHING.contains("LIMIT $max_candidates"));
    }

    #[test]
    fn test_query_orders_on_projected_variables() {
        let lines: Vec<&str> = RECIPES_TOUCHING.lines().collect();
        let ratings = lines
            .iter()
            .position(|l| *l == "WITH r, ingredients, collect(review.Rating) AS ratings")
            .unwrap();

        // Aggregation happens in a WITH that keeps `r`, so ORDER BY may use it
        assert_eq!(lines[ratings + 1], "ORDER BY r.RecipeId");
        let last = lines.last().unwrap();
        assert!(last.starts_with("RETURN"));
        assert!(!last.contains("collect("));
        assert!(!last.contains("ORDER BY"));
    }

    #[test]
    fn test_max_candidates_floor() {
        assert_eq!(client("http://localhost:7474").max_candidates, DEFAULT_MAX_CANDIDATES);
        assert_eq!(client("http://localhost:7474").with_max_candidates(0).max_candidates, 1);
    }

    #[test]
    fn test_row_mapping() {
        let row = vec![
            json!({ "RecipeId": 42, "Name": "Garlic Chicken", "Keywords": ["easy"] }),
            json!(["chicken", "garlic"]),
            json!([4, 5.0]),
        ];
        let n = to_neighborhood(row).unwrap();

        assert_eq!(n.recipe.recipe_id, 42);
        assert_eq!(n.recipe.name.as_deref(), Some("Garlic Chicken"));
        assert_eq!(n.ingredients, vec!["chicken", "garlic"]);
        assert_eq!(n.review_ratings, vec![4.0, 5.0]);
    }

    #[test]
    fn test_short_row_rejected() {
        assert!(to_neighborhood(vec![json!({ "RecipeId": 1 })]).is_err());
    }

    #[test]
    fn test_statement_errors_surface() {
        let body = json!({
            "results": [],
            "errors": [{ "code": "Neo.ClientError.Statement.SyntaxError", "message": "bad" }]
        });
        match parse_rows(body) {
            Err(GraphStoreError::QueryError { code, .. }) => {
                assert_eq!(code, "Neo.ClientError.Statement.SyntaxError")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_recipes_touching_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/db/neo4j/tx/commit")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::Regex(r#""ingredients":\["chicken","garlic"\]"#.to_string()),
                mockito::Matcher::Regex(r#""max_candidates":250"#.to_string()),
                mockito::Matcher::Regex("LIMIT \\$max_candidates".to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "results": [{
                        "columns": ["recipe", "ingredients", "ratings"],
                        "data": [
                            { "row": [{ "RecipeId": 1 }, ["chicken", "garlic", "onion"], [5]] },
                            { "row": [{ "RecipeId": 2 }, ["chicken", "rice"], []] }
                        ]
                    }],
                    "errors": []
                })
                .to_string(),
            )
            .create_async()
            .await;

        let rows = client(&server.url())
            .with_max_candidates(250)
            .recipes_touching(&["chicken".to_string(), "garlic".to_string()])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].recipe.recipe_id, 2);
        assert!(rows[1].review_ratings.is_empty());
    }

    #[tokio::test]
    async fn test_server_error_maps_to_upstream() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/db/neo4j/tx/commit")
            .with_status(503)
            .with_body("database unavailable")
            .create_async()
            .await;

        let err = client(&server.url())
            .recipes_touching(&["chicken".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(err, GraphStoreError::ApiError(_)));
        let engine: EngineError = err.into();
        assert!(matches!(engine, EngineError::Upstream(_)));
        // Backend detail stays out of the caller-facing message
        assert!(!engine.to_string().contains("unavailable"));
    }

    async fn serve_rows(server: &mut mockito::ServerGuard, rows: Value) -> mockito::Mock {
        server
            .mock("POST", "/db/neo4j/tx/commit")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "results": [{ "data": rows }], "errors": [] }).to_string())
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_text_keywords_keep_every_row() {
        let mut server = mockito::Server::new_async().await;
        let _mock = serve_rows(
            &mut server,
            json!([
                { "row": [{ "RecipeId": 1, "Keywords": "easy, quick" }, ["chicken"], []] },
                { "row": [{ "RecipeId": 2, "Keywords": ["easy"] }, ["chicken"], []] }
            ]),
        )
        .await;

        let rows = client(&server.url())
            .recipes_touching(&["chicken".to_string()])
            .await
            .unwrap();

        let ids: Vec<i64> = rows.iter().map(|n| n.recipe.recipe_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(rows[0].recipe.keywords, vec!["easy", "quick"]);
    }

    #[tokio::test]
    async fn test_malformed_row_fails_the_call() {
        let mut server = mockito::Server::new_async().await;
        let _mock = serve_rows(
            &mut server,
            json!([
                { "row": [{ "Name": "no id" }, ["chicken"], []] },
                { "row": [{ "RecipeId": 2 }, ["chicken"], []] }
            ]),
        )
        .await;

        let err = client(&server.url())
            .recipes_touching(&["chicken".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(err, GraphStoreError::InvalidResponse(_)));
        assert!(matches!(EngineError::from(err), EngineError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_stalled_store_maps_to_timeout() {
        // Bound but never accepted: the connection opens, no response ever comes
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let stalled = Neo4jClient::new(
            format!("http://{}", listener.local_addr().unwrap()),
            "neo4j".to_string(),
            "neo4j".to_string(),
            "secret".to_string(),
            Duration::from_millis(200),
        )
        .unwrap();

        let err = stalled.recipes_touching(&["chicken".to_string()]).await.unwrap_err();

        let engine = EngineError::from(err);
        assert!(matches!(engine, EngineError::UpstreamTimeout(_)));
        assert!(engine.is_retryable());
    }
}
