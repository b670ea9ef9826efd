use serde_json::Value;
use std::sync::Arc;

use crate::core::{
    anchored_match, assemble, loose_match, AssembledResponse, EngineError, EngineResult, QueryCatalog,
    QueryTemplate, ResultLimits,
};
use crate::services::search::SearchBackend;

/// Runs relevance templates against the search index
///
/// Sizes are validated before anything is sent; every response handed back
/// to callers goes through the result assembler.
#[derive(Clone)]
pub struct RelevanceSearchClient {
    backend: Arc<dyn SearchBackend>,
    catalog: Arc<QueryCatalog>,
    limits: ResultLimits,
}

impl RelevanceSearchClient {
    pub fn new(backend: Arc<dyn SearchBackend>, catalog: QueryCatalog, limits: ResultLimits) -> Self {
        Self {
            backend,
            catalog: Arc::new(catalog),
            limits,
        }
    }

    pub fn catalog(&self) -> &QueryCatalog {
        &self.catalog
    }

    /// Execute a cataloged template and return the raw backend response
    pub async fn execute(&self, key: &str, size: Option<i64>) -> EngineResult<Value> {
        let template = self.catalog.resolve(key)?;
        let size = self.limits.resolve(size, "size")?;
        self.execute_template(template, size).await
    }

    /// Send any template, cataloged or generated, with an already validated size
    pub async fn execute_template(&self, template: &QueryTemplate, size: usize) -> EngineResult<Value> {
        let body = template.to_request_body(size);

        tracing::debug!("Executing relevance query {} (size {})", template.name, template.effective_size(size));

        self.backend.search(&body).await.map_err(|e| {
            tracing::error!("Relevance query {} failed: {}", template.name, e);
            EngineError::from(e)
        })
    }

    /// Cataloged query, normalized into hits or aggregations
    pub async fn search_catalog(&self, key: &str, size: Option<i64>) -> EngineResult<AssembledResponse> {
        assemble(self.execute(key, size).await?)
    }

    /// Every ingredient optional, ranked by text relevance
    pub async fn search_loose(&self, ingredients: &[String], size: Option<i64>) -> EngineResult<AssembledResponse> {
        let template = loose_match(ingredients)?;
        let size = self.limits.resolve(size, "size")?;
        assemble(self.execute_template(&template, size).await?)
    }

    /// Last ingredient required, the rest optional
    pub async fn search_anchored(
        &self,
        ingredients: &[String],
        size: Option<i64>,
    ) -> EngineResult<AssembledResponse> {
        let template = anchored_match(ingredients)?;
        let size = self.limits.resolve(size, "size")?;
        assemble(self.execute_template(&template, size).await?)
    }
}
