// Service exports
pub mod graph;
pub mod matching;
pub mod relevance;
pub mod search;

pub use graph::{GraphStore, GraphStoreError, Neo4jClient};
pub use matching::{CompatibilityEngine, GraphMatchEngine};
pub use relevance::RelevanceSearchClient;
pub use search::{ElasticClient, SearchAuth, SearchBackend, SearchError};
