// Core algorithm exports
pub mod assembler;
pub mod catalog;
pub mod compatibility;
pub mod error;
pub mod limits;
pub mod overlap;

pub use assembler::{assemble, AssembledResponse};
pub use catalog::{anchored_match, loose_match, CatalogQuery, Clause, QueryCatalog, QueryTemplate};
pub use compatibility::{compatibility_score, rank_compatible_ingredients};
pub use error::{EngineError, EngineResult, ErrorKind};
pub use limits::ResultLimits;
pub use overlap::rank_by_overlap;
