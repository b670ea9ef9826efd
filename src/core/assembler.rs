use serde::Serialize;
use serde_json::Value;

use crate::core::error::{EngineError, EngineResult};
use crate::models::{ItemsResponse, RelevanceHit};

/// Normalized search outcome
///
/// Serializes as `{"items": [...]}` for hits, or as the untouched
/// aggregation object for bucketed responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AssembledResponse {
    Hits(ItemsResponse<RelevanceHit>),
    Aggregations(Value),
}

impl AssembledResponse {
    pub fn hits(&self) -> Option<&[RelevanceHit]> {
        match self {
            AssembledResponse::Hits(items) => Some(&items.items),
            AssembledResponse::Aggregations(_) => None,
        }
    }
}

/// Turn a raw search response into hits or an aggregation payload
///
/// A response carrying a non-empty `aggregations` object is passed through
/// as-is and never hit-mapped. Hits keep the backend's relevance order.
pub fn assemble(raw: Value) -> EngineResult<AssembledResponse> {
    let mut response = match raw {
        Value::Object(map) => map,
        other => {
            tracing::error!("Search response is not a JSON object: {}", other);
            return Err(malformed());
        }
    };

    if let Some(aggregations) = response.remove("aggregations") {
        if aggregations.as_object().is_some_and(|a| !a.is_empty()) {
            return Ok(AssembledResponse::Aggregations(aggregations));
        }
    }

    let hits = response
        .get_mut("hits")
        .and_then(|h| h.get_mut("hits"))
        .and_then(Value::as_array_mut)
        .map(std::mem::take)
        .ok_or_else(|| {
            tracing::error!("Search response has neither hits nor aggregations");
            malformed()
        })?;

    let items = hits.into_iter().map(to_hit).collect();
    Ok(AssembledResponse::Hits(ItemsResponse { items }))
}

fn to_hit(mut hit: Value) -> RelevanceHit {
    let id = hit.get("_id").and_then(Value::as_str).map(str::to_string);
    // `_score` is null when the backend sorted on something other than relevance
    let score = hit.get("_score").and_then(Value::as_f64).unwrap_or(0.0);
    let document = hit.get_mut("_source").map(Value::take).unwrap_or(Value::Null);

    RelevanceHit { id, score, document }
}

fn malformed() -> EngineError {
    EngineError::Upstream("search backend returned an unexpected response".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hits_keep_backend_order() {
        let raw = json!({
            "took": 3,
            "hits": {
                "total": { "value": 3 },
                "max_score": 7.5,
                "hits": [
                    { "_id": "a", "_score": 7.5, "_source": { "RecipeId": 1, "Name": "Garlic Chicken" } },
                    { "_id": "b", "_score": 4.0, "_source": { "RecipeId": 2 } },
                    { "_id": "c", "_score": 4.0, "_source": { "RecipeId": 3 } }
                ]
            }
        });

        let assembled = assemble(raw).unwrap();
        let hits = assembled.hits().unwrap();

        let ids: Vec<&str> = hits.iter().filter_map(|h| h.id.as_deref()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(hits[0].document["Name"], "Garlic Chicken");
    }

    #[test]
    fn test_aggregations_pass_through_unchanged() {
        let aggregations = json!({
            "by_review_year": {
                "buckets": [
                    { "key_as_string": "2001", "key": 978307200000u64, "doc_count": 12 },
                    { "key_as_string": "2002", "key": 1009843200000u64, "doc_count": 30 }
                ]
            }
        });
        let raw = json!({
            "hits": { "hits": [ { "_id": "x", "_score": 1.0, "_source": {} } ] },
            "aggregations": aggregations.clone()
        });

        let assembled = assemble(raw).unwrap();
        assert_eq!(assembled, AssembledResponse::Aggregations(aggregations.clone()));
        assert_eq!(serde_json::to_value(&assembled).unwrap(), aggregations);
    }

    #[test]
    fn test_hits_serialize_as_items() {
        let raw = json!({ "hits": { "hits": [ { "_id": "a", "_score": 2.0, "_source": { "RecipeId": 9 } } ] } });
        let value = serde_json::to_value(assemble(raw).unwrap()).unwrap();

        assert_eq!(value["items"][0]["score"], 2.0);
        assert_eq!(value["items"][0]["document"]["RecipeId"], 9);
    }

    #[test]
    fn test_empty_aggregations_fall_back_to_hits() {
        let raw = json!({ "hits": { "hits": [] }, "aggregations": {} });
        let assembled = assemble(raw).unwrap();
        assert_eq!(assembled.hits().map(<[RelevanceHit]>::len), Some(0));
    }

    #[test]
    fn test_null_score_defaults_to_zero() {
        let raw = json!({ "hits": { "hits": [ { "_id": "a", "_score": null, "_source": {} } ] } });
        let assembled = assemble(raw).unwrap();
        assert_eq!(assembled.hits().unwrap()[0].score, 0.0);
    }

    #[test]
    fn test_malformed_response_is_upstream_error() {
        assert!(matches!(assemble(json!({ "took": 1 })), Err(EngineError::Upstream(_))));
        assert!(matches!(assemble(json!([1, 2])), Err(EngineError::Upstream(_))));
    }
}
