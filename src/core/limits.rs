use crate::core::error::{EngineError, EngineResult};

/// Default and ceiling for caller-supplied result counts
///
/// Requests that omit a count get `default`; larger counts are clamped to `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultLimits {
    pub default: usize,
    pub max: usize,
}

impl ResultLimits {
    pub fn new(default: usize, max: usize) -> Self {
        Self {
            default: default.min(max),
            max,
        }
    }

    /// Validate and cap a requested count
    pub fn resolve(&self, requested: Option<i64>, what: &str) -> EngineResult<usize> {
        match requested {
            None => Ok(self.default),
            Some(n) if n < 0 => Err(EngineError::validation(format!(
                "{} must not be negative, got {}",
                what, n
            ))),
            Some(n) => Ok(usize::try_from(n).unwrap_or(usize::MAX).min(self.max)),
        }
    }
}

impl Default for ResultLimits {
    fn default() -> Self {
        Self { default: 25, max: 100 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_count_uses_default() {
        assert_eq!(ResultLimits::new(10, 50).resolve(None, "limit"), Ok(10));
    }

    #[test]
    fn test_count_is_capped() {
        assert_eq!(ResultLimits::new(10, 50).resolve(Some(500), "limit"), Ok(50));
        assert_eq!(ResultLimits::new(10, 50).resolve(Some(0), "limit"), Ok(0));
    }

    #[test]
    fn test_negative_count_rejected() {
        let err = ResultLimits::default().resolve(Some(-1), "size").unwrap_err();
        assert_eq!(err, EngineError::Validation("size must not be negative, got -1".to_string()));
    }

    #[test]
    fn test_default_never_exceeds_max() {
        assert_eq!(ResultLimits::new(200, 100).default, 100);
    }
}
