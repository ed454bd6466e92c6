//! Fallback data subsystem.
//!
//! # Data Flow
//! ```text
//! Envelope sees a 5xx while demo mode is active
//!     → FallbackProvider::fallback_for(request path, method)
//!     → pattern.rs (segment match against each descriptor)
//!     → catalog.rs generator (fixed ids, fixed timestamps)
//! ```
//!
//! # Design Decisions
//! - Providers are pure: the same route and method always yield the same payload
//! - First matching descriptor wins, so specific patterns go first
//! - No match means no substitution; the caller keeps the original error

pub mod catalog;
pub mod pattern;

use axum::http::Method;
use serde_json::Value;

pub use pattern::RoutePattern;

/// Source of substitute payloads for routes whose live data is unavailable.
pub trait FallbackProvider: Send + Sync {
    fn fallback_for(&self, route: &str, method: &Method) -> Option<Value>;
}

/// Maps one (method, route pattern) to a payload generator.
#[derive(Debug, Clone)]
pub struct FallbackDescriptor {
    pub method: Method,
    pub pattern: RoutePattern,
    pub generator: fn() -> Value,
}

impl FallbackDescriptor {
    pub fn new(method: Method, pattern: &str, generator: fn() -> Value) -> Self {
        Self {
            method,
            pattern: RoutePattern::parse(pattern),
            generator,
        }
    }

    pub fn matches(&self, route: &str, method: &Method) -> bool {
        &self.method == method && self.pattern.matches(route)
    }
}

/// Ordered list of descriptors.
#[derive(Debug, Clone, Default)]
pub struct StaticFallbackProvider {
    descriptors: Vec<FallbackDescriptor>,
}

impl StaticFallbackProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor. Earlier descriptors take precedence.
    pub fn with(mut self, method: Method, pattern: &str, generator: fn() -> Value) -> Self {
        self.descriptors.push(FallbackDescriptor::new(method, pattern, generator));
        self
    }

    /// The built-in lending catalogue.
    pub fn lending() -> Self {
        Self {
            descriptors: catalog::lending_descriptors(),
        }
    }

    pub fn descriptors(&self) -> &[FallbackDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl FallbackProvider for StaticFallbackProvider {
    fn fallback_for(&self, route: &str, method: &Method) -> Option<Value> {
        self.descriptors
            .iter()
            .find(|d| d.matches(route, method))
            .map(|d| (d.generator)())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn first() -> Value {
        json!({"which": "first"})
    }

    fn second() -> Value {
        json!({"which": "second"})
    }

    #[test]
    fn test_first_match_wins() {
        let provider = StaticFallbackProvider::new()
            .with(Method::GET, "/items/special", first)
            .with(Method::GET, "/items/{id}", second);

        assert_eq!(provider.fallback_for("/items/special", &Method::GET), Some(first()));
        assert_eq!(provider.fallback_for("/items/7", &Method::GET), Some(second()));
    }

    #[test]
    fn test_method_must_match() {
        let provider = StaticFallbackProvider::new().with(Method::GET, "/items", first);
        assert!(provider.fallback_for("/items", &Method::DELETE).is_none());
        assert!(provider.fallback_for("/unknown", &Method::GET).is_none());
    }

    #[test]
    fn test_lending_catalogue_is_deterministic() {
        let provider = StaticFallbackProvider::lending();
        assert!(!provider.is_empty());
        for d in provider.descriptors() {
            let route = d.pattern.as_str();
            let a = provider.fallback_for(route, &d.method);
            let b = provider.fallback_for(route, &d.method);
            assert!(a.is_some(), "{} {} has no payload", d.method, route);
            assert_eq!(a, b);
        }
    }
}
