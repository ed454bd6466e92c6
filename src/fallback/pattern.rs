//! Route pattern matching for fallback lookup.
//!
//! # Design Decisions
//! - Segment-by-segment comparison, no regex
//! - `{name}` and `:name` segments match any single non-empty segment
//! - Literal segments are case-sensitive
//! - Works on both concrete paths (`/applications/42`) and axum matched
//!   paths (`/applications/{id}`)

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
}

/// A parsed route pattern such as `/applications/{id}/documents`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    pub fn parse(pattern: impl Into<String>) -> Self {
        let raw = pattern.into();
        let segments = split(&raw)
            .map(|s| {
                if is_param(s) {
                    Segment::Param
                } else {
                    Segment::Literal(s.to_string())
                }
            })
            .collect();
        Self { raw, segments }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True when `route` has the same shape as this pattern.
    pub fn matches(&self, route: &str) -> bool {
        let path = route.split(['?', '#']).next().unwrap_or_default();
        let mut parts = split(path);
        for segment in &self.segments {
            let Some(part) = parts.next() else {
                return false;
            };
            match segment {
                Segment::Param => {}
                Segment::Literal(lit) => {
                    if lit != part {
                        return false;
                    }
                }
            }
        }
        parts.next().is_none()
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn is_param(segment: &str) -> bool {
    (segment.starts_with('{') && segment.ends_with('}') && segment.len() > 2)
        || (segment.starts_with(':') && segment.len() > 1)
}
