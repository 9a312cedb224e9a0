//! Route patterns.
//!
//! A pattern is a `/`-separated path whose segments are literals or
//! placeholders:
//!
//! | Segment   | Matches                                   | Parameter  |
//! |-----------|-------------------------------------------|------------|
//! | `:name`   | one non-empty segment                     | `name`     |
//! | `{name}`  | one non-empty segment                     | `name`     |
//! | `*`       | the rest of the path, possibly empty      | `wildcard` |
//! | `{*name}` | the rest of the path, possibly empty      | `name`     |
//!
//! Matching is case-sensitive with one trailing slash ignored. Both sides are
//! compared in a canonical segment encoding, so `/caf%C3%A9` reaches the
//! literal `/café` while `%2F` stays inside its segment. Captured values are
//! percent-decoded.

use std::collections::BTreeMap;
use std::fmt;

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, percent_encode};
use regex::Regex;

/// Bytes kept encoded in a canonical segment.
const SEGMENT: &AsciiSet = &CONTROLS.add(b'/').add(b'%');

/// Parameter name given to an unnamed `*` wildcard.
pub const WILDCARD_PARAM: &str = "wildcard";

/// Error raised for a pattern that cannot be compiled.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    /// A placeholder without a usable name.
    #[error("invalid parameter name {name:?} in route pattern {pattern:?}")]
    InvalidName { pattern: String, name: String },
    /// Two placeholders with the same name.
    #[error("duplicate parameter {name:?} in route pattern {pattern:?}")]
    DuplicateName { pattern: String, name: String },
    /// The generated expression was rejected.
    #[error("route pattern {pattern:?} does not compile: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled route pattern.
#[derive(Clone)]
pub struct RoutePattern {
    source: String,
    regex: Regex,
    params: Vec<String>,
}

enum Segment<'a> {
    Literal(&'a str),
    Param(&'a str),
    Rest(&'a str),
}

impl RoutePattern {
    /// Compile `pattern`.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let mut expr = String::from("^");
        let mut params: Vec<String> = Vec::new();

        let segments: Vec<_> = pattern.split('/').filter(|s| !s.is_empty()).collect();
        let last = segments.len().saturating_sub(1);

        for (i, raw) in segments.iter().enumerate() {
            let segment = classify(raw);
            let name = match segment {
                Segment::Literal(_) => None,
                Segment::Param(name) | Segment::Rest(name) => Some(name),
            };
            if let Some(name) = name {
                if !is_valid_name(name) {
                    return Err(PatternError::InvalidName {
                        pattern: pattern.to_owned(),
                        name: name.to_owned(),
                    });
                }
                if params.iter().any(|p| p == name) {
                    return Err(PatternError::DuplicateName {
                        pattern: pattern.to_owned(),
                        name: name.to_owned(),
                    });
                }
                params.push(name.to_owned());
            }

            match segment {
                Segment::Literal(text) => {
                    expr.push('/');
                    expr.push_str(&regex::escape(&canonical_segment(text)));
                }
                Segment::Param(_) => expr.push_str("/([^/]+)"),
                Segment::Rest(_) if i == last => expr.push_str("(?:/(.*))?"),
                Segment::Rest(_) => expr.push_str("/(.*)"),
            }
        }

        if segments.is_empty() {
            expr.push('/');
        }
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|source| PatternError::Regex {
            pattern: pattern.to_owned(),
            source,
        })?;

        Ok(Self {
            source: pattern.to_owned(),
            regex,
            params,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Parameter names in capture order.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Match a request path, returning the decoded parameters.
    pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        self.matches_canonical(&canonical_path(path))
    }

    /// Match a path already passed through [`canonical_path`].
    pub(crate) fn matches_canonical(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let path = match path.strip_suffix('/') {
            Some(trimmed) if !trimmed.is_empty() => trimmed,
            _ => path,
        };
        let captures = self.regex.captures(path)?;

        Some(
            self.params
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let value = captures.get(i + 1).map_or("", |m| m.as_str());
                    let decoded = percent_decode_str(value).decode_utf8_lossy().into_owned();
                    (name.clone(), decoded)
                })
                .collect(),
        )
    }
}

impl fmt::Debug for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RoutePattern").field(&self.source).finish()
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Re-encode each segment of a request path in one canonical form.
///
/// Segments are fully decoded, then only control bytes, `/`, `%` and
/// non-ASCII bytes are encoded again.
pub(crate) fn canonical_path(path: &str) -> String {
    path.split('/')
        .map(canonical_segment)
        .collect::<Vec<_>>()
        .join("/")
}

fn canonical_segment(segment: &str) -> String {
    let bytes: Vec<u8> = percent_decode_str(segment).collect();
    percent_encode(&bytes, SEGMENT).to_string()
}

fn classify(segment: &str) -> Segment<'_> {
    if segment == "*" {
        return Segment::Rest(WILDCARD_PARAM);
    }
    if let Some(name) = segment.strip_prefix(':') {
        return Segment::Param(name);
    }
    if let Some(inner) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        return match inner.strip_prefix('*') {
            Some(name) => Segment::Rest(name),
            None => Segment::Param(inner),
        };
    }
    Segment::Literal(segment)
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
