//! Path-matching collaborator contract and the bundled regex implementation.

use http::Method;
use regex::Regex;
use tracing::debug;

/// Result of resolving an inbound method + path against the matching table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteHit {
    /// The route key the pattern was installed under
    pub key: String,
    /// One raw captured string per wildcard placeholder, left to right
    pub captures: Vec<String>,
}

/// The external path-matching capability the engine relies on.
///
/// The contract is deliberately small: installing a normalized pattern under
/// a route key must later yield, for a matching request, that key plus one
/// raw captured string per `{placeholder}` wildcard. How the table matches
/// (regex, trie, anything else) is the implementation's business.
pub trait PathMatcher: Send + Sync {
    /// Install a compiled pattern under its route key.
    ///
    /// `method` is `None` for the any-verb registration forms.
    fn install(&mut self, method: Option<&Method>, key: &str, pattern: &str);

    /// Resolve a request path (query string already removed) to an installed
    /// route. Returns `None` when nothing matches.
    fn lookup(&self, method: &Method, path: &str) -> Option<RouteHit>;
}

struct MatcherEntry {
    method: Option<Method>,
    regex: Regex,
    key: String,
}

/// Regex-backed matching table.
///
/// One compiled regex per installed pattern. Patterns ending in the `/{$}`
/// end marker match exactly; patterns without it match any suffix at a
/// segment boundary (prefix match). Method-specific entries take precedence
/// over any-verb entries; within a precedence class the first installed
/// pattern wins.
#[derive(Default)]
pub struct RegexMatcher {
    entries: Vec<MatcherEntry>,
}

impl RegexMatcher {
    /// Create an empty matching table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a normalized pattern to an anchored regex.
    ///
    /// `{placeholder}` segments become `([^/]+)` capture groups; literal
    /// segments are escaped. A trailing `/{$}` anchors the match at end of
    /// path, otherwise any suffix is accepted at a segment boundary.
    fn pattern_to_regex(pattern: &str) -> Regex {
        let (path, precise) = match pattern.strip_suffix("/{$}") {
            Some(stripped) => (stripped, true),
            None => (pattern, false),
        };

        let mut source = String::with_capacity(path.len() + 16);
        source.push('^');
        let mut has_segments = false;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            has_segments = true;
            source.push('/');
            if segment.starts_with('{') && segment.ends_with('}') {
                source.push_str("([^/]+)");
            } else {
                source.push_str(&regex::escape(segment));
            }
        }

        if has_segments {
            if precise {
                // Tolerate one trailing slash on the request path.
                source.push_str("/?$");
            } else {
                source.push_str("(?:/.*)?$");
            }
        } else {
            // Root pattern: "/{$}" matches only "/", a bare "/" matches any path.
            source.push('/');
            if precise {
                source.push('$');
            } else {
                source.push_str(".*$");
            }
        }

        Regex::new(&source).expect("failed to compile route pattern regex")
    }

    fn hit_for(&self, entry: &MatcherEntry, path: &str) -> Option<RouteHit> {
        let captured = entry.regex.captures(path)?;
        let captures = captured
            .iter()
            .skip(1)
            .flatten()
            .map(|m| m.as_str().to_string())
            .collect();
        Some(RouteHit {
            key: entry.key.clone(),
            captures,
        })
    }
}

impl PathMatcher for RegexMatcher {
    fn install(&mut self, method: Option<&Method>, key: &str, pattern: &str) {
        let regex = Self::pattern_to_regex(pattern);
        debug!(key = %key, regex = %regex.as_str(), "pattern installed");
        self.entries.push(MatcherEntry {
            method: method.cloned(),
            regex,
            key: key.to_string(),
        });
    }

    fn lookup(&self, method: &Method, path: &str) -> Option<RouteHit> {
        // Method-specific entries shadow any-verb entries for their verb.
        self.entries
            .iter()
            .filter(|e| e.method.as_ref() == Some(method))
            .find_map(|e| self.hit_for(e, path))
            .or_else(|| {
                self.entries
                    .iter()
                    .filter(|e| e.method.is_none())
                    .find_map(|e| self.hit_for(e, path))
            })
    }
}
