//! Name-pattern filters applied while building a snapshot.

use regex_lite::Regex;

use crate::error::KtopError;
use crate::error::Result;

pub const MATCH_ALL: &str = ".*";

/// Node, pod and container name patterns. Patterns search anywhere in the
/// name; anchor with `^`/`$` for exact matches.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    node: NamePattern,
    pod: NamePattern,
    container: NamePattern,
}

/// A compiled pattern; `None` is [`MATCH_ALL`] and skips the regex engine.
#[derive(Debug, Clone, Default)]
struct NamePattern(Option<Regex>);

impl NamePattern {
    fn compile(target: &'static str, pattern: &str) -> Result<Self> {
        if pattern == MATCH_ALL {
            return Ok(Self(None));
        }
        Regex::new(pattern)
            .map(|re| Self(Some(re)))
            .map_err(|e| KtopError::InvalidFilter {
                target,
                pattern: pattern.to_string(),
                message: e.to_string(),
            })
    }

    fn is_match(&self, name: &str) -> bool {
        self.0.as_ref().is_none_or(|re| re.is_match(name))
    }

    fn as_str(&self) -> &str {
        self.0.as_ref().map_or(MATCH_ALL, Regex::as_str)
    }
}

impl Filters {
    pub fn new(node: &str, pod: &str, container: &str) -> Result<Self> {
        Ok(Self {
            node: NamePattern::compile("node", node)?,
            pod: NamePattern::compile("pod", pod)?,
            container: NamePattern::compile("container", container)?,
        })
    }

    pub fn match_all() -> Self {
        Self::default()
    }

    pub fn match_node(&self, name: &str) -> bool {
        self.node.is_match(name)
    }

    pub fn match_pod(&self, name: &str) -> bool {
        self.pod.is_match(name)
    }

    pub fn match_container(&self, name: &str) -> bool {
        self.container.is_match(name)
    }

    pub fn patterns(&self) -> [&str; 3] {
        [self.node.as_str(), self.pod.as_str(), self.container.as_str()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unanchored_patterns_search_anywhere() {
        let filters = Filters::new("worker", "^web-", "^c1$").unwrap();
        assert!(filters.match_node("gke-worker-1"));
        assert!(!filters.match_node("control-plane"));
        assert!(filters.match_pod("web-7d9f"));
        assert!(!filters.match_pod("api-web-1"));
        assert!(filters.match_container("c1"));
        assert!(!filters.match_container("c10"));
    }

    #[test]
    fn invalid_pattern_names_the_filter() {
        let err = Filters::new(".*", "([", ".*").unwrap_err();
        match err {
            KtopError::InvalidFilter {
                target, pattern, ..
            } => {
                assert_eq!(target, "pod");
                assert_eq!(pattern, "([");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn default_matches_everything() {
        let filters = Filters::default();
        assert!(filters.match_node(""));
        assert!(filters.match_pod("web-0"));
        assert!(filters.match_container("line\nbreak"));
        assert_eq!(filters.patterns(), [MATCH_ALL, MATCH_ALL, MATCH_ALL]);
    }

    #[test]
    fn explicit_match_all_behaves_like_the_default() {
        let filters = Filters::new(MATCH_ALL, "web", MATCH_ALL).unwrap();
        assert_eq!(filters.patterns(), [MATCH_ALL, "web", MATCH_ALL]);
        assert!(filters.match_node("control-plane"));
        assert!(!filters.match_pod("api-0"));
        assert_eq!(Filters::match_all().patterns(), Filters::default().patterns());
    }
}
