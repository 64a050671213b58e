//! Route definitions: verb, pattern segments and the handler they point at

use crate::container::ServiceKey;
use crate::dispatch::Invoker;
use std::borrow::Cow;
use std::fmt;

/// HTTP verbs the dispatcher knows how to invoke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
}

impl Verb {
    /// Parse a verb name, case-insensitively; anything but GET/POST is `None`
    pub fn parse(verb: &str) -> Option<Self> {
        if verb.eq_ignore_ascii_case("GET") {
            Some(Self::Get)
        } else if verb.eq_ignore_ascii_case("POST") {
            Some(Self::Post)
        } else {
            None
        }
    }

    pub fn from_method(method: &http::Method) -> Option<Self> {
        match *method {
            http::Method::GET => Some(Self::Get),
            http::Method::POST => Some(Self::Post),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `/`-separated piece of a route pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the path segment exactly
    Literal(String),
    /// `{name}`: accepts any path segment; the name is documentation only
    Placeholder(String),
}

impl Segment {
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => Self::Placeholder(name.to_string()),
            None => Self::Literal(raw.to_string()),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }
}

/// A route pattern split into segments, compared as authored
///
/// Patterns are written without a leading slash: `""` for the home page,
/// `"post/{id}"` for a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let segments = raw.split('/').map(Segment::parse).collect();
        Self { raw, segments }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of placeholders, i.e. the length of a successful capture
    pub fn placeholder_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_placeholder()).count()
    }

    /// Compare against already-split path segments
    ///
    /// Returns the placeholder captures in left-to-right order, or `None` when
    /// the segment counts differ or any literal segment disagrees.
    pub fn captures(&self, path: &[&str]) -> Option<Vec<String>> {
        if self.segments.len() != path.len() {
            return None;
        }

        let mut params = Vec::with_capacity(self.placeholder_count());
        for (segment, value) in self.segments.iter().zip(path) {
            match segment {
                Segment::Placeholder(_) => params.push((*value).to_string()),
                Segment::Literal(literal) if literal == value => {}
                Segment::Literal(_) => return None,
            }
        }
        Some(params)
    }

    /// Fill placeholders by name; `None` if any placeholder is left unfilled
    ///
    /// Values are percent-encoded so each one stays a single path segment.
    /// Captures are not decoded on the way back in.
    pub fn fill(&self, params: &[(&str, &str)]) -> Option<String> {
        let mut parts: Vec<Cow<'_, str>> = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => parts.push(Cow::Borrowed(literal.as_str())),
                Segment::Placeholder(name) => {
                    let (_, value) = params.iter().find(|(key, _)| key == name)?;
                    parts.push(urlencoding::encode(value));
                }
            }
        }
        Some(format!("/{}", parts.join("/")))
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// One route table entry: pattern, handler key, handler method and verb
#[derive(Clone)]
pub struct RouteDefinition {
    pattern: RoutePattern,
    handler: ServiceKey,
    method: String,
    verb: Verb,
    name: Option<String>,
    invoker: Invoker,
}

impl RouteDefinition {
    pub fn new(
        verb: Verb,
        pattern: impl Into<String>,
        handler: ServiceKey,
        method: impl Into<String>,
        invoker: Invoker,
    ) -> Self {
        Self {
            pattern: RoutePattern::parse(pattern),
            handler,
            method: method.into(),
            verb,
            name: None,
            invoker,
        }
    }

    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// Service key the handler is resolved under
    pub fn handler(&self) -> &ServiceKey {
        &self.handler
    }

    /// Name of the handler method to invoke
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub(crate) fn with_prefix(mut self, prefix: &str) -> Self {
        self.pattern = RoutePattern::parse(join_prefix(prefix, self.pattern.as_str()));
        self
    }

    pub(crate) fn invoker(&self) -> Invoker {
        self.invoker
    }
}

impl fmt::Debug for RouteDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDefinition")
            .field("verb", &self.verb)
            .field("pattern", &self.pattern.as_str())
            .field("handler", &self.handler)
            .field("method", &self.method)
            .field("name", &self.name)
            .finish()
    }
}

fn join_prefix(prefix: &str, pattern: &str) -> String {
    let prefix = prefix.trim_matches('/');
    match (prefix.is_empty(), pattern.is_empty()) {
        (true, _) => pattern.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{}/{}", prefix, pattern),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_segment_parse() {
        assert_eq!(Segment::parse("{id}"), Segment::Placeholder("id".into()));
        assert_eq!(Segment::parse("{}"), Segment::Placeholder(String::new()));
        assert_eq!(Segment::parse("post"), Segment::Literal("post".into()));
        assert_eq!(Segment::parse("{id"), Segment::Literal("{id".into()));
        assert_eq!(Segment::parse(""), Segment::Literal(String::new()));
    }

    #[test]
    fn test_pattern_captures_in_order() {
        let pattern = RoutePattern::parse("admin/{section}/edit/{id}");
        assert_eq!(
            pattern.captures(&["admin", "posts", "edit", "7"]),
            Some(vec!["posts".to_string(), "7".to_string()])
        );
        assert_eq!(pattern.captures(&["admin", "posts", "show", "7"]), None);
        assert_eq!(pattern.captures(&["admin", "posts", "edit"]), None);
    }

    #[test]
    fn test_literal_comparison_is_case_sensitive() {
        let pattern = RoutePattern::parse("Post/{id}");
        assert_eq!(pattern.captures(&["post", "1"]), None);
    }

    #[test]
    fn test_fill_substitutes_by_name() {
        let pattern = RoutePattern::parse("post/{id}");
        assert_eq!(pattern.fill(&[("id", "42")]), Some("/post/42".to_string()));
        assert_eq!(pattern.fill(&[]), None);
        assert_eq!(RoutePattern::parse("").fill(&[]), Some("/".to_string()));
    }

    #[test]
    fn test_fill_keeps_each_value_in_one_segment() {
        let pattern = RoutePattern::parse("tag/{name}");
        let url = pattern.fill(&[("name", "a b/c")]).unwrap();
        assert_eq!(url, "/tag/a%20b%2Fc");

        let segments = crate::routing::matcher::segments(&url);
        assert_eq!(pattern.captures(&segments), Some(vec!["a%20b%2Fc".to_string()]));
    }

    #[test]
    fn test_join_prefix() {
        assert_eq!(join_prefix("admin", ""), "admin");
        assert_eq!(join_prefix("/admin/", "posts"), "admin/posts");
        assert_eq!(join_prefix("", "posts"), "posts");
    }

    #[test]
    fn test_verb_parse() {
        assert_eq!(Verb::parse("get"), Some(Verb::Get));
        assert_eq!(Verb::parse("POST"), Some(Verb::Post));
        assert_eq!(Verb::parse("PUT"), None);
        assert_eq!(Verb::from_method(&http::Method::DELETE), None);
    }
}
