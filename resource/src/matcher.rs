//! Pattern matching for resource addresses.
//!
//! Patterns are colon-delimited: `Type:Qualifier:Action`. A segment is a
//! literal (compared case-insensitively), the wildcard `*`, or an
//! alternation group `(a|b|c)`. Wildcards occupy a whole segment; the only
//! multi-segment form is a final `*`, which matches any remaining depth.

/// Match a concrete resource address against a declarative pattern.
///
/// Malformed alternation groups compare as literal segments; this function
/// never fails.
pub fn matches(pattern: &str, candidate: &str) -> bool {
    let pattern_segments: Vec<&str> = pattern.split(':').collect();
    let candidate_segments: Vec<&str> = candidate.split(':').collect();

    if pattern_segments.last() == Some(&"*") {
        // Trailing wildcard: fixed head must match, any remaining depth
        // (including none) is covered.
        let head = &pattern_segments[..pattern_segments.len() - 1];
        if candidate_segments.len() < head.len() {
            return false;
        }
        return head
            .iter()
            .zip(candidate_segments.iter())
            .all(|(p, c)| segment_matches(p, c));
    }

    pattern_segments.len() == candidate_segments.len()
        && pattern_segments
            .iter()
            .zip(candidate_segments.iter())
            .all(|(p, c)| segment_matches(p, c))
}

/// Whether the pattern's first segment could cover the given type name.
///
/// Used to pre-filter statements by object kind before full matching.
pub fn matches_type(pattern: &str, type_name: &str) -> bool {
    let first = pattern.split(':').next().unwrap_or("");
    segment_matches(first, type_name)
}

fn segment_matches(pattern: &str, candidate: &str) -> bool {
    if pattern == "*" {
        return !candidate.is_empty();
    }
    if let Some(alternatives) = alternation(pattern) {
        return alternatives
            .iter()
            .any(|alt| alt.eq_ignore_ascii_case(candidate));
    }
    pattern.eq_ignore_ascii_case(candidate)
}

/// Split a well-formed `(a|b|c)` group into its alternatives.
///
/// Anything else, including unbalanced parens, yields `None` and falls back
/// to literal comparison.
fn alternation(segment: &str) -> Option<Vec<&str>> {
    let inner = segment.strip_prefix('(')?.strip_suffix(')')?;
    if inner.is_empty() || inner.contains('(') || inner.contains(')') {
        return None;
    }
    Some(inner.split('|').collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_segments_case_insensitive() {
        assert!(matches("Post:page:read", "post:page:read"));
        assert!(matches("post:PAGE:READ", "Post:page:read"));
        assert!(!matches("Post:page:read", "Post:post:read"));
    }

    #[test]
    fn test_segment_wildcard() {
        assert!(matches("Post:*:read", "Post:article:read"));
        assert!(matches("*:page:read", "Post:page:read"));
        // A plain wildcard still occupies exactly one segment.
        assert!(!matches("Post:*:read", "Post:a:b:read"));
    }

    #[test]
    fn test_trailing_wildcard_matches_any_depth() {
        assert!(matches("Post:article:*", "Post:article:read"));
        assert!(matches("Post:article:*", "Post:article:read:extra"));
        assert!(matches("Post:article:*", "Post:article"));
        assert!(!matches("Post:article:*", "Post:other:read"));
    }

    #[test]
    fn test_alternation_groups() {
        assert!(matches("Post:(page|post):read", "Post:post:read"));
        assert!(matches("Post:(page|post):read", "Post:PAGE:read"));
        assert!(!matches("Post:(page|post):read", "Post:article:read"));
    }

    #[test]
    fn test_segment_count_must_match() {
        assert!(!matches("Post:page", "Post:page:read"));
        assert!(!matches("Post:page:read", "Post:page"));
    }

    #[test]
    fn test_malformed_groups_compare_literally() {
        // Unbalanced parens never match a normal candidate segment...
        assert!(!matches("Post:(page|post:read", "Post:page:read"));
        // ...but still compare as the literal text they are.
        assert!(matches("Post:(page:read", "Post:(page:read"));
        assert!(!matches("Post:():read", "Post:page:read"));
    }

    #[test]
    fn test_wildcard_rejects_empty_segment() {
        assert!(!matches("Post:*:read", "Post::read"));
    }

    #[test]
    fn test_type_prefix_filter() {
        assert!(matches_type("Post:article:*", "post"));
        assert!(matches_type("(Post|Term):*", "term"));
        assert!(matches_type("*:anything", "route"));
        assert!(!matches_type("Post:article:*", "route"));
    }
}
