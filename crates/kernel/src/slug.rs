//! Slug helpers for node translation paths.

/// Convert text into a URL-safe slug.
///
/// Transforms to lowercase, replaces non-alphanumeric characters with hyphens,
/// collapses consecutive hyphens, and trims leading/trailing hyphens.
pub fn slugify(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_was_hyphen = true; // Start true to skip leading hyphens

    for c in text.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c);
            prev_was_hyphen = false;
        } else if !prev_was_hyphen {
            result.push('-');
            prev_was_hyphen = true;
        }
    }

    while result.ends_with('-') {
        result.pop();
    }

    result
}

/// Join a parent url and a child slug into the child's full url.
///
/// A missing or empty parent url makes the slug itself the url.
pub fn join_url(parent_url: Option<&str>, slug: &str) -> String {
    match parent_url.map(|u| u.trim_end_matches('/')) {
        Some(parent) if !parent.is_empty() => format!("{parent}/{slug}"),
        _ => slug.to_string(),
    }
}

/// Split a slug path into its non-empty segments.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  About   Us! "), "about-us");
        assert_eq!(slugify("News & Events 2026"), "news-events-2026");
    }

    #[test]
    fn slugify_only_symbols() {
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn join_url_root_and_nested() {
        assert_eq!(join_url(None, "home"), "home");
        assert_eq!(join_url(Some(""), "home"), "home");
        assert_eq!(join_url(Some("home"), "about"), "home/about");
        assert_eq!(join_url(Some("home/"), "about"), "home/about");
    }

    #[test]
    fn segments_skip_empty_parts() {
        let parts: Vec<&str> = segments("/a//b/c/").collect();
        assert_eq!(parts, vec!["a", "b", "c"]);
    }
}
