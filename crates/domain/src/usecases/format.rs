//! Formatting use case - turns a feed item into the announcement text

use crate::model::FeedItem;

/// Render the announcement for an item.
///
/// Updates get a fixed template. New items whose title starts with one of
/// `skip_prefix_categories` are posted as `"{content} - {link}"`; everything
/// else becomes `"New blog post: {link}"`.
pub fn format(item: &FeedItem, skip_prefix_categories: &[String], is_update: bool) -> String {
    if is_update {
        return format!("Blog post has been updated: {}", item.link);
    }

    if skip_prefix_categories
        .iter()
        .any(|category| item.title.starts_with(category.as_str()))
    {
        return format!("{} - {}", item.content, item.link);
    }

    format!("New blog post: {}", item.link)
}

/// Formatter bound to the configured skip-prefix categories
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    skip_prefix_categories: Vec<String>,
}

impl Formatter {
    pub fn new(skip_prefix_categories: Vec<String>) -> Self {
        Self {
            skip_prefix_categories,
        }
    }

    pub fn format(&self, item: &FeedItem, is_update: bool) -> String {
        format(item, &self.skip_prefix_categories, is_update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, content: &str, link: &str) -> FeedItem {
        FeedItem {
            title: title.to_string(),
            link: link.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_skip_prefix_category_uses_content() {
        let text = format(
            &item("Thoughts on X", "body", "L"),
            &["Thoughts".to_string()],
            false,
        );
        assert_eq!(text, "body - L");
    }

    #[test]
    fn test_default_announcement() {
        let text = format(&item("New Thing", "body", "L"), &[], false);
        assert_eq!(text, "New blog post: L");
    }

    #[test]
    fn test_update_template_wins_over_prefix() {
        let text = format(
            &item("Thoughts on X", "body", "L"),
            &["Thoughts".to_string()],
            true,
        );
        assert_eq!(text, "Blog post has been updated: L");
    }

    #[test]
    fn test_prefix_match_is_case_sensitive() {
        let text = format(
            &item("thoughts on X", "body", "L"),
            &["Thoughts".to_string()],
            false,
        );
        assert_eq!(text, "New blog post: L");
    }

    #[test]
    fn test_any_listed_category_matches() {
        let formatter = Formatter::new(vec!["Thoughts".to_string(), "Links".to_string()]);
        let text = formatter.format(&item("Links for the week", "a, b", "L"), false);
        assert_eq!(text, "a, b - L");
    }

    #[test]
    fn test_no_truncation() {
        let content = "x".repeat(2000);
        let text = format(&item("Thoughts", &content, "L"), &["Thoughts".to_string()], false);
        assert_eq!(text.len(), 2000 + " - L".len());
    }
}
