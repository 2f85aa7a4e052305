//! Markdown rendering
//!
//! Markdown to HTML conversion for blog post content, using pulldown-cmark.
//! Rendering happens at save time; the stored `content_html` is served
//! as-is afterwards.

use pulldown_cmark::{html, Options, Parser};

/// Render Markdown to HTML.
///
/// Enables tables, footnotes, strikethrough, and task lists.
pub fn render_markdown(content: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(content, options);
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_heading_and_emphasis() {
        let html = render_markdown("# Hello\n\nThis is **bold**.");
        assert!(html.contains("<h1>"));
        assert!(html.contains("<strong>bold</strong>"));
    }

    #[test]
    fn test_renders_code_block() {
        let html = render_markdown("```\nlet x = 1;\n```");
        assert!(html.contains("<pre><code>"));
    }

    #[test]
    fn test_renders_table() {
        let html = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_renders_strikethrough() {
        let html = render_markdown("~~gone~~");
        assert!(html.contains("<del>gone</del>"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(render_markdown(""), "");
    }
}
