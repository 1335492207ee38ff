//! Defensive markdown-to-HTML rendering.
//!
//! Content pages are stored as markdown and converted at request time. The
//! contract is deliberately forgiving: rendering must never take a page down.
//! If conversion fails for any reason the original text is returned unchanged,
//! so the worst case is unstyled content rather than an error page.

use pulldown_cmark::{Options, Parser, html};
use std::panic::{AssertUnwindSafe, catch_unwind};

/// render
///
/// Converts a markdown string to HTML.
///
/// - Empty input renders as the empty string.
/// - Inline and block HTML in the source passes through to the output
///   (content-role editors are trusted authors).
/// - Typographic substitution (smart punctuation), tables, strikethrough and
///   task lists are enabled.
/// - A panic inside the renderer is caught, logged, and the input is returned
///   verbatim. No failure propagates to the caller.
pub fn render(source: &str) -> String {
    if source.is_empty() {
        return String::new();
    }

    let result = catch_unwind(AssertUnwindSafe(|| {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_SMART_PUNCTUATION);

        let parser = Parser::new_ext(source, options);
        let mut out = String::with_capacity(source.len() * 2);
        html::push_html(&mut out, parser);
        out
    }));

    match result {
        Ok(rendered) => rendered,
        Err(_) => {
            tracing::warn!(len = source.len(), "markdown rendering failed, serving raw text");
            source.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_renders_empty() {
        assert_eq!(render(""), "");
    }

    #[test]
    fn paragraphs_and_headings_render() {
        let out = render("# Admissions\n\nApply *early*.");
        assert!(out.contains("<h1>Admissions</h1>"));
        assert!(out.contains("<em>early</em>"));
    }

    #[test]
    fn inline_html_passes_through() {
        let out = render("before <span class=\"badge\">new</span> after");
        assert!(out.contains("<span class=\"badge\">new</span>"));
    }

    #[test]
    fn smart_punctuation_is_applied() {
        let out = render("\"quoted\"");
        // Typographic substitution turns straight quotes into curly ones.
        assert!(out.contains('\u{201c}') && out.contains('\u{201d}'), "got: {out}");
    }

    #[test]
    fn explicit_links_render() {
        let out = render("[apply](/register)");
        assert!(out.contains("<a href=\"/register\">apply</a>"));
    }

    #[test]
    fn pathological_input_does_not_escape() {
        // Deeply nested emphasis and unterminated constructs must come back as
        // *some* string, never a panic reaching the caller.
        let nasty = "*".repeat(10_000) + "[[[" + &"`".repeat(1_000);
        let out = render(&nasty);
        assert!(!out.is_empty());
    }
}
