//! Markup handling for editor content.
//!
//! Note bodies are HTML fragments from a rich-text editor. Generated
//! refinements are sanitized with [`sanitize_markup`] before they are offered
//! to the user; listings show the [`strip_tags`] plain-text form.

use ammonia::Builder;
use regex::Regex;
use std::sync::OnceLock;

fn sanitizer() -> &'static Builder<'static> {
    static BUILDER: OnceLock<Builder<'static>> = OnceLock::new();
    BUILDER.get_or_init(|| {
        let mut builder = Builder::default();
        builder.link_rel(None);
        builder
    })
}

fn any_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>?").expect("static pattern"))
}

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static pattern"))
}

/// Removes executable markup while keeping formatting.
///
/// The fragment is parsed and re-serialized against an allowlist of
/// formatting elements and attributes. `<script>` and `<style>` are dropped
/// with their content; URLs are limited to safe schemes.
pub fn sanitize_markup(markup: &str) -> String {
    sanitizer().clean(markup).to_string()
}

/// Returns the text content of `markup` with every tag removed.
pub fn strip_tags(markup: &str) -> String {
    any_tag().replace_all(markup, "").into_owned()
}

/// True when `markup` has no visible text, e.g. `""` or `"<p><br></p>"`.
pub fn is_blank(markup: &str) -> bool {
    strip_tags(markup)
        .replace("&nbsp;", " ")
        .trim()
        .is_empty()
}

/// Plain-text excerpt of at most `max_chars` characters with whitespace collapsed.
pub fn preview(markup: &str, max_chars: usize) -> String {
    let text = strip_tags(markup).replace("&nbsp;", " ");
    let collapsed = whitespace_run().replace_all(text.trim(), " ");
    if collapsed.chars().count() <= max_chars {
        return collapsed.into_owned();
    }
    let mut cut: String = collapsed.chars().take(max_chars).collect();
    cut.push('…');
    cut
}
