//! Rich text extraction from inline markdown and rendering back to it.
//!
//! Besides standard emphasis, code and links, text nodes may carry a custom
//! attribute syntax, `[content]{attrs}`, where `attrs` mixes `key: value`
//! pairs and `.class` tokens:
//!
//! ```text
//! [warning]{.red, .bold}   [note]{color: #336699, background: #eeeeee}
//! ```
//!
//! `==text==` is shorthand for `[text]{.highlight}`.

use std::sync::LazyLock;

use colmd_blocks::{Text, TextAttributes, TextRun};
use regex::Regex;

use crate::ast::Inline;

static CUSTOM_SYNTAX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\{([^}]+)\}").unwrap());
static KEY_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+):\s*([^,;]+)").unwrap());
static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.(\w+)").unwrap());
static HIGHLIGHT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"==(.+?)==").unwrap());

/// Colour names usable as `.class` tokens.
const NAMED_COLORS: [&str; 10] = [
    "red", "blue", "green", "yellow", "purple", "orange", "pink", "gray", "black", "white",
];

/// Background written as `.highlight`.
const HIGHLIGHT: &str = "yellow";

/// Build rich text from inline nodes.
pub(crate) fn inline_text(inlines: &[Inline]) -> Text {
    let mut text = Text::new();
    collect(inlines, &TextAttributes::default(), &mut text);
    text
}

fn collect(inlines: &[Inline], attrs: &TextAttributes, out: &mut Text) {
    for inline in inlines {
        match inline {
            Inline::Text(value) => {
                for mut run in parse_custom_syntax(value) {
                    run.attributes.merge(attrs);
                    out.push(run);
                }
            }
            Inline::Strong(children) => collect(children, &with(attrs, |a| a.bold = true), out),
            Inline::Emphasis(children) => {
                collect(children, &with(attrs, |a| a.italic = true), out);
            }
            Inline::Delete(children) => collect(children, &with(attrs, |a| a.strike = true), out),
            Inline::InlineCode(code) => {
                out.push(TextRun::new(code.as_str(), with(attrs, |a| a.code = true)));
            }
            Inline::Link { url, children } => {
                collect(children, &with(attrs, |a| a.link = Some(url.clone())), out);
            }
            Inline::Image { alt, .. } => out.push(TextRun::new(alt.as_str(), attrs.clone())),
            Inline::Break => out.push(TextRun::new("\n", attrs.clone())),
            Inline::Html(_) => {}
        }
    }
}

fn with(attrs: &TextAttributes, set: impl FnOnce(&mut TextAttributes)) -> TextAttributes {
    let mut attrs = attrs.clone();
    set(&mut attrs);
    attrs
}

/// Split a text node into runs, applying `[content]{attrs}` and
/// `==highlight==` spans.
pub(crate) fn parse_custom_syntax(value: &str) -> Vec<TextRun> {
    let mut runs = Vec::new();
    let mut last = 0;
    for caps in CUSTOM_SYNTAX_RE.captures_iter(value) {
        let (Some(whole), Some(content), Some(attrs)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        push_highlighted(&value[last..whole.start()], &mut runs);
        runs.push(TextRun::new(content.as_str(), parse_attributes(attrs.as_str())));
        last = whole.end();
    }
    push_highlighted(&value[last..], &mut runs);
    runs
}

fn push_highlighted(value: &str, runs: &mut Vec<TextRun>) {
    let mut last = 0;
    for caps in HIGHLIGHT_RE.captures_iter(value) {
        let (Some(whole), Some(content)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            runs.push(TextRun::plain(&value[last..whole.start()]));
        }
        let attrs = TextAttributes {
            background: Some(HIGHLIGHT.to_owned()),
            ..TextAttributes::default()
        };
        runs.push(TextRun::new(content.as_str(), attrs));
        last = whole.end();
    }
    if last < value.len() {
        runs.push(TextRun::plain(&value[last..]));
    }
}

/// Parse the attribute list of a custom span.
pub(crate) fn parse_attributes(input: &str) -> TextAttributes {
    let mut attrs = TextAttributes::default();

    for caps in KEY_VALUE_RE.captures_iter(input) {
        let (Some(key), Some(value)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let value = value.as_str().trim();
        let flag = value == "true" || value == "1";
        match key.as_str() {
            "color" => attrs.color = Some(value.to_owned()),
            "background" | "bg" => attrs.background = Some(value.to_owned()),
            "link" => attrs.link = Some(value.to_owned()),
            "bold" => attrs.bold = flag,
            "italic" => attrs.italic = flag,
            "strike" => attrs.strike = flag,
            "underline" => attrs.underline = flag,
            "code" => attrs.code = flag,
            other => {
                attrs.extra.insert(other.to_owned(), value.to_owned());
            }
        }
    }

    for caps in CLASS_RE.captures_iter(input) {
        let Some(class) = caps.get(1).map(|m| m.as_str()) else {
            continue;
        };
        match class {
            "bold" => attrs.bold = true,
            "italic" => attrs.italic = true,
            "strike" => attrs.strike = true,
            "underline" => attrs.underline = true,
            "code" => attrs.code = true,
            "highlight" => attrs.background = Some(HIGHLIGHT.to_owned()),
            color if NAMED_COLORS.contains(&color) => attrs.color = Some(color.to_owned()),
            _ => {}
        }
    }

    attrs
}

/// Attribute list for a custom span; empty when nothing needs it.
///
/// Links are not included, they are written as regular markdown links.
pub(crate) fn build_custom_attributes(attrs: &TextAttributes) -> String {
    let mut parts = Vec::new();

    if let Some(color) = &attrs.color {
        if NAMED_COLORS.contains(&color.as_str()) {
            parts.push(format!(".{color}"));
        } else {
            parts.push(format!("color: {color}"));
        }
    }
    if let Some(background) = &attrs.background {
        if background == HIGHLIGHT {
            parts.push(".highlight".to_owned());
        } else {
            parts.push(format!("background: {background}"));
        }
    }
    for (set, class) in [
        (attrs.bold, ".bold"),
        (attrs.italic, ".italic"),
        (attrs.strike, ".strike"),
        (attrs.underline, ".underline"),
        (attrs.code, ".code"),
    ] {
        if set {
            parts.push(class.to_owned());
        }
    }
    for (key, value) in &attrs.extra {
        parts.push(format!("{key}: {value}"));
    }

    parts.join(", ")
}

/// Render rich text as inline markdown.
pub(crate) fn render_text(text: &Text) -> String {
    let mut out = String::new();
    for run in text.runs() {
        render_run(run, &mut out);
    }
    out
}

fn render_run(run: &TextRun, out: &mut String) {
    let attrs = &run.attributes;
    let needs_custom = attrs.color.is_some()
        || attrs.background.is_some()
        || attrs.underline
        || !attrs.extra.is_empty();

    let mut inner = if needs_custom {
        let custom = build_custom_attributes(attrs);
        format!("[{}]{{{custom}}}", escape(&run.insert))
    } else {
        let mut inner = if attrs.code {
            code_span(&run.insert)
        } else {
            escape(&run.insert)
        };
        if attrs.strike {
            inner = format!("~~{inner}~~");
        }
        if attrs.italic {
            inner = format!("*{inner}*");
        }
        if attrs.bold {
            inner = format!("**{inner}**");
        }
        inner
    };

    if let Some(url) = &attrs.link {
        inner = format!("[{inner}]({})", link_destination(url));
    }
    out.push_str(&inner);
}

/// Escape characters that would otherwise start inline markup.
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '`' | '*' | '_' | '[' | ']' | '~' | '<' | '&') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Code span with a fence longer than any backtick run in `code`.
fn code_span(code: &str) -> String {
    let longest = code
        .split(|c: char| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = "`".repeat(longest + 1);
    let pad = if code.starts_with('`') || code.ends_with('`') {
        " "
    } else {
        ""
    };
    format!("{fence}{pad}{code}{pad}{fence}")
}

pub(crate) fn link_destination(url: &str) -> String {
    if url.contains(|c: char| c.is_whitespace() || c == '(' || c == ')') {
        format!("<{url}>")
    } else {
        url.to_owned()
    }
}
