//! Splitting a document into notes on `<!-- note:split -->` markers.

use std::sync::LazyLock;

use regex::Regex;

use crate::diagnostic::Diagnostics;
use crate::directive::interpret::interpret;
use crate::directive::{Directive, NoteConfig};
use crate::fence::FenceTracker;

static MARKER_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*<!--\s*note:split").unwrap());

/// Prefix of the note background CSS variables.
const BACKGROUND_PREFIX: &str = "--affine-note-background-";

/// Backgrounds assigned in turn to notes without a configured colour.
const PALETTE: [&str; 6] = ["blue", "green", "yellow", "pink", "purple", "orange"];

/// Markdown of one note plus the settings of the marker that opened it.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Section {
    pub(crate) config: NoteConfig,
    pub(crate) body: String,
}

/// Split markdown on note-split markers.
///
/// The first section has no marker and an empty config. Markers may span
/// several lines and are ignored inside fenced code blocks.
pub(crate) fn split_sections(markdown: &str, diagnostics: &mut Diagnostics) -> Vec<Section> {
    let mut sections = vec![Section::default()];
    let mut fence = FenceTracker::new();
    let mut pending: Option<String> = None;

    for line in markdown.split_inclusive('\n') {
        if let Some(marker) = pending.as_mut() {
            marker.push_str(line);
            if line.contains("-->") {
                let marker = pending.take().unwrap_or_default();
                sections.push(start_section(&marker, diagnostics));
            }
            continue;
        }

        if !fence.in_fence() && MARKER_START_RE.is_match(line) {
            if line.contains("-->") {
                sections.push(start_section(line, diagnostics));
            } else {
                pending = Some(line.to_owned());
            }
            continue;
        }

        fence.update(line);
        if let Some(section) = sections.last_mut() {
            section.body.push_str(line);
        }
    }

    // An unterminated marker is ordinary content
    if let (Some(marker), Some(section)) = (pending, sections.last_mut()) {
        section.body.push_str(&marker);
    }

    sections
}

fn start_section(marker: &str, diagnostics: &mut Diagnostics) -> Section {
    let config = match interpret(marker, diagnostics) {
        Some(Directive::NoteSplit(config)) => config,
        _ => NoteConfig::default(),
    };
    tracing::debug!(title = ?config.title, "Split note");
    Section {
        config,
        body: String::new(),
    }
}

/// Map a colour name to its note background variable.
///
/// Known names (`grey` is an alias of `gray`) map to
/// `--affine-note-background-*`; anything else is returned unchanged.
pub fn note_background(color: &str) -> String {
    match color.to_ascii_lowercase().as_str() {
        name @ ("red" | "blue" | "green" | "yellow" | "pink" | "purple" | "orange" | "gray") => {
            format!("{BACKGROUND_PREFIX}{name}")
        }
        "grey" => format!("{BACKGROUND_PREFIX}gray"),
        _ => color.to_owned(),
    }
}

/// Default background of the note at `index`.
pub fn palette_background(index: usize) -> String {
    note_background(PALETTE[index % PALETTE.len()])
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::diagnostic::DiagnosticKind;

    fn split(markdown: &str) -> (Vec<Section>, Vec<DiagnosticKind>) {
        let mut diagnostics = Diagnostics::default();
        let sections = split_sections(markdown, &mut diagnostics);
        (sections, diagnostics.kinds())
    }

    fn bodies(sections: &[Section]) -> Vec<&str> {
        sections.iter().map(|s| s.body.as_str()).collect()
    }

    #[test]
    fn test_no_marker_is_one_section() {
        let (sections, _) = split("# Title\n\nText\n");
        assert_eq!(bodies(&sections), vec!["# Title\n\nText\n"]);
    }

    #[test]
    fn test_split_with_config() {
        let (sections, diagnostics) = split(
            "One\n\n<!-- note:split -->\n\nTwo\n<!-- note:split{\"title\":\"Three\",\"backgroundColor\":\"red\"} -->\nThree",
        );
        assert!(diagnostics.is_empty());
        assert_eq!(bodies(&sections), vec!["One\n\n", "\nTwo\n", "Three"]);
        assert_eq!(sections[1].config, NoteConfig::default());
        assert_eq!(sections[2].config.title.as_deref(), Some("Three"));
        assert_eq!(sections[2].config.background_color.as_deref(), Some("red"));
    }

    #[test]
    fn test_multiline_marker() {
        let (sections, _) = split("A\n<!-- note:split\n{\"title\": \"B\"}\n-->\nB\n");
        assert_eq!(bodies(&sections), vec!["A\n", "B\n"]);
        assert_eq!(sections[1].config.title.as_deref(), Some("B"));
    }

    #[test]
    fn test_marker_in_code_fence_is_content() {
        let markdown = "```markdown\n<!-- note:split -->\n```\n";
        let (sections, _) = split(markdown);
        assert_eq!(bodies(&sections), vec![markdown]);
    }

    #[test]
    fn test_bad_payload_still_splits() {
        let (sections, diagnostics) = split("A\n<!-- note:split{nope} -->\nB\n");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].config, NoteConfig::default());
        assert_eq!(diagnostics, vec![DiagnosticKind::DirectivePayload]);
    }

    #[test]
    fn test_unterminated_marker_is_content() {
        let (sections, _) = split("A\n<!-- note:split\nB\n");
        assert_eq!(bodies(&sections), vec!["A\n<!-- note:split\nB\n"]);
    }

    #[test]
    fn test_note_background() {
        assert_eq!(note_background("red"), "--affine-note-background-red");
        assert_eq!(note_background("Grey"), "--affine-note-background-gray");
        assert_eq!(
            note_background("--affine-note-background-pink"),
            "--affine-note-background-pink"
        );
        assert_eq!(note_background("#ffeeaa"), "#ffeeaa");
    }

    #[test]
    fn test_palette_rotates() {
        assert_eq!(palette_background(0), "--affine-note-background-blue");
        assert_eq!(palette_background(5), "--affine-note-background-orange");
        assert_eq!(palette_background(6), "--affine-note-background-blue");
    }
}
