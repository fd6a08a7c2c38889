//! Recognition of directive tokens in raw HTML nodes.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;

use super::grammar::{
    CONTAINER_MARKER, ColumnRef, ContainerDecl, Directive, NOTE_SPLIT_MARKER, NoteConfig,
    REGION_CLOSE_MARKER, REGION_OPEN_MARKER,
};
use crate::diagnostic::{DiagnosticKind, Diagnostics};

static CONTAINER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^<!--\s*layout:multi-column(.*?)-->$").unwrap());
static REGION_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^<!--\s*end:content:column\s*-->$").unwrap());
static REGION_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^<!--\s*content:column(.*?)-->$").unwrap());
static NOTE_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^<!--\s*note:split(.*?)-->$").unwrap());

/// Interpret a raw HTML node as a directive.
///
/// Returns `None` for HTML that carries no directive marker and for
/// directives whose payload is malformed; the latter also records a
/// [`DiagnosticKind::DirectivePayload`] diagnostic.
///
/// Markers are tested in a fixed order. The region-close marker contains
/// the region-open marker, so it is checked first.
pub(crate) fn interpret(raw: &str, diagnostics: &mut Diagnostics) -> Option<Directive> {
    let text = raw.trim();

    if text.contains(CONTAINER_MARKER) {
        let payload = capture(&CONTAINER_RE, text, raw, diagnostics)?;
        return parse_payload::<ContainerDecl>(payload, raw, diagnostics)
            .map(Directive::ContainerDecl);
    }

    if text.contains(REGION_CLOSE_MARKER) {
        if REGION_CLOSE_RE.is_match(text) {
            return Some(Directive::RegionClose);
        }
        diagnostics.push(
            DiagnosticKind::DirectivePayload,
            "Region close marker has unexpected content",
            raw,
        );
        return None;
    }

    if text.contains(REGION_OPEN_MARKER) {
        let payload = capture(&REGION_OPEN_RE, text, raw, diagnostics)?;
        return parse_payload::<ColumnRef>(payload, raw, diagnostics).map(Directive::RegionOpen);
    }

    if text.contains(NOTE_SPLIT_MARKER) {
        let payload = capture(&NOTE_SPLIT_RE, text, raw, diagnostics)?;
        if payload.is_empty() {
            return Some(Directive::NoteSplit(NoteConfig::default()));
        }
        // A broken payload still splits, only the settings are lost
        let config = parse_payload::<NoteConfig>(payload, raw, diagnostics).unwrap_or_default();
        return Some(Directive::NoteSplit(config));
    }

    None
}

/// Extract the trimmed payload following a marker.
fn capture<'a>(
    re: &Regex,
    text: &'a str,
    raw: &str,
    diagnostics: &mut Diagnostics,
) -> Option<&'a str> {
    let Some(caps) = re.captures(text) else {
        diagnostics.push(
            DiagnosticKind::DirectivePayload,
            "Directive marker is not a well-formed comment",
            raw,
        );
        return None;
    };
    Some(caps.get(1).map_or("", |m| m.as_str().trim()))
}

fn parse_payload<T: DeserializeOwned>(
    payload: &str,
    raw: &str,
    diagnostics: &mut Diagnostics,
) -> Option<T> {
    match serde_json::from_str(payload) {
        Ok(value) => Some(value),
        Err(e) => {
            diagnostics.push(
                DiagnosticKind::DirectivePayload,
                format!("Invalid directive payload: {e}"),
                raw,
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::directive::ColumnSpec;

    fn run(raw: &str) -> (Option<Directive>, Vec<DiagnosticKind>) {
        let mut diagnostics = Diagnostics::default();
        let directive = interpret(raw, &mut diagnostics);
        (directive, diagnostics.kinds())
    }

    #[test]
    fn test_container_declaration() {
        let (directive, diagnostics) = run(
            "<!-- layout:multi-column{\"id\":\"c1\",\"columns\":[{\"id\":\"a\",\"width\":60},{\"id\":\"b\",\"width\":40}]} -->\n",
        );
        assert!(diagnostics.is_empty());
        assert_eq!(
            directive,
            Some(Directive::ContainerDecl(ContainerDecl {
                id: "c1".to_owned(),
                columns: vec![
                    ColumnSpec {
                        id: "a".to_owned(),
                        width: 60.0
                    },
                    ColumnSpec {
                        id: "b".to_owned(),
                        width: 40.0
                    },
                ],
                parent: None,
                insert: None,
            }))
        );
    }

    #[test]
    fn test_container_with_space_and_newlines() {
        let (directive, _) = run(
            "<!--\nlayout:multi-column {\n  \"id\": \"c\",\n  \"columns\": [],\n  \"parent\": \"p\",\n  \"insert\": \"x\"\n}\n-->",
        );
        let Some(Directive::ContainerDecl(decl)) = directive else {
            panic!("expected container, got {directive:?}");
        };
        assert_eq!(decl.parent_ref(), Some(ColumnRef::new("p", "x")));
    }

    #[test]
    fn test_region_open_and_close() {
        assert_eq!(
            run(r#"<!-- content:column{"parent":"c1","insert":"a"} -->"#),
            (
                Some(Directive::RegionOpen(ColumnRef::new("c1", "a"))),
                vec![]
            )
        );
        assert_eq!(
            run("<!-- end:content:column -->\n"),
            (Some(Directive::RegionClose), vec![])
        );
        assert_eq!(
            run("<!--end:content:column-->"),
            (Some(Directive::RegionClose), vec![])
        );
    }

    #[test]
    fn test_close_is_never_open() {
        let (directive, diagnostics) = run("<!-- end:content:column trailing -->");
        assert_eq!(directive, None);
        assert_eq!(diagnostics, vec![DiagnosticKind::DirectivePayload]);
    }

    #[test]
    fn test_malformed_json() {
        let (directive, diagnostics) = run("<!-- layout:multi-column{not json} -->");
        assert_eq!(directive, None);
        assert_eq!(diagnostics, vec![DiagnosticKind::DirectivePayload]);
    }

    #[test]
    fn test_missing_fields() {
        let (directive, diagnostics) = run(r#"<!-- content:column{"parent":"c1"} -->"#);
        assert_eq!(directive, None);
        assert_eq!(diagnostics, vec![DiagnosticKind::DirectivePayload]);

        let (directive, diagnostics) =
            run(r#"<!-- layout:multi-column{"id":"c","columns":[{"id":"a"}]} -->"#);
        assert_eq!(directive, None);
        assert_eq!(diagnostics, vec![DiagnosticKind::DirectivePayload]);
    }

    #[test]
    fn test_trailing_content_is_payload_error() {
        let (directive, diagnostics) =
            run(r#"<!-- content:column{"parent":"c","insert":"a"} --> extra"#);
        assert_eq!(directive, None);
        assert_eq!(diagnostics, vec![DiagnosticKind::DirectivePayload]);
    }

    #[test]
    fn test_note_split() {
        assert_eq!(
            run("<!-- note:split -->"),
            (Some(Directive::NoteSplit(NoteConfig::default())), vec![])
        );
        assert_eq!(
            run(r#"<!-- note:split{"title":"Intro","backgroundColor":"red"} -->"#).0,
            Some(Directive::NoteSplit(NoteConfig {
                title: Some("Intro".to_owned()),
                background_color: Some("red".to_owned()),
            }))
        );
    }

    #[test]
    fn test_note_split_bad_payload_still_splits() {
        let (directive, diagnostics) = run("<!-- note:split{oops} -->");
        assert_eq!(directive, Some(Directive::NoteSplit(NoteConfig::default())));
        assert_eq!(diagnostics, vec![DiagnosticKind::DirectivePayload]);
    }

    #[test]
    fn test_plain_html_is_not_a_directive() {
        assert_eq!(run("<!-- just a comment -->"), (None, vec![]));
        assert_eq!(run("<div>hello</div>"), (None, vec![]));
    }

    #[test]
    fn test_formatted_tokens_are_recognized() {
        use crate::directive::{format_container, format_region_open};

        let decl = ContainerDecl {
            id: "container-0".to_owned(),
            columns: vec![ColumnSpec {
                id: "col-1".to_owned(),
                width: 50.0,
            }],
            parent: Some("outer".to_owned()),
            insert: Some("col-2".to_owned()),
        };
        assert_eq!(
            run(&format_container(&decl)).0,
            Some(Directive::ContainerDecl(decl))
        );
        let column = ColumnRef::new("container-0", "col-1");
        assert_eq!(
            run(&format_region_open(&column)).0,
            Some(Directive::RegionOpen(column))
        );
    }
}
