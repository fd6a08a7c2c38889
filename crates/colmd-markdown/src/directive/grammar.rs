//! Textual form of layout directives.
//!
//! Directives are HTML comments carrying a marker and an optional JSON
//! payload:
//!
//! ```text
//! <!-- layout:multi-column {"id":"c","columns":[{"id":"a","width":60}]} -->
//! <!-- content:column {"parent":"c","insert":"a"} -->
//! <!-- end:content:column -->
//! <!-- note:split {"title":"Intro","backgroundColor":"green"} -->
//! ```
//!
//! Whitespace between marker and payload is optional on input; the
//! formatting functions here emit exactly one space.

use colmd_blocks::snapshot::number_value;
use serde::{Deserialize, Serialize, Serializer};

pub const CONTAINER_MARKER: &str = "layout:multi-column";
pub const REGION_OPEN_MARKER: &str = "content:column";
pub const REGION_CLOSE_MARKER: &str = "end:content:column";
pub const NOTE_SPLIT_MARKER: &str = "note:split";

/// The region-close token as emitted by the renderer.
pub const REGION_CLOSE_TOKEN: &str = "<!-- end:content:column -->";

/// A parsed directive.
#[derive(Clone, Debug, PartialEq)]
pub enum Directive {
    /// Declares a multi-column container and its columns.
    ContainerDecl(ContainerDecl),
    /// Routes following blocks into a declared column.
    RegionOpen(ColumnRef),
    /// Ends the innermost open region.
    RegionClose,
    /// Starts a new note; only meaningful when splitting.
    NoteSplit(NoteConfig),
}

/// Payload of a container declaration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContainerDecl {
    pub id: String,
    pub columns: Vec<ColumnSpec>,
    /// Container owning the column this container nests in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Column of `parent` this container nests in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert: Option<String>,
}

impl ContainerDecl {
    /// Parent column reference, when both halves are present.
    pub fn parent_ref(&self) -> Option<ColumnRef> {
        match (&self.parent, &self.insert) {
            (Some(parent), Some(insert)) => Some(ColumnRef::new(parent, insert)),
            _ => None,
        }
    }
}

/// Declared column of a container.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub id: String,
    #[serde(serialize_with = "serialize_width")]
    pub width: f64,
}

/// Reference to a column: `parent` container id plus `insert` column id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    pub parent: String,
    pub insert: String,
}

impl ColumnRef {
    pub fn new(parent: impl Into<String>, insert: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            insert: insert.into(),
        }
    }

    /// Registry key `parent.insert`.
    pub fn key(&self) -> String {
        column_key(&self.parent, &self.insert)
    }
}

/// Per-note settings carried by a note-split marker.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        rename = "backgroundColor",
        skip_serializing_if = "Option::is_none"
    )]
    pub background_color: Option<String>,
}

impl NoteConfig {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.background_color.is_none()
    }
}

/// Compound registry key of a column.
pub fn column_key(container: &str, column: &str) -> String {
    format!("{container}.{column}")
}

/// Format a container declaration token.
pub fn format_container(decl: &ContainerDecl) -> String {
    format!("<!-- {CONTAINER_MARKER} {} -->", payload_json(decl))
}

/// Format a region-open token.
pub fn format_region_open(column: &ColumnRef) -> String {
    format!("<!-- {REGION_OPEN_MARKER} {} -->", payload_json(column))
}

/// Format a note-split token. An empty config produces the bare marker.
pub fn format_note_split(config: &NoteConfig) -> String {
    if config.is_empty() {
        format!("<!-- {NOTE_SPLIT_MARKER} -->")
    } else {
        format!("<!-- {NOTE_SPLIT_MARKER} {} -->", payload_json(config))
    }
}

fn payload_json<T: Serialize>(payload: &T) -> String {
    serde_json::to_string(payload).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to serialize directive payload");
        String::new()
    })
}

/// Widths are written as integers when they have no fractional part.
fn serialize_width<S: Serializer>(width: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    number_value(*width).serialize(serializer)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn decl(parent: Option<(&str, &str)>) -> ContainerDecl {
        ContainerDecl {
            id: "container-1".to_owned(),
            columns: vec![
                ColumnSpec {
                    id: "col-1".to_owned(),
                    width: 60.0,
                },
                ColumnSpec {
                    id: "col-2".to_owned(),
                    width: 33.5,
                },
            ],
            parent: parent.map(|(p, _)| p.to_owned()),
            insert: parent.map(|(_, i)| i.to_owned()),
        }
    }

    #[test]
    fn test_format_container() {
        assert_eq!(
            format_container(&decl(None)),
            r#"<!-- layout:multi-column {"id":"container-1","columns":[{"id":"col-1","width":60},{"id":"col-2","width":33.5}]} -->"#
        );
    }

    #[test]
    fn test_format_nested_container() {
        let token = format_container(&decl(Some(("container-0", "col-2"))));
        assert!(token.ends_with(r#""parent":"container-0","insert":"col-2"} -->"#));
    }

    #[test]
    fn test_format_region_open() {
        assert_eq!(
            format_region_open(&ColumnRef::new("container-0", "col-1")),
            r#"<!-- content:column {"parent":"container-0","insert":"col-1"} -->"#
        );
    }

    #[test]
    fn test_format_note_split() {
        assert_eq!(format_note_split(&NoteConfig::default()), "<!-- note:split -->");
        let config = NoteConfig {
            title: Some("Intro".to_owned()),
            background_color: Some("green".to_owned()),
        };
        assert_eq!(
            format_note_split(&config),
            r#"<!-- note:split {"title":"Intro","backgroundColor":"green"} -->"#
        );
    }

    #[test]
    fn test_parent_ref_needs_both_halves() {
        assert_eq!(
            decl(Some(("a", "b"))).parent_ref().map(|r| r.key()),
            Some("a.b".to_owned())
        );
        let mut half = decl(None);
        half.parent = Some("a".to_owned());
        assert!(half.parent_ref().is_none());
    }
}
