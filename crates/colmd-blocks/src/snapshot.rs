//! JSON snapshot codec.
//!
//! Snapshots are the hand-off format to the document store that materializes
//! a block tree into an editable document:
//!
//! ```json
//! {
//!   "type": "block",
//!   "id": "…",
//!   "flavour": "affine:paragraph",
//!   "props": { "type": "h1", "text": { "$blocksuite:internal:text$": true, "delta": [] } },
//!   "children": []
//! }
//! ```

use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::{BlockKind, BlockNode, ListKind, NoteProps, ParagraphStyle, Text, TextAttributes, TextRun};

/// Marker key identifying a rich text value inside block props.
const TEXT_MARKER: &str = "$blocksuite:internal:text$";

/// Width given to a column whose snapshot has no usable `width`.
pub const DEFAULT_COLUMN_WIDTH: f64 = 50.0;

/// Error decoding a JSON snapshot.
///
/// Only a malformed envelope is an error. Unknown flavours and bad props
/// decode to best-effort blocks and are reported in [`Decoded::warnings`].
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Malformed JSON or envelope.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result of decoding a snapshot.
#[derive(Debug)]
pub struct Decoded<T> {
    pub value: T,
    /// One message per value that fell back to a default, prefixed with
    /// the block id.
    pub warnings: Vec<String>,
}

#[derive(Deserialize)]
struct RawBlock {
    #[serde(default)]
    id: String,
    flavour: String,
    #[serde(default)]
    props: Map<String, Value>,
    #[serde(default)]
    children: Vec<RawBlock>,
}

/// Encode a block tree as a JSON snapshot.
#[must_use]
pub fn to_snapshot(node: &BlockNode) -> Value {
    json!({
        "type": "block",
        "id": node.id,
        "flavour": node.kind.flavour(),
        "props": encode_props(node),
        "children": node.children.iter().map(to_snapshot).collect::<Vec<_>>(),
    })
}

/// Encode several notes as a JSON array.
#[must_use]
pub fn to_snapshots(notes: &[BlockNode]) -> Value {
    Value::Array(notes.iter().map(to_snapshot).collect())
}

/// Decode a JSON snapshot into a block tree.
pub fn from_snapshot(value: Value) -> Result<Decoded<BlockNode>, SnapshotError> {
    let raw: RawBlock = serde_json::from_value(value)?;
    let mut warnings = Vec::new();
    let value = decode_block(raw, &mut warnings);
    Ok(Decoded { value, warnings })
}

/// Decode either a single snapshot object or an array of snapshots.
pub fn from_snapshots(value: Value) -> Result<Decoded<Vec<BlockNode>>, SnapshotError> {
    let items = match value {
        Value::Array(items) => items,
        other => vec![other],
    };
    let raws = items
        .into_iter()
        .map(serde_json::from_value::<RawBlock>)
        .collect::<Result<Vec<_>, _>>()?;
    let mut warnings = Vec::new();
    let value = raws
        .into_iter()
        .map(|raw| decode_block(raw, &mut warnings))
        .collect();
    Ok(Decoded { value, warnings })
}

/// JSON number for a width, written as an integer when it has no fraction.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
pub fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}

fn encode_props(node: &BlockNode) -> Value {
    let text = || encode_text(node.text.as_ref());
    match &node.kind {
        BlockKind::Note(props) => {
            let mut map = Map::new();
            map.insert("xywh".to_owned(), json!(props.xywh));
            map.insert("background".to_owned(), json!(props.background));
            map.insert("index".to_owned(), json!(props.index));
            map.insert("hidden".to_owned(), json!(props.hidden));
            map.insert("displayMode".to_owned(), json!(props.display_mode));
            if let Some(title) = &props.title {
                map.insert("title".to_owned(), json!(title));
            }
            Value::Object(map)
        }
        BlockKind::Paragraph { style } => json!({ "type": style.as_str(), "text": text() }),
        BlockKind::List { kind, checked } => json!({
            "type": kind.as_str(),
            "text": text(),
            "checked": checked,
            "collapsed": false,
        }),
        BlockKind::Code { language } => json!({ "language": language, "text": text(), "wrap": false }),
        BlockKind::MultiColumnContainer => json!({}),
        BlockKind::Column { width } => json!({ "width": number_value(*width) }),
        BlockKind::Image { source, caption } => json!({
            "sourceId": source,
            "caption": caption,
            "width": 0,
            "height": 0,
            "index": "a0",
            "xywh": "[0,0,0,0]",
            "rotate": 0,
        }),
        BlockKind::Table { rows } => encode_table(rows),
        BlockKind::Other { .. } => json!({ "text": text() }),
    }
}

fn encode_text(text: Option<&Text>) -> Value {
    let delta: Vec<Value> = text
        .map(Text::runs)
        .unwrap_or_default()
        .iter()
        .map(|run| {
            if run.attributes.is_empty() {
                json!({ "insert": run.insert })
            } else {
                json!({ "insert": run.insert, "attributes": encode_attributes(&run.attributes) })
            }
        })
        .collect();
    let mut map = Map::new();
    map.insert(TEXT_MARKER.to_owned(), Value::Bool(true));
    map.insert("delta".to_owned(), Value::Array(delta));
    Value::Object(map)
}

fn encode_attributes(attrs: &TextAttributes) -> Value {
    let mut map = Map::new();
    for (key, set) in [
        ("bold", attrs.bold),
        ("italic", attrs.italic),
        ("strike", attrs.strike),
        ("underline", attrs.underline),
        ("code", attrs.code),
    ] {
        if set {
            map.insert(key.to_owned(), Value::Bool(true));
        }
    }
    for (key, value) in [
        ("link", &attrs.link),
        ("color", &attrs.color),
        ("background", &attrs.background),
    ] {
        if let Some(value) = value {
            map.insert(key.to_owned(), json!(value));
        }
    }
    for (key, value) in &attrs.extra {
        map.insert(key.clone(), json!(value));
    }
    Value::Object(map)
}

fn order_key(index: usize) -> String {
    format!("a{index:04}")
}

fn encode_table(rows: &[Vec<Text>]) -> Value {
    let column_count = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut columns = Map::new();
    for col in 0..column_count {
        let id = format!("col-{col}");
        columns.insert(id.clone(), json!({ "columnId": id, "order": order_key(col) }));
    }
    let mut row_map = Map::new();
    let mut cells = Map::new();
    for (row_idx, row) in rows.iter().enumerate() {
        let row_id = format!("row-{row_idx}");
        row_map.insert(row_id.clone(), json!({ "rowId": row_id, "order": order_key(row_idx) }));
        for col in 0..column_count {
            cells.insert(
                format!("{row_id}:col-{col}"),
                json!({ "text": encode_text(row.get(col)) }),
            );
        }
    }
    json!({ "columns": columns, "rows": row_map, "cells": cells })
}

fn warn(warnings: &mut Vec<String>, id: &str, message: String) {
    tracing::warn!(block = id, "{message}");
    warnings.push(format!("Block {id}: {message}"));
}

fn decode_block(raw: RawBlock, warnings: &mut Vec<String>) -> BlockNode {
    let props = &raw.props;
    let string_prop = |key: &str| props.get(key).and_then(Value::as_str).map(str::to_owned);

    let kind = match raw.flavour.as_str() {
        "affine:note" => {
            let defaults = NoteProps::default();
            BlockKind::Note(NoteProps {
                background: string_prop("background").unwrap_or(defaults.background),
                xywh: string_prop("xywh").unwrap_or(defaults.xywh),
                index: string_prop("index").unwrap_or(defaults.index),
                hidden: props
                    .get("hidden")
                    .and_then(Value::as_bool)
                    .unwrap_or(defaults.hidden),
                display_mode: string_prop("displayMode").unwrap_or(defaults.display_mode),
                title: string_prop("title"),
            })
        }
        "affine:paragraph" => BlockKind::Paragraph {
            style: string_prop("type")
                .as_deref()
                .and_then(ParagraphStyle::parse)
                .unwrap_or_default(),
        },
        "affine:list" => BlockKind::List {
            kind: string_prop("type")
                .as_deref()
                .and_then(ListKind::parse)
                .unwrap_or_default(),
            checked: props.get("checked").and_then(Value::as_bool).unwrap_or(false),
        },
        "affine:code" => BlockKind::Code {
            language: string_prop("language").unwrap_or_default(),
        },
        "affine:multi-column-container" => BlockKind::MultiColumnContainer,
        "affine:column" => {
            let width = props.get("width").and_then(Value::as_f64).unwrap_or_else(|| {
                warn(
                    warnings,
                    &raw.id,
                    format!("Column without numeric width, using {DEFAULT_COLUMN_WIDTH}"),
                );
                DEFAULT_COLUMN_WIDTH
            });
            BlockKind::Column { width }
        }
        "affine:image" => BlockKind::Image {
            source: string_prop("sourceId").unwrap_or_default(),
            caption: string_prop("caption").unwrap_or_default(),
        },
        "affine:table" => BlockKind::Table {
            rows: decode_table(props).unwrap_or_else(|| {
                warn(
                    warnings,
                    &raw.id,
                    "Table without columns, rows and cells, decoded as empty".to_owned(),
                );
                Vec::new()
            }),
        },
        other => BlockKind::Other {
            flavour: other.to_owned(),
        },
    };

    let text = decode_text(props.get("text"));
    let children = if let BlockKind::Other { flavour } = &kind {
        if !raw.children.is_empty() {
            warn(
                warnings,
                &raw.id,
                format!("Dropped {} children of {flavour}", raw.children.len()),
            );
        }
        Vec::new()
    } else {
        raw.children
            .into_iter()
            .map(|child| decode_block(child, warnings))
            .collect()
    };

    BlockNode {
        id: raw.id,
        kind,
        text,
        children,
    }
}

fn decode_text(value: Option<&Value>) -> Option<Text> {
    match value? {
        Value::String(s) => Some(Text::plain(s.as_str())),
        Value::Object(map) => {
            let delta = map.get("delta")?.as_array()?;
            Some(
                delta
                    .iter()
                    .filter_map(|op| {
                        let insert = op.get("insert")?.as_str()?;
                        let attributes = op
                            .get("attributes")
                            .and_then(Value::as_object)
                            .map(decode_attributes)
                            .unwrap_or_default();
                        Some(TextRun::new(insert, attributes))
                    })
                    .collect(),
            )
        }
        _ => None,
    }
}

fn decode_attributes(map: &Map<String, Value>) -> TextAttributes {
    let mut attrs = TextAttributes::default();
    for (key, value) in map {
        let flag = value.as_bool().unwrap_or(false);
        let text = || match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        match key.as_str() {
            "bold" => attrs.bold = flag,
            "italic" => attrs.italic = flag,
            "strike" => attrs.strike = flag,
            "underline" => attrs.underline = flag,
            "code" => attrs.code = flag,
            "link" => attrs.link = Some(text()),
            "color" => attrs.color = Some(text()),
            "background" => attrs.background = Some(text()),
            _ if value.is_null() => {}
            _ => {
                attrs.extra.insert(key.clone(), text());
            }
        }
    }
    attrs
}

fn decode_table(props: &Map<String, Value>) -> Option<Vec<Vec<Text>>> {
    let sorted_ids = |key: &str, id_field: &str| -> Option<Vec<String>> {
        let mut entries: Vec<(String, String)> = props
            .get(key)?
            .as_object()?
            .values()
            .filter_map(|entry| {
                let id = entry.get(id_field)?.as_str()?.to_owned();
                let order = entry.get("order")?.as_str()?.to_owned();
                Some((order, id))
            })
            .collect();
        entries.sort();
        Some(entries.into_iter().map(|(_, id)| id).collect())
    };

    let columns = sorted_ids("columns", "columnId")?;
    let rows = sorted_ids("rows", "rowId")?;
    let cells = props.get("cells")?.as_object()?;

    Some(
        rows.iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|col| {
                        cells
                            .get(&format!("{row}:{col}"))
                            .and_then(|cell| decode_text(cell.get("text")))
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect(),
    )
}
