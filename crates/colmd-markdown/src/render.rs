//! Block tree to markdown rendering.
//!
//! Containers get fresh ids (`container-0`, `container-1`, ...) and their
//! columns are numbered `col-1`, `col-2`, ... in child order. Ids from the
//! tree are never written, so parsing the output yields a tree with the same
//! structure but new ids.

use colmd_blocks::{BlockKind, BlockNode, ListKind, NoteProps, ParagraphStyle, Text};

use crate::directive::{
    ColumnRef, ColumnSpec, ContainerDecl, NoteConfig, REGION_CLOSE_TOKEN, format_container,
    format_note_split, format_region_open,
};
use crate::inline::{escape, link_destination, render_text};

const BLOCK_SEPARATOR: &str = "\n\n";
const NOTE_SEPARATOR: &str = "\n\n<!-- note:split -->\n\n";

/// Renders block trees back to markdown with layout directives.
#[derive(Clone, Copy, Debug, Default)]
pub struct MarkdownRenderer {
    note_settings: bool,
}

impl MarkdownRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write each note's title and background into its split marker.
    ///
    /// Without this, [`MarkdownRenderer::render_notes`] separates notes with
    /// bare markers and note settings are lost.
    #[must_use]
    pub fn with_note_settings(mut self) -> Self {
        self.note_settings = true;
        self
    }

    /// Render the children of a note.
    pub fn render(&self, root: &BlockNode) -> String {
        Walker::default().children(root, None)
    }

    /// Render several notes separated by note-split markers.
    ///
    /// Notes that render to nothing are skipped. Container ids keep counting
    /// across notes.
    pub fn render_notes(&self, notes: &[BlockNode]) -> String {
        let mut walker = Walker::default();
        let mut out = String::new();
        let mut first = true;

        for note in notes {
            let body = walker.children(note, None);
            if body.trim().is_empty() {
                continue;
            }
            if self.note_settings {
                let config = note_config(note);
                if !first {
                    out.push_str(BLOCK_SEPARATOR);
                }
                if !(first && config.is_empty()) {
                    out.push_str(&format_note_split(&config));
                    out.push_str(BLOCK_SEPARATOR);
                }
            } else if !first {
                out.push_str(NOTE_SEPARATOR);
            }
            out.push_str(&body);
            first = false;
        }
        out
    }
}

fn note_config(note: &BlockNode) -> NoteConfig {
    match &note.kind {
        BlockKind::Note(NoteProps {
            title, background, ..
        }) => NoteConfig {
            title: title.clone(),
            background_color: Some(background.clone()),
        },
        _ => NoteConfig::default(),
    }
}

/// State of one render call.
#[derive(Default)]
struct Walker {
    containers: usize,
}

impl Walker {
    fn children(&mut self, parent: &BlockNode, column: Option<&ColumnRef>) -> String {
        let parts: Vec<String> = parent
            .children
            .iter()
            .map(|child| self.block(child, column))
            .filter(|part| !part.trim().is_empty())
            .collect();
        parts.join(BLOCK_SEPARATOR)
    }

    fn block(&mut self, node: &BlockNode, column: Option<&ColumnRef>) -> String {
        let text = || node.text.as_ref().map(render_text).unwrap_or_default();
        match &node.kind {
            BlockKind::Paragraph {
                style: ParagraphStyle::Text,
            } => escape_block_start(&text()),
            BlockKind::Paragraph {
                style: ParagraphStyle::Heading(level),
            } => format!("{} {}", "#".repeat(usize::from(*level)), text()),
            BlockKind::List { kind, checked } => {
                let marker = match (kind, checked) {
                    (ListKind::Numbered, _) => "1. ",
                    (ListKind::Todo, true) => "- [x] ",
                    (ListKind::Todo, false) => "- [ ] ",
                    (ListKind::Bulleted, _) => "- ",
                };
                format!("{marker}{}", escape_block_start(&text()))
            }
            BlockKind::Code { language } => code_block(language, &node.plain_text()),
            BlockKind::MultiColumnContainer => self.container(node, column),
            BlockKind::Column { .. } => String::new(),
            BlockKind::Image { source, caption } => {
                format!("![{}]({})", escape(caption), link_destination(source))
            }
            BlockKind::Table { rows } => table(rows),
            BlockKind::Note(_) => self.children(node, column),
            BlockKind::Other { .. } => escape_block_start(&escape(&node.plain_text())),
        }
    }

    fn container(&mut self, node: &BlockNode, enclosing: Option<&ColumnRef>) -> String {
        let id = format!("container-{}", self.containers);
        self.containers += 1;

        let columns: Vec<(&BlockNode, f64)> = node
            .children
            .iter()
            .filter_map(|child| match child.kind {
                BlockKind::Column { width } => Some((child, width)),
                _ => None,
            })
            .collect();

        let decl = ContainerDecl {
            id: id.clone(),
            columns: columns
                .iter()
                .enumerate()
                .map(|(idx, (_, width))| ColumnSpec {
                    id: column_id(idx),
                    width: *width,
                })
                .collect(),
            parent: enclosing.map(|c| c.parent.clone()),
            insert: enclosing.map(|c| c.insert.clone()),
        };

        let mut parts = vec![format_container(&decl)];
        for (idx, (column, _)) in columns.iter().enumerate() {
            if column.children.is_empty() {
                continue;
            }
            let here = ColumnRef::new(id.as_str(), column_id(idx));
            parts.push(format_region_open(&here));
            let body = self.children(column, Some(&here));
            if !body.is_empty() {
                parts.push(body);
            }
            parts.push(REGION_CLOSE_TOKEN.to_owned());
        }
        parts.join(BLOCK_SEPARATOR)
    }
}

fn column_id(idx: usize) -> String {
    format!("col-{}", idx + 1)
}

/// Fenced code block whose fence outlasts any backtick run in `code`.
fn code_block(language: &str, code: &str) -> String {
    let longest = code
        .split(|c: char| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = "`".repeat(longest.max(2) + 1);
    if code.is_empty() {
        format!("{fence}{language}\n{fence}")
    } else {
        format!("{fence}{language}\n{code}\n{fence}")
    }
}

/// Padded pipe table, header row first.
fn table(rows: &[Vec<Text>]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| render_text(cell).replace('|', r"\|").replace('\n', " "))
                .collect()
        })
        .collect();
    let column_count = cells.iter().map(Vec::len).max().unwrap_or(0);
    if column_count == 0 {
        return String::new();
    }

    let mut widths = vec![3; column_count];
    for row in &cells {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let format_row = |row: &[String]| {
        let padded: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(idx, &width)| {
                let cell = row.get(idx).map_or("", String::as_str);
                format!("{cell:<width$}")
            })
            .collect();
        format!("| {} |", padded.join(" | "))
    };

    let mut lines = Vec::with_capacity(cells.len() + 1);
    let mut rows_iter = cells.iter();
    if let Some(header) = rows_iter.next() {
        lines.push(format_row(header));
    }
    let separator: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    lines.push(format!("| {} |", separator.join(" | ")));
    lines.extend(rows_iter.map(|row| format_row(row)));
    lines.join("\n")
}

/// Escape the start of every line that would turn text into another block.
fn escape_block_start(text: &str) -> String {
    if text.trim().is_empty() {
        return text.to_owned();
    }
    text.split('\n')
        .map(escape_line_start)
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_line_start(line: &str) -> String {
    // Leading whitespace is stripped or read as an indented code block
    if let Some(rest) = line.strip_prefix(' ') {
        return format!("&#32;{rest}");
    }
    if let Some(rest) = line.strip_prefix('\t') {
        return format!("&#9;{rest}");
    }
    if line.starts_with(['#', '-', '+', '>', '=']) {
        return format!("\\{line}");
    }
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 && line[digits..].starts_with(['.', ')']) {
        return format!("{}\\{}", &line[..digits], &line[digits..]);
    }
    line.to_owned()
}
