//! Markdown to block tree conversion.

use colmd_blocks::{
    BlockKind, BlockNode, IdSource, IdStrategy, ListKind, NoteProps, ParagraphStyle, Text,
};

use crate::ast::{self, Inline, ListItem, MdNode};
use crate::diagnostic::{Diagnostic, Diagnostics, Severity};
use crate::directive::interpret::interpret;
use crate::inline::inline_text;
use crate::layout::{LayoutState, RegionTracking};
use crate::split::{note_background, palette_background, split_sections};

/// Language of code blocks without an info string.
const DEFAULT_CODE_LANGUAGE: &str = "plain text";

/// Result of converting a single document.
#[derive(Debug)]
pub struct Conversion {
    /// The note owning every top-level block.
    pub root: BlockNode,
    pub diagnostics: Vec<Diagnostic>,
}

impl Conversion {
    /// Check whether any warning-level diagnostic was recorded.
    pub fn has_warnings(&self) -> bool {
        has_warnings(&self.diagnostics)
    }
}

/// Result of converting a document split into several notes.
#[derive(Debug)]
pub struct SplitConversion {
    pub notes: Vec<BlockNode>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SplitConversion {
    /// Check whether any warning-level diagnostic was recorded.
    pub fn has_warnings(&self) -> bool {
        has_warnings(&self.diagnostics)
    }
}

fn has_warnings(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(|d| d.severity == Severity::Warning)
}

/// Converts markdown with layout directives into block trees.
///
/// A converter only holds options. Every call to [`convert`] or
/// [`convert_split`] starts from fresh layout state and a fresh id source.
///
/// [`convert`]: MarkdownConverter::convert
/// [`convert_split`]: MarkdownConverter::convert_split
#[derive(Clone, Debug)]
pub struct MarkdownConverter {
    gfm: bool,
    region_tracking: RegionTracking,
    ids: IdStrategy,
    note: NoteProps,
}

impl Default for MarkdownConverter {
    fn default() -> Self {
        Self {
            gfm: true,
            region_tracking: RegionTracking::default(),
            ids: IdStrategy::default(),
            note: NoteProps::default(),
        }
    }
}

impl MarkdownConverter {
    /// Create a converter with GFM enabled, stacked regions and UUID ids.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable GFM tables, strikethrough and task lists.
    #[must_use]
    pub fn with_gfm(mut self, gfm: bool) -> Self {
        self.gfm = gfm;
        self
    }

    #[must_use]
    pub fn with_region_tracking(mut self, tracking: RegionTracking) -> Self {
        self.region_tracking = tracking;
        self
    }

    #[must_use]
    pub fn with_id_strategy(mut self, ids: IdStrategy) -> Self {
        self.ids = ids;
        self
    }

    /// Properties of the root note produced by [`MarkdownConverter::convert`].
    #[must_use]
    pub fn with_note_props(mut self, note: NoteProps) -> Self {
        self.note = note;
        self
    }

    /// Convert a document into a single note.
    pub fn convert(&self, markdown: &str) -> Conversion {
        let mut ids = self.ids.source();
        let mut diagnostics = Diagnostics::default();
        let root = self.convert_section(markdown, self.note.clone(), ids.as_mut(), &mut diagnostics);
        Conversion {
            root,
            diagnostics: diagnostics.into_vec(),
        }
    }

    /// Convert a document into one note per `<!-- note:split -->` section.
    ///
    /// Sections without blocks are dropped. Note `i` of the result is placed
    /// at `[0, i*100, 800, 95]` with index `a{i}`; its background comes from
    /// the marker's `backgroundColor` or the rotating default palette.
    pub fn convert_split(&self, markdown: &str) -> SplitConversion {
        let mut ids = self.ids.source();
        let mut diagnostics = Diagnostics::default();
        let mut notes = Vec::new();

        for section in split_sections(markdown, &mut diagnostics) {
            if section.body.trim().is_empty() {
                continue;
            }
            let index = notes.len();
            let props = NoteProps {
                background: section
                    .config
                    .background_color
                    .as_deref()
                    .map_or_else(|| palette_background(index), note_background),
                xywh: format!("[0,{},800,95]", index * 100),
                index: format!("a{index}"),
                title: section.config.title,
                ..NoteProps::default()
            };
            let note = self.convert_section(&section.body, props, ids.as_mut(), &mut diagnostics);
            if !note.children.is_empty() {
                notes.push(note);
            }
        }

        tracing::info!(notes = notes.len(), "Split markdown into notes");
        SplitConversion {
            notes,
            diagnostics: diagnostics.into_vec(),
        }
    }

    fn convert_section(
        &self,
        markdown: &str,
        props: NoteProps,
        ids: &mut dyn IdSource,
        diagnostics: &mut Diagnostics,
    ) -> BlockNode {
        let mut section_diagnostics = Diagnostics::default();
        let mut builder = TreeBuilder {
            root: BlockNode::new(ids.next_id(), BlockKind::Note(props)),
            layout: LayoutState::new(self.region_tracking),
            ids,
            diagnostics: &mut section_diagnostics,
        };
        for node in ast::parse(markdown, self.gfm) {
            builder.process(node);
        }

        let TreeBuilder { root, layout, .. } = builder;
        let containers = layout.registry().len();
        layout.finish(&mut section_diagnostics);

        tracing::info!(
            blocks = root.iter().count() - 1,
            containers,
            diagnostics = section_diagnostics.len(),
            "Converted markdown"
        );
        diagnostics.extend(section_diagnostics);
        root
    }
}

/// Builds one note from markdown nodes.
struct TreeBuilder<'a> {
    root: BlockNode,
    layout: LayoutState,
    ids: &'a mut dyn IdSource,
    diagnostics: &'a mut Diagnostics,
}

impl TreeBuilder<'_> {
    fn process(&mut self, node: MdNode) {
        match node {
            MdNode::Heading { depth, inlines } => {
                let block = self.text_block(
                    BlockKind::Paragraph {
                        style: ParagraphStyle::heading(depth),
                    },
                    inline_text(&inlines),
                );
                self.insert(block);
            }
            MdNode::Paragraph { inlines } => {
                let block = if let [Inline::Image { url, alt }] = inlines.as_slice() {
                    self.block(BlockKind::Image {
                        source: url.clone(),
                        caption: alt.clone(),
                    })
                } else {
                    self.text_block(
                        BlockKind::Paragraph {
                            style: ParagraphStyle::Text,
                        },
                        inline_text(&inlines),
                    )
                };
                self.insert(block);
            }
            MdNode::List { ordered, items } => self.process_list(ordered, items),
            MdNode::Code { lang, value } => {
                let language = lang.unwrap_or_else(|| DEFAULT_CODE_LANGUAGE.to_owned());
                let block = self.text_block(BlockKind::Code { language }, Text::plain(value));
                self.insert(block);
            }
            MdNode::Html { value } => {
                if let Some(directive) = interpret(&value, self.diagnostics) {
                    self.layout.apply(
                        directive,
                        &value,
                        &mut self.root,
                        self.ids,
                        self.diagnostics,
                    );
                }
            }
            MdNode::Table { rows } => {
                let rows = rows
                    .iter()
                    .map(|row| row.iter().map(|cell| inline_text(cell)).collect())
                    .collect();
                let block = self.block(BlockKind::Table { rows });
                self.insert(block);
            }
            MdNode::ThematicBreak => {}
        }
    }

    /// Emit one list block per item. Nested lists become sibling blocks
    /// following their parent item.
    fn process_list(&mut self, ordered: bool, items: Vec<ListItem>) {
        for item in items {
            let kind = match item.checked {
                Some(checked) => BlockKind::List {
                    kind: ListKind::Todo,
                    checked,
                },
                None => BlockKind::List {
                    kind: if ordered {
                        ListKind::Numbered
                    } else {
                        ListKind::Bulleted
                    },
                    checked: false,
                },
            };

            // Text comes from a leading paragraph only
            let mut children = item.children.into_iter();
            let text = match children.next() {
                Some(MdNode::Paragraph { inlines }) => inline_text(&inlines),
                _ => Text::new(),
            };
            let block = self.text_block(kind, text);
            self.insert(block);

            for child in children {
                if let MdNode::List { ordered, items } = child {
                    self.process_list(ordered, items);
                }
            }
        }
    }

    fn block(&mut self, kind: BlockKind) -> BlockNode {
        BlockNode::new(self.ids.next_id(), kind)
    }

    fn text_block(&mut self, kind: BlockKind, text: Text) -> BlockNode {
        self.block(kind).with_text(text)
    }

    fn insert(&mut self, block: BlockNode) {
        self.layout
            .insert_block(&mut self.root, block, self.diagnostics);
    }
}
