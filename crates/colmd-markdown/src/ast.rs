//! Markdown node model and the pulldown-cmark adapter that produces it.
//!
//! The converter never looks at tokenizer events directly. [`parse`] folds
//! the event stream into a closed [`MdNode`] / [`Inline`] enumeration, which
//! the block tree builder then matches exhaustively.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// Block-level markdown node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MdNode {
    Heading { depth: u8, inlines: Vec<Inline> },
    Paragraph { inlines: Vec<Inline> },
    List { ordered: bool, items: Vec<ListItem> },
    /// Code block; `value` has its trailing newline removed.
    Code { lang: Option<String>, value: String },
    /// Raw HTML block, verbatim.
    Html { value: String },
    /// Table cells, header row first.
    Table { rows: Vec<Vec<Vec<Inline>>> },
    ThematicBreak,
}

/// Item of a list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListItem {
    /// Task list state; `None` for ordinary items.
    pub checked: Option<bool>,
    /// Block content. Tight items get a synthesized paragraph, so inline
    /// content always sits inside a [`MdNode::Paragraph`].
    pub children: Vec<MdNode>,
}

/// Inline markdown node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
    Delete(Vec<Inline>),
    InlineCode(String),
    Link { url: String, children: Vec<Inline> },
    Image { url: String, alt: String },
    Html(String),
    Break,
}

/// Tokenizer options for the given GFM setting.
pub(crate) fn parser_options(gfm: bool) -> Options {
    if gfm {
        Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_GFM
    } else {
        Options::empty()
    }
}

/// Parse markdown into block nodes.
///
/// With `gfm` enabled, tables, strikethrough and task lists are recognized.
pub fn parse(markdown: &str, gfm: bool) -> Vec<MdNode> {
    let mut builder = AstBuilder::default();
    for event in Parser::new_ext(markdown, parser_options(gfm)) {
        builder.event(event);
    }
    builder.nodes
}

/// Concatenated plain text of inline nodes.
pub fn plain_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    collect_plain(inlines, &mut out);
    out
}

fn collect_plain(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text(text) | Inline::InlineCode(text) | Inline::Image { alt: text, .. } => {
                out.push_str(text);
            }
            Inline::Strong(children)
            | Inline::Emphasis(children)
            | Inline::Delete(children)
            | Inline::Link { children, .. } => collect_plain(children, out),
            Inline::Break => out.push('\n'),
            Inline::Html(_) => {}
        }
    }
}

enum Span {
    Strong,
    Emphasis,
    Delete,
    Link(String),
}

/// Open element while folding the event stream.
enum Frame {
    Paragraph(Vec<Inline>),
    Heading {
        depth: u8,
        inlines: Vec<Inline>,
    },
    List {
        ordered: bool,
        items: Vec<ListItem>,
    },
    Item {
        checked: Option<bool>,
        children: Vec<MdNode>,
        /// Inline content of a tight item not yet wrapped in a paragraph.
        loose: Vec<Inline>,
    },
    Code {
        lang: Option<String>,
        value: String,
    },
    Html(String),
    Table(Vec<Vec<Vec<Inline>>>),
    Row(Vec<Vec<Inline>>),
    Cell(Vec<Inline>),
    Span {
        span: Span,
        children: Vec<Inline>,
    },
    Image {
        url: String,
        alt: Vec<Inline>,
    },
    /// Unsupported construct; everything inside is discarded.
    Skip,
}

#[derive(Default)]
struct AstBuilder {
    stack: Vec<Frame>,
    nodes: Vec<MdNode>,
}

impl AstBuilder {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.push_inline(Inline::InlineCode(code.into_string())),
            Event::Html(html) => self.html(&html),
            Event::InlineHtml(html) => self.push_inline(Inline::Html(html.into_string())),
            Event::SoftBreak => self.text("\n"),
            Event::HardBreak => self.push_inline(Inline::Break),
            Event::Rule => self.push_block(MdNode::ThematicBreak),
            Event::TaskListMarker(checked) => self.task_list_marker(checked),
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        let frame = match tag {
            Tag::Paragraph => Frame::Paragraph(Vec::new()),
            Tag::Heading { level, .. } => Frame::Heading {
                depth: heading_depth(level),
                inlines: Vec::new(),
            },
            Tag::List(start) => Frame::List {
                ordered: start.is_some(),
                items: Vec::new(),
            },
            Tag::Item => Frame::Item {
                checked: None,
                children: Vec::new(),
                loose: Vec::new(),
            },
            Tag::CodeBlock(kind) => Frame::Code {
                lang: match kind {
                    CodeBlockKind::Fenced(info) => {
                        Some(info.trim().to_owned()).filter(|lang| !lang.is_empty())
                    }
                    CodeBlockKind::Indented => None,
                },
                value: String::new(),
            },
            Tag::HtmlBlock => Frame::Html(String::new()),
            Tag::Table(_) => Frame::Table(Vec::new()),
            Tag::TableHead | Tag::TableRow => Frame::Row(Vec::new()),
            Tag::TableCell => Frame::Cell(Vec::new()),
            Tag::Strong => Frame::Span {
                span: Span::Strong,
                children: Vec::new(),
            },
            Tag::Emphasis => Frame::Span {
                span: Span::Emphasis,
                children: Vec::new(),
            },
            Tag::Strikethrough => Frame::Span {
                span: Span::Delete,
                children: Vec::new(),
            },
            Tag::Link { dest_url, .. } => Frame::Span {
                span: Span::Link(dest_url.into_string()),
                children: Vec::new(),
            },
            Tag::Image { dest_url, .. } => Frame::Image {
                url: dest_url.into_string(),
                alt: Vec::new(),
            },
            // Transparent: content lands in the enclosing frame
            Tag::BlockQuote(_) | Tag::Superscript | Tag::Subscript => return,
            Tag::FootnoteDefinition(_)
            | Tag::DefinitionList
            | Tag::DefinitionListTitle
            | Tag::DefinitionListDefinition
            | Tag::MetadataBlock(_) => Frame::Skip,
        };
        self.stack.push(frame);
    }

    fn end(&mut self, tag: TagEnd) {
        if matches!(
            tag,
            TagEnd::BlockQuote(_) | TagEnd::Superscript | TagEnd::Subscript
        ) {
            return;
        }
        let Some(frame) = self.stack.pop() else {
            return;
        };
        match frame {
            Frame::Paragraph(inlines) => self.push_block(MdNode::Paragraph { inlines }),
            Frame::Heading { depth, inlines } => self.push_block(MdNode::Heading { depth, inlines }),
            Frame::List { ordered, items } => self.push_block(MdNode::List { ordered, items }),
            Frame::Item {
                checked,
                mut children,
                loose,
            } => {
                if !loose.is_empty() {
                    children.push(MdNode::Paragraph { inlines: loose });
                }
                if let Some(Frame::List { items, .. }) = self.stack.last_mut() {
                    items.push(ListItem { checked, children });
                }
            }
            Frame::Code { lang, mut value } => {
                if value.ends_with('\n') {
                    value.pop();
                }
                self.push_block(MdNode::Code { lang, value });
            }
            Frame::Html(value) => self.push_block(MdNode::Html { value }),
            Frame::Table(rows) => self.push_block(MdNode::Table { rows }),
            Frame::Row(cells) => {
                if let Some(Frame::Table(rows)) = self.stack.last_mut() {
                    rows.push(cells);
                }
            }
            Frame::Cell(inlines) => {
                if let Some(Frame::Row(cells)) = self.stack.last_mut() {
                    cells.push(inlines);
                }
            }
            Frame::Span { span, children } => self.push_inline(match span {
                Span::Strong => Inline::Strong(children),
                Span::Emphasis => Inline::Emphasis(children),
                Span::Delete => Inline::Delete(children),
                Span::Link(url) => Inline::Link { url, children },
            }),
            Frame::Image { url, alt } => self.push_inline(Inline::Image {
                url,
                alt: plain_text(&alt),
            }),
            Frame::Skip => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(Frame::Code { value, .. }) = self.stack.last_mut() {
            value.push_str(text);
        } else {
            self.push_inline(Inline::Text(text.to_owned()));
        }
    }

    fn html(&mut self, html: &str) {
        if let Some(Frame::Html(value)) = self.stack.last_mut() {
            value.push_str(html);
        } else {
            self.push_block(MdNode::Html {
                value: html.to_owned(),
            });
        }
    }

    fn task_list_marker(&mut self, checked: bool) {
        let item = self.stack.iter_mut().rev().find_map(|frame| match frame {
            Frame::Item { checked, .. } => Some(checked),
            _ => None,
        });
        if let Some(slot) = item {
            *slot = Some(checked);
        }
    }

    /// Append an inline to the innermost inline-collecting frame.
    ///
    /// Adjacent text is merged, so `[a]{b}` split by the tokenizer at the
    /// brackets reaches the builder as one string.
    fn push_inline(&mut self, inline: Inline) {
        let target = match self.stack.last_mut() {
            Some(
                Frame::Paragraph(inlines)
                | Frame::Heading { inlines, .. }
                | Frame::Cell(inlines)
                | Frame::Span {
                    children: inlines, ..
                }
                | Frame::Image { alt: inlines, .. }
                | Frame::Item { loose: inlines, .. },
            ) => inlines,
            _ => return,
        };
        if let Inline::Text(text) = &inline
            && let Some(Inline::Text(last)) = target.last_mut()
        {
            last.push_str(text);
            return;
        }
        target.push(inline);
    }

    /// Append a block to the innermost block container (document or item).
    fn push_block(&mut self, node: MdNode) {
        match self.stack.last_mut() {
            None => self.nodes.push(node),
            Some(Frame::Item {
                children, loose, ..
            }) => {
                if !loose.is_empty() {
                    children.push(MdNode::Paragraph {
                        inlines: std::mem::take(loose),
                    });
                }
                children.push(node);
            }
            Some(_) => {}
        }
    }
}

fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
