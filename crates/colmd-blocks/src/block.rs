//! Block tree nodes.

use crate::Text;

/// Paragraph style: plain text or a heading level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParagraphStyle {
    #[default]
    Text,
    /// Heading level, always within `1..=6`.
    Heading(u8),
}

impl ParagraphStyle {
    /// Heading style for a markdown heading depth, clamped to `h1..=h6`.
    #[must_use]
    pub fn heading(depth: u8) -> Self {
        Self::Heading(depth.clamp(1, 6))
    }

    /// Style name as stored in snapshots (`text`, `h1` .. `h6`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Heading(1) => "h1",
            Self::Heading(2) => "h2",
            Self::Heading(3) => "h3",
            Self::Heading(4) => "h4",
            Self::Heading(5) => "h5",
            Self::Heading(_) => "h6",
        }
    }

    /// Parse a style name. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "text" => Some(Self::Text),
            "h1" => Some(Self::Heading(1)),
            "h2" => Some(Self::Heading(2)),
            "h3" => Some(Self::Heading(3)),
            "h4" => Some(Self::Heading(4)),
            "h5" => Some(Self::Heading(5)),
            "h6" => Some(Self::Heading(6)),
            _ => None,
        }
    }
}

/// List item flavour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListKind {
    #[default]
    Bulleted,
    Numbered,
    Todo,
}

impl ListKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bulleted => "bulleted",
            Self::Numbered => "numbered",
            Self::Todo => "todo",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "bulleted" => Some(Self::Bulleted),
            "numbered" => Some(Self::Numbered),
            "todo" => Some(Self::Todo),
            _ => None,
        }
    }
}

/// Presentation properties of a note (the document root).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteProps {
    /// Background colour, usually a `--affine-note-background-*` variable.
    pub background: String,
    /// Position and size on the canvas, `[x,y,w,h]`.
    pub xywh: String,
    /// Fractional ordering key among sibling notes.
    pub index: String,
    pub hidden: bool,
    pub display_mode: String,
    /// Optional note title.
    pub title: Option<String>,
}

impl Default for NoteProps {
    fn default() -> Self {
        Self {
            background: "--affine-note-background-blue".to_owned(),
            xywh: "[0,0,800,95]".to_owned(),
            index: "a0".to_owned(),
            hidden: false,
            display_mode: "both".to_owned(),
            title: None,
        }
    }
}

/// Closed set of block kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum BlockKind {
    /// Document root owning top-level content.
    Note(NoteProps),
    Paragraph { style: ParagraphStyle },
    List { kind: ListKind, checked: bool },
    Code { language: String },
    /// Horizontal layout region; children are [`BlockKind::Column`]s.
    MultiColumnContainer,
    /// One column of a container with its relative width.
    Column { width: f64 },
    Image { source: String, caption: String },
    /// Table cells, header row first.
    Table { rows: Vec<Vec<Text>> },
    /// Block of a flavour without a dedicated kind. Only its text is kept.
    Other { flavour: String },
}

impl BlockKind {
    /// Snapshot flavour name.
    pub fn flavour(&self) -> &str {
        match self {
            Self::Note(_) => "affine:note",
            Self::Paragraph { .. } => "affine:paragraph",
            Self::List { .. } => "affine:list",
            Self::Code { .. } => "affine:code",
            Self::MultiColumnContainer => "affine:multi-column-container",
            Self::Column { .. } => "affine:column",
            Self::Image { .. } => "affine:image",
            Self::Table { .. } => "affine:table",
            Self::Other { flavour } => flavour,
        }
    }

    /// Check whether this kind can hold content blocks.
    pub fn holds_content(&self) -> bool {
        matches!(self, Self::Note(_) | Self::Column { .. })
    }
}

/// A node of the block tree.
///
/// Children are exclusively owned. Only containers hold columns and only
/// notes and columns hold content; [`BlockNode::accepts`] encodes that rule.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockNode {
    pub id: String,
    pub kind: BlockKind,
    pub text: Option<Text>,
    pub children: Vec<BlockNode>,
}

impl BlockNode {
    /// Create a childless node without text.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            kind,
            text: None,
            children: Vec::new(),
        }
    }

    /// Attach a text payload.
    #[must_use]
    pub fn with_text(mut self, text: Text) -> Self {
        self.text = Some(text);
        self
    }

    /// Check whether `child` may be placed under this node.
    pub fn accepts(&self, child: &BlockKind) -> bool {
        match (&self.kind, child) {
            (BlockKind::MultiColumnContainer, BlockKind::Column { .. }) => true,
            (BlockKind::MultiColumnContainer, _)
            | (_, BlockKind::Column { .. } | BlockKind::Note(_)) => false,
            (kind, _) => kind.holds_content(),
        }
    }

    /// Append a child, returning its index.
    pub fn push_child(&mut self, child: Self) -> usize {
        debug_assert!(
            self.accepts(&child.kind),
            "{} cannot hold {}",
            self.kind.flavour(),
            child.kind.flavour()
        );
        self.children.push(child);
        self.children.len() - 1
    }

    /// Resolve a descendant by child indices.
    pub fn descendant(&self, path: &[usize]) -> Option<&Self> {
        path.iter()
            .try_fold(self, |node, &idx| node.children.get(idx))
    }

    /// Resolve a descendant by child indices, mutably.
    pub fn descendant_mut(&mut self, path: &[usize]) -> Option<&mut Self> {
        path.iter()
            .try_fold(self, |node, &idx| node.children.get_mut(idx))
    }

    /// Plain text of this node's payload, or an empty string.
    #[must_use]
    pub fn plain_text(&self) -> String {
        self.text.as_ref().map(Text::to_plain).unwrap_or_default()
    }

    /// Depth-first pre-order iterator over this node and its descendants.
    pub fn iter(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Compare two trees ignoring block ids.
    ///
    /// Ids are regenerated on every conversion, so this is the equality a
    /// parse/render round trip preserves.
    pub fn same_structure(&self, other: &Self) -> bool {
        let text = |node: &Self| node.text.clone().filter(|t| !t.is_empty());
        self.kind == other.kind
            && text(self) == text(other)
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.same_structure(b))
    }
}

/// Iterator returned by [`BlockNode::iter`].
pub struct Descendants<'a> {
    stack: Vec<&'a BlockNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a BlockNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
