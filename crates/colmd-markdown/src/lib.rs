//! Markdown with multi-column layout directives, to and from block trees.
//!
//! Layout is carried by HTML comments that pass through any markdown
//! renderer untouched:
//!
//! - `<!-- layout:multi-column {...} -->` declares a container and its
//!   columns, optionally nested in a column of an earlier container.
//! - `<!-- content:column {...} -->` routes following blocks into a column.
//! - `<!-- end:content:column -->` ends the innermost region.
//! - `<!-- note:split -->` starts a new note (see
//!   [`MarkdownConverter::convert_split`]).
//!
//! [`MarkdownConverter`] builds a [`BlockNode`] tree from markdown and never
//! fails: problems are reported as [`Diagnostic`]s. [`MarkdownRenderer`]
//! walks a tree and writes markdown that parses back to the same structure.
//!
//! # Example
//!
//! ```
//! use colmd_markdown::{MarkdownConverter, MarkdownRenderer};
//!
//! let markdown = r#"<!-- layout:multi-column {"id":"c","columns":[{"id":"a","width":60},{"id":"b","width":40}]} -->
//!
//! <!-- content:column {"parent":"c","insert":"a"} -->
//!
//! Hello
//!
//! <!-- end:content:column -->"#;
//!
//! let conversion = MarkdownConverter::new().convert(markdown);
//! assert!(conversion.diagnostics.is_empty());
//!
//! let rendered = MarkdownRenderer::new().render(&conversion.root);
//! let again = MarkdownConverter::new().convert(&rendered);
//! assert!(conversion.root.same_structure(&again.root));
//! ```
//!
//! [`BlockNode`]: colmd_blocks::BlockNode

pub mod ast;
mod builder;
mod diagnostic;
pub mod directive;
mod fence;
mod inline;
mod layout;
mod render;
mod split;

pub use builder::{Conversion, MarkdownConverter, SplitConversion};
pub use diagnostic::{Diagnostic, DiagnosticKind, Severity};
pub use directive::{ColumnRef, ColumnSpec, ContainerDecl, Directive, NoteConfig};
pub use layout::RegionTracking;
pub use render::MarkdownRenderer;
pub use split::{note_background, palette_background};

#[cfg(test)]
mod tests {
    use colmd_blocks::{
        BlockKind, BlockNode, IdStrategy, ListKind, NoteProps, ParagraphStyle, Text,
        TextAttributes, TextRun,
    };
    use pretty_assertions::assert_eq;

    use super::*;

    fn converter() -> MarkdownConverter {
        MarkdownConverter::new().with_id_strategy(IdStrategy::Sequential)
    }

    fn node(kind: BlockKind, children: Vec<BlockNode>) -> BlockNode {
        let mut node = BlockNode::new("id", kind);
        for child in children {
            node.push_child(child);
        }
        node
    }

    fn para(text: Text) -> BlockNode {
        BlockNode::new(
            "p",
            BlockKind::Paragraph {
                style: ParagraphStyle::Text,
            },
        )
        .with_text(text)
    }

    fn sample_tree() -> BlockNode {
        let rich: Text = [
            TextRun::plain("Mixed "),
            TextRun::new("bold", TextAttributes::bold()),
            TextRun::plain(", "),
            TextRun::new(
                "red",
                TextAttributes {
                    color: Some("red".to_owned()),
                    ..TextAttributes::default()
                },
            ),
            TextRun::plain(" and "),
            TextRun::new("link", TextAttributes::link("https://example.com")),
        ]
        .into_iter()
        .collect();

        let inner = node(
            BlockKind::MultiColumnContainer,
            vec![
                node(BlockKind::Column { width: 30.0 }, vec![para(Text::plain("Inner left"))]),
                node(BlockKind::Column { width: 70.0 }, vec![]),
            ],
        );
        let left = node(
            BlockKind::Column { width: 62.5 },
            vec![
                BlockNode::new(
                    "h",
                    BlockKind::Paragraph {
                        style: ParagraphStyle::Heading(2),
                    },
                )
                .with_text(Text::plain("Left")),
                para(rich),
                inner,
                BlockNode::new(
                    "l",
                    BlockKind::List {
                        kind: ListKind::Todo,
                        checked: true,
                    },
                )
                .with_text(Text::plain("done")),
            ],
        );
        let right = node(
            BlockKind::Column { width: 37.5 },
            vec![
                BlockNode::new(
                    "code",
                    BlockKind::Code {
                        language: "rust".to_owned(),
                    },
                )
                .with_text(Text::plain("fn main() {\n    println!(\"hi\");\n}")),
                BlockNode::new(
                    "img",
                    BlockKind::Image {
                        source: "cat.png".to_owned(),
                        caption: "Cat".to_owned(),
                    },
                ),
            ],
        );

        node(
            BlockKind::Note(NoteProps::default()),
            vec![
                para(Text::plain("Intro")),
                node(BlockKind::MultiColumnContainer, vec![left, right]),
                BlockNode::new(
                    "list",
                    BlockKind::List {
                        kind: ListKind::Numbered,
                        checked: false,
                    },
                )
                .with_text(Text::plain("after")),
                BlockNode::new(
                    "table",
                    BlockKind::Table {
                        rows: vec![
                            vec![Text::plain("A"), Text::plain("B")],
                            vec![Text::plain("1"), Text::plain("2")],
                        ],
                    },
                ),
            ],
        )
    }

    #[test]
    fn test_render_then_parse_preserves_structure() {
        let tree = sample_tree();
        let markdown = MarkdownRenderer::new().render(&tree);
        let conversion = converter().convert(&markdown);

        assert!(conversion.diagnostics.is_empty(), "{:?}", conversion.diagnostics);
        assert!(
            tree.same_structure(&conversion.root),
            "structure changed:\n{markdown}\n{:#?}",
            conversion.root
        );
        // Ids are regenerated on every pass
        assert_ne!(tree.children[1].id, conversion.root.children[1].id);
    }

    #[test]
    fn test_render_is_stable_after_one_round_trip() {
        let renderer = MarkdownRenderer::new();
        let first = renderer.render(&sample_tree());
        let second = renderer.render(&converter().convert(&first).root);
        assert_eq!(first, second);
    }

    #[test]
    fn test_split_round_trip_keeps_note_settings() {
        let markdown = "One\n\n<!-- note:split {\"title\":\"Two\",\"backgroundColor\":\"pink\"} -->\n\nTwo\n";
        let split = converter().convert_split(markdown);
        let rendered = MarkdownRenderer::new()
            .with_note_settings()
            .render_notes(&split.notes);
        let again = converter().convert_split(&rendered);

        assert_eq!(split.notes.len(), again.notes.len());
        for (a, b) in split.notes.iter().zip(&again.notes) {
            assert!(a.same_structure(b));
        }
    }

    #[test]
    fn test_text_that_looks_like_markup_round_trips() {
        let tree = node(
            BlockKind::Note(NoteProps::default()),
            vec![
                para(Text::plain("    indented")),
                para(Text::plain("AT&amp;T &copy; & co")),
                para(Text::plain("x\n===")),
                para(Text::plain("a\n---")),
                para(Text::plain("= not a heading")),
                para(Text::plain("1. not a list")),
            ],
        );
        let markdown = MarkdownRenderer::new().render(&tree);
        let conversion = converter().convert(&markdown);

        assert!(
            tree.same_structure(&conversion.root),
            "structure changed:\n{markdown}\n{:#?}",
            conversion.root
        );
    }

    #[test]
    fn test_ragged_table_comes_back_rectangular() {
        let table = BlockNode::new(
            "t",
            BlockKind::Table {
                rows: vec![
                    vec![Text::plain("A"), Text::plain("B")],
                    vec![Text::plain("1")],
                ],
            },
        );
        let tree = node(BlockKind::Note(NoteProps::default()), vec![table]);
        let markdown = MarkdownRenderer::new().render(&tree);
        let conversion = converter().convert(&markdown);

        let BlockKind::Table { rows } = &conversion.root.children[0].kind else {
            panic!("expected a table, got {:?}", conversion.root.children[0].kind);
        };
        assert_eq!(
            rows,
            &vec![
                vec![Text::plain("A"), Text::plain("B")],
                vec![Text::plain("1"), Text::new()],
            ]
        );
    }

    #[test]
    fn test_converter_and_renderer_are_send() {
        fn assert_send<T: Send>() {}
        assert_send::<MarkdownConverter>();
        assert_send::<MarkdownRenderer>();
    }
}
