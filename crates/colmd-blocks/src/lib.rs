//! Block tree document model.
//!
//! A document is a tree of [`BlockNode`]s rooted at a note. Content blocks
//! (paragraphs, lists, code, images, tables) live directly under the note or
//! inside the [`BlockKind::Column`]s of a [`BlockKind::MultiColumnContainer`],
//! and containers may themselves be nested inside columns.
//!
//! The [`snapshot`] module encodes trees as the JSON snapshots consumed by
//! the document store.
//!
//! # Example
//!
//! ```
//! use colmd_blocks::{BlockKind, BlockNode, NoteProps, ParagraphStyle, Text};
//!
//! let mut note = BlockNode::new("root", BlockKind::Note(NoteProps::default()));
//! note.push_child(
//!     BlockNode::new("p", BlockKind::Paragraph { style: ParagraphStyle::heading(9) })
//!         .with_text(Text::plain("Title")),
//! );
//!
//! let json = colmd_blocks::snapshot::to_snapshot(&note);
//! assert_eq!(json["children"][0]["props"]["type"], "h6");
//! ```

mod block;
mod ids;
pub mod snapshot;
mod text;

pub use block::{BlockKind, BlockNode, Descendants, ListKind, NoteProps, ParagraphStyle};
pub use ids::{IdSource, IdStrategy, SequentialIds, UuidIds};
pub use snapshot::{Decoded, SnapshotError};
pub use text::{Text, TextAttributes, TextRun};
