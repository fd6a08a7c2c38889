//! Layout directives embedded in markdown as HTML comments.
//!
//! [`grammar`] defines the token syntax and payload types shared by the
//! parser and the renderer. [`interpret`] turns raw HTML nodes into
//! [`Directive`]s, reporting malformed payloads as diagnostics.

pub mod grammar;
pub(crate) mod interpret;

pub use grammar::{
    ColumnRef, ColumnSpec, ContainerDecl, Directive, NoteConfig, REGION_CLOSE_TOKEN, column_key,
    format_container, format_note_split, format_region_open,
};
