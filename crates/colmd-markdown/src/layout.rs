//! Layout state of one conversion: declared containers and open regions.
//!
//! Blocks are exclusively owned by their parents, so the registry does not
//! hold references into the tree. It records child-index paths from the
//! root instead. Nodes are only ever appended, which keeps recorded paths
//! valid for the whole conversion.

use std::collections::HashMap;

use colmd_blocks::{BlockKind, BlockNode, IdSource};
use serde::Deserialize;

use crate::diagnostic::{DiagnosticKind, Diagnostics};
use crate::directive::{ColumnRef, ContainerDecl, Directive, column_key};

/// How region-open and region-close directives nest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegionTracking {
    /// Regions nest; a close restores the enclosing region.
    #[default]
    Stack,
    /// A single active region; a close always returns to the root.
    SingleSlot,
}

impl RegionTracking {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stack => "stack",
            Self::SingleSlot => "single-slot",
        }
    }
}

#[derive(Debug)]
struct ContainerEntry {
    path: Vec<usize>,
    columns: Vec<String>,
}

/// Keyed lookup of declared containers and their columns.
///
/// Containers are keyed by id, columns by `containerId.columnId`.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    containers: HashMap<String, ContainerEntry>,
    columns: HashMap<String, Vec<usize>>,
}

impl Registry {
    /// Register a container and its columns.
    ///
    /// An earlier container with the same id is replaced together with its
    /// column keys. Returns `true` when that happened.
    pub fn insert(
        &mut self,
        id: &str,
        path: Vec<usize>,
        columns: Vec<(String, Vec<usize>)>,
    ) -> bool {
        let replaced = self.containers.remove(id);
        if let Some(old) = &replaced {
            for column in &old.columns {
                self.columns.remove(&column_key(id, column));
            }
        }

        let mut column_ids = Vec::with_capacity(columns.len());
        for (column, column_path) in columns {
            self.columns.insert(column_key(id, &column), column_path);
            column_ids.push(column);
        }
        self.containers.insert(
            id.to_owned(),
            ContainerEntry {
                path,
                columns: column_ids,
            },
        );
        replaced.is_some()
    }

    /// Path of a container node.
    #[cfg(test)]
    pub fn container(&self, id: &str) -> Option<&[usize]> {
        self.containers.get(id).map(|entry| entry.path.as_slice())
    }

    /// Path of a column node by compound key.
    pub fn column(&self, key: &str) -> Option<&[usize]> {
        self.columns.get(key).map(Vec::as_slice)
    }

    /// Number of registered containers.
    pub fn len(&self) -> usize {
        self.containers.len()
    }
}

/// Per-conversion layout state.
#[derive(Debug, Default)]
pub(crate) struct LayoutState {
    tracking: RegionTracking,
    registry: Registry,
    /// Open regions, innermost last. `None` marks an open whose column did
    /// not resolve: blocks go to the root until it is closed.
    regions: Vec<Option<String>>,
}

impl LayoutState {
    pub(crate) fn new(tracking: RegionTracking) -> Self {
        Self {
            tracking,
            ..Self::default()
        }
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Apply a layout directive. Note-split markers are ignored.
    pub(crate) fn apply(
        &mut self,
        directive: Directive,
        raw: &str,
        root: &mut BlockNode,
        ids: &mut dyn IdSource,
        diagnostics: &mut Diagnostics,
    ) {
        match directive {
            Directive::ContainerDecl(decl) => {
                self.declare_container(&decl, raw, root, ids, diagnostics);
            }
            Directive::RegionOpen(column) => self.open_region(&column, raw, root, diagnostics),
            Directive::RegionClose => self.close_region(raw, diagnostics),
            Directive::NoteSplit(_) => {}
        }
    }

    /// Key of the column blocks are currently routed to.
    pub(crate) fn active_region(&self) -> Option<&str> {
        self.regions.last().and_then(Option::as_deref)
    }

    /// Append a content block to the active region, or to the root.
    pub(crate) fn insert_block(
        &self,
        root: &mut BlockNode,
        block: BlockNode,
        diagnostics: &mut Diagnostics,
    ) {
        let path = match self.active_region() {
            Some(key) => {
                if let Some(path) = self.resolve_column(root, key) {
                    path.to_vec()
                } else {
                    diagnostics.push(
                        DiagnosticKind::StaleRegion,
                        "Active column no longer exists, block placed at the root",
                        key,
                    );
                    Vec::new()
                }
            }
            None => Vec::new(),
        };
        append_at(root, path, block);
    }

    /// Report regions still open at the end of input.
    pub(crate) fn finish(self, diagnostics: &mut Diagnostics) {
        if !self.regions.is_empty() {
            let keys: Vec<_> = self.regions.iter().flatten().map(String::as_str).collect();
            diagnostics.push(
                DiagnosticKind::UnbalancedRegion,
                format!("{} region(s) left open at end of input", self.regions.len()),
                keys.join(", "),
            );
        }
    }

    fn declare_container(
        &mut self,
        decl: &ContainerDecl,
        raw: &str,
        root: &mut BlockNode,
        ids: &mut dyn IdSource,
        diagnostics: &mut Diagnostics,
    ) {
        let mut container = BlockNode::new(ids.next_id(), BlockKind::MultiColumnContainer);
        for column in &decl.columns {
            container.push_child(BlockNode::new(
                ids.next_id(),
                BlockKind::Column {
                    width: column.width,
                },
            ));
        }

        let parent_path = match decl.parent_ref() {
            Some(parent) => {
                let key = parent.key();
                if let Some(path) = self.resolve_column(root, &key) {
                    path.to_vec()
                } else {
                    diagnostics.push(
                        DiagnosticKind::UnresolvedReference,
                        format!(
                            "Parent column of container '{}' is not declared, placed at the root",
                            decl.id
                        ),
                        key,
                    );
                    Vec::new()
                }
            }
            None => Vec::new(),
        };

        let path = append_at(root, parent_path, container);
        let columns = decl
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let mut column_path = path.clone();
                column_path.push(idx);
                (column.id.clone(), column_path)
            })
            .collect();

        if self.registry.insert(&decl.id, path, columns) {
            diagnostics.push(
                DiagnosticKind::DuplicateContainer,
                format!("Container '{}' declared more than once", decl.id),
                raw,
            );
        }
        tracing::debug!(id = %decl.id, columns = decl.columns.len(), "Declared container");
    }

    fn open_region(
        &mut self,
        column: &ColumnRef,
        raw: &str,
        root: &BlockNode,
        diagnostics: &mut Diagnostics,
    ) {
        let key = column.key();
        let resolved = self.resolve_column(root, &key).is_some();
        if !resolved {
            diagnostics.push(
                DiagnosticKind::UnresolvedReference,
                format!("Column '{key}' is not declared"),
                raw,
            );
        }

        let region = resolved.then(|| key.clone());
        match self.tracking {
            RegionTracking::Stack => self.regions.push(region),
            RegionTracking::SingleSlot => self.regions = vec![region],
        }
        if resolved {
            tracing::debug!(column = %key, depth = self.regions.len(), "Opened region");
        }
    }

    fn close_region(&mut self, raw: &str, diagnostics: &mut Diagnostics) {
        let closed = match self.tracking {
            RegionTracking::Stack => self.regions.pop(),
            RegionTracking::SingleSlot => self.regions.drain(..).next_back(),
        };
        match closed {
            Some(region) => {
                tracing::debug!(column = region.as_deref().unwrap_or("<unresolved>"), "Closed region");
            }
            None => diagnostics.push(
                DiagnosticKind::UnbalancedRegion,
                "Region close without an open region",
                raw,
            ),
        }
    }

    /// Path of a registered column that still exists in the tree.
    fn resolve_column(&self, root: &BlockNode, key: &str) -> Option<&[usize]> {
        self.registry.column(key).filter(|path| {
            root.descendant(path)
                .is_some_and(|node| matches!(node.kind, BlockKind::Column { .. }))
        })
    }
}

/// Append `node` under the node at `path`, or under the root when that node
/// does not exist or cannot hold it. Returns the path of the new node.
fn append_at(root: &mut BlockNode, mut path: Vec<usize>, node: BlockNode) -> Vec<usize> {
    let index = match root.descendant_mut(&path) {
        Some(target) if target.accepts(&node.kind) => target.push_child(node),
        _ => {
            path.clear();
            root.push_child(node)
        }
    };
    path.push(index);
    path
}

#[cfg(test)]
mod tests {
    use colmd_blocks::{NoteProps, ParagraphStyle, SequentialIds, Text};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::directive::ColumnSpec;

    struct Harness {
        state: LayoutState,
        root: BlockNode,
        ids: SequentialIds,
        diagnostics: Diagnostics,
    }

    impl Harness {
        fn new(tracking: RegionTracking) -> Self {
            Self {
                state: LayoutState::new(tracking),
                root: BlockNode::new("root", BlockKind::Note(NoteProps::default())),
                ids: SequentialIds::new("b"),
                diagnostics: Diagnostics::default(),
            }
        }

        fn apply(&mut self, directive: Directive) {
            self.state.apply(
                directive,
                "",
                &mut self.root,
                &mut self.ids,
                &mut self.diagnostics,
            );
        }

        fn declare(&mut self, id: &str, columns: &[&str], parent: Option<(&str, &str)>) {
            self.apply(Directive::ContainerDecl(ContainerDecl {
                id: id.to_owned(),
                columns: columns
                    .iter()
                    .map(|c| ColumnSpec {
                        id: (*c).to_owned(),
                        width: 50.0,
                    })
                    .collect(),
                parent: parent.map(|(p, _)| p.to_owned()),
                insert: parent.map(|(_, i)| i.to_owned()),
            }));
        }

        fn open(&mut self, parent: &str, insert: &str) {
            self.apply(Directive::RegionOpen(ColumnRef::new(parent, insert)));
        }

        fn close(&mut self) {
            self.apply(Directive::RegionClose);
        }

        fn insert(&mut self, text: &str) {
            let block = BlockNode::new(
                text,
                BlockKind::Paragraph {
                    style: ParagraphStyle::Text,
                },
            )
            .with_text(Text::plain(text));
            self.state
                .insert_block(&mut self.root, block, &mut self.diagnostics);
        }

        fn path_of(&self, id: &str) -> Option<Vec<usize>> {
            fn walk(node: &BlockNode, id: &str, path: &mut Vec<usize>) -> bool {
                if node.id == id {
                    return true;
                }
                for (idx, child) in node.children.iter().enumerate() {
                    path.push(idx);
                    if walk(child, id, path) {
                        return true;
                    }
                    path.pop();
                }
                false
            }
            let mut path = Vec::new();
            walk(&self.root, id, &mut path).then_some(path)
        }
    }

    #[test]
    fn test_container_at_root_with_columns() {
        let mut h = Harness::new(RegionTracking::Stack);
        h.declare("c", &["a", "b"], None);

        assert_eq!(h.root.children.len(), 1);
        let container = &h.root.children[0];
        assert_eq!(container.kind, BlockKind::MultiColumnContainer);
        assert_eq!(container.children.len(), 2);
        assert_eq!(h.state.registry().container("c"), Some(&[0][..]));
        assert_eq!(h.state.registry().column("c.b"), Some(&[0, 1][..]));
        assert!(h.diagnostics.kinds().is_empty());
    }

    #[test]
    fn test_blocks_route_to_open_region() {
        let mut h = Harness::new(RegionTracking::Stack);
        h.declare("c", &["a", "b"], None);
        h.insert("before");
        h.open("c", "b");
        h.insert("inside");
        h.close();
        h.insert("after");

        assert_eq!(h.path_of("before"), Some(vec![1]));
        assert_eq!(h.path_of("inside"), Some(vec![0, 1, 0]));
        assert_eq!(h.path_of("after"), Some(vec![2]));
        assert!(h.diagnostics.kinds().is_empty());
    }

    #[test]
    fn test_nested_container_under_parent_column() {
        let mut h = Harness::new(RegionTracking::Stack);
        h.declare("outer", &["a", "b"], None);
        h.declare("inner", &["x"], Some(("outer", "b")));
        h.open("inner", "x");
        h.insert("deep");

        assert_eq!(h.state.registry().container("inner"), Some(&[0, 1, 0][..]));
        assert_eq!(h.path_of("deep"), Some(vec![0, 1, 0, 0, 0]));
    }

    #[test]
    fn test_unresolved_parent_goes_to_root() {
        let mut h = Harness::new(RegionTracking::Stack);
        h.declare("c", &["a"], Some(("missing", "a")));

        assert_eq!(h.root.children.len(), 1);
        assert_eq!(h.root.children[0].kind, BlockKind::MultiColumnContainer);
        assert_eq!(h.diagnostics.kinds(), vec![DiagnosticKind::UnresolvedReference]);
    }

    #[test]
    fn test_stack_restores_outer_region() {
        let mut h = Harness::new(RegionTracking::Stack);
        h.declare("outer", &["a"], None);
        h.declare("inner", &["x"], Some(("outer", "a")));
        h.open("outer", "a");
        h.open("inner", "x");
        h.insert("deep");
        h.close();
        h.insert("outer-again");
        h.close();
        h.insert("root-again");

        assert_eq!(h.path_of("deep"), Some(vec![0, 0, 0, 0, 0]));
        assert_eq!(h.path_of("outer-again"), Some(vec![0, 0, 1]));
        assert_eq!(h.path_of("root-again"), Some(vec![1]));
    }

    #[test]
    fn test_single_slot_close_returns_to_root() {
        let mut h = Harness::new(RegionTracking::SingleSlot);
        h.declare("outer", &["a"], None);
        h.declare("inner", &["x"], Some(("outer", "a")));
        h.open("outer", "a");
        h.open("inner", "x");
        h.insert("deep");
        h.close();
        h.insert("root-again");

        assert_eq!(h.path_of("deep"), Some(vec![0, 0, 0, 0, 0]));
        assert_eq!(h.path_of("root-again"), Some(vec![1]));
    }

    #[test]
    fn test_unresolved_open_routes_to_root() {
        let mut h = Harness::new(RegionTracking::Stack);
        h.declare("c", &["a"], None);
        h.open("c", "a");
        h.open("c", "nope");
        h.insert("at-root");
        h.close();
        h.insert("back-in-a");
        h.close();

        assert_eq!(h.path_of("at-root"), Some(vec![1]));
        assert_eq!(h.path_of("back-in-a"), Some(vec![0, 0, 0]));
        assert_eq!(h.diagnostics.kinds(), vec![DiagnosticKind::UnresolvedReference]);
    }

    #[test]
    fn test_single_slot_unresolved_open_clears_slot() {
        let mut h = Harness::new(RegionTracking::SingleSlot);
        h.declare("c", &["a"], None);
        h.open("c", "a");
        h.insert("in-a");
        h.open("c", "nope");
        h.insert("at-root");
        h.close();
        h.insert("after");

        assert_eq!(h.path_of("in-a"), Some(vec![0, 0, 0]));
        assert_eq!(h.path_of("at-root"), Some(vec![1]));
        assert_eq!(h.path_of("after"), Some(vec![2]));
        assert_eq!(h.diagnostics.kinds(), vec![DiagnosticKind::UnresolvedReference]);
    }

    #[test]
    fn test_close_without_open() {
        let mut h = Harness::new(RegionTracking::Stack);
        h.close();
        let mut single = Harness::new(RegionTracking::SingleSlot);
        single.close();

        assert_eq!(h.diagnostics.kinds(), vec![DiagnosticKind::UnbalancedRegion]);
        assert_eq!(single.diagnostics.kinds(), vec![DiagnosticKind::UnbalancedRegion]);
    }

    #[test]
    fn test_region_left_open() {
        let mut h = Harness::new(RegionTracking::Stack);
        h.declare("c", &["a"], None);
        h.open("c", "a");
        let Harness {
            state,
            mut diagnostics,
            ..
        } = h;
        state.finish(&mut diagnostics);

        let items = diagnostics.into_vec();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, DiagnosticKind::UnbalancedRegion);
        assert_eq!(items[0].context, "c.a");
    }

    #[test]
    fn test_duplicate_container_last_writer_wins() {
        let mut h = Harness::new(RegionTracking::Stack);
        h.declare("c", &["a", "b"], None);
        h.declare("c", &["a"], None);

        assert_eq!(h.root.children.len(), 2);
        assert_eq!(h.state.registry().container("c"), Some(&[1][..]));
        assert_eq!(h.state.registry().column("c.a"), Some(&[1, 0][..]));
        assert_eq!(h.state.registry().column("c.b"), None);
        assert_eq!(h.diagnostics.kinds(), vec![DiagnosticKind::DuplicateContainer]);
    }

    #[test]
    fn test_redeclared_container_makes_region_stale() {
        let mut h = Harness::new(RegionTracking::Stack);
        h.declare("c", &["a", "b"], None);
        h.open("c", "b");
        h.declare("c", &["a"], None);
        h.insert("orphan");

        assert_eq!(h.path_of("orphan"), Some(vec![2]));
        assert_eq!(
            h.diagnostics.kinds(),
            vec![DiagnosticKind::DuplicateContainer, DiagnosticKind::StaleRegion]
        );
    }

    #[test]
    fn test_region_tracking_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: RegionTracking,
        }
        let parsed: Wrapper = serde_json::from_str(r#"{"mode":"single-slot"}"#).unwrap();
        assert_eq!(parsed.mode, RegionTracking::SingleSlot);
        assert_eq!(parsed.mode.as_str(), "single-slot");
    }
}
