//! Binding Tree Builder.
//!
//! Walks the hierarchy once and keeps only what binding analysis needs: a
//! virtual root for the template plus every annotated node, each hung under its
//! nearest annotated ancestor. Nodes live in an arena; `parent` is an index into
//! it and never owns anything.

use crate::hierarchy::{HierarchyStore, NodeId};
use crate::model::{BindingAnnotation, BindingKind, ValidationFinding};
use tracing::debug;

pub type TreeIndex = usize;

/// Index of the virtual root in every `BindingTree`.
pub const ROOT: TreeIndex = 0;

#[derive(Debug, Clone)]
pub struct BindingTreeNode {
    pub node: NodeId,
    pub label: String,
    /// `None` only for the virtual root.
    pub annotation: Option<BindingAnnotation>,
    pub capabilities: Vec<String>,
    pub parent: Option<TreeIndex>,
    pub children: Vec<TreeIndex>,
    pub depth: usize,
    /// Hierarchy labels from the template root down to this node.
    pub path: Vec<String>,
    pub findings: Vec<ValidationFinding>,
}

impl BindingTreeNode {
    pub fn kind(&self) -> Option<BindingKind> {
        self.annotation.as_ref().map(|a| a.kind)
    }

    pub fn name(&self) -> Option<&str> {
        self.annotation.as_ref().and_then(|a| a.effective_name())
    }

    pub fn path_string(&self) -> String {
        self.path.join("/")
    }
}

/// An annotated hierarchy node hidden below a `Leaf` boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowedAnnotation {
    pub boundary: TreeIndex,
    pub node: NodeId,
    pub path: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct BindingTree {
    nodes: Vec<BindingTreeNode>,
    shadowed: Vec<ShadowedAnnotation>,
}

impl BindingTree {
    pub fn root(&self) -> &BindingTreeNode {
        &self.nodes[ROOT]
    }

    pub fn get(&self, index: TreeIndex) -> Option<&BindingTreeNode> {
        self.nodes.get(index)
    }

    pub fn node(&self, index: TreeIndex) -> &BindingTreeNode {
        &self.nodes[index]
    }

    pub fn node_mut(&mut self, index: TreeIndex) -> &mut BindingTreeNode {
        &mut self.nodes[index]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Indices in pre-order (parents before children, hierarchy order).
    pub fn indices(&self) -> impl Iterator<Item = TreeIndex> {
        0..self.nodes.len()
    }

    pub fn shadowed(&self) -> &[ShadowedAnnotation] {
        &self.shadowed
    }

    /// Annotated tree entry for a hierarchy node. The virtual root is never
    /// returned, even when the template root carries no annotation.
    pub fn find(&self, node: NodeId) -> Option<TreeIndex> {
        self.indices()
            .skip(1)
            .find(|&i| self.nodes[i].node == node)
    }

    /// Ancestors of `index`, nearest first, ending with the virtual root.
    pub fn ancestors(&self, index: TreeIndex) -> Vec<TreeIndex> {
        let mut chain = Vec::new();
        let mut current = self.nodes.get(index).and_then(|n| n.parent);
        while let Some(i) = current {
            chain.push(i);
            current = self.nodes[i].parent;
        }
        chain
    }

    pub fn template_name(&self) -> &str {
        &self.nodes[ROOT].label
    }

    /// Name shown to users for a scope: the template label for the root,
    /// the annotation name otherwise.
    pub fn display_name(&self, index: TreeIndex) -> &str {
        let node = &self.nodes[index];
        match node.name() {
            Some(name) if index != ROOT && !name.is_empty() => name,
            _ => &node.label,
        }
    }

    /// Build a copy of this tree with one node's kind replaced.
    pub fn with_kind(&self, index: TreeIndex, kind: BindingKind) -> BindingTree {
        let mut copy = self.clone();
        if let Some(annotation) = copy.nodes[index].annotation.as_mut() {
            annotation.kind = kind;
        }
        copy
    }

    pub fn clear_findings(&mut self) {
        for node in &mut self.nodes {
            node.findings.clear();
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BUILDER
// ═══════════════════════════════════════════════════════════════════════════════

pub fn build_tree<S: HierarchyStore + ?Sized>(store: &S, root: NodeId) -> BindingTree {
    let root_label = store.label(root);
    let mut tree = BindingTree {
        nodes: vec![BindingTreeNode {
            node: root,
            label: root_label.clone(),
            annotation: None,
            capabilities: store.capabilities(root),
            parent: None,
            children: Vec::new(),
            depth: 0,
            path: vec![root_label.clone()],
            findings: Vec::new(),
        }],
        shadowed: Vec::new(),
    };

    let mut path = vec![root_label];
    match store.annotation(root) {
        // An annotated template root still sits below the virtual root.
        Some(annotation) => {
            let index = attach(&mut tree, store, root, annotation, ROOT, &path);
            descend(&mut tree, store, root, index, &mut path);
        }
        None => descend(&mut tree, store, root, ROOT, &mut path),
    }

    debug!(
        template = %tree.template_name(),
        annotated = tree.len() - 1,
        shadowed = tree.shadowed.len(),
        "built binding tree"
    );
    tree
}

fn attach<S: HierarchyStore + ?Sized>(
    tree: &mut BindingTree,
    store: &S,
    node: NodeId,
    annotation: BindingAnnotation,
    parent: TreeIndex,
    path: &[String],
) -> TreeIndex {
    let index = tree.nodes.len();
    let depth = tree.nodes[parent].depth + 1;
    tree.nodes.push(BindingTreeNode {
        node,
        label: store.label(node),
        annotation: Some(annotation),
        capabilities: store.capabilities(node),
        parent: Some(parent),
        children: Vec::new(),
        depth,
        path: path.to_vec(),
        findings: Vec::new(),
    });
    tree.nodes[parent].children.push(index);
    index
}

/// Visit the hierarchy children of `node`, hanging annotated ones under
/// `tree_parent`. `path` holds the labels down to `node` inclusive.
fn descend<S: HierarchyStore + ?Sized>(
    tree: &mut BindingTree,
    store: &S,
    node: NodeId,
    tree_parent: TreeIndex,
    path: &mut Vec<String>,
) {
    for child in store.children(node) {
        path.push(store.label(child));
        match store.annotation(child) {
            Some(annotation) if annotation.kind == BindingKind::Leaf => {
                let index = attach(tree, store, child, annotation, tree_parent, path);
                collect_shadowed(tree, store, child, index, path);
            }
            Some(annotation) => {
                let index = attach(tree, store, child, annotation, tree_parent, path);
                descend(tree, store, child, index, path);
            }
            None => descend(tree, store, child, tree_parent, path),
        }
        path.pop();
    }
}

fn collect_shadowed<S: HierarchyStore + ?Sized>(
    tree: &mut BindingTree,
    store: &S,
    node: NodeId,
    boundary: TreeIndex,
    path: &mut Vec<String>,
) {
    for child in store.children(node) {
        path.push(store.label(child));
        if store.annotation(child).is_some() {
            tree.shadowed.push(ShadowedAnnotation {
                boundary,
                node: child,
                path: path.clone(),
            });
        }
        collect_shadowed(tree, store, child, boundary, path);
        path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::{MemoryHierarchy, TemplateNodeSpec};

    fn n(label: &str) -> TemplateNodeSpec {
        TemplateNodeSpec::new(label)
    }

    #[test]
    fn test_no_annotations_yields_bare_root() {
        let doc = n("Menu").child(n("Panel").child(n("Label")));
        let (store, root) = MemoryHierarchy::from_document(&doc);
        let tree = build_tree(&store, root);
        assert_eq!(tree.root().children.len(), 0);
        assert!(tree.is_empty());
        assert_eq!(tree.template_name(), "Menu");
    }

    #[test]
    fn test_skips_unannotated_intermediates() {
        let doc = n("Menu").child(
            n("Layout").child(
                n("Card")
                    .annotated(BindingKind::Component, "Card", "CardView")
                    .child(n("Frame").child(n("Title").annotated(BindingKind::Member, "Title", "Text"))),
            ),
        );
        let (store, root) = MemoryHierarchy::from_document(&doc);
        let tree = build_tree(&store, root);

        assert_eq!(tree.len(), 3);
        let card = tree.root().children[0];
        assert_eq!(tree.node(card).name(), Some("Card"));
        assert_eq!(tree.node(card).depth, 1);
        assert_eq!(tree.node(card).path_string(), "Menu/Layout/Card");

        let title = tree.node(card).children[0];
        assert_eq!(tree.node(title).parent, Some(card));
        assert_eq!(tree.node(title).depth, 2);
        assert_eq!(tree.node(title).path_string(), "Menu/Layout/Card/Frame/Title");
        assert_eq!(tree.ancestors(title), vec![card, ROOT]);
    }

    #[test]
    fn test_children_keep_hierarchy_order() {
        let doc = n("Menu")
            .child(n("B").annotated(BindingKind::Member, "B", "Text"))
            .child(n("Group").child(n("C").annotated(BindingKind::Member, "C", "Text")))
            .child(n("A").annotated(BindingKind::Member, "A", "Text"));
        let (store, root) = MemoryHierarchy::from_document(&doc);
        let tree = build_tree(&store, root);
        let names: Vec<_> = tree
            .root()
            .children
            .iter()
            .map(|&i| tree.node(i).name().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_leaf_stops_traversal() {
        let doc = n("Menu").child(
            n("List")
                .annotated(BindingKind::Leaf, "", "")
                .child(n("Row").annotated(BindingKind::Member, "Row", "Text")),
        );
        let (store, root) = MemoryHierarchy::from_document(&doc);
        let tree = build_tree(&store, root);
        assert_eq!(tree.len(), 2);
        let leaf = tree.root().children[0];
        assert!(tree.node(leaf).children.is_empty());
        assert_eq!(tree.shadowed().len(), 1);
        assert_eq!(tree.shadowed()[0].boundary, leaf);
        assert_eq!(tree.shadowed()[0].path.join("/"), "Menu/List/Row");
    }

    #[test]
    fn test_annotated_template_root() {
        let doc = n("Card")
            .annotated(BindingKind::Component, "Card", "CardView")
            .child(n("Title").annotated(BindingKind::Member, "Title", "Text"));
        let (store, root) = MemoryHierarchy::from_document(&doc);
        let tree = build_tree(&store, root);
        let card = tree.find(root).unwrap();
        assert_eq!(tree.node(card).parent, Some(ROOT));
        assert_eq!(tree.node(card).children.len(), 1);
        assert_eq!(tree.display_name(ROOT), "Card");
    }
}
