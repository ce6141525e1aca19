//! Scope resolution over a `BindingTree`.
//!
//! A scope is the virtual root or any node whose kind opens one (`Element`,
//! `Component`). Each scope becomes one generated type, so names only have to
//! be unique inside a single scope.

use crate::model::BindingKind;
use crate::tree::{BindingTree, TreeIndex, ROOT};

pub fn is_scope(tree: &BindingTree, index: TreeIndex) -> bool {
    index == ROOT
        || tree
            .node(index)
            .kind()
            .map(BindingKind::opens_scope)
            .unwrap_or(false)
}

/// Nearest strict ancestor of `index` that is a scope. The root's scope is itself.
pub fn scope_of(tree: &BindingTree, index: TreeIndex) -> TreeIndex {
    tree.ancestors(index)
        .into_iter()
        .find(|&ancestor| is_scope(tree, ancestor))
        .unwrap_or(ROOT)
}

/// All scopes in pre-order, starting with the root.
pub fn scopes(tree: &BindingTree) -> Vec<TreeIndex> {
    tree.indices().filter(|&i| is_scope(tree, i)).collect()
}

/// Named members generated on `scope`'s type, in tree order.
///
/// `Member` descendants are followed until a nested scope is reached; the
/// nested scope itself is a member (it is a field of this type) but its
/// contents are not. `Leaf` nodes contribute nothing.
pub fn scope_members(tree: &BindingTree, scope: TreeIndex) -> Vec<TreeIndex> {
    let mut members = Vec::new();
    collect_members(tree, scope, &mut members);
    members
}

fn collect_members(tree: &BindingTree, parent: TreeIndex, members: &mut Vec<TreeIndex>) {
    for &child in &tree.node(parent).children {
        match tree.node(child).kind() {
            Some(BindingKind::Member) => {
                members.push(child);
                collect_members(tree, child, members);
            }
            Some(BindingKind::Element) | Some(BindingKind::Component) => members.push(child),
            Some(BindingKind::Leaf) | None => {}
        }
    }
}

/// First ancestor of `index` whose kind is `Component`.
pub fn enclosing_component(tree: &BindingTree, index: TreeIndex) -> Option<TreeIndex> {
    tree.ancestors(index)
        .into_iter()
        .find(|&a| tree.node(a).kind() == Some(BindingKind::Component))
}
