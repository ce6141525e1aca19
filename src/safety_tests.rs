//! Safety Gate Tests for Binding Invariants
//!
//! These tests sweep generated hierarchies and check properties that must hold
//! for every input, not just hand-picked fixtures:
//! - Scope membership never crosses a scope or Leaf boundary
//! - Every nested Element under a Component is flagged exactly once
//! - Name suggestions are legal and idempotent
//! - Codegen is gated on Error findings

#[cfg(test)]
mod tests {
    use crate::codegen::codegen_intent;
    use crate::config::BindingConfig;
    use crate::convert::ConversionPlanner;
    use crate::error::BindingError;
    use crate::hierarchy::{MemoryHierarchy, TemplateNodeSpec};
    use crate::model::{BindingKind, ALL_KINDS, RULE_ELEMENT_UNDER_COMPONENT};
    use crate::names::{is_reserved_word, is_valid_identifier, suggest_name};
    use crate::scope::{scope_members, scope_of, scopes};
    use crate::tree::{build_tree, BindingTree};
    use crate::validate::Validator;

    /// Deterministic nested document: `depth` levels, `width` children each, kinds
    /// cycling through every `BindingKind` plus unannotated nodes.
    fn generated(depth: usize, width: usize) -> TemplateNodeSpec {
        fn fill(node: TemplateNodeSpec, depth: usize, width: usize, counter: &mut usize) -> TemplateNodeSpec {
            if depth == 0 {
                return node;
            }
            let mut node = node;
            for _ in 0..width {
                *counter += 1;
                let label = format!("Node {}", counter);
                let name = format!("Node{}", counter);
                let child = match *counter % 5 {
                    0 => TemplateNodeSpec::new(&label),
                    1 => TemplateNodeSpec::new(&label).annotated(BindingKind::Member, &name, "Text"),
                    2 => TemplateNodeSpec::new(&label).annotated(BindingKind::Element, &name, "View"),
                    3 => TemplateNodeSpec::new(&label).annotated(BindingKind::Component, &name, "View"),
                    _ => TemplateNodeSpec::new(&label).annotated(BindingKind::Leaf, "", ""),
                };
                node = node.child(fill(child, depth - 1, width, counter));
            }
            node
        }
        let mut counter = 0;
        fill(TemplateNodeSpec::new("Generated"), depth, width, &mut counter)
    }

    fn tree_of(doc: &TemplateNodeSpec) -> BindingTree {
        let (store, root) = MemoryHierarchy::from_document(doc);
        build_tree(&store, root)
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // SCOPE MEMBERSHIP
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_every_named_node_belongs_to_exactly_one_scope() {
        for (depth, width) in [(1, 4), (3, 3), (4, 2), (5, 2)] {
            let tree = tree_of(&generated(depth, width));
            let mut owners = vec![0usize; tree.len()];
            for scope in scopes(&tree) {
                for member in scope_members(&tree, scope) {
                    assert_eq!(scope_of(&tree, member), scope);
                    owners[member] += 1;
                }
            }
            for index in tree.indices().skip(1) {
                let expected = match tree.node(index).kind() {
                    Some(BindingKind::Leaf) | None => 0,
                    Some(_) => 1,
                };
                assert_eq!(owners[index], expected, "index {} in {}x{}", index, depth, width);
            }
        }
    }

    #[test]
    fn test_leaf_children_never_enter_the_tree() {
        let tree = tree_of(&generated(4, 3));
        for index in tree.indices() {
            let node = tree.node(index);
            if node.kind() == Some(BindingKind::Leaf) {
                assert!(node.children.is_empty());
            }
        }
        assert!(!tree.shadowed().is_empty());
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // ELEMENT_UNDER_COMPONENT COUNT
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_one_hierarchy_finding_per_nested_element() {
        let config = BindingConfig::default();
        let mut tree = tree_of(&generated(4, 3));

        let nested: Vec<_> = tree
            .indices()
            .filter(|&i| tree.node(i).kind() == Some(BindingKind::Element))
            .filter(|&i| {
                tree.ancestors(i)
                    .iter()
                    .any(|&a| tree.node(a).kind() == Some(BindingKind::Component))
            })
            .map(|i| tree.node(i).node)
            .collect();
        assert!(!nested.is_empty());

        let findings = Validator::new(&config).validate(&mut tree);
        let flagged: Vec<_> = findings
            .iter()
            .filter(|f| f.rule_id == RULE_ELEMENT_UNDER_COMPONENT)
            .map(|f| f.target)
            .collect();
        assert_eq!(flagged, nested);
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // NAME SUGGESTER
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_suggestions_are_legal_and_idempotent() {
        let config = BindingConfig::default();
        let labels = [
            "2Hp Bar!!", "", "   ", "!!!", "close button", "Close-Button", "__x__", "9", "über",
            "Title (1)", "a--b  c__d", "TxtTitle", "txt", "class",
        ];
        let capabilities = [None, Some("text"), Some("slider"), Some("Button"), Some("custom")];

        for label in labels {
            for capability in capabilities {
                let once = suggest_name(label, capability, &config);
                let twice = suggest_name(&once, capability, &config);
                assert_eq!(once, twice, "label {:?} cap {:?}", label, capability);
                assert!(is_valid_identifier(&once), "{:?} -> {:?}", label, once);
                assert!(once.starts_with(|c: char| !c.is_ascii_lowercase()));
            }
        }
        assert!(!is_reserved_word(&suggest_name("class", None, &config), &config));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // CONVERSION AND CODEGEN GATES
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_same_kind_rejected_across_generated_tree() {
        let config = BindingConfig::default();
        let planner = ConversionPlanner::new(&config);
        let doc = generated(3, 3);
        let (store, root) = MemoryHierarchy::from_document(&doc);
        let tree = build_tree(&store, root);

        for index in tree.indices().skip(1) {
            let node = tree.node(index);
            let Some(kind) = node.kind() else { continue };
            assert!(!planner.can_convert(&store, root, node.node, kind).allowed);
            for target in ALL_KINDS {
                if !target.profile().convertible || !kind.profile().convertible {
                    assert!(!planner.can_convert(&store, root, node.node, target).allowed);
                }
            }
        }
    }

    #[test]
    fn test_codegen_blocked_while_errors_exist() {
        let config = BindingConfig::default();
        let mut tree = tree_of(&generated(4, 3));
        let findings = Validator::new(&config).validate(&mut tree);
        let errors = findings.iter().filter(|f| f.is_error()).count();
        assert!(errors > 0);

        match codegen_intent(&config, &tree, &findings) {
            Err(BindingError::BlockedByErrors(count)) => assert_eq!(count, errors),
            other => panic!("expected codegen to be blocked, got {:?}", other.map(|i| i.scopes.len())),
        }
    }
}
