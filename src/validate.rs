//! Validator.
//!
//! Runs independent passes over a built `BindingTree`:
//!
//! 1. **Identifiers** - every nameable node has a non-empty, legal, non-reserved name
//!    and a non-empty type reference.
//! 2. **Scoped conflicts** - names are unique within the scope that generates them.
//! 3. **Hierarchy legality** - no `Element` lives anywhere inside a `Component`.
//!
//! plus a warning pass for annotations shadowed by a `Leaf` boundary. Passes never
//! fail and never touch tree structure; `validate` attaches each finding to the
//! tree node it came from.

use crate::config::BindingConfig;
use crate::model::{
    BindingKind, FindingLevel, ValidationFinding, RULE_ELEMENT_UNDER_COMPONENT, RULE_EMPTY_NAME,
    RULE_INVALID_IDENTIFIER, RULE_MISSING_TYPE_REFERENCE, RULE_NAME_CONFLICT,
    RULE_RESERVED_WORD, RULE_SHADOWED_BY_LEAF,
};
use crate::names::{is_reserved_word, is_valid_identifier, primary_capability, suggest_name};
use crate::scope::{enclosing_component, scope_members, scopes};
use crate::tree::{BindingTree, TreeIndex, ROOT};
use std::collections::HashMap;
use tracing::debug;

pub const FIX_CONVERT_TO_MEMBER: &str = "convert to Member";

/// A finding together with the tree node it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedFinding {
    pub index: TreeIndex,
    pub finding: ValidationFinding,
}

pub struct Validator<'a> {
    config: &'a BindingConfig,
}

impl<'a> Validator<'a> {
    pub fn new(config: &'a BindingConfig) -> Self {
        Self { config }
    }

    /// Run every pass, attach findings to their nodes and return them merged.
    ///
    /// Findings from an earlier run are discarded first, so validating an
    /// unchanged tree twice yields identical results.
    pub fn validate(&self, tree: &mut BindingTree) -> Vec<ValidationFinding> {
        tree.clear_findings();

        let mut located = self.check_identifiers(tree);
        located.extend(check_scope_conflicts(tree));
        located.extend(check_hierarchy(tree));
        located.extend(check_shadowed(tree));

        let mut findings = Vec::with_capacity(located.len());
        for LocatedFinding { index, finding } in located {
            tree.node_mut(index).findings.push(finding.clone());
            findings.push(finding);
        }

        debug!(
            template = %tree.template_name(),
            findings = findings.len(),
            errors = findings.iter().filter(|f| f.is_error()).count(),
            "validated binding tree"
        );
        findings
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PASS 1: IDENTIFIERS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn check_identifiers(&self, tree: &BindingTree) -> Vec<LocatedFinding> {
        let mut out = Vec::new();
        for index in tree.indices().skip(1) {
            let node = tree.node(index);
            let Some(annotation) = node.annotation.as_ref() else {
                continue;
            };
            if !annotation.kind.is_nameable() {
                continue;
            }

            let path = node.path_string();
            let capability = primary_capability(&node.capabilities, self.config);
            let name = annotation.name.as_str();

            if name.is_empty() {
                out.push(LocatedFinding {
                    index,
                    finding: ValidationFinding::with_fix(
                        FindingLevel::Error,
                        RULE_EMPTY_NAME,
                        &format!("{} on '{}' has no name.", annotation.kind, node.label),
                        node.node,
                        &path,
                        Some(suggest_name(&node.label, capability, self.config)),
                    ),
                });
            } else if is_reserved_word(name, self.config) {
                out.push(LocatedFinding {
                    index,
                    finding: ValidationFinding::with_fix(
                        FindingLevel::Error,
                        RULE_RESERVED_WORD,
                        &format!("'{}' is a reserved word.", name),
                        node.node,
                        &path,
                        Some(suggest_name(name, capability, self.config)),
                    ),
                });
            } else if !is_valid_identifier(name) {
                out.push(LocatedFinding {
                    index,
                    finding: ValidationFinding::with_fix(
                        FindingLevel::Error,
                        RULE_INVALID_IDENTIFIER,
                        &format!("'{}' is not a valid identifier.", name),
                        node.node,
                        &path,
                        Some(suggest_name(name, capability, self.config)),
                    ),
                });
            }

            if annotation.type_reference.trim().is_empty() {
                let fix = capability
                    .map(str::to_string)
                    .or_else(|| {
                        let fallback = self.config.fallback_type_reference.trim();
                        (!fallback.is_empty()).then(|| fallback.to_string())
                    });
                out.push(LocatedFinding {
                    index,
                    finding: ValidationFinding::with_fix(
                        FindingLevel::Error,
                        RULE_MISSING_TYPE_REFERENCE,
                        &format!("{} '{}' has no type reference.", annotation.kind, node.label),
                        node.node,
                        &path,
                        fix,
                    ),
                });
            }
        }
        out
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PASS 2: SCOPED CONFLICTS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn check_scope_conflicts(tree: &BindingTree) -> Vec<LocatedFinding> {
    let mut out = Vec::new();
    for scope in scopes(tree) {
        for (name, holders) in duplicate_names(tree, scope) {
            let message = format!(
                "Name '{}' is used {} times in scope '{}'.",
                name,
                holders.len(),
                tree.display_name(scope)
            );
            for index in holders {
                let node = tree.node(index);
                out.push(LocatedFinding {
                    index,
                    finding: ValidationFinding::new(
                        FindingLevel::Error,
                        RULE_NAME_CONFLICT,
                        &message,
                        node.node,
                        &node.path_string(),
                    ),
                });
            }
        }
    }
    out
}

/// Names used more than once among `scope`'s members, in order of first use.
pub fn duplicate_names(tree: &BindingTree, scope: TreeIndex) -> Vec<(String, Vec<TreeIndex>)> {
    let mut order: Vec<String> = Vec::new();
    let mut holders: HashMap<String, Vec<TreeIndex>> = HashMap::new();

    for member in scope_members(tree, scope) {
        let Some(name) = tree.node(member).name() else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        let entry = holders.entry(name.to_string()).or_default();
        if entry.is_empty() {
            order.push(name.to_string());
        }
        entry.push(member);
    }

    order
        .into_iter()
        .filter_map(|name| {
            let nodes = holders.remove(&name)?;
            (nodes.len() > 1).then_some((name, nodes))
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// PASS 3: HIERARCHY LEGALITY
// ═══════════════════════════════════════════════════════════════════════════════

pub fn check_hierarchy(tree: &BindingTree) -> Vec<LocatedFinding> {
    let mut out = Vec::new();
    for index in tree.indices().skip(1) {
        let node = tree.node(index);
        if node.kind() != Some(BindingKind::Element) {
            continue;
        }
        if let Some(component) = enclosing_component(tree, index) {
            out.push(LocatedFinding {
                index,
                finding: ValidationFinding::with_fix(
                    FindingLevel::Error,
                    RULE_ELEMENT_UNDER_COMPONENT,
                    &format!(
                        "Element '{}' cannot be nested inside Component '{}'.",
                        tree.display_name(index),
                        tree.display_name(component)
                    ),
                    node.node,
                    &node.path_string(),
                    Some(FIX_CONVERT_TO_MEMBER.to_string()),
                ),
            });
        }
    }
    out
}

// ═══════════════════════════════════════════════════════════════════════════════
// LEAF SHADOWING
// ═══════════════════════════════════════════════════════════════════════════════

pub fn check_shadowed(tree: &BindingTree) -> Vec<LocatedFinding> {
    tree.shadowed()
        .iter()
        .map(|shadowed| {
            let path = shadowed.path.join("/");
            let boundary = if shadowed.boundary == ROOT {
                tree.template_name().to_string()
            } else {
                tree.node(shadowed.boundary).path_string()
            };
            LocatedFinding {
                index: shadowed.boundary,
                finding: ValidationFinding::new(
                    FindingLevel::Warning,
                    RULE_SHADOWED_BY_LEAF,
                    &format!("Annotation on '{}' is ignored below Leaf '{}'.", path, boundary),
                    shadowed.node,
                    &path,
                ),
            }
        })
        .collect()
}
