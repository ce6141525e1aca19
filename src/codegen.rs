//! Codegen hand-off.
//!
//! Turns a validated `BindingTree` into the per-scope declaration lists the
//! external generator renders into source. This module writes no source
//! itself; it only guarantees the input is conflict-free and hierarchy-legal.

use crate::artifacts::scope_artifacts;
use crate::config::BindingConfig;
use crate::error::{BindingError, BindingResult};
use crate::model::{BindingKind, ValidationFinding};
use crate::scope::{scope_members, scopes};
use crate::tree::{BindingTree, ROOT};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDeclaration {
    pub name: String,
    pub kind: BindingKind,
    pub type_reference: String,
    pub comment: Option<String>,
    /// Hierarchy path relative to the template root, used to locate the node at runtime.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeDeclaration {
    pub name: String,
    /// `None` for the template root.
    pub kind: Option<BindingKind>,
    pub type_reference: String,
    pub primary_path: String,
    pub companion_path: String,
    pub members: Vec<MemberDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodegenIntent {
    pub template: String,
    pub scopes: Vec<ScopeDeclaration>,
}

/// Build the generator input, refusing while any `Error` finding is present.
pub fn codegen_intent(
    config: &BindingConfig,
    tree: &BindingTree,
    findings: &[ValidationFinding],
) -> BindingResult<CodegenIntent> {
    let errors = findings.iter().filter(|f| f.is_error()).count();
    if errors > 0 {
        return Err(BindingError::BlockedByErrors(errors));
    }

    let root_depth = tree.root().path.len();
    let mut declarations = Vec::new();
    for scope in scopes(tree) {
        let Some(paths) = scope_artifacts(config, tree, scope) else {
            continue;
        };
        let node = tree.node(scope);
        let members = scope_members(tree, scope)
            .into_iter()
            .filter_map(|i| {
                let member = tree.node(i);
                let annotation = member.annotation.as_ref()?;
                Some(MemberDeclaration {
                    name: annotation.name.clone(),
                    kind: annotation.kind,
                    type_reference: annotation.type_reference.clone(),
                    comment: annotation.comment.clone(),
                    path: member.path[root_depth..].join("/"),
                })
            })
            .collect();

        declarations.push(ScopeDeclaration {
            name: tree.display_name(scope).to_string(),
            kind: node.kind(),
            type_reference: if scope == ROOT {
                tree.template_name().to_string()
            } else {
                node.annotation
                    .as_ref()
                    .map(|a| a.type_reference.clone())
                    .unwrap_or_default()
            },
            primary_path: paths.primary,
            companion_path: paths.companion,
            members,
        });
    }

    Ok(CodegenIntent {
        template: tree.template_name().to_string(),
        scopes: declarations,
    })
}
