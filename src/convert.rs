//! Conversion Planner.
//!
//! Plans and executes changing one annotated node's `BindingKind`. Every call
//! rebuilds the binding tree from the hierarchy; nothing is cached between
//! `can_convert`, `preview` and `execute`.
//!
//! `ConversionSession` wraps the calls in the per-node state machine:
//!
//! ```text
//! Requested ──preview──▶ Rejected
//!     │
//!     └──────preview──▶ Previewed ──cancel──▶ Cancelled
//!                           │
//!                           └──execute──▶ Executed | ExecutionFailed | Rejected
//! ```

use crate::artifacts::{kind_artifacts, scope_artifacts, ArtifactFs};
use crate::config::{BindingConfig, KindCommit};
use crate::error::{BindingError, BindingResult};
use crate::hierarchy::{HierarchyStore, NodeId};
use crate::model::{BindingKind, ConversionImpactReport};
use crate::names::{is_reserved_word, is_valid_identifier};
use crate::scope::scope_of;
use crate::tree::{build_tree, BindingTree, TreeIndex};
use crate::validate::{check_hierarchy, check_scope_conflicts, LocatedFinding};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertCheck {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl ConvertCheck {
    fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn rejected(reason: String) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }
}

/// A precondition failure, with the node's current kind when it has one.
struct Rejection {
    source: Option<BindingKind>,
    reason: String,
}

pub struct ConversionPlanner<'a> {
    config: &'a BindingConfig,
}

impl<'a> ConversionPlanner<'a> {
    pub fn new(config: &'a BindingConfig) -> Self {
        Self { config }
    }

    pub fn can_convert<S: HierarchyStore + ?Sized>(
        &self,
        store: &S,
        root: NodeId,
        node: NodeId,
        target: BindingKind,
    ) -> ConvertCheck {
        let tree = build_tree(store, root);
        match self.check(&tree, node, target) {
            Ok(_) => ConvertCheck::allowed(),
            Err(rejection) => ConvertCheck::rejected(rejection.reason),
        }
    }

    pub fn preview<S, F>(
        &self,
        store: &S,
        fs: &F,
        root: NodeId,
        node: NodeId,
        target: BindingKind,
    ) -> ConversionImpactReport
    where
        S: HierarchyStore + ?Sized,
        F: ArtifactFs + ?Sized,
    {
        let tree = build_tree(store, root);
        let index = match self.check(&tree, node, target) {
            Ok(index) => index,
            Err(rejection) => {
                let mut report =
                    ConversionImpactReport::rejected(rejection.source, target, &rejection.reason);
                report.seal();
                return report;
            }
        };

        let converted = tree.node(index);
        let source = converted.kind();
        let name = converted.name().unwrap_or_default();
        let template = tree.template_name();
        let mut report = ConversionImpactReport::new(source, target);

        if let Some(paths) = source.and_then(|kind| kind_artifacts(self.config, template, kind, name)) {
            for path in paths.both() {
                if fs.exists(Path::new(path)) {
                    report.files_to_delete.push(path.to_string());
                }
            }
        }

        if let Some(paths) = kind_artifacts(self.config, template, target, name) {
            for path in paths.both() {
                let clashes = fs.exists(Path::new(path))
                    && !report.files_to_delete.iter().any(|d| d == path);
                if clashes && report.conflict_path.is_none() {
                    report.has_name_conflict = true;
                    report.conflict_path = Some(path.to_string());
                }
                report.files_to_create.push(path.to_string());
            }
        }

        let scope = scope_of(&tree, index);
        if let Some(paths) = scope_artifacts(self.config, &tree, scope) {
            report.files_to_modify.push(paths.companion);
        }

        report.seal();
        report
    }

    /// Re-plan and, if still executable, apply the conversion.
    ///
    /// Creation of new artifacts is left to the next code generation pass.
    /// Failures during deletion or persistence are reported, not propagated.
    pub fn execute<S, F>(
        &self,
        store: &mut S,
        fs: &mut F,
        root: NodeId,
        node: NodeId,
        target: BindingKind,
    ) -> ConversionImpactReport
    where
        S: HierarchyStore + ?Sized,
        F: ArtifactFs + ?Sized,
    {
        let mut report = self.preview(&*store, &*fs, root, node, target);
        if !report.can_execute {
            info!(
                node = %node,
                target = %target,
                reason = report.error_message.as_deref().unwrap_or("artifact conflict"),
                "conversion not executed"
            );
            return report;
        }

        match self.apply(store, fs, root, node, target, &report.files_to_delete) {
            Ok(()) => {
                report.success = true;
                info!(
                    node = %node,
                    target = %target,
                    deleted = report.files_to_delete.len(),
                    "conversion executed"
                );
            }
            Err(e) => {
                warn!(node = %node, target = %target, error = %e, "conversion failed");
                report.success = false;
                report.error_message = Some(e.to_string());
            }
        }
        report
    }

    fn apply<S, F>(
        &self,
        store: &mut S,
        fs: &mut F,
        root: NodeId,
        node: NodeId,
        target: BindingKind,
        deletions: &[String],
    ) -> BindingResult<()>
    where
        S: HierarchyStore + ?Sized,
        F: ArtifactFs + ?Sized,
    {
        match self.config.kind_commit {
            KindCommit::BeforeDeletions => {
                store.set_annotation_kind(node, target)?;
                delete_all(fs, deletions)?;
            }
            KindCommit::AfterDeletions => {
                delete_all(fs, deletions)?;
                store.set_annotation_kind(node, target)?;
            }
        }
        store.persist_template(root)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PRECONDITIONS
    // ═══════════════════════════════════════════════════════════════════════════

    fn check(
        &self,
        tree: &BindingTree,
        node: NodeId,
        target: BindingKind,
    ) -> Result<TreeIndex, Rejection> {
        let index = tree.find(node).ok_or_else(|| Rejection {
            source: None,
            reason: format!("Node {} is not an annotated node of this template.", node),
        })?;
        let current = tree.node(index);
        let annotation = current.annotation.as_ref().ok_or_else(|| Rejection {
            source: None,
            reason: format!("Node {} has no binding annotation.", node),
        })?;
        let source = annotation.kind;
        let reject = |reason: String| Rejection {
            source: Some(source),
            reason,
        };

        if source == target {
            return Err(reject(format!("'{}' is already a {} (same type).", current.label, target)));
        }
        if !source.profile().convertible {
            return Err(reject(format!("{} bindings cannot be converted.", source)));
        }
        if !target.profile().convertible {
            return Err(reject(format!("Cannot convert to {}.", target)));
        }

        let name = annotation.name.as_str();
        if name.is_empty() {
            return Err(reject(format!("'{}' has no binding name.", current.label)));
        }
        if is_reserved_word(name, self.config) {
            return Err(reject(format!("'{}' is a reserved word.", name)));
        }
        if !is_valid_identifier(name) {
            return Err(reject(format!("'{}' is not a valid identifier.", name)));
        }

        let converted = tree.with_kind(index, target);
        if let Some(message) = introduced(check_hierarchy(tree), check_hierarchy(&converted))
            .or_else(|| introduced(check_scope_conflicts(tree), check_scope_conflicts(&converted)))
        {
            return Err(reject(format!(
                "Converting to {} is not allowed: {}",
                target, message
            )));
        }

        Ok(index)
    }
}

/// Message of the first finding in `after` whose target had none in `before`.
fn introduced(before: Vec<LocatedFinding>, after: Vec<LocatedFinding>) -> Option<String> {
    let flagged: HashSet<NodeId> = before.into_iter().map(|l| l.finding.target).collect();
    after
        .into_iter()
        .find(|l| !flagged.contains(&l.finding.target))
        .map(|l| l.finding.message)
}

fn delete_all<F: ArtifactFs + ?Sized>(fs: &mut F, paths: &[String]) -> BindingResult<()> {
    for path in paths {
        fs.delete(Path::new(path))?;
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// SESSION STATE MACHINE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionState {
    Requested,
    Rejected,
    Previewed,
    Cancelled,
    Executed,
    ExecutionFailed,
}

impl ConversionState {
    pub fn as_str(self) -> &'static str {
        match self {
            ConversionState::Requested => "Requested",
            ConversionState::Rejected => "Rejected",
            ConversionState::Previewed => "Previewed",
            ConversionState::Cancelled => "Cancelled",
            ConversionState::Executed => "Executed",
            ConversionState::ExecutionFailed => "ExecutionFailed",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, ConversionState::Requested | ConversionState::Previewed)
    }
}

#[derive(Debug, Clone)]
pub struct ConversionSession {
    node: NodeId,
    target: BindingKind,
    state: ConversionState,
    report: Option<ConversionImpactReport>,
}

impl ConversionSession {
    pub fn new(node: NodeId, target: BindingKind) -> Self {
        Self {
            node,
            target,
            state: ConversionState::Requested,
            report: None,
        }
    }

    pub fn state(&self) -> ConversionState {
        self.state
    }

    pub fn report(&self) -> Option<&ConversionImpactReport> {
        self.report.as_ref()
    }

    fn transition(&self, to: ConversionState) -> BindingError {
        BindingError::InvalidTransition {
            target: self.target,
            from: self.state.as_str(),
            to: to.as_str(),
        }
    }

    /// Plan the conversion. Allowed from `Requested`, or again from `Previewed`
    /// to refresh a stale plan.
    pub fn preview<S, F>(
        &mut self,
        planner: &ConversionPlanner<'_>,
        store: &S,
        fs: &F,
        root: NodeId,
    ) -> BindingResult<&ConversionImpactReport>
    where
        S: HierarchyStore + ?Sized,
        F: ArtifactFs + ?Sized,
    {
        if !matches!(self.state, ConversionState::Requested | ConversionState::Previewed) {
            return Err(self.transition(ConversionState::Previewed));
        }
        let report = planner.preview(store, fs, root, self.node, self.target);
        self.state = if report.can_execute {
            ConversionState::Previewed
        } else {
            ConversionState::Rejected
        };
        Ok(self.report.insert(report))
    }

    pub fn cancel(&mut self) -> BindingResult<()> {
        if self.state != ConversionState::Previewed {
            return Err(self.transition(ConversionState::Cancelled));
        }
        self.state = ConversionState::Cancelled;
        Ok(())
    }

    pub fn execute<S, F>(
        &mut self,
        planner: &ConversionPlanner<'_>,
        store: &mut S,
        fs: &mut F,
        root: NodeId,
    ) -> BindingResult<&ConversionImpactReport>
    where
        S: HierarchyStore + ?Sized,
        F: ArtifactFs + ?Sized,
    {
        if self.state != ConversionState::Previewed {
            return Err(self.transition(ConversionState::Executed));
        }
        let report = planner.execute(store, fs, root, self.node, self.target);
        self.state = if !report.can_execute {
            ConversionState::Rejected
        } else if report.success {
            ConversionState::Executed
        } else {
            ConversionState::ExecutionFailed
        };
        Ok(self.report.insert(report))
    }
}
