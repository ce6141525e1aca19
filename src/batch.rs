//! Batch Annotator.
//!
//! Annotates a selection of hierarchy nodes in one go. Already-annotated nodes
//! are skipped, failures are recorded and processing always continues.

use crate::config::BindingConfig;
use crate::hierarchy::{HierarchyStore, NodeId};
use crate::model::{BindingAnnotation, BindingKind};
use crate::names::{primary_capability, suggest_name};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub node: NodeId,
    pub path: String,
    /// Assigned name for successes, reason for skips and failures.
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub annotated: Vec<BatchItem>,
    pub skipped: Vec<BatchItem>,
    pub failed: Vec<BatchItem>,
}

impl BatchOutcome {
    pub fn annotated_count(&self) -> usize {
        self.annotated.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn total(&self) -> usize {
        self.annotated.len() + self.skipped.len() + self.failed.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOptions {
    pub recursive: bool,
    /// `None` infers the kind from each node's capabilities.
    pub default_kind: Option<BindingKind>,
    pub auto_suggest_name: bool,
}

pub struct BatchAnnotator<'a> {
    config: &'a BindingConfig,
}

impl<'a> BatchAnnotator<'a> {
    pub fn new(config: &'a BindingConfig) -> Self {
        Self { config }
    }

    pub fn apply<S: HierarchyStore + ?Sized>(
        &self,
        store: &mut S,
        nodes: &[NodeId],
        options: BatchOptions,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for &node in nodes {
            self.visit(store, node, options, &mut outcome);
        }
        debug!(
            annotated = outcome.annotated_count(),
            skipped = outcome.skipped_count(),
            failed = outcome.failed_count(),
            "batch annotation finished"
        );
        outcome
    }

    fn visit<S: HierarchyStore + ?Sized>(
        &self,
        store: &mut S,
        node: NodeId,
        options: BatchOptions,
        outcome: &mut BatchOutcome,
    ) {
        self.annotate_one(store, node, options, outcome);
        if options.recursive {
            for child in store.children(node) {
                self.visit(store, child, options, outcome);
            }
        }
    }

    fn annotate_one<S: HierarchyStore + ?Sized>(
        &self,
        store: &mut S,
        node: NodeId,
        options: BatchOptions,
        outcome: &mut BatchOutcome,
    ) {
        let path = store.path_of(node);
        if let Some(existing) = store.annotation(node) {
            outcome.skipped.push(BatchItem {
                node,
                path,
                detail: format!("already annotated as {}", existing.kind),
            });
            return;
        }

        let label = store.label(node);
        let capabilities = store.capabilities(node);
        let capability = primary_capability(&capabilities, self.config);
        let kind = options
            .default_kind
            .unwrap_or_else(|| self.infer_kind(&capabilities));

        let annotation = if kind.is_nameable() {
            let Some(type_reference) = self.type_reference(capability) else {
                warn!(node = %node, path = %path, "no type reference for batch annotation");
                outcome.failed.push(BatchItem {
                    node,
                    path,
                    detail: format!("'{}' has no capability to use as type reference", label),
                });
                return;
            };
            let name = if options.auto_suggest_name {
                suggest_name(&label, capability, self.config)
            } else {
                label.clone()
            };
            BindingAnnotation::new(kind, &name, type_reference)
        } else {
            BindingAnnotation::leaf()
        };

        let assigned = annotation.name.clone();
        match store.set_annotation(node, annotation) {
            Ok(()) => outcome.annotated.push(BatchItem {
                node,
                path,
                detail: assigned,
            }),
            Err(e) => {
                warn!(node = %node, path = %path, error = %e, "batch annotation failed");
                outcome.failed.push(BatchItem {
                    node,
                    path,
                    detail: e.to_string(),
                });
            }
        }
    }

    /// Primary capability, else the configured fallback. `None` if both are empty.
    fn type_reference<'c>(&'c self, capability: Option<&'c str>) -> Option<&'c str> {
        capability
            .filter(|cap| !cap.trim().is_empty())
            .or_else(|| Some(self.config.fallback_type_reference.trim()))
            .filter(|t| !t.is_empty())
    }

    fn infer_kind(&self, capabilities: &[String]) -> BindingKind {
        capabilities
            .iter()
            .find_map(|cap| self.config.kind_for_capability(cap))
            .unwrap_or(BindingKind::Member)
    }
}
