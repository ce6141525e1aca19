//! Hierarchy store seam.
//!
//! The host owns the real hierarchy; this module defines the calls the engine
//! makes against it and ships `MemoryHierarchy`, an arena-backed store that can
//! be loaded from a nested JSON template document.

use crate::error::{BindingError, BindingResult};
use crate::model::{BindingAnnotation, BindingKind};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Calls the engine makes against the host hierarchy.
///
/// Reads are infallible: an unknown node simply has no children, no annotation
/// and no capabilities. Writes are only issued by conversion execution and batch
/// annotation.
pub trait HierarchyStore {
    fn children(&self, node: NodeId) -> Vec<NodeId>;
    fn annotation(&self, node: NodeId) -> Option<BindingAnnotation>;
    fn capabilities(&self, node: NodeId) -> Vec<String>;
    fn label(&self, node: NodeId) -> String;
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn set_annotation_kind(&mut self, node: NodeId, kind: BindingKind) -> BindingResult<()>;
    fn set_annotation(&mut self, node: NodeId, annotation: BindingAnnotation)
        -> BindingResult<()>;
    fn persist_template(&mut self, root: NodeId) -> BindingResult<()>;

    /// Slash-joined labels from the topmost ancestor down to `node`.
    fn path_of(&self, node: NodeId) -> String {
        let mut labels = vec![self.label(node)];
        let mut current = self.parent(node);
        while let Some(id) = current {
            labels.push(self.label(id));
            current = self.parent(id);
        }
        labels.reverse();
        labels.join("/")
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEMPLATE DOCUMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Nested, serializable form of a template hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateNodeSpec {
    pub label: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub annotation: Option<BindingAnnotation>,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub children: Vec<TemplateNodeSpec>,
}

impl TemplateNodeSpec {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            capabilities: Vec::new(),
            annotation: None,
            read_only: false,
            children: Vec::new(),
        }
    }

    pub fn with_capability(mut self, capability: &str) -> Self {
        self.capabilities.push(capability.to_string());
        self
    }

    pub fn annotated(mut self, kind: BindingKind, name: &str, type_reference: &str) -> Self {
        self.annotation = Some(BindingAnnotation::new(kind, name, type_reference));
        self
    }

    pub fn child(mut self, child: TemplateNodeSpec) -> Self {
        self.children.push(child);
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// IN-MEMORY STORE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
struct StoredNode {
    label: String,
    capabilities: Vec<String>,
    annotation: Option<BindingAnnotation>,
    read_only: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryHierarchy {
    nodes: Vec<StoredNode>,
    persist_count: usize,
}

impl MemoryHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a document; returns the store and the id of its root.
    pub fn from_document(root: &TemplateNodeSpec) -> (Self, NodeId) {
        let mut store = Self::new();
        let root_id = store.insert(root, None);
        (store, root_id)
    }

    pub fn from_json(json: &str) -> BindingResult<(Self, NodeId)> {
        let spec: TemplateNodeSpec = serde_json::from_str(json)?;
        Ok(Self::from_document(&spec))
    }

    fn insert(&mut self, spec: &TemplateNodeSpec, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(StoredNode {
            label: spec.label.clone(),
            capabilities: spec.capabilities.clone(),
            annotation: spec.annotation.clone(),
            read_only: spec.read_only,
            parent,
            children: Vec::new(),
        });
        for child in &spec.children {
            let child_id = self.insert(child, Some(id));
            self.nodes[id.0 as usize].children.push(child_id);
        }
        id
    }

    /// Rebuild the nested document rooted at `root`.
    pub fn to_document(&self, root: NodeId) -> Option<TemplateNodeSpec> {
        let node = self.get(root)?;
        Some(TemplateNodeSpec {
            label: node.label.clone(),
            capabilities: node.capabilities.clone(),
            annotation: node.annotation.clone(),
            read_only: node.read_only,
            children: node
                .children
                .iter()
                .filter_map(|child| self.to_document(*child))
                .collect(),
        })
    }

    /// First node whose label path matches `path` (slash-joined).
    pub fn find_by_path(&self, path: &str) -> Option<NodeId> {
        (0..self.nodes.len())
            .map(|i| NodeId(i as u32))
            .find(|id| self.path_of(*id) == path)
    }

    /// The single node at `path`. Errors if none or several nodes match.
    pub fn resolve_path(&self, path: &str) -> BindingResult<NodeId> {
        let matches: Vec<NodeId> = (0..self.nodes.len())
            .map(|i| NodeId(i as u32))
            .filter(|id| self.path_of(*id) == path)
            .collect();
        match matches.as_slice() {
            [only] => Ok(*only),
            [] => Err(BindingError::NoSuchPath(path.to_string())),
            _ => Err(BindingError::AmbiguousPath {
                path: path.to_string(),
                count: matches.len(),
            }),
        }
    }

    pub fn persist_count(&self) -> usize {
        self.persist_count
    }

    pub fn set_read_only(&mut self, node: NodeId, read_only: bool) -> BindingResult<()> {
        let stored = self.get_mut(node)?;
        stored.read_only = read_only;
        Ok(())
    }

    fn get(&self, node: NodeId) -> Option<&StoredNode> {
        self.nodes.get(node.0 as usize)
    }

    fn get_mut(&mut self, node: NodeId) -> BindingResult<&mut StoredNode> {
        self.nodes
            .get_mut(node.0 as usize)
            .ok_or(BindingError::UnknownNode(node))
    }

    fn writable(&mut self, node: NodeId) -> BindingResult<&mut StoredNode> {
        let stored = self.get_mut(node)?;
        if stored.read_only {
            return Err(BindingError::ReadOnly(node));
        }
        Ok(stored)
    }
}

impl HierarchyStore for MemoryHierarchy {
    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.get(node).map(|n| n.children.clone()).unwrap_or_default()
    }

    fn annotation(&self, node: NodeId) -> Option<BindingAnnotation> {
        self.get(node).and_then(|n| n.annotation.clone())
    }

    fn capabilities(&self, node: NodeId) -> Vec<String> {
        self.get(node)
            .map(|n| n.capabilities.clone())
            .unwrap_or_default()
    }

    fn label(&self, node: NodeId) -> String {
        self.get(node).map(|n| n.label.clone()).unwrap_or_default()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).and_then(|n| n.parent)
    }

    fn set_annotation_kind(&mut self, node: NodeId, kind: BindingKind) -> BindingResult<()> {
        let stored = self.writable(node)?;
        match stored.annotation.as_mut() {
            Some(annotation) => {
                annotation.kind = kind;
                Ok(())
            }
            None => Err(BindingError::NotAnnotated(node)),
        }
    }

    fn set_annotation(
        &mut self,
        node: NodeId,
        annotation: BindingAnnotation,
    ) -> BindingResult<()> {
        let stored = self.writable(node)?;
        stored.annotation = Some(annotation);
        Ok(())
    }

    fn persist_template(&mut self, root: NodeId) -> BindingResult<()> {
        if self.get(root).is_none() {
            return Err(BindingError::UnknownNode(root));
        }
        self.persist_count += 1;
        Ok(())
    }
}
