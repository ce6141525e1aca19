//! File-backed template store.
//!
//! Wraps `MemoryHierarchy` and writes the template document back to its JSON
//! file on `persist_template`. Writes are skipped when the serialized document
//! hashes the same as what is already on disk.

use crate::error::{BindingError, BindingResult};
use crate::hierarchy::{HierarchyStore, MemoryHierarchy, NodeId};
use crate::model::{BindingAnnotation, BindingKind};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct FileTemplateStore {
    path: PathBuf,
    hierarchy: MemoryHierarchy,
    root: NodeId,
    persisted_hash: String,
}

impl FileTemplateStore {
    pub fn open(path: &Path) -> BindingResult<Self> {
        let data = fs::read_to_string(path).map_err(|source| BindingError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let (hierarchy, root) = MemoryHierarchy::from_json(&data)?;
        let mut store = Self {
            path: path.to_path_buf(),
            hierarchy,
            root,
            persisted_hash: String::new(),
        };
        // Hash the normalized form so formatting differences alone never trigger a write.
        store.persisted_hash = Self::compute_hash(&store.serialize(root)?);
        Ok(store)
    }

    pub fn compute_hash(source: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn hierarchy(&self) -> &MemoryHierarchy {
        &self.hierarchy
    }

    fn serialize(&self, root: NodeId) -> BindingResult<String> {
        let document = self
            .hierarchy
            .to_document(root)
            .ok_or(BindingError::UnknownNode(root))?;
        Ok(serde_json::to_string_pretty(&document)?)
    }
}

impl HierarchyStore for FileTemplateStore {
    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.hierarchy.children(node)
    }

    fn annotation(&self, node: NodeId) -> Option<BindingAnnotation> {
        self.hierarchy.annotation(node)
    }

    fn capabilities(&self, node: NodeId) -> Vec<String> {
        self.hierarchy.capabilities(node)
    }

    fn label(&self, node: NodeId) -> String {
        self.hierarchy.label(node)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.hierarchy.parent(node)
    }

    fn set_annotation_kind(&mut self, node: NodeId, kind: BindingKind) -> BindingResult<()> {
        self.hierarchy.set_annotation_kind(node, kind)
    }

    fn set_annotation(
        &mut self,
        node: NodeId,
        annotation: BindingAnnotation,
    ) -> BindingResult<()> {
        self.hierarchy.set_annotation(node, annotation)
    }

    fn persist_template(&mut self, root: NodeId) -> BindingResult<()> {
        let data = self.serialize(root)?;
        let hash = Self::compute_hash(&data);
        if hash == self.persisted_hash {
            debug!(path = ?self.path, "template unchanged, skipping write");
            return Ok(());
        }

        fs::write(&self.path, &data).map_err(|e| BindingError::Persist {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        self.hierarchy.persist_template(root)?;
        self.persisted_hash = hash;
        info!(path = ?self.path, "persisted template");
        Ok(())
    }
}
