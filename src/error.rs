//! Error types for the fallible seams of the engine.
//!
//! Validation never produces a `BindingError`; it reports `ValidationFinding`s.
//! These errors come from the hierarchy store, the artifact file system,
//! configuration loading and misuse of the conversion state machine.

use crate::hierarchy::NodeId;
use crate::model::BindingKind;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    #[error("Unknown hierarchy node {0}.")]
    UnknownNode(NodeId),

    #[error("Node {0} does not carry a binding annotation.")]
    NotAnnotated(NodeId),

    #[error("Node {0} is read-only and cannot be modified.")]
    ReadOnly(NodeId),

    #[error("No node at path '{0}'.")]
    NoSuchPath(String),

    #[error("Path '{path}' matches {count} nodes; sibling labels must be unique to address one.")]
    AmbiguousPath { path: String, count: usize },

    #[error("Failed to delete artifact {path:?}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to persist template to {path:?}: {reason}")]
    Persist { path: PathBuf, reason: String },

    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Conversion to {target} cannot move from {from} to {to}.")]
    InvalidTransition {
        target: BindingKind,
        from: &'static str,
        to: &'static str,
    },

    #[error("Code generation blocked by {0} error finding(s).")]
    BlockedByErrors(usize),
}

pub type BindingResult<T> = Result<T, BindingError>;
