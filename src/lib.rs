//! # Binding Planner Ground Truth
//!
//! ## Binding Invariants
//!
//! 1. **One Annotation**: Every hierarchy node carries at most one `BindingAnnotation`.
//!    The kind decides everything else: scope, naming, artifacts, convertibility.
//!
//! 2. **Scopes**: The template root, every `Element` and every `Component` open a scope.
//!    Each scope is one generated type; `Member`s are fields on the nearest scope.
//!
//! 3. **Leaf Boundary**: A `Leaf` is never descended into. Annotations below it are
//!    ignored and reported as `SHADOWED_BY_LEAF` warnings.
//!
//! 4. **Scoped Uniqueness**: Names only need to be unique inside one scope.
//!    Two `Title`s in different Elements are fine; two in the same scope are
//!    `NAME_CONFLICT` errors on both nodes.
//!
//! 5. **Component Purity**: No `Element` may appear anywhere inside a `Component`.
//!    Each offending Element gets exactly one `ELEMENT_UNDER_COMPONENT` error.
//!
//! 6. **Stateless Planning**: `can_convert`, `preview` and `execute` rebuild the tree
//!    from the hierarchy on every call. A rejected or conflicting plan never
//!    mutates anything.
//!
//! 7. **Codegen Gate**: `codegen_intent` refuses to hand anything to the backend
//!    while any `Error` finding exists.

#[cfg(feature = "napi")]
use napi_derive::napi;

mod artifacts;
mod batch;
mod codegen;
mod config;
mod convert;
mod error;
mod hierarchy;
mod model;
mod names;
mod scope;
mod store;
mod tree;
mod validate;

#[cfg(feature = "napi")]
mod bridge;

#[cfg(test)]
mod safety_tests;

pub use artifacts::{
    expected_artifacts, find_stale_artifacts, kind_artifacts, root_artifacts, scope_artifacts,
    ArtifactFs, ArtifactPaths, DiskFs,
};
pub use batch::{BatchAnnotator, BatchItem, BatchOptions, BatchOutcome};
pub use codegen::{codegen_intent, CodegenIntent, MemberDeclaration, ScopeDeclaration};
pub use config::{BindingConfig, KindCommit, PathTemplates};
pub use convert::{ConversionPlanner, ConversionSession, ConversionState, ConvertCheck};
pub use error::{BindingError, BindingResult};
pub use hierarchy::{HierarchyStore, MemoryHierarchy, NodeId, TemplateNodeSpec};
pub use model::*;
pub use names::{is_reserved_word, is_valid_identifier, primary_capability, suggest_name};
pub use scope::{enclosing_component, is_scope, scope_members, scope_of, scopes};
pub use store::FileTemplateStore;
pub use tree::{build_tree, BindingTree, BindingTreeNode, ShadowedAnnotation, TreeIndex, ROOT};
pub use validate::*;

#[cfg(feature = "napi")]
pub use bridge::{
    batch_annotate_native, codegen_intent_native, execute_conversion_native,
    preview_conversion_native, suggest_name_native, validate_template_native, ValidationSummary,
};

#[cfg(feature = "napi")]
#[napi]
pub fn binding_bridge() -> String {
    "Binding Planner Native Bridge Connected".to_string()
}
