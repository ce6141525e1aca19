//! Native bridge for the UI layer.
//!
//! Every entry point takes and returns JSON. Nodes are addressed by their
//! slash-joined label path so the caller never sees arena ids.

use napi_derive::napi;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::artifacts::{find_stale_artifacts, DiskFs};
use crate::batch::{BatchAnnotator, BatchOptions};
use crate::codegen::codegen_intent;
use crate::config::BindingConfig;
use crate::convert::ConversionPlanner;
use crate::hierarchy::{HierarchyStore, MemoryHierarchy, NodeId, TemplateNodeSpec};
use crate::model::{has_blocking_errors, BindingKind, ValidationFinding};
use crate::names::suggest_name;
use crate::store::FileTemplateStore;
use crate::tree::build_tree;
use crate::validate::Validator;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[napi(object)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    pub has_errors: bool,
    pub findings: serde_json::Value,
    pub stale_artifacts: Vec<String>,
}

fn reason<E: std::fmt::Display>(context: &str) -> impl FnOnce(E) -> napi::Error + '_ {
    move |e| napi::Error::from_reason(format!("{}: {}", context, e))
}

fn load_config(config_json: Option<serde_json::Value>) -> napi::Result<BindingConfig> {
    match config_json {
        Some(value) => serde_json::from_value(value).map_err(reason("Invalid config")),
        None => Ok(BindingConfig::default()),
    }
}

fn parse_kind(kind: &str) -> napi::Result<BindingKind> {
    serde_json::from_value(serde_json::Value::String(kind.to_string()))
        .map_err(reason("Invalid binding kind"))
}

fn locate(store: &FileTemplateStore, node_path: &str) -> napi::Result<NodeId> {
    store
        .hierarchy()
        .resolve_path(node_path)
        .map_err(reason("Cannot locate node"))
}

fn to_json<T: Serialize>(value: &T) -> napi::Result<serde_json::Value> {
    serde_json::to_value(value).map_err(reason("Serialization failed"))
}

#[napi]
pub fn validate_template_native(
    template_json: serde_json::Value,
    config_json: Option<serde_json::Value>,
) -> napi::Result<ValidationSummary> {
    let config = load_config(config_json)?;
    let document: TemplateNodeSpec =
        serde_json::from_value(template_json).map_err(reason("Invalid template"))?;
    let (store, root) = MemoryHierarchy::from_document(&document);

    let mut tree = build_tree(&store, root);
    let findings: Vec<ValidationFinding> = Validator::new(&config).validate(&mut tree);
    let stale_artifacts = find_stale_artifacts(&config, &tree)
        .into_iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();

    Ok(ValidationSummary {
        has_errors: has_blocking_errors(&findings),
        findings: to_json(&findings)?,
        stale_artifacts,
    })
}

#[napi]
pub fn suggest_name_native(
    raw_label: String,
    capability: Option<String>,
    config_json: Option<serde_json::Value>,
) -> napi::Result<String> {
    let config = load_config(config_json)?;
    Ok(suggest_name(&raw_label, capability.as_deref(), &config))
}

#[napi]
pub fn preview_conversion_native(
    template_path: String,
    node_path: String,
    target_kind: String,
    config_json: Option<serde_json::Value>,
) -> napi::Result<serde_json::Value> {
    let config = load_config(config_json)?;
    let target = parse_kind(&target_kind)?;
    let store = FileTemplateStore::open(Path::new(&template_path)).map_err(reason("Cannot open template"))?;
    let node = locate(&store, &node_path)?;

    let report = ConversionPlanner::new(&config).preview(&store, &DiskFs, store.root(), node, target);
    to_json(&report)
}

#[napi]
pub fn execute_conversion_native(
    template_path: String,
    node_path: String,
    target_kind: String,
    config_json: Option<serde_json::Value>,
) -> napi::Result<serde_json::Value> {
    let config = load_config(config_json)?;
    let target = parse_kind(&target_kind)?;
    let mut store =
        FileTemplateStore::open(Path::new(&template_path)).map_err(reason("Cannot open template"))?;
    let node = locate(&store, &node_path)?;
    let root = store.root();

    let report = ConversionPlanner::new(&config).execute(&mut store, &mut DiskFs, root, node, target);
    to_json(&report)
}

#[napi]
pub fn batch_annotate_native(
    template_path: String,
    node_paths: Vec<String>,
    options_json: serde_json::Value,
    config_json: Option<serde_json::Value>,
) -> napi::Result<serde_json::Value> {
    let config = load_config(config_json)?;
    let options: BatchOptions =
        serde_json::from_value(options_json).map_err(reason("Invalid batch options"))?;
    let mut store =
        FileTemplateStore::open(Path::new(&template_path)).map_err(reason("Cannot open template"))?;
    let nodes = node_paths
        .iter()
        .map(|path| locate(&store, path))
        .collect::<napi::Result<Vec<_>>>()?;

    let outcome = BatchAnnotator::new(&config).apply(&mut store, &nodes, options);
    if outcome.annotated_count() > 0 {
        let root = store.root();
        store
            .persist_template(root)
            .map_err(reason("Cannot persist template"))?;
    }
    to_json(&outcome)
}

#[napi]
pub fn codegen_intent_native(
    template_json: serde_json::Value,
    config_json: Option<serde_json::Value>,
) -> napi::Result<serde_json::Value> {
    let config = load_config(config_json)?;
    let document: TemplateNodeSpec =
        serde_json::from_value(template_json).map_err(reason("Invalid template"))?;
    let (store, root) = MemoryHierarchy::from_document(&document);

    let mut tree = build_tree(&store, root);
    let findings = Validator::new(&config).validate(&mut tree);
    let intent = codegen_intent(&config, &tree, &findings).map_err(reason("Codegen blocked"))?;
    to_json(&intent)
}
