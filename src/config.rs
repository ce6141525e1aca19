//! Engine configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.

use crate::error::{BindingError, BindingResult};
use crate::model::BindingKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// When `execute` overwrites the annotation kind relative to artifact deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum KindCommit {
    /// Kind is overwritten first; a failed deletion leaves the new kind in place.
    #[default]
    BeforeDeletions,
    /// Kind is overwritten only after every deletion succeeded.
    AfterDeletions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PathTemplates {
    pub root_primary: String,
    pub root_companion: String,
    pub element_primary: String,
    pub element_companion: String,
    pub component_primary: String,
    pub component_companion: String,
}

impl Default for PathTemplates {
    fn default() -> Self {
        Self {
            root_primary: "{root}/{template}/{template}.cs".to_string(),
            root_companion: "{root}/{template}/{template}.Designer.cs".to_string(),
            element_primary: "{root}/{template}/{name}.cs".to_string(),
            element_companion: "{root}/{template}/{name}.Designer.cs".to_string(),
            component_primary: "{root}/Components/{name}.cs".to_string(),
            component_companion: "{root}/Components/{name}.Designer.cs".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BindingConfig {
    /// Directory generated artifacts are written under (`{root}` in templates).
    pub output_root: String,
    pub path_templates: PathTemplates,
    /// Capability type → identifier prefix used by the name suggester.
    pub name_prefixes: BTreeMap<String, String>,
    /// Substitute for labels that clean down to nothing.
    pub fallback_name: String,
    /// Type reference given to batch-annotated nodes that expose no capability.
    /// Empty disables the fallback; such nodes are then reported as failed.
    pub fallback_type_reference: String,
    /// Words rejected in addition to the built-in keyword set.
    pub extra_reserved_words: Vec<String>,
    /// Capability type → kind used when batch annotation has no explicit kind.
    pub kind_by_capability: BTreeMap<String, BindingKind>,
    /// File extensions the stale artifact scan considers generated.
    pub generated_extensions: Vec<String>,
    pub kind_commit: KindCommit,
}

impl Default for BindingConfig {
    fn default() -> Self {
        let name_prefixes = [
            ("button", "Btn"),
            ("text", "Txt"),
            ("image", "Img"),
            ("rawimage", "RawImg"),
            ("toggle", "Tog"),
            ("slider", "Sld"),
            ("scrollbar", "Scb"),
            ("dropdown", "Drp"),
            ("inputfield", "Inp"),
            ("scrollrect", "Scr"),
            ("canvasgroup", "Cg"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            output_root: "Assets/Scripts/UI".to_string(),
            path_templates: PathTemplates::default(),
            name_prefixes,
            fallback_name: "Node".to_string(),
            fallback_type_reference: "GameObject".to_string(),
            extra_reserved_words: Vec::new(),
            kind_by_capability: BTreeMap::new(),
            generated_extensions: vec!["cs".to_string()],
            kind_commit: KindCommit::default(),
        }
    }
}

impl BindingConfig {
    pub fn from_json_str(json: &str) -> BindingResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> BindingResult<Self> {
        let data = fs::read_to_string(path).map_err(|source| BindingError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&data)
    }

    /// Prefix registered for a capability type, matched case-insensitively.
    pub fn prefix_for(&self, capability: &str) -> Option<&str> {
        self.name_prefixes
            .iter()
            .find(|(cap, _)| cap.eq_ignore_ascii_case(capability))
            .map(|(_, prefix)| prefix.as_str())
    }

    pub fn kind_for_capability(&self, capability: &str) -> Option<BindingKind> {
        self.kind_by_capability
            .iter()
            .find(|(cap, _)| cap.eq_ignore_ascii_case(capability))
            .map(|(_, kind)| *kind)
    }

    /// Primary and companion templates for a kind that owns artifacts.
    pub fn kind_templates(&self, kind: BindingKind) -> Option<(&str, &str)> {
        let t = &self.path_templates;
        match kind {
            BindingKind::Element => Some((&t.element_primary, &t.element_companion)),
            BindingKind::Component => Some((&t.component_primary, &t.component_companion)),
            BindingKind::Member | BindingKind::Leaf => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = BindingConfig::from_json_str("{}").unwrap();
        assert_eq!(config.fallback_name, "Node");
        assert_eq!(config.fallback_type_reference, "GameObject");
        assert_eq!(config.prefix_for("Slider"), Some("Sld"));
        assert_eq!(config.kind_commit, KindCommit::BeforeDeletions);
    }

    #[test]
    fn test_partial_override() {
        let config = BindingConfig::from_json_str(
            r#"{
                "outputRoot": "Gen",
                "pathTemplates": { "componentPrimary": "{root}/Shared/{name}.cs" },
                "kindByCapability": { "scrollrect": "Element" },
                "kindCommit": "afterDeletions"
            }"#,
        )
        .unwrap();
        assert_eq!(config.output_root, "Gen");
        assert_eq!(config.path_templates.component_primary, "{root}/Shared/{name}.cs");
        assert_eq!(
            config.path_templates.component_companion,
            "{root}/Components/{name}.Designer.cs"
        );
        assert_eq!(config.kind_for_capability("ScrollRect"), Some(BindingKind::Element));
        assert_eq!(config.kind_commit, KindCommit::AfterDeletions);
    }

    #[test]
    fn test_only_artifact_kinds_have_templates() {
        let config = BindingConfig::default();
        assert!(config.kind_templates(BindingKind::Member).is_none());
        assert!(config.kind_templates(BindingKind::Leaf).is_none());
        assert!(config.kind_templates(BindingKind::Element).is_some());
    }
}
