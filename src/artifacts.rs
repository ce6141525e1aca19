//! Artifact paths and the file-system seam.
//!
//! Kinds that own a generated type (`Element`, `Component`) and the template
//! root each map to a primary file and a companion declarations file. Paths are
//! produced from the configured templates by substituting `{root}`,
//! `{template}` and `{name}`.

use crate::config::BindingConfig;
use crate::error::{BindingError, BindingResult};
use crate::model::BindingKind;
use crate::scope::is_scope;
use crate::tree::{BindingTree, TreeIndex, ROOT};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub trait ArtifactFs {
    fn exists(&self, path: &Path) -> bool;
    fn delete(&mut self, path: &Path) -> BindingResult<()>;
}

/// The real file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFs;

impl ArtifactFs for DiskFs {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn delete(&mut self, path: &Path) -> BindingResult<()> {
        fs::remove_file(path).map_err(|source| BindingError::Delete {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub primary: String,
    pub companion: String,
}

impl ArtifactPaths {
    pub fn both(&self) -> [&str; 2] {
        [&self.primary, &self.companion]
    }
}

fn render(template: &str, config: &BindingConfig, template_name: &str, name: &str) -> String {
    template
        .replace("{root}", &config.output_root)
        .replace("{template}", template_name)
        .replace("{name}", name)
}

/// Artifacts a node named `name` would own as `kind`. `None` for kinds that
/// only contribute a field.
pub fn kind_artifacts(
    config: &BindingConfig,
    template_name: &str,
    kind: BindingKind,
    name: &str,
) -> Option<ArtifactPaths> {
    let (primary, companion) = config.kind_templates(kind)?;
    Some(ArtifactPaths {
        primary: render(primary, config, template_name, name),
        companion: render(companion, config, template_name, name),
    })
}

pub fn root_artifacts(config: &BindingConfig, template_name: &str) -> ArtifactPaths {
    let t = &config.path_templates;
    ArtifactPaths {
        primary: render(&t.root_primary, config, template_name, template_name),
        companion: render(&t.root_companion, config, template_name, template_name),
    }
}

/// Artifacts of a scope node in a built tree.
pub fn scope_artifacts(
    config: &BindingConfig,
    tree: &BindingTree,
    scope: TreeIndex,
) -> Option<ArtifactPaths> {
    if scope == ROOT {
        return Some(root_artifacts(config, tree.template_name()));
    }
    let node = tree.node(scope);
    kind_artifacts(config, tree.template_name(), node.kind()?, node.name()?)
}

/// Every artifact path the current tree implies.
pub fn expected_artifacts(config: &BindingConfig, tree: &BindingTree) -> BTreeSet<PathBuf> {
    tree.indices()
        .filter(|&i| is_scope(tree, i))
        .filter_map(|i| scope_artifacts(config, tree, i))
        .flat_map(|paths| [PathBuf::from(paths.primary), PathBuf::from(paths.companion)])
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// STALE ARTIFACT SCAN
// ═══════════════════════════════════════════════════════════════════════════════

/// Generated files in the template's own artifact directories that no scope
/// of `tree` accounts for.
///
/// The shared component directory is not scanned: other templates' components
/// live there too.
pub fn find_stale_artifacts(config: &BindingConfig, tree: &BindingTree) -> Vec<PathBuf> {
    let expected = expected_artifacts(config, tree);
    let template = tree.template_name();
    // "_" is a placeholder name; only the directory part of the path is used.
    let dirs: BTreeSet<PathBuf> = std::iter::once(root_artifacts(config, template))
        .chain(kind_artifacts(config, template, BindingKind::Element, "_"))
        .flat_map(|paths| [paths.primary, paths.companion])
        .filter_map(|p| Path::new(&p).parent().map(Path::to_path_buf))
        .collect();

    let mut stale = Vec::new();
    for dir in dirs {
        if !dir.is_dir() {
            continue;
        }
        for entry in WalkDir::new(&dir).max_depth(1).into_iter().flatten() {
            let path = entry.path();
            if !path.is_file() || !is_generated(config, path) {
                continue;
            }
            if !expected.contains(path) {
                stale.push(path.to_path_buf());
            }
        }
    }
    stale.sort();
    stale
}

fn is_generated(config: &BindingConfig, path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| config.generated_extensions.iter().any(|e| e == ext))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::{MemoryHierarchy, TemplateNodeSpec};
    use crate::tree::build_tree;

    #[test]
    fn test_paths_from_templates() {
        let config = BindingConfig::default();
        let element = kind_artifacts(&config, "Hud", BindingKind::Element, "Inventory").unwrap();
        assert_eq!(element.primary, "Assets/Scripts/UI/Hud/Inventory.cs");
        assert_eq!(element.companion, "Assets/Scripts/UI/Hud/Inventory.Designer.cs");

        let component = kind_artifacts(&config, "Hud", BindingKind::Component, "Card").unwrap();
        assert_eq!(component.primary, "Assets/Scripts/UI/Components/Card.cs");

        assert!(kind_artifacts(&config, "Hud", BindingKind::Member, "Title").is_none());
        assert_eq!(
            root_artifacts(&config, "Hud").companion,
            "Assets/Scripts/UI/Hud/Hud.Designer.cs"
        );
    }

    #[test]
    fn test_stale_scan_reports_unclaimed_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = BindingConfig {
            output_root: dir.path().to_string_lossy().to_string(),
            ..BindingConfig::default()
        };

        let doc = TemplateNodeSpec::new("Hud").child(
            TemplateNodeSpec::new("Inventory").annotated(BindingKind::Element, "Inventory", "View"),
        );
        let (store, root) = MemoryHierarchy::from_document(&doc);
        let tree = build_tree(&store, root);

        let hud = dir.path().join("Hud");
        fs::create_dir_all(&hud).unwrap();
        for file in ["Hud.cs", "Hud.Designer.cs", "Inventory.cs", "Old.cs", "notes.txt"] {
            fs::write(hud.join(file), "").unwrap();
        }

        let stale = find_stale_artifacts(&config, &tree);
        assert_eq!(stale, vec![hud.join("Old.cs")]);
    }

    #[test]
    fn test_disk_fs_delete_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut disk = DiskFs;
        let missing = dir.path().join("gone.cs");
        assert!(!disk.exists(&missing));
        assert!(matches!(disk.delete(&missing), Err(BindingError::Delete { .. })));
    }
}
