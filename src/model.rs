use crate::hierarchy::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════════
// RULE IDS
// ═══════════════════════════════════════════════════════════════════════════════

pub const RULE_EMPTY_NAME: &str = "EMPTY_NAME";
pub const RULE_RESERVED_WORD: &str = "RESERVED_WORD";
pub const RULE_INVALID_IDENTIFIER: &str = "INVALID_IDENTIFIER";
pub const RULE_MISSING_TYPE_REFERENCE: &str = "MISSING_TYPE_REFERENCE";
pub const RULE_NAME_CONFLICT: &str = "NAME_CONFLICT";
pub const RULE_ELEMENT_UNDER_COMPONENT: &str = "ELEMENT_UNDER_COMPONENT";
pub const RULE_SHADOWED_BY_LEAF: &str = "SHADOWED_BY_LEAF";

// ═══════════════════════════════════════════════════════════════════════════════
// GUARANTEES
// ═══════════════════════════════════════════════════════════════════════════════

/// One-line statement of what a rule protects, shown next to its findings.
pub fn rule_guarantee(rule_id: &str) -> &'static str {
    match rule_id {
        RULE_EMPTY_NAME => "Every generated field has a name.",
        RULE_RESERVED_WORD => "Generated field names never collide with language keywords.",
        RULE_INVALID_IDENTIFIER => "Generated field names are legal identifiers.",
        RULE_MISSING_TYPE_REFERENCE => "Every generated field declares the type it references.",
        RULE_NAME_CONFLICT => "Names are unique within the scope that generates them.",
        RULE_ELEMENT_UNDER_COMPONENT => {
            "Components stay reusable: they never contain template-specific Elements."
        }
        RULE_SHADOWED_BY_LEAF => "Annotations below a Leaf boundary do not generate anything.",
        _ => "Unknown rule.",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BINDING KIND
// ═══════════════════════════════════════════════════════════════════════════════

/// How a generated field references an annotated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingKind {
    /// A field on the nearest enclosing container's generated type.
    Member,
    /// A template-specific sub-structure with its own generated type.
    Element,
    /// A reusable generated type, embeddable across templates.
    Component,
    /// A traversal boundary. Carries no field and no name.
    Leaf,
}

pub const ALL_KINDS: [BindingKind; 4] = [
    BindingKind::Member,
    BindingKind::Element,
    BindingKind::Component,
    BindingKind::Leaf,
];

/// Static capabilities of a binding kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindProfile {
    pub opens_scope: bool,
    pub nameable: bool,
    pub requires_artifact: bool,
    pub convertible: bool,
}

impl BindingKind {
    pub const fn profile(self) -> KindProfile {
        match self {
            BindingKind::Member => KindProfile {
                opens_scope: false,
                nameable: true,
                requires_artifact: false,
                convertible: true,
            },
            BindingKind::Element | BindingKind::Component => KindProfile {
                opens_scope: true,
                nameable: true,
                requires_artifact: true,
                convertible: true,
            },
            BindingKind::Leaf => KindProfile {
                opens_scope: false,
                nameable: false,
                requires_artifact: false,
                convertible: false,
            },
        }
    }

    pub fn opens_scope(self) -> bool {
        self.profile().opens_scope
    }

    pub fn is_nameable(self) -> bool {
        self.profile().nameable
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BindingKind::Member => "Member",
            BindingKind::Element => "Element",
            BindingKind::Component => "Component",
            BindingKind::Leaf => "Leaf",
        }
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ANNOTATION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingAnnotation {
    pub kind: BindingKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub type_reference: String,
    #[serde(default)]
    pub comment: Option<String>,
}

impl BindingAnnotation {
    pub fn new(kind: BindingKind, name: &str, type_reference: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            type_reference: type_reference.to_string(),
            comment: None,
        }
    }

    pub fn leaf() -> Self {
        Self::new(BindingKind::Leaf, "", "")
    }

    /// Name as seen by scoping rules. `Leaf` annotations have none.
    pub fn effective_name(&self) -> Option<&str> {
        if self.kind.is_nameable() {
            Some(self.name.as_str())
        } else {
            None
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VALIDATION FINDING
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FindingLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFinding {
    pub level: FindingLevel,
    pub message: String,
    pub target: NodeId,
    /// Slash-joined hierarchy path of `target`.
    pub target_path: String,
    pub suggested_fix: Option<String>,
    pub rule_id: String,
    pub guarantee: String,
}

impl ValidationFinding {
    pub fn new(
        level: FindingLevel,
        rule_id: &str,
        message: &str,
        target: NodeId,
        target_path: &str,
    ) -> Self {
        Self::with_fix(level, rule_id, message, target, target_path, None)
    }

    pub fn with_fix(
        level: FindingLevel,
        rule_id: &str,
        message: &str,
        target: NodeId,
        target_path: &str,
        suggested_fix: Option<String>,
    ) -> Self {
        ValidationFinding {
            level,
            message: message.to_string(),
            target,
            target_path: target_path.to_string(),
            suggested_fix,
            rule_id: rule_id.to_string(),
            guarantee: rule_guarantee(rule_id).to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == FindingLevel::Error
    }
}

/// True when any finding must stop code generation.
pub fn has_blocking_errors(findings: &[ValidationFinding]) -> bool {
    findings.iter().any(ValidationFinding::is_error)
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONVERSION IMPACT REPORT
// ═══════════════════════════════════════════════════════════════════════════════

/// Outcome of planning (and possibly executing) one kind conversion.
///
/// Built fresh by every `preview`/`execute` call and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionImpactReport {
    /// `None` when the node carries no annotation at all.
    pub source_kind: Option<BindingKind>,
    pub target_kind: BindingKind,
    pub files_to_create: Vec<String>,
    pub files_to_modify: Vec<String>,
    pub files_to_delete: Vec<String>,
    pub has_name_conflict: bool,
    pub conflict_path: Option<String>,
    pub can_execute: bool,
    pub success: bool,
    pub error_message: Option<String>,
}

impl ConversionImpactReport {
    pub fn new(source_kind: Option<BindingKind>, target_kind: BindingKind) -> Self {
        Self {
            source_kind,
            target_kind,
            files_to_create: Vec::new(),
            files_to_modify: Vec::new(),
            files_to_delete: Vec::new(),
            has_name_conflict: false,
            conflict_path: None,
            can_execute: false,
            success: false,
            error_message: None,
        }
    }

    pub fn rejected(
        source_kind: Option<BindingKind>,
        target_kind: BindingKind,
        reason: &str,
    ) -> Self {
        let mut report = Self::new(source_kind, target_kind);
        report.error_message = Some(reason.to_string());
        report
    }

    /// Recompute `can_execute` from the conflict flag and precondition error.
    pub fn seal(&mut self) {
        self.can_execute = !self.has_name_conflict && self.error_message.is_none();
    }
}
