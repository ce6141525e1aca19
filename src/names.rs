//! Name Suggester and identifier rules.
//!
//! `suggest_name` turns a raw hierarchy label into a legal, prefixed identifier.
//! It is pure and idempotent: feeding its output back in with the same
//! capability type returns the same string.

use crate::config::BindingConfig;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    /// Keywords of the generated language (C#).
    pub static ref RESERVED_WORDS: HashSet<&'static str> = {
        [
            "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char",
            "checked", "class", "const", "continue", "decimal", "default", "delegate", "do",
            "double", "else", "enum", "event", "explicit", "extern", "false", "finally",
            "fixed", "float", "for", "foreach", "goto", "if", "implicit", "in", "int",
            "interface", "internal", "is", "lock", "long", "namespace", "new", "null",
            "object", "operator", "out", "override", "params", "private", "protected",
            "public", "readonly", "ref", "return", "sbyte", "sealed", "short", "sizeof",
            "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
            "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using",
            "virtual", "void", "volatile", "while",
        ]
        .into_iter()
        .collect()
    };

    static ref IDENTIFIER_RE: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();

    /// Anything outside the characters a label may contribute.
    static ref DISALLOWED_RE: Regex = Regex::new(r"[^A-Za-z0-9_ \-]").unwrap();

    /// Runs of separators collapse to a single underscore.
    static ref SEPARATOR_RUN_RE: Regex = Regex::new(r"[ \-_]+").unwrap();
}

pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER_RE.is_match(name)
}

pub fn is_reserved_word(name: &str, config: &BindingConfig) -> bool {
    RESERVED_WORDS.contains(name) || config.extra_reserved_words.iter().any(|w| w == name)
}

/// The capability type used for prefix lookup: the first one with a
/// registered prefix, otherwise the first one listed.
pub fn primary_capability<'a>(capabilities: &'a [String], config: &BindingConfig) -> Option<&'a str> {
    capabilities
        .iter()
        .find(|cap| config.prefix_for(cap).is_some())
        .or_else(|| capabilities.first())
        .map(String::as_str)
}

pub fn suggest_name(raw_label: &str, capability: Option<&str>, config: &BindingConfig) -> String {
    let stripped = DISALLOWED_RE.replace_all(raw_label, "");
    let collapsed = SEPARATOR_RUN_RE.replace_all(&stripped, "_");
    let mut name = collapsed.trim_matches('_').to_string();

    if name.is_empty() {
        name = config.fallback_name.clone();
    }

    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }

    if let Some(prefix) = capability.and_then(|cap| config.prefix_for(cap)) {
        if !starts_with_ignore_case(&name, prefix) {
            name.insert_str(0, prefix);
        }
    }

    upper_first(&name)
}

fn starts_with_ignore_case(name: &str, prefix: &str) -> bool {
    name.len() >= prefix.len()
        && name
            .get(..prefix.len())
            .map(|head| head.eq_ignore_ascii_case(prefix))
            .unwrap_or(false)
}

fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
