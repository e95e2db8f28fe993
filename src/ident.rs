use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::Serialize;

use crate::config::TableConfig;
use crate::decl::PLACEHOLDER;
use crate::table::{GroupTable, OpcodeTable};

/// Sentinel opcode and category for unresolved slots. The consumer predefines
/// it as enum value 0, so it is never harvested.
pub const UNKNOWN: &str = "Unknown";

pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Opcode identifier for a literal mnemonic.
pub fn opcode_ident<'a>(mnemonic: &'a str, cfg: &TableConfig) -> Cow<'a, str> {
    if mnemonic == PLACEHOLDER {
        Cow::Borrowed(UNKNOWN)
    } else if cfg.is_reserved(mnemonic) {
        Cow::Owned(format!("{mnemonic}{}", cfg.keyword_suffix))
    } else {
        Cow::Borrowed(mnemonic)
    }
}

/// Sorted, duplicate-free identifier enumerations. `Unknown` is implicit at 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Identifiers {
    pub opcodes: Vec<String>,
    pub categories: Vec<String>,
}

impl Identifiers {
    pub fn opcode_value(&self, ident: &str) -> Option<usize> {
        enum_value(&self.opcodes, ident)
    }

    pub fn category_value(&self, ident: &str) -> Option<usize> {
        enum_value(&self.categories, ident)
    }
}

fn enum_value(sorted: &[String], ident: &str) -> Option<usize> {
    if ident == UNKNOWN {
        return Some(0);
    }
    sorted
        .binary_search_by(|probe| probe.as_str().cmp(ident))
        .ok()
        .map(|i| i + 1)
}

/// Collects identifiers from final slot contents, so fully shadowed
/// declarations contribute nothing.
pub fn harvest(normal: &OpcodeTable, special: &GroupTable, cfg: &TableConfig) -> Identifiers {
    let mut opcodes = BTreeSet::new();
    let mut categories = BTreeSet::new();

    let names = normal
        .entries()
        .iter()
        .map(|e| (e.mnemonic.as_str(), e.category.as_str()))
        .chain(
            special
                .entries()
                .iter()
                .map(|e| (e.mnemonic.as_str(), e.category.as_str())),
        );
    for (mnemonic, category) in names {
        opcodes.insert(opcode_ident(mnemonic, cfg).into_owned());
        categories.insert(category.to_string());
    }
    opcodes.remove(UNKNOWN);
    categories.remove(UNKNOWN);

    Identifiers {
        opcodes: opcodes.into_iter().collect(),
        categories: categories.into_iter().collect(),
    }
}
