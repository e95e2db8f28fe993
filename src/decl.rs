use std::path::Path;

use serde::Serialize;

use crate::config::TableConfig;
use crate::error::TableError;
use crate::ident::is_identifier;

pub const NORMAL_MARKER: &str = "normal";
pub const SPECIAL_MARKER: &str = "special";
/// Mnemonic placeholder for "unassigned"; resolves to the Unknown opcode.
pub const PLACEHOLDER: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Section {
    #[default]
    Normal,
    Special,
}

/// `mnemonic pattern [category [aux]]` from the normal section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub line: usize,
    pub mnemonic: String,
    pub pattern: String,
    pub category: String,
    pub aux_index: i32,
}

/// `mnemonic category` from the special section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupDeclaration {
    pub line: usize,
    pub mnemonic: String,
    pub category: String,
}

/// Both sections of a spec file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecFile {
    pub normal: Vec<Declaration>,
    pub special: Vec<GroupDeclaration>,
}

pub fn load_spec(path: &Path, cfg: &TableConfig) -> Result<SpecFile, TableError> {
    let text = std::fs::read_to_string(path).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_spec(&text, cfg)
}

pub fn parse_spec(text: &str, cfg: &TableConfig) -> Result<SpecFile, TableError> {
    let mut spec = SpecFile::default();
    let mut section = Section::default();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        match trimmed {
            "" => continue,
            NORMAL_MARKER => {
                section = Section::Normal;
                continue;
            }
            SPECIAL_MARKER => {
                section = Section::Special;
                continue;
            }
            _ => {}
        }

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        match section {
            Section::Normal => spec.normal.push(parse_normal(line, trimmed, &fields, cfg)?),
            Section::Special => spec.special.push(parse_group(line, trimmed, &fields)?),
        }
    }
    Ok(spec)
}

fn parse_normal(
    line: usize,
    text: &str,
    fields: &[&str],
    cfg: &TableConfig,
) -> Result<Declaration, TableError> {
    let (mnemonic, pattern, rest) = match fields {
        [m, p, rest @ ..] if rest.len() <= 2 => (*m, *p, rest),
        _ => {
            return Err(TableError::MalformedLine {
                line,
                text: text.to_string(),
                reason: "expected `mnemonic pattern [category [aux]]`",
            })
        }
    };
    let category = rest.first().copied().unwrap_or(cfg.baseline_category.as_str());
    let aux_index = match rest.get(1) {
        Some(v) => v.parse::<i32>().map_err(|source| TableError::BadAuxIndex {
            line,
            value: v.to_string(),
            source,
        })?,
        None => -1,
    };

    check_names(line, mnemonic, category)?;
    Ok(Declaration {
        line,
        mnemonic: mnemonic.to_string(),
        pattern: pattern.to_string(),
        category: category.to_string(),
        aux_index,
    })
}

fn parse_group(line: usize, text: &str, fields: &[&str]) -> Result<GroupDeclaration, TableError> {
    let [mnemonic, category] = fields else {
        return Err(TableError::MalformedLine {
            line,
            text: text.to_string(),
            reason: "expected `mnemonic category`",
        });
    };
    check_names(line, mnemonic, category)?;
    Ok(GroupDeclaration {
        line,
        mnemonic: mnemonic.to_string(),
        category: category.to_string(),
    })
}

fn check_names(line: usize, mnemonic: &str, category: &str) -> Result<(), TableError> {
    for name in [mnemonic, category] {
        if name != PLACEHOLDER && !is_identifier(name) {
            return Err(TableError::InvalidIdentifier { line, name: name.to_string() });
        }
    }
    // A placeholder category would surface as an enum member named `-`.
    if category == PLACEHOLDER {
        return Err(TableError::InvalidIdentifier { line, name: category.to_string() });
    }
    Ok(())
}
