//! Renders compiled tables for the decoder: a C++ include holding both
//! tables, a header with the opcode and category enums, and a JSON report.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::config::TableConfig;
use crate::error::TableError;
use crate::ident::UNKNOWN;
use crate::table::{CompiledTables, Overlap, GROUP_COLS, GROUP_ROWS, TABLE_SIZE};

pub const TABLE_FILE: &str = "instr_table.inl";
pub const HEADER_FILE: &str = "instr_opcodes.h";
pub const JSON_FILE: &str = "tables.json";

const BANNER: &str = "// DO NOT MODIFY!!! Automatically generated by i8086-tablegen.\n\n";

/// A rendered output file, not yet on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: &'static str,
    pub contents: String,
}

pub fn render_table(tables: &CompiledTables, cfg: &TableConfig) -> String {
    let rec = &cfg.record_type;
    let cat = &cfg.category_enum;
    let op = &cfg.opcode_enum;

    let mut out = String::from(BANNER);
    let _ = writeln!(out, "{rec} special_instructions[{GROUP_ROWS}][{GROUP_COLS}] = {{");
    for row in tables.special.rows() {
        out.push_str("   {\n");
        for e in row {
            let _ = writeln!(
                out,
                "       {{ \"{}\", {cat}::{}, {op}::{} }},",
                e.mnemonic,
                e.category,
                e.opcode(cfg)
            );
        }
        out.push_str("   },\n");
    }
    out.push_str("};\n\n");

    let _ = writeln!(out, "{rec} instructions[{TABLE_SIZE}] = {{");
    for (_, e) in tables.normal.iter() {
        let _ = writeln!(
            out,
            "   {{ \"{}\", {cat}::{}, {op}::{}, {} }},",
            e.mnemonic,
            e.category,
            e.opcode(cfg),
            e.aux_index
        );
    }
    out.push_str("};\n");
    out
}

pub fn render_header(tables: &CompiledTables, cfg: &TableConfig) -> String {
    let mut out = String::from(BANNER);
    out.push_str("#pragma once\n\n");
    let _ = writeln!(out, "namespace {} {{", cfg.namespace);
    for (name, members) in [
        (&cfg.opcode_enum, &tables.identifiers.opcodes),
        (&cfg.category_enum, &tables.identifiers.categories),
    ] {
        let _ = writeln!(out, "enum class {name} {{");
        let _ = writeln!(out, "\t{UNKNOWN} = 0,");
        for m in members {
            let _ = writeln!(out, "\t{m},");
        }
        out.push_str("};\n");
    }
    let _ = writeln!(out, "\n }} // namespace {}", cfg.namespace);
    out
}

#[derive(Debug, Serialize)]
struct NormalRow<'a> {
    byte: u8,
    mnemonic: &'a str,
    category: &'a str,
    opcode: Cow<'a, str>,
    aux_index: i32,
    resolved: bool,
}

#[derive(Debug, Serialize)]
struct GroupRow<'a> {
    mnemonic: &'a str,
    category: &'a str,
    opcode: Cow<'a, str>,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    opcodes: Vec<&'a str>,
    categories: Vec<&'a str>,
    instructions: Vec<NormalRow<'a>>,
    special_instructions: Vec<Vec<GroupRow<'a>>>,
    overlaps: &'a [Overlap],
}

fn with_unknown(sorted: &[String]) -> Vec<&str> {
    std::iter::once(UNKNOWN)
        .chain(sorted.iter().map(String::as_str))
        .collect()
}

pub fn render_json(tables: &CompiledTables, cfg: &TableConfig) -> Result<String, TableError> {
    let report = Report {
        opcodes: with_unknown(&tables.identifiers.opcodes),
        categories: with_unknown(&tables.identifiers.categories),
        instructions: tables
            .normal
            .iter()
            .map(|(byte, e)| NormalRow {
                byte,
                mnemonic: &e.mnemonic,
                category: &e.category,
                opcode: e.opcode(cfg),
                aux_index: e.aux_index,
                resolved: tables.normal.is_resolved(byte),
            })
            .collect(),
        special_instructions: tables
            .special
            .rows()
            .map(|row| {
                row.iter()
                    .map(|e| GroupRow {
                        mnemonic: &e.mnemonic,
                        category: &e.category,
                        opcode: e.opcode(cfg),
                    })
                    .collect()
            })
            .collect(),
        overlaps: &tables.overlaps,
    };
    serde_json::to_string_pretty(&report).map_err(TableError::Render)
}

pub fn cpp_artifacts(tables: &CompiledTables, cfg: &TableConfig) -> Vec<Artifact> {
    vec![
        Artifact { file_name: TABLE_FILE, contents: render_table(tables, cfg) },
        Artifact { file_name: HEADER_FILE, contents: render_header(tables, cfg) },
    ]
}

pub fn json_artifact(tables: &CompiledTables, cfg: &TableConfig) -> Result<Artifact, TableError> {
    Ok(Artifact { file_name: JSON_FILE, contents: render_json(tables, cfg)? })
}

/// Writes every artifact or none. Destinations are checked up front, files
/// are staged next to their destination, and replaced files are kept as
/// backups until every rename has gone through.
pub fn write_artifacts(dir: &Path, artifacts: &[Artifact]) -> Result<Vec<PathBuf>, TableError> {
    let io = |path: &Path| {
        let path = path.to_path_buf();
        move |source| TableError::Io { path, source }
    };
    std::fs::create_dir_all(dir).map_err(io(dir))?;

    for a in artifacts {
        let dst = dir.join(a.file_name);
        if let Ok(meta) = std::fs::symlink_metadata(&dst) {
            if !meta.file_type().is_file() {
                let e = std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "destination exists and is not a regular file",
                );
                return Err(io(&dst)(e));
            }
        }
    }

    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(artifacts.len());
    for a in artifacts {
        let tmp = dir.join(format!(".{}.tmp", a.file_name));
        let dst = dir.join(a.file_name);
        if let Err(e) = std::fs::write(&tmp, &a.contents) {
            let err = io(&tmp)(e);
            // a failed write may still have left a partial file behind
            staged.push((tmp, dst));
            discard_staged(&staged);
            return Err(err);
        }
        staged.push((tmp, dst));
    }

    // (destination, backup of what it replaced)
    let mut published: Vec<(PathBuf, Option<PathBuf>)> = Vec::with_capacity(staged.len());
    for (idx, (tmp, dst)) in staged.iter().enumerate() {
        match publish(tmp, dst) {
            Ok(backup) => published.push((dst.clone(), backup)),
            Err(e) => {
                roll_back(&published);
                discard_staged(&staged[idx..]);
                return Err(io(dst)(e));
            }
        }
    }

    let mut written = Vec::with_capacity(published.len());
    for (dst, backup) in published {
        if let Some(bak) = backup {
            let _ = std::fs::remove_file(bak);
        }
        info!(path = %dst.display(), "wrote artifact");
        written.push(dst);
    }
    Ok(written)
}

fn backup_path(dst: &Path) -> PathBuf {
    let name = dst.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    dst.with_file_name(format!(".{name}.bak"))
}

fn publish(tmp: &Path, dst: &Path) -> std::io::Result<Option<PathBuf>> {
    let backup = if dst.exists() {
        let bak = backup_path(dst);
        std::fs::rename(dst, &bak)?;
        Some(bak)
    } else {
        None
    };
    if let Err(e) = std::fs::rename(tmp, dst) {
        if let Some(bak) = &backup {
            let _ = std::fs::rename(bak, dst);
        }
        return Err(e);
    }
    Ok(backup)
}

fn roll_back(published: &[(PathBuf, Option<PathBuf>)]) {
    for (dst, backup) in published.iter().rev() {
        let _ = std::fs::remove_file(dst);
        if let Some(bak) = backup {
            let _ = std::fs::rename(bak, dst);
        }
    }
}

fn discard_staged(staged: &[(PathBuf, PathBuf)]) {
    for (tmp, _) in staged {
        let _ = std::fs::remove_file(tmp);
    }
}
