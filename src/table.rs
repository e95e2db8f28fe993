use std::borrow::Cow;
use std::collections::BTreeMap;

use bitvec::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::TableConfig;
use crate::decl::{Declaration, GroupDeclaration, SpecFile};
use crate::error::TableError;
use crate::ident::{harvest, opcode_ident, Identifiers, UNKNOWN};
use crate::pattern::expand;

pub const TABLE_SIZE: usize = 256;
pub const GROUP_ROWS: usize = 7;
pub const GROUP_COLS: usize = 8;
pub const GROUP_SIZE: usize = GROUP_ROWS * GROUP_COLS;
/// ModRM `reg` field; selects the column inside a group row.
pub const MODRM_REG_MASK: u8 = 0x38;

/// One slot of the 256-entry table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Literal mnemonic as written, `-` included.
    pub mnemonic: String,
    pub category: String,
    /// Group row for two-byte opcodes, -1 otherwise.
    pub aux_index: i32,
}

impl Entry {
    pub fn unknown() -> Self {
        Self {
            mnemonic: UNKNOWN.into(),
            category: UNKNOWN.into(),
            aux_index: -1,
        }
    }

    pub fn opcode<'a>(&'a self, cfg: &TableConfig) -> Cow<'a, str> {
        opcode_ident(&self.mnemonic, cfg)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupEntry {
    pub mnemonic: String,
    pub category: String,
}

impl GroupEntry {
    pub fn opcode<'a>(&'a self, cfg: &TableConfig) -> Cow<'a, str> {
        opcode_ident(&self.mnemonic, cfg)
    }
}

/// Dense table indexed by the first opcode byte.
#[derive(Debug, Clone)]
pub struct OpcodeTable {
    entries: Vec<Entry>,
    resolved: BitArray<[u64; 4], Lsb0>,
}

impl OpcodeTable {
    pub fn get(&self, byte: u8) -> &Entry {
        &self.entries[byte as usize]
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &Entry)> {
        self.entries.iter().enumerate().map(|(i, e)| (i as u8, e))
    }

    /// Whether some declaration covers `byte`.
    pub fn is_resolved(&self, byte: u8) -> bool {
        self.resolved[byte as usize]
    }

    pub fn resolved_count(&self) -> usize {
        self.resolved.count_ones()
    }

    pub fn unresolved(&self) -> impl Iterator<Item = u8> + '_ {
        self.resolved.iter_zeros().map(|i| i as u8)
    }
}

/// 7x8 grid for opcodes whose meaning depends on the ModRM `reg` field,
/// stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTable {
    entries: Vec<GroupEntry>,
}

impl GroupTable {
    /// Lays declarations out in file order; no pattern matching involved.
    pub fn assemble(decls: &[GroupDeclaration]) -> Result<Self, TableError> {
        if decls.len() != GROUP_SIZE {
            return Err(TableError::GroupCount {
                expected: GROUP_SIZE,
                found: decls.len(),
            });
        }
        let entries = decls
            .iter()
            .map(|d| GroupEntry {
                mnemonic: d.mnemonic.clone(),
                category: d.category.clone(),
            })
            .collect();
        Ok(Self { entries })
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&GroupEntry> {
        if row >= GROUP_ROWS || col >= GROUP_COLS {
            return None;
        }
        self.entries.get(row * GROUP_COLS + col)
    }

    pub fn entries(&self) -> &[GroupEntry] {
        &self.entries
    }

    pub fn rows(&self) -> impl Iterator<Item = &[GroupEntry]> {
        self.entries.chunks(GROUP_COLS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclRef {
    pub line: usize,
    pub mnemonic: String,
}

impl DeclRef {
    fn of(decl: &Declaration) -> Self {
        Self { line: decl.line, mnemonic: decl.mnemonic.clone() }
    }
}

/// Slots a later declaration took over from an earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overlap {
    pub earlier: DeclRef,
    pub later: DeclRef,
    pub slots: Vec<u8>,
}

/// Fills the 256-entry table one declaration at a time. Later declarations
/// overwrite earlier ones; every takeover is recorded.
#[derive(Debug)]
pub struct OpcodeTableBuilder {
    entries: Vec<Entry>,
    owners: Vec<Option<DeclRef>>,
    resolved: BitArray<[u64; 4], Lsb0>,
    // keyed by (later line, earlier line) so the report follows file order
    overlaps: BTreeMap<(usize, usize), Overlap>,
}

impl Default for OpcodeTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OpcodeTableBuilder {
    pub fn new() -> Self {
        Self {
            entries: vec![Entry::unknown(); TABLE_SIZE],
            owners: vec![None; TABLE_SIZE],
            resolved: BitArray::ZERO,
            overlaps: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, decl: &Declaration) -> Result<(), TableError> {
        if decl.aux_index < -1 || decl.aux_index >= GROUP_ROWS as i32 {
            return Err(TableError::AuxOutOfRange {
                line: decl.line,
                mnemonic: decl.mnemonic.clone(),
                aux: decl.aux_index,
                rows: GROUP_ROWS,
            });
        }
        let expansion = expand(&decl.pattern).map_err(|source| TableError::Pattern {
            line: decl.line,
            mnemonic: decl.mnemonic.clone(),
            pattern: decl.pattern.clone(),
            source,
        })?;
        debug!(
            line = decl.line,
            mnemonic = %decl.mnemonic,
            pattern = %decl.pattern,
            bases = ?expansion.bases,
            span = expansion.span(),
            "expanded declaration"
        );

        let me = DeclRef::of(decl);
        let entry = Entry {
            mnemonic: decl.mnemonic.clone(),
            category: decl.category.clone(),
            aux_index: decl.aux_index,
        };
        for byte in expansion.slots() {
            let idx = byte as usize;
            if let Some(prev) = self.owners[idx].replace(me.clone()) {
                self.overlaps
                    .entry((me.line, prev.line))
                    .or_insert_with(|| Overlap {
                        earlier: prev,
                        later: me.clone(),
                        slots: Vec::new(),
                    })
                    .slots
                    .push(byte);
            }
            self.entries[idx] = entry.clone();
            self.resolved.set(idx, true);
        }
        Ok(())
    }

    pub fn finish(self) -> (OpcodeTable, Vec<Overlap>) {
        let overlaps: Vec<Overlap> = self.overlaps.into_values().collect();
        for o in &overlaps {
            warn!(
                earlier_line = o.earlier.line,
                earlier = %o.earlier.mnemonic,
                later_line = o.later.line,
                later = %o.later.mnemonic,
                slots = o.slots.len(),
                "overlapping patterns; later declaration wins"
            );
        }
        let table = OpcodeTable { entries: self.entries, resolved: self.resolved };
        (table, overlaps)
    }
}

/// Everything one run produces. Built once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct CompiledTables {
    pub normal: OpcodeTable,
    pub special: GroupTable,
    pub identifiers: Identifiers,
    pub overlaps: Vec<Overlap>,
}

impl CompiledTables {
    pub fn lookup(&self, byte: u8) -> &Entry {
        self.normal.get(byte)
    }

    /// Group entry selected by `byte`'s aux row and the ModRM `reg` field of
    /// `second_byte`. `None` when `byte` is not a group opcode.
    pub fn group_entry(&self, byte: u8, second_byte: u8) -> Option<&GroupEntry> {
        let row = usize::try_from(self.lookup(byte).aux_index).ok()?;
        let col = ((second_byte & MODRM_REG_MASK) >> 3) as usize;
        self.special.get(row, col)
    }
}

pub fn compile(spec: &SpecFile, cfg: &TableConfig) -> Result<CompiledTables, TableError> {
    let mut builder = OpcodeTableBuilder::new();
    for decl in &spec.normal {
        builder.add(decl)?;
    }
    let (normal, overlaps) = builder.finish();
    let special = GroupTable::assemble(&spec.special)?;
    let identifiers = harvest(&normal, &special, cfg);

    info!(
        declarations = spec.normal.len(),
        resolved = normal.resolved_count(),
        overlaps = overlaps.len(),
        opcodes = identifiers.opcodes.len(),
        categories = identifiers.categories.len(),
        "compiled opcode tables"
    );
    Ok(CompiledTables { normal, special, identifiers, overlaps })
}
