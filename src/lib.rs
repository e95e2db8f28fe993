pub mod config;
pub mod decl;
pub mod emit;
pub mod error;
pub mod ident;
pub mod pattern;
pub mod table;

pub use config::TableConfig;
pub use decl::{load_spec, parse_spec, Declaration, GroupDeclaration, SpecFile};
pub use error::{PatternError, TableError};
pub use ident::{Identifiers, UNKNOWN};
pub use table::{compile, CompiledTables, Entry, GroupEntry, GroupTable, OpcodeTable, Overlap};
