use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TableError;

/// Knobs for one table compilation. Defaults reproduce the emulator's tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Category used when a normal declaration omits one.
    pub baseline_category: String,
    /// Mnemonics that clash with target-language keywords (ASCII case-insensitive).
    pub reserved_mnemonics: Vec<String>,
    /// Appended to reserved mnemonics to form their identifier.
    pub keyword_suffix: String,
    pub namespace: String,
    pub opcode_enum: String,
    pub category_enum: String,
    pub record_type: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            baseline_category: "SingleByte".into(),
            reserved_mnemonics: ["and", "or", "xor", "int", "not"]
                .into_iter()
                .map(String::from)
                .collect(),
            keyword_suffix: "_".into(),
            namespace: "emu8086".into(),
            opcode_enum: "InstructionOpcode".into(),
            category_enum: "InstructionType".into(),
            record_type: "Instruction".into(),
        }
    }
}

impl TableConfig {
    pub fn from_json_str(text: &str) -> Result<Self, TableError> {
        serde_json::from_str(text).map_err(TableError::Config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, TableError> {
        let text = std::fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn is_reserved(&self, mnemonic: &str) -> bool {
        self.reserved_mnemonics
            .iter()
            .any(|kw| kw.eq_ignore_ascii_case(mnemonic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_partial_config_file() {
        let path = std::env::temp_dir().join(format!("_tablegen_cfg_{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "namespace": "cpu", "reserved_mnemonics": ["in", "out"] }"#).unwrap();
        let cfg = TableConfig::from_json_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(cfg.namespace, "cpu");
        assert!(cfg.is_reserved("IN"));
        assert!(!cfg.is_reserved("and"));
        // unspecified fields keep their defaults
        assert_eq!(cfg.baseline_category, "SingleByte");
        assert_eq!(cfg.opcode_enum, "InstructionOpcode");
    }

    #[test]
    fn config_file_errors() {
        let missing = std::env::temp_dir().join("_tablegen_cfg_missing.json");
        let _ = std::fs::remove_file(&missing);
        assert!(matches!(
            TableConfig::from_json_file(&missing),
            Err(TableError::Io { .. })
        ));

        let path = std::env::temp_dir().join(format!("_tablegen_cfg_bad_{}.json", std::process::id()));
        std::fs::write(&path, "{ \"keyword_suffix\": 3 }").unwrap();
        let res = TableConfig::from_json_file(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(res, Err(TableError::Config(_))));
    }
}
