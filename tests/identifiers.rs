use pretty_assertions::assert_eq;

use i8086_tables::ident::opcode_ident;
use i8086_tables::table::GROUP_SIZE;
use i8086_tables::{compile, parse_spec, TableConfig, UNKNOWN};

fn compile_text(normal: &str, special: &[&str]) -> i8086_tables::CompiledTables {
    let cfg = TableConfig::default();
    let mut text = format!("{normal}\nspecial\n");
    for i in 0..GROUP_SIZE {
        text.push_str(special.get(i).copied().unwrap_or("- Unknown"));
        text.push('\n');
    }
    compile(&parse_spec(&text, &cfg).unwrap(), &cfg).unwrap()
}

#[test]
fn sorted_unique_without_unknown() {
    let tables = compile_text(
        "mov 100010 RegMem_Reg\nadd 000000 RegMem_Reg\nmov 1011 Imm_Reg\n- 1111111 Special 0",
        &["add Imm_RegMem", "cmp Imm_RegMem", "add Imm_RegMem"],
    );
    assert_eq!(tables.identifiers.opcodes, vec!["add", "cmp", "mov"]);
    assert_eq!(
        tables.identifiers.categories,
        vec!["Imm_Reg", "Imm_RegMem", "RegMem_Reg", "Special"]
    );
    assert!(!tables.identifiers.opcodes.iter().any(|o| o == UNKNOWN));
    assert!(!tables.identifiers.categories.iter().any(|c| c == UNKNOWN));
}

#[test]
fn reserved_mnemonics_are_escaped_everywhere() {
    let cfg = TableConfig::default();
    let tables = compile_text("AND 001000 RegMem_Reg\nOR 000010 RegMem_Reg", &["or Imm_RegMem"]);

    assert_eq!(tables.identifiers.opcodes, vec!["AND_", "OR_", "or_"]);
    for byte in 0x20..=0x23u8 {
        assert_eq!(tables.lookup(byte).opcode(&cfg), "AND_");
        // the literal text is untouched
        assert_eq!(tables.lookup(byte).mnemonic, "AND");
    }
    for byte in 0x08..=0x0Bu8 {
        assert_eq!(tables.lookup(byte).opcode(&cfg), "OR_");
    }
    assert_eq!(tables.special.get(0, 0).unwrap().opcode(&cfg), "or_");
    for ident in &tables.identifiers.opcodes {
        assert!(tables.identifiers.opcode_value(ident).is_some());
    }
}

#[test]
fn escaping_is_a_pure_function() {
    let cfg = TableConfig::default();
    assert_eq!(opcode_ident("int", &cfg), "int_");
    assert_eq!(opcode_ident("xor", &cfg), "xor_");
    assert_eq!(opcode_ident("not", &cfg), "not_");
    assert_eq!(opcode_ident("int3", &cfg), "int3");
    assert_eq!(opcode_ident("-", &cfg), UNKNOWN);

    let custom = TableConfig::from_json_str(r#"{ "reserved_mnemonics": ["mov"], "keyword_suffix": "Op" }"#)
        .unwrap();
    assert_eq!(opcode_ident("mov", &custom), "movOp");
    assert_eq!(opcode_ident("and", &custom), "and");
    assert_eq!(custom.baseline_category, "SingleByte");
}

#[test]
fn enum_values_start_after_unknown() {
    let tables = compile_text("mov 100010 RegMem_Reg\nadd 000000 RegMem_Reg", &[]);
    let ids = &tables.identifiers;
    assert_eq!(ids.opcode_value(UNKNOWN), Some(0));
    assert_eq!(ids.opcode_value("add"), Some(1));
    assert_eq!(ids.opcode_value("mov"), Some(2));
    assert_eq!(ids.opcode_value("jmp"), None);
    assert_eq!(ids.category_value("RegMem_Reg"), Some(1));
}

#[test]
fn fixture_identifier_counts() {
    let cfg = TableConfig::default();
    let text = std::fs::read_to_string("tests/data/i8086.spec").unwrap();
    let tables = compile(&parse_spec(&text, &cfg).unwrap(), &cfg).unwrap();
    assert_eq!(tables.identifiers.opcodes.len(), 93);
    assert_eq!(tables.identifiers.categories.len(), 28);
    for name in ["and_", "int_", "not_", "or_", "xor_", "int3", "segment"] {
        assert!(tables.identifiers.opcodes.iter().any(|o| o == name), "{name}");
    }
}
