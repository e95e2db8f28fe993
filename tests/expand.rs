use i8086_tables::pattern::{expand, PatternKind, POP_SEGMENT_PATTERN};
use i8086_tables::table::OpcodeTableBuilder;
use i8086_tables::{Declaration, TableError};

fn decl(line: usize, mnemonic: &str, pattern: &str) -> Declaration {
    Declaration {
        line,
        mnemonic: mnemonic.into(),
        pattern: pattern.into(),
        category: "SingleByte".into(),
        aux_index: -1,
    }
}

#[test]
fn prefix_patterns_fill_exactly_their_block() {
    // every prefix length, a few prefixes each
    for len in 1..=8usize {
        let shift = 8 - len;
        for prefix in [0u32, 1, (1 << len) - 1, (1 << len) / 2] {
            let pattern = format!("{prefix:0len$b}");
            let base = (prefix << shift) as usize;
            let end = base + (1 << shift) - 1;

            let mut b = OpcodeTableBuilder::new();
            b.add(&decl(1, "op", &pattern)).unwrap();
            let (table, _) = b.finish();

            for (byte, e) in table.iter() {
                let inside = (base..=end).contains(&(byte as usize));
                assert_eq!(e.mnemonic == "op", inside, "pattern {pattern} byte {byte:#04x}");
                assert_eq!(table.is_resolved(byte), inside);
            }
        }
    }
}

#[test]
fn segment_patterns_yield_four_bases_except_pop() {
    for pattern in ["000--110", "001--110", "000--11", "1--0"] {
        let e = expand(pattern).unwrap();
        assert_eq!(e.kind, PatternKind::Segment);
        let mut bases = e.bases.clone();
        bases.sort_unstable();
        bases.dedup();
        assert_eq!(bases.len(), 4, "{pattern}");
    }
    let pop = expand(POP_SEGMENT_PATTERN).unwrap();
    assert_eq!(pop.bases.len(), 3);
}

#[test]
fn pop_segment_leaves_cs_slot_unknown() {
    let mut b = OpcodeTableBuilder::new();
    b.add(&decl(1, "pop", "000--111")).unwrap();
    let (table, overlaps) = b.finish();

    let popped: Vec<u8> = table
        .iter()
        .filter(|(_, e)| e.mnemonic == "pop")
        .map(|(byte, _)| byte)
        .collect();
    assert_eq!(popped, vec![0x07, 0x17, 0x1F]);
    assert!(!table.is_resolved(0x0F));
    assert_eq!(table.get(0x0F).mnemonic, "Unknown");
    assert!(overlaps.is_empty());
}

#[test]
fn bad_pattern_names_the_declaration() {
    let mut b = OpcodeTableBuilder::new();
    let err = b.add(&decl(12, "mov", "10-010")).unwrap_err();
    match err {
        TableError::Pattern { line, mnemonic, pattern, .. } => {
            assert_eq!(line, 12);
            assert_eq!(mnemonic, "mov");
            assert_eq!(pattern, "10-010");
        }
        other => panic!("unexpected error: {other}"),
    }
}
