//! Bit-pattern expansion.
//!
//! A pattern is a prefix of the opcode byte written MSB first. Missing low
//! bits are operand fields (direction, width, register) and match anything.
//! The only interior wildcard is `--`, a two-bit segment-register field.

use std::ops::RangeInclusive;

use crate::error::PatternError;

pub const BYTE_BITS: usize = 8;
pub const SEGMENT_WILDCARD: &str = "--";
/// Segment-register codes in substitution order: ES, SS, DS, CS.
pub const SEGMENT_CODES: [&str; 4] = ["00", "10", "11", "01"];
/// `pop sreg`. Code `01` would be `pop cs`, which is not a valid encoding.
pub const POP_SEGMENT_PATTERN: &str = "000--111";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Plain binary prefix.
    Prefix,
    /// Prefix with a `--` segment-register field.
    Segment,
}

/// The byte values one pattern matches: `1 << shift` consecutive slots from
/// each base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub kind: PatternKind,
    pub bases: Vec<u8>,
    pub shift: u32,
}

impl Expansion {
    pub fn span(&self) -> usize {
        1usize << self.shift
    }

    pub fn ranges(&self) -> impl Iterator<Item = RangeInclusive<u8>> + '_ {
        let last = (self.span() - 1) as u8;
        self.bases.iter().map(move |&base| base..=base + last)
    }

    pub fn slots(&self) -> impl Iterator<Item = u8> + '_ {
        self.ranges().flatten()
    }
}

pub fn expand(pattern: &str) -> Result<Expansion, PatternError> {
    let len = pattern.len();
    if len == 0 {
        return Err(PatternError::Empty);
    }
    if let Some((pos, ch)) = pattern
        .chars()
        .enumerate()
        .find(|(_, c)| !matches!(c, '0' | '1' | '-'))
    {
        return Err(PatternError::BadChar { ch, pos });
    }
    if len > BYTE_BITS {
        return Err(PatternError::TooLong { len });
    }
    let shift = (BYTE_BITS - len) as u32;

    if !pattern.contains('-') {
        return Ok(Expansion {
            kind: PatternKind::Prefix,
            bases: vec![prefix_value(pattern) << shift],
            shift,
        });
    }

    let at = pattern.find(SEGMENT_WILDCARD).ok_or(PatternError::StrayWildcard)?;
    let (head, tail) = (&pattern[..at], &pattern[at + SEGMENT_WILDCARD.len()..]);
    if head.contains('-') || tail.contains('-') {
        return Err(PatternError::StrayWildcard);
    }

    let codes = if pattern == POP_SEGMENT_PATTERN {
        &SEGMENT_CODES[..3]
    } else {
        &SEGMENT_CODES[..]
    };
    let bases = codes
        .iter()
        .map(|code| prefix_value(&format!("{head}{code}{tail}")) << shift)
        .collect();

    Ok(Expansion { kind: PatternKind::Segment, bases, shift })
}

// Caller guarantees at most 8 binary digits.
fn prefix_value(bits: &str) -> u8 {
    bits.bytes().fold(0u8, |acc, b| (acc << 1) | (b - b'0'))
}
