use std::path::PathBuf;

/// Shape problems in a single bit pattern.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("empty pattern")]
    Empty,
    #[error("pattern is {len} bits long, at most 8 allowed")]
    TooLong { len: usize },
    #[error("unexpected character {ch:?} at bit {pos}")]
    BadChar { ch: char, pos: usize },
    #[error("don't-care bits are only allowed as a single `--` segment-register field")]
    StrayWildcard,
}

/// Anything that aborts a compilation run.
#[derive(thiserror::Error, Debug)]
pub enum TableError {
    #[error("line {line}: malformed declaration `{text}`: {reason}")]
    MalformedLine {
        line: usize,
        text: String,
        reason: &'static str,
    },
    #[error("line {line}: invalid aux index `{value}`")]
    BadAuxIndex {
        line: usize,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("line {line}: aux index {aux} of `{mnemonic}` is outside the {rows}-row special table")]
    AuxOutOfRange {
        line: usize,
        mnemonic: String,
        aux: i32,
        rows: usize,
    },
    #[error("line {line}: bad pattern `{pattern}` for `{mnemonic}`")]
    Pattern {
        line: usize,
        mnemonic: String,
        pattern: String,
        #[source]
        source: PatternError,
    },
    #[error("special section must hold exactly {expected} entries, found {found}")]
    GroupCount { expected: usize, found: usize },
    #[error("line {line}: `{name}` is not a valid identifier")]
    InvalidIdentifier { line: usize, name: String },
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config")]
    Config(#[source] serde_json::Error),
    #[error("failed to render JSON report")]
    Render(#[source] serde_json::Error),
}
