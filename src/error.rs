//! Error types for the conversion pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading the mapping, decoding the input, or resolving
/// and transforming rows.
#[derive(Debug, Error)]
pub enum ConvertError {
    // === Mapping file ===
    /// Mapping file could not be opened.
    #[error("failed to open schema file {path}: {source}")]
    SchemaOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Mapping record is not four well-formed fields.
    #[error("failed to read schema file {path} at line {line}: {message}")]
    SchemaParse {
        path: PathBuf,
        line: u64,
        message: String,
    },

    /// Mapping file defines no columns.
    #[error("schema file {path} does not define any columns")]
    EmptySchema { path: PathBuf },

    // === Input stream ===
    /// Input file could not be opened.
    #[error("failed to open input file {path}: {source}")]
    InputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Leading bytes could not be read while checking for a byte-order mark.
    #[error("failed to read first 3 bytes of input: {source}")]
    BomPeek {
        #[source]
        source: std::io::Error,
    },

    /// Header record missing or unreadable.
    #[error("failed to read headers from input: {message}")]
    HeaderParse { message: String },

    /// Unknown encoding label supplied on the command line.
    #[error("unknown encoding '{label}'")]
    UnknownEncoding { label: String },

    /// Encoding cannot be used in the requested direction.
    #[error("encoding '{label}' cannot be used for {direction}: {reason}")]
    UnsupportedEncoding {
        label: String,
        direction: &'static str,
        reason: &'static str,
    },

    /// Input stream failed mid-read.
    #[error("failed to read input at row {row}: {message}")]
    InputRead { row: u64, message: String },

    // === Column resolution ===
    /// A single source column is absent from the input header.
    #[error("source column '{column}' not found in input header")]
    MissingColumn { column: String },

    /// One or more mapped source columns are absent from the input header.
    #[error("source column(s) not found in input header: {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    // === Rows ===
    /// Data row could not be split into fields or decoded.
    #[error("row {row} (line {line}): {message}")]
    RowParse { row: u64, line: u64, message: String },

    /// Data row is shorter than a resolved column position.
    #[error("row has {len} field(s) but column '{column}' is at position {position}")]
    ShortRow {
        column: String,
        position: usize,
        len: usize,
    },
}

pub type Result<T> = std::result::Result<T, ConvertError>;
