//! Shared I/O helpers: delimiter resolution, text encodings, and csv reader
//! construction.
//!
//! - **Delimiter resolution**: extension-based auto-detection (`.tsv` → tab,
//!   anything else → comma) with manual override support.
//! - **Encoding**: input decoding and output encoding via `encoding_rs`,
//!   defaulting to UTF-8.
//! - **stdin/stdout**: the `-` path convention routes through standard streams.

use std::{io::Read, path::Path};

use encoding_rs::{Encoding, UTF_8};

use crate::error::{ConvertError, Result};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    match label {
        Some(value) => Encoding::for_label(value.trim().as_bytes()).ok_or_else(|| {
            ConvertError::UnknownEncoding {
                label: value.to_string(),
            }
        }),
        None => Ok(UTF_8),
    }
}

/// The csv reader splits raw bytes on ASCII delimiters, so the input
/// encoding must map ASCII bytes to ASCII characters.
pub fn resolve_input_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    let encoding = resolve_encoding(label)?;
    if !encoding.is_ascii_compatible() {
        return Err(ConvertError::UnsupportedEncoding {
            label: encoding.name().to_string(),
            direction: "input",
            reason: "delimiters require an ASCII-compatible encoding",
        });
    }
    Ok(encoding)
}

/// Rejects encodings that `encoding_rs` only decodes (UTF-16, replacement);
/// encoding to them would silently produce UTF-8.
pub fn resolve_output_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    let encoding = resolve_encoding(label)?;
    if encoding.output_encoding() != encoding {
        return Err(ConvertError::UnsupportedEncoding {
            label: encoding.name().to_string(),
            direction: "output",
            reason: "encoder writes a different encoding",
        });
    }
    Ok(encoding)
}

pub fn resolve_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

/// Builds a headerless csv reader. Header handling is left to the caller so
/// the first record can be read explicitly.
pub fn open_csv_reader<R>(reader: R, delimiter: u8, flexible: bool) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(flexible);
    builder.from_reader(reader)
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Option<String> {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        None
    } else {
        Some(text.into_owned())
    }
}

pub fn decode_record(
    record: &csv::ByteRecord,
    encoding: &'static Encoding,
) -> std::result::Result<Vec<String>, String> {
    record
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            decode_bytes(field, encoding).ok_or_else(|| {
                format!(
                    "field {} is not valid {} text",
                    idx + 1,
                    encoding.name()
                )
            })
        })
        .collect()
}

/// Encodes generated text for the destination. Characters the target
/// encoding cannot represent are an error rather than silently replaced.
pub fn encode_text(text: &str, encoding: &'static Encoding) -> std::io::Result<Vec<u8>> {
    if encoding == UTF_8 {
        return Ok(text.as_bytes().to_vec());
    }
    let (encoded, output_encoding, had_errors) = encoding.encode(text);
    if output_encoding != encoding {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!(
                "Cannot encode text as {}; encoder produces {}",
                encoding.name(),
                output_encoding.name()
            ),
        ));
    }
    if had_errors {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Failed to encode text using {}", encoding.name()),
        ));
    }
    Ok(encoded.into_owned())
}
