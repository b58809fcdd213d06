use std::path::PathBuf;

use clap::Parser;

pub const USAGE: &str = "usage: convert [table name] [input file name] [schema info CSV file name]";

#[derive(Debug, Parser)]
#[command(
    name = "convert",
    author,
    version,
    about = "Convert a delimited file into a multi-row SQL INSERT statement",
    long_about = None
)]
pub struct ConvertArgs {
    /// Destination table name (also names the `<table>.SQL` output file)
    pub table_name: String,
    /// Delimited input file whose first record is the header (`-` for stdin)
    pub input: PathBuf,
    /// Headerless mapping file: source column, source type, destination column, destination type
    pub schema: PathBuf,
    /// Output file (defaults to `<table>.SQL`, `-` for stdout)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Input delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Mapping file delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long = "schema-delimiter", value_parser = parse_delimiter)]
    pub schema_delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Character encoding of the generated SQL (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
