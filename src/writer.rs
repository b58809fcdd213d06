//! Output destination for the generated statement.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use encoding_rs::Encoding;

use crate::io_utils;

pub const OUTPUT_EXTENSION: &str = "SQL";

/// `<table>.SQL` in the working directory.
pub fn default_output_path(table: &str) -> PathBuf {
    PathBuf::from(format!("{table}.{OUTPUT_EXTENSION}"))
}

/// Writes `text` in one call, replacing any existing file. `-` targets stdout.
pub fn write_output(path: &Path, text: &str, encoding: &'static Encoding) -> Result<()> {
    let bytes = io_utils::encode_text(text, encoding)
        .with_context(|| format!("Encoding output for {path:?}"))?;
    if io_utils::is_dash(path) {
        let mut stdout = io::stdout().lock();
        stdout.write_all(&bytes).context("Writing output to stdout")?;
        stdout.flush().context("Flushing stdout")?;
    } else {
        fs::write(path, bytes).with_context(|| format!("Writing output file {path:?}"))?;
    }
    Ok(())
}
