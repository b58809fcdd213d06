//! The conversion pipeline: mapping, decoded input, resolution, row stream,
//! statement, output.
//!
//! The whole statement is held in memory until the single write at the end.
//! Nothing is written when any step before that fails.

use std::io::Read;

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::{info, warn};

use crate::{
    cli::ConvertArgs,
    decode::DecodedInput,
    error::ConvertError,
    io_utils,
    resolve::HeaderIndex,
    schema::MappingSchema,
    sql::InsertStatement,
    transform::{ConversionRegistry, RowTransformer},
    writer,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionSummary {
    pub rows_emitted: usize,
    pub rows_skipped: usize,
    pub had_bom: bool,
}

#[derive(Debug, Clone)]
pub struct ConvertedOutput {
    pub sql: String,
    pub summary: ConversionSummary,
}

pub fn execute(args: &ConvertArgs) -> Result<()> {
    let input_encoding = io_utils::resolve_input_encoding(args.input_encoding.as_deref())?;
    let output_encoding = io_utils::resolve_output_encoding(args.output_encoding.as_deref())?;
    let input_delimiter = io_utils::resolve_delimiter(&args.input, args.delimiter);
    let schema_delimiter = io_utils::resolve_delimiter(&args.schema, args.schema_delimiter);
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| writer::default_output_path(&args.table_name));
    info!(
        "Converting '{}' into table '{}' with mapping '{}' (delimiter '{}')",
        args.input.display(),
        args.table_name,
        args.schema.display(),
        crate::printable_delimiter(input_delimiter)
    );

    let schema = MappingSchema::load(&args.schema, schema_delimiter)
        .with_context(|| format!("Loading mapping from {:?}", args.schema))?;
    info!("Loaded {} column mapping(s)", schema.entries.len());

    let input = DecodedInput::open(&args.input, input_delimiter, input_encoding)
        .with_context(|| format!("Opening input {:?}", args.input))?;
    let output = convert_input(
        &args.table_name,
        &schema,
        input,
        &ConversionRegistry::default(),
    )
    .with_context(|| format!("Converting rows from {:?}", args.input))?;
    info!(
        "Generated {} row(s); skipped {} malformed row(s)",
        output.summary.rows_emitted, output.summary.rows_skipped
    );

    writer::write_output(&output_path, &output.sql, output_encoding)?;
    if io_utils::is_dash(&output_path) {
        info!("SQL written to stdout");
    } else {
        println!(
            "SQL file {} has been generated successfully.",
            output_path.display()
        );
    }
    Ok(())
}

/// Converts an in-memory or streamed source without touching the filesystem.
pub fn convert_reader<R: Read>(
    table: &str,
    schema: &MappingSchema,
    source: R,
    delimiter: u8,
    encoding: &'static Encoding,
    registry: &ConversionRegistry,
) -> crate::error::Result<ConvertedOutput> {
    let input = DecodedInput::from_reader(source, delimiter, encoding)?;
    convert_input(table, schema, input, registry)
}

/// Streams every data row of `input` into one INSERT statement. Malformed
/// rows are logged and left out; missing source columns fail before any row
/// is read.
pub fn convert_input<R: Read>(
    table: &str,
    schema: &MappingSchema,
    mut input: DecodedInput<R>,
    registry: &ConversionRegistry,
) -> crate::error::Result<ConvertedOutput> {
    let index = HeaderIndex::from_headers(input.headers());
    let transformer = RowTransformer::new(schema, &index, registry)?;
    let mut statement = InsertStatement::new(table, schema.destination_columns());
    let mut rows_skipped = 0;

    for (ordinal, row) in input.rows().enumerate() {
        let fields = match row {
            Ok(fields) => fields,
            Err(err @ ConvertError::RowParse { .. }) => {
                warn!("Skipping malformed {err}");
                rows_skipped += 1;
                continue;
            }
            Err(err) => return Err(err),
        };
        match transformer.transform(&fields) {
            Ok(values) => statement.push_row(values),
            Err(err) => {
                warn!("Skipping malformed row {}: {err}", ordinal + 1);
                rows_skipped += 1;
            }
        }
    }

    let summary = ConversionSummary {
        rows_emitted: statement.row_count(),
        rows_skipped,
        had_bom: input.had_bom(),
    };
    Ok(ConvertedOutput {
        sql: statement.finish(),
        summary,
    })
}
