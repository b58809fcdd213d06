//! Column mapping model and loader.
//!
//! A mapping file has no header row. Each record carries four fields:
//! source column, source type tag, destination column, destination type tag.
//! Record order is the output column order.

use std::{
    collections::HashSet,
    fmt,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConvertError, Result},
    io_utils,
};

/// Type tag as written in the mapping file. Comparisons ignore ASCII case.
#[derive(Debug, Clone, Serialize, Deserialize, Eq)]
#[serde(transparent)]
pub struct TypeTag(String);

impl TypeTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Lowercased form used as a registry key.
    pub fn key(&self) -> String {
        self.0.trim().to_ascii_lowercase()
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.0.trim().eq_ignore_ascii_case(other.0.trim())
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaEntry {
    pub column_from: String,
    pub type_from: TypeTag,
    pub column_to: String,
    pub type_to: TypeTag,
}

impl SchemaEntry {
    pub fn new(column_from: &str, type_from: &str, column_to: &str, type_to: &str) -> Self {
        Self {
            column_from: column_from.to_string(),
            type_from: TypeTag::new(type_from),
            column_to: column_to.to_string(),
            type_to: TypeTag::new(type_to),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MappingSchema {
    pub entries: Vec<SchemaEntry>,
}

impl MappingSchema {
    pub fn new(entries: Vec<SchemaEntry>) -> Self {
        Self { entries }
    }

    pub fn load(path: &Path, delimiter: u8) -> Result<Self> {
        let file = File::open(path).map_err(|source| ConvertError::SchemaOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let schema = Self::from_reader(BufReader::new(file), delimiter, path)?;
        debug!(
            "Loaded {} mapping(s) from {:?}",
            schema.entries.len(),
            path
        );
        Ok(schema)
    }

    /// Parses mapping records from any reader. `origin` only labels errors.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8, origin: &Path) -> Result<Self> {
        let mut reader = io_utils::open_csv_reader(reader, delimiter, true);
        let mut entries = Vec::new();
        let mut record = csv::StringRecord::new();
        loop {
            let has_record =
                reader
                    .read_record(&mut record)
                    .map_err(|err| ConvertError::SchemaParse {
                        path: origin.to_path_buf(),
                        line: err.position().map(|p| p.line()).unwrap_or(0),
                        message: err.to_string(),
                    })?;
            if !has_record {
                break;
            }
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            if record.len() != 4 {
                return Err(ConvertError::SchemaParse {
                    path: origin.to_path_buf(),
                    line,
                    message: format!("expected 4 fields, found {}", record.len()),
                });
            }
            let entry: SchemaEntry =
                record
                    .deserialize(None)
                    .map_err(|err| ConvertError::SchemaParse {
                        path: origin.to_path_buf(),
                        line,
                        message: err.to_string(),
                    })?;
            entries.push(entry);
        }

        if entries.is_empty() {
            return Err(ConvertError::EmptySchema {
                path: origin.to_path_buf(),
            });
        }

        let schema = Self::new(entries);
        for name in schema.duplicate_destinations() {
            warn!("Destination column '{name}' is mapped more than once");
        }
        Ok(schema)
    }

    pub fn destination_columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.column_to.as_str())
    }

    /// Destination names that appear more than once, in first-repeat order.
    pub fn duplicate_destinations(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let mut duplicates = Vec::new();
        for name in self.destination_columns() {
            if !seen.insert(name) && reported.insert(name) {
                duplicates.push(name);
            }
        }
        duplicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<MappingSchema> {
        MappingSchema::from_reader(text.as_bytes(), b',', Path::new("mapping.csv"))
    }

    #[test]
    fn loads_records_in_file_order() {
        let schema = parse("id,int,user_id,BIGINT\nname,varchar,full_name,VARCHAR\n").unwrap();
        assert_eq!(
            schema.entries,
            vec![
                SchemaEntry::new("id", "int", "user_id", "BIGINT"),
                SchemaEntry::new("name", "varchar", "full_name", "VARCHAR"),
            ]
        );
    }

    #[test]
    fn first_record_is_data_not_header() {
        let schema = parse("column_from,type_from,column_to,type_to\n").unwrap();
        assert_eq!(schema.entries.len(), 1);
        assert_eq!(schema.entries[0].column_from, "column_from");
    }

    #[test]
    fn short_record_is_fatal_with_line_number() {
        let err = parse("id,int,user_id,BIGINT\nname,varchar,full_name\n").unwrap_err();
        match err {
            ConvertError::SchemaParse { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("expected 4 fields"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_mapping_is_rejected() {
        assert!(matches!(parse(""), Err(ConvertError::EmptySchema { .. })));
    }

    #[test]
    fn missing_file_reports_open_error() {
        let err = MappingSchema::load(Path::new("does/not/exist.csv"), b',').unwrap_err();
        assert!(matches!(err, ConvertError::SchemaOpen { .. }));
    }

    #[test]
    fn duplicate_destinations_are_reported_once() {
        let schema = parse("a,int,x,INT\nb,int,y,INT\nc,int,x,INT\nd,int,x,INT\n").unwrap();
        assert_eq!(schema.duplicate_destinations(), vec!["x"]);
    }

    #[test]
    fn type_tags_compare_case_insensitively() {
        assert_eq!(TypeTag::new("BIGINT"), TypeTag::new("bigint"));
        assert_eq!(TypeTag::new(" Int ").key(), "int");
    }

    #[test]
    fn tab_delimited_mapping() {
        let schema = MappingSchema::from_reader(
            "id\tint\tuser_id\tBIGINT\n".as_bytes(),
            b'\t',
            Path::new("mapping.tsv"),
        )
        .unwrap();
        assert_eq!(schema.entries[0].column_to, "user_id");
    }
}
