//! Row transformation and the type conversion registry.
//!
//! Conversions are keyed by `(source tag, destination tag)`. Lookup tries the
//! exact pair, then the source tag with a [`WILDCARD`] destination, and falls
//! back to [`identity`]. Every rule shipped today is an identity; the registry
//! is where value reformatting (date normalization, numeric formatting) plugs
//! in.

use std::{borrow::Cow, collections::HashMap};

use log::debug;

use crate::{
    error::{ConvertError, Result},
    resolve::HeaderIndex,
    schema::{MappingSchema, TypeTag},
};

pub const WILDCARD: &str = "*";

pub type Conversion = for<'a> fn(&'a str) -> Cow<'a, str>;

pub fn identity(value: &str) -> Cow<'_, str> {
    Cow::Borrowed(value)
}

#[derive(Debug, Clone)]
pub struct ConversionRegistry {
    rules: HashMap<(String, String), Conversion>,
}

impl Default for ConversionRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("int", "BIGINT", identity);
        registry.register("int", "VARCHAR", identity);
        registry.register("nvarchar", WILDCARD, identity);
        registry.register("varchar", WILDCARD, identity);
        registry.register("datetime", WILDCARD, identity);
        registry
    }
}

impl ConversionRegistry {
    /// A registry with no rules; every pair resolves to [`identity`].
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Adds or replaces the rule for a tag pair. Use [`WILDCARD`] as the
    /// destination to match any destination tag.
    pub fn register(&mut self, from: &str, to: &str, conversion: Conversion) -> &mut Self {
        self.rules
            .insert((normalize_tag(from), normalize_tag(to)), conversion);
        self
    }

    pub fn lookup(&self, from: &TypeTag, to: &TypeTag) -> Conversion {
        let from = from.key();
        self.rules
            .get(&(from.clone(), to.key()))
            .or_else(|| self.rules.get(&(from, WILDCARD.to_string())))
            .copied()
            .unwrap_or(identity)
    }

    pub fn convert<'a>(&self, value: &'a str, from: &TypeTag, to: &TypeTag) -> Cow<'a, str> {
        (self.lookup(from, to))(value)
    }
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().to_ascii_lowercase()
}

#[derive(Debug, Clone)]
struct ColumnPlan {
    source: String,
    position: usize,
    conversion: Conversion,
}

/// Per-row projection of the mapped columns, with conversions resolved once.
#[derive(Debug, Clone)]
pub struct RowTransformer {
    plan: Vec<ColumnPlan>,
}

impl RowTransformer {
    /// Fails if any mapped source column is absent from the header.
    pub fn new(
        schema: &MappingSchema,
        index: &HeaderIndex,
        registry: &ConversionRegistry,
    ) -> Result<Self> {
        let positions = index.resolve(schema)?;
        let plan = schema
            .entries
            .iter()
            .zip(positions)
            .map(|(entry, position)| {
                debug!(
                    "Column '{}' ({}) at position {} -> '{}' ({})",
                    entry.column_from, entry.type_from, position, entry.column_to, entry.type_to
                );
                ColumnPlan {
                    source: entry.column_from.clone(),
                    position,
                    conversion: registry.lookup(&entry.type_from, &entry.type_to),
                }
            })
            .collect();
        Ok(Self { plan })
    }

    pub fn transform<'a>(&self, row: &'a [String]) -> Result<Vec<Cow<'a, str>>> {
        self.plan
            .iter()
            .map(|column| {
                let value = row
                    .get(column.position)
                    .ok_or_else(|| ConvertError::ShortRow {
                        column: column.source.clone(),
                        position: column.position,
                        len: row.len(),
                    })?;
                Ok((column.conversion)(value))
            })
            .collect()
    }
}
