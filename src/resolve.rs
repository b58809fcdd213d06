//! Header name to column position lookup.

use std::collections::HashMap;

use crate::{
    error::{ConvertError, Result},
    schema::MappingSchema,
};

#[derive(Debug, Clone, Default)]
pub struct HeaderIndex {
    positions: HashMap<String, usize>,
}

impl HeaderIndex {
    /// Later occurrences of a repeated header name replace earlier ones.
    pub fn from_headers(headers: &[String]) -> Self {
        let positions = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();
        Self { positions }
    }

    pub fn position(&self, name: &str) -> Result<usize> {
        self.positions
            .get(name)
            .copied()
            .ok_or_else(|| ConvertError::MissingColumn {
                column: name.to_string(),
            })
    }

    /// Positions for every mapping entry, in schema order. All absent source
    /// columns are reported together.
    pub fn resolve(&self, schema: &MappingSchema) -> Result<Vec<usize>> {
        let mut positions = Vec::with_capacity(schema.entries.len());
        let mut missing: Vec<String> = Vec::new();
        for entry in &schema.entries {
            match self.position(&entry.column_from) {
                Ok(idx) => positions.push(idx),
                Err(ConvertError::MissingColumn { column }) => {
                    if !missing.contains(&column) {
                        missing.push(column);
                    }
                }
                Err(other) => return Err(other),
            }
        }
        if missing.is_empty() {
            Ok(positions)
        } else {
            Err(ConvertError::MissingColumns { columns: missing })
        }
    }
}
