//! Multi-row INSERT statement builder.
//!
//! Output shape:
//!
//! ```text
//! INSERT INTO `table` (`col1`, `col2`)
//! VALUES
//! ('v1', 'v2'),
//! ('v1', 'v2');
//! ```
//!
//! Values are wrapped in single quotes verbatim. Embedded quotes are not
//! escaped, so the output is only as safe as its input.

use std::fmt::Write as _;

use itertools::Itertools;

#[derive(Debug, Clone)]
pub struct InsertStatement {
    buffer: String,
    rows: usize,
}

impl InsertStatement {
    pub fn new<'a, I>(table: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let column_list = columns
            .into_iter()
            .map(|column| format!("`{column}`"))
            .join(", ");
        let mut buffer = String::new();
        let _ = write!(buffer, "INSERT INTO `{table}` ({column_list})\nVALUES\n");
        Self { buffer, rows: 0 }
    }

    pub fn push_row<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.rows > 0 {
            self.buffer.push_str(",\n");
        }
        let tuple = values
            .into_iter()
            .format_with(", ", |value, f| f(&format_args!("'{}'", value.as_ref())));
        let _ = write!(self.buffer, "({tuple})");
        self.rows += 1;
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn finish(mut self) -> String {
        self.buffer.push_str(";\n");
        self.buffer
    }
}
