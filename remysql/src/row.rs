//! Result row representation
//!
//! A row keeps its columns in server order and exposes name-based access to
//! nullable scalars. Rows are ephemeral: they live only as long as the
//! [`CommandResult`](crate::CommandResult) that produced them.

use std::collections::HashMap;

use crate::value::Value;

/// One result row: ordered column names plus a name-keyed value map.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: HashMap<String, Value>,
}

impl Row {
    /// Build a row from parallel column/value sequences. Columns keep their
    /// server-reported order.
    pub fn new(columns: Vec<String>, row_values: Vec<Value>) -> Self {
        let values = columns
            .iter()
            .cloned()
            .zip(row_values)
            .collect::<HashMap<_, _>>();
        Self { columns, values }
    }

    /// Column names in server order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Value of a column; `None` means the column does not exist,
    /// `Some(Value::Null)` means SQL NULL.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_ordered_columns_and_lookup() {
        let row = Row::new(
            vec!["id".to_string(), "name".to_string()],
            vec![Value::I64(7), Value::Null],
        );
        assert_eq!(row.columns(), ["id", "name"]);
        assert_eq!(row.get("id"), Some(&Value::I64(7)));
        assert_eq!(row.get("name"), Some(&Value::Null));
        assert_eq!(row.get("missing"), None);
    }
}
