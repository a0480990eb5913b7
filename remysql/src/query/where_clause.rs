//! WHERE clause construction
//!
//! Field conditions combine with `AND` only; no nested boolean trees.
//! NULL handling follows SQL three-valued logic: equality against NULL
//! becomes `IS NULL`, and an `IN` set containing NULL expands so rows with
//! a NULL column still match.

use crate::driver::Escaper;
use crate::error::BuilderError;
use crate::query::escape::format_arg;
use crate::query::SqlArg;
use crate::value::Value;

#[derive(Debug, Clone)]
enum Condition {
    Compare {
        column: String,
        value: SqlArg,
        negated: bool,
    },
    InSet {
        column: String,
        values: Vec<SqlArg>,
        negated: bool,
    },
    Pattern {
        column: String,
        pattern: String,
        negated: bool,
    },
}

/// Builder for `AND`-joined field conditions.
///
/// ```
/// use remysql::{DefaultEscaper, WhereClause};
///
/// let clause = WhereClause::new()
///     .eq("status", "active")
///     .is_in("id", [1i64, 2, 3])
///     .build(&DefaultEscaper)
///     .unwrap();
/// assert_eq!(clause, "status = 'active' AND id IN (1,2,3)");
/// ```
#[derive(Debug, Clone, Default)]
pub struct WhereClause {
    conditions: Vec<Condition>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Equality; a NULL value becomes `IS NULL`.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<SqlArg>) -> Self {
        self.conditions.push(Condition::Compare {
            column: column.into(),
            value: value.into(),
            negated: false,
        });
        self
    }

    /// Negated equality; a NULL value becomes `IS NOT NULL`.
    pub fn ne(mut self, column: impl Into<String>, value: impl Into<SqlArg>) -> Self {
        self.conditions.push(Condition::Compare {
            column: column.into(),
            value: value.into(),
            negated: true,
        });
        self
    }

    /// Membership in a set of alternatives.
    pub fn is_in<I, V>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlArg>,
    {
        self.conditions.push(Condition::InSet {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
            negated: false,
        });
        self
    }

    /// Exclusion from a set of alternatives.
    pub fn not_in<I, V>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlArg>,
    {
        self.conditions.push(Condition::InSet {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
            negated: true,
        });
        self
    }

    /// Pattern match for fields explicitly treated as pattern fields.
    pub fn like(mut self, column: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.conditions.push(Condition::Pattern {
            column: column.into(),
            pattern: pattern.into(),
            negated: false,
        });
        self
    }

    /// Negated pattern match.
    pub fn not_like(mut self, column: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.conditions.push(Condition::Pattern {
            column: column.into(),
            pattern: pattern.into(),
            negated: true,
        });
        self
    }

    /// Emit the clause text, without the leading `WHERE` keyword. An empty
    /// builder produces an empty string; callers omit the keyword then.
    pub fn build(&self, escaper: &dyn Escaper) -> Result<String, BuilderError> {
        let mut parts = Vec::with_capacity(self.conditions.len());
        for condition in &self.conditions {
            parts.push(condition.emit(escaper)?);
        }
        Ok(parts.join(" AND "))
    }
}

impl Condition {
    fn emit(&self, escaper: &dyn Escaper) -> Result<String, BuilderError> {
        match self {
            Condition::Compare {
                column,
                value,
                negated,
            } => {
                if matches!(value, SqlArg::Value(Value::Null)) {
                    let op = if *negated { "IS NOT NULL" } else { "IS NULL" };
                    return Ok(format!("{column} {op}"));
                }
                let op = if *negated { "!=" } else { "=" };
                Ok(format!("{column} {op} {}", format_arg(escaper, value)?))
            }
            Condition::InSet {
                column,
                values,
                negated,
            } => emit_in_set(escaper, column, values, *negated),
            Condition::Pattern {
                column,
                pattern,
                negated,
            } => {
                let op = if *negated { "NOT LIKE" } else { "LIKE" };
                let literal = format_arg(escaper, &SqlArg::from(pattern.as_str()))?;
                Ok(format!("{column} {op} {literal}"))
            }
        }
    }
}

fn emit_in_set(
    escaper: &dyn Escaper,
    column: &str,
    values: &[SqlArg],
    negated: bool,
) -> Result<String, BuilderError> {
    if values.is_empty() {
        return Err(BuilderError::EmptyInSet {
            column: column.to_string(),
        });
    }

    let mut literals = Vec::with_capacity(values.len());
    let mut has_null = false;
    for value in values {
        if matches!(value, SqlArg::Value(Value::Null)) {
            has_null = true;
        } else {
            literals.push(format_arg(escaper, value)?);
        }
    }

    if literals.is_empty() {
        // Only NULL alternatives were given.
        let op = if negated { "IS NOT NULL" } else { "IS NULL" };
        return Ok(format!("{column} {op}"));
    }

    let set = literals.join(",");
    Ok(match (negated, has_null) {
        (false, false) => format!("{column} IN ({set})"),
        // NULL never matches IN; spell the intent out explicitly.
        (false, true) => format!("({column} IN ({set}) OR {column} IS NULL)"),
        (true, false) => format!("{column} NOT IN ({set})"),
        (true, true) => format!("({column} NOT IN ({set}) AND {column} IS NOT NULL)"),
    })
}
