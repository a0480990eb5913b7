//! Query building and escaping
//!
//! Pure SQL text construction, independent of any live connection except for
//! the byte-escaping capability it borrows through [`Escaper`]. Structured
//! intents go in, SQL strings come out; structurally invalid input is
//! rejected with a typed [`BuilderError`](crate::error::BuilderError) before
//! any SQL is emitted.

mod escape;
mod where_clause;
mod write;

pub use escape::{format_arg, format_value};
pub use where_clause::WhereClause;
pub use write::{
    build_delete, build_insert, build_insert_many, build_replace_many, build_select,
    build_update, build_update_many_case, build_upsert_many, CaseWhen,
};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use crate::value::Value;

/// A literal SQL fragment emitted verbatim by the builder, bypassing
/// escaping and quoting entirely. The caller takes responsibility for its
/// contents.
///
/// ```
/// use remysql::Expression;
///
/// let now = Expression::new("NOW()");
/// assert_eq!(now.as_str(), "NOW()");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression(String);

impl Expression {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A builder input: either a value routed through the escaping policy or a
/// raw expression emitted verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlArg {
    Value(Value),
    Expr(Expression),
}

impl From<Value> for SqlArg {
    fn from(v: Value) -> Self {
        SqlArg::Value(v)
    }
}

impl From<Expression> for SqlArg {
    fn from(e: Expression) -> Self {
        SqlArg::Expr(e)
    }
}

impl From<bool> for SqlArg {
    fn from(v: bool) -> Self {
        SqlArg::Value(Value::from(v))
    }
}

impl From<i32> for SqlArg {
    fn from(v: i32) -> Self {
        SqlArg::Value(Value::from(v))
    }
}

impl From<i64> for SqlArg {
    fn from(v: i64) -> Self {
        SqlArg::Value(Value::from(v))
    }
}

impl From<u32> for SqlArg {
    fn from(v: u32) -> Self {
        SqlArg::Value(Value::from(v))
    }
}

impl From<u64> for SqlArg {
    fn from(v: u64) -> Self {
        SqlArg::Value(Value::from(v))
    }
}

impl From<f32> for SqlArg {
    fn from(v: f32) -> Self {
        SqlArg::Value(Value::from(v))
    }
}

impl From<f64> for SqlArg {
    fn from(v: f64) -> Self {
        SqlArg::Value(Value::from(v))
    }
}

impl From<&str> for SqlArg {
    fn from(v: &str) -> Self {
        SqlArg::Value(Value::from(v))
    }
}

impl From<String> for SqlArg {
    fn from(v: String) -> Self {
        SqlArg::Value(Value::from(v))
    }
}

impl From<Vec<u8>> for SqlArg {
    fn from(v: Vec<u8>) -> Self {
        SqlArg::Value(Value::from(v))
    }
}

impl From<NaiveDate> for SqlArg {
    fn from(v: NaiveDate) -> Self {
        SqlArg::Value(Value::from(v))
    }
}

impl From<NaiveDateTime> for SqlArg {
    fn from(v: NaiveDateTime) -> Self {
        SqlArg::Value(Value::from(v))
    }
}

impl From<NaiveTime> for SqlArg {
    fn from(v: NaiveTime) -> Self {
        SqlArg::Value(Value::from(v))
    }
}

impl From<Decimal> for SqlArg {
    fn from(v: Decimal) -> Self {
        SqlArg::Value(Value::from(v))
    }
}

impl<T> From<Option<T>> for SqlArg
where
    T: Into<SqlArg>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => SqlArg::Value(Value::Null),
        }
    }
}
