//! Row and value materialization from the wire client

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::driver::{DriverError, DriverResult, ERR_UNKNOWN};
use crate::row::Row;
use crate::value::Value;

/// Convert a `mysql_async` row into the core row representation, keeping
/// server column order.
pub(crate) fn materialize_row(row: mysql_async::Row) -> DriverResult<Row> {
    let columns = row.columns_ref();
    let mut names = Vec::with_capacity(columns.len());
    let mut values = Vec::with_capacity(columns.len());

    for (i, column) in columns.iter().enumerate() {
        let name = column.name_str().to_string();
        let raw = row
            .as_ref(i)
            .ok_or_else(|| DriverError::new(ERR_UNKNOWN, format!("missing column {name}")))?
            .clone();
        values.push(from_mysql_value(raw)?);
        names.push(name);
    }

    Ok(Row::new(names, values))
}

/// Convert a `mysql_async` scalar into the core [`Value`].
pub(crate) fn from_mysql_value(value: mysql_async::Value) -> DriverResult<Value> {
    use mysql_async::Value as MySqlValue;

    match value {
        MySqlValue::NULL => Ok(Value::Null),
        MySqlValue::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Ok(Value::String(text)),
            Err(err) => Ok(Value::Bytes(err.into_bytes())),
        },
        MySqlValue::Int(v) => Ok(Value::I64(v)),
        MySqlValue::UInt(v) => Ok(Value::U64(v)),
        MySqlValue::Float(v) => Ok(Value::F32(v)),
        MySqlValue::Double(v) => Ok(Value::F64(v)),
        MySqlValue::Date(year, month, day, hour, min, sec, micro) => {
            let date = NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
                .ok_or_else(|| {
                    DriverError::new(ERR_UNKNOWN, format!("invalid date {year}-{month}-{day}"))
                })?;
            if hour == 0 && min == 0 && sec == 0 && micro == 0 {
                return Ok(Value::Date(date));
            }
            let time = NaiveTime::from_hms_micro_opt(
                u32::from(hour),
                u32::from(min),
                u32::from(sec),
                micro,
            )
            .ok_or_else(|| {
                DriverError::new(ERR_UNKNOWN, format!("invalid time {hour}:{min}:{sec}.{micro}"))
            })?;
            Ok(Value::DateTime(NaiveDateTime::new(date, time)))
        }
        MySqlValue::Time(is_neg, days, hours, mins, secs, micro) => {
            // The core Time scalar covers the 00:00:00..=23:59:59 range only.
            if is_neg || days > 0 || hours >= 24 {
                return Err(DriverError::new(
                    ERR_UNKNOWN,
                    format!("time value outside supported range: {days}d {hours}:{mins}:{secs}"),
                ));
            }
            let time = NaiveTime::from_hms_micro_opt(
                u32::from(hours),
                u32::from(mins),
                u32::from(secs),
                micro,
            )
            .ok_or_else(|| {
                DriverError::new(
                    ERR_UNKNOWN,
                    format!("invalid time {hours}:{mins}:{secs}.{micro}"),
                )
            })?;
            Ok(Value::Time(time))
        }
    }
}
