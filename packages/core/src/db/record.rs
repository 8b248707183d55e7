//! Generic Row Records
//!
//! Fetched rows are surfaced to callers as column-name keyed JSON maps so
//! the engine stays agnostic to the managed table's shape. Two caller-visible
//! normalizations happen here:
//!
//! - SQL NULL becomes the empty-string sentinel `""`
//! - identifier-typed columns keep their canonical text form
//!
//! The reverse direction (`json_to_sql`) binds caller-supplied field values
//! as statement parameters.

use serde_json::{Number, Value};

/// A row as a generic key-value record, keyed by column name.
pub type Record = serde_json::Map<String, Value>;

/// Convert a libsql value into its record representation.
fn sql_to_json(value: libsql::Value) -> Value {
    match value {
        // NULL columns normalize to an empty-string sentinel
        libsql::Value::Null => Value::String(String::new()),
        libsql::Value::Integer(i) => Value::Number(Number::from(i)),
        libsql::Value::Real(f) => Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(f.to_string())),
        libsql::Value::Text(s) => Value::String(s),
        libsql::Value::Blob(b) => Value::String(String::from_utf8_lossy(&b).into_owned()),
    }
}

/// Convert a caller-supplied JSON field value into a bindable parameter.
pub(crate) fn json_to_sql(value: &Value) -> libsql::Value {
    match value {
        Value::Null => libsql::Value::Null,
        Value::Bool(b) => libsql::Value::Integer(*b as i64),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                libsql::Value::Integer(i)
            } else {
                libsql::Value::Real(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::String(s) => libsql::Value::Text(s.clone()),
        // Structured values are stored as their JSON text
        other => libsql::Value::Text(other.to_string()),
    }
}

/// Drain a result set into records.
pub(crate) async fn collect_records(mut rows: libsql::Rows) -> Result<Vec<Record>, libsql::Error> {
    let columns: Vec<String> = (0..rows.column_count())
        .map(|i| {
            rows.column_name(i)
                .map(str::to_owned)
                .unwrap_or_else(|| format!("column_{i}"))
        })
        .collect();

    let mut records = Vec::new();
    while let Some(row) = rows.next().await? {
        let mut record = Record::new();
        for (i, name) in columns.iter().enumerate() {
            let value = row.get_value(i as i32)?;
            record.insert(name.clone(), sql_to_json(value));
        }
        records.push(record);
    }
    Ok(records)
}
