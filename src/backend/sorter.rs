//! Result ordering for the in-memory backend

use std::cmp::Ordering;

use serde_json::Value;

use crate::statement::SortDirection;

use super::connection::Row;

/// An output row plus the values it is ordered by.
#[derive(Debug, Clone)]
pub struct SortableRow {
    pub values: Row,
    pub keys: Vec<Value>,
}

/// Sorts output rows by their ORDER BY keys.
pub struct RowSorter;

impl RowSorter {
    /// Sorts by each key in turn. Stable: rows with equal keys keep their
    /// input order.
    pub fn sort(rows: &mut [SortableRow], directions: &[SortDirection]) {
        rows.sort_by(|a, b| {
            for (i, direction) in directions.iter().enumerate() {
                let ordering = compare_values(
                    a.keys.get(i).unwrap_or(&Value::Null),
                    b.keys.get(i).unwrap_or(&Value::Null),
                );
                let ordering = match direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }
}

/// Total order over JSON values.
///
/// - null < bool < number < string < array < object
/// - same kinds compare naturally; arrays and objects are all equal
///
/// Nulls therefore sort first ascending and last descending.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    let rank = |v: &Value| -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    };

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return x.cmp(&y);
            }
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
