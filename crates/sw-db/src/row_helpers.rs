//! Shared helpers for reading DuckDB row columns as strings.

use duckdb::types::ValueRef;

/// Read a column value as text, trying multiple DuckDB types.
///
/// DuckDB integer columns return `None` for `Option<String>`, so NULL is
/// detected up front and the typed reads go String -> i64 -> f64 -> bool.
pub(crate) fn get_column_as_string(row: &duckdb::Row<'_>, idx: usize) -> Option<String> {
    if matches!(row.get_ref(idx), Ok(ValueRef::Null)) {
        return None;
    }
    if let Ok(Some(s)) = row.get::<_, Option<String>>(idx) {
        return Some(s);
    }
    if let Ok(Some(n)) = row.get::<_, Option<i64>>(idx) {
        return Some(n.to_string());
    }
    if let Ok(Some(f)) = row.get::<_, Option<f64>>(idx) {
        return Some(f.to_string());
    }
    if let Ok(Some(b)) = row.get::<_, Option<bool>>(idx) {
        return Some(b.to_string());
    }
    None
}
