//! SQL identifier helpers shared by the ledger, backends and translator.

/// Double-quote one identifier, doubling any `"` inside it.
///
/// ```
/// use sw_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("ledger"), r#""ledger""#);
/// assert_eq!(quote_ident(r#"odd"name"#), r#""odd""name""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote every dotted component of a table name such as `ops.ledger`.
///
/// ```
/// use sw_core::sql_utils::quote_qualified;
/// assert_eq!(quote_qualified("schema_migrations"), r#""schema_migrations""#);
/// assert_eq!(quote_qualified("ops.schema_migrations"), r#""ops"."schema_migrations""#);
/// ```
pub fn quote_qualified(name: &str) -> String {
    name.split('.')
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

/// `(schema, table)` split at the last `.`; the schema is `None` for a bare
/// name and each backend falls back to its own default.
///
/// ```
/// use sw_core::sql_utils::split_qualified_name;
/// assert_eq!(split_qualified_name("users"), (None, "users"));
/// assert_eq!(split_qualified_name("app.users"), (Some("app"), "users"));
/// ```
pub fn split_qualified_name(name: &str) -> (Option<&str>, &str) {
    match name.rfind('.') {
        Some(pos) => (Some(&name[..pos]), &name[pos + 1..]),
        None => (None, name),
    }
}

/// Remove one level of SQL identifier quoting (`"..."`, `` `...` `` or
/// `[...]`) from each dotted component.
pub fn unquote_ident(ident: &str) -> String {
    ident
        .split('.')
        .map(|part| {
            let part = part.trim();
            let bytes = part.as_bytes();
            if bytes.len() >= 2 {
                let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
                if first == b'"' && last == b'"' {
                    return part[1..part.len() - 1].replace("\"\"", "\"");
                }
                if (first == b'`' && last == b'`') || (first == b'[' && last == b']') {
                    return part[1..part.len() - 1].to_string();
                }
            }
            part.to_string()
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Maximum number of characters of a statement quoted in error messages.
pub const STATEMENT_PREVIEW_CHARS: usize = 120;

/// Collapse whitespace and cut a statement to `max_chars` for log and error
/// context, appending `...` when truncated.
pub fn truncate_statement(sql: &str, max_chars: usize) -> String {
    let collapsed = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let cut: String = collapsed.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}
