//! Dialect translation of migration statements.
//!
//! Migration files are authored in PostgreSQL. [`translate`] is a pure
//! function of `(statement, dialect)` that passes statements through for
//! PostgreSQL and, for reduced dialects, drops or rewrites constructs the
//! target cannot run:
//!
//! | Construct | SQLite | DuckDB |
//! |---|---|---|
//! | `CREATE EXTENSION` | skip | skip |
//! | `gen_random_uuid()` / `uuid_generate_v4()` | random hex expression | `gen_random_uuid()` |
//! | `CREATE FUNCTION` / `CREATE TRIGGER` / `DO` | skip | skip |
//! | `UUID` column type | `TEXT` | kept |
//! | `ALTER TABLE .. ADD COLUMN a, ADD COLUMN b` | one guarded add per column | same |
//!
//! Every rule matches against [`mask`]ed text, so string literals, quoted
//! identifiers, dollar bodies and comments are never rewritten.

use crate::dialect::Dialect;
use crate::lexer::mask;
use crate::sql_utils::unquote_ident;
use regex::Regex;
use std::fmt;
use std::ops::Range;
use std::sync::OnceLock;

/// Why a statement was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// `CREATE/ALTER/DROP EXTENSION`
    Extension,
    /// Stored functions, procedures, triggers and anonymous `DO` blocks
    StoredProcedure,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Extension => f.write_str("extensions are not supported"),
            SkipReason::StoredProcedure => {
                f.write_str("stored functions and triggers are not supported")
            }
        }
    }
}

/// One column of an [`AddColumnPlan`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnAddition {
    /// Unquoted column name, used for the existence check
    pub name: String,
    /// Column name as written in the statement
    pub column_sql: String,
    /// Type and constraints following the column name
    pub definition: String,
}

/// `ALTER TABLE ... ADD COLUMN` split into one guarded addition per column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddColumnPlan {
    /// Unquoted, possibly schema-qualified table name
    pub table: String,
    /// Table name as written in the statement
    pub table_sql: String,
    /// Columns in statement order, `IF NOT EXISTS` removed
    pub columns: Vec<ColumnAddition>,
}

impl AddColumnPlan {
    /// The single-column `ALTER TABLE` for one addition.
    pub fn statement_for(&self, column: &ColumnAddition) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            self.table_sql, column.column_sql, column.definition
        )
    }
}

/// Result of translating one statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    /// Run this SQL as-is
    Execute(String),
    /// Drop the statement
    Skip(SkipReason),
    /// Check each column and add the missing ones
    AddColumns(AddColumnPlan),
}

/// Translate a single statement for `dialect`.
pub fn translate(statement: &str, dialect: Dialect) -> Translation {
    if dialect.is_canonical() {
        return Translation::Execute(statement.to_string());
    }

    let masked = mask(statement);
    let head = masked.trim_start();
    if !dialect.supports_extensions() && extension_re().is_match(head) {
        return Translation::Skip(SkipReason::Extension);
    }
    if !dialect.supports_stored_procedures() && procedural_re().is_match(head) {
        return Translation::Skip(SkipReason::StoredProcedure);
    }

    let mut sql = rewrite_uuid_functions(statement, dialect);
    if !dialect.has_uuid_type() {
        sql = rewrite_uuid_type(&sql);
    }

    if !dialect.supports_multi_add_column() {
        if let Some(plan) = parse_add_columns(&sql) {
            return Translation::AddColumns(plan);
        }
    }
    Translation::Execute(sql)
}

/// Expression producing a random, canonical 36-character v4 UUID in SQLite.
pub const SQLITE_UUID_EXPR: &str = "(lower(hex(randomblob(4))) || '-' || \
lower(hex(randomblob(2))) || '-4' || substr(lower(hex(randomblob(2))), 2) || '-' || \
substr('89ab', 1 + (random() & 3), 1) || substr(lower(hex(randomblob(2))), 2) || '-' || \
lower(hex(randomblob(6))))";

fn extension_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:CREATE|ALTER|DROP)\s+EXTENSION\b").expect("valid regex literal")
    })
}

fn procedural_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^(?:CREATE\s+(?:OR\s+REPLACE\s+)?(?:CONSTRAINT\s+)?(?:FUNCTION|PROCEDURE|TRIGGER)|DROP\s+(?:FUNCTION|PROCEDURE|TRIGGER)|DO)\b",
        )
        .expect("valid regex literal")
    })
}

fn uuid_function_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(?:\b[A-Za-z_][A-Za-z0-9_]*\s*\.\s*)?\b(?:gen_random_uuid|uuid_generate_v4)\s*\(\s*\)",
        )
        .expect("valid regex literal")
    })
}

fn uuid_type_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bUUID\b").expect("valid regex literal"))
}

fn alter_table_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?is)^\s*ALTER\s+TABLE\s+(?:IF\s+EXISTS\s+)?(?:ONLY\s+)?([A-Za-z0-9_$]+(?:\s*\.\s*[A-Za-z0-9_$]+)*)\s+(\S.*?)\s*$",
        )
        .expect("valid regex literal")
    })
}

fn add_column_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?is)^\s*ADD\s+(?:COLUMN\s+)?(?:IF\s+NOT\s+EXISTS\s+)?([A-Za-z0-9_$]+)\s+(\S.*?)\s*$",
        )
        .expect("valid regex literal")
    })
}

/// Words that follow `ADD` in table-constraint clauses.
const ADD_CONSTRAINT_WORDS: &[&str] = &[
    "CONSTRAINT", "PRIMARY", "UNIQUE", "FOREIGN", "CHECK", "EXCLUDE",
];

/// Words after which `uuid` is an identifier, not a type.
const NON_TYPE_PRECEDERS: &[&str] = &[
    "ADD", "ALTER", "AND", "BY", "CASE", "COLUMN", "DISTINCT", "DROP", "ELSE", "FROM", "HAVING",
    "IN", "INDEX", "INTO", "IS", "JOIN", "LIKE", "NOT", "ON", "OR", "RENAME", "RETURNING",
    "SELECT", "SET", "TABLE", "THEN", "TO", "USING", "VALUES", "WHEN", "WHERE",
];

/// Apply `replacement` to every match of `re` in the code portions of `sql`.
///
/// The callback sees the masked text and the match range and returns the
/// replacement, or `None` to leave the match alone.
fn replace_in_code<F>(sql: &str, re: &Regex, mut replacement: F) -> String
where
    F: FnMut(&str, Range<usize>) -> Option<String>,
{
    let masked = mask(sql);
    let mut out = String::with_capacity(sql.len());
    let mut last = 0;
    for m in re.find_iter(&masked) {
        let range = m.range();
        if !sql.is_char_boundary(range.start) || !sql.is_char_boundary(range.end) {
            continue;
        }
        if let Some(rep) = replacement(&masked, range.clone()) {
            out.push_str(&sql[last..range.start]);
            out.push_str(&rep);
            last = range.end;
        }
    }
    out.push_str(&sql[last..]);
    out
}

fn rewrite_uuid_functions(sql: &str, dialect: Dialect) -> String {
    if dialect.has_gen_random_uuid() && dialect.has_uuid_generate_v4() {
        return sql.to_string();
    }
    replace_in_code(sql, uuid_function_re(), |masked, range| {
        let call = masked[range].to_ascii_lowercase();
        if !dialect.has_gen_random_uuid() {
            Some(SQLITE_UUID_EXPR.to_string())
        } else if call.contains("uuid_generate_v4") || call.contains('.') {
            Some("gen_random_uuid()".to_string())
        } else {
            None
        }
    })
}

fn rewrite_uuid_type(sql: &str) -> String {
    replace_in_code(sql, uuid_type_re(), |masked, range| {
        is_type_position(masked, range).then(|| "TEXT".to_string())
    })
}

/// Whether the `uuid` word at `range` is used as a type name.
///
/// Types follow a column name, `::`, `AS` or `TYPE`; identifiers follow
/// punctuation or keywords such as `SELECT` and `COLUMN`.
fn is_type_position(masked: &str, range: Range<usize>) -> bool {
    if masked[range.end..].trim_start().starts_with('(') {
        return false;
    }
    let before = masked[..range.start].trim_end();
    if before.ends_with("::") {
        return true;
    }
    let word_start = before
        .rfind(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .map_or(0, |p| p + 1);
    let word = &before[word_start..];
    if word.is_empty() {
        return false;
    }
    !NON_TYPE_PRECEDERS
        .iter()
        .any(|k| k.eq_ignore_ascii_case(word))
}

/// Parse `ALTER TABLE t ADD [COLUMN] [IF NOT EXISTS] c def, ...`.
///
/// Returns `None` unless every action is a column addition.
fn parse_add_columns(sql: &str) -> Option<AddColumnPlan> {
    let masked = mask(sql);
    let caps = alter_table_re().captures(&masked)?;
    let table_range = caps.get(1)?.range();
    let actions_range = caps.get(2)?.range();

    let mut columns = Vec::new();
    for action in split_top_level_commas(&masked, actions_range) {
        let caps = add_column_re().captures(&masked[action.clone()])?;
        let name = shift(caps.get(1)?.range(), action.start);
        let definition = shift(caps.get(2)?.range(), action.start);

        let word = &masked[name.clone()];
        if ADD_CONSTRAINT_WORDS
            .iter()
            .any(|k| k.eq_ignore_ascii_case(word))
        {
            return None;
        }

        let column_sql = sql[name].to_string();
        columns.push(ColumnAddition {
            name: unquote_ident(&column_sql),
            column_sql,
            definition: sql[definition].trim().to_string(),
        });
    }

    let table_sql = sql[table_range].to_string();
    Some(AddColumnPlan {
        table: unquote_ident(&table_sql),
        table_sql,
        columns,
    })
}

fn shift(range: Range<usize>, by: usize) -> Range<usize> {
    range.start + by..range.end + by
}

/// Split `range` of `masked` on commas outside parentheses.
fn split_top_level_commas(masked: &str, range: Range<usize>) -> Vec<Range<usize>> {
    let bytes = masked.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = range.start;
    for i in range.clone() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                parts.push(start..i);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(start..range.end);
    parts
}

#[cfg(test)]
#[path = "translate_test.rs"]
mod tests;
