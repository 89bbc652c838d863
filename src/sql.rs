//! MySQL statement rendering for an inferred table.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::path::Path;

use itertools::Itertools;
use log::warn;

use crate::io_utils::is_dash;
use crate::schema::{ColumnType, ColumnTypes};

pub const DEFAULT_TABLE_NAME: &str = "csv_import";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableIdentity {
    pub name: String,
    pub primary_key: Option<String>,
}

impl TableIdentity {
    /// Table name comes from `table_override`, else the output file stem; the
    /// primary key is the first header column.
    pub fn derive(output: &Path, table_override: Option<&str>, headers: &[String]) -> Self {
        let name = table_override
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .or_else(|| {
                (!is_dash(output))
                    .then(|| output.file_stem().and_then(|stem| stem.to_str()))
                    .flatten()
                    .map(str::to_string)
            })
            .unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string());
        Self {
            name,
            primary_key: headers.first().cloned(),
        }
    }
}

pub fn sql_type(column_type: Option<&ColumnType>) -> String {
    match column_type {
        Some(ColumnType::Integer { max_digits, signed }) => {
            if *signed {
                format!("INT({max_digits})")
            } else {
                format!("INT({max_digits}) UNSIGNED")
            }
        }
        Some(ColumnType::Decimal {
            integer_digits,
            fractional_digits,
            ..
        }) => format!("DECIMAL({integer_digits},{fractional_digits})"),
        Some(ColumnType::DateTime) => "DATETIME".to_string(),
        Some(ColumnType::FixedChar { size }) => format!("CHAR({size})"),
        Some(ColumnType::VariableChar { length }) => format!("VARCHAR({length})"),
        Some(ColumnType::Text) | None => "TEXT".to_string(),
    }
}

/// Plain identifiers are emitted bare, anything else is back-quoted.
pub fn quote_identifier(name: &str) -> Cow<'_, str> {
    let mut chars = name.chars();
    let plain = chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("`{}`", name.replace('`', "``")))
    }
}

pub fn quote_value(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                quoted.push_str("<br />");
            }
            '\n' => quoted.push_str("<br />"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

pub fn render_drop(identity: &TableIdentity) -> String {
    format!(
        "DROP TABLE IF EXISTS {};",
        quote_identifier(&identity.name)
    )
}

pub fn render_create(identity: &TableIdentity, headers: &[String], types: &ColumnTypes) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "CREATE TABLE {} (", quote_identifier(&identity.name));
    let definitions = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            let column_type = types.get(idx);
            if column_type.is_none() {
                warn!("Column '{header}' has no inferred type; declaring it as TEXT");
            }
            let mut definition = format!(
                "  {} {}",
                quote_identifier(header),
                sql_type(column_type)
            );
            if idx == 0 && identity.primary_key.is_some() {
                definition.push_str(" NOT NULL AUTO_INCREMENT PRIMARY KEY");
            }
            definition
        })
        .join(",\n");
    let _ = writeln!(output, "{definitions}");
    output.push_str(");");
    output
}

/// Returns `None` when there are no rows to insert.
pub fn render_insert<R, S>(
    identity: &TableIdentity,
    headers: &[String],
    rows: &[R],
) -> Option<String>
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    if rows.is_empty() {
        return None;
    }
    let columns = headers.iter().map(|h| quote_identifier(h)).join(", ");
    let tuples = rows
        .iter()
        .map(|row| {
            let values = row
                .as_ref()
                .iter()
                .map(|value| quote_value(value.as_ref()))
                .join(",");
            format!("({values})")
        })
        .join(",\n");
    Some(format!(
        "INSERT INTO {} ({columns}) VALUES\n{tuples};",
        quote_identifier(&identity.name)
    ))
}

/// Full script: drop, create, then one bulk insert.
pub fn render_script<R, S>(
    identity: &TableIdentity,
    headers: &[String],
    types: &ColumnTypes,
    rows: &[R],
) -> String
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let mut script = String::new();
    let _ = writeln!(script, "{}", render_drop(identity));
    let _ = writeln!(script);
    let _ = writeln!(script, "{}", render_create(identity, headers, types));
    if let Some(insert) = render_insert(identity, headers, rows) {
        let _ = writeln!(script);
        let _ = writeln!(script, "{insert}");
    }
    script
}
