use std::path::PathBuf;

use clap::Parser;

use crate::schema::DEFAULT_TEXT_THRESHOLD;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Infer a MySQL table from a CSV file and emit CREATE TABLE and INSERT statements",
    long_about = None
)]
pub struct Cli {
    /// Input CSV file whose first row holds the column names (`-` for stdin)
    pub input: PathBuf,
    /// Destination SQL file (`-` for stdout); its stem names the table
    pub output: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Table name to use instead of the output file stem
    #[arg(long)]
    pub table: Option<String>,
    /// VARCHAR columns longer than this are declared as TEXT
    #[arg(long = "text-threshold", default_value_t = DEFAULT_TEXT_THRESHOLD)]
    pub text_threshold: u64,
    /// Also write the inferred column types as JSON
    #[arg(long = "schema-json")]
    pub schema_json: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
