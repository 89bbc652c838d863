//! I/O utilities for reading the CSV source and writing the SQL script.
//!
//! - **Row source**: [`read_table`] materializes the header and every data row
//!   so the inference pass and the statement emitter can both walk them.
//! - **Encoding**: input bytes are decoded through `encoding_rs`, defaulting
//!   to UTF-8.
//! - **stdin/stdout**: the `-` path convention routes through standard streams.

use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};
use log::warn;

use crate::error::InferError;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';

/// Header plus data rows, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn field_count(&self) -> usize {
        self.headers.len()
    }
}

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    // Ragged rows must reach the inference engine so it can name the record.
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(delimiter)
        .quote(b'"')
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn open_input(path: &Path) -> Result<Box<dyn Read>, InferError> {
    if is_dash(path) {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path).map_err(|source| InferError::SourceUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Box::new(BufReader::new(file)))
}

pub fn open_output(path: &Path) -> Result<Box<dyn Write>> {
    if is_dash(path) {
        Ok(Box::new(io::stdout()))
    } else {
        let file = File::create(path).with_context(|| format!("Creating output file {path:?}"))?;
        Ok(Box::new(BufWriter::new(file)))
    }
}

/// Removes an output file left behind by a failed run. Stdout is untouched.
pub fn discard_output(path: &Path) {
    if is_dash(path) {
        return;
    }
    if let Err(err) = fs::remove_file(path) {
        if err.kind() != io::ErrorKind::NotFound {
            warn!("Unable to remove partial output {path:?}: {err}");
        }
    }
}

pub fn decode_record(
    record: &csv::ByteRecord,
    encoding: &'static Encoding,
) -> Result<Vec<String>, InferError> {
    let line = record.position().map(|pos| pos.line()).unwrap_or_default();
    record
        .iter()
        .map(|field| {
            let (text, _, had_errors) = encoding.decode(field);
            if had_errors {
                Err(InferError::Malformed {
                    line,
                    message: format!("field is not valid {}", encoding.name()),
                })
            } else {
                Ok(text.into_owned())
            }
        })
        .collect()
}

/// Reads the whole source. The first record is the header; every later
/// record is a data row, including rows holding a single empty field.
pub fn read_table(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<CsvTable, InferError> {
    let input = open_input(path)?;
    read_table_from(input, delimiter, encoding)
}

pub fn read_table_from<R>(
    input: R,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<CsvTable, InferError>
where
    R: Read,
{
    let mut reader = open_csv_reader(input, delimiter);
    let mut record = csv::ByteRecord::new();
    let mut table = CsvTable::default();
    let mut saw_header = false;

    loop {
        let more = reader
            .read_byte_record(&mut record)
            .map_err(|err| InferError::Malformed {
                line: err.position().map(|pos| pos.line()).unwrap_or_default(),
                message: err.to_string(),
            })?;
        if !more {
            break;
        }
        let decoded = decode_record(&record, encoding)?;
        if saw_header {
            table.rows.push(decoded);
        } else {
            table.headers = decoded;
            saw_header = true;
        }
    }

    if !saw_header {
        return Err(InferError::EmptyInput);
    }
    Ok(table)
}
