pub mod cli;
pub mod data;
pub mod error;
pub mod io_utils;
pub mod metadata;
pub mod schema;
pub mod sql;

use std::{env, fs, io::Write, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::Cli,
    metadata::TableReport,
    schema::InferOptions,
    sql::TableIdentity,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_to_sql", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    convert(&cli)
}

/// Reads the CSV, infers column types and writes the SQL script. Both the
/// script and the optional JSON report are rendered in memory first, and the
/// SQL file is removed again if a later write fails, so a failed run leaves
/// no output behind.
pub fn convert(args: &Cli) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let delimiter = args.delimiter.unwrap_or(io_utils::DEFAULT_CSV_DELIMITER);
    info!(
        "Reading '{}' with delimiter '{}'",
        args.input.display(),
        printable_delimiter(delimiter)
    );
    let table = io_utils::read_table(&args.input, delimiter, encoding)
        .with_context(|| format!("Reading CSV from {:?}", args.input))?;
    debug!("Header columns: {:?}", table.headers);

    let options = InferOptions {
        text_threshold: args.text_threshold,
    };
    let types = schema::infer(&table.headers, &table.rows, &options)
        .with_context(|| format!("Inferring column types from {:?}", args.input))?;
    info!(
        "Inferred {} column type(s) from {} row(s)",
        types.len(),
        table.rows.len()
    );

    let identity = TableIdentity::derive(&args.output, args.table.as_deref(), &table.headers);
    let script = sql::render_script(&identity, &table.headers, &types, &table.rows);

    let report = args
        .schema_json
        .as_ref()
        .map(|path| {
            TableReport::build(&identity, &table.headers, &types, table.rows.len())
                .to_json()
                .map(|json| (path, json))
        })
        .transpose()?;

    let written = {
        let mut writer = io_utils::open_output(&args.output)?;
        writer
            .write_all(script.as_bytes())
            .and_then(|_| writer.flush())
            .with_context(|| format!("Writing SQL to {:?}", args.output))
    };
    if let Err(err) = written {
        io_utils::discard_output(&args.output);
        return Err(err);
    }

    if let Some((path, json)) = report {
        if let Err(err) =
            fs::write(path, json).with_context(|| format!("Writing schema JSON to {path:?}"))
        {
            io_utils::discard_output(&args.output);
            return Err(err);
        }
        info!("Column types written to {path:?}");
    }

    info!(
        "Table '{}' with {} column(s) written to {:?}",
        identity.name,
        table.field_count(),
        args.output
    );
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
