use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    schema::{ColumnType, ColumnTypes},
    sql::{TableIdentity, sql_type},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnReport {
    pub index: usize,
    pub name: String,
    /// `None` when no data row was seen for the column.
    pub descriptor: Option<ColumnType>,
    pub sql_type: String,
}

/// JSON sidecar describing what was inferred for each column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableReport {
    pub table: String,
    pub primary_key: Option<String>,
    pub rows: usize,
    pub columns: Vec<ColumnReport>,
}

impl TableReport {
    pub fn build(
        identity: &TableIdentity,
        headers: &[String],
        types: &ColumnTypes,
        rows: usize,
    ) -> Self {
        let columns = headers
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let descriptor = types.get(index).cloned();
                ColumnReport {
                    index,
                    name: name.clone(),
                    sql_type: sql_type(descriptor.as_ref()),
                    descriptor,
                }
            })
            .collect();
        TableReport {
            table: identity.name.clone(),
            primary_key: identity.primary_key.clone(),
            rows,
            columns,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Serializing schema JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening schema file {path:?}"))?;
        let reader = BufReader::new(file);
        let report = serde_json::from_reader(reader).context("Parsing schema JSON")?;
        Ok(report)
    }
}
