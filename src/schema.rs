//! Column type inference.
//!
//! Every cell is classified into a candidate [`ColumnType`], and the candidate
//! is folded into the column's running descriptor by [`reconcile`]. Once every
//! row has been observed, oversized `VARCHAR` columns are widened to `TEXT`.
//!
//! The fold is asymmetric:
//!
//! - Sized candidates (integers, strings) only replace the descriptor when
//!   they are strictly larger, or when the descriptor carries no size yet.
//! - Decimal candidates always overwrite, taking the maxima of both parts
//!   from whatever the descriptor held. A column holding `VARCHAR(30)` that
//!   later sees `1.25` becomes `DECIMAL(30,2)`.

use std::{collections::BTreeMap, sync::OnceLock};

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{data::looks_like_datetime, error::InferError};

pub const DEFAULT_TEXT_THRESHOLD: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnType {
    Integer {
        max_digits: u64,
        signed: bool,
    },
    Decimal {
        integer_digits: u64,
        fractional_digits: u64,
        signed: bool,
    },
    DateTime,
    FixedChar {
        size: u64,
    },
    VariableChar {
        length: u64,
    },
    Text,
}

impl ColumnType {
    /// Magnitude compared when deciding whether a candidate replaces the
    /// descriptor. Date/time, fixed-width and text columns have none.
    pub fn size(&self) -> Option<u64> {
        match self {
            ColumnType::Integer { max_digits, .. } => Some(*max_digits),
            ColumnType::Decimal { integer_digits, .. } => Some(*integer_digits),
            ColumnType::VariableChar { length } => Some(*length),
            ColumnType::DateTime | ColumnType::FixedChar { .. } | ColumnType::Text => None,
        }
    }

    pub fn scale(&self) -> Option<u64> {
        match self {
            ColumnType::Decimal {
                fractional_digits, ..
            } => Some(*fractional_digits),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ColumnType::Integer { .. } | ColumnType::Decimal { .. }
        )
    }

    fn is_signed(&self) -> bool {
        matches!(
            self,
            ColumnType::Integer { signed: true, .. } | ColumnType::Decimal { signed: true, .. }
        )
    }

    fn into_signed(self) -> Self {
        match self {
            ColumnType::Integer { max_digits, .. } => ColumnType::Integer {
                max_digits,
                signed: true,
            },
            ColumnType::Decimal {
                integer_digits,
                fractional_digits,
                ..
            } => ColumnType::Decimal {
                integer_digits,
                fractional_digits,
                signed: true,
            },
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferOptions {
    /// `VARCHAR` columns longer than this become `TEXT`.
    pub text_threshold: u64,
}

impl Default for InferOptions {
    fn default() -> Self {
        Self {
            text_threshold: DEFAULT_TEXT_THRESHOLD,
        }
    }
}

/// Final descriptors keyed by zero-based column index. Columns that never
/// received a candidate (no data rows) are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnTypes {
    columns: BTreeMap<usize, ColumnType>,
}

impl ColumnTypes {
    pub fn get(&self, index: usize) -> Option<&ColumnType> {
        self.columns.get(&index)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

fn integer_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^-?[0-9]+$").expect("integer pattern compiles"))
}

fn decimal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^-?(?P<int>[0-9]+)\.(?P<frac>[0-9]+)$").expect("decimal pattern compiles")
    })
}

/// Classifies a single cell. Returns `None` for an empty cell in a column
/// that already has a descriptor.
///
/// Integer candidates always report one digit; only their sign is taken
/// from the value.
pub fn classify(value: &str, column_is_set: bool) -> Option<ColumnType> {
    if integer_pattern().is_match(value) {
        return Some(ColumnType::Integer {
            max_digits: 1,
            signed: value.starts_with('-'),
        });
    }
    if let Some(caps) = decimal_pattern().captures(value) {
        return Some(ColumnType::Decimal {
            integer_digits: caps["int"].len() as u64,
            fractional_digits: caps["frac"].len() as u64,
            signed: value.starts_with('-'),
        });
    }
    if looks_like_datetime(value) {
        return Some(ColumnType::DateTime);
    }
    if value.is_empty() {
        return (!column_is_set).then_some(ColumnType::FixedChar { size: 1 });
    }
    Some(ColumnType::VariableChar {
        length: value.chars().count() as u64,
    })
}

/// Folds `candidate` into the column's current descriptor.
///
/// Once either side of a numeric fold has seen a negative value, the
/// resulting numeric descriptor stays signed.
pub fn reconcile(existing: Option<&ColumnType>, candidate: ColumnType) -> ColumnType {
    let Some(existing) = existing else {
        return candidate;
    };
    if *existing == candidate {
        return candidate;
    }

    let signed = (existing.is_numeric() && existing.is_signed())
        || (candidate.is_numeric() && candidate.is_signed());

    let merged = match candidate {
        ColumnType::Decimal {
            integer_digits,
            fractional_digits,
            signed,
        } => ColumnType::Decimal {
            integer_digits: integer_digits.max(existing.size().unwrap_or(0)),
            fractional_digits: fractional_digits.max(existing.scale().unwrap_or(0)),
            signed,
        },
        candidate => match (existing.size(), candidate.size()) {
            (None, _) => candidate,
            (Some(current), Some(next)) if next > current => candidate,
            _ => existing.clone(),
        },
    };

    if signed && merged.is_numeric() {
        merged.into_signed()
    } else {
        merged
    }
}

/// Running per-column state for one pass over the data rows.
#[derive(Debug, Clone)]
pub struct TypeAccumulator {
    types: Vec<Option<ColumnType>>,
    rows_seen: usize,
}

impl TypeAccumulator {
    pub fn new(width: usize) -> Self {
        Self {
            types: vec![None; width],
            rows_seen: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.types.len()
    }

    pub fn rows_seen(&self) -> usize {
        self.rows_seen
    }

    /// Observes one data row. `record` is the 1-based record number (the
    /// header is record 1) and is only used for error reporting.
    pub fn observe<S>(&mut self, record: usize, row: &[S]) -> Result<(), InferError>
    where
        S: AsRef<str>,
    {
        if row.len() != self.types.len() {
            return Err(InferError::RowWidthMismatch {
                record,
                expected: self.types.len(),
                found: row.len(),
            });
        }
        for (slot, value) in self.types.iter_mut().zip(row) {
            let Some(candidate) = classify(value.as_ref(), slot.is_some()) else {
                continue;
            };
            if slot.as_ref() != Some(&candidate) {
                *slot = Some(reconcile(slot.as_ref(), candidate));
            }
        }
        self.rows_seen += 1;
        Ok(())
    }

    /// Applies the `TEXT` widening pass and hands out the final descriptors.
    pub fn finish(self, options: &InferOptions) -> ColumnTypes {
        let columns = self
            .types
            .into_iter()
            .enumerate()
            .filter_map(|(idx, ty)| ty.map(|ty| (idx, widen(ty, options.text_threshold))))
            .inspect(|(idx, ty)| debug!("Column {idx} resolved to {ty:?}"))
            .collect();
        ColumnTypes { columns }
    }
}

fn widen(ty: ColumnType, text_threshold: u64) -> ColumnType {
    match ty {
        ColumnType::VariableChar { length } if length > text_threshold => ColumnType::Text,
        other => other,
    }
}

/// Infers one descriptor per column from the header width and the data rows.
///
/// Pure: the same header and rows always produce the same descriptors.
pub fn infer<H, R, S>(
    headers: &[H],
    rows: impl IntoIterator<Item = R>,
    options: &InferOptions,
) -> Result<ColumnTypes, InferError>
where
    H: AsRef<str>,
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let mut accumulator = TypeAccumulator::new(headers.len());
    for (row_idx, row) in rows.into_iter().enumerate() {
        accumulator.observe(row_idx + 2, row.as_ref())?;
    }
    debug!(
        "Observed {} row(s) across {} column(s)",
        accumulator.rows_seen(),
        accumulator.width()
    );
    Ok(accumulator.finish(options))
}
