//! Generic tabular access shared by both export readers: size limits,
//! case-insensitive header lookup, duplicate-named columns.

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::{
  ImportLimits,
  error::{Error, Result},
};

pub(crate) struct Sheet {
  headers: Vec<String>,
  /// `(1-based line number, record)`; line 1 is the header.
  records: Vec<(usize, StringRecord)>,
}

impl Sheet {
  pub(crate) fn read(input: &[u8], limits: &ImportLimits) -> Result<Self> {
    if input.len() > limits.max_bytes {
      return Err(Error::TooLarge { size: input.len(), limit: limits.max_bytes });
    }

    let mut reader = ReaderBuilder::new()
      .flexible(true)
      .trim(Trim::All)
      .from_reader(input);

    let headers = reader.headers()?.iter().map(normalize_header).collect();

    let mut records = Vec::new();
    for (i, record) in reader.records().enumerate() {
      let record = record?;
      if record.iter().all(str::is_empty) {
        continue;
      }
      if records.len() == limits.max_rows {
        return Err(Error::TooManyRows { limit: limits.max_rows });
      }
      let line = record.position().map_or(i + 2, |p| p.line() as usize);
      records.push((line, record));
    }

    if records.is_empty() {
      return Err(Error::EmptySheet);
    }
    Ok(Self { headers, records })
  }

  /// Fail with [`Error::MissingColumn`] unless every name is present.
  pub(crate) fn require(&self, names: &[&str]) -> Result<()> {
    for name in names {
      self.column(name)?;
    }
    Ok(())
  }

  /// Index of the first column called `name` (case-insensitive).
  pub(crate) fn column(&self, name: &str) -> Result<usize> {
    let wanted = normalize_header(name);
    self
      .headers
      .iter()
      .position(|h| *h == wanted)
      .ok_or_else(|| Error::MissingColumn(name.to_string()))
  }

  /// Indexes of every column called `name`, in position order.
  pub(crate) fn columns(&self, name: &str) -> Vec<usize> {
    let wanted = normalize_header(name);
    self
      .headers
      .iter()
      .enumerate()
      .filter(|(_, h)| **h == wanted)
      .map(|(i, _)| i)
      .collect()
  }

  pub(crate) fn records(&self) -> impl Iterator<Item = (usize, &StringRecord)> {
    self.records.iter().map(|(line, r)| (*line, r))
  }

  pub(crate) fn len(&self) -> usize { self.records.len() }
}

/// The cell at `idx`, or `""` for short rows.
pub(crate) fn cell(record: &StringRecord, idx: usize) -> &str { record.get(idx).unwrap_or("") }

/// `Some(trimmed)` when non-empty, `None` otherwise.
pub(crate) fn opt_cell(record: &StringRecord, idx: usize) -> Option<String> {
  let s = cell(record, idx).trim();
  if s.is_empty() { None } else { Some(s.to_string()) }
}

fn normalize_header(h: &str) -> String {
  h.trim_start_matches('\u{feff}').trim().to_lowercase()
}
