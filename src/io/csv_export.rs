use serde_json::Value;

use super::error::SinkError;
use crate::domain::DecodedRecord;

/// Ordered accumulation of decoded records for the tabular export.
///
/// The column set is fixed from the first accumulated record's keys; later
/// records are projected onto those columns positionally and missing keys
/// render as empty cells. Records that failed to decode (or arrived with
/// decoding disabled) occupy a fully empty row so row count still matches
/// record count. Known quirk, preserved for compatibility: keys outside the
/// first record's column set are silently dropped.
pub struct CsvAccumulator {
    columns: Option<Vec<String>>,
    rows: Vec<Option<DecodedRecord>>,
}

impl CsvAccumulator {
    pub fn new() -> Self {
        Self {
            columns: None,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Option<DecodedRecord>) {
        if self.columns.is_none()
            && let Some(record) = &row
        {
            self.columns = Some(record.keys().cloned().collect());
        }
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Serialize the full accumulation as CSV text.
    pub fn render(&self) -> Result<String, SinkError> {
        let columns = self.columns.as_deref().unwrap_or(&[]);
        if columns.is_empty() {
            // No decoded record ever arrived: a blank header line plus one
            // blank line per accumulated row.
            return Ok("\n".repeat(self.rows.len() + 1));
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(columns)?;

        for row in &self.rows {
            let cells: Vec<String> = columns
                .iter()
                .map(|column| {
                    row.as_ref()
                        .and_then(|record| record.get(column))
                        .map(render_cell)
                        .unwrap_or_default()
                })
                .collect();
            writer.write_record(&cells)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| SinkError::Io(e.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl Default for CsvAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
