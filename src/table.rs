//! Turn the backend's delimited text into a numeric table the chart can draw.
//!
//! Row 0 of a [`RawTable`] is the header (time column name, then one label per
//! series). Column 0 of every other row is the time bucket label.

use color_eyre::Result;
use polars::prelude::*;
use std::io::Cursor;

pub type RawTable = Vec<Vec<String>>;

#[derive(Debug, Clone, PartialEq)]
pub struct NumericRow {
    pub label: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericTable {
    /// Column labels including the time column.
    pub header: Vec<String>,
    pub rows: Vec<NumericRow>,
}

impl NumericTable {
    pub fn series_count(&self) -> usize {
        self.header.len().saturating_sub(1)
    }

    pub fn series_label(&self, series: usize) -> &str {
        self.header
            .get(series + 1)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Largest value of a series over all rows; `0.0` when there are no rows.
    pub fn series_max(&self, series: usize) -> f64 {
        self.rows
            .iter()
            .filter_map(|r| r.values.get(series).copied())
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
            .unwrap_or(0.0)
    }

    pub fn series_values(&self, series: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows
            .iter()
            .map(move |r| r.values.get(series).copied().unwrap_or(0.0))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Per series, the running sum over this and all earlier series at each
    /// row. The last entry is the top of the stack.
    pub fn stacked(&self) -> Vec<Vec<f64>> {
        let mut totals = vec![0.0; self.rows.len()];
        (0..self.series_count())
            .map(|series| {
                for (total, value) in totals.iter_mut().zip(self.series_values(series)) {
                    *total += value;
                }
                totals.clone()
            })
            .collect()
    }

    /// Text form of the table, suitable for running through the transform again.
    pub fn to_raw(&self) -> RawTable {
        let mut raw = Vec::with_capacity(self.rows.len() + 1);
        if !self.header.is_empty() {
            raw.push(self.header.clone());
        }
        for row in &self.rows {
            let mut cells = Vec::with_capacity(row.values.len() + 1);
            cells.push(row.label.clone());
            cells.extend(row.values.iter().map(|v| v.to_string()));
            raw.push(cells);
        }
        raw
    }
}

/// Split the response body into rows of text cells.
pub fn parse(raw_text: &str) -> Result<RawTable> {
    let text = raw_text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    // No header handling and no type inference: every cell comes back as text.
    let read_options = CsvReadOptions::default()
        .with_has_header(false)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|opts| opts.with_truncate_ragged_lines(true));
    let df = CsvReader::new(Cursor::new(text.as_bytes().to_vec()))
        .with_options(read_options)
        .finish()?;

    let mut columns = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        columns.push(column.cast(&DataType::String)?);
    }

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let mut row = Vec::with_capacity(columns.len());
        for column in &columns {
            let cell = column.str()?.get(i).unwrap_or_default();
            row.push(cell.to_string());
        }
        rows.push(row);
    }
    Ok(rows)
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Keep the header and every row with at least one non-zero value.
/// Unparseable cells count as zero here; they are not rewritten.
pub fn filter_zero_rows(table: RawTable) -> RawTable {
    let mut rows = table.into_iter();
    let mut kept: RawTable = Vec::new();
    if let Some(header) = rows.next() {
        kept.push(header);
    }
    kept.extend(rows.filter(|row| {
        row.iter()
            .skip(1)
            .any(|cell| parse_number(cell).is_some_and(|v| v != 0.0))
    }));
    kept
}

/// Parse every value cell as `f64`; anything unparseable becomes `0.0`.
/// Rows are padded or truncated to the header width.
pub fn coerce(table: &RawTable) -> NumericTable {
    let Some((header, data)) = table.split_first() else {
        return NumericTable::default();
    };
    let width = header.len().saturating_sub(1);

    let rows = data
        .iter()
        .map(|row| {
            let label = row.first().cloned().unwrap_or_default();
            let mut values: Vec<f64> = row
                .iter()
                .skip(1)
                .take(width)
                .map(|cell| parse_number(cell).unwrap_or(0.0))
                .collect();
            values.resize(width, 0.0);
            NumericRow { label, values }
        })
        .collect();

    NumericTable {
        header: header.clone(),
        rows,
    }
}

/// parse → drop all-zero rows → coerce.
pub fn transform(raw_text: &str) -> Result<NumericTable> {
    Ok(coerce(&filter_zero_rows(parse(raw_text)?)))
}
