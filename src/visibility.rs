//! Which series are shown and how the legend is ordered.
//!
//! All transitions are plain functions on [`SeriesVisibility`]; the caller
//! re-renders from the table it already has, nothing is refetched.

use crate::table::{NumericRow, NumericTable};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Label,
    Max,
}

impl SortKey {
    /// Direction used when the legend switches to this key.
    pub fn default_ascending(self) -> bool {
        match self {
            SortKey::Label => true,
            SortKey::Max => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Label => "label",
            SortKey::Max => "max",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegendSort {
    pub key: SortKey,
    pub ascending: bool,
}

impl Default for LegendSort {
    fn default() -> Self {
        Self {
            key: SortKey::Label,
            ascending: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesVisibility {
    pub visible: Vec<bool>,
    pub sort: LegendSort,
}

impl SeriesVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new query shape invalidates earlier choices.
    pub fn reset(&mut self, series_count: usize) -> bool {
        if self.visible.len() != series_count {
            self.visible = vec![true; series_count];
            return true;
        }
        false
    }

    pub fn is_visible(&self, series: usize) -> bool {
        self.visible.get(series).copied().unwrap_or(false)
    }

    pub fn visible_count(&self) -> usize {
        self.visible.iter().filter(|v| **v).count()
    }

    pub fn is_sole_visible(&self, series: usize) -> bool {
        self.is_visible(series) && self.visible_count() == 1
    }

    /// Legend click. Plain: isolate `series` (or show all if it already is the
    /// only one). Modified: toggle `series` (same "show all" rule).
    pub fn click(&mut self, series: usize, modified: bool) {
        let n = self.visible.len();
        if series >= n {
            return;
        }
        if self.is_sole_visible(series) {
            self.visible = vec![true; n];
        } else if modified {
            self.visible[series] = !self.visible[series];
        } else {
            self.visible = (0..n).map(|i| i == series).collect();
        }
    }

    pub fn sort_click(&mut self, key: SortKey) {
        if self.sort.key == key {
            self.sort.ascending = !self.sort.ascending;
        } else {
            self.sort = LegendSort {
                key,
                ascending: key.default_ascending(),
            };
        }
    }

    pub fn show_all(&mut self) {
        self.visible.iter_mut().for_each(|v| *v = true);
    }
}

/// Column 0 plus every visible series, original order kept.
pub fn derive_visible_table(table: &NumericTable, visible: &[bool]) -> NumericTable {
    let keep: Vec<usize> = (0..table.series_count())
        .filter(|&i| visible.get(i).copied().unwrap_or(false))
        .collect();

    let mut header = Vec::with_capacity(keep.len() + 1);
    if let Some(first) = table.header.first() {
        header.push(first.clone());
    }
    header.extend(keep.iter().map(|&i| table.header[i + 1].clone()));

    let rows = table
        .rows
        .iter()
        .map(|row| NumericRow {
            label: row.label.clone(),
            values: keep
                .iter()
                .map(|&i| row.values.get(i).copied().unwrap_or(0.0))
                .collect(),
        })
        .collect();

    NumericTable { header, rows }
}

/// Series indices in the order the legend lists them. Ties keep table order.
pub fn legend_order(table: &NumericTable, sort: &LegendSort) -> Vec<usize> {
    let mut order: Vec<usize> = (0..table.series_count()).collect();
    let maxima: Vec<f64> = order.iter().map(|&i| table.series_max(i)).collect();
    order.sort_by(|&a, &b| {
        let ord = match sort.key {
            SortKey::Label => table.series_label(a).cmp(table.series_label(b)),
            SortKey::Max => maxima[a].partial_cmp(&maxima[b]).unwrap_or(Ordering::Equal),
        };
        if sort.ascending {
            ord
        } else {
            ord.reverse()
        }
    });
    order
}
