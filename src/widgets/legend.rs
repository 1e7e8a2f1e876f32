//! Legend table: one row per series with color swatch, label and maximum.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Cell, Row, Table, Widget},
};

use crate::config::Theme;
use crate::table::NumericTable;
use crate::visibility::{SeriesVisibility, SortKey};

const SWATCH_WIDTH: u16 = 2;
const MAX_WIDTH: u16 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendHit {
    Header(SortKey),
    /// Index of the series in the full table
    Series(usize),
}

/// Compact value for the max column and axis labels (1500 -> "1.5k").
pub fn format_value(v: f64) -> String {
    let abs = v.abs();
    let (scaled, suffix) = if abs >= 1e12 {
        (v / 1e12, "T")
    } else if abs >= 1e9 {
        (v / 1e9, "G")
    } else if abs >= 1e6 {
        (v / 1e6, "M")
    } else if abs >= 1e3 {
        (v / 1e3, "k")
    } else {
        (v, "")
    };
    if suffix.is_empty() && scaled.fract() == 0.0 {
        format!("{}", scaled)
    } else {
        format!("{:.1}{}", scaled, suffix)
    }
}

/// First listed row so that `selected` stays within `visible_rows`.
pub fn scroll_offset(selected: usize, visible_rows: usize) -> usize {
    if visible_rows == 0 || selected < visible_rows {
        0
    } else {
        selected + 1 - visible_rows
    }
}

pub struct Legend<'a> {
    pub table: &'a NumericTable,
    pub visibility: &'a SeriesVisibility,
    /// Series indices in display order
    pub order: &'a [usize],
    /// Cursor position within `order`
    pub selected: usize,
    pub focused: bool,
    pub theme: &'a Theme,
}

impl Legend<'_> {
    fn inner(area: Rect) -> Rect {
        Block::default().borders(Borders::ALL).inner(area)
    }

    /// Map a mouse position inside `area` to what was clicked.
    pub fn hit(&self, area: Rect, column: u16, row: u16) -> Option<LegendHit> {
        let inner = Self::inner(area);
        if column < inner.x || column >= inner.right() || row < inner.y || row >= inner.bottom() {
            return None;
        }
        if row == inner.y {
            let max_start = inner.right().saturating_sub(MAX_WIDTH);
            let key = if column >= max_start {
                SortKey::Max
            } else {
                SortKey::Label
            };
            return Some(LegendHit::Header(key));
        }
        let visible_rows = inner.height.saturating_sub(1) as usize;
        let offset = scroll_offset(self.selected, visible_rows);
        let pos = offset + (row - inner.y - 1) as usize;
        self.order.get(pos).map(|&series| LegendHit::Series(series))
    }

    fn sort_marker(&self, key: SortKey) -> &'static str {
        if self.visibility.sort.key != key {
            ""
        } else if self.visibility.sort.ascending {
            " ▲"
        } else {
            " ▼"
        }
    }
}

impl Widget for &Legend<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = if self.focused {
            self.theme.get("modal_border_active")
        } else {
            self.theme.get("table_border")
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(" Legend ");

        let header_style = Style::default()
            .fg(self.theme.get("table_header"))
            .add_modifier(Modifier::BOLD);
        let header = Row::new(vec![
            Cell::from(""),
            Cell::from(format!("Series{}", self.sort_marker(SortKey::Label))),
            Cell::from(format!("Max{}", self.sort_marker(SortKey::Max))),
        ])
        .style(header_style);

        let visible_rows = Legend::inner(area).height.saturating_sub(1) as usize;
        let offset = scroll_offset(self.selected, visible_rows);
        let hidden = self.theme.get("series_hidden");
        let text = self.theme.get("text_primary");
        // "reversed" parses to Reset and means swap fg/bg
        let selected_style = match self.theme.get("table_selected") {
            Color::Reset => Style::default().add_modifier(Modifier::REVERSED),
            color => Style::default().bg(color),
        };

        let rows: Vec<Row> = self
            .order
            .iter()
            .enumerate()
            .skip(offset)
            .take(visible_rows)
            .map(|(pos, &series)| {
                let shown = self.visibility.is_visible(series);
                let swatch_color = if shown {
                    self.theme.series_color(series)
                } else {
                    hidden
                };
                let mut style = Style::default().fg(if shown { text } else { hidden });
                if self.focused && pos == self.selected {
                    style = style.patch(selected_style);
                }
                Row::new(vec![
                    Cell::from(Span::styled("■", Style::default().fg(swatch_color))),
                    Cell::from(self.table.series_label(series).to_string()),
                    Cell::from(format_value(self.table.series_max(series))),
                ])
                .style(style)
            })
            .collect();

        Table::new(
            rows,
            [
                Constraint::Length(SWATCH_WIDTH),
                Constraint::Fill(1),
                Constraint::Length(MAX_WIDTH),
            ],
        )
        .column_spacing(0)
        .header(header)
        .block(block)
        .render(area, buf);
    }
}
