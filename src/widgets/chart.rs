//! Flow chart: one line per visible series over the time buckets.

use chrono::{DateTime, Local};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
};

use crate::chart_export::{plotted_values, y_bounds};
use crate::config::Theme;
use crate::table::NumericTable;
use crate::widgets::legend::format_value;

/// Axis text for a time bucket: RFC 3339 stamps shown as local HH:MM.
pub fn time_label(label: &str) -> String {
    match DateTime::parse_from_rfc3339(label) {
        Ok(ts) => ts.with_timezone(&Local).format("%H:%M").to_string(),
        Err(_) => label.to_string(),
    }
}

pub struct FlowChart<'a> {
    /// Only the visible series
    pub table: &'a NumericTable,
    /// Index of each column in the full table, for stable colors
    pub color_ids: &'a [usize],
    pub stacked: bool,
    pub y_starts_at_zero: bool,
    pub title: &'a str,
    pub theme: &'a Theme,
}

impl Widget for &FlowChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let values = plotted_values(self.table, self.stacked);
        let points: Vec<Vec<(f64, f64)>> = values
            .iter()
            .map(|v| v.iter().enumerate().map(|(x, y)| (x as f64, *y)).collect())
            .collect();

        let datasets: Vec<Dataset> = points
            .iter()
            .enumerate()
            .map(|(i, data)| {
                let color_id = self.color_ids.get(i).copied().unwrap_or(i);
                Dataset::default()
                    .name(self.table.series_label(i).to_string())
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(self.theme.series_color(color_id)))
                    .data(data)
            })
            .collect();

        let rows = self.table.rows.len();
        let x_max = rows.saturating_sub(1).max(1) as f64;
        let (y_min, y_max) = y_bounds(&values, self.y_starts_at_zero || self.stacked);

        let label_at = |i: usize| {
            self.table
                .rows
                .get(i)
                .map(|r| time_label(&r.label))
                .unwrap_or_default()
        };
        let x_labels: Vec<Span> = [0, rows.saturating_sub(1) / 2, rows.saturating_sub(1)]
            .iter()
            .map(|&i| Span::raw(label_at(i)))
            .collect();
        let y_labels: Vec<Span> = [y_min, (y_min + y_max) / 2.0, y_max]
            .iter()
            .map(|v| Span::raw(format_value(*v)))
            .collect();

        let axis_style = Style::default().fg(self.theme.get("text_secondary"));
        let chart = Chart::new(datasets)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.get("modal_border")))
                    .title(format!(" {} ", self.title)),
            )
            .x_axis(
                Axis::default()
                    .style(axis_style)
                    .bounds([0.0, x_max])
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .style(axis_style)
                    .bounds([y_min, y_max])
                    .labels(y_labels),
            )
            // The legend panel lists the series
            .hidden_legend_constraints((Constraint::Length(0), Constraint::Length(0)));
        chart.render(area, buf);
    }
}

/// A bordered box with a centered message in place of the chart.
pub fn render_message(area: Rect, buf: &mut Buffer, title: &str, message: &str, style: Style) {
    let block = Block::default().borders(Borders::ALL).title(format!(" {} ", title));
    let inner = block.inner(area);
    block.render(area, buf);

    let lines = message.lines().count().max(1) as u16;
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(lines.min(inner.height)),
            Constraint::Fill(1),
        ])
        .split(inner);
    Paragraph::new(message)
        .style(style)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(layout[1], buf);
}
