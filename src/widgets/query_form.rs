//! Form panel: time range, breakdown, top flows and filter rows.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::config::Theme;
use crate::query_form::{FormField, QueryForm};

const LABEL_WIDTH: u16 = 11;

pub struct QueryFormView<'a> {
    pub form: &'a QueryForm,
    pub focused: bool,
    pub theme: &'a Theme,
}

impl QueryFormView<'_> {
    fn is_focused(&self, field: FormField) -> bool {
        self.focused && self.form.focus == field
    }

    fn label_style(&self, field: FormField) -> Style {
        if self.is_focused(field) {
            Style::default().fg(self.theme.get("modal_border_active"))
        } else {
            Style::default().fg(self.theme.get("text_secondary"))
        }
    }

    /// Label on the left, text value (or the live editor) on the right.
    fn text_row(&self, buf: &mut Buffer, area: Rect, label: &str, field: FormField, value: &str) {
        let label_area = Rect::new(area.x, area.y, LABEL_WIDTH.min(area.width), 1);
        Paragraph::new(label)
            .style(self.label_style(field))
            .render(label_area, buf);
        let value_area = Rect::new(
            area.x + label_area.width,
            area.y,
            area.width.saturating_sub(label_area.width),
            1,
        );
        if self.is_focused(field) {
            (&self.form.editor).render(value_area, buf);
        } else {
            Paragraph::new(value)
                .style(Style::default().fg(self.theme.get("text_primary")))
                .render(value_area, buf);
        }
    }

    fn selector_row(&self, buf: &mut Buffer, area: Rect, label: &str, field: FormField, value: Line) {
        let label_area = Rect::new(area.x, area.y, LABEL_WIDTH.min(area.width), 1);
        Paragraph::new(label)
            .style(self.label_style(field))
            .render(label_area, buf);
        let value_area = Rect::new(
            area.x + label_area.width,
            area.y,
            area.width.saturating_sub(label_area.width),
            1,
        );
        let mut style = Style::default().fg(self.theme.get("text_primary"));
        if self.is_focused(field) {
            style = style.add_modifier(Modifier::REVERSED);
        }
        Paragraph::new(value).style(style).render(value_area, buf);
    }

    fn button(&self, buf: &mut Buffer, area: Rect, text: &str, field: FormField) {
        let style = if self.is_focused(field) {
            Style::default()
                .fg(self.theme.get("modal_border_active"))
                .add_modifier(Modifier::REVERSED)
        } else {
            Style::default().fg(self.theme.get("primary"))
        };
        Paragraph::new(text).style(style).render(area, buf);
    }
}

impl Widget for &QueryFormView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = if self.focused {
            self.theme.get("modal_border_active")
        } else {
            self.theme.get("modal_border")
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(" Query ");
        let inner = block.inner(area);
        block.render(area, buf);

        let form = self.form;
        let mut y = inner.y;
        let bottom = inner.bottom();
        let mut next_row = |height: u16| -> Option<Rect> {
            if y + height > bottom {
                return None;
            }
            let row = Rect::new(inner.x, y, inner.width, height);
            y += height;
            Some(row)
        };

        if let Some(row) = next_row(1) {
            self.text_row(buf, row, "Start", FormField::TimeStart, &form.time_start);
        }
        if let Some(row) = next_row(1) {
            self.text_row(buf, row, "End", FormField::TimeEnd, &form.time_end);
        }

        if let Some(row) = next_row(1) {
            let current = form.catalog.fields().get(form.breakdown_cursor);
            let line = match current {
                Some(spec) => {
                    let mark = if form.breakdown.contains(&spec.name) {
                        "[x]"
                    } else {
                        "[ ]"
                    };
                    Line::from(format!("‹ {} {} ›", mark, spec.label))
                }
                None => Line::from(""),
            };
            self.selector_row(buf, row, "Breakdown", FormField::Breakdown, line);
        }
        if let Some(row) = next_row(1) {
            let selected: Vec<&str> = form
                .breakdown
                .iter()
                .map(|name| {
                    form.catalog
                        .get(name)
                        .map(|f| f.short_label.as_str())
                        .unwrap_or(name.as_str())
                })
                .collect();
            let text = if selected.is_empty() {
                "(no breakdown)".to_string()
            } else {
                selected.join(", ")
            };
            let area = Rect::new(
                row.x + LABEL_WIDTH.min(row.width),
                row.y,
                row.width.saturating_sub(LABEL_WIDTH),
                1,
            );
            Paragraph::new(text)
                .style(Style::default().fg(self.theme.get("text_secondary")))
                .render(area, buf);
        }

        if let Some(row) = next_row(1) {
            self.text_row(buf, row, "Top flows", FormField::TopFlows, &form.top_flows);
        }

        next_row(1);
        if let Some(row) = next_row(1) {
            Paragraph::new("Filters")
                .style(Style::default().fg(self.theme.get("table_header")))
                .render(row, buf);
        }

        for filter in form.filters.rows() {
            if let Some(row) = next_row(1) {
                let label = form.catalog.label(&filter.field);
                self.selector_row(
                    buf,
                    row,
                    "Field",
                    FormField::FilterField(filter.id),
                    Line::from(format!("‹ {} ›", label)),
                );
            }
            if let Some(row) = next_row(1) {
                self.text_row(
                    buf,
                    row,
                    "  =",
                    FormField::FilterValue(filter.id),
                    &filter.value,
                );
            }
            if self.is_focused(FormField::FilterValue(filter.id)) {
                for suggestion in form.visible_suggestions(filter.id) {
                    if let Some(row) = next_row(1) {
                        let area = Rect::new(
                            row.x + LABEL_WIDTH.min(row.width),
                            row.y,
                            row.width.saturating_sub(LABEL_WIDTH),
                            1,
                        );
                        Paragraph::new(Span::styled(
                            suggestion,
                            Style::default().fg(self.theme.get("dimmed")),
                        ))
                        .render(area, buf);
                    }
                }
            }
        }

        if let Some(row) = next_row(1) {
            self.button(buf, row, "[ + Add filter ]", FormField::AddFilter);
        }
        if let Some(row) = next_row(1) {
            self.button(buf, row, "[ Submit ]", FormField::Submit);
        }

        if let Some(error) = &form.error {
            next_row(1);
            let remaining = bottom.saturating_sub(y);
            if remaining > 0 {
                let area = Rect::new(inner.x, y, inner.width, remaining);
                Paragraph::new(error.as_str())
                    .style(Style::default().fg(self.theme.get("error")))
                    .wrap(Wrap { trim: true })
                    .render(area, buf);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueryConfig;
    use crate::fields::FieldCatalog;
    use chrono::NaiveDate;

    fn form() -> QueryForm {
        let now = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 15, 0)
            .unwrap();
        QueryForm::with_now(&QueryConfig::default(), FieldCatalog::default(), now)
    }

    fn text(buf: &Buffer) -> String {
        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn render(form: &QueryForm) -> String {
        let theme = Theme::default();
        let view = QueryFormView {
            form,
            focused: true,
            theme: &theme,
        };
        let area = Rect::new(0, 0, 44, 24);
        let mut buf = Buffer::empty(area);
        view.render(area, &mut buf);
        text(&buf)
    }

    #[test]
    fn shows_fields_and_buttons() {
        let out = render(&form());
        assert!(out.contains("2024-03-01T10:00"));
        assert!(out.contains("2024-03-01T10:15"));
        assert!(out.contains("(no breakdown)"));
        assert!(out.contains("[ Submit ]"));
    }

    #[test]
    fn shows_filter_rows_and_error() {
        let mut form = form();
        let id = form.filters.add_filter(Some("src_asn"));
        form.filters.set_value(id, "65000");
        form.error = Some("Top flows must be a whole number".to_string());
        let out = render(&form);
        assert!(out.contains("Source ASN"));
        assert!(out.contains("65000"));
        assert!(out.contains("Top flows must be"));
    }
}
