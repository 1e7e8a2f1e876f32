use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    widgets::{Paragraph, Widget},
};

/// Key hints for the part of the screen that has focus.
pub const FORM_CONTROLS: [(&str, &str); 6] = [
    ("Enter", "Submit"),
    ("^N", "Add filter"),
    ("^D", "Remove"),
    ("Tab", "Legend"),
    ("A-←/→", "History"),
    ("Esc", "Quit"),
];

pub const LEGEND_CONTROLS: [(&str, &str); 7] = [
    ("Enter", "Only"),
    ("Space", "Toggle"),
    ("l", "Sort label"),
    ("m", "Sort max"),
    ("[/]", "History"),
    ("Tab", "Form"),
    ("q", "Quit"),
];

pub struct Controls<'a> {
    pub controls: &'a [(&'a str, &'a str)],
    /// Shareable fragment of the active query
    pub fragment: &'a str,
    /// 1-based history position and entry count
    pub history: (usize, usize),
    pub background: Color,
    pub accent: Color,
}

impl<'a> Controls<'a> {
    pub fn new(controls: &'a [(&'a str, &'a str)], fragment: &'a str) -> Self {
        Self {
            controls,
            fragment,
            history: (1, 1),
            background: Color::DarkGray,
            accent: Color::Cyan,
        }
    }

    pub fn with_history(mut self, history: (usize, usize)) -> Self {
        self.history = history;
        self
    }

    pub fn with_colors(mut self, background: Color, accent: Color) -> Self {
        self.background = background;
        self.accent = accent;
        self
    }
}

impl Widget for &Controls<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut constraints = self
            .controls
            .iter()
            .fold(vec![], |mut acc, (key, action)| {
                acc.push(Constraint::Length(key.chars().count() as u16 + 2));
                acc.push(Constraint::Length(action.chars().count() as u16 + 1));
                acc
            });
        constraints.push(Constraint::Fill(1)); // Fragment fills the remaining space

        let layout = Layout::new(Direction::Horizontal, constraints).split(area);

        let base_style = Style::default();

        for (i, (key, action)) in self.controls.iter().enumerate() {
            let j = i * 2;
            Paragraph::new(*key)
                .style(base_style.bold())
                .centered()
                .render(layout[j], buf);
            Paragraph::new(*action)
                .style(base_style.bg(self.background))
                .render(layout[j + 1], buf);
        }

        let (pos, len) = self.history;
        let fragment = if self.fragment.is_empty() {
            "(no query)"
        } else {
            self.fragment
        };
        Paragraph::new(format!("#{} [{}/{}] ", fragment, pos, len))
            .style(base_style.bg(self.background).fg(self.accent))
            .right_aligned()
            .render(layout[self.controls.len() * 2], buf);
    }
}
