use ratatui::{
    buffer::Buffer,
    layout::Rect,
    widgets::{Paragraph, Widget},
};

#[derive(Default)]
pub struct DebugState {
    pub num_events: usize,
    pub num_frames: usize,
    pub num_key_events: usize,
    pub num_mouse_events: usize,
    pub last_key_event_name: String,
    /// Last action taken (e.g. "legend_click") for debugging key handling.
    pub last_action: String,
    pub enabled: bool,
    /// Sequence of the query fetch the view is waiting for (0 = none issued).
    pub query_seq: u64,
    pub dropped_results: usize,
}

impl DebugState {
    pub fn on_key(&mut self, event: &crossterm::event::KeyEvent) {
        self.num_key_events += 1;
        self.last_key_event_name = format!("{:?}", event.code);
    }

    pub fn on_mouse(&mut self) {
        self.num_mouse_events += 1;
    }

    pub fn action(&mut self, name: &str) {
        self.last_action = name.to_string();
    }
}

impl Widget for &DebugState {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(format!(
            "events={} keys={} mouse={} last_key={} last_action={} seq={} dropped={} frames={}",
            self.num_events,
            self.num_key_events,
            self.num_mouse_events,
            self.last_key_event_name,
            self.last_action,
            self.query_seq,
            self.dropped_results,
            self.num_frames,
        ))
        .render(area, buf);
    }
}
