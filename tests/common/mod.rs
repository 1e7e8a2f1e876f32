#![allow(dead_code)]

use color_eyre::eyre::eyre;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use flowdash::{App, AppConfig, AppEvent, FlowBackend};
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const FLOWS_CSV: &str = "timestamp,AS3320,AS65000,AS174\n\
2024-03-01T10:00:00Z,100,0,30\n\
2024-03-01T10:01:00Z,0,0,0\n\
2024-03-01T10:02:00Z,250,80,20\n";

/// Canned backend: answers every query with `default_body` unless a
/// fragment has its own response, and records what was asked.
pub struct FakeBackend {
    default_body: String,
    responses: HashMap<String, std::result::Result<String, String>>,
    dict_values: HashMap<String, Vec<String>>,
    pub queries: Mutex<Vec<String>>,
    pub dict_requests: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new(default_body: &str) -> Self {
        Self {
            default_body: default_body.to_string(),
            responses: HashMap::new(),
            dict_values: HashMap::new(),
            queries: Mutex::new(Vec::new()),
            dict_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_error(mut self, fragment: &str, body: &str) -> Self {
        self.responses
            .insert(fragment.to_string(), Err(body.to_string()));
        self
    }

    pub fn with_body(mut self, fragment: &str, body: &str) -> Self {
        self.responses
            .insert(fragment.to_string(), Ok(body.to_string()));
        self
    }

    pub fn with_dict(mut self, field: &str, values: &[&str]) -> Self {
        self.dict_values.insert(
            field.to_string(),
            values.iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl FlowBackend for FakeBackend {
    fn query(&self, fragment: &str) -> Result<String> {
        self.queries.lock().unwrap().push(fragment.to_string());
        match self.responses.get(fragment) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(body)) => Err(eyre!("{}", body)),
            None => Ok(self.default_body.clone()),
        }
    }

    fn dict_values(&self, field: &str) -> Result<Vec<String>> {
        self.dict_requests.lock().unwrap().push(field.to_string());
        self.dict_values
            .get(field)
            .cloned()
            .ok_or_else(|| eyre!("no dictionary for {}", field))
    }
}

pub fn new_app(backend: Arc<FakeBackend>) -> (App, Receiver<AppEvent>) {
    let (tx, rx) = mpsc::channel();
    let app = App::new(tx, AppConfig::default(), backend).expect("app");
    (app, rx)
}

/// Feed `event` and everything it leads to, including worker results,
/// until the channel stays quiet.
pub fn run_event(app: &mut App, rx: &Receiver<AppEvent>, event: AppEvent) {
    let mut next = app.event(&event);
    loop {
        while let Some(event) = next {
            next = app.event(&event);
        }
        match rx.recv_timeout(Duration::from_millis(500)) {
            Ok(event) => next = Some(event),
            Err(_) => break,
        }
    }
}

pub fn key(code: KeyCode) -> AppEvent {
    AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

pub fn key_with(code: KeyCode, modifiers: KeyModifiers) -> AppEvent {
    AppEvent::Key(KeyEvent::new(code, modifiers))
}

pub fn render(app: &mut App, width: u16, height: u16) -> String {
    let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
    terminal
        .draw(|frame| frame.render_widget(&mut *app, frame.area()))
        .unwrap();
    let buffer = terminal.backend().buffer().clone();
    let mut out = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            out.push_str(buffer[(x, y)].symbol());
        }
        out.push('\n');
    }
    out
}
