use color_eyre::eyre::eyre;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use std::path::Path;
use std::sync::{mpsc::Sender, Arc};
use std::thread;
use tracing::{debug, info, warn};

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

use ratatui::widgets::Block;

pub mod backend;
pub mod cache;
pub mod chart_export;
pub mod cli;
pub mod config;
pub mod fields;
pub mod filters;
pub mod fragment;
pub mod location;
pub mod logging;
pub mod query_form;
pub mod suggest;
pub mod table;
pub mod visibility;
pub mod widgets;

pub use backend::{FlowBackend, HttpBackend, QueryTicket};
pub use cache::CacheManager;
pub use cli::Args;
pub use config::{
    rgb_to_256_color, rgb_to_basic_ansi, AppConfig, ColorParser, ConfigManager, Theme,
};

use chart_export::{write_chart_png, ChartOptions};
use fields::FieldCatalog;
use filters::{RowId, SuggestionRequest};
use location::Location;
use query_form::{FormEvent, QueryForm};
use table::NumericTable;
use visibility::{derive_visible_table, legend_order, SeriesVisibility, SortKey};
use widgets::chart::{render_message, FlowChart};
use widgets::controls::{Controls, FORM_CONTROLS, LEGEND_CONTROLS};
use widgets::debug::DebugState;
use widgets::legend::{Legend, LegendHit};
use widgets::query_form::QueryFormView;

/// Application name used for cache directory and other app-specific paths
pub const APP_NAME: &str = "flowdash";

const FORM_WIDTH: u16 = 46;
const LEGEND_MAX_HEIGHT: u16 = 14;

/// Rows for the legend box: borders, header and one row per series, capped.
fn legend_height(series: usize) -> u16 {
    u16::try_from(series)
        .unwrap_or(u16::MAX)
        .saturating_add(3)
        .min(LEGEND_MAX_HEIGHT)
}

pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16), // resized (width, height)
    /// The location fragment changed: decode it into the form and fetch.
    HashChanged(String),
    QueryResult {
        seq: u64,
        result: std::result::Result<String, String>,
    },
    Suggestions {
        row_id: RowId,
        field: String,
        result: std::result::Result<Vec<String>, String>,
    },
    Exit,
    Crash(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Form,
    Legend,
}

/// What the chart area shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ViewState {
    #[default]
    Idle,
    Loading,
    /// Raw response body or transport message
    Failed(String),
    Ready(NumericTable),
}

pub struct App {
    events: Sender<AppEvent>,
    backend: Arc<dyn FlowBackend>,
    config: AppConfig,
    theme: Theme,
    debug: DebugState,
    pub form: QueryForm,
    pub location: Location,
    pub visibility: SeriesVisibility,
    pub view: ViewState,
    pub focus: Focus,
    /// Cursor position in legend order
    pub legend_selected: usize,
    ticket: QueryTicket,
    legend_area: Option<Rect>,
    form_area: Option<Rect>,
}

impl App {
    pub fn send_event(&mut self, event: AppEvent) -> Result<()> {
        self.events.send(event)?;
        Ok(())
    }

    pub fn new(
        events: Sender<AppEvent>,
        config: AppConfig,
        backend: Arc<dyn FlowBackend>,
    ) -> Result<App> {
        let theme = Theme::from_config(&config.theme)?;
        let catalog = FieldCatalog::new(&config.fields.dicts);
        let mut form = QueryForm::new(&config.query, catalog);
        form.suggestion_limit = config.performance.suggestion_limit;
        form.editor = form.editor.with_theme(&theme);

        let debug = DebugState {
            enabled: config.debug.enabled,
            ..DebugState::default()
        };

        Ok(App {
            events,
            backend,
            config,
            theme,
            debug,
            form,
            location: Location::default(),
            visibility: SeriesVisibility::new(),
            view: ViewState::Idle,
            focus: Focus::Form,
            legend_selected: 0,
            ticket: QueryTicket::new(),
            legend_area: None,
            form_area: None,
        })
    }

    pub fn enable_debug(&mut self) {
        self.debug.enabled = true;
    }

    /// Open `location` (URL, `#fragment` or bare fragment) as the first history entry.
    pub fn start(&mut self, location: &str) -> AppEvent {
        let fragment = fragment::fragment_from_location(location).to_string();
        self.location = Location::new(&fragment);
        AppEvent::HashChanged(fragment)
    }

    pub fn table(&self) -> Option<&NumericTable> {
        match &self.view {
            ViewState::Ready(table) => Some(table),
            _ => None,
        }
    }

    /// Series indices as listed in the legend.
    pub fn legend_order(&self) -> Vec<usize> {
        self.table()
            .map(|t| legend_order(t, &self.visibility.sort))
            .unwrap_or_default()
    }

    fn navigate(&mut self, fragment: String) -> Option<AppEvent> {
        if self.location.navigate(&fragment) {
            info!(%fragment, "navigate");
            Some(AppEvent::HashChanged(fragment))
        } else {
            None
        }
    }

    fn back(&mut self) -> Option<AppEvent> {
        let fragment = self.location.back()?.to_string();
        self.debug.action("history_back");
        Some(AppEvent::HashChanged(fragment))
    }

    fn forward(&mut self) -> Option<AppEvent> {
        let fragment = self.location.forward()?.to_string();
        self.debug.action("history_forward");
        Some(AppEvent::HashChanged(fragment))
    }

    fn spawn_query(&self, seq: u64, fragment: String) {
        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        thread::spawn(move || {
            let result = backend.query(&fragment).map_err(|e| e.to_string());
            // The app may be gone by now
            let _ = events.send(AppEvent::QueryResult { seq, result });
        });
    }

    fn spawn_suggestions(&self, request: SuggestionRequest) {
        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        thread::spawn(move || {
            let result = backend
                .dict_values(&request.field)
                .map_err(|e| e.to_string());
            let _ = events.send(AppEvent::Suggestions {
                row_id: request.row_id,
                field: request.field,
                result,
            });
        });
    }

    fn hash_changed(&mut self, fragment: &str) {
        let state = fragment::decode(fragment);
        for request in self.form.populate(&state) {
            self.spawn_suggestions(request);
        }

        if fragment.is_empty() {
            self.view = ViewState::Idle;
            return;
        }

        let seq = self.ticket.issue();
        self.debug.query_seq = seq;
        self.view = ViewState::Loading;
        debug!(seq, %fragment, "query");
        self.spawn_query(seq, fragment.to_string());
    }

    fn query_result(&mut self, seq: u64, result: &std::result::Result<String, String>) {
        if !self.ticket.is_current(seq) {
            self.debug.dropped_results += 1;
            debug!(seq, latest = self.ticket.latest(), "dropping stale result");
            return;
        }
        self.view = match result {
            Ok(body) => match table::transform(body) {
                Ok(table) => {
                    self.visibility.reset(table.series_count());
                    self.legend_selected = self
                        .legend_selected
                        .min(table.series_count().saturating_sub(1));
                    info!(
                        seq,
                        series = table.series_count(),
                        rows = table.rows.len(),
                        "query result"
                    );
                    ViewState::Ready(table)
                }
                Err(e) => {
                    warn!(seq, error = %e, "could not parse query result");
                    ViewState::Failed(e.to_string())
                }
            },
            Err(message) => {
                warn!(seq, error = %message, "query failed");
                ViewState::Failed(message.clone())
            }
        };
    }

    fn legend_click(&mut self, series: usize, modified: bool) {
        self.visibility.click(series, modified);
        self.debug.action(if modified {
            "legend_toggle"
        } else {
            "legend_only"
        });
    }

    fn selected_series(&self) -> Option<usize> {
        self.legend_order().get(self.legend_selected).copied()
    }

    fn legend_key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        let modified = event
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
        let count = self.legend_order().len();
        match event.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(AppEvent::Exit),
            KeyCode::Up | KeyCode::Char('k') => {
                self.legend_selected = self.legend_selected.saturating_sub(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.legend_selected + 1 < count {
                    self.legend_selected += 1;
                }
                None
            }
            KeyCode::Enter => {
                if let Some(series) = self.selected_series() {
                    self.legend_click(series, modified);
                }
                None
            }
            KeyCode::Char(' ') => {
                if let Some(series) = self.selected_series() {
                    self.legend_click(series, true);
                }
                None
            }
            KeyCode::Char('l') => {
                self.visibility.sort_click(SortKey::Label);
                self.debug.action("sort_label");
                None
            }
            KeyCode::Char('m') => {
                self.visibility.sort_click(SortKey::Max);
                self.debug.action("sort_max");
                None
            }
            KeyCode::Char('[') => self.back(),
            KeyCode::Char(']') => self.forward(),
            _ => None,
        }
    }

    fn form_key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        if event.code == KeyCode::Esc {
            return Some(AppEvent::Exit);
        }
        match self.form.handle_key(event) {
            FormEvent::Submit(fragment) => {
                self.debug.action("submit");
                self.navigate(fragment)
            }
            FormEvent::Invalid(message) => {
                debug!(%message, "submit blocked");
                self.debug.action("submit_invalid");
                None
            }
            FormEvent::Suggest(request) => {
                self.spawn_suggestions(request);
                None
            }
            FormEvent::None => None,
        }
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        self.debug.on_key(event);

        let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
        let alt = event.modifiers.contains(KeyModifiers::ALT);
        match event.code {
            KeyCode::Char('c') if ctrl => return Some(AppEvent::Exit),
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Form => Focus::Legend,
                    Focus::Legend => Focus::Form,
                };
                return None;
            }
            KeyCode::Left if alt => return self.back(),
            KeyCode::Right if alt => return self.forward(),
            _ => {}
        }

        match self.focus {
            Focus::Form => self.form_key(event),
            Focus::Legend => self.legend_key(event),
        }
    }

    fn mouse(&mut self, event: &MouseEvent) -> Option<AppEvent> {
        self.debug.on_mouse();
        let (column, row) = (event.column, event.row);
        let in_legend = self
            .legend_area
            .filter(|a| a.contains((column, row).into()));

        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(area) = in_legend {
                    self.focus = Focus::Legend;
                    let order = self.legend_order();
                    let hit = match self.table() {
                        Some(table) => Legend {
                            table,
                            visibility: &self.visibility,
                            order: &order,
                            selected: self.legend_selected,
                            focused: true,
                            theme: &self.theme,
                        }
                        .hit(area, column, row),
                        None => None,
                    };
                    match hit {
                        Some(LegendHit::Header(key)) => self.visibility.sort_click(key),
                        Some(LegendHit::Series(series)) => {
                            let modified = event
                                .modifiers
                                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
                            if let Some(pos) = order.iter().position(|&s| s == series) {
                                self.legend_selected = pos;
                            }
                            self.legend_click(series, modified);
                        }
                        None => {}
                    }
                } else if self
                    .form_area
                    .is_some_and(|a| a.contains((column, row).into()))
                {
                    self.focus = Focus::Form;
                }
                None
            }
            MouseEventKind::ScrollDown if in_legend.is_some() => {
                if self.legend_selected + 1 < self.legend_order().len() {
                    self.legend_selected += 1;
                }
                None
            }
            MouseEventKind::ScrollUp if in_legend.is_some() => {
                self.legend_selected = self.legend_selected.saturating_sub(1);
                None
            }
            _ => None,
        }
    }

    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        self.debug.num_events += 1;
        match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::Mouse(mouse) => self.mouse(mouse),
            AppEvent::HashChanged(fragment) => {
                self.hash_changed(fragment);
                None
            }
            AppEvent::QueryResult { seq, result } => {
                self.query_result(*seq, result);
                None
            }
            AppEvent::Suggestions {
                row_id,
                field,
                result,
            } => {
                match result {
                    Ok(values) => {
                        if !self
                            .form
                            .filters
                            .apply_suggestions(*row_id, field, values.clone())
                        {
                            debug!(row_id, %field, "dropping suggestions for stale row");
                        }
                    }
                    Err(e) => warn!(row_id, %field, error = %e, "suggestions failed"),
                }
                None
            }
            AppEvent::Resize(_cols, _rows) => None,
            AppEvent::Exit | AppEvent::Crash(_) => None,
        }
    }

    fn render_chart_area(&mut self, area: Rect, buf: &mut Buffer) {
        let title = self.config.chart.title.clone();
        let message_style = Style::default().fg(self.theme.get("text_secondary"));
        self.legend_area = None;

        let table = match &self.view {
            ViewState::Idle => {
                render_message(area, buf, &title, "Submit a query to see flows", message_style);
                return;
            }
            ViewState::Loading => {
                render_message(area, buf, &title, "Loading…", message_style);
                return;
            }
            ViewState::Failed(message) => {
                let style = Style::default().fg(self.theme.get("error"));
                render_message(area, buf, &title, message, style);
                return;
            }
            ViewState::Ready(table) => table,
        };

        if table.is_empty() || table.series_count() == 0 {
            render_message(area, buf, &title, "No data found", message_style);
            return;
        }

        let legend_height = legend_height(table.series_count());
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Fill(1), Constraint::Length(legend_height)])
            .split(area);

        let visible = derive_visible_table(table, &self.visibility.visible);
        if visible.series_count() == 0 {
            render_message(layout[0], buf, &title, "No series selected", message_style);
        } else {
            let color_ids: Vec<usize> = (0..table.series_count())
                .filter(|&i| self.visibility.is_visible(i))
                .collect();
            FlowChart {
                table: &visible,
                color_ids: &color_ids,
                stacked: self.config.chart.stacked,
                y_starts_at_zero: self.config.chart.y_starts_at_zero,
                title: &title,
                theme: &self.theme,
            }
            .render(layout[0], buf);
        }

        let order = legend_order(table, &self.visibility.sort);
        Legend {
            table,
            visibility: &self.visibility,
            order: &order,
            selected: self.legend_selected,
            focused: self.focus == Focus::Legend,
            theme: &self.theme,
        }
        .render(layout[1], buf);
        self.legend_area = Some(layout[1]);
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.debug.num_frames += 1;

        Block::default()
            .style(Style::default().fg(self.theme.get("text_primary")))
            .render(area, buf);

        let mut constraints = vec![Constraint::Fill(1), Constraint::Length(1)]; // Main, controls
        if self.debug.enabled {
            constraints.push(Constraint::Length(1));
        }
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let main = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(FORM_WIDTH), Constraint::Fill(1)])
            .split(layout[0]);

        QueryFormView {
            form: &self.form,
            focused: self.focus == Focus::Form,
            theme: &self.theme,
        }
        .render(main[0], buf);
        self.form_area = Some(main[0]);

        self.render_chart_area(main[1], buf);

        let hints: &[(&str, &str)] = match self.focus {
            Focus::Form => &FORM_CONTROLS,
            Focus::Legend => &LEGEND_CONTROLS,
        };
        Controls::new(hints, self.location.current())
            .with_history(self.location.position())
            .with_colors(self.theme.get("controls_bg"), self.theme.get("primary"))
            .render(layout[1], buf);

        if self.debug.enabled && layout.len() > 2 {
            self.debug.render(layout[2], buf);
        }
    }
}

/// Fetch `fragment` once and write the chart to `path`.
pub fn export_chart(
    backend: &dyn FlowBackend,
    fragment: &str,
    path: &Path,
    config: &AppConfig,
) -> Result<()> {
    if fragment.is_empty() {
        return Err(eyre!("Nothing to export: the location has no query"));
    }
    let body = backend.query(fragment)?;
    let table = table::transform(&body)?;
    let options = ChartOptions {
        title: config.chart.title.clone(),
        stacked: config.chart.stacked,
        y_starts_at_zero: config.chart.y_starts_at_zero,
        ..ChartOptions::default()
    };
    info!(path = %path.display(), series = table.series_count(), "export chart");
    write_chart_png(path, &table, &options)
}
