//! The query form: time range, breakdown, top flows and the filter rows.

use chrono::{Local, NaiveDateTime, TimeDelta};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::QueryConfig;
use crate::fields::FieldCatalog;
use crate::filters::{FilterRegistry, RowId, SuggestionRequest};
use crate::fragment::{self, QueryState};
use crate::suggest;
use crate::widgets::text_input::{TextInput, TextInputEvent};

pub const TOP_FLOWS_MIN: u32 = 1;
pub const TOP_FLOWS_MAX: u32 = 10_000;
/// Longest default time range: one year.
pub const WINDOW_MINUTES_MAX: i64 = 366 * 24 * 60;

/// Minute precision, the format the backend expects for time_start/time_end.
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

pub fn validate_top_flows(input: &str) -> Result<u32> {
    let trimmed = input.trim();
    match trimmed.parse::<u32>() {
        Ok(n) if (TOP_FLOWS_MIN..=TOP_FLOWS_MAX).contains(&n) => Ok(n),
        _ => Err(eyre!(
            "Top flows must be a whole number between {} and {} (got '{}')",
            TOP_FLOWS_MIN,
            TOP_FLOWS_MAX,
            trimmed
        )),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    TimeStart,
    TimeEnd,
    Breakdown,
    TopFlows,
    FilterField(RowId),
    FilterValue(RowId),
    AddFilter,
    Submit,
}

impl FormField {
    fn is_text(self) -> bool {
        matches!(
            self,
            FormField::TimeStart
                | FormField::TimeEnd
                | FormField::TopFlows
                | FormField::FilterValue(_)
        )
    }
}

/// What the App has to do after the form handled a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    None,
    /// Validated and encoded; navigate to this fragment.
    Submit(String),
    /// Submission blocked; message is also kept in `error`.
    Invalid(String),
    Suggest(SuggestionRequest),
}

pub struct QueryForm {
    pub time_start: String,
    pub time_end: String,
    pub breakdown: Vec<String>,
    /// Position in the field catalog shown by the breakdown selector
    pub breakdown_cursor: usize,
    pub top_flows: String,
    pub filters: FilterRegistry,
    pub focus: FormField,
    pub error: Option<String>,
    pub catalog: FieldCatalog,
    pub suggestion_limit: usize,
    /// Editor for whichever text field has focus
    pub editor: TextInput,
}

impl QueryForm {
    pub fn new(config: &QueryConfig, catalog: FieldCatalog) -> Self {
        Self::with_now(config, catalog, Local::now().naive_local())
    }

    pub fn with_now(config: &QueryConfig, catalog: FieldCatalog, now: NaiveDateTime) -> Self {
        let start = TimeDelta::try_minutes(config.default_window_minutes)
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(now);
        let mut form = Self {
            time_start: start.format(TIME_FORMAT).to_string(),
            time_end: now.format(TIME_FORMAT).to_string(),
            breakdown: config.default_breakdown.clone(),
            breakdown_cursor: 0,
            top_flows: config.default_top_flows.to_string(),
            filters: FilterRegistry::new(),
            focus: FormField::TimeStart,
            error: None,
            catalog,
            suggestion_limit: 8,
            editor: TextInput::new(),
        };
        form.load_editor();
        form
    }

    /// The form's current content as query state (not validated).
    pub fn state(&self) -> QueryState {
        QueryState {
            filters: self
                .filters
                .filters()
                .into_iter()
                .filter(|f| !f.field.is_empty() && !f.value.is_empty())
                .collect(),
            time_start: Some(self.time_start.clone()),
            time_end: Some(self.time_end.clone()),
            breakdown: self.breakdown.clone(),
            top_flows: Some(self.top_flows.clone()),
        }
    }

    /// Fill the form from a decoded fragment. Keys the fragment lacks keep
    /// their current value. Filter rows are rebuilt, one per decoded filter,
    /// and each asks for value suggestions.
    pub fn populate(&mut self, state: &QueryState) -> Vec<SuggestionRequest> {
        if let Some(v) = &state.time_start {
            self.time_start = v.clone();
        }
        if let Some(v) = &state.time_end {
            self.time_end = v.clone();
        }
        if let Some(v) = &state.top_flows {
            self.top_flows = v.clone();
        }
        if !state.breakdown.is_empty() {
            self.breakdown = state.breakdown.clone();
            if let Some(pos) = self.catalog.position(&self.breakdown[0]) {
                self.breakdown_cursor = pos;
            }
        }

        self.filters.clear();
        let mut requests = Vec::new();
        for filter in &state.filters {
            let id = self.filters.add_filter(None);
            if let Some(request) = self.filters.on_field_change(id, &filter.field) {
                requests.push(request);
            }
            self.filters.set_value(id, &filter.value);
        }

        if !self.focus_order().contains(&self.focus) {
            self.focus = FormField::TimeStart;
        }
        self.error = None;
        self.load_editor();
        requests
    }

    /// Validate and encode. On failure nothing but `error` changes.
    pub fn submit(&mut self) -> Result<String> {
        match validate_top_flows(&self.top_flows) {
            Ok(n) => {
                self.error = None;
                self.top_flows = n.to_string();
                self.load_editor();
                Ok(fragment::encode(&self.state()))
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn add_filter(&mut self) -> Option<SuggestionRequest> {
        let field = self
            .catalog
            .fields()
            .first()
            .map(|f| f.name.clone())
            .unwrap_or_default();
        let id = self.filters.add_filter(None);
        self.set_focus(FormField::FilterField(id));
        self.filters.on_field_change(id, &field)
    }

    pub fn remove_filter(&mut self, row_id: RowId) {
        let order = self.focus_order();
        let removed_at = order
            .iter()
            .position(|f| *f == FormField::FilterField(row_id));
        if !self.filters.remove_filter(row_id) {
            return;
        }
        let next = removed_at
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| order.get(i).copied())
            .unwrap_or(FormField::TimeStart);
        self.set_focus(next);
    }

    pub fn focus_order(&self) -> Vec<FormField> {
        let mut order = vec![
            FormField::TimeStart,
            FormField::TimeEnd,
            FormField::Breakdown,
            FormField::TopFlows,
        ];
        for id in self.filters.ids() {
            order.push(FormField::FilterField(id));
            order.push(FormField::FilterValue(id));
        }
        order.push(FormField::AddFilter);
        order.push(FormField::Submit);
        order
    }

    pub fn set_focus(&mut self, field: FormField) {
        self.focus = field;
        self.load_editor();
    }

    fn move_focus(&mut self, step: isize) {
        let order = self.focus_order();
        let len = order.len() as isize;
        let current = order.iter().position(|f| *f == self.focus).unwrap_or(0) as isize;
        let next = (current + step).rem_euclid(len) as usize;
        self.set_focus(order[next]);
    }

    fn text_value(&self, field: FormField) -> String {
        match field {
            FormField::TimeStart => self.time_start.clone(),
            FormField::TimeEnd => self.time_end.clone(),
            FormField::TopFlows => self.top_flows.clone(),
            FormField::FilterValue(id) => self
                .filters
                .row(id)
                .map(|r| r.value.clone())
                .unwrap_or_default(),
            _ => String::new(),
        }
    }

    fn store_text(&mut self, field: FormField, value: &str) {
        match field {
            FormField::TimeStart => self.time_start = value.to_string(),
            FormField::TimeEnd => self.time_end = value.to_string(),
            FormField::TopFlows => self.top_flows = value.to_string(),
            FormField::FilterValue(id) => {
                self.filters.set_value(id, value);
            }
            _ => {}
        }
    }

    fn load_editor(&mut self) {
        let value = self.text_value(self.focus);
        self.editor.set_value(&value);
        self.editor.set_focused(self.focus.is_text());
    }

    /// Suggestions for the value input of `row_id`, filtered by what was typed.
    pub fn visible_suggestions(&self, row_id: RowId) -> Vec<&str> {
        match self.filters.row(row_id) {
            Some(row) => suggest::matching(&row.suggestions, &row.value, self.suggestion_limit),
            None => Vec::new(),
        }
    }

    pub fn toggle_breakdown(&mut self, field: &str) {
        if let Some(pos) = self.breakdown.iter().position(|b| b == field) {
            self.breakdown.remove(pos);
        } else {
            self.breakdown.push(field.to_string());
        }
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> FormEvent {
        let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);

        match (event.code, ctrl) {
            (KeyCode::Char('n'), true) => {
                return match self.add_filter() {
                    Some(request) => FormEvent::Suggest(request),
                    None => FormEvent::None,
                };
            }
            (KeyCode::Char('d'), true) => {
                if let FormField::FilterField(id) | FormField::FilterValue(id) = self.focus {
                    self.remove_filter(id);
                }
                return FormEvent::None;
            }
            (KeyCode::Up, _) | (KeyCode::BackTab, _) => {
                self.move_focus(-1);
                return FormEvent::None;
            }
            (KeyCode::Down, _) => {
                self.move_focus(1);
                return FormEvent::None;
            }
            _ => {}
        }

        match self.focus {
            FormField::Breakdown => self.breakdown_key(event),
            FormField::FilterField(id) => self.filter_field_key(id, event),
            FormField::AddFilter if event.code == KeyCode::Enter => match self.add_filter() {
                Some(request) => FormEvent::Suggest(request),
                None => FormEvent::None,
            },
            FormField::Submit if event.code == KeyCode::Enter => self.submit_event(),
            FormField::FilterValue(id) if ctrl && event.code == KeyCode::Char(' ') => {
                let first = self
                    .visible_suggestions(id)
                    .first()
                    .map(|s| s.to_string());
                if let Some(value) = first {
                    self.filters.set_value(id, &value);
                    self.load_editor();
                }
                FormEvent::None
            }
            field if field.is_text() => match self.editor.handle_key(event) {
                TextInputEvent::Submit => self.submit_event(),
                TextInputEvent::Changed => {
                    let value = self.editor.value().to_string();
                    self.store_text(field, &value);
                    FormEvent::None
                }
                TextInputEvent::Cancel | TextInputEvent::None => FormEvent::None,
            },
            _ => FormEvent::None,
        }
    }

    fn submit_event(&mut self) -> FormEvent {
        match self.submit() {
            Ok(fragment) => FormEvent::Submit(fragment),
            Err(e) => FormEvent::Invalid(e.to_string()),
        }
    }

    fn breakdown_key(&mut self, event: &KeyEvent) -> FormEvent {
        let len = self.catalog.len();
        match event.code {
            KeyCode::Left if len > 0 => {
                self.breakdown_cursor = (self.breakdown_cursor + len - 1) % len;
            }
            KeyCode::Right if len > 0 => {
                self.breakdown_cursor = (self.breakdown_cursor + 1) % len;
            }
            KeyCode::Char(' ') => {
                if let Some(field) = self.catalog.fields().get(self.breakdown_cursor) {
                    let name = field.name.clone();
                    self.toggle_breakdown(&name);
                }
            }
            KeyCode::Enter => return self.submit_event(),
            _ => {}
        }
        FormEvent::None
    }

    fn filter_field_key(&mut self, row_id: RowId, event: &KeyEvent) -> FormEvent {
        let step = match event.code {
            KeyCode::Left => -1,
            KeyCode::Right => 1,
            KeyCode::Delete => {
                self.remove_filter(row_id);
                return FormEvent::None;
            }
            KeyCode::Enter => return self.submit_event(),
            _ => return FormEvent::None,
        };
        let current = self
            .filters
            .row(row_id)
            .map(|r| r.field.clone())
            .unwrap_or_default();
        let next = match self.catalog.cycle(&current, step) {
            Some(name) => name.to_string(),
            None => return FormEvent::None,
        };
        match self.filters.on_field_change(row_id, &next) {
            Some(request) => FormEvent::Suggest(request),
            None => FormEvent::None,
        }
    }
}
