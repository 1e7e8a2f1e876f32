//! Query state and its `key=value&...` fragment encoding.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

pub const KEY_BREAKDOWN: &str = "breakdown";
pub const KEY_TIME_START: &str = "time_start";
pub const KEY_TIME_END: &str = "time_end";
pub const KEY_TOP_FLOWS: &str = "topFlows";

/// Form bookkeeping keys of the web form (`filter_field[N]`) that never carry a filter.
const FILTER_FIELD_PREFIX: &str = "filter_field";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub value: String,
}

impl Filter {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Everything a query is made of. This is what lives in the fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryState {
    pub filters: Vec<Filter>,
    pub time_start: Option<String>,
    pub time_end: Option<String>,
    pub breakdown: Vec<String>,
    /// Kept as entered; only validated when the form is submitted.
    pub top_flows: Option<String>,
}

impl QueryState {
    pub fn is_empty(&self) -> bool {
        self == &QueryState::default()
    }
}

pub fn is_reserved_key(key: &str) -> bool {
    matches!(
        key,
        KEY_BREAKDOWN | KEY_TIME_START | KEY_TIME_END | KEY_TOP_FLOWS
    )
}

/// Serialize the non-empty parts of `state` as `key=value` pairs joined by `&`.
///
/// Filters use their field name as key, so two filters on the same field
/// produce two pairs with the same key. Keys and values are both escaped.
pub fn encode(state: &QueryState) -> String {
    let mut pairs: Vec<String> = Vec::new();
    let mut push = |key: &str, value: &str| {
        if !key.is_empty() && !value.is_empty() {
            pairs.push(format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            ));
        }
    };

    for field in &state.breakdown {
        push(KEY_BREAKDOWN, field);
    }
    if let Some(v) = &state.time_start {
        push(KEY_TIME_START, v);
    }
    if let Some(v) = &state.time_end {
        push(KEY_TIME_END, v);
    }
    if let Some(v) = &state.top_flows {
        push(KEY_TOP_FLOWS, v.trim());
    }
    for filter in &state.filters {
        push(&filter.field, &filter.value);
    }

    pairs.join("&")
}

/// Parse a fragment back into a [`QueryState`]. Never fails: unknown shapes are skipped.
pub fn decode(fragment: &str) -> QueryState {
    let mut state = QueryState::default();
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);

    for pair in fragment.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(key);
        let value = decode_component(raw_value).into_owned();

        match key.as_ref() {
            "" => {}
            KEY_BREAKDOWN => {
                if !value.is_empty() {
                    state.breakdown.push(value);
                }
            }
            KEY_TIME_START => state.time_start = non_empty(value),
            KEY_TIME_END => state.time_end = non_empty(value),
            KEY_TOP_FLOWS => state.top_flows = non_empty(value),
            k if k.starts_with(FILTER_FIELD_PREFIX) => {}
            k => state.filters.push(Filter::new(k, value)),
        }
    }

    state
}

/// Extract the fragment from whatever the user handed us: a full URL, `#a=b`, or `a=b`.
pub fn fragment_from_location(location: &str) -> &str {
    let location = location.trim();
    match location.split_once('#') {
        Some((_, fragment)) => fragment,
        None if location.contains("://") => "",
        None => location,
    }
}

/// `+` means space in form encoding. A broken escape keeps the raw text.
fn decode_component(raw: &str) -> Cow<'_, str> {
    let spaced: Cow<'_, str> = if raw.contains('+') {
        Cow::Owned(raw.replace('+', " "))
    } else {
        Cow::Borrowed(raw)
    };
    match urlencoding::decode(&spaced) {
        Ok(decoded) => Cow::Owned(decoded.into_owned()),
        Err(_) => spaced,
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
