//! Filter rows of the query form, keyed by stable row ids.

use crate::fragment::Filter;

pub type RowId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRow {
    pub id: RowId,
    pub field: String,
    /// Key the value is submitted under; follows `field`.
    pub value_input_name: String,
    pub value: String,
    pub suggestions: Vec<String>,
}

/// Ask the suggestion collaborator for candidate values of `field` on behalf of `row_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionRequest {
    pub row_id: RowId,
    pub field: String,
}

/// Source of truth for the filter rows. Widgets only render it.
#[derive(Debug, Default, Clone)]
pub struct FilterRegistry {
    next_id: RowId,
    rows: Vec<FilterRow>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new row. Ids are never handed out twice, even after removal.
    pub fn add_filter(&mut self, initial_field: Option<&str>) -> RowId {
        let id = self.next_id;
        self.next_id += 1;
        let field = initial_field.unwrap_or_default().to_string();
        self.rows.push(FilterRow {
            id,
            value_input_name: field.clone(),
            field,
            value: String::new(),
            suggestions: Vec::new(),
        });
        id
    }

    /// Rebind the row to `field` and request suggestions for it.
    /// Returns `None` for a row that no longer exists.
    pub fn on_field_change(&mut self, row_id: RowId, field: &str) -> Option<SuggestionRequest> {
        let row = self.row_mut(row_id)?;
        row.field = field.to_string();
        row.value_input_name = field.to_string();
        row.suggestions.clear();
        if field.is_empty() {
            return None;
        }
        Some(SuggestionRequest {
            row_id,
            field: field.to_string(),
        })
    }

    pub fn remove_filter(&mut self, row_id: RowId) -> bool {
        let before = self.rows.len();
        self.rows.retain(|r| r.id != row_id);
        self.rows.len() != before
    }

    pub fn set_value(&mut self, row_id: RowId, value: &str) -> bool {
        match self.row_mut(row_id) {
            Some(row) => {
                row.value = value.to_string();
                true
            }
            None => false,
        }
    }

    /// Store suggestions fetched for `field`. Dropped if the row is gone or was rebound.
    pub fn apply_suggestions(&mut self, row_id: RowId, field: &str, values: Vec<String>) -> bool {
        match self.row_mut(row_id) {
            Some(row) if row.field == field => {
                row.suggestions = values;
                true
            }
            _ => false,
        }
    }

    pub fn row(&self, row_id: RowId) -> Option<&FilterRow> {
        self.rows.iter().find(|r| r.id == row_id)
    }

    fn row_mut(&mut self, row_id: RowId) -> Option<&mut FilterRow> {
        self.rows.iter_mut().find(|r| r.id == row_id)
    }

    pub fn rows(&self) -> &[FilterRow] {
        &self.rows
    }

    pub fn ids(&self) -> Vec<RowId> {
        self.rows.iter().map(|r| r.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Drop every row. The id counter keeps counting.
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn filters(&self) -> Vec<Filter> {
        self.rows
            .iter()
            .map(|r| Filter::new(r.value_input_name.clone(), r.value.clone()))
            .collect()
    }
}
