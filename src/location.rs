//! The dashboard's fragment with back/forward history for the session.

#[derive(Debug, Clone, Default)]
pub struct Location {
    entries: Vec<String>,
    index: usize,
}

impl Location {
    pub fn new(initial: &str) -> Self {
        Self {
            entries: vec![initial.trim_start_matches('#').to_string()],
            index: 0,
        }
    }

    pub fn current(&self) -> &str {
        self.entries
            .get(self.index)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Push a new fragment. Forward entries are dropped. Returns `false` when
    /// the fragment is the one already shown (no hash change).
    pub fn navigate(&mut self, fragment: &str) -> bool {
        let fragment = fragment.trim_start_matches('#');
        if self.entries.is_empty() {
            self.entries.push(fragment.to_string());
            self.index = 0;
            return true;
        }
        if fragment == self.current() {
            return false;
        }
        self.entries.truncate(self.index + 1);
        self.entries.push(fragment.to_string());
        self.index = self.entries.len() - 1;
        true
    }

    pub fn back(&mut self) -> Option<&str> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(self.current())
    }

    pub fn forward(&mut self) -> Option<&str> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(self.current())
    }

    /// (1-based position, number of entries)
    pub fn position(&self) -> (usize, usize) {
        (self.index + 1, self.entries.len().max(1))
    }
}
