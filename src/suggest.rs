//! Autocomplete matching for filter values.

/// Candidates matching `input`: prefix matches first, then substring matches,
/// both case-insensitive and in candidate order. Empty input matches everything.
pub fn matching<'a>(candidates: &'a [String], input: &str, limit: usize) -> Vec<&'a str> {
    let needle = input.trim().to_lowercase();
    let mut prefix = Vec::new();
    let mut contains = Vec::new();
    for candidate in candidates {
        let lower = candidate.to_lowercase();
        if lower.starts_with(&needle) {
            prefix.push(candidate.as_str());
        } else if lower.contains(&needle) {
            contains.push(candidate.as_str());
        }
    }
    prefix.extend(contains);
    prefix.truncate(limit);
    prefix
}
