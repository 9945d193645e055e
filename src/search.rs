//! Generic multi-field predicate engine
//!
//! Shared by catalogue search and member lookup. Two disjoint modes:
//! free-text (OR over a fixed set of fields, see [`free_text`]) and
//! structured (AND over every supplied field, built up with a
//! [`FieldMatcher`]). A structured spec with zero supplied fields matches
//! nothing; an empty query is not a wildcard.

/// Case-insensitive substring test
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Free-text mode: true when the needle occurs (case-insensitively) in any
/// of the given fields. An empty needle is a substring of everything and
/// therefore matches every entity.
pub fn free_text(needle: &str, fields: &[&str]) -> bool {
    fields.iter().any(|field| contains_ci(field, needle))
}

/// Structured-mode accumulator: the logical AND of every supplied field
/// predicate, `false` when nothing was supplied.
#[derive(Debug, Clone, Copy)]
pub struct FieldMatcher {
    supplied: usize,
    all: bool,
}

impl FieldMatcher {
    pub fn new() -> Self {
        Self {
            supplied: 0,
            all: true,
        }
    }

    /// Exact string equality, e.g. for id fields
    pub fn exact(mut self, needle: Option<&str>, value: &str) -> Self {
        if let Some(needle) = needle {
            self.supplied += 1;
            self.all &= value == needle;
        }
        self
    }

    /// Case-insensitive substring match
    pub fn contains(mut self, needle: Option<&str>, value: &str) -> Self {
        if let Some(needle) = needle {
            self.supplied += 1;
            self.all &= contains_ci(value, needle);
        }
        self
    }

    /// Case-sensitive substring match, e.g. for ISBNs
    pub fn contains_exact(mut self, needle: Option<&str>, value: &str) -> Self {
        if let Some(needle) = needle {
            self.supplied += 1;
            self.all &= value.contains(needle);
        }
        self
    }

    /// Boolean requirement, only counted when requested
    pub fn flag(mut self, required: bool, value: bool) -> Self {
        if required {
            self.supplied += 1;
            self.all &= value;
        }
        self
    }

    /// Final verdict: AND of all supplied predicates, `false` for none
    pub fn matches(self) -> bool {
        self.supplied > 0 && self.all
    }
}

impl Default for FieldMatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_spec_matches_nothing() {
        assert!(!FieldMatcher::new().matches());
    }

    #[test]
    fn test_and_semantics() {
        let hit = FieldMatcher::new()
            .contains(Some("rust"), "The Rust Book")
            .exact(Some("7"), "7")
            .matches();
        assert!(hit);

        let miss = FieldMatcher::new()
            .contains(Some("rust"), "The Rust Book")
            .exact(Some("8"), "7")
            .matches();
        assert!(!miss);
    }

    #[test]
    fn test_unsupplied_fields_are_ignored() {
        let hit = FieldMatcher::new()
            .contains(None, "irrelevant")
            .flag(true, true)
            .matches();
        assert!(hit);
    }

    #[test]
    fn test_flag_only_counted_when_requested() {
        // flag not requested and nothing else supplied: still nothing
        assert!(!FieldMatcher::new().flag(false, true).matches());
    }

    #[test]
    fn test_free_text_empty_needle_matches_all() {
        assert!(free_text("", &["anything"]));
        assert!(free_text("ALIce", &["Alice in Wonderland", "Carroll"]));
        assert!(!free_text("bob", &["Alice in Wonderland", "Carroll"]));
    }
}
