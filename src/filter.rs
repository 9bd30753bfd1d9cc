use crate::models::Counter;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Category(String),
}

impl CategoryFilter {
    /// `"all"` (any case) selects everything; anything else is a category name.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            CategoryFilter::All
        } else {
            CategoryFilter::Category(trimmed.to_string())
        }
    }

    pub fn matches(&self, counter: &Counter) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Category(wanted) => {
                counter.category.as_deref() == Some(wanted.as_str())
            }
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all"),
            CategoryFilter::Category(name) => f.write_str(name),
        }
    }
}

pub fn filter_counters(counters: &[Counter], filter: &CategoryFilter) -> Vec<Counter> {
    counters
        .iter()
        .filter(|counter| filter.matches(counter))
        .cloned()
        .collect()
}

/// Distinct non-empty categories in first-seen order.
pub fn categories(counters: &[Counter]) -> Vec<String> {
    let mut seen = HashSet::new();
    counters
        .iter()
        .filter_map(|counter| counter.category.as_deref())
        .filter(|category| !category.is_empty())
        .filter(|category| seen.insert(*category))
        .map(str::to_string)
        .collect()
}
