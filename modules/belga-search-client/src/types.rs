use chrono::NaiveDate;

use newsbridge_core::item::NewsItem;

use crate::period::Period;

/// Paging plus free-text, the part every provider shares.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub from: u64,
    pub size: u64,
    pub query_string: Option<String>,
    /// Press is the only provider that honors sort direction.
    pub sort_ascending: bool,
}

impl SearchQuery {
    pub fn new(from: u64, size: u64) -> Self {
        Self {
            from,
            size,
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.query_string = Some(text.into());
        self
    }

    pub fn size_or_default(&self) -> u64 {
        if self.size == 0 {
            25
        } else {
            self.size
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Facets picked in the search panel. A period overrides explicit dates.
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pub sources: Vec<String>,
    pub subjects: Vec<String>,
    pub period: Option<Period>,
    pub credits: Option<String>,
    pub languages: Option<String>,
    pub types: Option<String>,
    pub dates: DateRange,
}

#[derive(Debug, Default)]
pub struct SearchResult {
    pub docs: Vec<NewsItem>,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_falls_back_to_a_page_of_25() {
        assert_eq!(SearchQuery::new(0, 0).size_or_default(), 25);
        assert_eq!(SearchQuery::new(0, 50).size_or_default(), 50);
    }
}
