use serde::{Deserialize, Serialize};

/// Field the filtered view is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Title,
    #[serde(rename = "author")]
    Contributor,
    Year,
    #[default]
    SearchCount,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Filter and sort settings for the derived item view.
///
/// The default is the "cleared" state: no language, no search term, no year
/// bounds, most searched first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    /// Exact language match, case-insensitive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Case-insensitive substring of the title or contributor name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
    #[serde(default)]
    pub sort_by: SortKey,
    #[serde(default)]
    pub sort_order: SortOrder,
    /// Inclusive lower bound on the publication year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_from: Option<i32>,
    /// Inclusive upper bound on the publication year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_to: Option<i32>,
}

/// A change to a single criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterUpdate {
    Language(Option<String>),
    SearchTerm(Option<String>),
    SortBy(SortKey),
    SortOrder(SortOrder),
    YearFrom(Option<i32>),
    YearTo(Option<i32>),
}

impl FilterCriteria {
    pub fn apply(&mut self, update: FilterUpdate) {
        match update {
            FilterUpdate::Language(language) => self.language = non_empty(language),
            FilterUpdate::SearchTerm(term) => self.search_term = non_empty(term),
            FilterUpdate::SortBy(key) => self.sort_by = key,
            FilterUpdate::SortOrder(order) => self.sort_order = order,
            FilterUpdate::YearFrom(year) => self.year_from = year,
            FilterUpdate::YearTo(year) => self.year_to = year,
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// An empty string clears the criterion.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
