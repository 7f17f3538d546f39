//! Derived views over the authoritative item list.
//!
//! Both functions are pure and cheap enough to run on every read, so nothing
//! here is memoized.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;

use super::criteria::{FilterCriteria, SortKey, SortOrder};
use crate::catalog::CatalogItem;

/// Contributor names listed in [`Statistics::contributors`].
pub const MAX_LISTED_CONTRIBUTORS: usize = 10;

/// Aggregates over the authoritative list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_items: usize,
    pub total_languages: usize,
    pub total_contributors: usize,
    pub total_searches: u64,
    /// Distinct languages in first-seen order.
    pub languages: Vec<String>,
    /// First [`MAX_LISTED_CONTRIBUTORS`] distinct contributor names, in
    /// first-seen order.
    pub contributors: Vec<String>,
}

/// Sortable projection of an item. Missing values sort as the number zero,
/// numbers sort before text.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SortValue {
    Number(i64),
    Text(String),
}

impl SortValue {
    fn text(value: Option<&str>) -> Self {
        match value {
            Some(s) if !s.is_empty() => SortValue::Text(s.to_lowercase()),
            _ => SortValue::Number(0),
        }
    }
}

fn sort_value(item: &CatalogItem, key: SortKey) -> SortValue {
    match key {
        SortKey::Title => SortValue::text(Some(item.title.as_str())),
        SortKey::Contributor => SortValue::text(item.contributor_name()),
        SortKey::Year => SortValue::Number(item.first_publish_year.map_or(0, i64::from)),
        SortKey::SearchCount => {
            SortValue::Number(i64::try_from(item.search_count).unwrap_or(i64::MAX))
        }
    }
}

/// Apply `criteria` to `items`: language filter, then term filter, then year
/// bounds, then a stable sort.
pub fn compute_filtered(items: &[CatalogItem], criteria: &FilterCriteria) -> Vec<CatalogItem> {
    let language = criteria
        .language
        .as_deref()
        .filter(|l| !l.is_empty())
        .map(str::to_lowercase);
    let term = criteria
        .search_term
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase);

    let mut filtered: Vec<CatalogItem> = items
        .iter()
        .filter(|item| match &language {
            Some(language) => item
                .language
                .as_deref()
                .is_some_and(|l| l.to_lowercase() == *language),
            None => true,
        })
        .filter(|item| match &term {
            Some(term) => {
                item.title.to_lowercase().contains(term.as_str())
                    || item
                        .contributor_name()
                        .is_some_and(|n| n.to_lowercase().contains(term.as_str()))
            }
            None => true,
        })
        .filter(|item| within_years(item, criteria.year_from, criteria.year_to))
        .cloned()
        .collect();

    // `sort_by` is stable; reversing the comparison keeps equal keys in
    // their original relative order.
    filtered.sort_by(|a, b| {
        let ord: Ordering = sort_value(a, criteria.sort_by).cmp(&sort_value(b, criteria.sort_by));
        match criteria.sort_order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });

    filtered
}

fn within_years(item: &CatalogItem, from: Option<i32>, to: Option<i32>) -> bool {
    if from.is_none() && to.is_none() {
        return true;
    }
    match item.first_publish_year {
        Some(year) => from.map_or(true, |f| year >= f) && to.map_or(true, |t| year <= t),
        None => false,
    }
}

/// Compute aggregate statistics for `items`.
pub fn compute_statistics(items: &[CatalogItem]) -> Statistics {
    let languages = distinct_in_order(items.iter().filter_map(|i| i.language.as_deref()));
    let contributors = distinct_in_order(items.iter().filter_map(|i| i.contributor_name()));
    let total_searches = items.iter().map(|i| i.search_count).sum();

    Statistics {
        total_items: items.len(),
        total_languages: languages.len(),
        total_contributors: contributors.len(),
        total_searches,
        languages,
        contributors: contributors
            .into_iter()
            .take(MAX_LISTED_CONTRIBUTORS)
            .collect(),
    }
}

fn distinct_in_order<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}
