//! Types for catalog items and their contributors.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::ids;

/// A book as returned by the catalog API.
///
/// Items are only ever built from gateway responses; callers treat them as
/// read-only values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    #[serde(deserialize_with = "ids::id")]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_publish_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(
        default,
        deserialize_with = "ids::optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub cover_id: Option<String>,
    #[serde(default, deserialize_with = "ids::count")]
    pub search_count: u64,
    #[serde(default, rename = "author", skip_serializing_if = "Option::is_none")]
    pub contributor: Option<Contributor>,
}

impl CatalogItem {
    /// Name of the item's contributor, if known.
    pub fn contributor_name(&self) -> Option<&str> {
        self.contributor.as_ref().map(|c| c.name.as_str())
    }
}

/// An author. Referenced by items, never owned by them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contributor {
    #[serde(deserialize_with = "ids::id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// Ids of the items attributed to this contributor.
    #[serde(
        default,
        rename = "books",
        deserialize_with = "ids::optional_id_set",
        skip_serializing_if = "Option::is_none"
    )]
    pub item_ids: Option<BTreeSet<String>>,
}

impl Contributor {
    /// Whether the contributor was alive at some point during `year`.
    ///
    /// Missing dates are open-ended: no birth date counts as born before
    /// `year`, no death date as still alive.
    pub fn is_alive_in(&self, year: i32) -> bool {
        let born = self.birth_date.map_or(true, |birth| birth.year() <= year);
        let not_dead = self.death_date.map_or(true, |death| death.year() >= year);
        born && not_dead
    }
}
