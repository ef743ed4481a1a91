//! Free-text search over the cached catalog
//!
//! Pure and stateless: recomputed from the current query and snapshot.
//! Matching is case-insensitive substring containment over a fixed set of
//! text fields per entity kind.

use serde::Serialize;
use std::sync::Arc;

use crate::cache::Catalog;
use crate::models::{Collection, Meditation, Miracle};

/// Lower-cased search needle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    raw: String,
    needle: String,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        let raw = query.into();
        let needle = raw.to_lowercase();
        Self { raw, needle }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// True when any field contains the needle (always true for "")
    pub fn matches<'a>(&self, mut fields: impl Iterator<Item = &'a str>) -> bool {
        self.is_empty() || fields.any(|f| f.to_lowercase().contains(&self.needle))
    }
}

/// Entities that take part in search
pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;

    fn matches(&self, query: &SearchQuery) -> bool {
        query.matches(self.search_fields().into_iter())
    }
}

impl Searchable for Collection {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str()]
    }
}

impl Searchable for Meditation {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.description.as_str()]
    }
}

impl Searchable for Miracle {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.quote.as_str(), self.artist.as_str(), self.title.as_str()]
    }
}

/// Keep the items matching `query`, in their original order
pub fn filter<T: Searchable>(items: &[Arc<T>], query: &SearchQuery) -> Vec<Arc<T>> {
    items
        .iter()
        .filter(|item| item.matches(query))
        .cloned()
        .collect()
}

/// Page sections affected by search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Categories,
    Collections,
    Meditations,
    Miracles,
}

/// Filtered view of the searchable sections
#[derive(Debug, Clone)]
pub struct SearchResults {
    pub query: SearchQuery,
    pub collections: Vec<Arc<Collection>>,
    pub meditations: Vec<Arc<Meditation>>,
    pub miracles: Vec<Arc<Miracle>>,
}

impl SearchResults {
    pub fn evaluate(catalog: &Catalog, query: SearchQuery) -> Self {
        Self {
            collections: filter(catalog.collections(), &query),
            meditations: filter(catalog.meditations(), &query),
            miracles: filter(catalog.miracles(), &query),
            query,
        }
    }

    /// Non-empty query with nothing matched anywhere: the whole content
    /// area gives way to a "no results" message
    pub fn no_results(&self) -> bool {
        !self.query.is_empty()
            && self.collections.is_empty()
            && self.meditations.is_empty()
            && self.miracles.is_empty()
    }

    /// Whether a section renders at all
    ///
    /// Categories never depend on the query; the other sections hide
    /// independently once the query is set and their own matches are empty.
    pub fn section_visible(&self, section: Section) -> bool {
        if self.query.is_empty() {
            return true;
        }
        match section {
            Section::Categories => true,
            Section::Collections => !self.no_results() && !self.collections.is_empty(),
            Section::Meditations => !self.no_results() && !self.meditations.is_empty(),
            Section::Miracles => !self.no_results() && !self.miracles.is_empty(),
        }
    }

    /// Message shown in place of the content area, if any
    pub fn no_results_message(&self) -> Option<String> {
        self.no_results()
            .then(|| format!("No results found for \"{}\"", self.query.as_str()))
    }
}
