//! Free-text and keyword search over the cached catalog.

mod matcher;

use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::catalog::Book;
use crate::loader::CatalogLoader;
use crate::source::{CatalogSource, LocalSource, RemoteSource};
use matcher::{filter_keywords, filter_text, is_blank, normalize_keywords};

/// How multiple keywords combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchMode {
    /// A book matches if any keyword matches.
    #[default]
    Any,
    /// A book matches only if every keyword matches.
    All,
}

impl MatchMode {
    /// `"ALL"` in any case selects [`MatchMode::All`]; anything else is [`MatchMode::Any`].
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("all") {
            MatchMode::All
        } else {
            MatchMode::Any
        }
    }
}

impl From<bool> for MatchMode {
    fn from(match_all: bool) -> Self {
        if match_all { MatchMode::All } else { MatchMode::Any }
    }
}

impl<'de> Deserialize<'de> for MatchMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label.as_deref().map(MatchMode::from_label).unwrap_or_default())
    }
}

/// Read-only search over whatever catalog the loader currently holds.
pub struct QueryEngine<R = RemoteSource, L = LocalSource> {
    loader: Arc<CatalogLoader<R, L>>,
}

impl<R: CatalogSource, L: CatalogSource> QueryEngine<R, L> {
    pub fn new(loader: Arc<CatalogLoader<R, L>>) -> Self {
        Self { loader }
    }

    /// Books with any searchable field containing `query`, case-insensitively.
    /// A missing or blank query returns the whole catalog.
    pub async fn search(&self, query: Option<&str>) -> Vec<Book> {
        let books = self.loader.ensure_loaded().await;
        match query {
            Some(q) if !is_blank(q) => {
                let found = filter_text(&books, q);
                debug!(query = %q, matched = found.len(), total = books.len(), "text search");
                found
            }
            _ => books.to_vec(),
        }
    }

    /// Books matching the non-blank `keywords` under `mode`.
    /// With no usable keywords the whole catalog is returned.
    pub async fn search_keywords(&self, keywords: Option<&[String]>, mode: MatchMode) -> Vec<Book> {
        let books = self.loader.ensure_loaded().await;
        let keywords = normalize_keywords(keywords.unwrap_or_default());
        if keywords.is_empty() {
            return books.to_vec();
        }

        let found = filter_keywords(&books, &keywords, mode);
        debug!(?keywords, ?mode, matched = found.len(), total = books.len(), "keyword search");
        found
    }
}
