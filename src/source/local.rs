use std::path::PathBuf;

use tracing::debug;

use super::{CatalogSource, SourceError};
use crate::catalog::{Book, decode_books};

/// `resources/books.json`, compiled into the binary.
const BUNDLED_CATALOG: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/books.json"));

/// Catalog shipped alongside the service.
///
/// The embedded copy is used unless a file on disk is configured.
#[derive(Debug, Clone)]
pub enum LocalSource {
    Bundled,
    File(PathBuf),
}

impl LocalSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// A configured path wins; otherwise the embedded copy.
    pub fn from_path(path: Option<PathBuf>) -> Self {
        path.map_or(Self::Bundled, Self::File)
    }
}

impl CatalogSource for LocalSource {
    async fn fetch(&self) -> Result<Vec<Book>, SourceError> {
        match self {
            Self::Bundled => {
                let books = decode_books(BUNDLED_CATALOG)?;
                debug!(books = books.len(), "bundled catalog read");
                Ok(books)
            }
            Self::File(path) => {
                let text = tokio::fs::read_to_string(path).await?;
                let books = decode_books(&text)?;
                debug!(path = %path.display(), books = books.len(), "local catalog read");
                Ok(books)
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Bundled => "bundled books.json".to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }
}
