//! Places a catalog can be read from: the remote HTTP source and the bundled
//! fallback file.

mod local;
mod remote;

pub use local::LocalSource;
pub use remote::{HTTP_TIMEOUT, RemoteSource, http_client};

use crate::catalog::Book;

pub(crate) const MAX_RESPONSE_BYTES: usize = 10_000_000;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request failed: status {0}")]
    Status(u16),

    #[error("response too large (>{0} bytes)")]
    TooLarge(usize),

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed catalog: {0}")]
    Json(#[from] serde_json::Error),
}

/// Something that can produce a full list of books.
/// Implemented by `RemoteSource` and `LocalSource`; mock implementations are used in tests.
pub trait CatalogSource {
    async fn fetch(&self) -> Result<Vec<Book>, SourceError>;

    /// Short label for log lines (a URL or a path).
    fn describe(&self) -> String;
}
