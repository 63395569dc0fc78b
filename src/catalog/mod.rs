//! Book records and the permissive decoder for `{"books": [...]}` documents.

mod book;
mod decode;

pub use book::Book;
pub use decode::decode_books;

use std::sync::Arc;

/// Ordered, immutable view of every cached book. Cloning shares the slice.
pub type Catalog = Arc<[Book]>;
