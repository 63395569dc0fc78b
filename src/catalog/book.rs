use serde::Serialize;

/// A single catalog entry. Every field is optional; absent fields are
/// skipped when matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Book {
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub author: Option<String>,
    pub published: Option<String>,
    pub publisher: Option<String>,
    pub pages: Option<u32>,
    pub description: Option<String>,
    pub website: Option<String>,
}

impl Book {
    /// Fields scanned by text and keyword search, in scan order.
    pub fn searchable_fields(&self) -> impl Iterator<Item = &str> {
        [
            &self.title,
            &self.subtitle,
            &self.author,
            &self.description,
            &self.publisher,
            &self.isbn,
        ]
        .into_iter()
        .filter_map(|field| field.as_deref())
    }
}
