use crate::catalog::Book;

use super::MatchMode;

/// True when any searchable field of `book` contains `needle`.
/// `needle` must already be lower-cased.
pub fn book_contains(book: &Book, needle: &str) -> bool {
    book.searchable_fields()
        .any(|field| field.to_lowercase().contains(needle))
}

pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Lower-case the non-blank keywords, dropping the rest.
pub fn normalize_keywords(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .filter(|k| !is_blank(k))
        .map(|k| k.to_lowercase())
        .collect()
}

pub fn filter_text(books: &[Book], query: &str) -> Vec<Book> {
    let needle = query.to_lowercase();
    books
        .iter()
        .filter(|book| book_contains(book, &needle))
        .cloned()
        .collect()
}

/// `keywords` must be normalized and non-empty.
pub fn filter_keywords(books: &[Book], keywords: &[String], mode: MatchMode) -> Vec<Book> {
    books
        .iter()
        .filter(|book| match mode {
            MatchMode::All => keywords.iter().all(|k| book_contains(book, k)),
            MatchMode::Any => keywords.iter().any(|k| book_contains(book, k)),
        })
        .cloned()
        .collect()
}
