use serde_json::{Map, Value};
use tracing::debug;

use super::Book;

const BOOKS_FIELD: &str = "books";

/// Decode a `{"books": [...]}` document.
///
/// Blank input and documents without a `books` array decode to an empty
/// list. Only malformed JSON is an error. Entries are read field by field:
/// unknown keys are ignored and values of the wrong type leave the field
/// absent instead of rejecting the entry.
pub fn decode_books(text: &str) -> Result<Vec<Book>, serde_json::Error> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let root: Value = serde_json::from_str(text)?;
    let Some(entries) = root.get(BOOKS_FIELD).and_then(Value::as_array) else {
        debug!("document has no `{BOOKS_FIELD}` array");
        return Ok(Vec::new());
    };

    let books = entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| match entry.as_object() {
            Some(obj) => Some(book_from_object(obj)),
            None => {
                debug!(index, "skipping non-object book entry");
                None
            }
        })
        .collect();

    Ok(books)
}

fn book_from_object(obj: &Map<String, Value>) -> Book {
    Book {
        isbn: text_field(obj, "isbn"),
        title: text_field(obj, "title"),
        subtitle: text_field(obj, "subtitle"),
        author: text_field(obj, "author"),
        published: text_field(obj, "published"),
        publisher: text_field(obj, "publisher"),
        pages: count_field(obj, "pages"),
        description: text_field(obj, "description"),
        website: text_field(obj, "website"),
    }
}

/// Scalars are coerced to text; arrays, objects and null are treated as absent.
fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn count_field(obj: &Map<String, Value>, key: &str) -> Option<u32> {
    match obj.get(key)? {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
