use std::time::Duration;

use reqwest::{Client, Response};
use reqwest::header::{ACCEPT, USER_AGENT};
use tracing::debug;

use super::{CatalogSource, MAX_RESPONSE_BYTES, SourceError};
use crate::catalog::{Book, decode_books};

/// TCP connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default overall request timeout covering DNS + connect + response body.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
/// Maximum redirect hops before aborting.
const MAX_REDIRECTS: usize = 5;

/// Client shared by every remote fetch. A request that has not finished
/// within `timeout` fails with `SourceError::Http`.
pub fn http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
}

/// Remote catalog reachable with a single GET.
#[derive(Clone)]
pub struct RemoteSource {
    http: Client,
    url: String,
}

impl RemoteSource {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    async fn download(&self) -> Result<String, SourceError> {
        let response = self
            .http
            .get(&self.url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, crate::USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = read_capped(response, MAX_RESPONSE_BYTES).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

/// Reads the whole body, giving up once it exceeds `limit` bytes. A declared
/// Content-Length is checked up front; chunked bodies are checked as they stream.
async fn read_capped(mut response: Response, limit: usize) -> Result<Vec<u8>, SourceError> {
    if let Some(len) = response.content_length()
        && usize::try_from(len).map_or(true, |len| len > limit)
    {
        return Err(SourceError::TooLarge(limit));
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        body.extend_from_slice(&chunk);
        if body.len() > limit {
            return Err(SourceError::TooLarge(limit));
        }
    }
    Ok(body)
}

impl CatalogSource for RemoteSource {
    async fn fetch(&self) -> Result<Vec<Book>, SourceError> {
        let text = self.download().await?;
        let books = decode_books(&text)?;
        debug!(url = %self.url, bytes = text.len(), books = books.len(), "remote catalog fetched");
        Ok(books)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
