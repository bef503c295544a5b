use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use url::Url;

use crate::indexer::schema::Comic;

const INFO_DOCUMENT: &str = "info.0.json";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not get comic {ordinal} from remote: {source}")]
    Request { ordinal: u32, source: reqwest::Error },

    #[error("request for comic {ordinal} failed: {status}")]
    Status { ordinal: u32, status: StatusCode },

    #[error("unable to decode comic {ordinal}: {source}")]
    Decode { ordinal: u32, source: serde_json::Error },

    #[error("invalid url for comic {ordinal}: {source}")]
    Url { ordinal: u32, source: url::ParseError },
}

/// Anything that can hand out comic metadata by number. Ordinal 0 means the latest comic.
#[async_trait]
pub trait ComicSource: Send + Sync {
    async fn fetch(&self, ordinal: u32) -> Result<Comic, FetchError>;
}

/// Fetches comic metadata documents from the xkcd JSON API.
#[derive(Clone)]
pub struct XkcdClient {
    client: Client,
    base_url: Url,
}

impl XkcdClient {
    /// Creates a client with a pre-configured HTTP client.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base_url })
    }

    /// `<base>/info.0.json` for the latest comic, `<base>/<n>/info.0.json` otherwise.
    pub fn comic_url(&self, ordinal: u32) -> Result<Url, url::ParseError> {
        if ordinal == 0 {
            self.base_url.join(INFO_DOCUMENT)
        } else {
            self.base_url.join(&format!("{}/{}", ordinal, INFO_DOCUMENT))
        }
    }
}

#[async_trait]
impl ComicSource for XkcdClient {
    async fn fetch(&self, ordinal: u32) -> Result<Comic, FetchError> {
        let url = self
            .comic_url(ordinal)
            .map_err(|source| FetchError::Url { ordinal, source })?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request { ordinal, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { ordinal, status });
        }

        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Request { ordinal, source })?;

        decode_comic(ordinal, &body)
    }
}

pub(crate) fn decode_comic(ordinal: u32, body: &str) -> Result<Comic, FetchError> {
    serde_json::from_str(body).map_err(|source| FetchError::Decode { ordinal, source })
}
