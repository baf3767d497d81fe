// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Fetching scrambled images by URL.
//!
//! Chat platforms hand out image URLs; the batch pipeline pulls the bytes
//! through an [`ImageFetcher`]. With the `http` feature, [`HttpFetcher`]
//! does this over a blocking `reqwest` client.

/// Errors from a single image fetch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request could not be sent or the connection failed.
    #[error("request failed: {0}")]
    Request(String),
    /// The server answered with a non-success status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Source of image bytes.
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Downgrade an `https://` URL to `http://`. Other schemes pass through.
pub fn force_plain_http(url: &str) -> String {
    url.replace("https://", "http://")
}

#[cfg(feature = "http")]
pub use self::http::HttpFetcher;

#[cfg(feature = "http")]
mod http {
    use std::time::Duration;

    use reqwest::blocking::Client;

    use super::{force_plain_http, FetchError, ImageFetcher};

    /// [`ImageFetcher`] over a blocking `reqwest` client.
    #[derive(Debug, Clone)]
    pub struct HttpFetcher {
        client: Client,
        force_plain_http: bool,
    }

    impl HttpFetcher {
        pub fn new(timeout: Duration, force_plain_http: bool) -> Result<Self, FetchError> {
            let client = Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|err| FetchError::Request(err.to_string()))?;
            Ok(Self { client, force_plain_http })
        }

        fn target(&self, url: &str) -> String {
            if self.force_plain_http {
                force_plain_http(url)
            } else {
                url.to_string()
            }
        }
    }

    impl ImageFetcher for HttpFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            let target = self.target(url);
            tracing::debug!(url = %target, "fetching image");
            let response = self
                .client
                .get(&target)
                .send()
                .map_err(|err| FetchError::Request(err.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }
            let body = response.bytes().map_err(|err| FetchError::Body(err.to_string()))?;
            Ok(body.to_vec())
        }
    }

}
