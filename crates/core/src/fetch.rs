//! Content fetching from URLs, files, and stdin, plus HTTP image probing.
//!
//! Page fetching and the [`HttpImageFetcher`] need the `fetch` feature;
//! reading files and stdin is always available.

use std::fs;
use std::path::PathBuf;

use crate::{LecternError, Result};

#[cfg(feature = "fetch")]
pub use http::{FetchConfig, HttpImageFetcher, MAX_IMAGE_PROBE_BYTES, fetch_url};

#[cfg(feature = "fetch")]
mod http {
    use std::time::Duration;

    use reqwest::Client;
    use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE};
    use url::Url;

    use crate::filters::image_size::{Dimensions, ImageFetcher, sniff_dimensions};
    use crate::{LecternError, Result};

    /// Bytes read from an image before giving up on finding its header.
    pub const MAX_IMAGE_PROBE_BYTES: usize = 64 * 1024;

    /// HTTP client configuration for fetching web pages and images.
    #[derive(Debug, Clone)]
    pub struct FetchConfig {
        /// Request timeout in seconds.
        pub timeout: u64,
        /// Custom User-Agent string.
        pub user_agent: String,
    }

    impl Default for FetchConfig {
        fn default() -> Self {
            Self { timeout: 30, user_agent: "Mozilla/5.0 (compatible; Lectern/0.1)".to_string() }
        }
    }

    impl FetchConfig {
        fn client(&self) -> Result<Client> {
            Client::builder()
                .timeout(Duration::from_secs(self.timeout))
                .user_agent(&self.user_agent)
                .build()
                .map_err(LecternError::HttpError)
        }
    }

    /// Fetches HTML content from a URL.
    ///
    /// Follows redirects and respects the configured timeout.
    pub async fn fetch_url(url: &str, config: &FetchConfig) -> Result<String> {
        let parsed_url = Url::parse(url).map_err(|e| LecternError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed_url.scheme(), "http" | "https") {
            return Err(LecternError::InvalidUrl(format!("unsupported scheme: {}", parsed_url.scheme())));
        }

        let response = config
            .client()?
            .get(parsed_url)
            .header(ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() { LecternError::Timeout { timeout: config.timeout } } else { LecternError::HttpError(e) }
            })?;

        Ok(response.error_for_status()?.text().await?)
    }

    /// Learns image sizes by downloading just enough of each image to read
    /// its header.
    #[derive(Debug, Clone)]
    pub struct HttpImageFetcher {
        client: Client,
    }

    impl HttpImageFetcher {
        pub fn new(config: &FetchConfig) -> Result<Self> {
            Ok(Self { client: config.client()? })
        }
    }

    impl ImageFetcher for HttpImageFetcher {
        async fn fetch_image_dimensions(&self, url: &Url) -> Result<Dimensions> {
            let mut response = self
                .client
                .get(url.clone())
                .header(ACCEPT, "image/avif,image/webp,image/png,image/*;q=0.8")
                .send()
                .await?
                .error_for_status()?;

            let mut head = Vec::new();
            while let Some(chunk) = response.chunk().await? {
                head.extend_from_slice(&chunk);
                if let Some(dimensions) = sniff_dimensions(&head) {
                    return Ok(dimensions);
                }
                if head.len() >= MAX_IMAGE_PROBE_BYTES {
                    break;
                }
            }
            Err(LecternError::ImageFetch(format!("no recognizable image header in {}", url)))
        }
    }
}

/// Reads HTML content from a local file.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(LecternError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(LecternError::from)
    }
}

/// Reads HTML content from standard input until EOF.
pub fn fetch_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(LecternError::from)?;

    Ok(buffer)
}
