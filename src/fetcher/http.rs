use crate::config::FetchConfig;
use crate::error::{Error, FetchError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::{debug, trace};
use url::Url;

use super::{ChunkAccumulator, Fetcher, ProgressFn};

/// Where an identifier points after resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    /// HTTP(S) URL
    Remote(Url),
    /// Path on the local filesystem
    Local(PathBuf),
}

/// Fetcher for HTTP(S) URLs and local files
///
/// Relative identifiers are resolved against the configured base URL when
/// one is set, otherwise they are read from the configured local root.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: Option<Url>,
    local_root: PathBuf,
    chunk_size: usize,
}

impl HttpFetcher {
    /// Build a fetcher from the retrieval settings
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                Error::Io(std::io::Error::other(format!(
                    "Failed to create HTTP client: {}",
                    e
                )))
            })?;

        let base_url = match &config.base_url {
            Some(base) => Some(Url::parse(base).map_err(|e| {
                Error::config("fetch.base_url", format!("invalid base URL '{}': {}", base, e))
            })?),
            None => None,
        };

        Ok(Self {
            client,
            base_url,
            local_root: config.local_root.clone(),
            chunk_size: config.chunk_size.max(1),
        })
    }

    pub(crate) fn resolve(&self, identifier: &str) -> std::result::Result<Target, FetchError> {
        match Url::parse(identifier) {
            Ok(url) => match url.scheme() {
                "http" | "https" => Ok(Target::Remote(url)),
                "file" => url.to_file_path().map(Target::Local).map_err(|_| {
                    FetchError::InvalidIdentifier(format!("'{}' is not a local file path", identifier))
                }),
                // Windows drive letters parse as one-letter schemes
                scheme if scheme.len() == 1 => Ok(Target::Local(PathBuf::from(identifier))),
                scheme => Err(FetchError::InvalidIdentifier(format!(
                    "unsupported scheme '{}' in '{}'",
                    scheme, identifier
                ))),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base_url {
                Some(base) => base.join(identifier).map(Target::Remote).map_err(|e| {
                    FetchError::InvalidIdentifier(format!(
                        "cannot resolve '{}' against '{}': {}",
                        identifier, base, e
                    ))
                }),
                None => Ok(Target::Local(self.local_root.join(identifier))),
            },
            Err(e) => Err(FetchError::InvalidIdentifier(format!(
                "'{}': {}",
                identifier, e
            ))),
        }
    }

    async fn fetch_remote(
        &self,
        url: Url,
        on_progress: &mut ProgressFn<'_>,
    ) -> std::result::Result<Vec<u8>, FetchError> {
        let url_str = url.to_string();
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&url_str, &e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(url = %url_str, status = status.as_u16(), "server rejected request");
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        let total = response.content_length();
        debug!(url = %url_str, ?total, "receiving response body");

        let mut accumulator = ChunkAccumulator::new(total);
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::from_reqwest(&url_str, &e))?
        {
            let progress = accumulator.push(&chunk);
            trace!(
                url = %url_str,
                chunk_len = chunk.len(),
                received = accumulator.received(),
                "chunk received"
            );
            on_progress(progress);
        }

        Ok(complete(accumulator, on_progress))
    }

    async fn fetch_local(
        &self,
        path: &Path,
        on_progress: &mut ProgressFn<'_>,
    ) -> std::result::Result<Vec<u8>, FetchError> {
        let mut file = tokio::fs::File::open(path)
            .await
            .map_err(|e| FetchError::from_io(path, &e))?;
        let metadata = file
            .metadata()
            .await
            .map_err(|e| FetchError::from_io(path, &e))?;
        if metadata.is_dir() {
            return Err(FetchError::InvalidIdentifier(format!(
                "'{}' is a directory",
                path.display()
            )));
        }

        debug!(path = %path.display(), size = metadata.len(), "reading local file");

        let mut accumulator = ChunkAccumulator::new(Some(metadata.len()));
        let mut buf = vec![0u8; self.chunk_size];
        loop {
            let n = file
                .read(&mut buf)
                .await
                .map_err(|e| FetchError::from_io(path, &e))?;
            if n == 0 {
                break;
            }
            let progress = accumulator.push(&buf[..n]);
            trace!(path = %path.display(), received = accumulator.received(), "chunk read");
            on_progress(progress);
        }

        Ok(complete(accumulator, on_progress))
    }
}

fn complete(accumulator: ChunkAccumulator, on_progress: &mut ProgressFn<'_>) -> Vec<u8> {
    let (payload, completion) = accumulator.finish();
    if let Some(progress) = completion {
        on_progress(progress);
    }
    payload
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        identifier: &str,
        on_progress: &mut ProgressFn<'_>,
    ) -> std::result::Result<Vec<u8>, FetchError> {
        match self.resolve(identifier)? {
            Target::Remote(url) => self.fetch_remote(url, on_progress).await,
            Target::Local(path) => self.fetch_local(&path, on_progress).await,
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
