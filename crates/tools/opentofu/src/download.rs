//! Release archive downloads.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use usetofu_core::retry::{RetryConfig, retry_with_backoff};
use usetofu_core::{Error, Result};

/// Fetches a URL into a local file.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Download `url` to `dest`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Download`] once every attempt has failed.
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Streaming HTTP downloader with retries.
pub struct HttpDownloader {
    client: Client,
    retry: RetryConfig,
}

impl HttpDownloader {
    /// Create a downloader.
    #[must_use]
    pub fn new(client: Client, retry: RetryConfig) -> Self {
        Self { client, retry }
    }

    async fn attempt(&self, url: &str, dest: &Path) -> Result<u64> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::http(url, None, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::http(
                url,
                Some(status.as_u16()),
                format!("HTTP {status}"),
            ));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::http(url, None, e.to_string()))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        debug!(url, dest = %dest.display(), "Downloading release archive");

        let result = retry_with_backoff(&self.retry, "download", move || async move {
            let outcome = self.attempt(url, dest).await;
            if outcome.is_err() {
                remove_partial(dest).await;
            }
            outcome
        })
        .await;

        match result {
            Ok(bytes) => {
                info!(url, bytes, "Downloaded release archive");
                Ok(())
            }
            Err(e) => Err(Error::download(url, e.attempts, e.source.to_string())),
        }
    }
}

/// Remove a partially written archive.
async fn remove_partial(dest: &Path) {
    match tokio::fs::remove_file(dest).await {
        Ok(()) => debug!(dest = %dest.display(), "Removed partial download"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => debug!(dest = %dest.display(), error = %e, "Could not remove partial download"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ARCHIVE: &str = "/v1.10.2/tofu_1.10.2_linux_amd64.tar.gz";

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
            ..RetryConfig::default()
        }
    }

    fn downloader() -> HttpDownloader {
        HttpDownloader::new(Client::new(), fast_retry())
    }

    #[tokio::test]
    async fn test_download_writes_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ARCHIVE))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"archive-bytes".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("work").join("archive.tar.gz");
        downloader()
            .download(&format!("{}{ARCHIVE}", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"archive-bytes");
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("archive.zip");
        downloader()
            .download(&format!("{}{ARCHIVE}", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"ok");
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_five_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(5)
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("archive.zip");
        let err = downloader()
            .download(&format!("{}{ARCHIVE}", server.uri()), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Download { attempts: 5, .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let err = downloader()
            .download(
                &format!("{}{ARCHIVE}", server.uri()),
                &temp.path().join("archive.zip"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Download { attempts: 1, .. }));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_stale_file_removed_after_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("archive.tar.gz");
        std::fs::write(&dest, b"left over").unwrap();

        downloader()
            .download(&format!("{}{ARCHIVE}", server.uri()), &dest)
            .await
            .unwrap_err();

        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_cleanup_tolerates_missing_file() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("never-written.zip");

        remove_partial(&dest).await;
        remove_partial(&dest).await;

        assert!(!dest.exists());
    }
}
