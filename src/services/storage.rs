use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::error::{Error, Result};

/// Uniform key/value surface over the storage backends.
///
/// `write` overwrites whatever is at `key`, which is what makes re-runs safe:
/// the same batch always lands at the same key. Storage failures are not
/// caught anywhere in the pipeline; they propagate and abort the run.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn write(&self, key: &str, text: &str) -> Result<()>;
    async fn read(&self, key: &str) -> Result<Option<String>>;
}

/// Filesystem-backed store rooted at a directory.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl BlobStore for FileStore {
    async fn write(&self, key: &str, text: &str) -> Result<()> {
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, text).await?;
        debug!("Wrote {} bytes to {}", text.len(), path.display());
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.root.join(key);
        match path.parent() {
            Some(parent) if !parent.exists() => return Ok(None),
            _ => {}
        }
        let text = fs::read_to_string(&path).await?;
        Ok(Some(text))
    }
}

/// S3-compatible object store driven over plain HTTP.
///
/// Objects live at `{endpoint}/{bucket}/{key}`; `write` PUTs the UTF-8 body
/// and `read` GETs it back, mapping 404 to `None`.
pub struct S3Store {
    endpoint: String,
    bucket: String,
    client: reqwest::Client,
}

impl S3Store {
    pub fn new(endpoint: String, bucket: String) -> Result<Self> {
        let endpoint = endpoint.trim().trim_end_matches('/').to_string();

        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(Error::Config(format!(
                "Invalid S3 endpoint: must start with http:// or https://, got: '{}'",
                endpoint
            )));
        }
        if bucket.is_empty() {
            return Err(Error::Config("S3 bucket name must not be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint,
            bucket,
            client,
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key)
    }
}

#[async_trait]
impl BlobStore for S3Store {
    async fn write(&self, key: &str, text: &str) -> Result<()> {
        let url = self.object_url(key);
        let response = self
            .client
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, "text/csv; charset=utf-8")
            .body(text.to_string())
            .send()
            .await
            .map_err(|e| Error::Storage(format!("Object put failed: {} (url: {})", e, url)))?;

        if !response.status().is_success() {
            return Err(Error::Storage(format!(
                "Object put to {} returned status {}",
                url,
                response.status()
            )));
        }
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<String>> {
        let url = self.object_url(key);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Storage(format!("Object get failed: {} (url: {})", e, url)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Error::Storage(format!(
                "Object get from {} returned status {}",
                url,
                response.status()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::Storage(format!("Failed to read object body: {}", e)))?;
        Ok(Some(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_store_write_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store
            .write("oanda/2021/01/01/EUR_USD_CANDLES_H1.csv", "row1\nrow2")
            .await
            .unwrap();

        let text = store
            .read("oanda/2021/01/01/EUR_USD_CANDLES_H1.csv")
            .await
            .unwrap();
        assert_eq!(text.as_deref(), Some("row1\nrow2"));
    }

    #[tokio::test]
    async fn test_file_store_read_missing_parent_is_none() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let result = store.read("never/created/key.csv").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_file_store_write_overwrites() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.write("a/key.csv", "first").await.unwrap();
        store.write("a/key.csv", "second").await.unwrap();

        let text = store.read("a/key.csv").await.unwrap();
        assert_eq!(text.as_deref(), Some("second"));
    }

    #[test]
    fn test_s3_store_object_url() {
        let store = S3Store::new(
            "https://s3.example.com/".to_string(),
            "candles".to_string(),
        )
        .unwrap();
        assert_eq!(
            store.object_url("oanda/2021/01/01/EUR_USD_CANDLES_H1.csv"),
            "https://s3.example.com/candles/oanda/2021/01/01/EUR_USD_CANDLES_H1.csv"
        );
    }

    #[test]
    fn test_s3_store_rejects_bad_endpoint() {
        assert!(S3Store::new("s3.example.com".to_string(), "candles".to_string()).is_err());
        assert!(S3Store::new("https://s3.example.com".to_string(), String::new()).is_err());
    }
}
