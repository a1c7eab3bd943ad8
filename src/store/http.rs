use super::{RemoteStore, Snapshot};
use crate::identity::UserHandle;
use anyhow::{Context, Result, anyhow, bail};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone)]
pub struct HttpStore {
    base_url: Url,
    api_key: Option<String>,
    timeout_seconds: u64,
}

impl HttpStore {
    pub fn new(base_url: &str, api_key: Option<String>, timeout_seconds: u64) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("Remote store base URL is empty. Set `attendance config set remote.base_url <URL>`");
        }

        let base_url = Url::parse(&format!("{trimmed}/"))
            .with_context(|| format!("Invalid remote store base URL: {base_url}"))?;

        Ok(Self {
            base_url,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            timeout_seconds: timeout_seconds.max(5),
        })
    }

    pub fn document_url(&self, user: &UserHandle) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Remote store base URL cannot hold a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(["users", user.uid.as_str()]);

        Ok(url)
    }

    fn client(&self) -> Result<Client> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(api_key) = &self.api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {api_key}"))
                    .context("Failed to build Authorization header")?,
            );
        }

        Client::builder()
            .timeout(Duration::from_secs(self.timeout_seconds))
            .default_headers(headers)
            .build()
            .context("Failed to create remote store HTTP client")
    }

    fn read_blocking(&self, url: Url) -> Result<Option<Snapshot>> {
        let response = self
            .client()?
            .get(url)
            .send()
            .context("Remote store read failed")?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = response
            .text()
            .context("Failed to read remote store response body")?;
        if !status.is_success() {
            bail!("Remote store error {}: {}", status, body);
        }

        let document = serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse remote store document: {body}"))?;
        Snapshot::from_document(document).map(Some)
    }

    fn write_blocking(&self, url: Url, snapshot: &Snapshot) -> Result<()> {
        let response = self
            .client()?
            .patch(url)
            .json(snapshot)
            .send()
            .context("Remote store write failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            bail!("Remote store rejected write {}: {}", status, body);
        }

        Ok(())
    }
}

impl RemoteStore for HttpStore {
    fn read(&self, user: &UserHandle) -> Result<Option<Snapshot>> {
        let url = self.document_url(user)?;
        let store = self.clone();

        debug!(url = %url, "reading snapshot from remote store");
        // The blocking client must not run on an async runtime thread.
        std::thread::spawn(move || store.read_blocking(url))
            .join()
            .map_err(|_| anyhow!("Remote store worker thread panicked"))?
    }

    fn write(&self, user: &UserHandle, snapshot: &Snapshot) -> Result<()> {
        let url = self.document_url(user)?;
        let store = self.clone();
        let snapshot = snapshot.clone();

        debug!(url = %url, "writing snapshot to remote store");
        std::thread::spawn(move || store.write_blocking(url, &snapshot))
            .join()
            .map_err(|_| anyhow!("Remote store worker thread panicked"))?
    }
}
