//! Dropbox access for exports
//!
//! The access token is kept in `config.json`. [`DropboxHelper::client`]
//! builds one HTTP client on first use and hands out the same instance
//! afterwards.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info};

use crate::config::paths::BookPaths;
use crate::config::settings::Settings;
use crate::error::{BooksError, BooksResult};

pub const DROPBOX_UPLOAD_URL: &str = "https://content.dropboxapi.com/2/files/upload";

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Uploads files through the Dropbox HTTP content API
pub struct DropboxClient {
    http: Client,
    access_token: String,
    upload_url: String,
}

impl DropboxClient {
    pub fn new(access_token: impl Into<String>) -> BooksResult<Self> {
        let http = Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .user_agent(format!("gnucash-books/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BooksError::Network(e.to_string()))?;

        Ok(Self {
            http,
            access_token: access_token.into(),
            upload_url: DROPBOX_UPLOAD_URL.to_string(),
        })
    }

    /// Point uploads at another endpoint
    pub fn with_upload_url(mut self, url: impl Into<String>) -> Self {
        self.upload_url = url.into();
        self
    }

    /// Upload `local` to `remote_path` (e.g. `/exports/book.csv`), overwriting
    pub fn upload(&self, local: &Path, remote_path: &str) -> BooksResult<()> {
        let body = fs::read(local)
            .map_err(|e| BooksError::Io(format!("Failed to read {}: {}", local.display(), e)))?;

        let api_arg = serde_json::json!({
            "path": remote_path,
            "mode": "overwrite",
            "autorename": false,
            "mute": true,
        });

        let response = self
            .http
            .post(&self.upload_url)
            .bearer_auth(&self.access_token)
            .header("Dropbox-API-Arg", api_arg.to_string())
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    BooksError::Network(format!(
                        "Dropbox upload timed out after {}s",
                        UPLOAD_TIMEOUT.as_secs()
                    ))
                } else {
                    BooksError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(BooksError::Network(format!(
                "HTTP {} from Dropbox: {}",
                status,
                detail.trim()
            )));
        }

        info!(remote = remote_path, "Uploaded export to Dropbox");
        Ok(())
    }
}

/// Token storage and a shared [`DropboxClient`]
pub struct DropboxHelper {
    paths: BookPaths,
    client: Mutex<Option<Arc<DropboxClient>>>,
}

impl DropboxHelper {
    pub fn new(paths: BookPaths) -> Self {
        Self {
            paths,
            client: Mutex::new(None),
        }
    }

    /// The stored token; when none is stored, save `obtained` and return it
    pub fn retrieve_and_save_token(&self, obtained: Option<&str>) -> BooksResult<Option<String>> {
        let mut settings = Settings::load_or_create(&self.paths)?;
        if let Some(token) = settings.dropbox_access_token.clone() {
            return Ok(Some(token));
        }

        let token = match obtained.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => token.to_string(),
            None => return Ok(None),
        };

        settings.dropbox_access_token = Some(token.clone());
        settings.save(&self.paths)?;
        debug!("Saved Dropbox access token");
        Ok(Some(token))
    }

    pub fn has_token(&self) -> BooksResult<bool> {
        Ok(Settings::load_or_create(&self.paths)?
            .dropbox_access_token
            .is_some())
    }

    /// Forget the stored token and the cached client
    pub fn clear_token(&self) -> BooksResult<()> {
        let mut settings = Settings::load_or_create(&self.paths)?;
        settings.dropbox_access_token = None;
        settings.save(&self.paths)?;
        *self.lock_client()? = None;
        Ok(())
    }

    /// The shared client, built from the stored token on first use
    pub fn client(&self) -> BooksResult<Arc<DropboxClient>> {
        let mut cached = self.lock_client()?;
        if let Some(client) = cached.as_ref() {
            return Ok(Arc::clone(client));
        }

        let token = Settings::load_or_create(&self.paths)?
            .dropbox_access_token
            .ok_or_else(|| {
                BooksError::Config(
                    "No Dropbox access token. Run 'gnucash-books dropbox token <TOKEN>'".into(),
                )
            })?;

        let client = Arc::new(DropboxClient::new(token)?);
        *cached = Some(Arc::clone(&client));
        Ok(client)
    }

    fn lock_client(&self) -> BooksResult<MutexGuard<'_, Option<Arc<DropboxClient>>>> {
        self.client
            .lock()
            .map_err(|e| BooksError::Storage(format!("Failed to acquire lock: {}", e)))
    }
}
