//! Fetching custom content from the content server
//!
//! The server exports every custom content item as one tar archive served at
//! `GET {base_url}/content/bundle`. [`ServerClient`] downloads it and
//! [`unpack_bundle`] turns it into a [`MemoryFS`] keyed by the pack-side file
//! names. The pipeline only depends on the [`ContentFetcher`] trait so tests
//! can hand it a prepared bundle.

use std::io::Read;
use std::time::Duration;

use flate2::read::GzDecoder;
use log::{debug, info, warn};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use tar::Archive;
use url::Url;

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::filesystem::MemoryFS;
use crate::path::rewrite_archive_prefix;

/// Path of the bundle endpoint below the server base URL.
const BUNDLE_ENDPOINT: &str = "content/bundle";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Source of the custom content bundle.
pub trait ContentFetcher {
    /// Fetch every custom content file, keyed by its pack-side name.
    fn fetch(&self) -> Result<MemoryFS>;
}

/// HTTP client for the content server.
pub struct ServerClient {
    client: Client,
    base_url: Option<String>,
    api_key: Option<String>,
}

impl ServerClient {
    /// Build a client from server settings.
    ///
    /// `insecure` disables TLS certificate verification.
    pub fn new(server: &ServerConfig, insecure: bool) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(server.timeout_secs))
            .danger_accept_invalid_certs(insecure)
            .build()
            .map_err(|e| Error::Fetch {
                url: server.base_url.clone().unwrap_or_default(),
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: server.base_url.clone(),
            api_key: server.api_key.clone(),
        })
    }

    /// Full URL of the bundle endpoint.
    ///
    /// A path on the base URL is kept: `https://host/xsoar` resolves to
    /// `https://host/xsoar/content/bundle`.
    pub fn bundle_url(&self) -> Result<String> {
        let base = self.base_url.as_deref().ok_or_else(|| Error::Fetch {
            url: BUNDLE_ENDPOINT.to_string(),
            message: "No server base URL configured (set DEMISTO_BASE_URL or server.base_url)"
                .to_string(),
        })?;
        let base = Url::parse(&format!("{}/", base.trim_end_matches('/')))?;
        Ok(base.join(BUNDLE_ENDPOINT)?.to_string())
    }
}

impl ContentFetcher for ServerClient {
    fn fetch(&self) -> Result<MemoryFS> {
        let url = self.bundle_url()?;
        info!("Fetching custom content bundle from {}", url);

        let mut request = self.client.get(&url).header(ACCEPT, "application/json");
        if let Some(api_key) = &self.api_key {
            request = request.header(AUTHORIZATION, api_key);
        }

        let response = request.send().map_err(|e| Error::Fetch {
            url: url.clone(),
            message: e.to_string(),
        })?;
        if !response.status().is_success() {
            return Err(Error::Fetch {
                url,
                message: format!("HTTP {}", response.status()),
            });
        }

        let body = response.bytes().map_err(|e| Error::Fetch {
            url: url.clone(),
            message: format!("Failed to read response body: {}", e),
        })?;
        debug!("Received {} bytes from {}", body.len(), url);
        unpack_bundle(&body)
    }
}

fn bundle_error(err: std::io::Error) -> Error {
    Error::Bundle {
        message: err.to_string(),
    }
}

/// Unpack a tar bundle, gzip-compressed or not, into memory.
///
/// Only regular files are kept. Entries that would land outside the staging
/// directory are skipped. Entry names lose a leading `./` and
/// surrounding slashes, and their file name goes through
/// [`rewrite_archive_prefix`].
pub fn unpack_bundle(bytes: &[u8]) -> Result<MemoryFS> {
    let reader: Box<dyn Read + '_> = if bytes.starts_with(&GZIP_MAGIC) {
        Box::new(GzDecoder::new(bytes))
    } else {
        Box::new(bytes)
    };
    let mut archive = Archive::new(reader);
    let mut bundle = MemoryFS::new();

    for entry in archive.entries().map_err(bundle_error)? {
        let mut entry = entry.map_err(bundle_error)?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let raw_path = entry.path().map_err(bundle_error)?;
        let raw_name = raw_path
            .to_string_lossy()
            .trim_start_matches("./")
            .trim_matches('/')
            .to_string();
        let name = match raw_name.rsplit_once('/') {
            Some((dir, file)) => format!("{}/{}", dir, rewrite_archive_prefix(file)),
            None => rewrite_archive_prefix(&raw_name),
        };

        let mut content = Vec::new();
        entry.read_to_end(&mut content).map_err(bundle_error)?;
        debug!("Bundle entry {} ({} bytes)", name, content.len());
        if let Err(err) = bundle.insert(&name, content) {
            warn!("Skipping bundle entry: {}", err);
        }
    }

    Ok(bundle)
}
