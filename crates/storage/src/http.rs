use std::time::Duration;

use regex::Regex;
use reqwest::blocking::Client;

use crate::store::{FileStore, StoreError};

const LINK_PATTERN: &str = r#"(?i)href\s*=\s*["']([^"'?#]+)["']"#;

/// A remote directory published as an HTML index page (the usual
/// `Index of /...` listing). Entries are the link targets of that page.
pub struct HttpDirectoryStore {
    base_url: String,
    client: Client,
}

impl HttpDirectoryStore {
    pub fn new(base_url: &str) -> Result<Self, StoreError> {
        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let client = Client::builder()
            .user_agent(concat!("tunep/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StoreError::Transfer {
                location: base_url.clone(),
                message: e.to_string(),
            })?;
        Ok(Self { base_url, client })
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response, StoreError> {
        self.client
            .get(url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| StoreError::Transfer {
                location: url.to_string(),
                message: e.to_string(),
            })
    }
}

impl FileStore for HttpDirectoryStore {
    fn location(&self) -> String {
        self.base_url.clone()
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        tracing::debug!("Listing {}", self.base_url);
        let page = self
            .get(&self.base_url)?
            .text()
            .map_err(|e| StoreError::Transfer {
                location: self.base_url.clone(),
                message: e.to_string(),
            })?;
        extract_links(&page)
    }

    fn fetch(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        let url = format!("{}{}", self.base_url, name);
        tracing::info!("Downloading {url}");
        let bytes = self
            .get(&url)?
            .bytes()
            .map_err(|e| StoreError::Transfer {
                location: url.clone(),
                message: e.to_string(),
            })?;
        tracing::info!("... downloaded {} KB", bytes.len() / 1024);
        Ok(bytes.to_vec())
    }
}

/// File names linked from an index page. Directory links, parent links and
/// query-only links are dropped; only the last path segment is kept.
pub fn extract_links(page: &str) -> Result<Vec<String>, StoreError> {
    let re = Regex::new(LINK_PATTERN).map_err(|e| StoreError::Transfer {
        location: "index page".to_string(),
        message: e.to_string(),
    })?;

    let mut names = Vec::new();
    for caps in re.captures_iter(page) {
        let target = &caps[1];
        if target.ends_with('/') {
            continue;
        }
        let Some(name) = target.rsplit('/').next() else {
            continue;
        };
        if name.is_empty() || name == ".." || name == "." {
            continue;
        }
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    Ok(names)
}
