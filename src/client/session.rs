//! Browser session persisted by the interactive login flow.
//!
//! The file is a Playwright `storage_state.json`. The server only ever reads
//! it; the login flow is the sole writer.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::NotebookError;

const GOOGLE_DOMAIN: &str = "google.com";

#[derive(Debug, Deserialize)]
struct StorageState {
    #[serde(default)]
    cookies: Vec<StoredCookie>,
}

#[derive(Debug, Clone, Deserialize)]
struct StoredCookie {
    name: String,
    value: String,
    #[serde(default)]
    domain: String,
    /// Seconds since the epoch; -1 for session cookies.
    #[serde(default)]
    expires: Option<f64>,
}

/// Authentication material extracted from the session file.
#[derive(Clone)]
pub struct Session {
    path: PathBuf,
    cookie_header: String,
    cookie_count: usize,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("path", &self.path)
            .field("cookie_count", &self.cookie_count)
            .finish_non_exhaustive()
    }
}

/// `google.com` itself or one of its subdomains, with or without the
/// leading dot cookie jars use for domain cookies.
fn is_google_domain(domain: &str) -> bool {
    let domain = domain.trim_start_matches('.');
    domain == GOOGLE_DOMAIN
        || domain
            .strip_suffix(GOOGLE_DOMAIN)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

impl Session {
    /// Load the session file, keeping unexpired Google cookies.
    pub async fn load(path: &Path) -> Result<Self, NotebookError> {
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(NotebookError::AuthenticationRequired(format!(
                    "no session file at {}",
                    path.display()
                )))
            }
            Err(err) => {
                return Err(NotebookError::Session(format!(
                    "{}: {}",
                    path.display(),
                    err
                )))
            }
        };
        Self::parse(path, &raw, chrono::Utc::now().timestamp() as f64)
    }

    fn parse(path: &Path, raw: &[u8], now: f64) -> Result<Self, NotebookError> {
        let state: StorageState = serde_json::from_slice(raw)
            .map_err(|err| NotebookError::Session(format!("{}: {}", path.display(), err)))?;

        let cookies: Vec<StoredCookie> = state
            .cookies
            .into_iter()
            .filter(|cookie| is_google_domain(&cookie.domain))
            .filter(|cookie| match cookie.expires {
                Some(expires) if expires > 0.0 => expires > now,
                _ => true,
            })
            .collect();

        if cookies.is_empty() {
            return Err(NotebookError::AuthenticationRequired(format!(
                "session file {} holds no valid Google cookies",
                path.display()
            )));
        }

        let cookie_header = cookies
            .iter()
            .map(|cookie| format!("{}={}", cookie.name, cookie.value))
            .collect::<Vec<_>>()
            .join("; ");

        Ok(Self {
            path: path.to_path_buf(),
            cookie_header,
            cookie_count: cookies.len(),
        })
    }

    pub fn cookie_header(&self) -> &str {
        &self.cookie_header
    }

    pub fn cookie_count(&self) -> usize {
        self.cookie_count
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
