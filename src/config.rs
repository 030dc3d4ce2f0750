//! Shared server configuration.
//!
//! Loaded once at startup from a YAML document and then shared read-only
//! between every connection task behind an `Arc`.

use anyhow::{Context, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::http::mime;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Port the acceptor listens on.
    pub port: u16,
    /// Interface the acceptor binds to.
    pub bind_address: String,
    /// Prefix joined verbatim with every request URI.
    pub document_root: String,
    /// Candidates tried, in order, for a request to `/`.
    pub index_pages: Vec<String>,
    /// Extension to MIME type. Only extensions listed here are served.
    pub content_types: BTreeMap<String, String>,
    /// Seconds a kept-alive connection may sit idle before it is closed.
    pub idle_timeout_secs: u64,
    /// Upper bound on buffered bytes that do not yet form a complete request.
    pub max_request_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_address: "0.0.0.0".to_string(),
            document_root: String::new(),
            index_pages: vec!["index.html".to_string(), "index.htm".to_string()],
            content_types: mime::default_table(),
            idle_timeout_secs: 10,
            max_request_bytes: 64 * 1024,
        }
    }
}

impl Config {
    /// Reads and validates the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;

        Self::from_yaml_str(&text)
            .with_context(|| format!("loading config file {}", path.display()))
    }

    /// Parses a configuration document and validates it.
    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        let mut cfg: Config = serde_yaml::from_str(text).context("invalid YAML")?;
        cfg.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    fn normalize(&mut self) {
        self.content_types = std::mem::take(&mut self.content_types)
            .into_iter()
            .map(|(ext, mime)| (ext.trim_start_matches('.').to_string(), mime))
            .collect();
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.document_root.is_empty() {
            bail!("document_root must be set");
        }
        if !Path::new(&self.document_root).is_dir() {
            bail!("document_root {} is not a directory", self.document_root);
        }
        if self.index_pages.iter().any(|page| page.is_empty()) {
            bail!("index_pages must not contain empty names");
        }
        if self.idle_timeout_secs == 0 {
            bail!("idle_timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn file_root(&self) -> &str {
        &self.document_root
    }

    pub fn index_pages(&self) -> &[String] {
        &self.index_pages
    }

    /// Whether files with this extension (no leading dot) may be served.
    pub fn ext_allowed(&self, ext: &str) -> bool {
        self.content_types.contains_key(ext)
    }

    pub fn mime_for(&self, ext: &str) -> &str {
        self.content_types
            .get(ext)
            .map(String::as_str)
            .unwrap_or(mime::DEFAULT_MIME)
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn max_request_bytes(&self) -> usize {
        self.max_request_bytes
    }

    /// `bind_address:port`, as handed to `TcpListener::bind`.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
