#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use staticd::config::Config;
use tokio::io::{AsyncRead, AsyncReadExt};

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

/// Scratch document root removed on drop.
pub struct DocRoot {
    path: PathBuf,
}

impl DocRoot {
    pub fn new() -> Self {
        let n = NEXT_DIR.fetch_add(1, Ordering::SeqCst);
        let name = format!("staticd-test-{}-{}", std::process::id(), n);
        let path = std::env::temp_dir().join(name);
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&self, name: &str, contents: &[u8]) -> &Self {
        std::fs::write(self.path.join(name), contents).unwrap();
        self
    }

    pub fn dir(&self, name: &str) -> &Self {
        std::fs::create_dir_all(self.path.join(name)).unwrap();
        self
    }

    /// html, htm and txt allowed; 10s idle timeout.
    pub fn config(&self) -> Arc<Config> {
        self.config_with("")
    }

    pub fn config_with(&self, extra_yaml: &str) -> Arc<Config> {
        let yaml = format!(
            "port: 0\n\
             bind_address: 127.0.0.1\n\
             document_root: \"{}\"\n\
             index_pages: [index.html, index.htm]\n\
             content_types:\n  html: text/html\n  htm: text/html\n  txt: text/plain\n\
             {}",
            self.path.display(),
            extra_yaml
        );
        Arc::new(Config::from_yaml_str(&yaml).unwrap())
    }
}

impl Drop for DocRoot {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// A 200 response split into its header block and body.
pub struct Served {
    pub header: String,
    pub body: Vec<u8>,
}

impl Served {
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.header
            .lines()
            .find_map(|line| line.strip_prefix(name)?.strip_prefix(": "))
    }
}

/// Reads one success response: header, `Content-Length` bytes, trailing `\n`.
pub async fn read_served<R: AsyncRead + Unpin>(stream: &mut R) -> Served {
    let mut header = Vec::new();
    while !header.ends_with(b"\n\n") {
        let mut byte = [0u8; 1];
        stream.read_exact(&mut byte).await.unwrap();
        header.push(byte[0]);
    }
    let header = String::from_utf8(header).unwrap();

    let len: usize = header
        .lines()
        .find_map(|line| line.strip_prefix("Content-Length: "))
        .unwrap()
        .parse()
        .unwrap();

    let mut body = vec![0u8; len + 1];
    stream.read_exact(&mut body).await.unwrap();
    assert_eq!(body.pop(), Some(b'\n'));

    Served { header, body }
}

/// Reads exactly as many bytes as `expected` and returns them as text.
pub async fn read_text<R: AsyncRead + Unpin>(stream: &mut R, expected: &str) -> String {
    let mut buf = vec![0u8; expected.len()];
    stream.read_exact(&mut buf).await.unwrap();
    String::from_utf8(buf).unwrap()
}
