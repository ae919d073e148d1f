//! `file://` fetch backend: serves `file://` URLs by path resolution, with
//! a directory mapping to its `index.html`. Testing and local-mirror
//! crawling both go through this path instead of the network.

use async_trait::async_trait;
use tokio::fs;

use crate::url_info::URLInfo;

use super::{Backend, BackendResult, Headers};

#[derive(Default)]
pub struct FileBackend;

impl FileBackend {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn resolve_path(url: &URLInfo) -> std::path::PathBuf {
        match url.host() {
            Some(host) if !host.is_empty() => {
                let mut path = std::path::PathBuf::from("/").join(host);
                path.push(url.path().trim_start_matches('/'));
                path
            }
            _ => std::path::PathBuf::from(url.path()),
        }
    }
}

#[async_trait]
impl Backend for FileBackend {
    fn name(&self) -> &str {
        "file"
    }

    async fn crawl(&self, url: &URLInfo) -> BackendResult {
        if url.scheme() != "file" {
            return BackendResult::synthetic_error(url.normalized(), 400, "not a file:// URL");
        }

        let mut path = Self::resolve_path(url);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => path.push("index.html"),
            Ok(_) => {}
            Err(e) => {
                return BackendResult::synthetic_error(
                    url.normalized(),
                    404,
                    format!("path not found: {e}"),
                );
            }
        }

        match fs::read(&path).await {
            Ok(body) => {
                let mut headers = Headers::new();
                headers.insert("content-type", guess_content_type(&path));
                BackendResult::success(url.normalized(), 200, headers, body)
            }
            Err(e) => BackendResult::synthetic_error(url.normalized(), 404, format!("read failed: {e}")),
        }
    }
}

fn guess_content_type(path: &std::path::Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html" | "htm") => "text/html",
        Some("md" | "markdown") => "text/markdown",
        Some("rst") => "text/x-rst",
        Some("adoc" | "asciidoc") => "text/asciidoc",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn reads_a_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("page.html");
        std::fs::File::create(&file_path)
            .unwrap()
            .write_all(b"<h1>hi</h1>")
            .unwrap();

        let raw = format!("file://{}", file_path.to_string_lossy());
        let url = URLInfo::parse_standalone(&raw);
        assert!(url.is_valid());

        let backend = FileBackend::new();
        let result = backend.crawl(&url).await;
        assert_eq!(result.status, 200);
        assert_eq!(result.text(), "<h1>hi</h1>");
    }

    #[tokio::test]
    async fn directory_resolves_to_index_html() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::File::create(dir.path().join("index.html"))
            .unwrap()
            .write_all(b"index")
            .unwrap();

        let raw = format!("file://{}/", dir.path().to_string_lossy());
        let url = URLInfo::parse_standalone(&raw);
        let backend = FileBackend::new();
        let result = backend.crawl(&url).await;
        assert_eq!(result.status, 200);
        assert_eq!(result.text(), "index");
    }

    #[tokio::test]
    async fn missing_file_is_a_404() {
        let url = URLInfo::parse_standalone("file:///nonexistent/path.html");
        let backend = FileBackend::new();
        let result = backend.crawl(&url).await;
        assert_eq!(result.status, 404);
    }
}
