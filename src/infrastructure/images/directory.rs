use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::ImagesConfig;
use crate::domain::ports::ImagePoolProvider;

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Image pool read from two folders under a common root
///
/// Each listing is filtered to PNG/JPEG files, sorted by file name and turned
/// into a URL of the form `{url_prefix}/{folder}/{encoded file name}`. The
/// folders are re-scanned on every call.
#[derive(Debug, Clone)]
pub struct DirectoryImagePool {
    root: PathBuf,
    similar_dir: String,
    different_dir: String,
    url_prefix: String,
}

impl DirectoryImagePool {
    pub fn new(
        root: impl Into<PathBuf>,
        similar_dir: impl Into<String>,
        different_dir: impl Into<String>,
        url_prefix: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            similar_dir: similar_dir.into(),
            different_dir: different_dir.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ImagesConfig) -> Self {
        Self::new(
            &config.root,
            &config.similar_dir,
            &config.different_dir,
            &config.url_prefix,
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn list(&self, folder: &str) -> DomainResult<Vec<String>> {
        let dir = self.root.join(folder);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(dir = %dir.display(), "image folder not found");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(DomainError::Storage(format!(
                    "failed to list {}: {e}",
                    dir.display()
                )))
            }
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_image(&name) {
                files.push(name);
            }
        }
        files.sort();

        Ok(files
            .iter()
            .map(|file| format!("{}/{}/{}", self.url_prefix, folder, encode_uri_component(file)))
            .collect())
    }
}

#[async_trait]
impl ImagePoolProvider for DirectoryImagePool {
    async fn similar_images(&self) -> DomainResult<Vec<String>> {
        self.list(&self.similar_dir).await
    }

    async fn different_images(&self) -> DomainResult<Vec<String>> {
        self.list(&self.different_dir).await
    }
}

fn is_image(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Percent-encode everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
fn encode_uri_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_is_image() {
        assert!(is_image("a.png"));
        assert!(is_image("b.JPG"));
        assert!(is_image("c.jpeg"));
        assert!(!is_image("notes.txt"));
        assert!(!is_image("png"));
    }

    #[test]
    fn test_encode_uri_component() {
        assert_eq!(encode_uri_component("cat 1.png"), "cat%201.png");
        assert_eq!(encode_uri_component("a&b(1).png"), "a%26b(1).png");
        assert_eq!(encode_uri_component("é.png"), "%C3%A9.png");
    }

    #[tokio::test]
    async fn test_lists_sorted_images_as_urls() {
        let root = TempDir::new().unwrap();
        let similar = root.path().join("Similar");
        std::fs::create_dir(&similar).unwrap();
        touch(&similar, "b.png");
        touch(&similar, "a one.jpg");
        touch(&similar, "readme.md");

        let pool = DirectoryImagePool::new(root.path(), "Similar", "Different", "/images/");
        let images = pool.similar_images().await.unwrap();
        assert_eq!(images, vec!["/images/Similar/a%20one.jpg", "/images/Similar/b.png"]);
    }

    #[tokio::test]
    async fn test_missing_folder_is_empty() {
        let root = TempDir::new().unwrap();
        let pool = DirectoryImagePool::new(root.path(), "Similar", "Different", "/images");
        assert!(pool.different_images().await.unwrap().is_empty());
    }
}
