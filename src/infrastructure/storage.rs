//! Local-disk storage for uploaded documents and product images.
//!
//! Files are written flat under a base directory; the database row keeps the
//! resulting path. There is no content addressing and no deduplication, a
//! second upload with the same name in the same second overwrites the first.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs;

use crate::domain::DomainError;

pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "xls", "xlsx", "jpg", "jpeg", "png"];
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// A file that has been written to disk
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub file_name: String,
    pub path: String,
    pub size: i64,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    base_path: PathBuf,
    max_size: usize,
}

impl FileStore {
    pub fn new(base_path: impl Into<PathBuf>, max_size: usize) -> Self {
        Self {
            base_path: base_path.into(),
            max_size,
        }
    }

    /// Write `data` as `file_name` inside the base directory.
    pub async fn save(&self, file_name: &str, data: &[u8]) -> Result<StoredFile, DomainError> {
        if data.len() > self.max_size {
            return Err(DomainError::Validation(format!(
                "File is {} bytes, limit is {}",
                data.len(),
                self.max_size
            )));
        }

        let file_name = sanitize_file_name(file_name);
        fs::create_dir_all(&self.base_path).await?;
        let path = self.base_path.join(&file_name);

        if let Err(e) = fs::write(&path, data).await {
            let _ = fs::remove_file(&path).await;
            return Err(e.into());
        }

        tracing::debug!("Stored {} bytes at {}", data.len(), path.display());

        Ok(StoredFile {
            file_name,
            path: path.to_string_lossy().into_owned(),
            size: data.len() as i64,
        })
    }

    pub async fn read(&self, path: &str) -> Result<Vec<u8>, DomainError> {
        match fs::read(path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(DomainError::not_found("File"))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Returns false when the file was already gone.
    pub async fn remove(&self, path: &str) -> Result<bool, DomainError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keep the last path component and replace anything outside `[A-Za-z0-9._-]`.
pub fn sanitize_file_name(name: &str) -> String {
    let last = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

/// `{YYYYmmdd_HHMMSS}_{name}`
pub fn timestamped_name(original: &str, at: DateTime<Utc>) -> String {
    format!(
        "{}_{}",
        at.format("%Y%m%d_%H%M%S"),
        sanitize_file_name(original)
    )
}

/// Lowercased extension without the dot
pub fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

pub fn has_allowed_extension(name: &str, allowed: &[&str]) -> bool {
    extension(name).is_some_and(|ext| allowed.contains(&ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sanitize_strips_directories_and_odd_characters() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\docs\\Factură 01.pdf"), "Factur__01.pdf");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), "file");
    }

    #[test]
    fn timestamp_prefix_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(timestamped_name("invoice.pdf", at), "20240309_140507_invoice.pdf");
    }

    #[test]
    fn extension_checks_are_case_insensitive() {
        assert!(has_allowed_extension("DATASHEET.PDF", DOCUMENT_EXTENSIONS));
        assert!(has_allowed_extension("photo.Jpeg", IMAGE_EXTENSIONS));
        assert!(!has_allowed_extension("script.sh", DOCUMENT_EXTENSIONS));
        assert!(!has_allowed_extension("noext", DOCUMENT_EXTENSIONS));
        assert!(!has_allowed_extension("sheet.xlsx", IMAGE_EXTENSIONS));
    }

    #[tokio::test]
    async fn save_read_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("docs"), 1024);

        let data = b"\x00\x01binary\xffpayload";
        let stored = store.save("a b.pdf", data).await.unwrap();
        assert_eq!(stored.file_name, "a_b.pdf");
        assert_eq!(stored.size, data.len() as i64);
        assert_eq!(store.read(&stored.path).await.unwrap(), data);

        assert!(store.remove(&stored.path).await.unwrap());
        assert!(!store.remove(&stored.path).await.unwrap());
        assert!(matches!(
            store.read(&stored.path).await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn size_limit_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), 4);
        let result = store.save("big.pdf", b"more than four").await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(!dir.path().join("big.pdf").exists());
    }
}
