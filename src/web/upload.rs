//! Article image storage.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::UploadConfig;
use crate::error::Error;

use super::request::Upload;

/// File extensions accepted for article images.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "ico", "cur", "apng", "svg", "jfif", "pjpeg", "pjp",
];

/// Why an upload was refused. Shown to the admin, not treated as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadRejection {
    /// Larger than the configured limit
    TooLarge {
        /// Limit in bytes
        max_bytes: u64,
    },
    /// Extension not on the allow-list
    UnsupportedType,
    /// No usable file name
    MissingName,
}

impl fmt::Display for UploadRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadRejection::TooLarge { max_bytes } => write!(
                f,
                "File is too big, max size is {}MB. If you wish to add an image, add one that meets the requirements, by editing the article.",
                max_bytes / 1_000_000
            ),
            UploadRejection::UnsupportedType => f.write_str(
                "Invalid file type. Only JPG, JPEG, PNG, GIF, ICO, CUR, APNG, SVG, JFIF, PJPEG, PJP are allowed. If you wish to add an image, add one that meets the requirements, by editing the article.",
            ),
            UploadRejection::MissingName => f.write_str("No file uploaded or upload error."),
        }
    }
}

/// Result of offering a file to an [`UploadStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Written; `path` is the public URL path to store in `article.path`
    Stored {
        /// Public path, e.g. `/images/upload/cat.png`
        path: String,
    },
    /// Refused
    Rejected(UploadRejection),
}

/// Where article images are kept.
pub trait UploadStore: Send + Sync {
    /// Validates and stores `upload`.
    fn store(&self, upload: &Upload) -> Result<UploadOutcome, Error>;

    /// Removes a previously stored file by its public path.
    ///
    /// Returns `false` when nothing was there to remove.
    fn remove(&self, public_path: &str) -> Result<bool, Error>;
}

/// Stores uploads as files in one directory.
#[derive(Debug, Clone)]
pub struct DirectoryUploads {
    directory: PathBuf,
    public_prefix: String,
    max_bytes: u64,
}

impl DirectoryUploads {
    /// Uses the directory, prefix and size limit from `config`.
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            directory: config.directory.clone(),
            public_prefix: config.public_prefix.trim_end_matches('/').to_string(),
            max_bytes: config.max_bytes,
        }
    }

    fn check(&self, upload: &Upload) -> Result<String, UploadRejection> {
        // Only the final path component is kept.
        let name = Path::new(&upload.file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or(UploadRejection::MissingName)?;
        if upload.size() > self.max_bytes {
            return Err(UploadRejection::TooLarge {
                max_bytes: self.max_bytes,
            });
        }
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(UploadRejection::UnsupportedType);
        }
        Ok(name.to_string())
    }

    fn local_path(&self, public_path: &str) -> Option<PathBuf> {
        let name = public_path.strip_prefix(&self.public_prefix)?.trim_start_matches('/');
        let name = Path::new(name).file_name()?;
        Some(self.directory.join(name))
    }
}

impl UploadStore for DirectoryUploads {
    fn store(&self, upload: &Upload) -> Result<UploadOutcome, Error> {
        let name = match self.check(upload) {
            Ok(name) => name,
            Err(rejection) => return Ok(UploadOutcome::Rejected(rejection)),
        };
        fs::create_dir_all(&self.directory)?;
        fs::write(self.directory.join(&name), &upload.bytes)?;
        tracing::info!(file = %name, bytes = upload.size(), "stored upload");
        Ok(UploadOutcome::Stored {
            path: format!("{}/{}", self.public_prefix, name),
        })
    }

    fn remove(&self, public_path: &str) -> Result<bool, Error> {
        let Some(path) = self.local_path(public_path) else {
            return Ok(false);
        };
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &Path) -> DirectoryUploads {
        DirectoryUploads::new(&UploadConfig {
            directory: dir.to_path_buf(),
            public_prefix: "/images/upload".to_string(),
            max_bytes: 10,
        })
    }

    #[test]
    fn stores_allowed_image_and_returns_public_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let outcome = store.store(&Upload::new("Cat.PNG", vec![0; 4])).unwrap();
        assert_eq!(
            outcome,
            UploadOutcome::Stored {
                path: "/images/upload/Cat.PNG".to_string()
            }
        );
        assert!(dir.path().join("Cat.PNG").exists());
    }

    #[test]
    fn rejects_large_and_unknown_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        assert_eq!(
            store.store(&Upload::new("big.png", vec![0; 11])).unwrap(),
            UploadOutcome::Rejected(UploadRejection::TooLarge { max_bytes: 10 })
        );
        assert_eq!(
            store.store(&Upload::new("run.exe", vec![0; 1])).unwrap(),
            UploadOutcome::Rejected(UploadRejection::UnsupportedType)
        );
    }

    #[test]
    fn client_directories_are_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let outcome = store.store(&Upload::new("../../etc/cat.gif", vec![1])).unwrap();
        assert!(matches!(outcome, UploadOutcome::Stored { ref path } if path == "/images/upload/cat.gif"));
        assert!(dir.path().join("cat.gif").exists());
    }

    #[test]
    fn remove_reports_whether_file_existed() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.store(&Upload::new("a.jpg", vec![1])).unwrap();
        assert!(store.remove("/images/upload/a.jpg").unwrap());
        assert!(!store.remove("/images/upload/a.jpg").unwrap());
        assert!(!store.remove("/elsewhere/a.jpg").unwrap());
    }
}
