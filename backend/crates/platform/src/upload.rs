//! Secure Upload Pipeline
//!
//! Image uploads are accepted only after:
//! 1. size check against [`UploadConfig::max_bytes`]
//! 2. magic-byte sniffing (PNG / JPEG); names and declared types are ignored
//! 3. storage root creation
//! 4. generation of a random file name
//! 5. canonical containment check against the storage root
//! 6. symlink check on every component between root and target
//! 7. write to a temporary sibling, fsync, atomic rename
//!
//! All operations are blocking; async callers should run them on a blocking
//! thread.

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::crypto::random_token;

/// Default size cap (bytes)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5_000_000;

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

// ============================================================================
// Types
// ============================================================================

/// Accepted image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Png,
    Jpeg,
}

impl ImageType {
    pub const fn mime(&self) -> &'static str {
        match self {
            ImageType::Png => "image/png",
            ImageType::Jpeg => "image/jpeg",
        }
    }

    pub const fn extension(&self) -> &'static str {
        match self {
            ImageType::Png => "png",
            ImageType::Jpeg => "jpg",
        }
    }
}

/// Detect the image type from content alone
pub fn sniff_image_type(data: &[u8]) -> Option<ImageType> {
    if data.starts_with(&PNG_SIGNATURE) {
        return Some(ImageType::Png);
    }
    if data.len() >= 4 && data.starts_with(&JPEG_SOI) && data.ends_with(&JPEG_EOI) {
        return Some(ImageType::Jpeg);
    }
    None
}

/// Upload failures
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("File size {size} exceeds maximum of {max} bytes")]
    FileTooLarge { size: usize, max: usize },

    #[error("Only PNG and JPEG images are accepted")]
    InvalidFileType,

    #[error("Resolved path escapes the storage root")]
    PathTraversal,

    #[error("Symbolic link found in storage path")]
    SymlinkInPath,

    #[error("Filesystem error: {0}")]
    Filesystem(#[source] io::Error),

    #[error("Unexpected upload failure: {0}")]
    Unexpected(String),
}

impl UploadError {
    /// Stable reason string exposed to clients
    pub const fn reason(&self) -> &'static str {
        match self {
            UploadError::FileTooLarge { .. } => "file_too_large",
            UploadError::InvalidFileType => "invalid_file_type",
            UploadError::PathTraversal => "path_traversal_detected",
            UploadError::SymlinkInPath => "symlink_in_path",
            UploadError::Filesystem(_) => "filesystem_error",
            UploadError::Unexpected(_) => "unexpected_error",
        }
    }
}

impl From<io::Error> for UploadError {
    fn from(err: io::Error) -> Self {
        UploadError::Filesystem(err)
    }
}

/// Result of a successful store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    /// Canonical absolute path of the written file
    pub path: PathBuf,
    /// Path relative to the storage root (`scope/name.ext` or `name.ext`)
    pub relative_path: String,
    pub file_name: String,
    pub image_type: ImageType,
    pub size: usize,
}

/// Metadata of a stored file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub file_name: String,
    pub size: u64,
    pub extension: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

/// Upload configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Storage root; the security boundary for every path check
    pub root: PathBuf,
    pub max_bytes: usize,
}

impl UploadConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

// ============================================================================
// Store
// ============================================================================

/// Sandboxed image store
#[derive(Debug, Clone)]
pub struct UploadStore {
    config: UploadConfig,
}

impl UploadStore {
    pub fn new(config: UploadConfig) -> Self {
        Self { config }
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    pub fn max_bytes(&self) -> usize {
        self.config.max_bytes
    }

    /// Store directly under the root
    pub fn store(&self, data: &[u8]) -> Result<StoredUpload, UploadError> {
        self.store_in(None, data)
    }

    /// Store under `root/scope`; `scope` must be a single plain path segment
    pub fn store_scoped(&self, scope: &str, data: &[u8]) -> Result<StoredUpload, UploadError> {
        self.store_in(Some(scope), data)
    }

    fn store_in(&self, scope: Option<&str>, data: &[u8]) -> Result<StoredUpload, UploadError> {
        let result = self.try_store(scope, data);
        match &result {
            Ok(stored) => tracing::info!(
                file = %stored.relative_path,
                size = stored.size,
                mime = stored.image_type.mime(),
                "Upload stored"
            ),
            Err(err) => tracing::warn!(reason = err.reason(), "Upload rejected"),
        }
        result
    }

    fn try_store(&self, scope: Option<&str>, data: &[u8]) -> Result<StoredUpload, UploadError> {
        // 1. size
        let max = self.config.max_bytes;
        if data.len() > max {
            return Err(UploadError::FileTooLarge {
                size: data.len(),
                max,
            });
        }

        // 2. content type
        let image_type = sniff_image_type(data).ok_or(UploadError::InvalidFileType)?;

        // 3. root
        fs::create_dir_all(&self.config.root)?;
        let root = fs::canonicalize(&self.config.root)?;

        // 4. name
        let file_name = format!("{}.{}", random_token(16), image_type.extension());

        // 5. containment
        let lexical_dir = match scope {
            Some(scope) => {
                if !is_single_segment(scope) {
                    return Err(UploadError::PathTraversal);
                }
                root.join(scope)
            }
            None => root.clone(),
        };
        fs::create_dir_all(&lexical_dir)?;
        let target_dir = fs::canonicalize(&lexical_dir)?;
        if !target_dir.starts_with(&root) {
            return Err(UploadError::PathTraversal);
        }
        let target = target_dir.join(&file_name);

        // 6. symlinks between root and target
        ensure_no_symlinks(&root, &lexical_dir.join(&file_name))?;

        // 7. atomic write
        let mut temp = NamedTempFile::new_in(&target_dir)?;
        temp.write_all(data)?;
        temp.as_file().sync_all()?;
        temp.persist_noclobber(&target).map_err(|e| UploadError::Filesystem(e.error))?;

        let relative_path = match scope {
            Some(scope) => format!("{}/{}", scope, file_name),
            None => file_name.clone(),
        };

        Ok(StoredUpload {
            path: target,
            relative_path,
            file_name,
            image_type,
            size: data.len(),
        })
    }

    /// Metadata for a stored file; `None` if missing or outside the root
    pub fn info(&self, path: impl AsRef<Path>) -> Option<FileInfo> {
        let resolved = self.resolve_existing(path.as_ref())?;
        let metadata = fs::metadata(&resolved).ok()?;
        if !metadata.is_file() {
            return None;
        }

        Some(FileInfo {
            file_name: resolved.file_name()?.to_string_lossy().into_owned(),
            size: metadata.len(),
            extension: resolved
                .extension()
                .map(|ext| ext.to_string_lossy().into_owned()),
            created: metadata.created().ok().map(DateTime::<Utc>::from),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        })
    }

    /// Delete a stored file; `false` if missing, outside the root, or on error
    pub fn delete(&self, path: impl AsRef<Path>) -> bool {
        let Some(resolved) = self.resolve_existing(path.as_ref()) else {
            return false;
        };
        match fs::remove_file(&resolved) {
            Ok(()) => {
                tracing::info!(file = %resolved.display(), "Upload deleted");
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "Upload could not be deleted");
                false
            }
        }
    }

    /// Resolve a relative (to root) or absolute path to an existing,
    /// non-symlink file inside the root
    fn resolve_existing(&self, path: &Path) -> Option<PathBuf> {
        let root = fs::canonicalize(&self.config.root).ok()?;
        let candidate = if path.is_absolute() {
            path.to_path_buf()
        } else {
            if path
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
            {
                return None;
            }
            root.join(path)
        };

        let link_meta = fs::symlink_metadata(&candidate).ok()?;
        if link_meta.file_type().is_symlink() {
            return None;
        }

        let canonical = fs::canonicalize(&candidate).ok()?;
        if canonical.starts_with(&root) && canonical != root {
            Some(canonical)
        } else {
            None
        }
    }
}

fn is_single_segment(segment: &str) -> bool {
    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !segment.contains(['/', '\\'])
}

/// Reject if any existing component strictly below `root` on the way to
/// `target` is a symbolic link
fn ensure_no_symlinks(root: &Path, target: &Path) -> Result<(), UploadError> {
    let relative = target
        .strip_prefix(root)
        .map_err(|_| UploadError::PathTraversal)?;

    let mut current = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => current.push(part),
            _ => return Err(UploadError::PathTraversal),
        }
        match fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => return Err(UploadError::SymlinkInPath),
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(UploadError::Filesystem(err)),
        }
    }
    Ok(())
}
