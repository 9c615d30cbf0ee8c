use sha2::{Digest, Sha256};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

pub const PHOTOS_DIR: &str = "photos";
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Hex digits of the content hash kept in a blob key.
const KEY_HASH_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum PhotoError {
    #[error("unsupported photo type {0:?} (expected jpg, jpeg or png)")]
    UnsupportedType(String),
    #[error("photo upload is empty")]
    Empty,
    #[error("failed to write photo {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPhoto {
    pub key: String,
    /// Base filename as uploaded; this is what the record shows as `photo`.
    pub file_name: String,
    pub newly_written: bool,
}

/// Blob store for student photos rooted at `<workspace>/photos`.
#[derive(Debug, Clone)]
pub struct PhotoArchive {
    root: PathBuf,
}

impl PhotoArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn for_workspace(workspace: &Path) -> Self {
        Self::new(workspace.join(PHOTOS_DIR))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store(
        &self,
        owner_name: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<StoredPhoto, PhotoError> {
        let file_name = base_file_name(file_name);
        check_extension(&file_name)?;
        if bytes.is_empty() {
            return Err(PhotoError::Empty);
        }

        let key = blob_key(owner_name, &file_name, bytes);
        let dst = self.root.join(&key);
        if dst.is_file() {
            // Same owner, same name, same bytes: nothing to write.
            return Ok(StoredPhoto {
                key,
                file_name,
                newly_written: false,
            });
        }

        std::fs::create_dir_all(&self.root).map_err(|source| PhotoError::Write {
            path: self.root.clone(),
            source,
        })?;
        let tmp = self.root.join(format!(".{}.writing", key));
        std::fs::write(&tmp, bytes).map_err(|source| PhotoError::Write {
            path: tmp.clone(),
            source,
        })?;
        if let Err(source) = std::fs::rename(&tmp, &dst) {
            let _ = std::fs::remove_file(&tmp);
            return Err(PhotoError::Write { path: dst, source });
        }

        tracing::debug!(key = %key, bytes = bytes.len(), "stored photo");
        Ok(StoredPhoto {
            key,
            file_name,
            newly_written: true,
        })
    }

    /// Keyed records resolve by key; unkeyed (legacy) records by the old
    /// `{name}_{filename}` derivation.
    pub fn resolve(&self, owner_name: &str, file_name: &str, key: Option<&str>) -> Option<PathBuf> {
        let candidate = match key {
            Some(k) if is_plain_file_name(k) => self.root.join(k),
            Some(_) => return None,
            None => {
                if file_name.is_empty() {
                    return None;
                }
                let legacy = legacy_file_name(owner_name, file_name);
                if !is_plain_file_name(&legacy) {
                    return None;
                }
                self.root.join(legacy)
            }
        };
        if candidate.is_file() {
            Some(candidate)
        } else {
            None
        }
    }

    /// Key for an unkeyed record whose legacy-named file is in the archive.
    /// Storing it pins the photo so a later rename does not lose it.
    pub fn legacy_key(&self, owner_name: &str, file_name: &str) -> Option<String> {
        self.resolve(owner_name, file_name, None)?;
        Some(legacy_file_name(owner_name, file_name))
    }

    /// Removes a blob written by a command that failed afterwards.
    pub fn discard(&self, stored: &StoredPhoto) {
        if !stored.newly_written {
            return;
        }
        let path = self.root.join(&stored.key);
        if let Err(e) = std::fs::remove_file(&path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to discard photo");
        }
    }
}

pub fn check_extension(file_name: &str) -> Result<(), PhotoError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(OsStr::to_str)
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();
    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(PhotoError::UnsupportedType(file_name.to_string()))
    }
}

pub fn legacy_file_name(owner_name: &str, file_name: &str) -> String {
    format!("{}_{}", owner_name.replace(' ', "_"), file_name)
}

pub fn blob_key(owner_name: &str, file_name: &str, bytes: &[u8]) -> String {
    let digest = format!("{:x}", Sha256::digest(bytes));
    format!(
        "{}_{}_{}",
        sanitize_component(owner_name, "student"),
        &digest[..KEY_HASH_LEN],
        sanitize_component(file_name, "photo")
    )
}

fn sanitize_component(s: &str, fallback: &str) -> String {
    let out: String = s
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let out = out.trim_matches('.').to_string();
    if out.is_empty() {
        fallback.to_string()
    } else {
        out
    }
}

fn base_file_name(file_name: &str) -> String {
    // Browsers on Windows may send the full client path.
    file_name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or("")
        .trim()
        .to_string()
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && Path::new(name).file_name().and_then(OsStr::to_str) == Some(name)
        && name != ".."
}
