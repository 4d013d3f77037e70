//! Helpers for staging uploaded documents on disk before indexing.

use crate::search::types::ServiceError;
use std::path::{Path, PathBuf};

/// File extensions accepted by the upload surface.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["pdf", "docx", "txt"];

/// Reduce a client-supplied name to a bare file name with an accepted extension.
pub fn sanitize_file_name(raw: &str) -> Result<String, ServiceError> {
    let trimmed = raw.trim();
    // Browsers on Windows may send full paths.
    let last = trimmed.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if last.is_empty() || last == "." || last == ".." {
        return Err(ServiceError::InvalidInput("file name is empty".into()));
    }

    let extension = Path::new(last)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase());
    match extension {
        Some(ext) if ACCEPTED_EXTENSIONS.contains(&ext.as_str()) => Ok(last.to_string()),
        _ => Err(ServiceError::InvalidInput(format!(
            "unsupported file type for '{last}'; expected one of {}",
            ACCEPTED_EXTENSIONS.join(", ")
        ))),
    }
}

/// Write `contents` into `directory/file_name`, creating the directory when needed.
pub async fn save_to_dir(
    directory: &Path,
    file_name: &str,
    contents: &[u8],
) -> Result<PathBuf, ServiceError> {
    tokio::fs::create_dir_all(directory)
        .await
        .map_err(|source| ServiceError::Staging {
            path: directory.to_path_buf(),
            source,
        })?;
    let path = directory.join(file_name);
    tokio::fs::write(&path, contents)
        .await
        .map_err(|source| ServiceError::Staging {
            path: path.clone(),
            source,
        })?;
    tracing::debug!(path = %path.display(), bytes = contents.len(), "Staged upload");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_directories_from_names() {
        assert_eq!(sanitize_file_name("../../etc/notes.txt").unwrap(), "notes.txt");
        assert_eq!(
            sanitize_file_name(r"C:\Users\me\Scan.PDF").unwrap(),
            "Scan.PDF"
        );
    }

    #[test]
    fn rejects_unsupported_or_empty_names() {
        assert!(matches!(
            sanitize_file_name("image.png"),
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            sanitize_file_name("dir/"),
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            sanitize_file_name("README"),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn saves_into_nested_directory() {
        let root = tempfile::tempdir().expect("tempdir");
        let directory = root.path().join("corpus");
        let path = save_to_dir(&directory, "visit.txt", b"hello")
            .await
            .expect("saved");

        assert_eq!(path, directory.join("visit.txt"));
        assert_eq!(std::fs::read(&path).expect("read"), b"hello");
    }
}
