//! Multipart document uploads to the indexing endpoint.

use crate::vectara::client::VectaraClient;
use crate::vectara::types::{
    CorpusTarget, Credential, FileUpload, StatusEntry, UploadDisposition, UploadReceipt,
    UploadRequest, VectaraError,
};
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

impl UploadRequest {
    /// Describe an upload of `path`, deriving the file name and MIME type from the path.
    pub fn from_path(target: CorpusTarget, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        let mime_type = infer_mime_type(&path);
        Self {
            target,
            path,
            file_name,
            mime_type,
        }
    }
}

/// Guess the MIME type from the file extension, falling back to `application/octet-stream`.
pub fn infer_mime_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

impl VectaraClient {
    /// Upload a single file into the target corpus.
    ///
    /// Succeeds on HTTP 200 when the embedded status is `OK`, `ALREADY_EXISTS`, or absent.
    pub async fn upload_file(
        &self,
        credential: &Credential,
        request: &UploadRequest,
    ) -> Result<UploadReceipt, VectaraError> {
        let contents =
            tokio::fs::read(&request.path)
                .await
                .map_err(|source| VectaraError::Io {
                    path: request.path.clone(),
                    source,
                })?;

        let part = Part::bytes(contents)
            .file_name(request.file_name.clone())
            .mime_str(&request.mime_type)?;
        let form = Form::new()
            .part("file", part)
            .text("doc_metadata", doc_metadata(&request.file_name));

        let builder = self
            .request(Method::POST, &request.target.host, "v1/upload")?
            .query(&[
                ("c", request.target.customer_id.to_string()),
                ("o", request.target.corpus_id.to_string()),
            ]);
        let response = credential.apply(builder)?.multipart(form).send().await?;

        if !Self::is_success(response.status()) {
            return Err(Self::unexpected_status(response, "upload").await);
        }

        let payload: Value = response.json().await?;
        let message = payload.get("response").cloned().unwrap_or(Value::Null);
        let disposition = upload_disposition(&message)?;

        tracing::info!(
            file = %request.file_name,
            corpus_id = request.target.corpus_id,
            disposition = ?disposition,
            "Document uploaded"
        );

        Ok(UploadReceipt {
            file_name: request.file_name.clone(),
            disposition,
            response: message,
        })
    }

    /// Upload every regular file in `directory` with a single freshly acquired token.
    ///
    /// Returns [`VectaraError::MissingCredentials`] without uploading anything when no token
    /// can be obtained.
    pub async fn upload_files_in_directory(
        &self,
        target: &CorpusTarget,
        directory: &Path,
    ) -> Result<Vec<FileUpload>, VectaraError> {
        let Some(token) = self.get_jwt_token().await else {
            return Err(VectaraError::MissingCredentials);
        };
        self.upload_directory_with(&Credential::from(token), target, directory)
            .await
    }

    /// Upload every regular file in `directory` using the supplied credential.
    ///
    /// Files are visited in file-name order and uploaded one at a time; a failed file is
    /// recorded and the batch continues.
    pub async fn upload_directory_with(
        &self,
        credential: &Credential,
        target: &CorpusTarget,
        directory: &Path,
    ) -> Result<Vec<FileUpload>, VectaraError> {
        let files = list_files(directory)?;
        tracing::debug!(
            directory = %directory.display(),
            files = files.len(),
            "Uploading directory"
        );

        let mut uploads = Vec::with_capacity(files.len());
        for path in files {
            let request = UploadRequest::from_path(target.clone(), path.clone());
            let result = self.upload_file(credential, &request).await;
            if let Err(error) = &result {
                tracing::warn!(
                    file = %path.display(),
                    error = %error,
                    "Upload failed; continuing batch"
                );
            }
            uploads.push(FileUpload { path, result });
        }

        let failed = uploads.iter().filter(|upload| !upload.succeeded()).count();
        tracing::info!(
            directory = %directory.display(),
            uploaded = uploads.len() - failed,
            failed,
            "Directory upload finished"
        );
        Ok(uploads)
    }
}

fn doc_metadata(file_name: &str) -> String {
    json!({ "filename": file_name }).to_string()
}

fn upload_disposition(message: &Value) -> Result<UploadDisposition, VectaraError> {
    let status = match message.get("status") {
        None | Some(Value::Null) => return Ok(UploadDisposition::Indexed),
        Some(Value::Object(map)) if map.is_empty() => return Ok(UploadDisposition::Indexed),
        Some(value) => serde_json::from_value::<StatusEntry>(value.clone())
            .map_err(|err| VectaraError::MalformedResponse(err.to_string()))?,
    };

    match status.code.as_str() {
        StatusEntry::OK => Ok(UploadDisposition::Indexed),
        StatusEntry::ALREADY_EXISTS => Ok(UploadDisposition::AlreadyExists),
        _ => {
            tracing::error!(status = %status, "Upload rejected by Vectara");
            Err(VectaraError::UploadRejected { status })
        }
    }
}

fn list_files(directory: &Path) -> Result<Vec<PathBuf>, VectaraError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|err| VectaraError::Io {
            path: directory.to_path_buf(),
            source: err.into(),
        })?;
        // Symlinks count when they resolve to a regular file.
        if entry.path().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectara::client::test_client;
    use httpmock::{Method::POST, MockServer};

    fn target(server: &MockServer) -> CorpusTarget {
        CorpusTarget {
            customer_id: 42,
            corpus_id: 6,
            host: server.base_url(),
        }
    }

    fn bearer() -> Credential {
        Credential::Bearer("token-1".into())
    }

    #[test]
    fn infers_mime_types_from_extension() {
        assert_eq!(infer_mime_type(Path::new("notes.txt")), "text/plain");
        assert_eq!(infer_mime_type(Path::new("scan.pdf")), "application/pdf");
        assert_eq!(
            infer_mime_type(Path::new("record.docx")),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(
            infer_mime_type(Path::new("blob.unknownext")),
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn ok_status_is_success() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/upload")
                    .query_param("c", "42")
                    .query_param("o", "6")
                    .header("authorization", "Bearer token-1")
                    .body_contains("name=\"doc_metadata\"")
                    .body_contains("{\"filename\":\"visit.txt\"}")
                    .body_contains("patient notes");
                then.status(200)
                    .json_body(serde_json::json!({ "response": { "status": { "code": "OK" } } }));
            })
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("visit.txt");
        std::fs::write(&path, "patient notes").expect("write");

        let client = test_client(&server.base_url());
        let request = UploadRequest::from_path(target(&server), &path);
        let receipt = client
            .upload_file(&bearer(), &request)
            .await
            .expect("upload");

        mock.assert();
        assert_eq!(receipt.file_name, "visit.txt");
        assert_eq!(receipt.disposition, UploadDisposition::Indexed);
        assert_eq!(receipt.response["status"]["code"], "OK");
    }

    #[tokio::test]
    async fn already_exists_is_success() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/upload");
                then.status(200).json_body(serde_json::json!({
                    "response": { "status": { "code": "ALREADY_EXISTS" } }
                }));
            })
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("visit.pdf");
        std::fs::write(&path, b"%PDF-1.4").expect("write");

        let client = test_client(&server.base_url());
        let receipt = client
            .upload_file(&bearer(), &UploadRequest::from_path(target(&server), &path))
            .await
            .expect("upload");
        assert_eq!(receipt.disposition, UploadDisposition::AlreadyExists);
    }

    #[tokio::test]
    async fn other_status_codes_are_rejections() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/upload");
                then.status(200).json_body(serde_json::json!({
                    "response": {
                        "status": { "code": "FORBIDDEN", "statusDetail": "corpus disabled" }
                    }
                }));
            })
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("visit.txt");
        std::fs::write(&path, "x").expect("write");

        let client = test_client(&server.base_url());
        let error = client
            .upload_file(&bearer(), &UploadRequest::from_path(target(&server), &path))
            .await
            .expect_err("rejected");

        assert!(error.is_rejection());
        match error {
            VectaraError::UploadRejected { status } => {
                assert_eq!(status.code, "FORBIDDEN");
                assert_eq!(status.status_detail.as_deref(), Some("corpus disabled"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_status_counts_as_indexed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/upload");
                then.status(200)
                    .json_body(serde_json::json!({ "response": { "status": {} } }));
            })
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("visit.txt");
        std::fs::write(&path, "x").expect("write");

        let client = test_client(&server.base_url());
        let receipt = client
            .upload_file(&bearer(), &UploadRequest::from_path(target(&server), &path))
            .await
            .expect("upload");
        assert_eq!(receipt.disposition, UploadDisposition::Indexed);
    }

    #[tokio::test]
    async fn non_200_is_transport_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/upload");
                then.status(401).body("unauthorized");
            })
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("visit.txt");
        std::fs::write(&path, "x").expect("write");

        let client = test_client(&server.base_url());
        let error = client
            .upload_file(&bearer(), &UploadRequest::from_path(target(&server), &path))
            .await
            .expect_err("failure");
        assert!(matches!(error, VectaraError::UnexpectedStatus { .. }));
    }

    #[tokio::test]
    async fn empty_token_is_missing_credentials() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/upload");
                then.status(200);
            })
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("visit.txt");
        std::fs::write(&path, "x").expect("write");

        let client = test_client(&server.base_url());
        let error = client
            .upload_file(
                &Credential::Bearer(String::new()),
                &UploadRequest::from_path(target(&server), &path),
            )
            .await
            .expect_err("missing token");

        assert!(error.is_missing_credentials());
        mock.assert_hits(0);
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let server = MockServer::start_async().await;
        let client = test_client(&server.base_url());
        let error = client
            .upload_file(
                &bearer(),
                &UploadRequest::from_path(target(&server), "/definitely/not/here.txt"),
            )
            .await
            .expect_err("io");
        assert!(matches!(error, VectaraError::Io { .. }));
    }

    #[tokio::test]
    async fn batch_preserves_order_and_isolates_failures() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/upload")
                    .body_contains("b-broken.txt");
                then.status(500).body("boom");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/upload");
                then.status(200)
                    .json_body(serde_json::json!({ "response": { "status": { "code": "OK" } } }));
            })
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["a-first.txt", "b-broken.txt", "c-last.txt"] {
            std::fs::write(dir.path().join(name), name).expect("write");
        }
        std::fs::create_dir(dir.path().join("nested")).expect("subdir");

        let client = test_client(&server.base_url());
        let uploads = client
            .upload_directory_with(&bearer(), &target(&server), dir.path())
            .await
            .expect("batch");

        assert_eq!(uploads.len(), 3);
        let names: Vec<_> = uploads
            .iter()
            .map(|upload| upload.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a-first.txt", "b-broken.txt", "c-last.txt"]);
        assert!(uploads[0].succeeded());
        assert!(!uploads[1].succeeded());
        assert!(uploads[2].succeeded());
    }

    #[tokio::test]
    async fn batch_without_token_uploads_nothing() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth2/token");
                then.status(403).body("denied");
            })
            .await;
        let upload = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/upload");
                then.status(200);
            })
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("a.txt"), "a").expect("write");

        let client = test_client(&server.base_url());
        let error = client
            .upload_files_in_directory(&target(&server), dir.path())
            .await
            .expect_err("no token");

        assert!(error.is_missing_credentials());
        upload.assert_hits(0);
    }

    #[tokio::test]
    async fn batch_fetches_one_token_for_all_files() {
        let server = MockServer::start_async().await;
        let token = server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth2/token");
                then.status(200).json_body(serde_json::json!({ "access_token": "batch" }));
            })
            .await;
        let upload = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/upload")
                    .header("authorization", "Bearer batch");
                then.status(200)
                    .json_body(serde_json::json!({ "response": { "status": { "code": "OK" } } }));
            })
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("a.txt"), "a").expect("write");
        std::fs::write(dir.path().join("b.txt"), "b").expect("write");

        let client = test_client(&server.base_url());
        let uploads = client
            .upload_files_in_directory(&target(&server), dir.path())
            .await
            .expect("batch");

        assert_eq!(uploads.len(), 2);
        assert!(uploads.iter().all(FileUpload::succeeded));
        token.assert_hits(1);
        upload.assert_hits(2);
    }

    #[cfg(unix)]
    #[test]
    fn listing_follows_symlinked_files_and_skips_directories() {
        let source = tempfile::tempdir().expect("source");
        let original = source.path().join("referral.pdf");
        std::fs::write(&original, b"%PDF").expect("write");

        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("notes.txt"), b"notes").expect("write");
        std::os::unix::fs::symlink(&original, dir.path().join("linked.pdf")).expect("symlink");
        std::os::unix::fs::symlink(dir.path().join("gone.txt"), dir.path().join("broken.txt"))
            .expect("symlink");
        std::fs::create_dir(dir.path().join("archive")).expect("mkdir");

        let names: Vec<_> = list_files(dir.path())
            .expect("listing")
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["linked.pdf", "notes.txt"]);
    }
}
