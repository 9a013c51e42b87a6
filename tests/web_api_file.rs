//! Web API File Tests
//!
//! Integration tests for listing, upload, download and export endpoints.

use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use filedrop::file::UploadRoot;
use filedrop::web::handlers::AppState;
use filedrop::web::router::create_router;
use serde_json::Value;
use tempfile::TempDir;
use zip::ZipArchive;

/// Test fixture holding the upload root and the export temp directory.
struct TestEnv {
    _temp_dir: TempDir,
    uploads: std::path::PathBuf,
    exports: std::path::PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let uploads = temp_dir.path().join("uploads");
        let exports = temp_dir.path().join("exports");
        fs::create_dir_all(&exports).unwrap();
        Self {
            _temp_dir: temp_dir,
            uploads,
            exports,
        }
    }

    fn touch(&self, relative: &str, content: &[u8]) {
        let path = self.uploads.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn exports_empty(&self) -> bool {
        fs::read_dir(&self.exports).unwrap().next().is_none()
    }
}

/// Create a test server over a fresh upload root.
fn create_test_server(env: &TestEnv, export_hidden: bool) -> TestServer {
    let storage = UploadRoot::new(&env.uploads).expect("Failed to create upload root");

    let app_state = Arc::new(
        AppState::new(storage)
            .with_temp_dir(&env.exports)
            .with_export_hidden(export_hidden)
            .with_max_upload_size(1024 * 1024),
    );

    let router = create_router(app_state, &[]);

    TestServer::new(router).expect("Failed to create test server")
}

fn upload_form(filename: &str, content: &'static [u8], folder: Option<&str>) -> MultipartForm {
    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(content)
            .file_name(filename)
            .mime_type("text/plain"),
    );

    match folder {
        Some(folder) => form.add_text("folder", folder),
        None => form,
    }
}

fn zip_members(bytes: &[u8]) -> Vec<String> {
    let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

/// Archive members that are files, leaving out directory entries.
fn file_members(bytes: &[u8]) -> Vec<String> {
    zip_members(bytes)
        .into_iter()
        .filter(|name| !name.ends_with('/'))
        .collect()
}

fn string_array(body: &Value) -> Vec<String> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Listing Tests
// ============================================================================

#[tokio::test]
async fn test_list_files_empty() {
    let env = TestEnv::new();
    let server = create_test_server(&env, false);

    let response = server.get("/files").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_files_recursive() {
    let env = TestEnv::new();
    env.touch("a.txt", b"a");
    env.touch("sub/b.txt", b"b");
    env.touch("sub/deeper/c.txt", b"c");
    let server = create_test_server(&env, false);

    let response = server.get("/files").await;

    response.assert_status_ok();
    assert_eq!(
        string_array(&response.json()),
        vec!["a.txt", "sub/b.txt", "sub/deeper/c.txt"]
    );
}

#[tokio::test]
async fn test_list_files_excludes_hidden() {
    let env = TestEnv::new();
    env.touch(".hidden/secret.txt", b"secret");
    env.touch("visible.txt", b"visible");
    env.touch("docs/.draft", b"draft");
    let server = create_test_server(&env, false);

    let response = server.get("/files").await;

    response.assert_status_ok();
    assert_eq!(string_array(&response.json()), vec!["visible.txt"]);
}

#[tokio::test]
async fn test_list_files_root_removed_is_server_error() {
    let env = TestEnv::new();
    let server = create_test_server(&env, false);
    fs::remove_dir_all(&env.uploads).unwrap();

    let response = server.get("/files").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
}

#[tokio::test]
async fn test_folder_structure_keeps_duplicate_names() {
    let env = TestEnv::new();
    env.touch("2023/report.pdf", b"old");
    env.touch("2024/report.pdf", b"new");
    env.touch(".cache/index", b"x");
    let server = create_test_server(&env, false);

    let response = server.get("/folder-structure").await;

    response.assert_status_ok();
    assert_eq!(
        string_array(&response.json()),
        vec!["2023/report.pdf", "2024/report.pdf"]
    );
}

#[tokio::test]
async fn test_folder_structure_read_error() {
    let env = TestEnv::new();
    let server = create_test_server(&env, false);
    fs::remove_dir_all(&env.uploads).unwrap();

    let response = server.get("/folder-structure").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "Failed to read folder structure");
}

// ============================================================================
// Upload Tests
// ============================================================================

#[tokio::test]
async fn test_upload_to_root() {
    let env = TestEnv::new();
    let server = create_test_server(&env, false);

    let response = server
        .post("/upload")
        .multipart(upload_form("hello.txt", b"Hello, World!", None))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["file"]["name"], "hello.txt");
    assert_eq!(body["file"]["size"], 13);
    assert_eq!(body["file"]["path"], "hello.txt");
    assert_eq!(body["file"]["folder"], "");
    assert_eq!(
        fs::read(env.uploads.join("hello.txt")).unwrap(),
        b"Hello, World!"
    );
}

#[tokio::test]
async fn test_upload_creates_nested_folder() {
    let env = TestEnv::new();
    let server = create_test_server(&env, false);
    assert!(!env.uploads.join("a").exists());

    let response = server
        .post("/upload")
        .multipart(upload_form("note.txt", b"nested", Some("a/b")))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["file"]["path"], "a/b/note.txt");
    assert!(env.uploads.join("a/b").is_dir());
    assert_eq!(fs::read(env.uploads.join("a/b/note.txt")).unwrap(), b"nested");
}

#[tokio::test]
async fn test_upload_same_name_overwrites() {
    let env = TestEnv::new();
    let server = create_test_server(&env, false);

    server
        .post("/upload")
        .multipart(upload_form("note.txt", b"first", Some("docs")))
        .await
        .assert_status_ok();
    server
        .post("/upload")
        .multipart(upload_form("note.txt", b"second", Some("docs")))
        .await
        .assert_status_ok();

    let response = server.get("/files/docs/note.txt").await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), b"second");

    let listing = server.get("/files").await;
    assert_eq!(string_array(&listing.json()), vec!["docs/note.txt"]);
}

#[tokio::test]
async fn test_upload_without_file() {
    let env = TestEnv::new();
    let server = create_test_server(&env, false);

    let response = server
        .post("/upload")
        .multipart(MultipartForm::new().add_text("folder", "docs"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "No file provided");
    assert!(!env.uploads.join("docs").exists());
}

#[tokio::test]
async fn test_upload_rejects_parent_folder() {
    let env = TestEnv::new();
    let server = create_test_server(&env, false);

    let response = server
        .post("/upload")
        .multipart(upload_form("evil.txt", b"x", Some("../escape")))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(!env.uploads.parent().unwrap().join("escape").exists());
}

#[tokio::test]
async fn test_upload_too_large() {
    let env = TestEnv::new();
    let server = create_test_server(&env, false);
    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(vec![0u8; 1024 * 1024 + 1]).file_name("big.bin"),
    );

    let response = server.post("/upload").multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(!env.uploads.join("big.bin").exists());
}

// ============================================================================
// Download Tests
// ============================================================================

#[tokio::test]
async fn test_download_file() {
    let env = TestEnv::new();
    env.touch("docs/readme.txt", b"read me");
    let server = create_test_server(&env, false);

    let response = server.get("/files/docs/readme.txt").await;

    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), b"read me");
    assert_eq!(
        response.header("content-disposition"),
        "attachment; filename=\"readme.txt\""
    );
    assert!(response
        .header("content-type")
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
}

#[tokio::test]
async fn test_download_missing_file_is_not_found() {
    let env = TestEnv::new();
    let server = create_test_server(&env, false);

    let response = server.get("/files/missing.txt").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_download_directory_is_not_found() {
    let env = TestEnv::new();
    env.touch("docs/readme.txt", b"read me");
    let server = create_test_server(&env, false);

    let response = server.get("/files/docs").await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[cfg(unix)]
#[tokio::test]
async fn test_download_symlink_is_not_found() {
    let env = TestEnv::new();
    env.touch("a.txt", b"alpha");
    let outside = env.uploads.parent().unwrap().join("outside.txt");
    fs::write(&outside, b"OUTSIDE SECRET").unwrap();
    std::os::unix::fs::symlink("../outside.txt", env.uploads.join("link.txt")).unwrap();
    let server = create_test_server(&env, false);

    let listing = server.get("/files").await;
    assert_eq!(string_array(&listing.json()), vec!["a.txt"]);

    let response = server.get("/files/link.txt").await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert!(!response.text().contains("OUTSIDE SECRET"));
}

// ============================================================================
// Export Tests
// ============================================================================

async fn download_all(server: &TestServer) -> Vec<u8> {
    let response = server.get("/download-all").await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "application/zip");
    response.as_bytes().to_vec()
}

#[tokio::test]
async fn test_download_all_members_are_relative() {
    let env = TestEnv::new();
    env.touch("a.txt", b"alpha");
    env.touch("sub/b.txt", b"bravo");
    let server = create_test_server(&env, false);

    let bytes = download_all(&server).await;

    assert_eq!(file_members(&bytes), vec!["a.txt", "sub/b.txt"]);

    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut content = String::new();
    archive
        .by_name("sub/b.txt")
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    assert_eq!(content, "bravo");
}

#[tokio::test]
async fn test_download_all_keeps_empty_folders() {
    let env = TestEnv::new();
    env.touch("a.txt", b"alpha");
    fs::create_dir_all(env.uploads.join("empty")).unwrap();
    let server = create_test_server(&env, false);

    let bytes = download_all(&server).await;

    assert_eq!(zip_members(&bytes), vec!["a.txt", "empty/"]);
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert!(archive.by_name("empty/").unwrap().is_dir());
}

#[tokio::test]
async fn test_download_all_removes_artifact() {
    let env = TestEnv::new();
    env.touch("a.txt", b"alpha");
    let server = create_test_server(&env, false);

    download_all(&server).await;

    assert!(env.exports_empty());
}

#[tokio::test]
async fn test_download_all_hidden_policy() {
    let env = TestEnv::new();
    env.touch(".hidden/secret.txt", b"secret");
    env.touch("visible.txt", b"visible");

    let excluding = create_test_server(&env, false);
    assert_eq!(file_members(&download_all(&excluding).await), vec!["visible.txt"]);

    let including = create_test_server(&env, true);
    assert_eq!(
        file_members(&download_all(&including).await),
        vec![".hidden/secret.txt", "visible.txt"]
    );

    let listing = including.get("/files").await;
    assert_eq!(string_array(&listing.json()), vec!["visible.txt"]);
}

#[tokio::test]
async fn test_download_all_failure_is_server_error() {
    let env = TestEnv::new();
    let server = create_test_server(&env, false);
    fs::remove_dir_all(&env.uploads).unwrap();

    let response = server.get("/download-all").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(env.exports_empty());

    // The server keeps serving after a failed export.
    fs::create_dir_all(&env.uploads).unwrap();
    server.get("/files").await.assert_status_ok();
}

#[tokio::test]
async fn test_concurrent_exports() {
    let env = TestEnv::new();
    for i in 0..20 {
        env.touch(&format!("dir{}/file{}.txt", i % 4, i), b"payload");
    }
    let server = create_test_server(&env, false);

    let (first, second) = tokio::join!(download_all(&server), download_all(&server));

    assert_eq!(file_members(&first).len(), 20);
    assert_eq!(file_members(&first), file_members(&second));
    assert!(env.exports_empty());
}

// ============================================================================
// Upload Round Trip
// ============================================================================

#[tokio::test]
async fn test_uploaded_file_appears_everywhere() {
    let env = TestEnv::new();
    let server = create_test_server(&env, false);

    server
        .post("/upload")
        .multipart(upload_form("plan.txt", b"the plan", Some("projects/2024")))
        .await
        .assert_status_ok();

    let listing = server.get("/files").await;
    assert_eq!(
        string_array(&listing.json()),
        vec!["projects/2024/plan.txt"]
    );

    let static_response = server.get("/uploads/projects/2024/plan.txt").await;
    static_response.assert_status_ok();
    assert_eq!(static_response.as_bytes().as_ref(), b"the plan");

    let bytes = download_all(&server).await;
    assert_eq!(file_members(&bytes), vec!["projects/2024/plan.txt"]);
    assert!(Path::new(&env.uploads).join("projects/2024/plan.txt").is_file());
}
