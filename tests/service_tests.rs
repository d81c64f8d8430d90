//! Integration tests for the auth, user and drive endpoint wrappers.

use std::sync::Arc;

use drivium_client::api::types::{
    FileEditRequest, FileStatus, FileUploadRequest, FolderCreateRequest, FolderEditRequest,
    LoginRequest, RegisterRequest,
};
use drivium_client::api::{auth, drive, users, ApiClient, ApiError, MemoryTokenStore, TokenStore};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn user_json() -> serde_json::Value {
    json!({
        "id": 1,
        "username": "a",
        "email": "a@example.com",
        "is_active": true,
        "created_at": "2024-05-01T12:00:00"
    })
}

fn credentials() -> LoginRequest {
    LoginRequest {
        username: "a".into(),
        password: "b".into(),
    }
}

// ── Auth & users ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_stores_token_used_by_later_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"username": "a", "password": "b"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "tok", "token_type": "bearer"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let api = ApiClient::new(&server.uri(), store.clone());

    let resp = auth::login(&api, &credentials()).await.unwrap();
    assert_eq!(resp.access_token.as_deref(), Some("tok"));
    assert_eq!(store.get().unwrap().as_deref(), Some("tok"));

    let me = users::get_current_user(&api).await.unwrap();
    assert_eq!(me.username, "a");
    assert!(me.is_active);
}

#[tokio::test]
async fn test_login_never_sends_existing_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token_type": "bearer"})))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_token("old"));
    let api = ApiClient::new(&server.uri(), store.clone());

    let resp = auth::login(&api, &credentials()).await.unwrap();
    assert!(resp.access_token.is_none());
    // No token in the response leaves the stored one alone
    assert_eq!(store.get().unwrap().as_deref(), Some("old"));

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_login_with_empty_token_keeps_stored_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": ""})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_token("old"));
    let api = ApiClient::new(&server.uri(), store.clone());

    let resp = auth::login(&api, &credentials()).await.unwrap();
    assert_eq!(resp.token(), None);
    assert_eq!(store.get().unwrap().as_deref(), Some("old"));

    users::get_current_user(&api).await.unwrap();
}

#[tokio::test]
async fn test_login_without_json_body_succeeds_without_storing() {
    let server = MockServer::start().await;
    Mock::given(path("/auth/login"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_token("old"));
    let api = ApiClient::new(&server.uri(), store.clone());

    let resp = auth::login(&api, &credentials()).await.unwrap();
    assert!(resp.access_token.is_none());
    assert_eq!(store.get().unwrap().as_deref(), Some("old"));
}

#[tokio::test]
async fn test_failed_login_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Invalid username or password"})),
        )
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_token("old"));
    let api = ApiClient::new(&server.uri(), store.clone());

    let err = auth::login(&api, &credentials()).await.unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 401, .. }));
    assert_eq!(store.get().unwrap(), None);
}

#[tokio::test]
async fn test_logout_clears_token() {
    let store = Arc::new(MemoryTokenStore::with_token("tok"));
    let api = ApiClient::new("http://127.0.0.1:1", store.clone());

    auth::logout(&api).unwrap();
    assert_eq!(store.get().unwrap(), None);
}

#[tokio::test]
async fn test_register_user_is_unauthenticated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/register"))
        .and(body_json(
            json!({"username": "a", "email": "a@example.com", "password": "secret123"}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), Arc::new(MemoryTokenStore::with_token("tok")));
    let user = users::register_user(
        &api,
        &RegisterRequest {
            username: "a".into(),
            email: "a@example.com".into(),
            password: "secret123".into(),
        },
    )
    .await
    .unwrap();
    assert_eq!(user.id, 1);

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

// ── Files ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_edit_file_sends_only_supplied_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/drive/files/5"))
        .and(body_json(json!({"new_name": "x"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5, "name": "x", "size": 10, "status": "UPLOADED",
            "uploaded_at": "2024-05-01T12:00:00", "folder_id": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), Arc::new(MemoryTokenStore::with_token("tok")));
    let edit = FileEditRequest {
        new_name: Some("x".into()),
        ..Default::default()
    };
    let file = drive::edit_file(&api, 5, &edit).await.unwrap();
    assert_eq!(file.name, "x");
    assert_eq!(file.status, FileStatus::Uploaded);

    let requests = server.received_requests().await.unwrap();
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(sent.get("new_folder_id").is_none());
}

#[tokio::test]
async fn test_request_file_upload_sends_null_folder() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/drive/files"))
        .and(body_json(json!({
            "name": "a.txt", "size": 3, "mime_type": "text/plain", "folder_id": null
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"file_id": 11, "presigned_url": "http://s3/put"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), Arc::new(MemoryTokenStore::with_token("tok")));
    let target = drive::request_file_upload(
        &api,
        &FileUploadRequest {
            name: "a.txt".into(),
            size: 3,
            mime_type: "text/plain".into(),
            folder_id: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(target.file_id, 11);
    assert_eq!(target.presigned_url, "http://s3/put");
}

#[tokio::test]
async fn test_file_endpoints_use_expected_routes() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/drive/files/7/upload-confirm"))
        .and(body_json(json!({"success": true})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "File upload confirmed."})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/files/7/download-url"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": "http://s3/get", "expires_at": "2024-05-01T12:15:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/drive/files/7"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "File deleted successfully."})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), Arc::new(MemoryTokenStore::with_token("tok")));
    drive::confirm_file_upload(&api, 7, true).await.unwrap();
    let link = drive::request_file_download_url(&api, 7).await.unwrap();
    assert_eq!(link.url, "http://s3/get");
    let deleted = drive::delete_file(&api, 7).await.unwrap();
    assert_eq!(deleted.message, "File deleted successfully.");
}

// ── Folders ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_folder_endpoints_use_expected_routes() {
    let server = MockServer::start().await;
    let listing = json!({"folder_id": null, "path": [], "folders": [], "files": []});

    Mock::given(method("POST"))
        .and(path("/drive/folders"))
        .and(body_json(json!({"name": "docs", "parent_folder_id": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 3, "name": "docs"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/drive/folders/3"))
        .and(body_json(json!({"new_parent_folder_id": null})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3, "name": "docs", "parent_folder_id": null, "created_at": "2024-05-01T12:00:00"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/folders/contents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing.clone()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/folders/contents/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "folder_id": 3,
            "path": [{"id": 3, "name": "docs"}],
            "folders": [],
            "files": []
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/drive/folders/3"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "Folder deleted successfully."})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), Arc::new(MemoryTokenStore::with_token("tok")));

    let created = drive::create_folder(
        &api,
        &FolderCreateRequest {
            name: "docs".into(),
            parent_folder_id: Some(2),
        },
    )
    .await
    .unwrap();
    assert_eq!(created.id, 3);

    let moved = drive::edit_folder(
        &api,
        3,
        &FolderEditRequest {
            new_parent_folder_id: Some(None),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(moved.parent_folder_id, None);

    let root = drive::list_root_folder_contents(&api).await.unwrap();
    assert!(root.folder_id.is_none());

    let docs = drive::list_folder_contents(&api, 3).await.unwrap();
    assert_eq!(docs.path[0].name, "docs");

    drive::delete_folder(&api, 3).await.unwrap();
}

// ── Presigned transfers ──────────────────────────────────────────────────

#[tokio::test]
async fn test_presigned_upload_failure_is_structured_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/bucket/key"))
        .respond_with(ResponseTemplate::new(403).set_body_string("AccessDenied"))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_token("tok"));
    let api = ApiClient::new("http://127.0.0.1:1", store.clone());
    let url = format!("{}/bucket/key", server.uri());

    let err = drive::upload_to_presigned_url(&api, &url, b"data".to_vec(), None)
        .await
        .unwrap_err();

    assert_eq!(err.status(), 403);
    assert_eq!(err.url(), Some(url.as_str()));
    assert_eq!(err.to_string(), "Upload failed: 403 AccessDenied");
    // Storage rejections never touch the session token
    assert_eq!(store.get().unwrap().as_deref(), Some("tok"));

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
    assert!(requests[0].headers.get("content-type").is_none());
}

#[tokio::test]
async fn test_presigned_upload_sends_content_type_when_given() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/bucket/key"))
        .and(header("content-type", "image/png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new("http://127.0.0.1:1", Arc::new(MemoryTokenStore::new()));
    let url = format!("{}/bucket/key", server.uri());
    drive::upload_to_presigned_url(&api, &url, vec![0x89, 0x50], Some("image/png"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_download_from_presigned_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bucket/key"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
        .mount(&server)
        .await;

    let api = ApiClient::new("http://127.0.0.1:1", Arc::new(MemoryTokenStore::new()));
    let bytes = drive::download_from_presigned_url(&api, &format!("{}/bucket/key", server.uri()))
        .await
        .unwrap();
    assert_eq!(bytes, vec![1, 2, 3]);
}

// ── Upload flow ──────────────────────────────────────────────────────────

fn upload_file() -> drive::UploadFile {
    drive::UploadFile {
        name: "a.txt".into(),
        data: b"abc".to_vec(),
        mime_type: "text/plain".into(),
        folder_id: Some(4),
    }
}

#[tokio::test]
async fn test_upload_file_reserves_puts_and_confirms() {
    let server = MockServer::start().await;
    let presigned = format!("{}/bucket/11", server.uri());

    Mock::given(method("POST"))
        .and(path("/drive/files"))
        .and(body_json(json!({
            "name": "a.txt", "size": 3, "mime_type": "text/plain", "folder_id": 4
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"file_id": 11, "presigned_url": presigned})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/bucket/11"))
        .and(header("content-type", "text/plain"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/drive/files/11/upload-confirm"))
        .and(body_json(json!({"success": true})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "File upload confirmed."})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), Arc::new(MemoryTokenStore::with_token("tok")));
    let target = drive::upload_file(&api, upload_file()).await.unwrap();
    assert_eq!(target.file_id, 11);

    let requests = server.received_requests().await.unwrap();
    let put = requests.iter().find(|r| r.method.as_str() == "PUT").unwrap();
    assert_eq!(put.body, b"abc");
    assert!(put.headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_upload_file_reports_failed_transfer() {
    let server = MockServer::start().await;
    let presigned = format!("{}/bucket/12", server.uri());

    Mock::given(method("POST"))
        .and(path("/drive/files"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"file_id": 12, "presigned_url": presigned})),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/bucket/12"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/drive/files/12/upload-confirm"))
        .and(body_json(json!({"success": false})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "File upload confirmed."})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), Arc::new(MemoryTokenStore::with_token("tok")));
    let err = drive::upload_file(&api, upload_file()).await.unwrap_err();
    assert_eq!(err.status(), 500);
    assert_eq!(err.to_string(), "Upload failed: 500 boom");
}
