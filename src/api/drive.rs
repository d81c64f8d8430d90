//! Drive endpoints: file and folder CRUD plus presigned-URL transfers.
//!
//! Uploads are a three-step protocol: POST /drive/files reserves a file
//! record and returns a presigned URL, the bytes are PUT straight to storage,
//! then PATCH /drive/files/{id}/upload-confirm reports the outcome. A
//! `success: false` confirmation makes the backend drop the pending record.

use super::client::{ApiClient, RequestOptions};
use super::error::ApiError;
use super::types::{
    FileDownloadResponse, FileEditRequest, FileResponse, FileUploadRequest, FileUploadResponse,
    FolderContentResponse, FolderCreateRequest, FolderCreateResponse, FolderEditRequest,
    FolderResponse, MessageResponse, UploadConfirmRequest,
};

// ── Files ────────────────────────────────────────────────────────────────

/// Reserve a file record and obtain a presigned upload URL.
///
/// POST /drive/files
pub async fn request_file_upload(
    client: &ApiClient,
    request: &FileUploadRequest,
) -> Result<FileUploadResponse, ApiError> {
    client
        .request_json("/drive/files", RequestOptions::new().method("POST").json(request))
        .await
}

/// PATCH /drive/files/{id}/upload-confirm
pub async fn confirm_file_upload(
    client: &ApiClient,
    file_id: i64,
    success: bool,
) -> Result<MessageResponse, ApiError> {
    client
        .request_json(
            &format!("/drive/files/{}/upload-confirm", file_id),
            RequestOptions::new()
                .method("PATCH")
                .json(&UploadConfirmRequest { success }),
        )
        .await
}

/// GET /drive/files/{id}/download-url
pub async fn request_file_download_url(
    client: &ApiClient,
    file_id: i64,
) -> Result<FileDownloadResponse, ApiError> {
    client
        .request_json(
            &format!("/drive/files/{}/download-url", file_id),
            RequestOptions::new(),
        )
        .await
}

/// DELETE /drive/files/{id}
pub async fn delete_file(client: &ApiClient, file_id: i64) -> Result<MessageResponse, ApiError> {
    client
        .request_json(
            &format!("/drive/files/{}", file_id),
            RequestOptions::new().method("DELETE"),
        )
        .await
}

/// Rename and/or move a file. Only the fields set on `edit` are sent.
///
/// PATCH /drive/files/{id}
pub async fn edit_file(
    client: &ApiClient,
    file_id: i64,
    edit: &FileEditRequest,
) -> Result<FileResponse, ApiError> {
    client
        .request_json(
            &format!("/drive/files/{}", file_id),
            RequestOptions::new().method("PATCH").json(edit),
        )
        .await
}

// ── Folders ──────────────────────────────────────────────────────────────

/// POST /drive/folders
pub async fn create_folder(
    client: &ApiClient,
    request: &FolderCreateRequest,
) -> Result<FolderCreateResponse, ApiError> {
    client
        .request_json("/drive/folders", RequestOptions::new().method("POST").json(request))
        .await
}

/// DELETE /drive/folders/{id}
pub async fn delete_folder(
    client: &ApiClient,
    folder_id: i64,
) -> Result<MessageResponse, ApiError> {
    client
        .request_json(
            &format!("/drive/folders/{}", folder_id),
            RequestOptions::new().method("DELETE"),
        )
        .await
}

/// PATCH /drive/folders/{id}
pub async fn edit_folder(
    client: &ApiClient,
    folder_id: i64,
    edit: &FolderEditRequest,
) -> Result<FolderResponse, ApiError> {
    client
        .request_json(
            &format!("/drive/folders/{}", folder_id),
            RequestOptions::new().method("PATCH").json(edit),
        )
        .await
}

/// GET /drive/folders/contents
pub async fn list_root_folder_contents(
    client: &ApiClient,
) -> Result<FolderContentResponse, ApiError> {
    client
        .request_json("/drive/folders/contents", RequestOptions::new())
        .await
}

/// GET /drive/folders/contents/{id}
pub async fn list_folder_contents(
    client: &ApiClient,
    folder_id: i64,
) -> Result<FolderContentResponse, ApiError> {
    client
        .request_json(
            &format!("/drive/folders/contents/{}", folder_id),
            RequestOptions::new(),
        )
        .await
}

// ── Presigned transfers ──────────────────────────────────────────────────

/// PUT file content directly to a presigned storage URL.
///
/// No bearer token is sent. A non-2xx status fails with `ApiError::Http`
/// whose message is `Upload failed: <status> <response text>`.
pub async fn upload_to_presigned_url(
    client: &ApiClient,
    url: &str,
    data: Vec<u8>,
    content_type: Option<&str>,
) -> Result<(), ApiError> {
    client.put_bytes(url, data, content_type).await
}

/// GET file content from a presigned download URL.
pub async fn download_from_presigned_url(
    client: &ApiClient,
    url: &str,
) -> Result<Vec<u8>, ApiError> {
    client.get_bytes(url).await
}

/// A local file to push through the upload protocol.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub data: Vec<u8>,
    pub mime_type: String,
    pub folder_id: Option<i64>,
}

/// Run the full upload: reserve, PUT to storage, confirm.
///
/// If the PUT fails the reservation is confirmed with `success: false`
/// (best-effort) and the PUT error is returned.
pub async fn upload_file(
    client: &ApiClient,
    file: UploadFile,
) -> Result<FileUploadResponse, ApiError> {
    let request = FileUploadRequest {
        name: file.name.clone(),
        size: file.data.len() as u64,
        mime_type: file.mime_type.clone(),
        folder_id: file.folder_id,
    };
    let target = request_file_upload(client, &request).await?;
    log::info!(
        "Uploading {} ({} bytes) as file {}",
        file.name,
        request.size,
        target.file_id
    );

    if let Err(e) =
        upload_to_presigned_url(client, &target.presigned_url, file.data, Some(file.mime_type.as_str()))
            .await
    {
        log::warn!("Upload of file {} failed: {}", target.file_id, e);
        if let Err(confirm_err) = confirm_file_upload(client, target.file_id, false).await {
            log::warn!(
                "Failed to report upload failure for file {}: {}",
                target.file_id,
                confirm_err
            );
        }
        return Err(e);
    }

    confirm_file_upload(client, target.file_id, true).await?;
    log::info!("Upload of file {} confirmed", target.file_id);
    Ok(target)
}
