//! Request and response types for the Drivium backend API.
//!
//! Field names match the backend's snake_case JSON, so no renaming is applied.

use serde::{Deserialize, Serialize};

/// Login request body sent to POST /auth/login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response from POST /auth/login.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoginResponse {
    pub access_token: Option<String>,
    pub token_type: Option<String>,
}

impl LoginResponse {
    /// The access token, if present and non-empty.
    pub fn token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Registration body sent to POST /users/register.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// User profile from POST /users/register and GET /users/me.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: String,
}

/// Generic `{"message": ...}` acknowledgement.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Upload state of a stored file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileStatus {
    Pending,
    Uploaded,
}

/// Body sent to POST /drive/files. `folder_id: None` targets the root folder
/// and is sent as `null`.
#[derive(Debug, Clone, Serialize)]
pub struct FileUploadRequest {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub folder_id: Option<i64>,
}

/// Upload target returned by POST /drive/files.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileUploadResponse {
    pub file_id: i64,
    pub presigned_url: String,
}

/// Body sent to PATCH /drive/files/{id}/upload-confirm.
#[derive(Debug, Clone, Serialize)]
pub struct UploadConfirmRequest {
    pub success: bool,
}

/// Presigned download link from GET /drive/files/{id}/download-url.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileDownloadResponse {
    pub url: String,
    pub expires_at: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileResponse {
    pub id: i64,
    pub name: String,
    pub size: i64,
    pub status: FileStatus,
    #[serde(default)]
    pub uploaded_at: Option<String>,
    #[serde(default)]
    pub folder_id: Option<i64>,
}

/// Rename and/or move a file via PATCH /drive/files/{id}.
///
/// Only fields that are `Some` are sent. `new_folder_id: Some(None)` sends
/// an explicit `null`, moving the file to the root folder.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileEditRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_folder_id: Option<Option<i64>>,
}

/// Body sent to POST /drive/folders. `parent_folder_id: None` is sent as `null`.
#[derive(Debug, Clone, Serialize)]
pub struct FolderCreateRequest {
    pub name: String,
    pub parent_folder_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FolderCreateResponse {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FolderResponse {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub parent_folder_id: Option<i64>,
    pub created_at: String,
}

/// Rename and/or move a folder via PATCH /drive/folders/{id}.
///
/// Same presence rules as [`FileEditRequest`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct FolderEditRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_parent_folder_id: Option<Option<i64>>,
}

/// One step of the root-relative path to a folder.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Breadcrumb {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
}

/// Folder listing from GET /drive/folders/contents[/{id}].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FolderContentResponse {
    #[serde(default)]
    pub folder_id: Option<i64>,
    pub path: Vec<Breadcrumb>,
    pub folders: Vec<FolderResponse>,
    pub files: Vec<FileResponse>,
}
