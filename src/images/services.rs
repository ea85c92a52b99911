use std::collections::HashMap;

use anyhow::Context;
use axum::extract::Multipart;
use bytes::Bytes;
use uuid::Uuid;

use crate::error::{AppError, AppResult, FieldErrors};
use crate::state::AppState;

pub const PRESIGN_TTL_SECS: u64 = 30 * 60;

pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

/// Text fields plus the (optional) uploaded file of a multipart form.
#[derive(Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub file: Option<UploadItem>,
}

impl MultipartForm {
    pub fn text(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }
}

/// Reads every part; `file_field` names the one carrying the upload.
/// Empty file parts (a form submitted without choosing a file) are ignored.
pub async fn read_multipart(mut mp: Multipart, file_field: &'static str) -> AppResult<MultipartForm> {
    let mut form = MultipartForm::default();
    while let Some(field) = mp.next_field().await.map_err(|e| {
        AppError::Validation(FieldErrors::single("form", format!("malformed form data: {e}")))
    })? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == file_field {
            let content_type = field
                .content_type()
                .map(str::to_string)
                .unwrap_or_else(|| "application/octet-stream".into());
            let body = field.bytes().await.map_err(|e| {
                AppError::Validation(FieldErrors::single(file_field, e.to_string()))
            })?;
            if !body.is_empty() {
                form.file = Some(UploadItem { body, content_type });
            }
        } else {
            let value = field.text().await.map_err(|e| {
                AppError::Validation(FieldErrors::single("form", format!("malformed form data: {e}")))
            })?;
            form.fields.insert(name, value);
        }
    }
    Ok(form)
}

/// Rejects anything that is not one of the supported image types.
pub fn check_image(item: &UploadItem, field: &'static str) -> AppResult<()> {
    if ext_from_mime(&item.content_type).is_none() {
        return Err(AppError::Validation(FieldErrors::single(
            field,
            "Upload a JPEG, PNG, WEBP or HEIC image.",
        )));
    }
    Ok(())
}

/// Stores an image under `prefix/` and returns its object key.
pub async fn upload_image(st: &AppState, prefix: &str, img: UploadItem) -> anyhow::Result<String> {
    let ext = ext_from_mime(&img.content_type).unwrap_or("bin");
    let key = format!("{}/{}.{}", prefix, Uuid::new_v4(), ext);
    st.storage
        .put_object(&key, img.body, &img.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;
    Ok(key)
}

/// Best-effort removal; a dangling object is not worth failing the request for.
pub async fn discard_image(st: &AppState, key: &str) {
    if let Err(e) = st.storage.delete_object(key).await {
        tracing::warn!(error = ?e, key, "failed to delete stored image");
    }
}

/// Drops a just-uploaded object when the row meant to reference it was not written.
pub async fn discard_on_err<T, E>(st: &AppState, key: Option<&str>, res: Result<T, E>) -> Result<T, E> {
    if res.is_err() {
        if let Some(key) = key {
            discard_image(st, key).await;
        }
    }
    res
}

pub async fn presign_optional(st: &AppState, key: Option<&str>) -> anyhow::Result<Option<String>> {
    match key {
        Some(k) => Ok(Some(
            st.storage
                .presign_get(k, PRESIGN_TTL_SECS)
                .await
                .with_context(|| format!("presign url for {}", k))?,
        )),
        None => Ok(None),
    }
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}
