//! Reading user uploads from disk.
//!
//! Pictures become base64 data URIs; text files are attached verbatim.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hearth_core::error::{HearthError, Result};
use hearth_core::message::FileAttachment;
use tokio::fs;
use tracing::debug;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Infers the MIME type from a filename extension.
fn infer_mime_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}

async fn read_limited(path: &Path) -> Result<Vec<u8>> {
    let metadata = fs::metadata(path)
        .await
        .map_err(|e| HearthError::io(format!("cannot read {}: {}", path.display(), e)))?;
    if metadata.len() > MAX_UPLOAD_BYTES {
        return Err(HearthError::validation(format!(
            "{} is larger than {} MB",
            path.display(),
            MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }
    Ok(fs::read(path).await?)
}

/// Reads a picture and encodes it as a `data:<mime>;base64,...` URI.
///
/// # Errors
///
/// `HearthError::Validation` if the file is not an image or is too large.
pub async fn read_image_upload(path: &Path) -> Result<String> {
    let mime = infer_mime_type(path);
    if !mime.starts_with("image/") {
        return Err(HearthError::validation(format!(
            "{} is not an image ({})",
            path.display(),
            mime
        )));
    }

    let bytes = read_limited(path).await?;
    debug!(path = %path.display(), bytes = bytes.len(), mime = %mime, "Read image upload");
    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}

/// Reads a UTF-8 text file as a message attachment.
///
/// # Errors
///
/// `HearthError::Validation` if the file is too large or not valid UTF-8.
pub async fn read_text_upload(path: &Path) -> Result<FileAttachment> {
    let bytes = read_limited(path).await?;
    let content = String::from_utf8(bytes).map_err(|_| {
        HearthError::validation(format!("{} is not a UTF-8 text file", path.display()))
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(FileAttachment { name, content })
}
