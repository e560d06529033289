use rocket::serde::json::Json;
use rocket::fs::TempFile;
use rocket_okapi::openapi;
use std::path::Path;
use tokio::fs;
use uuid::Uuid;
use crate::guards::AuthGuard;
use crate::utils::{ApiResponse, ApiError};

fn extension_from_filename(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
}

fn extension_from_content_type(content_type: &str) -> Option<String> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg".to_string()),
        "image/png" => Some("png".to_string()),
        "image/webp" => Some("webp".to_string()),
        _ => None,
    }
}

fn is_valid_image_extension(ext: &str) -> bool {
    matches!(ext, "jpg" | "jpeg" | "png" | "webp")
}

/// Gig covers, gallery images, and avatars all land here.
#[openapi(tag = "Upload")]
#[post("/upload/image", data = "<file>")]
pub async fn upload_image(
    mut file: TempFile<'_>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let extension = file
        .name()
        .and_then(extension_from_filename)
        .or_else(|| {
            file.content_type()
                .and_then(|ct| extension_from_content_type(&ct.to_string()))
        })
        .ok_or_else(|| ApiError::bad_request("Cannot determine image type"))?;

    if !is_valid_image_extension(&extension) {
        return Err(ApiError::bad_request(
            "Unsupported image type. Use jpg, png, or webp",
        ));
    }

    let upload_dir = "uploads/images";
    fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create directory: {}", e)))?;

    let filename = format!("{}_{}.{}", auth.user_id.to_hex(), Uuid::new_v4(), extension);
    let filepath = format!("{}/{}", upload_dir, filename);

    file.persist_to(&filepath)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to save file: {}", e)))?;

    info!("Image stored at {}", filepath);

    Ok(Json(ApiResponse::success(serde_json::json!({
        "url": format!("/{}", filepath),
        "message": "Image uploaded successfully"
    }))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_detection() {
        assert_eq!(extension_from_filename("cover.PNG").as_deref(), Some("png"));
        assert_eq!(extension_from_filename("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension_from_filename("noext"), None);
        assert_eq!(extension_from_content_type("image/webp").as_deref(), Some("webp"));
        assert_eq!(extension_from_content_type("application/pdf"), None);
    }

    #[test]
    fn image_extension_allowlist() {
        for ok in ["jpg", "jpeg", "png", "webp"] {
            assert!(is_valid_image_extension(ok));
        }
        assert!(!is_valid_image_extension("svg"));
        assert!(!is_valid_image_extension("pdf"));
    }
}
