use crate::error::AppError;
use crate::models::photo_types::PhotoPreview;
use crate::services::photo_service;
use std::path::Path;

/// Oriented preview of the picked photo for the image area of the screen.
#[tauri::command]
pub fn load_photo(path: String) -> Result<PhotoPreview, AppError> {
    let img_path = Path::new(&path);
    if !img_path.exists() {
        return Err("File not found".into());
    }
    photo_service::load_preview(img_path)
}
