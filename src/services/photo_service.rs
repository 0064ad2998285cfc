use crate::error::AppError;
use crate::models::photo_types::PhotoPreview;
use crate::services::exif_service;
use base64::Engine;
use image::DynamicImage;
use std::path::Path;

const PREVIEW_MAX: u32 = 1920;

/// Decode a picked photo at full resolution with its EXIF orientation applied,
/// ready for classification.
pub fn open_for_classification(path: &Path) -> Result<DynamicImage, AppError> {
    let orientation = exif_service::get_orientation(path);

    let img = image::ImageReader::open(path)
        .map_err(|e| AppError {
            message: format!("Failed to open image {}: {}", path.display(), e),
        })?
        .decode()
        .map_err(|e| AppError {
            message: format!("Failed to decode image {}: {}", path.display(), e),
        })?;

    Ok(exif_service::apply_orientation(img, orientation))
}

/// Decode a captured frame delivered as encoded bytes. Camera frames rarely
/// carry EXIF, in which case orientation 1 applies.
pub fn decode_capture(bytes: &[u8]) -> Result<DynamicImage, AppError> {
    let orientation = exif_service::get_orientation_from_bytes(bytes);
    let img = image::load_from_memory(bytes).map_err(|e| AppError {
        message: format!("Failed to decode captured image: {}", e),
    })?;
    Ok(exif_service::apply_orientation(img, orientation))
}

/// Oriented, screen-sized preview of a photo as a JPEG data URL.
pub fn load_preview(path: &Path) -> Result<PhotoPreview, AppError> {
    let orientation = exif_service::get_orientation(path);

    let mut img = image::ImageReader::open(path)
        .map_err(|e| AppError {
            message: format!("Failed to open image {}: {}", path.display(), e),
        })?
        .decode()
        .map_err(|e| AppError {
            message: format!("Failed to decode image {}: {}", path.display(), e),
        })?;

    // Resize before rotating: the square bounding box gives the same scale
    // either way, and rotating the downscaled image is far cheaper.
    if img.width() > PREVIEW_MAX || img.height() > PREVIEW_MAX {
        img = img.thumbnail(PREVIEW_MAX, PREVIEW_MAX);
    }

    if orientation != 1 {
        img = exif_service::apply_orientation(img, orientation);
    }

    encode_preview(&img)
}

/// JPEG-encode an already oriented bitmap as a data URL with its dimensions.
pub fn encode_preview(img: &DynamicImage) -> Result<PhotoPreview, AppError> {
    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut buffer = std::io::Cursor::new(Vec::new());
    rgb.write_to(&mut buffer, image::ImageFormat::Jpeg)
        .map_err(|e| AppError {
            message: format!("Failed to encode image: {}", e),
        })?;

    let b64 = base64::engine::general_purpose::STANDARD.encode(buffer.into_inner());
    Ok(PhotoPreview {
        data_url: format!("data:image/jpeg;base64,{}", b64),
        width: rgb.width(),
        height: rgb.height(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn write_temp_png(name: &str, width: u32, height: u32) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("snap-label-photo-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([40, 80, 120])));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn preview_is_a_jpeg_data_url() {
        let path = write_temp_png("small.png", 320, 200);
        let preview = load_preview(&path).unwrap();
        assert!(preview.data_url.starts_with("data:image/jpeg;base64,"));
        assert_eq!((preview.width, preview.height), (320, 200));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn preview_downscales_large_photos() {
        let path = write_temp_png("large.png", 4000, 2000);
        let preview = load_preview(&path).unwrap();
        assert!(preview.width <= PREVIEW_MAX && preview.height <= PREVIEW_MAX);
        // Aspect ratio survives the thumbnail pass
        assert_eq!(preview.width, 2 * preview.height);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_preview(Path::new("/nonexistent/photo.jpg")).unwrap_err();
        assert!(err.message.contains("Failed to open image"));
    }

    #[test]
    fn capture_bytes_round_trip() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 48, Rgb([200, 10, 10])));
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let decoded = decode_capture(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn garbage_capture_bytes_fail_to_decode() {
        let err = decode_capture(&[0u8; 32]).unwrap_err();
        assert!(err.message.contains("Failed to decode captured image"));
    }
}
