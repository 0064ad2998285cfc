pub mod classifier;
pub mod exif_service;
pub mod photo_service;
