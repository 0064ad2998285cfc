use serde::Serialize;

/// Oriented preview of the photo currently shown on screen, encoded as a JPEG
/// data URL so the webview can drop it straight into an <img> element.
#[derive(Debug, Serialize, Clone)]
pub struct PhotoPreview {
    pub data_url: String,
    pub width: u32,
    pub height: u32,
}
