use crate::error::AppError;
use crate::models::classify_types::{ClassifyOutcome, ModelStatus, ScreenUpdate};
use crate::services::classifier::engine::ClassifierEngine;
use crate::services::photo_service;
use base64::Engine;
use log::{debug, warn};
use std::path::Path;
use tauri::State;

#[tauri::command]
pub fn get_model_status(engine: State<'_, ClassifierEngine>) -> ModelStatus {
    ModelStatus {
        ready: true,
        labels: engine.label_count(),
    }
}

/// Classify a photo picked from the library. Decode and inference run on a
/// blocking thread; the webview keeps rendering while this is in flight. Every
/// failure past this point is folded into the returned status, never an `Err`.
#[tauri::command]
pub async fn classify_photo(
    engine: State<'_, ClassifierEngine>,
    path: String,
) -> Result<ScreenUpdate, AppError> {
    debug!("Classifying {}", path);
    let engine = engine.inner().clone();

    let update = tokio::task::spawn_blocking(move || {
        let outcome = match photo_service::open_for_classification(Path::new(&path)) {
            Ok(img) => engine.classify(&img),
            Err(e) => ClassifyOutcome::Failed { message: e.message },
        };
        ScreenUpdate::from_outcome(outcome)
    })
    .await
    .map_err(|e| AppError {
        message: format!("Task join failed: {}", e),
    })?;

    if let ClassifyOutcome::Failed { message } = &update.outcome {
        warn!("Classification failed: {}", message);
    }
    Ok(update)
}

/// Classify a camera capture delivered by the webview as a data URL.
#[tauri::command]
pub async fn classify_capture(
    engine: State<'_, ClassifierEngine>,
    data_url: String,
) -> Result<ScreenUpdate, AppError> {
    debug!("Classifying capture ({} bytes of data URL)", data_url.len());
    let engine = engine.inner().clone();

    let update = tokio::task::spawn_blocking(move || {
        let outcome = match decode_data_url(&data_url)
            .and_then(|bytes| photo_service::decode_capture(&bytes))
        {
            Ok(img) => engine.classify(&img),
            Err(e) => ClassifyOutcome::Failed { message: e.message },
        };
        ScreenUpdate::from_outcome(outcome)
    })
    .await
    .map_err(|e| AppError {
        message: format!("Task join failed: {}", e),
    })?;

    if let ClassifyOutcome::Failed { message } = &update.outcome {
        warn!("Classification failed: {}", message);
    }
    Ok(update)
}

fn decode_data_url(data: &str) -> Result<Vec<u8>, AppError> {
    let payload = match data.split_once(";base64,") {
        Some((_, p)) => p,
        None => data,
    };
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| AppError {
            message: format!("Failed to decode image data: {}", e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_prefix_is_stripped() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"frame");
        let bytes = decode_data_url(&format!("data:image/jpeg;base64,{}", encoded)).unwrap();
        assert_eq!(bytes, b"frame");
    }

    #[test]
    fn bare_base64_is_accepted() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"frame");
        assert_eq!(decode_data_url(&encoded).unwrap(), b"frame");
    }

    #[test]
    fn invalid_payload_is_an_error() {
        let err = decode_data_url("data:image/png;base64,@@@").unwrap_err();
        assert!(err.message.contains("Failed to decode image data"));
    }
}
