use crate::error::AppError;
use crate::models::classify_types::ClassifyOutcome;
use crate::services::classifier::inference;
use image::DynamicImage;
use log::{debug, info};
use ort::session::Session;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const MODEL_FILE: &str = "mobilenetv3_large.onnx";
pub const CONFIG_FILE: &str = "mobilenetv3_config.json";

const CROP_SIZE: u32 = 224;
const DEFAULT_TOP_K: usize = 5;

/// The classification capability: one ONNX session plus its label table,
/// constructed once at startup. Inference is serialized behind the session
/// mutex; the label table never changes after load.
#[derive(Clone)]
pub struct ClassifierEngine {
    session: Arc<Mutex<Session>>,
    labels: Arc<Vec<String>>,
    crop_size: u32,
}

impl ClassifierEngine {
    pub fn load(model_path: &Path, config_path: &Path) -> Result<Self, AppError> {
        let config_content = std::fs::read_to_string(config_path).map_err(|e| AppError {
            message: format!("Failed to read config file {}: {}", config_path.display(), e),
        })?;
        let labels = parse_labels(&config_content)?;

        let _ = ort::init().with_name("snap-label").commit();

        let session = Session::builder()
            .map_err(|e| AppError {
                message: format!("Failed to create session builder: {}", e),
            })?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
            .map_err(|e| AppError {
                message: format!("Failed to set optimization level: {}", e),
            })?
            .with_intra_threads(4)
            .map_err(|e| AppError {
                message: format!("Failed to set intra threads: {}", e),
            })?
            .with_execution_providers([
                ort::execution_providers::DirectMLExecutionProvider::default().build(),
                ort::execution_providers::CoreMLExecutionProvider::default().build(),
                ort::execution_providers::CUDAExecutionProvider::default().build(),
                ort::execution_providers::CPUExecutionProvider::default().build(),
            ])
            .map_err(|e| AppError {
                message: format!("Failed to register execution providers: {}", e),
            })?
            .commit_from_file(model_path)
            .map_err(|e| AppError {
                message: format!("Failed to load ONNX model: {}", e),
            })?;

        info!(
            "Classifier ready: {} ({} labels)",
            model_path.display(),
            labels.len()
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            labels: Arc::new(labels),
            crop_size: CROP_SIZE,
        })
    }

    /// Classify one orientation-normalized image. All failures collapse into a
    /// terminal outcome; nothing here is retried.
    pub fn classify(&self, img: &DynamicImage) -> ClassifyOutcome {
        let started = std::time::Instant::now();

        let tensor = match inference::image_to_tensor(img, self.crop_size) {
            Ok(t) => t,
            Err(e) => return ClassifyOutcome::Failed { message: e.message },
        };

        let mut session = self.session.lock().unwrap();
        let outcome =
            match inference::run_session(&mut session, tensor, &self.labels, DEFAULT_TOP_K) {
                Ok(Some(predictions)) => ClassifyOutcome::from_predictions(predictions),
                Ok(None) => ClassifyOutcome::Unavailable,
                Err(e) => ClassifyOutcome::Failed { message: e.message },
            };

        debug!("Inference took {:?}", started.elapsed());
        outcome
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }
}

/// Find the directory holding the model and its config among the candidate
/// locations, returning the two file paths.
pub fn find_model_files(candidates: &[PathBuf]) -> Option<(PathBuf, PathBuf)> {
    candidates.iter().find_map(|dir| {
        let model = dir.join(MODEL_FILE);
        let config = dir.join(CONFIG_FILE);
        if model.exists() && config.exists() {
            Some((model, config))
        } else {
            None
        }
    })
}

/// Extract the label table from the model config's `id2label` map, ordered by
/// class index.
fn parse_labels(config_content: &str) -> Result<Vec<String>, AppError> {
    let config: serde_json::Value = serde_json::from_str(config_content).map_err(|e| AppError {
        message: format!("Failed to parse config JSON: {}", e),
    })?;

    let id2label = config["id2label"].as_object().ok_or_else(|| AppError {
        message: "Config missing id2label field".to_string(),
    })?;

    let mut labels: Vec<(usize, String)> = id2label
        .iter()
        .map(|(k, v)| {
            let idx = k.parse::<usize>().unwrap_or(0);
            let label = v.as_str().unwrap_or("unknown").to_string();
            (idx, label)
        })
        .collect();
    labels.sort_by_key(|(idx, _)| *idx);
    Ok(labels.into_iter().map(|(_, label)| label).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_come_back_in_class_index_order() {
        let config = r#"{"id2label": {"2": "cat", "0": "ant", "1": "bee"}}"#;
        let labels = parse_labels(config).unwrap();
        assert_eq!(labels, vec!["ant", "bee", "cat"]);
    }

    #[test]
    fn missing_id2label_is_an_error() {
        let err = parse_labels(r#"{"architectures": ["MobileNetV3"]}"#).unwrap_err();
        assert!(err.message.contains("id2label"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(parse_labels("not json").is_err());
    }

    #[test]
    fn find_model_files_skips_incomplete_dirs() {
        let base = std::env::temp_dir().join(format!("snap-label-test-{}", std::process::id()));
        let incomplete = base.join("incomplete");
        let complete = base.join("complete");
        std::fs::create_dir_all(&incomplete).unwrap();
        std::fs::create_dir_all(&complete).unwrap();

        std::fs::write(incomplete.join(MODEL_FILE), b"onnx").unwrap();
        std::fs::write(complete.join(MODEL_FILE), b"onnx").unwrap();
        std::fs::write(complete.join(CONFIG_FILE), b"{}").unwrap();

        let found = find_model_files(&[incomplete.clone(), complete.clone()]);
        assert_eq!(
            found,
            Some((complete.join(MODEL_FILE), complete.join(CONFIG_FILE)))
        );

        let _ = std::fs::remove_dir_all(&base);
    }

    #[test]
    fn find_model_files_empty_when_absent() {
        assert_eq!(find_model_files(&[PathBuf::from("/nonexistent")]), None);
    }
}
