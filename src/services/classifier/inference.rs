use crate::error::AppError;
use crate::models::classify_types::Prediction;
use image::DynamicImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;

const CROP_PCT: f32 = 0.875;

// ImageNet normalization constants
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Turn an orientation-normalized image into the NCHW float tensor the model
/// expects: resize shortest edge to ceil(crop / 0.875), center crop, then
/// per-channel ImageNet normalization.
pub fn image_to_tensor(img: &DynamicImage, crop_size: u32) -> Result<Array4<f32>, AppError> {
    let resize_size = (crop_size as f32 / CROP_PCT).ceil() as u32;
    let (w, h) = (img.width(), img.height());
    let (new_w, new_h) = if w < h {
        (
            resize_size,
            ((h as f32 / w as f32) * resize_size as f32).round() as u32,
        )
    } else {
        (
            ((w as f32 / h as f32) * resize_size as f32).round() as u32,
            resize_size,
        )
    };
    let resized = img.resize_exact(new_w, new_h, image::imageops::FilterType::Triangle);

    let crop_x = (new_w.saturating_sub(crop_size)) / 2;
    let crop_y = (new_h.saturating_sub(crop_size)) / 2;
    let rgb = resized.crop_imm(crop_x, crop_y, crop_size, crop_size).to_rgb8();

    // HWC u8 -> CHW f32 planes
    let hw = (crop_size * crop_size) as usize;
    let mut data = vec![0f32; 3 * hw];
    for (i, pixel) in rgb.pixels().enumerate() {
        for c in 0..3 {
            data[c * hw + i] = (pixel[c] as f32 / 255.0 - MEAN[c]) / STD[c];
        }
    }

    Array4::from_shape_vec((1, 3, crop_size as usize, crop_size as usize), data).map_err(|e| {
        AppError {
            message: format!("Failed to create tensor: {}", e),
        }
    })
}

pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max_logit = logits.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    let exp_sum: f32 = logits.iter().map(|&x| (x - max_logit).exp()).sum();
    logits
        .iter()
        .map(|&x| (x - max_logit).exp() / exp_sum)
        .collect()
}

/// Build the ranked result set: probabilities paired with their labels, sorted
/// by descending confidence and capped at `top_k`.
pub fn rank_predictions(probabilities: &[f32], labels: &[String], top_k: usize) -> Vec<Prediction> {
    let mut indexed: Vec<(usize, f32)> = probabilities.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let top_k = top_k.min(indexed.len());
    indexed[..top_k]
        .iter()
        .map(|&(idx, conf)| {
            let label = labels
                .get(idx)
                .cloned()
                .unwrap_or_else(|| format!("class_{}", idx));
            Prediction {
                label,
                confidence: conf,
            }
        })
        .collect()
}

/// Run one inference pass. `Ok(None)` means the model returned without
/// producing any output tensor at all, which the caller surfaces separately
/// from an inference error.
pub fn run_session(
    session: &mut Session,
    input: Array4<f32>,
    labels: &[String],
    top_k: usize,
) -> Result<Option<Vec<Prediction>>, AppError> {
    let input_name = session.inputs()[0].name().to_string();

    let input_tensor = Value::from_array(input).map_err(|e| AppError {
        message: format!("Failed to create tensor value: {}", e),
    })?;

    let outputs = session
        .run(ort::inputs![input_name.as_str() => input_tensor])
        .map_err(|e| AppError {
            message: format!("Inference failed: {}", e),
        })?;

    let output_value = match outputs.values().next() {
        Some(v) => v,
        None => return Ok(None),
    };

    let (_, logits) = output_value
        .try_extract_tensor::<f32>()
        .map_err(|e| AppError {
            message: format!("Failed to extract output tensor: {}", e),
        })?;

    let probabilities = softmax(logits);
    Ok(Some(rank_predictions(&probabilities, labels, top_k)))
}
