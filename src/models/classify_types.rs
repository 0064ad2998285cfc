use serde::Serialize;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

/// Terminal outcome of a single classification request. Replaces the loosely
/// typed "maybe a results object, maybe castable" shape with a tagged variant.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifyOutcome {
    Recognized { prediction: Prediction },
    NothingRecognized,
    Unavailable,
    Failed { message: String },
}

impl ClassifyOutcome {
    /// Collapse a ranked result set into an outcome. The full set is discarded
    /// once the top entry has been picked; on exactly equal confidences the
    /// first entry in capability order wins.
    pub fn from_predictions(predictions: Vec<Prediction>) -> Self {
        match predictions
            .into_iter()
            .reduce(|best, p| if p.confidence > best.confidence { p } else { best })
        {
            Some(top) => ClassifyOutcome::Recognized { prediction: top },
            None => ClassifyOutcome::NothingRecognized,
        }
    }

    pub fn status_text(&self) -> String {
        match self {
            ClassifyOutcome::Recognized { prediction } => {
                format!("Classification: {}", prediction.label)
            }
            ClassifyOutcome::NothingRecognized => "Nothing recognized.".to_string(),
            ClassifyOutcome::Unavailable => "Unable to classify image.".to_string(),
            ClassifyOutcome::Failed { message } => {
                format!("Classification failed: {}", message)
            }
        }
    }
}

/// What the screen applies when a classification request completes. The status
/// string is derived from the outcome in exactly one place so the webview never
/// composes user-facing text itself.
#[derive(Debug, Serialize, Clone)]
pub struct ScreenUpdate {
    pub status: String,
    pub outcome: ClassifyOutcome,
}

impl ScreenUpdate {
    pub fn from_outcome(outcome: ClassifyOutcome) -> Self {
        ScreenUpdate {
            status: outcome.status_text(),
            outcome,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct ModelStatus {
    pub ready: bool,
    pub labels: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pred(label: &str, confidence: f32) -> Prediction {
        Prediction {
            label: label.to_string(),
            confidence,
        }
    }

    #[test]
    fn top_prediction_wins() {
        let outcome = ClassifyOutcome::from_predictions(vec![pred("cat", 0.9), pred("dog", 0.4)]);
        assert_eq!(outcome.status_text(), "Classification: cat");
    }

    #[test]
    fn max_is_picked_regardless_of_order() {
        let outcome = ClassifyOutcome::from_predictions(vec![
            pred("dog", 0.4),
            pred("cat", 0.9),
            pred("fox", 0.1),
        ]);
        match outcome {
            ClassifyOutcome::Recognized { prediction } => {
                assert_eq!(prediction.label, "cat");
                assert_eq!(prediction.confidence, 0.9);
            }
            other => panic!("expected Recognized, got {:?}", other),
        }
    }

    #[test]
    fn equal_confidence_keeps_first_encountered() {
        let outcome = ClassifyOutcome::from_predictions(vec![pred("cat", 0.5), pred("dog", 0.5)]);
        assert_eq!(outcome.status_text(), "Classification: cat");
    }

    #[test]
    fn empty_set_is_nothing_recognized() {
        let outcome = ClassifyOutcome::from_predictions(Vec::new());
        assert_eq!(outcome, ClassifyOutcome::NothingRecognized);
        assert_eq!(outcome.status_text(), "Nothing recognized.");
    }

    #[test]
    fn missing_output_text() {
        assert_eq!(
            ClassifyOutcome::Unavailable.status_text(),
            "Unable to classify image."
        );
    }

    #[test]
    fn failure_text_carries_message_verbatim() {
        let outcome = ClassifyOutcome::Failed {
            message: "tensor shape mismatch".to_string(),
        };
        assert_eq!(
            outcome.status_text(),
            "Classification failed: tensor shape mismatch"
        );
    }

    #[test]
    fn screen_update_status_matches_outcome() {
        let update =
            ScreenUpdate::from_outcome(ClassifyOutcome::from_predictions(vec![pred("cat", 0.9)]));
        assert_eq!(update.status, "Classification: cat");
    }
}
