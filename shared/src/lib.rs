pub mod classes;
pub mod session;

use serde::{Deserialize, Serialize};

use crate::classes::LesionClass;

/// One display class together with its renormalized probability.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ClassProbability {
    pub class: LesionClass,
    pub probability: f32,
}

/// Result of running both classifier heads on a single image.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AnalysisResponse {
    pub image_sha256: String,
    pub malignant_probability: f32,
    pub lesion_probabilities: Vec<ClassProbability>,
    pub analyzed_at: String,
}

impl AnalysisResponse {
    /// The display class with the highest probability, if any.
    pub fn top_class(&self) -> Option<&ClassProbability> {
        self.lesion_probabilities
            .iter()
            .max_by(|a, b| a.probability.total_cmp(&b.probability))
    }
}

/// Renders a probability in [0, 1] as a percentage with two decimals.
pub fn format_percent(probability: f32) -> String {
    format!("{:.2}", probability * 100.0)
}
