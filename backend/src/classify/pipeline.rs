//! The decode -> preprocess -> forward -> postprocess pipeline.

use chrono::Utc;
use sha2::{Digest, Sha256};
use thiserror::Error;

use shared::classes::LesionClass;
use shared::{AnalysisResponse, ClassProbability};

use super::config::{DEFAULT_ENSEMBLE_WEIGHTS, MemberConfig, ModelManifest, MulticlassHeadConfig};
use super::model::{ImageModel, ModelError, TorchModel};
use super::postprocess::{self, DISPLAY_CLASSES, PostprocessError};
use super::preprocess::{self, PreprocessError};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),
    #[error("inference failed: {0}")]
    Model(#[from] ModelError),
    #[error("postprocessing failed: {0}")]
    Postprocess(#[from] PostprocessError),
    #[error("binary model returned an empty output")]
    EmptyBinaryOutput,
    #[error("ensemble mode needs exactly two members, found {0}")]
    EnsembleMembers(usize),
}

struct Head {
    model: Box<dyn ImageModel>,
    normalize: bool,
}

impl Head {
    fn run(&self, image: &image::RgbImage) -> Result<Vec<f32>, AnalysisError> {
        let tensor = preprocess::to_tensor(image, self.model.input_edge(), self.normalize);
        Ok(self.model.forward(&tensor)?)
    }
}

struct Member {
    head: Head,
    index_map: [usize; DISPLAY_CLASSES],
    weight: f32,
}

enum MulticlassHead {
    Single(Member),
    Ensemble(Member, Member),
}

/// Both classifier heads, loaded once at startup and immutable thereafter.
pub struct Analyzer {
    binary: Head,
    multiclass: MulticlassHead,
}

impl Analyzer {
    pub fn from_manifest(manifest: &ModelManifest) -> Result<Self, AnalysisError> {
        // Manifests built in code bypass config validation, so the member
        // count is checked here before any weights are read.
        let multiclass = match &manifest.multiclass {
            MulticlassHeadConfig::Single { member } => {
                MulticlassHead::Single(load_member(member, 1.0)?)
            }
            MulticlassHeadConfig::Ensemble { members } => match members.as_slice() {
                [first, second] => MulticlassHead::Ensemble(
                    load_member(first, DEFAULT_ENSEMBLE_WEIGHTS[0])?,
                    load_member(second, DEFAULT_ENSEMBLE_WEIGHTS[1])?,
                ),
                other => return Err(AnalysisError::EnsembleMembers(other.len())),
            },
        };
        let binary = Head {
            model: Box::new(TorchModel::load(
                &manifest.binary.weights,
                manifest.binary.input_edge,
            )?),
            normalize: manifest.binary.normalize,
        };
        Ok(Self { binary, multiclass })
    }

    /// Runs the full pipeline on one compressed image buffer. Sequential,
    /// deterministic for fixed bytes and weights; any step's failure aborts
    /// the whole analysis with no partial result.
    pub fn analyze(&self, bytes: &[u8]) -> Result<AnalysisResponse, AnalysisError> {
        let image_sha256 = hex::encode(Sha256::digest(bytes));
        log::debug!("analyzing image {} ({} bytes)", image_sha256, bytes.len());

        let image = preprocess::decode(bytes)?;

        let binary_out = self.binary.run(&image)?;
        let logit = *binary_out.first().ok_or(AnalysisError::EmptyBinaryOutput)?;
        let malignant_probability = postprocess::sigmoid(logit);

        let scores = match &self.multiclass {
            // The single checkpoint already emits probabilities; they are
            // published remapped but otherwise untouched.
            MulticlassHead::Single(member) => {
                let raw = member.head.run(&image)?;
                postprocess::remap(&raw, &member.index_map)?
            }
            // Only the blended scores get renormalized back to unit mass.
            MulticlassHead::Ensemble(a, b) => {
                let raw_a = a.head.run(&image)?;
                let raw_b = b.head.run(&image)?;
                let mut blended = postprocess::ensemble(
                    &raw_a,
                    &a.index_map,
                    &raw_b,
                    &b.index_map,
                    a.weight,
                    b.weight,
                )?;
                postprocess::renormalize(&mut blended)?;
                blended
            }
        };

        let lesion_probabilities = LesionClass::ALL
            .iter()
            .zip(scores.iter())
            .map(|(&class, &probability)| ClassProbability { class, probability })
            .collect();

        Ok(AnalysisResponse {
            image_sha256,
            malignant_probability,
            lesion_probabilities,
            analyzed_at: Utc::now().to_rfc3339(),
        })
    }
}

fn load_member(config: &MemberConfig, default_weight: f32) -> Result<Member, AnalysisError> {
    Ok(Member {
        head: Head {
            model: Box::new(TorchModel::load(&config.weights, config.input_edge)?),
            normalize: config.normalize,
        },
        index_map: config.display_map(),
        weight: config.weight.unwrap_or(default_weight),
    })
}
