//! Model manifest loaded at startup.
//!
//! The manifest names the weight files for the binary malignancy head and
//! the multiclass lesion head, together with each model's input size,
//! normalization flag and display-order index map. Paths may point at a
//! single TorchScript file or at a directory of ordered weight shards.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

use super::postprocess::DISPLAY_CLASSES;

/// Raw-output index read for each display class, for the published
/// multiclass checkpoint.
pub const CANONICAL_INDEX_MAP: [usize; DISPLAY_CLASSES] = [4, 1, 5, 0, 2, 6, 3];

/// Blend weights for the two-member ensemble revision.
pub const DEFAULT_ENSEMBLE_WEIGHTS: [f32; 2] = [0.25, 0.75];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to get manifest directory")]
    ManifestDir,
    #[error("manifest read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("manifest parse failed: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("index map must have one entry per display class, found {0}")]
    IndexMapLength(usize),
    #[error("index map entry {index} is out of range for {raw_classes} raw classes")]
    IndexOutOfRange { index: usize, raw_classes: usize },
    #[error("index map contains duplicate entry {0}")]
    DuplicateIndex(usize),
    #[error("ensemble mode needs exactly two members, found {0}")]
    EnsembleArity(usize),
    #[error("ensemble weight {0} is not positive and finite")]
    BadWeight(f32),
    #[error("input edge must be non-zero")]
    ZeroEdge,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    pub binary: BinaryHeadConfig,
    pub multiclass: MulticlassHeadConfig,
}

/// The binary model consumes raw 0..255 intensities at 160x160 by default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinaryHeadConfig {
    pub weights: PathBuf,
    #[serde(default = "default_binary_edge")]
    pub input_edge: u32,
    #[serde(default)]
    pub normalize: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MulticlassHeadConfig {
    Single { member: MemberConfig },
    Ensemble { members: Vec<MemberConfig> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberConfig {
    pub weights: PathBuf,
    #[serde(default = "default_multiclass_edge")]
    pub input_edge: u32,
    #[serde(default = "default_true")]
    pub normalize: bool,
    #[serde(default = "default_index_map")]
    pub index_map: Vec<usize>,
    #[serde(default = "default_raw_classes")]
    pub raw_classes: usize,
    /// Blend weight; only read in ensemble mode.
    #[serde(default)]
    pub weight: Option<f32>,
}

fn default_binary_edge() -> u32 {
    160
}

fn default_multiclass_edge() -> u32 {
    32
}

fn default_true() -> bool {
    true
}

fn default_index_map() -> Vec<usize> {
    CANONICAL_INDEX_MAP.to_vec()
}

fn default_raw_classes() -> usize {
    8
}

impl ModelManifest {
    /// Reads the manifest from `MODEL_MANIFEST`, falling back to
    /// `config/models.yaml` next to the workspace.
    pub fn load() -> Result<Self, ConfigError> {
        let path = match env::var("MODEL_MANIFEST") {
            Ok(path) => PathBuf::from(path),
            Err(_) => {
                let manifest_dir =
                    env::var("CARGO_MANIFEST_DIR").map_err(|_| ConfigError::ManifestDir)?;
                PathBuf::from(format!("{}/../config/models.yaml", manifest_dir))
            }
        };
        let manifest_str = fs::read_to_string(&path)?;
        Self::from_yaml(&manifest_str)
    }

    pub fn from_yaml(source: &str) -> Result<Self, ConfigError> {
        let manifest: ModelManifest = serde_yaml::from_str(source)?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.binary.input_edge == 0 {
            return Err(ConfigError::ZeroEdge);
        }
        match &self.multiclass {
            MulticlassHeadConfig::Single { member } => member.validate(),
            MulticlassHeadConfig::Ensemble { members } => {
                if members.len() != 2 {
                    return Err(ConfigError::EnsembleArity(members.len()));
                }
                for member in members {
                    member.validate()?;
                    if let Some(weight) = member.weight {
                        if !weight.is_finite() || weight <= 0.0 {
                            return Err(ConfigError::BadWeight(weight));
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

impl MemberConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.input_edge == 0 {
            return Err(ConfigError::ZeroEdge);
        }
        if self.index_map.len() != DISPLAY_CLASSES {
            return Err(ConfigError::IndexMapLength(self.index_map.len()));
        }
        let mut seen = vec![false; self.raw_classes];
        for &index in &self.index_map {
            if index >= self.raw_classes {
                return Err(ConfigError::IndexOutOfRange {
                    index,
                    raw_classes: self.raw_classes,
                });
            }
            if seen[index] {
                return Err(ConfigError::DuplicateIndex(index));
            }
            seen[index] = true;
        }
        Ok(())
    }

    /// The index map as the fixed-size array postprocessing works with.
    pub fn display_map(&self) -> [usize; DISPLAY_CLASSES] {
        let mut map = [0; DISPLAY_CLASSES];
        map.copy_from_slice(&self.index_map);
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_mode_with_defaults() {
        let manifest = ModelManifest::from_yaml(
            r#"
binary:
  weights: models/binary.pt
multiclass:
  mode: single
  member:
    weights: models/multiclass.pt
"#,
        )
        .unwrap();
        assert_eq!(manifest.binary.input_edge, 160);
        assert!(!manifest.binary.normalize);
        match &manifest.multiclass {
            MulticlassHeadConfig::Single { member } => {
                assert_eq!(member.input_edge, 32);
                assert!(member.normalize);
                assert_eq!(member.display_map(), CANONICAL_INDEX_MAP);
            }
            other => panic!("unexpected mode: {other:?}"),
        }
    }

    #[test]
    fn parses_ensemble_mode() {
        let manifest = ModelManifest::from_yaml(
            r#"
binary:
  weights: models/binary.pt
multiclass:
  mode: ensemble
  members:
    - weights: models/multiclass_a.pt
      input_edge: 224
      weight: 0.25
    - weights: models/multiclass_b.pt
      input_edge: 224
      weight: 0.75
      index_map: [6, 1, 5, 0, 2, 4, 3]
"#,
        )
        .unwrap();
        match &manifest.multiclass {
            MulticlassHeadConfig::Ensemble { members } => {
                assert_eq!(members.len(), 2);
                assert_eq!(members[0].weight, Some(0.25));
                assert_eq!(members[1].display_map()[0], 6);
            }
            other => panic!("unexpected mode: {other:?}"),
        }
    }

    #[test]
    fn rejects_wrong_map_length() {
        let result = ModelManifest::from_yaml(
            r#"
binary:
  weights: models/binary.pt
multiclass:
  mode: single
  member:
    weights: models/multiclass.pt
    index_map: [0, 1, 2]
"#,
        );
        assert!(matches!(result, Err(ConfigError::IndexMapLength(3))));
    }

    #[test]
    fn rejects_duplicate_map_entries() {
        let result = ModelManifest::from_yaml(
            r#"
binary:
  weights: models/binary.pt
multiclass:
  mode: single
  member:
    weights: models/multiclass.pt
    index_map: [0, 1, 2, 3, 4, 5, 5]
"#,
        );
        assert!(matches!(result, Err(ConfigError::DuplicateIndex(5))));
    }

    #[test]
    fn rejects_out_of_range_index() {
        let result = ModelManifest::from_yaml(
            r#"
binary:
  weights: models/binary.pt
multiclass:
  mode: single
  member:
    weights: models/multiclass.pt
    raw_classes: 7
    index_map: [0, 1, 2, 3, 4, 5, 7]
"#,
        );
        assert!(matches!(
            result,
            Err(ConfigError::IndexOutOfRange { index: 7, raw_classes: 7 })
        ));
    }

    #[test]
    fn rejects_one_member_ensemble() {
        let result = ModelManifest::from_yaml(
            r#"
binary:
  weights: models/binary.pt
multiclass:
  mode: ensemble
  members:
    - weights: models/multiclass_a.pt
"#,
        );
        assert!(matches!(result, Err(ConfigError::EnsembleArity(1))));
    }
}
