use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use ndarray::Array4;
use tch::{CModule, Device, Kind, Tensor};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("weight read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("torch error: {0}")]
    Torch(#[from] tch::TchError),
    #[error("no weight shards found in {0}")]
    EmptyShardDir(PathBuf),
    #[error("input shape {got:?} does not match expected (1, {edge}, {edge}, 3)")]
    ShapeMismatch { got: Vec<usize>, edge: u32 },
}

/// The seam between the pipeline and a loaded network. Implementations take
/// a batched NHWC float tensor and hand back the flattened output values,
/// copied out of the runtime so any accelerator memory for the pass is
/// released when the call returns.
pub trait ImageModel: Send + Sync {
    fn forward(&self, input: &Array4<f32>) -> Result<Vec<f32>, ModelError>;
    fn input_edge(&self) -> u32;
}

/// A TorchScript module loaded once and held for the process lifetime.
pub struct TorchModel {
    module: Arc<Mutex<CModule>>,
    device: Device,
    edge: u32,
}

impl TorchModel {
    pub fn load(path: &Path, edge: u32) -> Result<Self, ModelError> {
        let device = Device::cuda_if_available();
        let blob = read_weight_blob(path)?;
        let module = CModule::load_data_on_device(&mut Cursor::new(blob), device)?;
        log::info!("loaded model from {} ({}x{} input)", path.display(), edge, edge);
        Ok(Self {
            module: Arc::new(Mutex::new(module)),
            device,
            edge,
        })
    }
}

impl ImageModel for TorchModel {
    fn forward(&self, input: &Array4<f32>) -> Result<Vec<f32>, ModelError> {
        let (batch, height, width, channels) = input.dim();
        if batch != 1
            || channels != 3
            || height != self.edge as usize
            || width != self.edge as usize
        {
            return Err(ModelError::ShapeMismatch {
                got: vec![batch, height, width, channels],
                edge: self.edge,
            });
        }

        let flat: Vec<f32> = input.iter().copied().collect();
        let tensor = Tensor::from_slice(&flat)
            .view([1, height as i64, width as i64, 3])
            .f_to_device(self.device)?;

        let output = self.module.lock().unwrap().forward_ts(&[tensor])?;
        let output_flat = output.to_kind(Kind::Float).view([-1]);
        let num_elements = output_flat.size()[0] as usize;
        let mut values = vec![0.0f32; num_elements];
        output_flat.copy_data(&mut values, num_elements);
        Ok(values)
    }

    fn input_edge(&self) -> u32 {
        self.edge
    }
}

/// Reads model weights as one blob. A directory is treated as a set of
/// ordered shards and concatenated; shard splitting is a packaging artifact
/// with no semantic content.
fn read_weight_blob(path: &Path) -> Result<Vec<u8>, ModelError> {
    if !path.is_dir() {
        return Ok(fs::read(path)?);
    }
    let mut shards: Vec<PathBuf> = fs::read_dir(path)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|p| p.is_file())
        .collect();
    if shards.is_empty() {
        return Err(ModelError::EmptyShardDir(path.to_path_buf()));
    }
    shards.sort();
    let mut blob = Vec::new();
    for shard in &shards {
        blob.extend(fs::read(shard)?);
    }
    Ok(blob)
}
