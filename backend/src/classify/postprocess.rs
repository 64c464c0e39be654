//! Turns raw model outputs into the probabilities shown to the user.

use thiserror::Error;

use shared::classes::LesionClass;

/// Number of lesion classes in the display list.
pub const DISPLAY_CLASSES: usize = LesionClass::ALL.len();

#[derive(Debug, Error)]
pub enum PostprocessError {
    #[error("model returned {got} values but the index map reads up to index {max_index}")]
    TruncatedOutput { got: usize, max_index: usize },
    #[error("class scores sum to non-positive mass {0}")]
    DegenerateOutput(f32),
}

/// Logistic function. Maps any finite logit into (0, 1); zero maps to 0.5.
pub fn sigmoid(logit: f32) -> f32 {
    1.0 / (1.0 + (-logit).exp())
}

/// Reads the raw output vector in display order: display class `i` takes
/// the value at `map[i]`.
pub fn remap(
    raw: &[f32],
    map: &[usize; DISPLAY_CLASSES],
) -> Result<[f32; DISPLAY_CLASSES], PostprocessError> {
    let max_index = map.iter().copied().max().unwrap_or(0);
    if raw.len() <= max_index {
        return Err(PostprocessError::TruncatedOutput {
            got: raw.len(),
            max_index,
        });
    }
    let mut out = [0.0; DISPLAY_CLASSES];
    for (slot, &source) in out.iter_mut().zip(map.iter()) {
        *slot = raw[source];
    }
    Ok(out)
}

/// Linear two-model blend: display class `i` scores
/// `weight_a * a[map_a[i]] + weight_b * b[map_b[i]]`.
pub fn ensemble(
    a: &[f32],
    map_a: &[usize; DISPLAY_CLASSES],
    b: &[f32],
    map_b: &[usize; DISPLAY_CLASSES],
    weight_a: f32,
    weight_b: f32,
) -> Result<[f32; DISPLAY_CLASSES], PostprocessError> {
    let a = remap(a, map_a)?;
    let b = remap(b, map_b)?;
    let mut out = [0.0; DISPLAY_CLASSES];
    for (slot, (va, vb)) in out.iter_mut().zip(a.iter().zip(b.iter())) {
        *slot = weight_a * va + weight_b * vb;
    }
    Ok(out)
}

/// Divides each score by the total so the display classes sum to one.
/// This is a linear renormalization, not a softmax; the exponent-free
/// blend is kept as observed in the trained deployment.
pub fn renormalize(scores: &mut [f32; DISPLAY_CLASSES]) -> Result<(), PostprocessError> {
    let total: f32 = scores.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return Err(PostprocessError::DegenerateOutput(total));
    }
    for score in scores.iter_mut() {
        *score /= total;
    }
    Ok(())
}
