use image::RgbImage;
use image::imageops::FilterType;
use ndarray::Array4;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

/// Decodes a compressed image buffer into an RGB raster.
pub fn decode(bytes: &[u8]) -> Result<RgbImage, PreprocessError> {
    let decoded = image::load_from_memory(bytes)?;
    Ok(decoded.to_rgb8())
}

/// Bilinear-resizes to `edge` x `edge` and lays the pixels out as an
/// NHWC tensor of shape (1, edge, edge, 3). With `normalize` set, byte
/// intensities are mapped into [0, 1]; otherwise they stay in 0..=255.
pub fn to_tensor(image: &RgbImage, edge: u32, normalize: bool) -> Array4<f32> {
    let resized = image::imageops::resize(image, edge, edge, FilterType::Triangle);
    let side = edge as usize;
    let mut tensor = Array4::<f32>::zeros((1, side, side, 3));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for channel in 0..3 {
            let intensity = pixel.0[channel] as f32;
            tensor[[0, y as usize, x as usize, channel]] = if normalize {
                intensity / 255.0
            } else {
                intensity
            };
        }
    }
    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb};
    use std::io::Cursor;

    fn sample_png() -> Vec<u8> {
        let image = RgbImage::from_fn(8, 6, |x, y| Rgb([(x * 30) as u8, (y * 40) as u8, 128]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode(&[0x00, 0x01, 0x02, 0x03]).is_err());
        assert!(decode(&[]).is_err());
    }

    #[test]
    fn tensor_has_batched_nhwc_shape() {
        let image = decode(&sample_png()).unwrap();
        let tensor = to_tensor(&image, 4, false);
        assert_eq!(tensor.dim(), (1, 4, 4, 3));
    }

    #[test]
    fn normalization_maps_into_unit_interval() {
        let image = decode(&sample_png()).unwrap();
        let normalized = to_tensor(&image, 4, true);
        assert!(normalized.iter().all(|&v| (0.0..=1.0).contains(&v)));

        let raw = to_tensor(&image, 4, false);
        assert!(raw.iter().any(|&v| v > 1.0));
        for (n, r) in normalized.iter().zip(raw.iter()) {
            assert!((n * 255.0 - r).abs() < 1e-4);
        }
    }

    #[test]
    fn preprocessing_is_deterministic() {
        let image = decode(&sample_png()).unwrap();
        let first = to_tensor(&image, 32, true);
        let second = to_tensor(&image, 32, true);
        assert_eq!(first, second);
    }

    #[test]
    fn constant_image_survives_resize_unchanged() {
        let image = RgbImage::from_pixel(10, 10, Rgb([200, 100, 50]));
        let tensor = to_tensor(&image, 4, false);
        for row in 0..4 {
            for col in 0..4 {
                assert_eq!(tensor[[0, row, col, 0]], 200.0);
                assert_eq!(tensor[[0, row, col, 1]], 100.0);
                assert_eq!(tensor[[0, row, col, 2]], 50.0);
            }
        }
    }
}
