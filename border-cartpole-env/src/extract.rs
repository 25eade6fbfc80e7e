//! Observation extractor.
//!
//! Converts a rendered [`Surface`] into a pixel array of shape
//! `(height, width, channels)`, row-major with one `u8` per channel.
//! Colour conversion always happens before down-scaling, and down-scaling
//! averages the pixels of each block (area averaging).
use crate::{render::Surface, CartPoleError};
use image::{imageops::grayscale, ImageBuffer, Rgb, RgbImage};
use ndarray::{s, Array3};
use serde::{Deserialize, Serialize};

/// Pixel array of shape `(height, width, channels)`.
pub type PixelArray = Array3<u8>;

/// Colour format of a pixel observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// Three channels.
    Rgb,

    /// One channel of luma.
    Grayscale,

    /// One channel, each pixel either 0 or 255.
    Binary,
}

impl ColorMode {
    /// The number of channels of arrays in this mode.
    pub fn channels(&self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Grayscale | Self::Binary => 1,
        }
    }
}

/// Resolution reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownScale {
    /// Divides both dimensions by the factor.
    Factor(usize),

    /// Resamples to the given size, which must divide the source size.
    Size {
        /// Target height.
        height: usize,

        /// Target width.
        width: usize,
    },
}

/// Reads the surface and converts it to `color`, then down-scales it if `scale` is given.
///
/// `threshold` is used only for [`ColorMode::Binary`].
pub fn extract(
    surface: &Surface,
    color: ColorMode,
    threshold: u8,
    scale: Option<DownScale>,
) -> Result<PixelArray, CartPoleError> {
    let rgb = image_to_array(surface.image())?;
    let pixels = match color {
        ColorMode::Rgb => rgb,
        ColorMode::Grayscale => to_grayscale(&rgb)?,
        ColorMode::Binary => to_binary(&to_grayscale(&rgb)?, threshold)?,
    };
    match scale {
        Some(scale) => down_scale(&pixels, scale),
        None => Ok(pixels),
    }
}

/// Copies an RGB image into a `(height, width, 3)` array.
pub fn image_to_array(image: &RgbImage) -> Result<PixelArray, CartPoleError> {
    let (w, h) = image.dimensions();
    Array3::from_shape_vec((h as usize, w as usize, 3), image.as_raw().clone())
        .map_err(|e| CartPoleError::RenderResourceError(e.to_string()))
}

/// Reduces a 3-channel array to luma. One-channel arrays are returned unchanged.
pub fn to_grayscale(pixels: &PixelArray) -> Result<PixelArray, CartPoleError> {
    let (h, w, c) = pixels.dim();
    match c {
        1 => Ok(pixels.clone()),
        3 => {
            let raw: Vec<u8> = pixels.iter().copied().collect();
            let image: RgbImage = ImageBuffer::<Rgb<u8>, _>::from_raw(w as u32, h as u32, raw)
                .ok_or_else(|| {
                    CartPoleError::RenderResourceError("inconsistent pixel buffer".to_string())
                })?;
            let gray = grayscale(&image);
            Array3::from_shape_vec((h, w, 1), gray.into_raw())
                .map_err(|e| CartPoleError::RenderResourceError(e.to_string()))
        }
        c => Err(CartPoleError::InvalidConfiguration(format!(
            "expected 1 or 3 channels, got {}",
            c
        ))),
    }
}

/// Maps luma at or above `threshold` to 255 and the rest to 0.
///
/// Three-channel arrays are converted to grayscale first.
pub fn to_binary(pixels: &PixelArray, threshold: u8) -> Result<PixelArray, CartPoleError> {
    let gray = to_grayscale(pixels)?;
    Ok(gray.mapv(|v| if v >= threshold { 255 } else { 0 }))
}

fn block_size(h: usize, w: usize, scale: DownScale) -> Result<(usize, usize), CartPoleError> {
    let invalid = |msg: String| Err(CartPoleError::InvalidScale(msg));

    if h == 0 || w == 0 {
        return invalid(format!("cannot down-scale an empty image of {}x{}", h, w));
    }
    match scale {
        DownScale::Factor(k) => {
            if k == 0 || h % k != 0 || w % k != 0 {
                return invalid(format!("factor {} does not divide {}x{}", k, h, w));
            }
            Ok((k, k))
        }
        DownScale::Size { height, width } => {
            if height == 0 || width == 0 || h % height != 0 || w % width != 0 {
                return invalid(format!(
                    "target {}x{} does not divide {}x{}",
                    height, width, h, w
                ));
            }
            Ok((h / height, w / width))
        }
    }
}

fn block_means(pixels: &PixelArray, scale: DownScale) -> Result<Array3<f64>, CartPoleError> {
    let (h, w, c) = pixels.dim();
    let (bh, bw) = block_size(h, w, scale)?;
    let area = (bh * bw) as f64;

    Ok(Array3::from_shape_fn((h / bh, w / bw, c), |(i, j, k)| {
        pixels
            .slice(s![i * bh..(i + 1) * bh, j * bw..(j + 1) * bw, k])
            .iter()
            .map(|v| *v as f64)
            .sum::<f64>()
            / area
    }))
}

/// Down-scales a pixel array by area averaging, rounding to the nearest integer.
///
/// Fails with [`CartPoleError::InvalidScale`] if the result would be empty
/// or the blocks do not tile the image exactly.
pub fn down_scale(pixels: &PixelArray, scale: DownScale) -> Result<PixelArray, CartPoleError> {
    Ok(block_means(pixels, scale)?.mapv(|v| v.round() as u8))
}

/// Same as [`down_scale`], with values divided by 255.
pub fn down_scale_normalized(
    pixels: &PixelArray,
    scale: DownScale,
) -> Result<Array3<f32>, CartPoleError> {
    Ok(block_means(pixels, scale)?.mapv(|v| (v / 255.0) as f32))
}
