use image::DynamicImage;
use image::imageops::FilterType;

use super::{EmbedError, EmbeddingProvider};
use crate::analysis::similarity::normalize_l2_in_place;

/// Model identifier for descriptor embeddings.
pub const DESCRIPTOR_MODEL_ID: &str = "descriptor_v1__hsv72__thumb16__l2";

const HUE_BINS: usize = 8;
const SAT_BINS: usize = 3;
const VAL_BINS: usize = 3;
const HISTOGRAM_LEN: usize = HUE_BINS * SAT_BINS * VAL_BINS;
const HISTOGRAM_SIDE: u32 = 64;
const THUMB_SIDE: u32 = 16;
const THUMB_LEN: usize = (THUMB_SIDE * THUMB_SIDE) as usize;

/// Output dimension for descriptor embeddings.
pub const DESCRIPTOR_DIM: usize = HISTOGRAM_LEN + THUMB_LEN;

/// Deterministic colour + layout descriptor.
///
/// The vector is an HSV histogram (8 hue x 3 saturation x 3 value bins over a
/// 64x64 downscale) followed by a mean-centred 16x16 grayscale thumbnail. Each
/// block is L2-normalised before the concatenation is normalised, so colour
/// and layout carry equal weight.
#[derive(Debug, Default, Clone, Copy)]
pub struct DescriptorEmbedder;

impl DescriptorEmbedder {
    pub fn new() -> Self {
        Self
    }
}

impl EmbeddingProvider for DescriptorEmbedder {
    fn model_id(&self) -> &str {
        DESCRIPTOR_MODEL_ID
    }

    fn dim(&self) -> usize {
        DESCRIPTOR_DIM
    }

    fn embed(&self, image: &[u8]) -> Result<Vec<f32>, EmbedError> {
        let decoded = image::load_from_memory(image)
            .map_err(|err| EmbedError::UnreadableImage(err.to_string()))?;
        descriptor_for(&decoded)
    }
}

fn descriptor_for(image: &DynamicImage) -> Result<Vec<f32>, EmbedError> {
    let mut histogram = hsv_histogram(image);
    normalize_l2_in_place(&mut histogram);
    let mut thumb = centred_thumbnail(image);
    // A flat image has no layout signal; its block stays zero.
    normalize_l2_in_place(&mut thumb);

    let mut out = Vec::with_capacity(DESCRIPTOR_DIM);
    out.extend_from_slice(&histogram);
    out.extend_from_slice(&thumb);
    if !normalize_l2_in_place(&mut out) {
        return Err(EmbedError::Unavailable(
            "Descriptor has zero norm".to_string(),
        ));
    }
    Ok(out)
}

fn hsv_histogram(image: &DynamicImage) -> Vec<f32> {
    let rgb = image
        .resize_exact(HISTOGRAM_SIDE, HISTOGRAM_SIDE, FilterType::Triangle)
        .to_rgb8();
    let mut bins = vec![0.0_f32; HISTOGRAM_LEN];
    for pixel in rgb.pixels() {
        let [r, g, b] = pixel.0;
        let (h, s, v) = rgb_to_hsv(r, g, b);
        let h_bin = ((h / 360.0 * HUE_BINS as f32) as usize).min(HUE_BINS - 1);
        let s_bin = ((s * SAT_BINS as f32) as usize).min(SAT_BINS - 1);
        let v_bin = ((v * VAL_BINS as f32) as usize).min(VAL_BINS - 1);
        bins[(h_bin * SAT_BINS + s_bin) * VAL_BINS + v_bin] += 1.0;
    }
    bins
}

fn centred_thumbnail(image: &DynamicImage) -> Vec<f32> {
    let gray = image
        .resize_exact(THUMB_SIDE, THUMB_SIDE, FilterType::Triangle)
        .to_luma8();
    let mut values: Vec<f32> = gray.pixels().map(|p| p.0[0] as f32 / 255.0).collect();
    let mean = values.iter().sum::<f32>() / values.len().max(1) as f32;
    for value in &mut values {
        *value -= mean;
    }
    values
}

/// Hue in degrees `[0, 360)`, saturation and value in `[0, 1]`.
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let hue = if delta <= f32::EPSILON {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let saturation = if max <= f32::EPSILON { 0.0 } else { delta / max };
    (hue, saturation, max)
}
