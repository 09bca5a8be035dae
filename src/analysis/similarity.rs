//! Vector helpers shared by the embedder and the index.

/// Normalize a vector in-place and return whether the norm was non-zero.
pub fn normalize_l2_in_place(values: &mut [f32]) -> bool {
    let sum: f32 = values.iter().map(|value| value * value).sum();
    if !sum.is_finite() || sum <= 0.0 {
        return false;
    }
    let norm = sum.sqrt();
    for value in values {
        *value /= norm;
    }
    true
}

/// Dot product over the shared prefix of two vectors.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Whether a vector has unit length within `tolerance`.
pub fn is_unit_length(values: &[f32], tolerance: f32) -> bool {
    (dot(values, values).sqrt() - 1.0).abs() <= tolerance
}
