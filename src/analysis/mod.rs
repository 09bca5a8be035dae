//! Image embedding and nearest-neighbour search.

pub mod ann_index;
pub mod embedding;
pub mod ingest;
pub mod similarity;
pub mod vector;

pub use vector::{decode_f32_le_blob, encode_f32_le_blob};
