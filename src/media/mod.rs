//! Image handling - normalization of client inputs and JPEG/PNG encoding

pub mod encode;
pub mod normalize;

pub use normalize::{NormalizedImage, NormalizedMask, Normalizer};
