// Analysis module - color classification
//
// Pipeline position: RawSample → SampleNormalizer → classifier → ScaleMapper.
// The classifier only reads the centroid table of the channel's profile.

pub mod classifier;

pub use classifier::{classify, nearest_centroid};
