//! Static knowledge about the compression algorithms the backend offers.
//!
//! Nothing here compresses bytes. The catalog describes each algorithm
//! (level range, speed class, typical ratio) and the recommender picks one
//! for a file from its name and size alone.

mod algorithm;
mod recommend;

pub use algorithm::{
    Algorithm, AlgorithmInfo, SpeedClass, available_algorithms, default_algorithm_names,
};
pub use recommend::{
    LARGE_FILE_THRESHOLD, MIN_COMPRESS_SIZE, Recommendation, file_extension,
    is_already_compressed, recommend, select_algorithm,
};

/// Errors produced by the compression catalog.
#[derive(Debug, thiserror::Error)]
pub enum CompressionError {
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("invalid level {level} for {algorithm} (expected {min}-{max})")]
    InvalidLevel {
        algorithm: Algorithm,
        level: i32,
        min: i32,
        max: i32,
    },
}
