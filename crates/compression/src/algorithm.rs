use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::CompressionError;

/// Compression algorithm understood by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    #[default]
    Zstd,
    Lz4,
    Snap,
    Brotli,
    Gzip,
    None,
}

/// Rough throughput class of an algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedClass {
    Fast,
    Balanced,
    HighRatio,
}

/// Catalog entry describing one algorithm.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlgorithmInfo {
    pub algorithm: Algorithm,
    pub display_name: &'static str,
    pub min_level: i32,
    pub max_level: i32,
    pub default_level: i32,
    pub speed: SpeedClass,
    /// Typical output/input size ratio at the default level.
    pub base_ratio: f64,
}

const ALL: [Algorithm; 6] = [
    Algorithm::Zstd,
    Algorithm::Lz4,
    Algorithm::Snap,
    Algorithm::Brotli,
    Algorithm::Gzip,
    Algorithm::None,
];

impl Algorithm {
    /// Every algorithm in catalog order.
    pub fn all() -> &'static [Algorithm] {
        &ALL
    }

    /// Lower-case wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Zstd => "zstd",
            Algorithm::Lz4 => "lz4",
            Algorithm::Snap => "snap",
            Algorithm::Brotli => "brotli",
            Algorithm::Gzip => "gzip",
            Algorithm::None => "none",
        }
    }

    /// Parses a name or alias, rejecting anything unknown.
    pub fn parse_strict(name: &str) -> Result<Self, CompressionError> {
        match name.trim().to_lowercase().as_str() {
            "zstd" => Ok(Algorithm::Zstd),
            "lz4" => Ok(Algorithm::Lz4),
            "snap" | "snappy" => Ok(Algorithm::Snap),
            "brotli" | "br" => Ok(Algorithm::Brotli),
            "gzip" | "gz" => Ok(Algorithm::Gzip),
            "none" => Ok(Algorithm::None),
            _ => Err(CompressionError::UnsupportedAlgorithm(name.to_string())),
        }
    }

    pub fn info(&self) -> AlgorithmInfo {
        let (display_name, min_level, max_level, default_level, speed, base_ratio) = match self {
            Algorithm::Zstd => ("Zstandard", 1, 22, 3, SpeedClass::Balanced, 0.4),
            Algorithm::Lz4 => ("LZ4", 1, 1, 1, SpeedClass::Fast, 0.6),
            Algorithm::Snap => ("Snappy", 0, 0, 0, SpeedClass::Fast, 0.65),
            Algorithm::Brotli => ("Brotli", 0, 11, 6, SpeedClass::HighRatio, 0.35),
            Algorithm::Gzip => ("Gzip", 0, 9, 6, SpeedClass::Balanced, 0.45),
            Algorithm::None => ("None", 0, 0, 0, SpeedClass::Fast, 1.0),
        };
        AlgorithmInfo {
            algorithm: *self,
            display_name,
            min_level,
            max_level,
            default_level,
            speed,
            base_ratio,
        }
    }

    /// Checks `level` against the algorithm's supported range.
    pub fn validate_level(&self, level: i32) -> Result<(), CompressionError> {
        let info = self.info();
        if level < info.min_level || level > info.max_level {
            return Err(CompressionError::InvalidLevel {
                algorithm: *self,
                level,
                min: info.min_level,
                max: info.max_level,
            });
        }
        Ok(())
    }

    /// Approximate output/input ratio at `level`.
    ///
    /// Each level above the default shaves one percent off the base ratio
    /// (and each level below adds one), clamped to [0.2, 1.0].
    pub fn estimated_ratio(&self, level: i32) -> f64 {
        if *self == Algorithm::None {
            return 1.0;
        }
        let info = self.info();
        let delta = (level - info.default_level) as f64;
        (info.base_ratio * (1.0 - 0.01 * delta)).clamp(0.2, 1.0)
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Algorithm {
    /// Lenient parse: unknown names map to the default (zstd).
    fn from(value: &str) -> Self {
        Algorithm::parse_strict(value).unwrap_or_default()
    }
}

/// Hardcoded list used when the backend cannot be asked.
pub fn default_algorithm_names() -> Vec<String> {
    ALL.iter().map(|a| a.as_str().to_string()).collect()
}

/// Interprets the backend's `list_compression_algorithms` answer.
///
/// Failure or an empty answer falls back to the hardcoded list; names the
/// catalog does not know are dropped.
pub fn available_algorithms<E: std::fmt::Display>(
    listed: Result<Vec<String>, E>,
) -> Vec<Algorithm> {
    let names = match listed {
        Ok(names) if !names.is_empty() => names,
        Ok(_) => {
            debug!("backend listed no compression algorithms, using defaults");
            default_algorithm_names()
        }
        Err(e) => {
            warn!(error = %e, "failed to list compression algorithms, using defaults");
            default_algorithm_names()
        }
    };

    let mut out = Vec::with_capacity(names.len());
    for name in &names {
        match Algorithm::parse_strict(name) {
            Ok(alg) if !out.contains(&alg) => out.push(alg),
            Ok(_) => {}
            Err(_) => debug!(name = %name, "ignoring unknown compression algorithm"),
        }
    }
    if out.is_empty() {
        return ALL.to_vec();
    }
    out
}
