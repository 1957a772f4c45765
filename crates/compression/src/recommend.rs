use serde::Serialize;

use crate::Algorithm;

/// Files smaller than this are not worth compressing.
pub const MIN_COMPRESS_SIZE: u64 = 1024;

/// Files larger than this get the fast algorithm.
pub const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Below this many bytes automatic selection picks no compression at all.
const AUTO_SELECT_MIN_SIZE: u64 = 64;

const ALREADY_COMPRESSED: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "avif", "heic", "heif", // images
    "mp4", "mkv", "avi", "mov", "webm", // video
    "mp3", "aac", "ogg", "flac", // audio
    "zip", "gz", "bz2", "xz", "7z", "rar", "zst", "lz4", "br", // archives
];

const TEXT_LIKE: &[&str] = &[
    "txt", "json", "xml", "html", "css", "js", "ts", "md", "csv", "log", "svg",
];

const UNCOMPRESSED_IMAGES: &[&str] = &["bmp", "tiff", "tif", "raw"];

/// Suggested compression for a single file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub algorithm: Algorithm,
    pub level: i32,
    pub reason: String,
    pub should_compress: bool,
    pub estimated_ratio: f64,
}

impl Recommendation {
    fn skip(reason: &str) -> Self {
        Self {
            algorithm: Algorithm::None,
            level: 0,
            reason: reason.into(),
            should_compress: false,
            estimated_ratio: 1.0,
        }
    }

    fn compress(algorithm: Algorithm, level: i32, reason: &str) -> Self {
        Self {
            algorithm,
            level,
            reason: reason.into(),
            should_compress: true,
            estimated_ratio: 0.6,
        }
    }
}

/// Lower-cased extension after the last dot, or empty.
pub fn file_extension(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}

/// True for formats that already carry their own compression.
pub fn is_already_compressed(filename: &str) -> bool {
    let ext = file_extension(filename);
    ALREADY_COMPRESSED.contains(&ext.as_str())
}

/// Recommends compression for a file. Rules are checked in order and the
/// first match wins.
pub fn recommend(filename: &str, size: u64) -> Recommendation {
    let ext = file_extension(filename);

    if is_already_compressed(filename) {
        Recommendation::skip("File is already in a compressed format")
    } else if size < MIN_COMPRESS_SIZE {
        Recommendation::skip("File too small to benefit from compression")
    } else if size > LARGE_FILE_THRESHOLD {
        Recommendation::compress(Algorithm::Lz4, 1, "Large file - using fast compression")
    } else if TEXT_LIKE.contains(&ext.as_str()) {
        Recommendation::compress(
            Algorithm::Zstd,
            6,
            "Text file - high compression ratio recommended",
        )
    } else if UNCOMPRESSED_IMAGES.contains(&ext.as_str()) {
        Recommendation::compress(
            Algorithm::Zstd,
            3,
            "Uncompressed image - good compression potential",
        )
    } else {
        Recommendation::compress(Algorithm::Zstd, 3, "Default balanced compression")
    }
}

/// Automatic pick used when a caller only states a speed preference.
pub fn select_algorithm(size: u64, prefer_speed: bool) -> Algorithm {
    if size < AUTO_SELECT_MIN_SIZE {
        Algorithm::None
    } else if prefer_speed {
        Algorithm::Lz4
    } else {
        Algorithm::Zstd
    }
}
