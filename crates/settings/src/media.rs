use mediastash_compression::{file_extension, is_already_compressed};

use crate::types::{CompressionConfig, MediaType};

const PHOTO_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "avif", "heic", "heif", "bmp", "tiff", "tif", "raw", "svg",
];

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "webm", "m4v", "wmv", "flv"];

const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "md", "rtf", "odt", "csv", "json",
    "xml",
];

/// Classifies a file by extension. Unknown extensions are `Other`.
pub fn detect_media_type(filename: &str) -> MediaType {
    let ext = file_extension(filename);
    let ext = ext.as_str();
    if PHOTO_EXTENSIONS.contains(&ext) {
        MediaType::Photo
    } else if VIDEO_EXTENSIONS.contains(&ext) {
        MediaType::Video
    } else if DOCUMENT_EXTENSIONS.contains(&ext) {
        MediaType::Document
    } else {
        MediaType::Other
    }
}

/// Applies a stored compression config to a concrete file.
pub fn should_compress(filename: &str, size: u64, config: &CompressionConfig) -> bool {
    if !config.enabled {
        return false;
    }
    if size < config.min_size_threshold {
        return false;
    }
    !(config.skip_already_compressed && is_already_compressed(filename))
}
