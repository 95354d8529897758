/**
 * Extension classification module
 */

use std::path::Path;

/// Coarse file-type bucket derived from a file's extension.
///
/// Categories never influence where a file lands (bucketing is by date
/// alone); they feed the per-category tallies in the run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Image,
    Video,
    Audio,
    Document,
    Unknown,
}

impl Category {
    /// All categories, in report display order.
    pub const ALL: [Category; 5] = [
        Category::Image,
        Category::Video,
        Category::Audio,
        Category::Document,
        Category::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Image => "images",
            Category::Video => "videos",
            Category::Audio => "audio",
            Category::Document => "documents",
            Category::Unknown => "other",
        }
    }
}

/// Map an extension to its category.
///
/// Total over all inputs: casing is normalized, a leading dot is stripped,
/// and anything unmapped is `Unknown`. Unknown files are still organized,
/// just tallied separately.
pub fn classify(extension: &str) -> Category {
    let ext = extension.trim_start_matches('.').to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" | "png" | "gif" | "bmp" | "tif" | "tiff" | "webp" | "heic" | "heif"
        | "raw" | "cr2" | "nef" | "arw" | "dng" | "psd" | "ai" | "eps" | "indd" | "psb" => {
            Category::Image
        }
        "mp4" | "mov" | "avi" | "mkv" | "wmv" | "flv" | "webm" | "m4v" | "qt" | "3gp" | "mpg"
        | "mpeg" | "m2v" | "mts" | "m2ts" => Category::Video,
        "mp3" | "wav" | "flac" | "aac" | "ogg" | "wma" | "m4a" => Category::Audio,
        "doc" | "docx" | "pdf" | "txt" | "rtf" | "pages" => Category::Document,
        _ => Category::Unknown,
    }
}

/// Extract the lower-cased extension of a path, without the leading dot.
///
/// Files with no extension yield an empty string.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_group() {
        assert_eq!(classify("jpg"), Category::Image);
        assert_eq!(classify("dng"), Category::Image);
        assert_eq!(classify("mkv"), Category::Video);
        assert_eq!(classify("m2ts"), Category::Video);
        assert_eq!(classify("flac"), Category::Audio);
        assert_eq!(classify("pages"), Category::Document);
    }

    #[test]
    fn test_classify_pdf_is_document() {
        assert_eq!(classify("pdf"), Category::Document);
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(classify("JPG"), classify("jpg"));
        assert_eq!(classify("Mp3"), Category::Audio);
        assert_eq!(classify("HEIC"), Category::Image);
    }

    #[test]
    fn test_classify_strips_leading_dot() {
        assert_eq!(classify(".png"), Category::Image);
        assert_eq!(classify(".PDF"), Category::Document);
    }

    #[test]
    fn test_classify_unmapped_is_unknown() {
        assert_eq!(classify("xyz"), Category::Unknown);
        assert_eq!(classify(""), Category::Unknown);
        assert_eq!(classify("tar"), Category::Unknown);
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Path::new("/a/b/photo.JPG")), "jpg");
        assert_eq!(extension_of(Path::new("/a/b/archive.tar.gz")), "gz");
        assert_eq!(extension_of(Path::new("/a/b/README")), "");
    }
}
