//! Filename classification
//!
//! Sequenced photos follow the camera convention `IMG_<digits>.JPG`. Every
//! other `.jpg`/`.jpeg` file is a plain photo that gets folded into the
//! sequence; anything else is left alone.

use regex::Regex;
use std::sync::OnceLock;

/// Literal prefix of sequenced filenames
pub const SEQUENCE_PREFIX: &str = "IMG_";

/// Extension written on every sequenced filename
pub const SEQUENCE_EXTENSION: &str = ".JPG";

/// Minimum number of digits in a generated code
pub const CODE_WIDTH: usize = 4;

/// Extensions recognized as photos (compared case-insensitively)
pub const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

static SEQUENCED_PATTERN: OnceLock<Regex> = OnceLock::new();

fn sequenced_pattern() -> &'static Regex {
    SEQUENCED_PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^IMG_(\d+)\.JPG$").expect("sequenced filename pattern is valid")
    })
}

/// Outcome of classifying a single filename
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Matches `IMG_<digits>.JPG`; carries the parsed code
    Sequenced(u64),
    /// Any other JPEG
    Other,
    /// Not a photo, or a sequenced name whose code does not fit in a `u64`
    NotAnImage,
}

/// A photo inside a target folder, ready for planning
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedFile {
    Sequenced { code: u64, name: String },
    Other { name: String },
}

impl ClassifiedFile {
    pub fn name(&self) -> &str {
        match self {
            ClassifiedFile::Sequenced { name, .. } | ClassifiedFile::Other { name } => name,
        }
    }
}

pub fn classify(filename: &str) -> Classification {
    if let Some(caps) = sequenced_pattern().captures(filename) {
        return match caps[1].parse::<u64>() {
            Ok(code) => Classification::Sequenced(code),
            Err(_) => Classification::NotAnImage,
        };
    }

    if is_image(filename) {
        Classification::Other
    } else {
        Classification::NotAnImage
    }
}

/// Check if a filename carries one of the recognized photo extensions
pub fn is_image(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(stem, ext)| {
            !stem.is_empty() && PHOTO_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Format the sequenced filename for `code`.
///
/// Codes are zero-padded to [`CODE_WIDTH`] digits; longer codes keep all of
/// their digits.
pub fn sequenced_name(code: u64) -> String {
    format!(
        "{}{:0width$}{}",
        SEQUENCE_PREFIX,
        code,
        SEQUENCE_EXTENSION,
        width = CODE_WIDTH
    )
}
