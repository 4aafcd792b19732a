//! Character-set normalization for strings headed to the e-reader.
//!
//! The device's default fonts render little beyond Latin letters and basic
//! punctuation, so titles and author names are reduced to that repertoire
//! before they are written into book metadata.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Punctuation kept besides letters, digits and whitespace.
pub const ALLOWED_PUNCTUATION: &[char] = &['-', '.', ',', '!', '?', '(', ')', ':', ';'];

/// Normalize `text` for the target device.
///
/// Decomposes to NFD, drops combining marks, drops anything that is not
/// alphanumeric, whitespace or [`ALLOWED_PUNCTUATION`], folds whitespace runs
/// into single spaces and trims. Applying it twice gives the same result as
/// applying it once.
///
/// ```rust
/// use quire_core::sanitize;
///
/// assert_eq!(sanitize("¿Qué pasó en “Año Nuevo”?"), "Que paso en Ano Nuevo?");
/// ```
pub fn sanitize(text: &str) -> String {
    let kept: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| is_allowed(*c))
        .collect();

    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether `c` may appear in sanitized output.
pub fn is_allowed(c: char) -> bool {
    c.is_alphanumeric() || c.is_whitespace() || ALLOWED_PUNCTUATION.contains(&c)
}
