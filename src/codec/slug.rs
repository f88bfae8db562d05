//! Slug tokenizer.
//!
//! Folds arbitrary text into a lowercase `[a-z0-9-]` token: diacritics are
//! decomposed away, every run of other characters becomes one hyphen, and
//! hyphens never lead or trail.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Token returned when the input carries nothing usable.
pub const FALLBACK_TOKEN: &str = "row";

/// Tokenizes text, yielding [`FALLBACK_TOKEN`] for empty or symbol-only input.
///
/// ```
/// use tablesmith::tokenize;
///
/// assert_eq!(tokenize(Some("  Épée de Feu! ")), "epee-de-feu");
/// assert_eq!(tokenize(None), "row");
/// ```
#[must_use]
pub fn tokenize(text: Option<&str>) -> String {
    let slug = text.map(slugify).unwrap_or_default();
    if slug.is_empty() {
        FALLBACK_TOKEN.to_string()
    } else {
        slug
    }
}

/// Tokenizes text, yielding an empty string when nothing survives.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;

    for c in text
        .nfkd()
        .flat_map(char::to_lowercase)
        .filter(|c| !is_combining_mark(*c))
    {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }

    slug
}
