//! Utility functions for label normalization, text cleanup, and file system checks.
//!
//! This module provides helper functions used throughout the crawler:
//! - Label normalization for category matching across sources
//! - Whitespace cleanup and character-safe truncation of article text
//! - Filename slugs for persisted records
//! - File system validation for the dataset directory

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Fallback filename stem when a title slugs down to nothing.
pub const DEFAULT_SLUG: &str = "noticia";

/// Maximum number of characters kept in a filename slug.
pub const SLUG_MAX_CHARS: usize = 60;

/// Fold a label for comparison: trimmed, lowercased, Spanish diacritics stripped.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_label(" Economía "), "economia");
/// assert_eq!(normalize_label("ESPAÑA"), "espana");
/// ```
pub fn normalize_label(s: &str) -> String {
    s.trim().to_lowercase().chars().map(fold_diacritic).collect()
}

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

/// Collapse every run of whitespace (including non-breaking spaces and
/// newlines) into a single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE
        .replace_all(&s.replace('\u{a0}', " "), " ")
        .trim()
        .to_string()
}

/// Keep at most `max` characters of `s`, never splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and the number
/// of dropped bytes appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let kept = truncate_chars(s, max);
    if kept.len() == s.len() {
        s.to_string()
    } else {
        format!("{}…(+{} bytes)", kept, s.len() - kept.len())
    }
}

/// Convert an article title into a filesystem-safe filename stem.
///
/// Lowercases, turns whitespace runs into `_`, drops everything except
/// ASCII letters, digits, `_` and Spanish accented vowels / `ñ`, then caps the
/// result at [`SLUG_MAX_CHARS`]. An empty result becomes [`DEFAULT_SLUG`].
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify_filename("El Real Madrid gana"), "el_real_madrid_gana");
/// assert_eq!(slugify_filename("¿¡!?"), "noticia");
/// ```
pub fn slugify_filename(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    let underscored = WHITESPACE.replace_all(&lowered, "_");
    let cleaned: String = underscored
        .chars()
        .filter(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_' || "áéíóúüñ".contains(*c)
        })
        .collect();
    let capped = truncate_chars(&cleaned, SLUG_MAX_CHARS);
    if capped.is_empty() {
        DEFAULT_SLUG.to_string()
    } else {
        capped.to_string()
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then creates and immediately
/// deletes a probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Dataset directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
