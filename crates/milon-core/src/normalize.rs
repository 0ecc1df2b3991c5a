//! Vowel-mark stripping for dictionary keys.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Strip nikud and any other combining marks from a word.
///
/// Applies canonical decomposition (NFKD) and drops every combining mark,
/// leaving the bare consonantal skeleton used as the dictionary key.
/// Pure and idempotent; input consisting solely of marks collapses to the
/// empty string.
pub fn strip_nikud(word: &str) -> String {
    word.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}
