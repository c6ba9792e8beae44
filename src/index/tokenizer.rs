//! Tokenizer feeding the inverted index
//!
//! Text is lowercased and split into runs of Unicode letters and digits.
//! Apostrophes inside a word are kept so "don't" stays one token.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TOKEN_RE: Regex = Regex::new(r"(?u)[\p{L}\p{N}][\p{L}\p{N}']*").expect("valid regex");
}

/// Splits text into lowercase tokens, in order of appearance
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().trim_end_matches('\'').to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
