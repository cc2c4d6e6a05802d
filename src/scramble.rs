//! Singmaster scramble strings.

use std::str::FromStr;

use crate::error::Error;
use crate::moves::Twist;

/// Parse a whitespace-separated scramble like "R U R' U R U2 R'" into
/// twist values.
pub fn scramble_from_str(s: &str) -> Result<Vec<u8>, Error> {
    s.split_whitespace()
        .map(|word| Twist::from_str(word.trim()).map(|t| t as u8))
        .collect()
}

/// Render twist values back into a scramble string.
pub fn scramble_to_str(moves: &[u8]) -> Result<String, Error> {
    let words: Result<Vec<String>, Error> = moves
        .iter()
        .map(|&m| Twist::try_from(m).map(|t| t.to_string()))
        .collect();
    Ok(words?.join(" "))
}
