//! Helper utilities for MusicXML export
//!
//! Integer helpers for choosing the `<divisions>` value.

use crate::ir::Score;

/// Calculate least common multiple
pub fn lcm(a: i64, b: i64) -> i64 {
    if a == 0 || b == 0 {
        return 0;
    }
    (a / gcd(a, b) * b).abs()
}

/// Calculate greatest common divisor
pub fn gcd(a: i64, b: i64) -> i64 {
    if b == 0 {
        a.abs()
    } else {
        gcd(b, a % b)
    }
}

/// Smallest divisions-per-quarter that writes every duration in the score
/// as a whole number
pub fn divisions_for(score: &Score) -> i64 {
    score
        .parts
        .iter()
        .flat_map(|p| p.measures.iter())
        .flat_map(|m| m.elements.iter())
        .map(|e| *e.duration().denom())
        .fold(1, lcm)
}
