//! Short human-facing order codes ("042", "917", ...).
//!
//! Codes are drawn uniformly at random and checked against the codes already
//! held by open orders. After a bounded number of random draws the generator
//! falls back to a wrapping scan from the last candidate, so it terminates in
//! at most [`CODE_SPACE`] + [`RANDOM_ATTEMPTS`] checks and only fails when every
//! code is taken.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Number of distinct codes ("000" through "999").
pub const CODE_SPACE: u16 = 1000;

/// Random draws before switching to the deterministic scan.
pub const RANDOM_ATTEMPTS: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    #[error("all 1000 order codes are held by open orders")]
    CodeSpaceExhausted,
    #[error("invalid order code {0:?}: expected 3 digits")]
    Malformed(String),
}

/// A 3-digit, zero-padded order code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderCode(u16);

impl OrderCode {
    pub fn new(n: u16) -> Option<Self> {
        (n < CODE_SPACE).then_some(OrderCode(n))
    }

    pub fn value(self) -> u16 {
        self.0
    }

    pub fn parse(s: &str) -> Result<Self, CodeError> {
        let t = s.trim();
        if t.len() != 3 || !t.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CodeError::Malformed(s.to_string()));
        }
        t.parse::<u16>()
            .ok()
            .and_then(OrderCode::new)
            .ok_or_else(|| CodeError::Malformed(s.to_string()))
    }
}

impl fmt::Display for OrderCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

impl TryFrom<String> for OrderCode {
    type Error = CodeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        OrderCode::parse(&s)
    }
}

impl From<OrderCode> for String {
    fn from(c: OrderCode) -> Self {
        c.to_string()
    }
}

/// Source of candidate codes. Implementations return any `u16`; the
/// generator reduces it into the code space.
pub trait CodeSource {
    fn next_candidate(&mut self) -> u16;
}

/// Production source: entropy from a v4 UUID per draw.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidCodeSource;

impl CodeSource for UuidCodeSource {
    fn next_candidate(&mut self) -> u16 {
        (Uuid::new_v4().as_u128() % u128::from(CODE_SPACE)) as u16
    }
}

/// Pick a code not reported as taken by `is_taken`.
pub fn generate_code<S, F>(source: &mut S, mut is_taken: F) -> Result<OrderCode, CodeError>
where
    S: CodeSource + ?Sized,
    F: FnMut(OrderCode) -> bool,
{
    let mut last = 0u16;
    for _ in 0..RANDOM_ATTEMPTS {
        last = source.next_candidate() % CODE_SPACE;
        let candidate = OrderCode(last);
        if !is_taken(candidate) {
            return Ok(candidate);
        }
    }

    // Wrapping scan: visits every code exactly once.
    for step in 1..=CODE_SPACE {
        let candidate = OrderCode((last + step) % CODE_SPACE);
        if !is_taken(candidate) {
            return Ok(candidate);
        }
    }

    Err(CodeError::CodeSpaceExhausted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_zero_padded() {
        assert_eq!(OrderCode(7).to_string(), "007");
        assert_eq!(OrderCode(999).to_string(), "999");
    }

    #[test]
    fn parse_rejects_wrong_width() {
        assert!(OrderCode::parse("42").is_err());
        assert!(OrderCode::parse("1000").is_err());
        assert!(OrderCode::parse("4a2").is_err());
        assert_eq!(OrderCode::parse("042").unwrap().value(), 42);
    }

    #[test]
    fn new_rejects_out_of_space() {
        assert!(OrderCode::new(1000).is_none());
        assert!(OrderCode::new(0).is_some());
    }
}
