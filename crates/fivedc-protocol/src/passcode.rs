//! Match passcodes and their six-piece notation.
//!
//! Players share private matches by reading out six chess pieces. Each piece
//! is one base-12 digit, the first piece being the least significant:
//!
//! ```text
//!   P N B R Q K p n b r q k
//!   0 1 2 3 4 5 6 7 8 9 10 11
//! ```
//!
//! so `"PPPPPP"` is 0 and `"kkkkkk"` is `12^6 - 1`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const ALPHABET: [char; 12] = ['P', 'N', 'B', 'R', 'Q', 'K', 'p', 'n', 'b', 'r', 'q', 'k'];
const DIGITS: usize = 6;

/// A match passcode as it travels on the wire.
///
/// `-1` and `0` are sentinels, never real passcodes: `-1` asks the server
/// to create a match (and comes back when a request fails), `0` marks an
/// empty slot or a join without a code.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Passcode(pub i64);

impl Passcode {
    /// Sent to create a match; returned when a request fails.
    pub const CREATE: Passcode = Passcode(-1);
    /// Empty list slot.
    pub const NONE: Passcode = Passcode(0);
    /// The largest value six pieces can spell.
    pub const MAX: Passcode = Passcode(2_985_983);

    /// Returns `true` for a passcode that can identify a match.
    pub fn is_valid(self) -> bool {
        (1..=Self::MAX.0).contains(&self.0)
    }

    pub fn is_sentinel(self) -> bool {
        self == Self::CREATE || self == Self::NONE
    }

    /// Spells the passcode as six pieces, or `None` for negative and
    /// out-of-range values. `0` spells as `"PPPPPP"`.
    pub fn to_notation(self) -> Option<String> {
        if !(0..=Self::MAX.0).contains(&self.0) {
            return None;
        }
        let mut rest = self.0 as usize;
        let mut out = String::with_capacity(DIGITS);
        for _ in 0..DIGITS {
            out.push(ALPHABET[rest % ALPHABET.len()]);
            rest /= ALPHABET.len();
        }
        Some(out)
    }
}

impl fmt::Display for Passcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_notation() {
            Some(notation) => f.write_str(&notation),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Failure to read a passcode written in piece notation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasscodeParseError {
    #[error("passcode must be {DIGITS} pieces, got {0}")]
    WrongLength(usize),
    #[error("'{0}' is not a piece letter")]
    InvalidPiece(char),
}

impl FromStr for Passcode {
    type Err = PasscodeParseError;

    /// Accepts a decimal value or six-piece notation.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(value) = s.parse::<i64>() {
            return Ok(Passcode(value));
        }
        let count = s.chars().count();
        if count != DIGITS {
            return Err(PasscodeParseError::WrongLength(count));
        }
        let mut value = 0i64;
        // Most significant digit is last, so fold from the right.
        for c in s.chars().rev() {
            let digit = ALPHABET
                .iter()
                .position(|&p| p == c)
                .ok_or(PasscodeParseError::InvalidPiece(c))?;
            value = value * ALPHABET.len() as i64 + digit as i64;
        }
        Ok(Passcode(value))
    }
}
