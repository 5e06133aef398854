//! Session code generation and parsing
//!
//! A lecturer shares a short code with the class and students type it in
//! to join. Generated codes avoid characters that are easily confused
//! when read aloud or from a projector (`I`/`1`, `O`/`0`).

use std::{fmt::Display, str::FromStr};

use serde::Deserialize;
use serde_with::SerializeDisplay;
use thiserror::Error;

use crate::constants::session_code::{ALPHABET, LENGTH, MAX_LENGTH, MIN_JOIN_LENGTH};

/// The identifier of a quiz session
///
/// Every event carries one, and consumers ignore events whose code does
/// not match the session they are attached to. Codes arriving in events
/// are taken as they are; only [`FromStr`] normalizes typed input.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, SerializeDisplay)]
#[serde(try_from = "String")]
pub struct SessionCode(String);

/// Errors that can occur when parsing a session code
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Fewer characters than a student is allowed to type
    #[error("session code is too short")]
    TooShort,
    /// More characters than any code carries
    #[error("session code is too long")]
    TooLong,
    /// A character outside uppercase `A-Z` and `0-9`
    #[error("session code contains invalid characters")]
    InvalidCharacter,
}

impl SessionCode {
    /// Creates a new random session code
    ///
    /// The code is four characters drawn uniformly from the unambiguous
    /// alphabet.
    pub fn generate() -> Self {
        Self(
            (0..LENGTH)
                .map(|_| char::from(ALPHABET[fastrand::usize(..ALPHABET.len())]))
                .collect(),
        )
    }

    /// Returns the code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SessionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionCode {
    type Err = Error;

    /// Parses a code typed by a user
    ///
    /// Surrounding whitespace is trimmed and letters are uppercased, so
    /// `" ab12 "` parses to `AB12`.
    ///
    /// # Errors
    ///
    /// Returns an error if the normalized code is shorter than three
    /// characters, longer than the maximum, or not alphanumeric.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.trim().to_uppercase())
    }
}

impl TryFrom<String> for SessionCode {
    type Error = Error;

    /// Accepts a code exactly as written, without normalizing it
    fn try_from(code: String) -> Result<Self, Self::Error> {
        let length = code.chars().count();
        if length < MIN_JOIN_LENGTH {
            return Err(Error::TooShort);
        }
        if length > MAX_LENGTH {
            return Err(Error::TooLong);
        }
        if !code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        {
            return Err(Error::InvalidCharacter);
        }
        Ok(Self(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_length_and_alphabet() {
        for _ in 0..100 {
            let code = SessionCode::generate();
            assert_eq!(code.as_str().len(), LENGTH);
            assert!(code.as_str().bytes().all(|b| ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_generate_avoids_ambiguous_characters() {
        for _ in 0..200 {
            let code = SessionCode::generate();
            assert!(!code.as_str().contains(['I', 'O', '0', '1']));
        }
    }

    #[test]
    fn test_from_str_normalizes() {
        let code = SessionCode::from_str("  ab12 ").unwrap();
        assert_eq!(code.as_str(), "AB12");
    }

    #[test]
    fn test_from_str_minimum_length() {
        assert_eq!(SessionCode::from_str("ab"), Err(Error::TooShort));
        assert_eq!(SessionCode::from_str("   "), Err(Error::TooShort));
        assert!(SessionCode::from_str("abc").is_ok());
    }

    #[test]
    fn test_from_str_invalid() {
        assert_eq!(SessionCode::from_str("AB-12"), Err(Error::InvalidCharacter));
        assert_eq!(
            SessionCode::from_str(&"A".repeat(MAX_LENGTH + 1)),
            Err(Error::TooLong)
        );
    }

    #[test]
    fn test_serialization() {
        let code = SessionCode::from_str("ZZ99").unwrap();
        let serialized = serde_json::to_string(&code).unwrap();
        assert_eq!(serialized, "\"ZZ99\"");

        let deserialized: SessionCode = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, code);
    }

    #[test]
    fn test_deserialization_error() {
        let result: Result<SessionCode, _> = serde_json::from_str("\"x\"");
        assert!(result.is_err());

        let result: Result<SessionCode, _> = serde_json::from_str("1234");
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialization_is_exact() {
        let result: Result<SessionCode, _> = serde_json::from_str("\"ab12\"");
        assert!(result.is_err());
        let result: Result<SessionCode, _> = serde_json::from_str("\" AB12\"");
        assert!(result.is_err());
        assert_eq!(
            SessionCode::try_from("ab12".to_owned()),
            Err(Error::InvalidCharacter)
        );
    }
}
