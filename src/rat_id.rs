//! Test session identifiers
//!
//! This module provides the two identifiers of a test session. The
//! public id is a short code of uppercase letters that a teacher writes
//! on the board and students type in; the private id is a long
//! unguessable token that gates the teacher views. Both serialize as
//! plain strings.

use std::{fmt::Display, str::FromStr};

use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;
use uuid::Uuid;

use crate::constants::rat::PUBLIC_ID_LENGTH;

/// The short student-facing code of a test session
///
/// Public ids are five uppercase letters so they are easy to share
/// verbally or on a board. The id space is large relative to the number
/// of concurrently running tests; collision handling, if wanted at all,
/// is the caller's concern.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub struct PublicId([u8; PUBLIC_ID_LENGTH]);

/// Errors that can occur when parsing a public id
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsePublicIdError {
    /// The input does not have exactly the expected number of letters.
    #[error("a public id is exactly {PUBLIC_ID_LENGTH} letters")]
    WrongLength,
    /// The input contains something other than uppercase ASCII letters.
    #[error("a public id contains only the uppercase letters A-Z")]
    InvalidLetter,
}

impl PublicId {
    /// Creates a new random public id
    pub fn new() -> Self {
        let mut letters = [0u8; PUBLIC_ID_LENGTH];
        for letter in &mut letters {
            *letter = fastrand::u8(b'A'..=b'Z');
        }
        Self(letters)
    }
}

impl Default for PublicId {
    /// Creates a new random public id (same as `new()`)
    fn default() -> Self {
        Self::new()
    }
}

impl Display for PublicId {
    /// Formats the public id as its five letters
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(std::str::from_utf8(&self.0).expect("public ids hold ASCII letters"))
    }
}

impl FromStr for PublicId {
    type Err = ParsePublicIdError;

    /// Parses a public id from its string form
    ///
    /// # Errors
    ///
    /// Returns [`ParsePublicIdError::WrongLength`] for input of the
    /// wrong size and [`ParsePublicIdError::InvalidLetter`] for anything
    /// outside `A`-`Z`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let letters: [u8; PUBLIC_ID_LENGTH] = s
            .as_bytes()
            .try_into()
            .map_err(|_| ParsePublicIdError::WrongLength)?;
        if letters.iter().all(u8::is_ascii_uppercase) {
            Ok(Self(letters))
        } else {
            Err(ParsePublicIdError::InvalidLetter)
        }
    }
}

/// The teacher-only secret token of a test session
///
/// Knowing the private id grants access to the status table and the
/// result download, so it is a full UUID rather than a short code.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub struct PrivateId(Uuid);

impl PrivateId {
    /// Creates a new random private id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PrivateId {
    /// Creates a new random private id (same as `new()`)
    fn default() -> Self {
        Self::new()
    }
}

impl Display for PrivateId {
    /// Formats the private id as a UUID string
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for PrivateId {
    type Err = uuid::Error;

    /// Parses a private id from a UUID string
    ///
    /// # Errors
    ///
    /// Returns a `uuid::Error` if the string is not a valid UUID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}
